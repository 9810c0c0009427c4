use rst_common::standard::serde_json::{json, Value};

use crate::correlation::types::CorrelationError;
use crate::crypto::types::CryptoBuilder;
use crate::message::types::{Qualifier, ThreadID, MSG_PROBLEM_REPORT, MSG_STATUS_REPORT};
use crate::message::{Envelope, MessageFamily};
use crate::protocol::types::{FamilyMessage, ProtocolError};
use crate::protocol::Protocol;
use crate::session::Session;
use crate::transport::types::TransportBuilder;

use super::problem_report::{unexpected, ProblemReport};

pub const FAMILY: &str = "present-proof";
pub const VERSION: &str = "0.6";

pub const MSG_REQUEST: &str = "request";
pub const MSG_GET_STATUS: &str = "get-status";

pub const MSG_PROOF_RESULT: &str = "proof-result";

const FIELD_NAME: &str = "name";
const FIELD_PROOF_ATTRS: &str = "proofAttrs";
const FIELD_PROOF_PREDICATES: &str = "proofPredicates";
const FIELD_REVOCATION_INTERVAL: &str = "revocationInterval";
const FIELD_STATUS: &str = "status";

#[derive(Debug, Clone, PartialEq)]
pub enum PresentProofMessage {
    /// The whole proof result payload, as the agent reported it
    ProofResult(Value),
    Status(Value),
    ProblemReport(ProblemReport),
    Unexpected(String),
}

impl FamilyMessage for PresentProofMessage {
    fn decode(message_name: &str, envelope: &Envelope) -> Self {
        match message_name {
            MSG_PROOF_RESULT => Self::ProofResult(envelope.clone().into_value()),
            MSG_STATUS_REPORT => {
                Self::Status(envelope.get(FIELD_STATUS).cloned().unwrap_or(Value::Null))
            }
            MSG_PROBLEM_REPORT => Self::ProblemReport(ProblemReport::from_envelope(envelope)),
            _ => Self::Unexpected(unexpected(message_name, "not part of present-proof")),
        }
    }

    fn failure(&self) -> Option<String> {
        match self {
            Self::ProblemReport(report) => Some(report.to_string()),
            Self::Unexpected(reason) => Some(reason.clone()),
            _ => None,
        }
    }
}

/// `PresentProof` requests a proof from the other side of a pairwise relationship
#[derive(Debug, Clone)]
pub struct PresentProof {
    protocol: Protocol,
    name: String,
    proof_attrs: Vec<Value>,
    proof_predicates: Vec<Value>,
    revocation_interval: Value,
}

impl PresentProof {
    pub fn family() -> MessageFamily {
        MessageFamily::known(Qualifier::Agency, FAMILY, VERSION)
    }

    pub fn new(
        for_relationship: &str,
        name: &str,
        proof_attrs: Vec<Value>,
        proof_predicates: Vec<Value>,
        thread_id: Option<ThreadID>,
    ) -> Self {
        Self {
            protocol: Protocol::new(Self::family(), Some(for_relationship.to_string()), thread_id),
            name: name.to_string(),
            proof_attrs,
            proof_predicates,
            revocation_interval: json!({}),
        }
    }

    pub fn with_revocation_interval(mut self, interval: Value) -> Self {
        self.revocation_interval = interval;
        self
    }

    pub fn protocol(&self) -> &Protocol {
        &self.protocol
    }

    pub fn request_msg(&self) -> Envelope {
        self.protocol
            .base_message(MSG_REQUEST)
            .with(FIELD_NAME, self.name.as_str())
            .with(FIELD_PROOF_ATTRS, self.proof_attrs.clone())
            .with(FIELD_PROOF_PREDICATES, self.proof_predicates.clone())
            .with(FIELD_REVOCATION_INTERVAL, self.revocation_interval.clone())
    }

    pub fn status_msg(&self) -> Envelope {
        self.protocol.base_message(MSG_GET_STATUS)
    }

    pub async fn request_msg_packed<TCrypto, TTransport>(
        &self,
        session: &Session<TCrypto, TTransport>,
    ) -> Result<Vec<u8>, ProtocolError>
    where
        TCrypto: CryptoBuilder,
        TTransport: TransportBuilder,
    {
        session.pack(&self.protocol, &self.request_msg()).await
    }

    /// Request the proof and wait for its result
    pub async fn request<TCrypto, TTransport>(
        &self,
        session: &Session<TCrypto, TTransport>,
    ) -> Result<Value, CorrelationError>
    where
        TCrypto: CryptoBuilder,
        TTransport: TransportBuilder,
    {
        let message: PresentProofMessage = session
            .request_expecting(&self.protocol, &self.request_msg(), &[MSG_PROOF_RESULT])
            .await?;

        match message {
            PresentProofMessage::ProofResult(result) => Ok(result),
            other => Err(CorrelationError::Rejected(format!("{:?}", other))),
        }
    }

    pub async fn status<TCrypto, TTransport>(
        &self,
        session: &Session<TCrypto, TTransport>,
    ) -> Result<Value, CorrelationError>
    where
        TCrypto: CryptoBuilder,
        TTransport: TransportBuilder,
    {
        let message: PresentProofMessage = session
            .request_expecting(&self.protocol, &self.status_msg(), &[MSG_STATUS_REPORT])
            .await?;

        match message {
            PresentProofMessage::Status(status) => Ok(status),
            other => Err(CorrelationError::Rejected(format!("{:?}", other))),
        }
    }
}
