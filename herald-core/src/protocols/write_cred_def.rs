use rst_common::standard::serde_json::{json, Value};

use crate::correlation::types::CorrelationError;
use crate::crypto::types::CryptoBuilder;
use crate::message::types::{
    MessageError, Qualifier, ThreadID, MSG_PROBLEM_REPORT, MSG_STATUS_REPORT,
};
use crate::message::{Envelope, MessageFamily};
use crate::protocol::types::{FamilyMessage, ProtocolError};
use crate::protocol::Protocol;
use crate::session::Session;
use crate::transport::types::TransportBuilder;

use super::problem_report::{unexpected, ProblemReport};

pub const FAMILY: &str = "write-cred-def";
pub const VERSION: &str = "0.6";

pub const MSG_WRITE: &str = "write";

const FIELD_NAME: &str = "name";
const FIELD_SCHEMA_ID: &str = "schemaId";
const FIELD_TAG: &str = "tag";
const FIELD_REVOCATION_DETAILS: &str = "revocationDetails";
const FIELD_CRED_DEF_ID: &str = "credDefId";

const DEFAULT_TAG: &str = "latest";

#[derive(Debug, Clone, PartialEq)]
pub enum WriteCredentialDefinitionMessage {
    Status { cred_def_id: String },
    ProblemReport(ProblemReport),
    Unexpected(String),
}

impl FamilyMessage for WriteCredentialDefinitionMessage {
    fn decode(message_name: &str, envelope: &Envelope) -> Self {
        match message_name {
            MSG_STATUS_REPORT => match envelope.require_str(FIELD_CRED_DEF_ID) {
                Ok(cred_def_id) => Self::Status {
                    cred_def_id: cred_def_id.to_string(),
                },
                Err(err) => Self::Unexpected(unexpected(message_name, &err.to_string())),
            },
            MSG_PROBLEM_REPORT => Self::ProblemReport(ProblemReport::from_envelope(envelope)),
            _ => Self::Unexpected(unexpected(message_name, "not part of write-cred-def")),
        }
    }

    fn failure(&self) -> Option<String> {
        match self {
            Self::Status { .. } => None,
            Self::ProblemReport(report) => Some(report.to_string()),
            Self::Unexpected(reason) => Some(reason.clone()),
        }
    }
}

/// `WriteCredentialDefinition` writes a credential definition for an existing schema
///
/// The tag defaults to `latest` and revocation is disabled unless revocation details
/// are given.
#[derive(Debug, Clone)]
pub struct WriteCredentialDefinition {
    protocol: Protocol,
    name: String,
    schema_id: String,
    tag: String,
    revocation_details: Value,
}

impl WriteCredentialDefinition {
    pub fn family() -> MessageFamily {
        MessageFamily::known(Qualifier::Agency, FAMILY, VERSION)
    }

    pub fn new(
        name: &str,
        schema_id: &str,
        tag: Option<String>,
        revocation_details: Option<Value>,
        thread_id: Option<ThreadID>,
    ) -> Result<Self, ProtocolError> {
        for (field, value) in [(FIELD_NAME, name), (FIELD_SCHEMA_ID, schema_id)] {
            if value.trim().is_empty() {
                return Err(ProtocolError::MessageError(
                    MessageError::MissingField(field.to_string()).to_string(),
                ));
            }
        }

        Ok(Self {
            protocol: Protocol::new(Self::family(), None, thread_id),
            name: name.to_string(),
            schema_id: schema_id.to_string(),
            tag: tag.unwrap_or_else(|| DEFAULT_TAG.to_string()),
            revocation_details: revocation_details
                .unwrap_or_else(|| json!({"support_revocation": false})),
        })
    }

    pub fn protocol(&self) -> &Protocol {
        &self.protocol
    }

    pub fn write_msg(&self) -> Envelope {
        self.protocol
            .base_message(MSG_WRITE)
            .with(FIELD_NAME, self.name.as_str())
            .with(FIELD_SCHEMA_ID, self.schema_id.as_str())
            .with(FIELD_TAG, self.tag.as_str())
            .with(FIELD_REVOCATION_DETAILS, self.revocation_details.clone())
    }

    pub async fn write_msg_packed<TCrypto, TTransport>(
        &self,
        session: &Session<TCrypto, TTransport>,
    ) -> Result<Vec<u8>, ProtocolError>
    where
        TCrypto: CryptoBuilder,
        TTransport: TransportBuilder,
    {
        session.pack(&self.protocol, &self.write_msg()).await
    }

    /// Write the definition and wait for its ledger identifier
    pub async fn write<TCrypto, TTransport>(
        &self,
        session: &Session<TCrypto, TTransport>,
    ) -> Result<String, CorrelationError>
    where
        TCrypto: CryptoBuilder,
        TTransport: TransportBuilder,
    {
        let message: WriteCredentialDefinitionMessage = session
            .request_expecting(&self.protocol, &self.write_msg(), &[MSG_STATUS_REPORT])
            .await?;

        match message {
            WriteCredentialDefinitionMessage::Status { cred_def_id } => Ok(cred_def_id),
            other => Err(CorrelationError::Rejected(format!("{:?}", other))),
        }
    }
}
