use rst_common::standard::serde_json::Value;

use crate::correlation::types::CorrelationError;
use crate::crypto::types::CryptoBuilder;
use crate::message::types::{Qualifier, ThreadID, MSG_PROBLEM_REPORT, MSG_STATUS_REPORT};
use crate::message::{Envelope, MessageFamily};
use crate::protocol::types::{FamilyMessage, ProtocolError};
use crate::protocol::Protocol;
use crate::session::Session;
use crate::transport::types::TransportBuilder;

use super::problem_report::{unexpected, ProblemReport};

pub const FAMILY: &str = "issue-credential";
pub const VERSION: &str = "0.6";

pub const MSG_OFFER: &str = "offer";
pub const MSG_ISSUE: &str = "issue";
pub const MSG_GET_STATUS: &str = "get-status";

pub const MSG_ASK_ACCEPT: &str = "ask-accept";

const FIELD_NAME: &str = "name";
const FIELD_CRED_DEF_ID: &str = "credDefId";
const FIELD_CREDENTIAL_VALUES: &str = "credentialValues";
const FIELD_PRICE: &str = "price";
const FIELD_STATUS: &str = "status";

const DEFAULT_PRICE: &str = "0";

#[derive(Debug, Clone, PartialEq)]
pub enum IssueCredentialMessage {
    AskAccept,
    Status(Value),
    ProblemReport(ProblemReport),
    Unexpected(String),
}

impl FamilyMessage for IssueCredentialMessage {
    fn decode(message_name: &str, envelope: &Envelope) -> Self {
        match message_name {
            MSG_ASK_ACCEPT => Self::AskAccept,
            MSG_STATUS_REPORT => {
                Self::Status(envelope.get(FIELD_STATUS).cloned().unwrap_or(Value::Null))
            }
            MSG_PROBLEM_REPORT => Self::ProblemReport(ProblemReport::from_envelope(envelope)),
            _ => Self::Unexpected(unexpected(message_name, "not part of issue-credential")),
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

/// `IssueCredential` offers a credential on a pairwise relationship, then issues it once
/// the holder asked to accept
#[derive(Debug, Clone)]
pub struct IssueCredential {
    protocol: Protocol,
    name: String,
    cred_def_id: String,
    values: Value,
    price: String,
}

impl IssueCredential {
    pub fn family() -> MessageFamily {
        MessageFamily::known(Qualifier::Agency, FAMILY, VERSION)
    }

    pub fn new(
        for_relationship: &str,
        name: &str,
        cred_def_id: &str,
        values: Value,
        price: Option<String>,
        thread_id: Option<ThreadID>,
    ) -> Self {
        Self {
            protocol: Protocol::new(Self::family(), Some(for_relationship.to_string()), thread_id),
            name: name.to_string(),
            cred_def_id: cred_def_id.to_string(),
            values,
            price: price.unwrap_or_else(|| DEFAULT_PRICE.to_string()),
        }
    }

    pub fn protocol(&self) -> &Protocol {
        &self.protocol
    }

    pub fn offer_msg(&self) -> Envelope {
        self.protocol
            .base_message(MSG_OFFER)
            .with(FIELD_NAME, self.name.as_str())
            .with(FIELD_CRED_DEF_ID, self.cred_def_id.as_str())
            .with(FIELD_CREDENTIAL_VALUES, self.values.clone())
            .with(FIELD_PRICE, self.price.as_str())
    }

    pub fn issue_msg(&self) -> Envelope {
        self.protocol.base_message(MSG_ISSUE)
    }

    pub fn status_msg(&self) -> Envelope {
        self.protocol.base_message(MSG_GET_STATUS)
    }

    pub async fn offer_msg_packed<TCrypto, TTransport>(
        &self,
        session: &Session<TCrypto, TTransport>,
    ) -> Result<Vec<u8>, ProtocolError>
    where
        TCrypto: CryptoBuilder,
        TTransport: TransportBuilder,
    {
        session.pack(&self.protocol, &self.offer_msg()).await
    }

    pub async fn issue_msg_packed<TCrypto, TTransport>(
        &self,
        session: &Session<TCrypto, TTransport>,
    ) -> Result<Vec<u8>, ProtocolError>
    where
        TCrypto: CryptoBuilder,
        TTransport: TransportBuilder,
    {
        session.pack(&self.protocol, &self.issue_msg()).await
    }

    /// Send the offer and wait until the holder asks to accept it
    pub async fn offer<TCrypto, TTransport>(
        &self,
        session: &Session<TCrypto, TTransport>,
    ) -> Result<(), CorrelationError>
    where
        TCrypto: CryptoBuilder,
        TTransport: TransportBuilder,
    {
        let message: IssueCredentialMessage = session
            .request_expecting(&self.protocol, &self.offer_msg(), &[MSG_ASK_ACCEPT])
            .await?;

        match message {
            IssueCredentialMessage::AskAccept => Ok(()),
            other => Err(CorrelationError::Rejected(format!("{:?}", other))),
        }
    }

    /// Issue the credential, the agent reports progress through status reports
    pub async fn issue<TCrypto, TTransport>(
        &self,
        session: &Session<TCrypto, TTransport>,
    ) -> Result<(), ProtocolError>
    where
        TCrypto: CryptoBuilder,
        TTransport: TransportBuilder,
    {
        session.send(&self.protocol, &self.issue_msg()).await?;
        Ok(())
    }

    pub async fn status<TCrypto, TTransport>(
        &self,
        session: &Session<TCrypto, TTransport>,
    ) -> Result<Value, CorrelationError>
    where
        TCrypto: CryptoBuilder,
        TTransport: TransportBuilder,
    {
        let message: IssueCredentialMessage = session
            .request_expecting(&self.protocol, &self.status_msg(), &[MSG_STATUS_REPORT])
            .await?;

        match message {
            IssueCredentialMessage::Status(status) => Ok(status),
            other => Err(CorrelationError::Rejected(format!("{:?}", other))),
        }
    }
}
