use rst_common::standard::serde_json::Value;

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

pub const FAMILY: &str = "write-schema";
pub const VERSION: &str = "0.6";

pub const MSG_WRITE: &str = "write";

const FIELD_NAME: &str = "name";
const FIELD_VERSION: &str = "version";
const FIELD_ATTR_NAMES: &str = "attrNames";
const FIELD_SCHEMA_ID: &str = "schemaId";

#[derive(Debug, Clone, PartialEq)]
pub enum WriteSchemaMessage {
    Status { schema_id: String },
    ProblemReport(ProblemReport),
    Unexpected(String),
}

impl FamilyMessage for WriteSchemaMessage {
    fn decode(message_name: &str, envelope: &Envelope) -> Self {
        match message_name {
            MSG_STATUS_REPORT => match envelope.require_str(FIELD_SCHEMA_ID) {
                Ok(schema_id) => Self::Status {
                    schema_id: schema_id.to_string(),
                },
                Err(err) => Self::Unexpected(unexpected(message_name, &err.to_string())),
            },
            MSG_PROBLEM_REPORT => Self::ProblemReport(ProblemReport::from_envelope(envelope)),
            _ => Self::Unexpected(unexpected(message_name, "not part of write-schema")),
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

/// `WriteSchema` writes a credential schema to the ledger through the agent
#[derive(Debug, Clone)]
pub struct WriteSchema {
    protocol: Protocol,
    name: String,
    version: String,
    attrs: Vec<String>,
}

impl WriteSchema {
    pub fn family() -> MessageFamily {
        MessageFamily::known(Qualifier::Agency, FAMILY, VERSION)
    }

    pub fn new(
        name: &str,
        version: &str,
        attrs: Vec<String>,
        thread_id: Option<ThreadID>,
    ) -> Result<Self, ProtocolError> {
        if name.trim().is_empty() {
            return Err(ProtocolError::MessageError(
                MessageError::MissingField(FIELD_NAME.to_string()).to_string(),
            ));
        }

        if version.trim().is_empty() {
            return Err(ProtocolError::MessageError(
                MessageError::MissingField(FIELD_VERSION.to_string()).to_string(),
            ));
        }

        Ok(Self {
            protocol: Protocol::new(Self::family(), None, thread_id),
            name: name.to_string(),
            version: version.to_string(),
            attrs,
        })
    }

    pub fn protocol(&self) -> &Protocol {
        &self.protocol
    }

    pub fn write_msg(&self) -> Envelope {
        self.protocol
            .base_message(MSG_WRITE)
            .with(FIELD_NAME, self.name.as_str())
            .with(FIELD_VERSION, self.version.as_str())
            .with(FIELD_ATTR_NAMES, Value::from(self.attrs.clone()))
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

    /// Write the schema and wait for its ledger identifier
    pub async fn write<TCrypto, TTransport>(
        &self,
        session: &Session<TCrypto, TTransport>,
    ) -> Result<String, CorrelationError>
    where
        TCrypto: CryptoBuilder,
        TTransport: TransportBuilder,
    {
        let message: WriteSchemaMessage = session
            .request_expecting(&self.protocol, &self.write_msg(), &[MSG_STATUS_REPORT])
            .await?;

        match message {
            WriteSchemaMessage::Status { schema_id } => Ok(schema_id),
            other => Err(CorrelationError::Rejected(format!("{:?}", other))),
        }
    }
}
