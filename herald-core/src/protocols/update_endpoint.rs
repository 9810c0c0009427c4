use rst_common::standard::serde_json::json;

use crate::context::Context;
use crate::correlation::types::CorrelationError;
use crate::crypto::types::CryptoBuilder;
use crate::message::types::{MessageError, Qualifier, ThreadID, MSG_PROBLEM_REPORT};
use crate::message::{Envelope, MessageFamily};
use crate::protocol::types::{FamilyMessage, ProtocolError};
use crate::protocol::Protocol;
use crate::session::Session;
use crate::transport::types::TransportBuilder;

use super::problem_report::{unexpected, ProblemReport};

pub const FAMILY: &str = "configs";
pub const VERSION: &str = "0.6";

pub const MSG_UPDATE_COM_METHOD: &str = "UPDATE_COM_METHOD";
pub const MSG_COM_METHOD_UPDATED: &str = "COM_METHOD_UPDATED";

const FIELD_COM_METHOD: &str = "comMethod";
const FIELD_ID: &str = "id";

const COM_METHOD_ID: &str = "webhook";
const COM_METHOD_TYPE_HTTP: u8 = 2;
const PACKAGING_TYPE: &str = "1.0";

#[derive(Debug, Clone, PartialEq)]
pub enum UpdateEndpointMessage {
    Updated { id: Option<String> },
    ProblemReport(ProblemReport),
    Unexpected(String),
}

impl FamilyMessage for UpdateEndpointMessage {
    fn decode(message_name: &str, envelope: &Envelope) -> Self {
        match message_name {
            MSG_COM_METHOD_UPDATED => Self::Updated {
                id: envelope.get_str(FIELD_ID).map(String::from),
            },
            MSG_PROBLEM_REPORT => Self::ProblemReport(ProblemReport::from_envelope(envelope)),
            _ => Self::Unexpected(unexpected(message_name, "not part of configs")),
        }
    }

    fn failure(&self) -> Option<String> {
        match self {
            Self::Updated { .. } => None,
            Self::ProblemReport(report) => Some(report.to_string()),
            Self::Unexpected(reason) => Some(reason.clone()),
        }
    }
}

/// `UpdateEndpoint` registers the context's endpoint url as the agent's webhook
#[derive(Debug, Clone)]
pub struct UpdateEndpoint {
    protocol: Protocol,
}

impl Default for UpdateEndpoint {
    fn default() -> Self {
        Self::new(None)
    }
}

impl UpdateEndpoint {
    pub fn family() -> MessageFamily {
        MessageFamily::known(Qualifier::Agency, FAMILY, VERSION)
    }

    pub fn new(thread_id: Option<ThreadID>) -> Self {
        Self {
            protocol: Protocol::new(Self::family(), None, thread_id),
        }
    }

    pub fn protocol(&self) -> &Protocol {
        &self.protocol
    }

    /// Messages are packed for the sdk verkey, so the webhook must advertise it
    pub fn update_msg(&self, context: &Context) -> Result<Envelope, ProtocolError> {
        let endpoint_url = context.endpoint_url().ok_or_else(|| {
            ProtocolError::MessageError(
                MessageError::MissingField("endpointUrl".to_string()).to_string(),
            )
        })?;

        Ok(self.protocol.base_message(MSG_UPDATE_COM_METHOD).with(
            FIELD_COM_METHOD,
            json!({
                "id": COM_METHOD_ID,
                "type": COM_METHOD_TYPE_HTTP,
                "value": endpoint_url,
                "packaging": {
                    "pkgType": PACKAGING_TYPE,
                    "recipientKeys": [context.sdk_verkey()],
                },
            }),
        ))
    }

    pub async fn update_msg_packed<TCrypto, TTransport>(
        &self,
        session: &Session<TCrypto, TTransport>,
    ) -> Result<Vec<u8>, ProtocolError>
    where
        TCrypto: CryptoBuilder,
        TTransport: TransportBuilder,
    {
        let msg = self.update_msg(&*session.context().await)?;
        session.pack(&self.protocol, &msg).await
    }

    /// Send the update without waiting for the agent's confirmation
    pub async fn update<TCrypto, TTransport>(
        &self,
        session: &Session<TCrypto, TTransport>,
    ) -> Result<(), ProtocolError>
    where
        TCrypto: CryptoBuilder,
        TTransport: TransportBuilder,
    {
        let msg = self.update_msg(&*session.context().await)?;
        session.send(&self.protocol, &msg).await?;
        Ok(())
    }

    /// Send the update and wait until the agent confirms the new endpoint
    pub async fn update_and_wait<TCrypto, TTransport>(
        &self,
        session: &Session<TCrypto, TTransport>,
    ) -> Result<(), CorrelationError>
    where
        TCrypto: CryptoBuilder,
        TTransport: TransportBuilder,
    {
        let msg = self
            .update_msg(&*session.context().await)
            .map_err(|err| CorrelationError::SendError(err.to_string()))?;

        let message: UpdateEndpointMessage = session
            .request_expecting(&self.protocol, &msg, &[MSG_COM_METHOD_UPDATED])
            .await?;

        match message {
            UpdateEndpointMessage::Updated { .. } => Ok(()),
            other => Err(CorrelationError::Rejected(format!("{:?}", other))),
        }
    }
}
