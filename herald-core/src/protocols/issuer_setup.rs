use rst_common::standard::serde::{self, Deserialize};

use crate::correlation::types::CorrelationError;
use crate::crypto::types::CryptoBuilder;
use crate::message::types::{Qualifier, ThreadID, MSG_PROBLEM_REPORT};
use crate::message::{Envelope, MessageFamily};
use crate::protocol::types::{FamilyMessage, ProtocolError};
use crate::protocol::Protocol;
use crate::session::Session;
use crate::transport::types::TransportBuilder;

use super::problem_report::{unexpected, ProblemReport};

pub const FAMILY: &str = "issuer-setup";
pub const VERSION: &str = "0.6";

pub const MSG_CREATE: &str = "create";
pub const MSG_CURRENT_PUBLIC_IDENTIFIER: &str = "current-public-identifier";

pub const MSG_PUBLIC_IDENTIFIER_CREATED: &str = "public-identifier-created";
pub const MSG_PUBLIC_IDENTIFIER: &str = "public-identifier";

#[derive(Debug, Deserialize)]
#[serde(crate = "self::serde")]
struct Identifier {
    did: String,

    #[serde(rename = "verKey")]
    verkey: String,
}

#[derive(Debug, Deserialize)]
#[serde(crate = "self::serde")]
struct IdentifierPayload {
    identifier: Identifier,
}

#[derive(Debug, Deserialize)]
#[serde(crate = "self::serde")]
struct CurrentIdentifierPayload {
    did: String,

    #[serde(rename = "verKey")]
    verkey: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IssuerSetupMessage {
    PublicIdentifierCreated { did: String, verkey: String },
    PublicIdentifier { did: String, verkey: String },
    ProblemReport(ProblemReport),
    Unexpected(String),
}

impl IssuerSetupMessage {
    /// The issuer's public DID and verkey, for either identifier message
    pub fn identifier(&self) -> Option<(&str, &str)> {
        match self {
            Self::PublicIdentifierCreated { did, verkey } | Self::PublicIdentifier { did, verkey } => {
                Some((did, verkey))
            }
            _ => None,
        }
    }
}

impl FamilyMessage for IssuerSetupMessage {
    fn decode(message_name: &str, envelope: &Envelope) -> Self {
        match message_name {
            MSG_PUBLIC_IDENTIFIER_CREATED => match envelope.decode::<IdentifierPayload>() {
                Ok(payload) => Self::PublicIdentifierCreated {
                    did: payload.identifier.did,
                    verkey: payload.identifier.verkey,
                },
                Err(err) => Self::Unexpected(unexpected(message_name, &err.to_string())),
            },
            // older agents answer with the identifier nested, newer ones flatten it
            MSG_PUBLIC_IDENTIFIER => match envelope
                .decode::<IdentifierPayload>()
                .map(|payload| (payload.identifier.did, payload.identifier.verkey))
                .or_else(|_| {
                    envelope
                        .decode::<CurrentIdentifierPayload>()
                        .map(|payload| (payload.did, payload.verkey))
                }) {
                Ok((did, verkey)) => Self::PublicIdentifier { did, verkey },
                Err(err) => Self::Unexpected(unexpected(message_name, &err.to_string())),
            },
            MSG_PROBLEM_REPORT => Self::ProblemReport(ProblemReport::from_envelope(envelope)),
            _ => Self::Unexpected(unexpected(message_name, "not part of issuer-setup")),
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

/// `IssuerSetup` creates the issuer's public identifier on the agent
#[derive(Debug, Clone)]
pub struct IssuerSetup {
    protocol: Protocol,
}

impl IssuerSetup {
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

    pub fn create_msg(&self) -> Envelope {
        self.protocol.base_message(MSG_CREATE)
    }

    pub fn current_public_identifier_msg(&self) -> Envelope {
        self.protocol.base_message(MSG_CURRENT_PUBLIC_IDENTIFIER)
    }

    pub async fn create_msg_packed<TCrypto, TTransport>(
        &self,
        session: &Session<TCrypto, TTransport>,
    ) -> Result<Vec<u8>, ProtocolError>
    where
        TCrypto: CryptoBuilder,
        TTransport: TransportBuilder,
    {
        session.pack(&self.protocol, &self.create_msg()).await
    }

    pub async fn current_public_identifier_msg_packed<TCrypto, TTransport>(
        &self,
        session: &Session<TCrypto, TTransport>,
    ) -> Result<Vec<u8>, ProtocolError>
    where
        TCrypto: CryptoBuilder,
        TTransport: TransportBuilder,
    {
        session
            .pack(&self.protocol, &self.current_public_identifier_msg())
            .await
    }

    /// Create the public identifier, returning its DID and verkey
    pub async fn create<TCrypto, TTransport>(
        &self,
        session: &Session<TCrypto, TTransport>,
    ) -> Result<(String, String), CorrelationError>
    where
        TCrypto: CryptoBuilder,
        TTransport: TransportBuilder,
    {
        let message: IssuerSetupMessage = session
            .request_expecting(
                &self.protocol,
                &self.create_msg(),
                &[MSG_PUBLIC_IDENTIFIER_CREATED],
            )
            .await?;

        Self::into_identifier(message)
    }

    pub async fn current_public_identifier<TCrypto, TTransport>(
        &self,
        session: &Session<TCrypto, TTransport>,
    ) -> Result<(String, String), CorrelationError>
    where
        TCrypto: CryptoBuilder,
        TTransport: TransportBuilder,
    {
        let message: IssuerSetupMessage = session
            .request_expecting(
                &self.protocol,
                &self.current_public_identifier_msg(),
                &[MSG_PUBLIC_IDENTIFIER],
            )
            .await?;

        Self::into_identifier(message)
    }

    fn into_identifier(message: IssuerSetupMessage) -> Result<(String, String), CorrelationError> {
        match message {
            IssuerSetupMessage::PublicIdentifierCreated { did, verkey }
            | IssuerSetupMessage::PublicIdentifier { did, verkey } => Ok((did, verkey)),
            other => Err(CorrelationError::Rejected(format!("{:?}", other))),
        }
    }
}
