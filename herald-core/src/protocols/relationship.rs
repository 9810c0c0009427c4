use crate::correlation::types::CorrelationError;
use crate::crypto::types::CryptoBuilder;
use crate::message::types::{Qualifier, ThreadID, MSG_PROBLEM_REPORT};
use crate::message::{Envelope, MessageFamily};
use crate::protocol::types::{FamilyMessage, ProtocolError};
use crate::protocol::Protocol;
use crate::session::Session;
use crate::transport::types::TransportBuilder;

use super::problem_report::{unexpected, ProblemReport};

pub const FAMILY: &str = "relationship";
pub const VERSION: &str = "1.0";

pub const MSG_CREATE: &str = "create";
pub const MSG_CONNECTION_INVITATION: &str = "connection-invitation";

pub const MSG_CREATED: &str = "created";
pub const MSG_INVITATION: &str = "invitation";

const FIELD_LABEL: &str = "label";
const FIELD_LOGO_URL: &str = "logoUrl";
const FIELD_DID: &str = "did";
const FIELD_VERKEY: &str = "verKey";
const FIELD_INVITE_URL: &str = "inviteURL";

#[derive(Debug, Clone, PartialEq)]
pub enum RelationshipMessage {
    Created { did: String, verkey: String },
    Invitation { invite_url: String },
    ProblemReport(ProblemReport),
    Unexpected(String),
}

impl FamilyMessage for RelationshipMessage {
    fn decode(message_name: &str, envelope: &Envelope) -> Self {
        let decoded = match message_name {
            MSG_CREATED => envelope.require_str(FIELD_DID).and_then(|did| {
                envelope.require_str(FIELD_VERKEY).map(|verkey| Self::Created {
                    did: did.to_string(),
                    verkey: verkey.to_string(),
                })
            }),
            MSG_INVITATION => envelope
                .require_str(FIELD_INVITE_URL)
                .map(|invite_url| Self::Invitation {
                    invite_url: invite_url.to_string(),
                }),
            MSG_PROBLEM_REPORT => Ok(Self::ProblemReport(ProblemReport::from_envelope(envelope))),
            _ => Ok(Self::Unexpected(unexpected(
                message_name,
                "not part of relationship",
            ))),
        };

        decoded.unwrap_or_else(|err| Self::Unexpected(unexpected(message_name, &err.to_string())))
    }

    fn failure(&self) -> Option<String> {
        match self {
            Self::ProblemReport(report) => Some(report.to_string()),
            Self::Unexpected(reason) => Some(reason.clone()),
            _ => None,
        }
    }
}

/// `Relationship` creates a pairwise relationship and its out-of-band invitation
///
/// Only an instance started with [`Relationship::new`] may send `create`. Invitations are
/// sent on behalf of an existing relationship DID.
#[derive(Debug, Clone)]
pub struct Relationship {
    protocol: Protocol,
    label: String,
    logo_url: Option<String>,
    started: bool,
}

impl Relationship {
    pub fn family() -> MessageFamily {
        MessageFamily::known(Qualifier::Community, FAMILY, VERSION)
    }

    pub fn new(label: Option<String>, logo_url: Option<String>) -> Self {
        Self {
            protocol: Protocol::new(Self::family(), None, None),
            label: label
                .filter(|label| !label.trim().is_empty())
                .unwrap_or_default(),
            logo_url,
            started: true,
        }
    }

    /// Continue the protocol for an already created relationship
    pub fn existing(for_relationship: &str, thread_id: ThreadID) -> Self {
        Self {
            protocol: Protocol::new(
                Self::family(),
                Some(for_relationship.to_string()),
                Some(thread_id),
            ),
            label: String::new(),
            logo_url: None,
            started: false,
        }
    }

    pub fn protocol(&self) -> &Protocol {
        &self.protocol
    }

    pub fn create_msg(&self) -> Result<Envelope, ProtocolError> {
        if !self.started {
            return Err(ProtocolError::MessageError(
                "unable to create a relationship without starting the interaction".to_string(),
            ));
        }

        let mut msg = self
            .protocol
            .base_message(MSG_CREATE)
            .with(FIELD_LABEL, self.label.as_str());

        if let Some(logo_url) = &self.logo_url {
            msg.insert(FIELD_LOGO_URL, logo_url.as_str());
        }

        Ok(msg)
    }

    pub fn connection_invitation_msg(&self) -> Envelope {
        self.protocol.base_message(MSG_CONNECTION_INVITATION)
    }

    pub async fn create_msg_packed<TCrypto, TTransport>(
        &self,
        session: &Session<TCrypto, TTransport>,
    ) -> Result<Vec<u8>, ProtocolError>
    where
        TCrypto: CryptoBuilder,
        TTransport: TransportBuilder,
    {
        session.pack(&self.protocol, &self.create_msg()?).await
    }

    pub async fn connection_invitation_msg_packed<TCrypto, TTransport>(
        &self,
        session: &Session<TCrypto, TTransport>,
    ) -> Result<Vec<u8>, ProtocolError>
    where
        TCrypto: CryptoBuilder,
        TTransport: TransportBuilder,
    {
        session
            .pack(&self.protocol, &self.connection_invitation_msg())
            .await
    }

    /// Create the relationship, returning the instance bound to the new relationship DID
    pub async fn create<TCrypto, TTransport>(
        &self,
        session: &Session<TCrypto, TTransport>,
    ) -> Result<Relationship, CorrelationError>
    where
        TCrypto: CryptoBuilder,
        TTransport: TransportBuilder,
    {
        let msg = self
            .create_msg()
            .map_err(|err| CorrelationError::SendError(err.to_string()))?;

        let message: RelationshipMessage = session
            .request_expecting(&self.protocol, &msg, &[MSG_CREATED])
            .await?;

        match message {
            RelationshipMessage::Created { did, .. } => Ok(Self::existing(
                &did,
                self.protocol.thread_id().clone(),
            )),
            other => Err(CorrelationError::Rejected(format!("{:?}", other))),
        }
    }

    /// Ask for an invitation, returning its URL
    pub async fn connection_invitation<TCrypto, TTransport>(
        &self,
        session: &Session<TCrypto, TTransport>,
    ) -> Result<String, CorrelationError>
    where
        TCrypto: CryptoBuilder,
        TTransport: TransportBuilder,
    {
        let message: RelationshipMessage = session
            .request_expecting(
                &self.protocol,
                &self.connection_invitation_msg(),
                &[MSG_INVITATION],
            )
            .await?;

        match message {
            RelationshipMessage::Invitation { invite_url } => Ok(invite_url),
            other => Err(CorrelationError::Rejected(format!("{:?}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rst_common::with_tokio::tokio;

    use crate::testing::{provisioned_session, respond_to, sent_messages};

    #[test]
    fn test_create_msg() {
        let relationship = Relationship::new(
            Some("faber".to_string()),
            Some("http://logo.test/faber.png".to_string()),
        );
        let msg = relationship.create_msg().unwrap();

        assert_eq!(
            msg.msg_type(),
            Some("did:sov:BzCbsNYhMrjHiqZDTUASHg;spec/relationship/1.0/create")
        );
        assert_eq!(msg.get_str("label"), Some("faber"));
        assert_eq!(msg.get_str("logoUrl"), Some("http://logo.test/faber.png"));
        assert!(msg.for_relationship().is_none());
    }

    #[test]
    fn test_create_msg_blank_label() {
        let msg = Relationship::new(Some("  ".to_string()), None)
            .create_msg()
            .unwrap();

        assert_eq!(msg.get_str("label"), Some(""));
        assert!(msg.get("logoUrl").is_none());
    }

    #[test]
    fn test_existing_cannot_create() {
        let relationship = Relationship::existing("did:rel:1", ThreadID::from("thread-1"));
        assert!(relationship.create_msg().is_err());

        let msg = relationship.connection_invitation_msg();
        assert_eq!(msg.for_relationship(), Some("did:rel:1"));
        assert_eq!(msg.thread_id(), Some(ThreadID::from("thread-1")));
    }

    #[test]
    fn test_decode_created_missing_verkey() {
        let envelope = Relationship::family()
            .build_envelope(MSG_CREATED)
            .with("did", "did:rel:1");

        let message = RelationshipMessage::decode(MSG_CREATED, &envelope);
        assert!(matches!(message, RelationshipMessage::Unexpected(_)));
    }

    #[tokio::test]
    async fn test_create_then_invitation() {
        let (session, fixture) = provisioned_session();
        let relationship = Relationship::new(Some("faber".to_string()), None);

        let created = respond_to(&session, &fixture, 0, |_| {
            Relationship::family()
                .build_envelope(MSG_CREATED)
                .with("did", "did:rel:1")
                .with("verKey", "rel-verkey")
        });

        let existing = relationship.create(&session).await.unwrap();
        assert!(created.await.unwrap().is_ok());
        assert_eq!(existing.protocol().for_relationship(), Some("did:rel:1"));
        assert_eq!(
            existing.protocol().thread_id(),
            relationship.protocol().thread_id()
        );

        let invitation = respond_to(&session, &fixture, 1, |_| {
            Relationship::family()
                .build_envelope(MSG_INVITATION)
                .with("inviteURL", "http://agency.test/invite?c_i=abc")
        });

        let invite_url = existing.connection_invitation(&session).await.unwrap();
        assert_eq!(invite_url, "http://agency.test/invite?c_i=abc");
        assert!(invitation.await.unwrap().is_ok());

        let sent = sent_messages(&session, &fixture);
        assert_eq!(sent[1].for_relationship(), Some("did:rel:1"));
    }
}
