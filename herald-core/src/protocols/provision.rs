use rst_common::with_logging::log::{debug, info};

use crate::context::Context;
use crate::crypto::types::CryptoBuilder;
use crate::message::types::{Qualifier, ThreadID, MSG_PROBLEM_REPORT};
use crate::message::{Envelope, MessageFamily};
use crate::protocol::types::{FamilyMessage, ProtocolError};
use crate::protocol::Protocol;
use crate::transport::types::TransportBuilder;

use super::problem_report::{unexpected, ProblemReport};

pub const FAMILY: &str = "agent-provisioning";
pub const VERSION: &str = "0.7";

pub const MSG_CREATE_EDGE_AGENT: &str = "create-edge-agent";
pub const MSG_AGENT_PROVISIONED: &str = "agent-provisioned";

const FIELD_REQUESTER_VK: &str = "requesterVk";
const FIELD_PROVISION_TOKEN: &str = "provisionToken";
const FIELD_SELF_DID: &str = "selfDID";
const FIELD_AGENT_VERKEY: &str = "agentVerKey";

#[derive(Debug, Clone, PartialEq)]
pub enum ProvisionMessage {
    Provisioned {
        self_did: String,
        agent_verkey: String,
    },
    ProblemReport(ProblemReport),
    Unexpected(String),
}

impl FamilyMessage for ProvisionMessage {
    fn decode(message_name: &str, envelope: &Envelope) -> Self {
        match message_name {
            MSG_AGENT_PROVISIONED => {
                let provisioned = envelope.require_str(FIELD_SELF_DID).and_then(|self_did| {
                    envelope
                        .require_str(FIELD_AGENT_VERKEY)
                        .map(|agent_verkey| Self::Provisioned {
                            self_did: self_did.to_string(),
                            agent_verkey: agent_verkey.to_string(),
                        })
                });

                provisioned
                    .unwrap_or_else(|err| Self::Unexpected(unexpected(message_name, &err.to_string())))
            }
            MSG_PROBLEM_REPORT => Self::ProblemReport(ProblemReport::from_envelope(envelope)),
            _ => Self::Unexpected(unexpected(message_name, "not part of agent-provisioning")),
        }
    }

    fn failure(&self) -> Option<String> {
        match self {
            Self::Provisioned { .. } => None,
            Self::ProblemReport(report) => Some(report.to_string()),
            Self::Unexpected(reason) => Some(reason.clone()),
        }
    }
}

/// `Provision` creates the cloud agent for a fresh context
///
/// Unlike every other family it is a plain request and response over the transport:
/// the agent does not exist yet, so nothing can reach the webhook.
#[derive(Debug, Clone)]
pub struct Provision {
    protocol: Protocol,
    token: Option<String>,
}

impl Provision {
    pub fn family() -> MessageFamily {
        MessageFamily::known(Qualifier::Agency, FAMILY, VERSION)
    }

    pub fn new(token: Option<String>, thread_id: Option<ThreadID>) -> Self {
        Self {
            protocol: Protocol::new(Self::family(), None, thread_id),
            token,
        }
    }

    pub fn protocol(&self) -> &Protocol {
        &self.protocol
    }

    pub fn provision_msg(&self, context: &Context) -> Envelope {
        let mut msg = self
            .protocol
            .base_message(MSG_CREATE_EDGE_AGENT)
            .with(FIELD_REQUESTER_VK, context.sdk_verkey());

        if let Some(token) = &self.token {
            msg.insert(FIELD_PROVISION_TOKEN, token.as_str());
        }

        msg
    }

    /// Requires the agency identity on the context
    pub fn provision_msg_packed<TCrypto: CryptoBuilder>(
        &self,
        context: &Context,
        crypto: &TCrypto,
    ) -> Result<Vec<u8>, ProtocolError> {
        crypto
            .pack_for_agency(context, &self.provision_msg(context))
            .map_err(|err| ProtocolError::PackError(err.to_string()))
    }

    /// Provision the agent, returning the context updated with the agent's identity
    ///
    /// The agency identity is fetched first when the context does not carry it yet.
    pub async fn provision<TCrypto, TTransport>(
        &self,
        mut context: Context,
        crypto: &TCrypto,
        transport: &TTransport,
    ) -> Result<Context, ProtocolError>
    where
        TCrypto: CryptoBuilder,
        TTransport: TransportBuilder,
    {
        if context.agent_public_verkey().is_none() {
            let identity = transport
                .agency_identity(context.agent_url())
                .await
                .map_err(|err| ProtocolError::TransportError(err.to_string()))?;

            debug!("agency identity fetched: {}", identity.did);
            context.set_agency_identity(identity.did, identity.verkey);
        }

        let packed = self.provision_msg_packed(&context, crypto)?;
        let response = self
            .protocol
            .deliver(transport, context.agent_url(), packed)
            .await?;

        let envelope = crypto
            .unpack(&context, &response)
            .map_err(|err| ProtocolError::UnpackError(err.to_string()))?;

        let msg_type = envelope
            .parse_type()
            .map_err(|err| ProtocolError::MessageError(err.to_string()))?;

        match ProvisionMessage::decode(msg_type.name(), &envelope) {
            ProvisionMessage::Provisioned {
                self_did,
                agent_verkey,
            } => {
                info!("agent provisioned, domain did: {}", self_did);
                context.set_provisioned(self_did, agent_verkey);
                Ok(context)
            }
            other => Err(ProtocolError::Rejected(
                other
                    .failure()
                    .unwrap_or_else(|| format!("{:?}", other)),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use mockall::mock;
    use rst_common::standard::async_trait::async_trait;
    use rst_common::with_tokio::tokio;

    use crate::crypto::Crypto;
    use crate::testing::{AgentFixture, AGENCY_DID, AGENT_URL, DOMAIN_DID};
    use crate::transport::types::{PublicIdentity, TransportError};

    mock!(
        FakeTransport{}

        impl Clone for FakeTransport {
            fn clone(&self) -> Self;
        }

        #[async_trait]
        impl TransportBuilder for FakeTransport {
            async fn deliver(&self, agent_url: &str, packed: Vec<u8>) -> Result<Vec<u8>, TransportError>;
            async fn agency_identity(&self, agent_url: &str) -> Result<PublicIdentity, TransportError>;
        }
    );

    fn fresh_context() -> Context {
        Context::create(&Crypto::new(), "sdk", "sdk-key", AGENT_URL, None).unwrap()
    }

    /// Answers the provisioning request the way the agency would
    fn agency_answer(fixture: &AgentFixture, packed: &[u8], response_name: &str) -> Vec<u8> {
        let plain = Crypto::open(&fixture.wallet, packed).unwrap();
        let request = Envelope::from_bytes(&plain).unwrap();
        let requester = request.require_str("requesterVk").unwrap();

        let mut response = Provision::family().build_envelope(response_name);
        if response_name == MSG_AGENT_PROVISIONED {
            response.insert("selfDID", DOMAIN_DID);
            response.insert("agentVerKey", fixture.agent_verkey.as_str());
        } else {
            response.insert("description", "invalid token");
        }

        let agency = fixture.wallet.keypair(&fixture.agency_verkey).unwrap();
        Crypto::authcrypt(agency, requester, response.to_bytes().unwrap())
            .unwrap()
            .to_bytes()
            .unwrap()
    }

    fn agency(fixture: &AgentFixture, response_name: &'static str) -> MockFakeTransport {
        let mut transport = MockFakeTransport::new();

        let verkey = fixture.agency_verkey.clone();
        transport
            .expect_agency_identity()
            .withf(|url| url.to_string() == AGENT_URL)
            .times(1)
            .returning(move |_| {
                Ok(PublicIdentity {
                    did: AGENCY_DID.to_string(),
                    verkey: verkey.clone(),
                })
            });

        let fixture = fixture.clone();
        transport
            .expect_deliver()
            .times(1)
            .returning(move |_, packed| Ok(agency_answer(&fixture, &packed, response_name)));

        transport
    }

    #[test]
    fn test_provision_msg() {
        let context = fresh_context();
        let msg = Provision::new(Some("token-1".to_string()), None).provision_msg(&context);

        assert_eq!(
            msg.msg_type(),
            Some("did:sov:123456789abcdefghi1234;spec/agent-provisioning/0.7/create-edge-agent")
        );
        assert_eq!(msg.get_str("requesterVk"), Some(context.sdk_verkey()));
        assert_eq!(msg.get_str("provisionToken"), Some("token-1"));

        let msg = Provision::new(None, None).provision_msg(&context);
        assert!(msg.get("provisionToken").is_none());
    }

    #[test]
    fn test_provision_msg_packed_requires_agency() {
        let result = Provision::new(None, None).provision_msg_packed(&fresh_context(), &Crypto::new());
        assert!(matches!(result, Err(ProtocolError::PackError(_))));
    }

    #[tokio::test]
    async fn test_provision() {
        let fixture = AgentFixture::new();
        let transport = agency(&fixture, MSG_AGENT_PROVISIONED);

        let context = Provision::new(None, None)
            .provision(fresh_context(), &Crypto::new(), &transport)
            .await
            .unwrap();

        assert!(context.is_provisioned());
        assert_eq!(context.agent_public_did(), Some(AGENCY_DID));
        assert_eq!(context.domain_did(), Some(DOMAIN_DID));
        assert_eq!(context.agent_verkey(), Some(fixture.agent_verkey.as_str()));
    }

    #[tokio::test]
    async fn test_provision_problem_report() {
        let fixture = AgentFixture::new();
        let transport = agency(&fixture, MSG_PROBLEM_REPORT);

        let result = Provision::new(Some("bad".to_string()), None)
            .provision(fresh_context(), &Crypto::new(), &transport)
            .await;

        assert_eq!(
            result.unwrap_err(),
            ProtocolError::Rejected("invalid token".to_string())
        );
    }

    #[tokio::test]
    async fn test_provision_agency_unreachable() {
        let mut transport = MockFakeTransport::new();
        transport
            .expect_agency_identity()
            .returning(|_| Err(TransportError::Network("connection refused".to_string())));
        transport.expect_deliver().never();

        let result = Provision::new(None, None)
            .provision(fresh_context(), &Crypto::new(), &transport)
            .await;

        assert!(matches!(result, Err(ProtocolError::TransportError(_))));
    }
}
