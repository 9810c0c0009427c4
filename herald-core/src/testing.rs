use std::sync::{Arc, Mutex};

use rst_common::standard::async_trait::async_trait;

use prople_crypto::ecdh::keypair::KeyPair;

use rst_common::with_tokio::tokio::{self, task::JoinHandle};

use crate::context::Context;
use crate::crypto::{Crypto, Wallet};
use crate::handlers::types::{DispatchError, Dispatched};
use crate::message::Envelope;
use crate::session::Session;
use crate::transport::types::{PublicIdentity, TransportBuilder, TransportError};

pub const AGENCY_DID: &str = "did:agency:1";
pub const DOMAIN_DID: &str = "did:domain:1";
pub const AGENT_URL: &str = "http://agency.test";

/// Key material of the remote side: the agency key and the provisioned agent key
#[derive(Clone)]
pub struct AgentFixture {
    pub wallet: Wallet,
    pub agency_verkey: String,
    pub agent_keypair: KeyPair,
    pub agent_verkey: String,
}

impl AgentFixture {
    pub fn new() -> Self {
        let mut wallet = Wallet::new("agent", "agent-key").unwrap();
        let agency_verkey = wallet.insert(KeyPair::generate());
        let agent_keypair = KeyPair::generate();
        let agent_verkey = wallet.insert(agent_keypair.clone());

        Self {
            wallet,
            agency_verkey,
            agent_keypair,
            agent_verkey,
        }
    }
}

/// Records every delivered payload, optionally failing every delivery
#[derive(Clone, Default)]
pub struct RecordingTransport {
    sent: Arc<Mutex<Vec<Vec<u8>>>>,
    fail: bool,
}

impl RecordingTransport {
    pub fn failing() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl TransportBuilder for RecordingTransport {
    async fn deliver(&self, _agent_url: &str, packed: Vec<u8>) -> Result<Vec<u8>, TransportError> {
        if self.fail {
            return Err(TransportError::Network("connection refused".to_string()));
        }

        self.sent.lock().unwrap().push(packed);
        Ok(Vec::new())
    }

    async fn agency_identity(&self, _agent_url: &str) -> Result<PublicIdentity, TransportError> {
        Err(TransportError::Network("not available".to_string()))
    }
}

pub fn provisioned_context(fixture: &AgentFixture) -> Context {
    let mut context = Context::create(
        &Crypto::new(),
        "sdk",
        "sdk-key",
        AGENT_URL,
        Some("http://sdk.test/webhook".to_string()),
    )
    .unwrap();

    context.set_agency_identity(AGENCY_DID.to_string(), fixture.agency_verkey.clone());
    context.set_provisioned(DOMAIN_DID.to_string(), fixture.agent_verkey.clone());
    context
}

pub fn provisioned_session() -> (Session<Crypto, RecordingTransport>, AgentFixture) {
    let fixture = AgentFixture::new();
    let context = provisioned_context(&fixture);
    let session = Session::new(context, Crypto::new(), RecordingTransport::default());
    (session, fixture)
}

pub fn failing_session() -> (Session<Crypto, RecordingTransport>, AgentFixture) {
    let fixture = AgentFixture::new();
    let context = provisioned_context(&fixture);
    let session = Session::new(context, Crypto::new(), RecordingTransport::failing());
    (session, fixture)
}

/// Unwrap every delivered payload the way the agent would
pub fn sent_messages(
    session: &Session<Crypto, RecordingTransport>,
    fixture: &AgentFixture,
) -> Vec<Envelope> {
    session
        .transport()
        .sent()
        .iter()
        .map(|packed| Crypto::unpack_forward(&fixture.wallet, packed).unwrap())
        .collect()
}

/// Pack a response from the agent for the session's sdk key
pub async fn agent_reply(
    session: &Session<Crypto, RecordingTransport>,
    fixture: &AgentFixture,
    envelope: &Envelope,
) -> Vec<u8> {
    let sdk_verkey = session.context().await.sdk_verkey().to_string();
    Crypto::authcrypt(&fixture.agent_keypair, &sdk_verkey, envelope.to_bytes().unwrap())
        .unwrap()
        .to_bytes()
        .unwrap()
}

/// Wait for the delivered message at `index`, then feed the agent's answer back
/// through the webhook path
pub fn respond_to<F>(
    session: &Session<Crypto, RecordingTransport>,
    fixture: &AgentFixture,
    index: usize,
    respond: F,
) -> JoinHandle<Result<Dispatched, DispatchError>>
where
    F: FnOnce(&Envelope) -> Envelope + Send + 'static,
{
    let session = session.clone();
    let fixture = fixture.clone();

    tokio::spawn(async move {
        let request = loop {
            let sent = sent_messages(&session, &fixture);
            if let Some(request) = sent.get(index) {
                break request.clone();
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        };

        let mut response = respond(&request);
        if let Some(thread_id) = request.thread_id() {
            response.set_thread(&thread_id);
        }

        let reply = agent_reply(&session, &fixture, &response).await;
        session.handle_message(&reply).await
    })
}
