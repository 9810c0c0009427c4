use rst_common::with_http_tokio::axum::body::Bytes;
use rst_common::with_http_tokio::axum::extract::State;
use rst_common::with_http_tokio::axum::http::StatusCode;
use rst_common::with_tracing::tracing::{debug, error};

use prople_herald_core::crypto::types::CryptoBuilder;
use prople_herald_core::session::Session;
use prople_herald_core::transport::types::TransportBuilder;

pub const RESPONSE_SUCCESS: &str = "Success";

#[derive(Clone)]
pub struct WebhookState<TCrypto, TTransport>
where
    TCrypto: CryptoBuilder,
    TTransport: TransportBuilder,
{
    session: Session<TCrypto, TTransport>,
}

impl<TCrypto, TTransport> WebhookState<TCrypto, TTransport>
where
    TCrypto: CryptoBuilder,
    TTransport: TransportBuilder,
{
    pub fn new(session: Session<TCrypto, TTransport>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Session<TCrypto, TTransport> {
        &self.session
    }
}

pub async fn receive<TCrypto, TTransport>(
    State(state): State<WebhookState<TCrypto, TTransport>>,
    body: Bytes,
) -> (StatusCode, String)
where
    TCrypto: CryptoBuilder + 'static,
    TTransport: TransportBuilder + 'static,
{
    debug!("webhook received {} bytes", body.len());

    match state.session.handle_message(&body).await {
        Ok(dispatched) => {
            debug!("webhook message dispatched: {:?}", dispatched);
            (StatusCode::OK, RESPONSE_SUCCESS.to_string())
        }
        Err(err) => {
            error!("webhook message failed: {}", err);
            (StatusCode::OK, err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use mockall::mock;
    use rst_common::standard::async_trait::async_trait;
    use rst_common::with_tokio::tokio;

    use prople_crypto::ecdh::keypair::KeyPair;

    use prople_herald_core::context::Context;
    use prople_herald_core::crypto::Crypto;
    use prople_herald_core::handlers::handler_fn;
    use prople_herald_core::message::types::Qualifier;
    use prople_herald_core::message::MessageFamily;
    use prople_herald_core::transport::types::{PublicIdentity, TransportError};

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

    /// Receiving a webhook message never goes back out to the agent
    fn silent_transport() -> MockFakeTransport {
        let mut transport = MockFakeTransport::new();
        transport.expect_deliver().never();
        transport.expect_agency_identity().never();
        transport.expect_clone().returning(silent_transport);
        transport
    }

    fn state() -> WebhookState<Crypto, MockFakeTransport> {
        let context =
            Context::create(&Crypto::new(), "sdk", "sdk-key", "http://agency.test", None).unwrap();
        WebhookState::new(Session::new(context, Crypto::new(), silent_transport()))
    }

    async fn packed_for(
        state: &WebhookState<Crypto, MockFakeTransport>,
        message_name: &str,
    ) -> Bytes {
        let family = MessageFamily::new(Qualifier::Agency, "write-schema", "0.6").unwrap();
        let envelope = family
            .build_envelope(message_name)
            .with("schemaId", "schema:1");

        let sdk_verkey = state.session().context().await.sdk_verkey().to_string();
        let packed = Crypto::authcrypt(
            &KeyPair::generate(),
            &sdk_verkey,
            envelope.to_bytes().unwrap(),
        )
        .unwrap()
        .to_bytes()
        .unwrap();

        Bytes::from(packed)
    }

    #[tokio::test]
    async fn test_receive_dispatched() {
        let state = state();
        let counter = Arc::new(AtomicUsize::new(0));

        let handled = counter.clone();
        state.session().handlers().add_handler(
            "write-schema",
            "0.6",
            handler_fn(move |_name, _envelope| {
                let handled = handled.clone();
                async move {
                    handled.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            }),
        );

        let body = packed_for(&state, "status-report").await;
        let (status, text) = receive(State(state.clone()), body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(text, RESPONSE_SUCCESS);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_receive_unhandled_still_ok() {
        let state = state();
        let body = packed_for(&state, "status-report").await;
        let (status, text) = receive(State(state), body).await;

        assert_eq!(status, StatusCode::OK);
        assert!(text.contains("write-schema"));
    }

    #[tokio::test]
    async fn test_receive_garbage() {
        let (status, text) = receive(State(state()), Bytes::from_static(b"not packed")).await;

        assert_eq!(status, StatusCode::OK);
        assert_ne!(text, RESPONSE_SUCCESS);
    }
}
