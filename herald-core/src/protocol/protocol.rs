use rst_common::with_logging::log::debug;

use crate::context::Context;
use crate::crypto::types::CryptoBuilder;
use crate::message::types::ThreadID;
use crate::message::{Envelope, MessageFamily};
use crate::transport::types::TransportBuilder;

use super::types::ProtocolError;

/// `Protocol` is a single protocol instance
///
/// Every envelope it builds gets a fresh `@id` but shares the instance's thread id.
#[derive(Debug, Clone, PartialEq)]
pub struct Protocol {
    family: MessageFamily,
    thread_id: ThreadID,
    for_relationship: Option<String>,
}

impl Protocol {
    pub fn new(
        family: MessageFamily,
        for_relationship: Option<String>,
        thread_id: Option<ThreadID>,
    ) -> Self {
        Self {
            family,
            thread_id: thread_id.unwrap_or_else(ThreadID::generate),
            for_relationship,
        }
    }

    pub fn family(&self) -> &MessageFamily {
        &self.family
    }

    pub fn thread_id(&self) -> &ThreadID {
        &self.thread_id
    }

    pub fn for_relationship(&self) -> Option<&str> {
        self.for_relationship.as_deref()
    }

    pub fn base_message(&self, message_name: &str) -> Envelope {
        let mut envelope = self.family.build_envelope(message_name);
        envelope.set_thread(&self.thread_id);

        if let Some(relationship) = &self.for_relationship {
            envelope.set_relationship(relationship);
        }

        envelope
    }

    pub fn pack<TCrypto: CryptoBuilder>(
        &self,
        context: &Context,
        crypto: &TCrypto,
        message: &Envelope,
    ) -> Result<Vec<u8>, ProtocolError> {
        crypto
            .pack(context, message)
            .map_err(|err| ProtocolError::PackError(err.to_string()))
    }

    /// Pack and deliver a message to the agent, failures are never retried
    pub async fn send<TCrypto, TTransport>(
        &self,
        context: &Context,
        crypto: &TCrypto,
        transport: &TTransport,
        message: &Envelope,
    ) -> Result<Vec<u8>, ProtocolError>
    where
        TCrypto: CryptoBuilder,
        TTransport: TransportBuilder,
    {
        let packed = self.pack(context, crypto, message)?;
        self.deliver(transport, context.agent_url(), packed).await
    }

    pub async fn deliver<TTransport: TransportBuilder>(
        &self,
        transport: &TTransport,
        agent_url: &str,
        packed: Vec<u8>,
    ) -> Result<Vec<u8>, ProtocolError> {
        debug!(
            "sending {} message, thread: {}",
            self.family.family(),
            self.thread_id
        );

        transport
            .deliver(agent_url, packed)
            .await
            .map_err(|err| ProtocolError::TransportError(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use mockall::mock;
    use rst_common::standard::async_trait::async_trait;
    use rst_common::with_tokio::tokio;

    use crate::crypto::Crypto;
    use crate::message::types::{Qualifier, FIELD_FOR_RELATIONSHIP};
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

    fn schema_protocol(relationship: Option<String>) -> Protocol {
        let family = MessageFamily::new(Qualifier::Agency, "write-schema", "0.6").unwrap();
        Protocol::new(family, relationship, None)
    }

    #[test]
    fn test_base_message_shares_thread() {
        let protocol = schema_protocol(Some("did:rel:1".to_string()));
        let first = protocol.base_message("write");
        let second = protocol.base_message("status");

        assert_eq!(first.thread_id(), Some(protocol.thread_id().clone()));
        assert_eq!(first.thread_id(), second.thread_id());
        assert_ne!(first.id(), second.id());
        assert_eq!(first.for_relationship(), Some("did:rel:1"));
    }

    #[test]
    fn test_fresh_thread_per_instance() {
        let first = schema_protocol(None);
        let second = schema_protocol(None);
        assert_ne!(first.thread_id(), second.thread_id());

        let message = first.base_message("write");
        assert!(message.get(FIELD_FOR_RELATIONSHIP).is_none());
    }

    #[test]
    fn test_explicit_thread() {
        let family = MessageFamily::new(Qualifier::Agency, "write-schema", "0.6").unwrap();
        let thread = ThreadID::from("thread-1");
        let protocol = Protocol::new(family, None, Some(thread.clone()));

        assert_eq!(protocol.base_message("write").thread_id(), Some(thread));
    }

    #[tokio::test]
    async fn test_send_unprovisioned_fails_before_transport() {
        let crypto = Crypto::new();
        let context = Context::create(&crypto, "sdk", "key", "http://agency.test", None).unwrap();

        let mut transport = MockFakeTransport::new();
        transport.expect_deliver().never();

        let protocol = schema_protocol(None);
        let message = protocol.base_message("write");
        let result = protocol
            .send(&context, &crypto, &transport, &message)
            .await;

        assert!(matches!(result.unwrap_err(), ProtocolError::PackError(_)));
    }

    #[tokio::test]
    async fn test_deliver_transport_error() {
        let mut transport = MockFakeTransport::new();
        transport
            .expect_deliver()
            .withf(|url, packed| {
                url.to_string() == "http://agency.test" && packed.to_vec() == vec![1u8, 2, 3]
            })
            .times(1)
            .returning(|_, _| Err(TransportError::Network("connection refused".to_string())));

        let protocol = schema_protocol(None);
        let result = protocol
            .deliver(&transport, "http://agency.test", vec![1, 2, 3])
            .await;

        assert!(matches!(
            result.unwrap_err(),
            ProtocolError::TransportError(_)
        ));
    }
}
