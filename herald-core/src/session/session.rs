use std::sync::Arc;
use std::time::Duration;

use rst_common::with_tokio::tokio::sync::{RwLock, RwLockReadGuard};

use crate::context::Context;
use crate::correlation::types::{CorrelationError, DEFAULT_EXCHANGE_TIMEOUT};
use crate::correlation::{Exchange, ExchangeScope};
use crate::crypto::types::CryptoBuilder;
use crate::handlers::types::{DispatchError, Dispatched};
use crate::handlers::Handlers;
use crate::message::Envelope;
use crate::protocol::types::{FamilyMessage, ProtocolError};
use crate::protocol::Protocol;
use crate::transport::types::TransportBuilder;

/// `Session` owns the context, the crypto and transport collaborators, and the handlers
///
/// Clones share the same context and dispatch table.
#[derive(Clone)]
pub struct Session<TCrypto, TTransport>
where
    TCrypto: CryptoBuilder,
    TTransport: TransportBuilder,
{
    context: Arc<RwLock<Context>>,
    crypto: TCrypto,
    transport: TTransport,
    handlers: Handlers,
    exchange_timeout: Duration,
}

impl<TCrypto, TTransport> Session<TCrypto, TTransport>
where
    TCrypto: CryptoBuilder,
    TTransport: TransportBuilder,
{
    pub fn new(context: Context, crypto: TCrypto, transport: TTransport) -> Self {
        Self {
            context: Arc::new(RwLock::new(context)),
            crypto,
            transport,
            handlers: Handlers::new(),
            exchange_timeout: DEFAULT_EXCHANGE_TIMEOUT,
        }
    }

    pub fn with_exchange_timeout(mut self, timeout: Duration) -> Self {
        self.exchange_timeout = timeout;
        self
    }

    pub fn handlers(&self) -> &Handlers {
        &self.handlers
    }

    pub fn crypto(&self) -> &TCrypto {
        &self.crypto
    }

    pub fn transport(&self) -> &TTransport {
        &self.transport
    }

    pub fn exchange_timeout(&self) -> Duration {
        self.exchange_timeout
    }

    pub async fn context(&self) -> RwLockReadGuard<'_, Context> {
        self.context.read().await
    }

    pub async fn replace_context(&self, context: Context) {
        let mut current = self.context.write().await;
        *current = context;
    }

    pub async fn set_endpoint_url(&self, endpoint_url: String) {
        let mut context = self.context.write().await;
        context.set_endpoint_url(endpoint_url);
    }

    pub async fn pack(
        &self,
        protocol: &Protocol,
        message: &Envelope,
    ) -> Result<Vec<u8>, ProtocolError> {
        let context = self.context.read().await;
        protocol.pack(&context, &self.crypto, message)
    }

    pub async fn send(
        &self,
        protocol: &Protocol,
        message: &Envelope,
    ) -> Result<Vec<u8>, ProtocolError> {
        let (packed, agent_url) = {
            let context = self.context.read().await;
            let packed = protocol.pack(&context, &self.crypto, message)?;
            (packed, context.agent_url().to_string())
        };

        protocol.deliver(&self.transport, &agent_url, packed).await
    }

    /// Unpack and dispatch one inbound webhook payload
    pub async fn handle_message(&self, raw: &[u8]) -> Result<Dispatched, DispatchError> {
        let envelope = {
            let context = self.context.read().await;
            self.handlers.unpack(&context, &self.crypto, raw)?
        };

        self.handlers.dispatch(envelope).await
    }

    /// Open a thread scoped exchange for the protocol, using the session timeout
    pub fn exchange<M: FamilyMessage>(&self, protocol: &Protocol) -> Exchange<M> {
        self.exchange_expecting(protocol, &[])
    }

    /// Same as [`Session::exchange`], resolved only by the listed message names
    pub fn exchange_expecting<M: FamilyMessage>(
        &self,
        protocol: &Protocol,
        expected: &[&str],
    ) -> Exchange<M> {
        Exchange::open(&self.handlers, protocol, ExchangeScope::Thread, expected)
            .with_timeout(self.exchange_timeout)
    }

    /// Send a message and wait for the first response of its thread
    pub async fn request<M: FamilyMessage>(
        &self,
        protocol: &Protocol,
        message: &Envelope,
    ) -> Result<M, CorrelationError> {
        self.request_expecting(protocol, message, &[]).await
    }

    pub async fn request_expecting<M: FamilyMessage>(
        &self,
        protocol: &Protocol,
        message: &Envelope,
        expected: &[&str],
    ) -> Result<M, CorrelationError> {
        let mut exchange = self.exchange_expecting::<M>(protocol, expected);
        exchange.send(self, protocol, message).await?;
        exchange.wait().await
    }
}
