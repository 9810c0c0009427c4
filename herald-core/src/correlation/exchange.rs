use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use rst_common::standard::async_trait::async_trait;
use rst_common::standard::futures::future;
use rst_common::with_logging::log::debug;
use rst_common::with_tokio::tokio::{self, sync::oneshot};

use crate::crypto::types::CryptoBuilder;
use crate::handlers::types::{HandlerError, HandlerKey, MessageHandler, RegistrationID};
use crate::handlers::Handlers;
use crate::message::Envelope;
use crate::protocol::types::FamilyMessage;
use crate::protocol::Protocol;
use crate::session::Session;
use crate::transport::types::TransportBuilder;

use super::slot::ResultSlot;
use super::types::{CorrelationError, ExchangeState, DEFAULT_EXCHANGE_TIMEOUT};

type Outcome<M> = Result<M, CorrelationError>;

/// Which registry key an exchange listens on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeScope {
    /// Only messages carrying the protocol's thread id
    Thread,

    /// Every message of the family, replacing any family wide handler
    Family,
}

struct ExchangeHandler<M: FamilyMessage> {
    slot: ResultSlot<Outcome<M>>,
    expected: Vec<String>,
}

impl<M: FamilyMessage> ExchangeHandler<M> {
    fn expects(&self, message_name: &str) -> bool {
        self.expected.is_empty() || self.expected.iter().any(|name| name == message_name)
    }

    /// The outcome a message settles this exchange with, `None` when it is not the awaited
    /// response
    fn outcome(&self, message_name: &str, envelope: &Envelope) -> Option<Outcome<M>> {
        let message = M::decode(message_name, envelope);
        match message.failure() {
            Some(reason) => Some(Err(CorrelationError::Rejected(reason))),
            None if self.expects(message_name) => Some(Ok(message)),
            None => None,
        }
    }
}

#[async_trait]
impl<M: FamilyMessage> MessageHandler for ExchangeHandler<M> {
    fn accepts(&self, message_name: &str, envelope: &Envelope) -> bool {
        !self.slot.is_resolved() && self.outcome(message_name, envelope).is_some()
    }

    async fn handle(&self, message_name: &str, envelope: Envelope) -> Result<(), HandlerError> {
        let outcome = self
            .outcome(message_name, &envelope)
            .ok_or_else(|| HandlerError::Unexpected(message_name.to_string()))?;

        self.slot
            .resolve(outcome)
            .map_err(|err| HandlerError::Failed(err.to_string()))
    }
}

/// Cancels a pending [`Exchange::wait`]
pub struct ExchangeCanceller(oneshot::Sender<()>);

impl ExchangeCanceller {
    pub fn cancel(self) {
        let _ = self.0.send(());
    }
}

/// `Exchange` is one protocol step waiting for its response
pub struct Exchange<M: FamilyMessage> {
    key: HandlerKey,
    registration: RegistrationID,
    handlers: Handlers,
    receiver: Option<oneshot::Receiver<Outcome<M>>>,
    cancel_tx: Option<oneshot::Sender<()>>,
    cancel_rx: Option<oneshot::Receiver<()>>,
    state: ExchangeState,
    timeout: Duration,
    _message: PhantomData<M>,
}

impl<M: FamilyMessage> Exchange<M> {
    /// Register the exchange handler, `expected` lists the message names that resolve the
    /// exchange, an empty list accepts any message
    ///
    /// A message deferred earlier on the same key that settles this exchange is consumed
    /// right away.
    pub fn open(
        handlers: &Handlers,
        protocol: &Protocol,
        scope: ExchangeScope,
        expected: &[&str],
    ) -> Self {
        let family = protocol.family();
        let key = match scope {
            ExchangeScope::Thread => {
                HandlerKey::thread(family.family(), family.version(), protocol.thread_id())
            }
            ExchangeScope::Family => HandlerKey::family(family.family(), family.version()),
        };

        let (slot, receiver) = ResultSlot::new();
        let handler = Arc::new(ExchangeHandler::<M> {
            slot,
            expected: expected.iter().map(|name| name.to_string()).collect(),
        });

        let early =
            handlers.take_deferred(&key, |name, envelope| handler.accepts(name, envelope));
        if let Some((message_name, envelope)) = early {
            debug!("exchange {} settled by deferred {}", key, message_name);
            if let Some(outcome) = handler.outcome(&message_name, &envelope) {
                if let Err(err) = handler.slot.resolve(outcome) {
                    debug!("deferred message not delivered: {}", err);
                }
            }
        }

        let registration = handlers.register(key.clone(), handler);
        let (cancel_tx, cancel_rx) = oneshot::channel();

        Self {
            key,
            registration,
            handlers: handlers.clone(),
            receiver: Some(receiver),
            cancel_tx: Some(cancel_tx),
            cancel_rx: Some(cancel_rx),
            state: ExchangeState::Idle,
            timeout: DEFAULT_EXCHANGE_TIMEOUT,
            _message: PhantomData,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn key(&self) -> &HandlerKey {
        &self.key
    }

    pub fn state(&self) -> ExchangeState {
        self.state
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Take the canceller of this exchange, only the first call returns it
    pub fn canceller(&mut self) -> Option<ExchangeCanceller> {
        self.cancel_tx.take().map(ExchangeCanceller)
    }

    pub async fn send<TCrypto, TTransport>(
        &mut self,
        session: &Session<TCrypto, TTransport>,
        protocol: &Protocol,
        message: &Envelope,
    ) -> Result<Vec<u8>, CorrelationError>
    where
        TCrypto: CryptoBuilder,
        TTransport: TransportBuilder,
    {
        if self.state != ExchangeState::Idle {
            return Err(CorrelationError::InvalidState(self.state));
        }

        self.state = ExchangeState::Sent;
        match session.send(protocol, message).await {
            Ok(body) => {
                self.state = ExchangeState::AwaitingResponse;
                Ok(body)
            }
            Err(err) => {
                self.state = ExchangeState::Failed;
                self.release();
                Err(CorrelationError::SendError(err.to_string()))
            }
        }
    }

    /// Wait for the response, bounded by the exchange timeout
    pub async fn wait(&mut self) -> Result<M, CorrelationError> {
        if self.state.is_terminal() {
            return Err(CorrelationError::InvalidState(self.state));
        }

        let receiver = self
            .receiver
            .take()
            .ok_or(CorrelationError::InvalidState(self.state))?;

        let cancelled = cancelled(self.cancel_rx.take());
        let timeout = self.timeout;

        let outcome = tokio::select! {
            received = receiver => received.unwrap_or_else(|_| Err(CorrelationError::Closed)),
            _ = cancelled => Err(CorrelationError::Cancelled),
            _ = tokio::time::sleep(timeout) => Err(CorrelationError::Timeout(timeout)),
        };

        self.state = match outcome {
            Ok(_) => ExchangeState::Resolved,
            Err(_) => ExchangeState::Failed,
        };

        self.release();
        outcome
    }

    fn release(&self) {
        self.handlers
            .remove_registration(&self.key, self.registration);
    }
}

impl<M: FamilyMessage> Drop for Exchange<M> {
    fn drop(&mut self) {
        self.release();
    }
}

async fn cancelled(receiver: Option<oneshot::Receiver<()>>) {
    match receiver {
        Some(receiver) => {
            if receiver.await.is_err() {
                future::pending::<()>().await
            }
        }
        None => future::pending::<()>().await,
    }
}
