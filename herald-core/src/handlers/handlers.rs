use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use rst_common::with_logging::log::{debug, error, warn};

use crate::context::Context;
use crate::crypto::types::CryptoBuilder;
use crate::message::types::ThreadID;
use crate::message::{Envelope, MessageType};

use super::types::{
    DispatchError, Dispatched, FallbackHandler, HandlerKey, MessageHandler, RegistrationID,
    Unhandled,
};

/// Upper bound of messages kept for a later handler, the oldest is dropped first
const MAX_DEFERRED: usize = 32;

struct DeferredMessage {
    key: HandlerKey,
    message_name: String,
    envelope: Envelope,
}

#[derive(Clone)]
struct Registration {
    id: RegistrationID,
    handler: Arc<dyn MessageHandler>,
}

/// `Handlers` is the dispatch table owned by a session
///
/// Cloning is cheap, every clone shares the same registry.
#[derive(Clone, Default)]
pub struct Handlers {
    registry: Arc<RwLock<HashMap<HandlerKey, Registration>>>,
    fallback: Arc<RwLock<Option<Arc<dyn FallbackHandler>>>>,
    deferred: Arc<RwLock<VecDeque<DeferredMessage>>>,
    sequence: Arc<AtomicU64>,
}

impl Handlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the family wide handler, replacing any previous one for the same key
    pub fn add_handler<H>(&self, family: &str, version: &str, handler: H) -> RegistrationID
    where
        H: MessageHandler + 'static,
    {
        self.register(HandlerKey::family(family, version), Arc::new(handler))
    }

    /// Register a handler that only receives messages of one thread
    pub fn add_thread_handler<H>(
        &self,
        family: &str,
        version: &str,
        thread: &ThreadID,
        handler: H,
    ) -> RegistrationID
    where
        H: MessageHandler + 'static,
    {
        self.register(HandlerKey::thread(family, version, thread), Arc::new(handler))
    }

    pub fn register(&self, key: HandlerKey, handler: Arc<dyn MessageHandler>) -> RegistrationID {
        let id = RegistrationID(self.sequence.fetch_add(1, Ordering::Relaxed));
        let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);

        if registry
            .insert(key.clone(), Registration { id, handler })
            .is_some()
        {
            debug!("handler replaced: {}", key);
        } else {
            debug!("handler registered: {}", key);
        }

        id
    }

    pub fn remove_handler(&self, family: &str, version: &str) -> bool {
        self.remove(&HandlerKey::family(family, version))
    }

    pub fn remove_thread_handler(&self, family: &str, version: &str, thread: &ThreadID) -> bool {
        self.remove(&HandlerKey::thread(family, version, thread))
    }

    pub fn remove(&self, key: &HandlerKey) -> bool {
        let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);
        registry.remove(key).is_some()
    }

    /// Remove a key only while it still holds the given registration
    pub fn remove_registration(&self, key: &HandlerKey, id: RegistrationID) -> bool {
        let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);
        match registry.get(key) {
            Some(registration) if registration.id == id => {
                registry.remove(key);
                debug!("handler removed: {}", key);
                true
            }
            _ => false,
        }
    }

    pub fn set_default_handler<H>(&self, handler: H)
    where
        H: FallbackHandler + 'static,
    {
        let mut fallback = self.fallback.write().unwrap_or_else(PoisonError::into_inner);
        *fallback = Some(Arc::new(handler));
    }

    pub fn contains(&self, key: &HandlerKey) -> bool {
        let registry = self.registry.read().unwrap_or_else(PoisonError::into_inner);
        registry.contains_key(key)
    }

    pub fn len(&self) -> usize {
        let registry = self.registry.read().unwrap_or_else(PoisonError::into_inner);
        registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn deferred_len(&self) -> usize {
        let deferred = self.deferred.read().unwrap_or_else(PoisonError::into_inner);
        deferred.len()
    }

    /// Take the oldest deferred message of `key` that `accepts` agrees to consume
    pub fn take_deferred<F>(&self, key: &HandlerKey, accepts: F) -> Option<(String, Envelope)>
    where
        F: Fn(&str, &Envelope) -> bool,
    {
        let mut deferred = self.deferred.write().unwrap_or_else(PoisonError::into_inner);
        let position = deferred.iter().position(|message| {
            &message.key == key && accepts(&message.message_name, &message.envelope)
        })?;

        deferred
            .remove(position)
            .map(|message| (message.message_name, message.envelope))
    }

    fn defer(&self, key: HandlerKey, message_name: &str, envelope: Envelope) {
        let mut deferred = self.deferred.write().unwrap_or_else(PoisonError::into_inner);
        if deferred.len() >= MAX_DEFERRED {
            if let Some(dropped) = deferred.pop_front() {
                warn!(
                    "deferred message dropped: {} on {}",
                    dropped.message_name, dropped.key
                );
            }
        }

        deferred.push_back(DeferredMessage {
            key,
            message_name: message_name.to_string(),
            envelope,
        });
    }

    /// Find the handler for a message: thread scoped key first, then the family wide key
    pub fn resolve(
        &self,
        msg_type: &MessageType,
        thread: Option<&ThreadID>,
    ) -> Option<(HandlerKey, Arc<dyn MessageHandler>)> {
        let registry = self.registry.read().unwrap_or_else(PoisonError::into_inner);
        let family_key = HandlerKey::family(msg_type.family(), msg_type.version());

        thread
            .map(|thread| HandlerKey::thread(msg_type.family(), msg_type.version(), thread))
            .and_then(|key| {
                registry
                    .get(&key)
                    .map(|registration| (key, registration.handler.clone()))
            })
            .or_else(|| {
                registry
                    .get(&family_key)
                    .map(|registration| (family_key.clone(), registration.handler.clone()))
            })
    }

    /// Unpack raw bytes and route the resulting message
    ///
    /// Bytes that fail to unpack never reach a handler.
    pub async fn handle_message<TCrypto: CryptoBuilder>(
        &self,
        context: &Context,
        crypto: &TCrypto,
        raw: &[u8],
    ) -> Result<Dispatched, DispatchError> {
        let envelope = self.unpack(context, crypto, raw)?;
        self.dispatch(envelope).await
    }

    pub fn unpack<TCrypto: CryptoBuilder>(
        &self,
        context: &Context,
        crypto: &TCrypto,
        raw: &[u8],
    ) -> Result<Envelope, DispatchError> {
        crypto.unpack(context, raw).map_err(|err| {
            warn!("dropping inbound message: {}", err);
            DispatchError::Unpack(err.to_string())
        })
    }

    /// Route an already unpacked message to exactly one handler
    pub async fn dispatch(&self, envelope: Envelope) -> Result<Dispatched, DispatchError> {
        let msg_type = match envelope.parse_type() {
            Ok(msg_type) => msg_type,
            Err(err) => {
                warn!("inbound message with invalid type: {}", err);
                return self
                    .fallback(Unhandled::Malformed(err.to_string()), envelope)
                    .await;
            }
        };

        let thread = envelope.thread_id();
        match self.resolve(&msg_type, thread.as_ref()) {
            Some((key, handler)) if !handler.accepts(msg_type.name(), &envelope) => {
                warn!(
                    "handler {} is not waiting for {}, message deferred",
                    key,
                    msg_type.name()
                );
                self.defer(key.clone(), msg_type.name(), envelope);
                Ok(Dispatched::Deferred(key))
            }
            Some((key, handler)) => {
                debug!("dispatching {} to {}", msg_type.name(), key);
                handler
                    .handle(msg_type.name(), envelope)
                    .await
                    .map_err(|err| {
                        error!("handler {} failed: {}", key, err);
                        DispatchError::Handler(err.to_string())
                    })?;

                Ok(Dispatched::Handled(key))
            }
            None => {
                let reason = Unhandled::NoHandler {
                    family: msg_type.family().to_string(),
                    version: msg_type.version().to_string(),
                    message_name: msg_type.name().to_string(),
                };

                self.fallback(reason, envelope).await
            }
        }
    }

    async fn fallback(
        &self,
        reason: Unhandled,
        envelope: Envelope,
    ) -> Result<Dispatched, DispatchError> {
        let fallback = self
            .fallback
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        match fallback {
            Some(handler) => {
                handler.handle(reason, envelope).await.map_err(|err| {
                    error!("default handler failed: {}", err);
                    DispatchError::Handler(err.to_string())
                })?;

                Ok(Dispatched::Fallback)
            }
            None => {
                warn!("{}", reason);
                match reason {
                    Unhandled::Malformed(detail) => Err(DispatchError::Malformed(detail)),
                    other => Err(DispatchError::Unhandled(other.to_string())),
                }
            }
        }
    }
}
