use std::fmt;

use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::with_errors::thiserror::{self, Error};

use crate::message::types::ThreadID;
use crate::message::Envelope;

#[derive(Debug, PartialEq, Error, Serialize, Deserialize, Clone)]
#[serde(crate = "self::serde")]
pub enum DispatchError {
    #[error("unpack error: {0}")]
    Unpack(String),

    #[error("malformed message: {0}")]
    Malformed(String),

    #[error("unhandled message: {0}")]
    Unhandled(String),

    #[error("handler error: {0}")]
    Handler(String),
}

#[derive(Debug, PartialEq, Error, Serialize, Deserialize, Clone)]
#[serde(crate = "self::serde")]
pub enum HandlerError {
    #[error("unexpected message: {0}")]
    Unexpected(String),

    #[error("handler failed: {0}")]
    Failed(String),
}

/// Registry key of a handler
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HandlerKey {
    family: String,
    version: String,
    thread: Option<ThreadID>,
}

impl HandlerKey {
    pub fn family(family: &str, version: &str) -> Self {
        Self {
            family: family.to_string(),
            version: version.to_string(),
            thread: None,
        }
    }

    pub fn thread(family: &str, version: &str, thread: &ThreadID) -> Self {
        Self {
            family: family.to_string(),
            version: version.to_string(),
            thread: Some(thread.clone()),
        }
    }

    pub fn family_name(&self) -> &str {
        &self.family
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn thread_id(&self) -> Option<&ThreadID> {
        self.thread.as_ref()
    }

    /// The family wide key this key falls back to
    pub fn without_thread(&self) -> Self {
        Self::family(&self.family, &self.version)
    }
}

impl fmt::Display for HandlerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.thread {
            Some(thread) => write!(f, "{}/{}#{}", self.family, self.version, thread),
            None => write!(f, "{}/{}", self.family, self.version),
        }
    }
}

/// Identifies one registration, a later registration on the same key gets a new id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistrationID(pub(crate) u64);

/// Why a message ended up in the fallback handler
#[derive(Debug, Clone, PartialEq)]
pub enum Unhandled {
    NoHandler {
        family: String,
        version: String,
        message_name: String,
    },
    Malformed(String),
}

impl fmt::Display for Unhandled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unhandled::NoHandler {
                family,
                version,
                message_name,
            } => write!(
                f,
                "no handler for {}/{}, message: {}",
                family, version, message_name
            ),
            Unhandled::Malformed(reason) => write!(f, "malformed message: {}", reason),
        }
    }
}

/// Outcome of a successful dispatch
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatched {
    Handled(HandlerKey),

    /// The handler of this key declined the message, it is kept for the next handler
    /// registered on the same key
    Deferred(HandlerKey),

    Fallback,
}

#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Whether this handler takes the message now, a declined message is deferred
    fn accepts(&self, _message_name: &str, _envelope: &Envelope) -> bool {
        true
    }

    async fn handle(&self, message_name: &str, envelope: Envelope) -> Result<(), HandlerError>;
}

#[async_trait]
pub trait FallbackHandler: Send + Sync {
    async fn handle(&self, reason: Unhandled, envelope: Envelope) -> Result<(), HandlerError>;
}
