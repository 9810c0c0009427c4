use std::time::Duration;

use rst_common::with_errors::thiserror::{self, Error};

/// Applied when an exchange is opened without an explicit timeout
pub const DEFAULT_EXCHANGE_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
    Idle,
    Sent,
    AwaitingResponse,
    Resolved,
    Failed,
}

impl ExchangeState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExchangeState::Resolved | ExchangeState::Failed)
    }
}

#[derive(Debug, PartialEq, Error, Clone)]
pub enum CorrelationError {
    #[error("result slot already resolved")]
    AlreadyResolved,

    #[error("result slot closed")]
    Closed,

    #[error("exchange cancelled")]
    Cancelled,

    #[error("no response after {0:?}")]
    Timeout(Duration),

    #[error("exchange rejected: {0}")]
    Rejected(String),

    #[error("invalid exchange state: {0:?}")]
    InvalidState(ExchangeState),

    #[error("send error: {0}")]
    SendError(String),
}
