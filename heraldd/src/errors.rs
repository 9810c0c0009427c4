use rst_common::with_errors::thiserror::{self, Error};

#[derive(Debug, Error)]
pub enum HeraldError {
    #[error("homedir error: {0}")]
    HomeDirError(String),

    #[error("config error: {0}")]
    ConfigError(String),

    #[error("context error: {0}")]
    ContextError(String),

    #[error("provision error: {0}")]
    ProvisionError(String),

    #[error("server error: {0}")]
    ServerError(String),
}
