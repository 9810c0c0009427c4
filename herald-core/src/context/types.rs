use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::with_errors::thiserror::{self, Error};

use crate::crypto::WalletConfig;

/// The only persisted context version this crate reads and writes
pub const CONTEXT_CONFIG_VERSION: &str = "0.2";

#[derive(Debug, PartialEq, Error, Serialize, Deserialize, Clone)]
#[serde(crate = "self::serde")]
pub enum ContextError {
    #[error("config error: {0}")]
    ConfigError(String),

    #[error("wallet error: {0}")]
    WalletError(String),
}

/// `ContextConfig` is the versioned persisted form of a [`super::Context`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
#[serde(rename_all = "camelCase")]
pub struct ContextConfig {
    pub version: String,
    pub wallet_key: String,
    pub wallet: WalletConfig,

    #[serde(rename = "sdkDID")]
    pub sdk_did: String,

    #[serde(rename = "sdkVerKey")]
    pub sdk_verkey: String,

    pub agent_url: String,

    #[serde(rename = "agencyDID", default, skip_serializing_if = "Option::is_none")]
    pub agency_did: Option<String>,

    #[serde(rename = "agencyVerKey", default, skip_serializing_if = "Option::is_none")]
    pub agency_verkey: Option<String>,

    #[serde(rename = "domainDID", default, skip_serializing_if = "Option::is_none")]
    pub domain_did: Option<String>,

    #[serde(rename = "agentVerKey", default, skip_serializing_if = "Option::is_none")]
    pub agent_verkey: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_url: Option<String>,
}
