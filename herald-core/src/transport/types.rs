use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::with_errors::thiserror::{self, Error};

#[derive(Debug, PartialEq, Error, Serialize, Deserialize, Clone)]
#[serde(crate = "self::serde")]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected status {code}: {body}")]
    Status { code: u16, body: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Public identity of the agency, published at `{agent_url}/agency`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct PublicIdentity {
    #[serde(rename = "DID")]
    pub did: String,

    #[serde(rename = "verKey")]
    pub verkey: String,
}

/// `TransportBuilder` delivers packed messages to the agent service
#[async_trait]
pub trait TransportBuilder: Clone + Send + Sync {
    /// Deliver packed bytes to the agent, returning the response body
    ///
    /// Asynchronous protocol endpoints answer with an empty body, the real response
    /// arrives later through the webhook.
    async fn deliver(&self, agent_url: &str, packed: Vec<u8>) -> Result<Vec<u8>, TransportError>;

    async fn agency_identity(&self, agent_url: &str) -> Result<PublicIdentity, TransportError>;
}
