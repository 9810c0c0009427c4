use rst_common::standard::async_trait::async_trait;
use rst_common::standard::reqwest::{header, Client, Response};
use rst_common::with_logging::log::debug;

use prople_herald_core::transport::types::{PublicIdentity, TransportBuilder, TransportError};

use super::{PATH_AGENCY, PATH_AGENCY_MSG};

const CONTENT_TYPE_OCTET_STREAM: &str = "application/octet-stream";

/// `HttpTransport` posts packed messages to `{agent_url}/agency/msg`
///
/// There is no retry: any network failure or non success status goes back to the caller.
#[derive(Clone, Default)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    async fn check_status(response: Response) -> Result<Response, TransportError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(TransportError::Status {
            code: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl TransportBuilder for HttpTransport {
    async fn deliver(&self, agent_url: &str, packed: Vec<u8>) -> Result<Vec<u8>, TransportError> {
        let url = format!("{}{}", agent_url.trim_end_matches('/'), PATH_AGENCY_MSG);
        debug!("delivering {} bytes to {}", packed.len(), url);

        let response = self
            .client
            .post(&url)
            .header(header::CONTENT_TYPE, CONTENT_TYPE_OCTET_STREAM)
            .body(packed)
            .send()
            .await
            .map_err(|err| TransportError::Network(err.to_string()))?;

        let response = Self::check_status(response).await?;
        let body = response
            .bytes()
            .await
            .map_err(|err| TransportError::InvalidResponse(err.to_string()))?;

        Ok(body.to_vec())
    }

    async fn agency_identity(&self, agent_url: &str) -> Result<PublicIdentity, TransportError> {
        let url = format!("{}{}", agent_url.trim_end_matches('/'), PATH_AGENCY);
        debug!("fetching agency identity from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| TransportError::Network(err.to_string()))?;

        Self::check_status(response)
            .await?
            .json::<PublicIdentity>()
            .await
            .map_err(|err| TransportError::InvalidResponse(err.to_string()))
    }
}
