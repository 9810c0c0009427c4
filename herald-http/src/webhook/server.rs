use std::time::Duration;

use rst_common::with_http_tokio::axum::routing::post;
use rst_common::with_http_tokio::axum::{self, Router};
use rst_common::with_http_tokio::tower_http::timeout::TimeoutLayer;
use rst_common::with_http_tokio::tower_http::trace::TraceLayer;
use rst_common::with_tokio::tokio::net::TcpListener;
use rst_common::with_tracing::tracing::info;

use prople_herald_core::crypto::types::CryptoBuilder;
use prople_herald_core::session::Session;
use prople_herald_core::transport::types::TransportBuilder;

use crate::common::types::CommonError;
use crate::config::App;

use super::handler::{receive, WebhookState};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// `Webhook` serves the session's inbound endpoint on `POST /`
pub struct Webhook<TCrypto, TTransport>
where
    TCrypto: CryptoBuilder,
    TTransport: TransportBuilder,
{
    config: App,
    session: Session<TCrypto, TTransport>,
}

impl<TCrypto, TTransport> Webhook<TCrypto, TTransport>
where
    TCrypto: CryptoBuilder + 'static,
    TTransport: TransportBuilder + 'static,
{
    pub fn new(config: App, session: Session<TCrypto, TTransport>) -> Self {
        Self { config, session }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/", post(receive::<TCrypto, TTransport>))
            .with_state(WebhookState::new(self.session.clone()))
            .layer((
                TraceLayer::new_for_http(),
                TimeoutLayer::new(REQUEST_TIMEOUT),
            ))
    }

    pub async fn serve(&self) -> Result<(), CommonError> {
        let (host, port) = self.config.get_app_config();
        let addr = format!("{}:{}", host, port);

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|err| CommonError::ServerError(err.to_string()))?;

        info!("webhook listening on {}", addr);
        axum::serve(listener, self.router())
            .await
            .map_err(|err| CommonError::ServerError(err.to_string()))
    }
}
