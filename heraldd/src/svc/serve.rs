use rst_common::with_tracing::tracing::{info, warn};

use prople_herald_core::crypto::Crypto;
use prople_herald_core::handlers::fallback_fn;
use prople_herald_core::protocols::update_endpoint::UpdateEndpoint;
use prople_herald_core::session::Session;
use prople_herald_http::config::{Config, Parser};
use prople_herald_http::transport::HttpTransport;
use prople_herald_http::webhook::Webhook;

use crate::errors::HeraldError;
use crate::utils::context::load_context;

pub struct Server {
    config: String,
}

impl Server {
    pub fn new(config: String) -> Self {
        Self { config }
    }

    pub fn config(&self) -> Result<Config, HeraldError> {
        Parser::new(self.config.to_owned())
            .parse()
            .map_err(|err| HeraldError::ConfigError(err.to_string()))
    }

    /// Restore the persisted context and build its session, messages nobody waits for are
    /// only logged
    pub fn session(&self, config: &Config) -> Result<Session<Crypto, HttpTransport>, HeraldError> {
        let context = load_context(&config.session().context_path())?;
        if !context.is_provisioned() {
            return Err(HeraldError::ContextError(
                "context is not provisioned yet".to_string(),
            ));
        }

        let session = Session::new(context, Crypto::new(), HttpTransport::new())
            .with_exchange_timeout(config.session().exchange_timeout());

        session
            .handlers()
            .set_default_handler(fallback_fn(|reason, envelope| async move {
                warn!(
                    "unhandled message: {}, type: {}",
                    reason,
                    envelope.msg_type().unwrap_or_default()
                );
                Ok(())
            }));

        Ok(session)
    }

    pub async fn run(&self) -> Result<(), HeraldError> {
        let config = self.config()?;
        let session = self.session(&config)?;

        if let Some(endpoint_url) = config.app().endpoint_url() {
            session.set_endpoint_url(endpoint_url.clone()).await;
            UpdateEndpoint::default()
                .update(&session)
                .await
                .map_err(|err| HeraldError::ServerError(err.to_string()))?;

            info!("webhook endpoint registered: {}", endpoint_url);
        }

        Webhook::new(config.app().to_owned(), session)
            .serve()
            .await
            .map_err(|err| HeraldError::ServerError(err.to_string()))
    }
}
