use rst_common::with_logging::log::info;

use prople_herald_core::context::Context;
use prople_herald_core::crypto::types::CryptoBuilder;
use prople_herald_core::crypto::Crypto;
use prople_herald_core::protocols::provision::Provision;
use prople_herald_core::transport::types::TransportBuilder;
use prople_herald_http::transport::HttpTransport;

use crate::errors::HeraldError;
use crate::utils::context::save_context;
use crate::utils::homedir::default_context_path;

/// Parameters of a provisioning run
#[derive(Debug, Clone)]
pub struct ProvisionOptions {
    pub agent_url: String,
    pub wallet_name: String,
    pub wallet_key: String,
    pub endpoint_url: Option<String>,
    pub token: Option<String>,
    pub output: Option<String>,
}

pub struct Provisioner<TCrypto, TTransport>
where
    TCrypto: CryptoBuilder,
    TTransport: TransportBuilder,
{
    opts: ProvisionOptions,
    crypto: TCrypto,
    transport: TTransport,
}

impl Provisioner<Crypto, HttpTransport> {
    pub fn new(opts: ProvisionOptions) -> Self {
        Self::with_collaborators(opts, Crypto::new(), HttpTransport::new())
    }
}

impl<TCrypto, TTransport> Provisioner<TCrypto, TTransport>
where
    TCrypto: CryptoBuilder,
    TTransport: TransportBuilder,
{
    pub fn with_collaborators(opts: ProvisionOptions, crypto: TCrypto, transport: TTransport) -> Self {
        Self {
            opts,
            crypto,
            transport,
        }
    }

    /// Create a fresh context, provision it and persist it, returning where it was saved
    pub async fn run(&self) -> Result<String, HeraldError> {
        let context = Context::create(
            &self.crypto,
            &self.opts.wallet_name,
            &self.opts.wallet_key,
            &self.opts.agent_url,
            self.opts.endpoint_url.clone(),
        )
        .map_err(|err| HeraldError::ContextError(err.to_string()))?;

        let context = Provision::new(self.opts.token.clone(), None)
            .provision(context, &self.crypto, &self.transport)
            .await
            .map_err(|err| HeraldError::ProvisionError(err.to_string()))?;

        let path = match &self.opts.output {
            Some(output) => output.to_owned(),
            None => default_context_path()?,
        };

        save_context(&context, &path)?;
        info!(
            "provisioned, domain did: {}",
            context.domain_did().unwrap_or_default()
        );

        Ok(path)
    }
}
