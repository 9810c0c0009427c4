use rst_common::standard::serde_json;
use rst_common::with_logging::log::debug;

use crate::crypto::types::CryptoBuilder;
use crate::crypto::Wallet;

use super::types::{ContextConfig, ContextError, CONTEXT_CONFIG_VERSION};

/// `Context` is the mutable state of one session
///
/// The agency identity (`agent_public_did`, `agent_public_verkey`) is known before
/// provisioning, the `domain_did` and `agent_verkey` are assigned by the agency during the
/// provisioning handshake. Packing anything but provisioning messages requires both.
#[derive(Debug, Clone)]
pub struct Context {
    wallet: Wallet,
    sdk_did: String,
    sdk_verkey: String,
    agent_url: String,
    agent_public_did: Option<String>,
    agent_public_verkey: Option<String>,
    domain_did: Option<String>,
    agent_verkey: Option<String>,
    endpoint_url: Option<String>,
}

impl Context {
    /// Open a wallet, generate the local key pair and return an unprovisioned context
    pub fn create<TCrypto: CryptoBuilder>(
        crypto: &TCrypto,
        wallet_name: &str,
        wallet_key: &str,
        agent_url: &str,
        endpoint_url: Option<String>,
    ) -> Result<Self, ContextError> {
        if agent_url.trim().is_empty() {
            return Err(ContextError::ConfigError("agent url is empty".to_string()));
        }

        let mut wallet = crypto
            .open_wallet(wallet_name, wallet_key)
            .map_err(|err| ContextError::WalletError(err.to_string()))?;

        let did_key = crypto
            .create_keypair(&mut wallet)
            .map_err(|err| ContextError::WalletError(err.to_string()))?;

        debug!("context created for sdk did: {}", did_key.did);
        Ok(Self {
            wallet,
            sdk_did: did_key.did,
            sdk_verkey: did_key.verkey,
            agent_url: agent_url.trim_end_matches('/').to_string(),
            agent_public_did: None,
            agent_public_verkey: None,
            domain_did: None,
            agent_verkey: None,
            endpoint_url,
        })
    }

    /// Restore a context from its persisted JSON form
    pub fn create_with_config(raw: &str) -> Result<Self, ContextError> {
        let config: ContextConfig =
            serde_json::from_str(raw).map_err(|err| ContextError::ConfigError(err.to_string()))?;

        Self::from_config(config)
    }

    pub fn from_config(config: ContextConfig) -> Result<Self, ContextError> {
        if config.version != CONTEXT_CONFIG_VERSION {
            return Err(ContextError::ConfigError(format!(
                "unsupported version: {}",
                config.version
            )));
        }

        for (field, value) in [
            ("sdkDID", &config.sdk_did),
            ("sdkVerKey", &config.sdk_verkey),
            ("agentUrl", &config.agent_url),
        ] {
            if value.trim().is_empty() {
                return Err(ContextError::ConfigError(format!("{} is empty", field)));
            }
        }

        let wallet = Wallet::from_config(config.wallet, &config.wallet_key)
            .map_err(|err| ContextError::ConfigError(err.to_string()))?;

        if !wallet.contains(&config.sdk_verkey) {
            return Err(ContextError::ConfigError(
                "sdk verkey is missing from the wallet".to_string(),
            ));
        }

        Ok(Self {
            wallet,
            sdk_did: config.sdk_did,
            sdk_verkey: config.sdk_verkey,
            agent_url: config.agent_url,
            agent_public_did: config.agency_did,
            agent_public_verkey: config.agency_verkey,
            domain_did: config.domain_did,
            agent_verkey: config.agent_verkey,
            endpoint_url: config.endpoint_url,
        })
    }

    pub fn to_config(&self) -> Result<ContextConfig, ContextError> {
        let wallet = self
            .wallet
            .to_config()
            .map_err(|err| ContextError::WalletError(err.to_string()))?;

        Ok(ContextConfig {
            version: CONTEXT_CONFIG_VERSION.to_string(),
            wallet_key: self.wallet.key().to_string(),
            wallet,
            sdk_did: self.sdk_did.clone(),
            sdk_verkey: self.sdk_verkey.clone(),
            agent_url: self.agent_url.clone(),
            agency_did: self.agent_public_did.clone(),
            agency_verkey: self.agent_public_verkey.clone(),
            domain_did: self.domain_did.clone(),
            agent_verkey: self.agent_verkey.clone(),
            endpoint_url: self.endpoint_url.clone(),
        })
    }

    pub fn to_json(&self) -> Result<String, ContextError> {
        let config = self.to_config()?;
        serde_json::to_string_pretty(&config)
            .map_err(|err| ContextError::ConfigError(err.to_string()))
    }

    pub fn wallet(&self) -> &Wallet {
        &self.wallet
    }

    pub fn sdk_did(&self) -> &str {
        &self.sdk_did
    }

    pub fn sdk_verkey(&self) -> &str {
        &self.sdk_verkey
    }

    pub fn agent_url(&self) -> &str {
        &self.agent_url
    }

    pub fn agent_public_did(&self) -> Option<&str> {
        self.agent_public_did.as_deref()
    }

    pub fn agent_public_verkey(&self) -> Option<&str> {
        self.agent_public_verkey.as_deref()
    }

    pub fn domain_did(&self) -> Option<&str> {
        self.domain_did.as_deref()
    }

    pub fn agent_verkey(&self) -> Option<&str> {
        self.agent_verkey.as_deref()
    }

    pub fn endpoint_url(&self) -> Option<&str> {
        self.endpoint_url.as_deref()
    }

    pub fn is_provisioned(&self) -> bool {
        self.domain_did.is_some() && self.agent_verkey.is_some()
    }

    pub fn set_agency_identity(&mut self, did: String, verkey: String) {
        self.agent_public_did = Some(did);
        self.agent_public_verkey = Some(verkey);
    }

    pub fn set_provisioned(&mut self, domain_did: String, agent_verkey: String) {
        self.domain_did = Some(domain_did);
        self.agent_verkey = Some(agent_verkey);
    }

    pub fn set_endpoint_url(&mut self, endpoint_url: String) {
        self.endpoint_url = Some(endpoint_url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rst_common::standard::serde_json::{json, Value};

    use crate::crypto::Crypto;

    fn provisioned() -> Context {
        let mut context = Context::create(
            &Crypto::new(),
            "sdk",
            "sdk-key",
            "http://agency.test/",
            Some("http://sdk.test/webhook".to_string()),
        )
        .unwrap();

        context.set_agency_identity("did:agency:1".to_string(), "agency-verkey".to_string());
        context.set_provisioned("did:domain:1".to_string(), "agent-verkey".to_string());
        context
    }

    #[test]
    fn test_create_unprovisioned() {
        let context =
            Context::create(&Crypto::new(), "sdk", "sdk-key", "http://agency.test/", None)
                .unwrap();

        assert!(!context.is_provisioned());
        assert!(context.wallet().contains(context.sdk_verkey()));
        assert_eq!(context.agent_url(), "http://agency.test");
        assert!(context.endpoint_url().is_none());
    }

    #[test]
    fn test_create_invalid_inputs() {
        let result = Context::create(&Crypto::new(), "", "sdk-key", "http://agency.test", None);
        assert!(matches!(result.unwrap_err(), ContextError::WalletError(_)));

        let result = Context::create(&Crypto::new(), "sdk", "sdk-key", " ", None);
        assert!(matches!(result.unwrap_err(), ContextError::ConfigError(_)));
    }

    #[test]
    fn test_config_restores_context() {
        let context = provisioned();
        let raw = context.to_json().unwrap();

        let restored = Context::create_with_config(&raw).unwrap();
        assert!(restored.is_provisioned());
        assert_eq!(restored.sdk_did(), context.sdk_did());
        assert_eq!(restored.sdk_verkey(), context.sdk_verkey());
        assert_eq!(restored.domain_did(), Some("did:domain:1"));
        assert_eq!(restored.agent_verkey(), Some("agent-verkey"));
        assert_eq!(restored.agent_public_did(), Some("did:agency:1"));
        assert_eq!(restored.endpoint_url(), Some("http://sdk.test/webhook"));
    }

    #[test]
    fn test_config_field_names() {
        let raw = provisioned().to_json().unwrap();
        let value: Value = serde_json::from_str(&raw).unwrap();

        for field in [
            "version",
            "walletKey",
            "wallet",
            "sdkDID",
            "sdkVerKey",
            "agentUrl",
            "agencyDID",
            "agencyVerKey",
            "domainDID",
            "agentVerKey",
            "endpointUrl",
        ] {
            assert!(value.get(field).is_some(), "missing field: {}", field);
        }
    }

    #[test]
    fn test_config_invalid() {
        let table = vec![
            "not-json".to_string(),
            json!({"version": "0.2"}).to_string(),
            {
                let mut value: Value =
                    serde_json::from_str(&provisioned().to_json().unwrap()).unwrap();
                value["version"] = json!("0.1");
                value.to_string()
            },
            {
                let mut value: Value =
                    serde_json::from_str(&provisioned().to_json().unwrap()).unwrap();
                value["walletKey"] = json!("invalid-key");
                value.to_string()
            },
            {
                let mut value: Value =
                    serde_json::from_str(&provisioned().to_json().unwrap()).unwrap();
                value["sdkVerKey"] = json!("unknown");
                value.to_string()
            },
        ];

        for raw in table {
            let result = Context::create_with_config(&raw);
            assert!(
                matches!(result, Err(ContextError::ConfigError(_))),
                "expected config error for: {}",
                raw
            );
        }
    }
}
