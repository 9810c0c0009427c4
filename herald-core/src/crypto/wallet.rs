use std::collections::HashMap;
use std::fmt;

use rst_common::standard::serde::{self, Deserialize, Serialize};

use prople_crypto::ecdh::keypair::KeyPair;
use prople_crypto::keysecure::types::{Password, ToKeySecure};
use prople_crypto::keysecure::KeySecure;
use prople_crypto::types::{Hexer, VectorValue};

use super::types::CryptoError;

/// Persisted form of a [`Wallet`], each private key is stored as a [`KeySecure`]
/// encrypted with the wallet key
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct WalletConfig {
    pub name: String,
    pub keys: Vec<KeySecure>,
}

/// `Wallet` holds the X25519 key pairs of a session, indexed by verkey
#[derive(Clone)]
pub struct Wallet {
    name: String,
    key: String,
    keys: HashMap<String, KeyPair>,
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("name", &self.name)
            .field("verkeys", &self.verkeys())
            .finish()
    }
}

impl Wallet {
    pub fn new(name: &str, key: &str) -> Result<Self, CryptoError> {
        if name.trim().is_empty() {
            return Err(CryptoError::WalletError("wallet name is empty".to_string()));
        }

        if key.is_empty() {
            return Err(CryptoError::WalletError("wallet key is empty".to_string()));
        }

        Ok(Self {
            name: name.to_string(),
            key: key.to_string(),
            keys: HashMap::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Store a key pair and return its verkey
    pub fn insert(&mut self, keypair: KeyPair) -> String {
        let verkey = keypair.pub_key().to_hex().hex();
        self.keys.insert(verkey.clone(), keypair);
        verkey
    }

    pub fn keypair(&self, verkey: &str) -> Option<&KeyPair> {
        self.keys.get(verkey)
    }

    pub fn contains(&self, verkey: &str) -> bool {
        self.keys.contains_key(verkey)
    }

    pub fn verkeys(&self) -> Vec<String> {
        let mut verkeys: Vec<String> = self.keys.keys().cloned().collect();
        verkeys.sort();
        verkeys
    }

    pub fn to_config(&self) -> Result<WalletConfig, CryptoError> {
        let keys = self
            .keys
            .values()
            .map(|keypair| {
                keypair
                    .to_keysecure(Password::from(self.key.clone()))
                    .map_err(|err| CryptoError::WalletError(err.to_string()))
            })
            .collect::<Result<Vec<KeySecure>, CryptoError>>()?;

        Ok(WalletConfig {
            name: self.name.clone(),
            keys,
        })
    }

    pub fn from_config(config: WalletConfig, key: &str) -> Result<Self, CryptoError> {
        let mut wallet = Wallet::new(&config.name, key)?;

        for keysecure in config.keys {
            let decrypted = keysecure
                .decrypt(key.to_string())
                .map_err(|err| CryptoError::WalletError(err.to_string()))?;

            let private_hex = String::from_utf8(decrypted.vec())
                .map_err(|err| CryptoError::WalletError(err.to_string()))?;

            let keypair = KeyPair::from_hex(private_hex)
                .map_err(|err| CryptoError::WalletError(err.to_string()))?;

            wallet.insert(keypair);
        }

        Ok(wallet)
    }
}
