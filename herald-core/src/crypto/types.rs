use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::with_errors::thiserror::{self, Error};

use crate::context::Context;
use crate::message::Envelope;

use super::Wallet;

pub const ALG_AUTHCRYPT: &str = "x25519-xchacha20poly1305-authcrypt";
pub const ALG_ANONCRYPT: &str = "x25519-xchacha20poly1305-anoncrypt";

pub const FORWARD_FAMILY: &str = "routing";
pub const FORWARD_VERSION: &str = "1.0";
pub const FORWARD_MSG: &str = "FWD";
pub const FIELD_FORWARD_TO: &str = "@fwd";
pub const FIELD_FORWARD_MSG: &str = "@msg";

#[derive(Debug, PartialEq, Error, Serialize, Deserialize, Clone)]
#[serde(crate = "self::serde")]
pub enum CryptoError {
    #[error("wallet error: {0}")]
    WalletError(String),

    #[error("missing key material: {0}")]
    MissingKeyMaterial(String),

    #[error("pack error: {0}")]
    PackError(String),

    #[error("unpack error: {0}")]
    UnpackError(String),

    #[error("unknown recipient: {0}")]
    UnknownRecipient(String),
}

/// A DID with the verkey of the key pair it was minted for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct DIDKey {
    pub did: String,
    pub verkey: String,
}

/// `CryptoBuilder` is the wallet and packing collaborator used by the framework
///
/// Implementations are expected to be cheap to clone, a session keeps its own copy and
/// hands clones to the dispatch engine.
pub trait CryptoBuilder: Clone + Send + Sync {
    fn open_wallet(&self, name: &str, key: &str) -> Result<Wallet, CryptoError>;

    /// Generate a new key pair inside the wallet and mint a DID for it
    fn create_keypair(&self, wallet: &mut Wallet) -> Result<DIDKey, CryptoError>;

    /// Pack a message for the provisioned agent, routed through the agency
    ///
    /// Fails with [`CryptoError::MissingKeyMaterial`] when the context has not been provisioned
    fn pack(&self, context: &Context, message: &Envelope) -> Result<Vec<u8>, CryptoError>;

    /// Pack a message directly for the agency, used before the context is provisioned
    fn pack_for_agency(&self, context: &Context, message: &Envelope)
        -> Result<Vec<u8>, CryptoError>;

    fn unpack(&self, context: &Context, packed: &[u8]) -> Result<Envelope, CryptoError>;
}
