//! `crypto` is the wallet and message packing collaborator
//!
//! Every key lives in a [`Wallet`] indexed by its verkey, which is the hex encoded X25519
//! public key. [`Crypto`] is the default [`types::CryptoBuilder`] implementation:
//!
//! - authcrypt: ECDH between the sender's static key and the recipient verkey
//! - anoncrypt: the same, using a fresh ephemeral sender key
//!
//! The shared secret is hashed with BLAKE3 and used as an XChaCha20-Poly1305 key.
//! Messages for the agent are routed: authcrypted for the agent, wrapped in a `FWD`
//! message addressed to the domain DID, then anoncrypted for the agency.
pub mod types;

mod wallet;
pub use wallet::{Wallet, WalletConfig};

mod crypto;
pub use crypto::{Crypto, PackedMessage};
