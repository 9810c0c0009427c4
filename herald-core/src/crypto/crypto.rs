use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::serde_json::{self, Value};
use rst_common::with_cryptography::hex;

use prople_crypto::aead::{Key, KeyEncryption, KeyNonce, MessageCipher, MessagePlain, AEAD};
use prople_crypto::ecdh::keypair::KeyPair;
use prople_crypto::types::{ByteHex, BytesValue, Hexer, VectorValue};

use prople_did_core::did::DID;

use crate::context::Context;
use crate::message::types::{Qualifier, FIELD_TYPE};
use crate::message::{Envelope, MessageFamily};

use super::types::{
    CryptoBuilder, CryptoError, DIDKey, ALG_ANONCRYPT, ALG_AUTHCRYPT, FIELD_FORWARD_MSG,
    FIELD_FORWARD_TO, FORWARD_FAMILY, FORWARD_MSG, FORWARD_VERSION,
};
use super::Wallet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
struct ProtectedHeader {
    alg: String,
    recipient: String,
    sender: String,
}

/// Wire form of a packed message, every binary field is hex encoded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct PackedMessage {
    protected: ProtectedHeader,
    nonce: String,
    ciphertext: String,
}

impl PackedMessage {
    pub fn recipient(&self) -> &str {
        &self.protected.recipient
    }

    pub fn sender(&self) -> &str {
        &self.protected.sender
    }

    pub fn is_anonymous(&self) -> bool {
        self.protected.alg == ALG_ANONCRYPT
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, CryptoError> {
        serde_json::to_vec(self).map_err(|err| CryptoError::PackError(err.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        serde_json::from_slice(bytes).map_err(|err| CryptoError::UnpackError(err.to_string()))
    }
}

/// `Crypto` is the default [`CryptoBuilder`] implementation
#[derive(Debug, Clone, Default)]
pub struct Crypto;

impl Crypto {
    pub fn new() -> Self {
        Self
    }

    /// Encrypt for `recipient` so that it can authenticate the `sender` key
    pub fn authcrypt(
        sender: &KeyPair,
        recipient: &str,
        plain: Vec<u8>,
    ) -> Result<PackedMessage, CryptoError> {
        Self::seal(ALG_AUTHCRYPT, sender.clone(), recipient, plain)
    }

    /// Encrypt for `recipient` with a throwaway sender key
    pub fn anoncrypt(recipient: &str, plain: Vec<u8>) -> Result<PackedMessage, CryptoError> {
        Self::seal(ALG_ANONCRYPT, KeyPair::generate(), recipient, plain)
    }

    /// Decrypt a packed message with whichever wallet key it was addressed to
    pub fn open(wallet: &Wallet, packed: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let packed = PackedMessage::from_bytes(packed)?;
        let keypair = wallet
            .keypair(packed.recipient())
            .cloned()
            .ok_or_else(|| CryptoError::UnknownRecipient(packed.recipient().to_string()))?;

        let encryption = Self::shared_key(keypair, packed.sender())
            .map_err(CryptoError::UnpackError)?;

        let nonce = Self::decode_nonce(&packed.nonce).map_err(CryptoError::UnpackError)?;
        let ciphertext = hex::decode(&packed.ciphertext)
            .map_err(|err| CryptoError::UnpackError(err.to_string()))?;

        let key = Key::new(encryption, KeyNonce::from(nonce));
        let plain = AEAD::decrypt(&key, &MessageCipher::from(ciphertext))
            .map_err(|err| CryptoError::UnpackError(err.to_string()))?;

        Ok(plain.vec())
    }

    /// Unwrap a routed message the way the agent side does: open the `FWD` message
    /// and then the inner message it carries
    pub fn unpack_forward(wallet: &Wallet, packed: &[u8]) -> Result<Envelope, CryptoError> {
        let outer = Self::open_envelope(wallet, packed)?;
        let inner = outer.get(FIELD_FORWARD_MSG).ok_or_else(|| {
            CryptoError::UnpackError(format!("missing {} field", FIELD_FORWARD_MSG))
        })?;

        let inner_bytes =
            serde_json::to_vec(inner).map_err(|err| CryptoError::UnpackError(err.to_string()))?;

        Self::open_envelope(wallet, &inner_bytes)
    }

    fn open_envelope(wallet: &Wallet, packed: &[u8]) -> Result<Envelope, CryptoError> {
        let plain = Self::open(wallet, packed)?;
        Envelope::from_bytes(&plain).map_err(|err| CryptoError::UnpackError(err.to_string()))
    }

    fn seal(
        alg: &str,
        sender: KeyPair,
        recipient: &str,
        plain: Vec<u8>,
    ) -> Result<PackedMessage, CryptoError> {
        let sender_verkey = sender.pub_key().to_hex().hex();
        let encryption = Self::shared_key(sender, recipient).map_err(CryptoError::PackError)?;

        let nonce: [u8; 24] = AEAD::nonce()
            .vec()
            .try_into()
            .map_err(|_| CryptoError::PackError("invalid nonce length".to_string()))?;

        let key = Key::new(encryption, KeyNonce::from(nonce));
        let cipher = AEAD::encrypt(&key, &MessagePlain::from(plain))
            .map_err(|err| CryptoError::PackError(err.to_string()))?;

        Ok(PackedMessage {
            protected: ProtectedHeader {
                alg: alg.to_string(),
                recipient: recipient.to_string(),
                sender: sender_verkey,
            },
            nonce: hex::encode(nonce),
            ciphertext: hex::encode(cipher.vec()),
        })
    }

    fn shared_key(own: KeyPair, peer_verkey: &str) -> Result<KeyEncryption, String> {
        let hashed = own
            .secret(ByteHex::from(peer_verkey.to_string()))
            .to_blake3()
            .map_err(|err| err.to_string())?;

        KeyEncryption::try_from(hashed.bytes()).map_err(|err| err.to_string())
    }

    fn decode_nonce(value: &str) -> Result<[u8; 24], String> {
        let decoded = hex::decode(value).map_err(|err| err.to_string())?;
        decoded
            .try_into()
            .map_err(|_| "invalid nonce length".to_string())
    }

    fn forward_message(domain_did: &str, inner: &PackedMessage) -> Result<Envelope, CryptoError> {
        let family = MessageFamily::new(Qualifier::Agency, FORWARD_FAMILY, FORWARD_VERSION)
            .map_err(|err| CryptoError::PackError(err.to_string()))?;

        let inner_value =
            serde_json::to_value(inner).map_err(|err| CryptoError::PackError(err.to_string()))?;

        let mut forward = serde_json::Map::new();
        forward.insert(
            FIELD_TYPE.to_string(),
            Value::String(family.type_string(FORWARD_MSG)),
        );
        forward.insert(
            FIELD_FORWARD_TO.to_string(),
            Value::String(domain_did.to_string()),
        );
        forward.insert(FIELD_FORWARD_MSG.to_string(), inner_value);

        Ok(Envelope::from(forward))
    }

    fn message_bytes(message: &Envelope) -> Result<Vec<u8>, CryptoError> {
        message
            .to_bytes()
            .map_err(|err| CryptoError::PackError(err.to_string()))
    }
}

impl CryptoBuilder for Crypto {
    fn open_wallet(&self, name: &str, key: &str) -> Result<Wallet, CryptoError> {
        Wallet::new(name, key)
    }

    fn create_keypair(&self, wallet: &mut Wallet) -> Result<DIDKey, CryptoError> {
        let did = DID::new()
            .identity()
            .map_err(|err| CryptoError::WalletError(err.to_string()))?
            .value();

        let verkey = wallet.insert(KeyPair::generate());
        Ok(DIDKey { did, verkey })
    }

    fn pack(&self, context: &Context, message: &Envelope) -> Result<Vec<u8>, CryptoError> {
        let sender = context.wallet().keypair(context.sdk_verkey()).ok_or_else(|| {
            CryptoError::MissingKeyMaterial(format!(
                "sdk verkey not in wallet: {}",
                context.sdk_verkey()
            ))
        })?;

        let agent_verkey = context.agent_verkey().ok_or_else(|| {
            CryptoError::MissingKeyMaterial("agent verkey, context is not provisioned".to_string())
        })?;

        let domain_did = context.domain_did().ok_or_else(|| {
            CryptoError::MissingKeyMaterial("domain did, context is not provisioned".to_string())
        })?;

        let agency_verkey = context.agent_public_verkey().ok_or_else(|| {
            CryptoError::MissingKeyMaterial("agency verkey".to_string())
        })?;

        let inner = Self::authcrypt(sender, agent_verkey, Self::message_bytes(message)?)?;
        let forward = Self::forward_message(domain_did, &inner)?;

        Self::anoncrypt(agency_verkey, Self::message_bytes(&forward)?)?.to_bytes()
    }

    fn pack_for_agency(
        &self,
        context: &Context,
        message: &Envelope,
    ) -> Result<Vec<u8>, CryptoError> {
        let agency_verkey = context.agent_public_verkey().ok_or_else(|| {
            CryptoError::MissingKeyMaterial("agency verkey".to_string())
        })?;

        Self::anoncrypt(agency_verkey, Self::message_bytes(message)?)?.to_bytes()
    }

    fn unpack(&self, context: &Context, packed: &[u8]) -> Result<Envelope, CryptoError> {
        let plain = Self::open(context.wallet(), packed).map_err(|err| match err {
            CryptoError::UnknownRecipient(verkey) => {
                CryptoError::UnpackError(format!("unknown recipient: {}", verkey))
            }
            other => other,
        })?;

        Envelope::from_bytes(&plain).map_err(|err| CryptoError::UnpackError(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rst_common::standard::serde_json::json;

    use crate::context::Context;

    struct Fixture {
        context: Context,
        agent_wallet: Wallet,
        agent_keypair: KeyPair,
    }

    fn provisioned_fixture() -> Fixture {
        let crypto = Crypto::new();
        let mut agent_wallet = Wallet::new("agent", "agent-key").unwrap();
        let agency_verkey = agent_wallet.insert(KeyPair::generate());
        let agent_keypair = KeyPair::generate();
        let agent_verkey = agent_wallet.insert(agent_keypair.clone());

        let mut context = Context::create(
            &crypto,
            "sdk",
            "sdk-key",
            "http://agency.test",
            Some("http://sdk.test/webhook".to_string()),
        )
        .unwrap();

        context.set_agency_identity("did:agency:1".to_string(), agency_verkey);
        context.set_provisioned("did:domain:1".to_string(), agent_verkey);

        Fixture {
            context,
            agent_wallet,
            agent_keypair,
        }
    }

    #[test]
    fn test_create_keypair() {
        let crypto = Crypto::new();
        let mut wallet = crypto.open_wallet("sdk", "key").unwrap();
        let did_key = crypto.create_keypair(&mut wallet).unwrap();

        assert!(did_key.did.starts_with("did:"));
        assert!(wallet.contains(&did_key.verkey));
    }

    #[test]
    fn test_authcrypt_open() {
        let mut wallet = Wallet::new("wallet", "key").unwrap();
        let recipient = wallet.insert(KeyPair::generate());
        let sender = KeyPair::generate();

        let packed = Crypto::authcrypt(&sender, &recipient, b"hello".to_vec()).unwrap();
        assert!(!packed.is_anonymous());
        assert_eq!(packed.sender(), sender.pub_key().to_hex().hex());

        let plain = Crypto::open(&wallet, &packed.to_bytes().unwrap()).unwrap();
        assert_eq!(plain, b"hello".to_vec());
    }

    #[test]
    fn test_open_unknown_recipient() {
        let wallet = Wallet::new("wallet", "key").unwrap();
        let recipient = KeyPair::generate().pub_key().to_hex().hex();
        let packed = Crypto::anoncrypt(&recipient, b"hello".to_vec()).unwrap();

        let result = Crypto::open(&wallet, &packed.to_bytes().unwrap());
        assert!(matches!(
            result.unwrap_err(),
            CryptoError::UnknownRecipient(_)
        ));
    }

    #[test]
    fn test_pack_routed_through_forward() {
        let fixture = provisioned_fixture();
        let message = Envelope::new("did:sov:123;spec/write-schema/0.6/write".to_string())
            .with("name", "license")
            .with("attrNames", json!(["name", "age"]));

        let packed = Crypto::new().pack(&fixture.context, &message).unwrap();
        let unpacked = Crypto::unpack_forward(&fixture.agent_wallet, &packed).unwrap();
        assert_eq!(unpacked, message);

        let outer = Crypto::open(&fixture.agent_wallet, &packed).unwrap();
        let forward = Envelope::from_bytes(&outer).unwrap();
        assert_eq!(
            forward.msg_type(),
            Some("did:sov:123456789abcdefghi1234;spec/routing/1.0/FWD")
        );
        assert_eq!(forward.get_str(FIELD_FORWARD_TO), Some("did:domain:1"));
    }

    #[test]
    fn test_unpack_response_from_agent() {
        let fixture = provisioned_fixture();
        let response = Envelope::new("did:sov:123;spec/write-schema/0.6/status-report".to_string())
            .with("schemaId", "schema:1");

        let packed = Crypto::authcrypt(
            &fixture.agent_keypair,
            fixture.context.sdk_verkey(),
            response.to_bytes().unwrap(),
        )
        .unwrap();

        let unpacked = Crypto::new()
            .unpack(&fixture.context, &packed.to_bytes().unwrap())
            .unwrap();
        assert_eq!(unpacked, response);
    }

    #[test]
    fn test_pack_unprovisioned() {
        let crypto = Crypto::new();
        let context = Context::create(&crypto, "sdk", "sdk-key", "http://agency.test", None)
            .unwrap();
        let message = Envelope::new("did:sov:123;spec/a/1.0/b".to_string());

        let result = crypto.pack(&context, &message);
        assert!(matches!(
            result.unwrap_err(),
            CryptoError::MissingKeyMaterial(_)
        ));

        let result = crypto.pack_for_agency(&context, &message);
        assert!(matches!(
            result.unwrap_err(),
            CryptoError::MissingKeyMaterial(_)
        ));
    }

    #[test]
    fn test_unpack_garbage() {
        let fixture = provisioned_fixture();
        let result = Crypto::new().unpack(&fixture.context, b"garbage");
        assert!(matches!(result.unwrap_err(), CryptoError::UnpackError(_)));

        let other = KeyPair::generate().pub_key().to_hex().hex();
        let packed = Crypto::anoncrypt(&other, b"{}".to_vec()).unwrap();
        let result = Crypto::new().unpack(&fixture.context, &packed.to_bytes().unwrap());
        assert!(matches!(result.unwrap_err(), CryptoError::UnpackError(_)));
    }
}
