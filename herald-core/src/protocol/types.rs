use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::with_errors::thiserror::{self, Error};

use crate::message::Envelope;

#[derive(Debug, PartialEq, Error, Serialize, Deserialize, Clone)]
#[serde(crate = "self::serde")]
pub enum ProtocolError {
    #[error("pack error: {0}")]
    PackError(String),

    #[error("unpack error: {0}")]
    UnpackError(String),

    #[error("transport error: {0}")]
    TransportError(String),

    #[error("message error: {0}")]
    MessageError(String),

    #[error("rejected: {0}")]
    Rejected(String),
}

/// `FamilyMessage` is the typed view over the inbound messages of one protocol family
///
/// Decoding never fails: message names the family does not know, or payloads missing
/// their required fields, decode into the family's unexpected variant.
pub trait FamilyMessage: Sized + Send + 'static {
    fn decode(message_name: &str, envelope: &Envelope) -> Self;

    /// A description of the failure when this message ends the exchange with an error,
    /// i.e. a problem report or an unexpected message
    fn failure(&self) -> Option<String>;
}
