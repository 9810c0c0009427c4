//! `message` provides the wire level building blocks shared by all protocol families
//!
//! - [`MessageFamily`] owns the `(qualifier, family, version)` identity and renders the
//!   message type strings
//! - [`MessageType`] is the parsed form of a message type string
//! - [`Envelope`] is the JSON object exchanged with the agent
pub mod types;

mod family;
pub use family::{MessageFamily, MessageType};

mod envelope;
pub use envelope::Envelope;
