//! `prople-herald-core` is the message framework used to drive a remote identity agent
//!
//! An outbound exchange builds a typed [`message::Envelope`] through a [`protocol::Protocol`],
//! packs it with the session's [`crypto::CryptoBuilder`] and hands the bytes to a
//! [`transport::TransportBuilder`]. Inbound webhook payloads go back through
//! [`handlers::Handlers`], which unpacks them, resolves the message family and routes
//! them to exactly one handler, usually one installed by a [`correlation::Exchange`]
//! that is waiting for that response.
pub mod context;
pub mod correlation;
pub mod crypto;
pub mod handlers;
pub mod message;
pub mod protocol;
pub mod protocols;
pub mod session;
pub mod transport;

#[cfg(test)]
mod testing;
