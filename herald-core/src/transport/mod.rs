//! `transport` is the outbound delivery collaborator
//!
//! The framework never retries, a failed delivery is returned to the caller as a
//! [`types::TransportError`].
pub mod types;
