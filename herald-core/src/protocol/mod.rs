//! `protocol` binds a [`crate::message::MessageFamily`] to one relationship and one thread
pub mod types;

mod protocol;
pub use protocol::Protocol;
