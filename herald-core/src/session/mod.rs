//! `session` ties a [`crate::context::Context`] to its collaborators and its own dispatch table
//!
//! There is no process wide state: every operation goes through an explicit [`Session`].
mod session;
pub use session::Session;
