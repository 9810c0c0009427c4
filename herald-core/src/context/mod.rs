//! `context` holds the session's identity material and addressing info
//!
//! A [`Context`] is either created fresh with [`Context::create`], in which case it still
//! needs to be provisioned, or restored from its persisted form with
//! [`Context::create_with_config`]. Persisting it is always left to the caller.
pub mod types;

mod context;
pub use context::Context;
