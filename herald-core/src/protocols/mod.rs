//! Typed protocol families built on top of [`crate::protocol::Protocol`]
//!
//! Each family exposes its message builders, packed variants for callers that deliver
//! on their own, async operations going through a [`crate::session::Session`], and the
//! typed enum its inbound messages decode into.
pub mod problem_report;

pub mod connecting;
pub mod issue_credential;
pub mod issuer_setup;
pub mod present_proof;
pub mod provision;
pub mod relationship;
pub mod update_endpoint;
pub mod write_cred_def;
pub mod write_schema;

pub use problem_report::ProblemReport;
