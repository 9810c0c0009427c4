//! `prople-herald-http` carries the session over HTTP
//!
//! [`transport::HttpTransport`] delivers packed messages to the agent, and
//! [`webhook::Webhook`] receives the agent's messages and feeds them to the session.
pub mod common;
pub mod config;
pub mod transport;
pub mod webhook;
