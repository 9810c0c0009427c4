//! Inbound webhook, the agent posts every asynchronous response here
//!
//! The endpoint always answers `200`: the agent only needs to know the payload arrived.
//! Dispatch failures are logged and echoed in the response body.
mod handler;
pub use handler::{receive, WebhookState, RESPONSE_SUCCESS};

mod server;
pub use server::Webhook;
