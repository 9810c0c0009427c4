//! HTTP delivery to the agent service
mod http;
pub use http::HttpTransport;

pub const PATH_AGENCY: &str = "/agency";
pub const PATH_AGENCY_MSG: &str = "/agency/msg";
