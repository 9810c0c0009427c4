pub mod errors;
pub mod svc;
pub mod utils;
