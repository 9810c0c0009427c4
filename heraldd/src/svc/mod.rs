pub mod logger;
pub mod provision;
pub mod serve;
