pub mod context;
pub mod homedir;
