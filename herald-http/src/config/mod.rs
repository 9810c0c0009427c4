mod app;
pub use app::App;

mod session;
pub use session::Session;

mod config;
pub use config::Config;

mod parser;
pub use parser::Parser;
