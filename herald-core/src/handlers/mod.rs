//! `handlers` is the inbound dispatch engine
//!
//! [`Handlers`] owns a registry from [`types::HandlerKey`] to a single handler plus one
//! fallback. A key is either family wide, `(family, version)`, or scoped to one thread,
//! `(family, version, thread)`. An inbound message is routed to its thread scoped
//! handler first, then to the family wide one, then to the fallback. Registering twice
//! for the same key replaces the previous handler.
//!
//! Every inbound message ends up in at most one handler invocation, or in a
//! [`types::DispatchError`] when nothing can take it. A handler may decline a message
//! through [`types::MessageHandler::accepts`], the message is then deferred and handed to
//! the next handler registered on the same key that takes it.
pub mod types;

mod handler;
pub use handler::{fallback_fn, handler_fn, FallbackFn, HandlerFn};

mod handlers;
pub use handlers::Handlers;
