//! `correlation` matches inbound responses back to the step waiting for them
//!
//! Each protocol step opens an [`Exchange`], which registers a handler scoped to the
//! step's thread and owns a [`ResultSlot`] that handler resolves. The step then moves
//! through [`types::ExchangeState`]:
//!
//! ```text
//! Idle -> Sent -> AwaitingResponse -> Resolved
//!                                  -> Failed (problem report, unexpected message, timeout, cancel)
//! ```
//!
//! Dropping an exchange removes its handler, unless something else registered on the
//! same key in the meantime.
pub mod types;

mod slot;
pub use slot::ResultSlot;

mod exchange;
pub use exchange::{Exchange, ExchangeCanceller, ExchangeScope};
