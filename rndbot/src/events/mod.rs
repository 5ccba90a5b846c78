//! Persisted per-bot facts with time-to-live semantics.
//!
//! Every scheduling decision is derived from these facts, so losing a write
//! only delays a transition until the next evaluation.

pub mod errors;
pub mod models;
pub mod store;

pub use errors::{EventError, EventResult};
pub use models::{Event, EventKey};
pub use store::{EventStore, GLOBAL_BOT};
