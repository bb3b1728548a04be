//! Event log client capability.
//!
//! One shared, totally-ordered, append-only event log is the single source
//! of truth every service replays. Services never talk to each other, only
//! to the log, through the [`EventLog`] trait. This crate ships the
//! in-memory [`InMemoryEventLog`]; a networked log server sits behind the
//! same trait in a real deployment.

pub mod cancel;
pub mod client;
pub mod in_memory;

pub use cancel::CancelToken;
pub use client::{EventLog, LogError, LoggedEvent};
pub use in_memory::InMemoryEventLog;
