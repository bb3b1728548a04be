//! Process-level observability wiring.

mod tracing;

pub use tracing::init;
