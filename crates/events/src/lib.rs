//! Stock events and their wire representation.
//!
//! The event log carries label + JSON payload pairs; this crate owns the
//! typed form ([`StockEvent`]) and the codec between the two.

pub mod codec;
pub mod event;

pub use codec::{CodecError, RawEvent, decode, encode};
pub use event::StockEvent;
