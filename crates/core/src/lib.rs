//! `stockpile-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives shared by every other
//! crate: the log version token, the domain error model, and request
//! validation. No IO, no storage, no infrastructure concerns.

pub mod error;
pub mod version;

pub use error::{DomainError, DomainResult, validate_request};
pub use version::Version;
