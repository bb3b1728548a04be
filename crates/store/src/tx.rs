//! Storage capability traits.

use core::ops::ControlFlow;
use std::sync::Arc;

use thiserror::Error;

/// Transaction mode.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TxMode {
    ReadOnly,
    ReadWrite,
}

/// Storage operation error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Backend-level failure (IO, poisoned lock, ...).
    #[error("storage backend: {0}")]
    Backend(String),

    /// A mutation was attempted inside a read-only transaction.
    #[error("write attempted in read-only transaction")]
    ReadOnlyWrite,

    /// A stored value could not be interpreted.
    #[error("corrupt stored value: {0}")]
    Corrupt(String),
}

/// Operations available inside one transaction.
///
/// Writes are buffered until the enclosing [`ProjectionStore::within_tx`]
/// commits; a transaction whose closure errors out leaves the store
/// untouched.
pub trait StoreTx {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    fn delete(&mut self, key: &str) -> Result<(), StoreError>;

    /// Visit every `(key, value)` pair whose key starts with `prefix`, in
    /// key order. The callback may halt the scan early with
    /// [`ControlFlow::Break`]; an early halt is not an error.
    fn scan_prefix(
        &self,
        prefix: &str,
        on_entry: &mut dyn FnMut(&str, &str) -> Result<ControlFlow<()>, StoreError>,
    ) -> Result<(), StoreError>;
}

/// Transactional key-value store with commit-or-discard semantics.
///
/// Mutual exclusion between concurrent activities (the background sync loop
/// and the foreground request path) is delegated entirely to the store's
/// transaction isolation; implementations must give a read-write
/// transaction a consistent snapshot for its whole duration.
pub trait ProjectionStore: Send + Sync {
    /// Run `f` inside a new transaction.
    ///
    /// The transaction is committed when `f` returns `Ok` and discarded
    /// otherwise.
    fn within_tx<T, E>(
        &self,
        mode: TxMode,
        f: impl FnOnce(&mut dyn StoreTx) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<StoreError>;
}

impl<S> ProjectionStore for Arc<S>
where
    S: ProjectionStore + ?Sized,
{
    fn within_tx<T, E>(
        &self,
        mode: TxMode,
        f: impl FnOnce(&mut dyn StoreTx) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        (**self).within_tx(mode, f)
    }
}
