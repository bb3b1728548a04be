//! In-memory store for tests/dev.

use std::collections::BTreeMap;
use std::ops::ControlFlow;
use std::sync::RwLock;

use tracing::trace;

use crate::tx::{ProjectionStore, StoreError, StoreTx, TxMode};

/// In-memory [`ProjectionStore`].
///
/// A read-write transaction holds the write lock for its whole duration, so
/// concurrent readers observe either the state before it or after it, never
/// a partial one (single-writer/multi-reader isolation). Not optimized for
/// performance.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Write-buffering transaction over a locked snapshot.
struct MemoryTx<'a> {
    base: &'a BTreeMap<String, String>,
    /// `Some` = pending set, `None` = pending delete.
    pending: BTreeMap<String, Option<String>>,
    mode: TxMode,
}

impl MemoryTx<'_> {
    fn ensure_writable(&self) -> Result<(), StoreError> {
        match self.mode {
            TxMode::ReadWrite => Ok(()),
            TxMode::ReadOnly => Err(StoreError::ReadOnlyWrite),
        }
    }
}

impl StoreTx for MemoryTx<'_> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        if let Some(pending) = self.pending.get(key) {
            return Ok(pending.clone());
        }
        Ok(self.base.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.ensure_writable()?;
        trace!(key, value, "set");
        self.pending.insert(key.to_string(), Some(value.to_string()));
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<(), StoreError> {
        self.ensure_writable()?;
        trace!(key, "delete");
        self.pending.insert(key.to_string(), None);
        Ok(())
    }

    fn scan_prefix(
        &self,
        prefix: &str,
        on_entry: &mut dyn FnMut(&str, &str) -> Result<ControlFlow<()>, StoreError>,
    ) -> Result<(), StoreError> {
        // Merge the committed state with this transaction's own writes so a
        // scan observes what a commit would produce.
        let mut merged: BTreeMap<&str, &str> = self
            .base
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.as_str(), value.as_str()))
            .collect();
        for (key, pending) in &self.pending {
            if !key.starts_with(prefix) {
                continue;
            }
            match pending {
                Some(value) => {
                    merged.insert(key, value);
                }
                None => {
                    merged.remove(key.as_str());
                }
            }
        }

        for (key, value) in merged {
            if on_entry(key, value)?.is_break() {
                break;
            }
        }
        Ok(())
    }
}

impl ProjectionStore for MemoryStore {
    fn within_tx<T, E>(
        &self,
        mode: TxMode,
        f: impl FnOnce(&mut dyn StoreTx) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let poisoned = || E::from(StoreError::Backend("lock poisoned".to_string()));

        match mode {
            TxMode::ReadOnly => {
                let guard = self.inner.read().map_err(|_| poisoned())?;
                let mut tx = MemoryTx {
                    base: &*guard,
                    pending: BTreeMap::new(),
                    mode,
                };
                f(&mut tx)
            }
            TxMode::ReadWrite => {
                let mut guard = self.inner.write().map_err(|_| poisoned())?;
                let mut tx = MemoryTx {
                    base: &*guard,
                    pending: BTreeMap::new(),
                    mode,
                };
                match f(&mut tx) {
                    Ok(out) => {
                        let pending = tx.pending;
                        for (key, value) in pending {
                            match value {
                                Some(value) => {
                                    guard.insert(key, value);
                                }
                                None => {
                                    guard.remove(&key);
                                }
                            }
                        }
                        trace!("tx committed");
                        Ok(out)
                    }
                    Err(err) => {
                        trace!("tx discarded");
                        Err(err)
                    }
                }
            }
        }
    }
}
