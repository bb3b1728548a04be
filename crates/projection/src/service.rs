//! Projection service: synchronization, live updates, reads.

use core::ops::ControlFlow;
use std::collections::BTreeMap;

use stockpile_core::Version;
use stockpile_log::{CancelToken, EventLog};
use stockpile_store::{ProjectionStore, StoreTx, TxMode};
use tracing::{debug, info, warn};

use crate::apply;
use crate::error::AggregateError;
use crate::state;

/// A service's local materialization of the shared log, plus the write path
/// guarding the stock invariant.
///
/// One instance runs two concurrent activities against the same store: the
/// background reactive loop ([`run`](Self::run)) and the foreground request
/// path (`put`/`take`/[`query`](Self::query)). Mutual exclusion between
/// them is entirely the store's transaction isolation; nothing here takes
/// an application-level lock.
#[derive(Debug)]
pub struct StockAggregate<L, S> {
    log: L,
    store: S,
}

impl<L, S> StockAggregate<L, S> {
    pub fn new(log: L, store: S) -> Self {
        Self { log, store }
    }

    pub(crate) fn log(&self) -> &L {
        &self.log
    }

    pub(crate) fn store(&self) -> &S {
        &self.store
    }
}

impl<L, S> StockAggregate<L, S>
where
    L: EventLog,
    S: ProjectionStore,
{
    /// One full synchronization pass in its own transaction.
    pub fn sync(&self) -> Result<Version, AggregateError> {
        self.store.within_tx(TxMode::ReadWrite, |tx| self.sync_in_tx(tx))
    }

    /// Scan-and-apply from the local marker to the log head, inside `tx`.
    ///
    /// Returns the version the projection holds after the pass (the
    /// starting version when nothing new was applied). Safe to rerun after
    /// a rollback: applying is transactional with the marker update, and a
    /// scanned event whose version equals the marker (the boundary event of
    /// a previous pass) is never reapplied.
    pub(crate) fn sync_in_tx(&self, tx: &mut dyn StoreTx) -> Result<Version, AggregateError> {
        let marker = state::version(tx)?;

        let start = match marker {
            Some(version) => {
                debug!(%version, "synchronizing from marker");
                version
            }
            None => {
                debug!("synchronizing from the log's initial version");
                self.log.initial_version()?
            }
        };
        if start.is_empty_log() {
            debug!("event log is empty; nothing to apply");
            return Ok(start);
        }

        let mut latest = start;
        self.log.scan(start, false, |logged| {
            if marker == Some(logged.version) {
                // Boundary event of the previous pass; already applied.
                return Ok(());
            }
            apply::apply_event(tx, &logged)?;
            latest = logged.version;
            Ok::<_, AggregateError>(())
        })?;
        Ok(latest)
    }

    /// Synchronize once, then keep the projection live until cancellation.
    ///
    /// The startup pass is fatal on failure; a service must not come up
    /// behind the log. Steady-state passes are logged on failure and healed
    /// by the next notification. Cancellation returns `Ok`.
    pub fn run(&self, cancel: &CancelToken) -> Result<(), AggregateError> {
        self.sync()?;

        info!("listening for updates");
        self.log.listen(cancel, |version| {
            debug!(%version, "update received");
            if let Err(error) = self.sync() {
                warn!(%error, "synchronization failed; retrying on next update");
            }
        })?;
        Ok(())
    }

    /// Consistent read of the projection: returns the current version
    /// marker and feeds every `(object, quantity)` pair to `on_object`, in
    /// object order. The callback may halt the enumeration early.
    pub fn query(
        &self,
        on_object: &mut dyn FnMut(&str, i64) -> ControlFlow<()>,
    ) -> Result<Option<Version>, AggregateError> {
        self.store.within_tx(TxMode::ReadOnly, |tx| {
            let marker = state::version(tx)?;
            state::scan_objects(tx, on_object)?;
            Ok::<_, AggregateError>(marker)
        })
    }

    /// Full copy of the projection, for printing and tests.
    pub fn snapshot(&self) -> Result<(Option<Version>, BTreeMap<String, i64>), AggregateError> {
        let mut objects = BTreeMap::new();
        let marker = self.query(&mut |object, quantity| {
            objects.insert(object.to_string(), quantity);
            ControlFlow::Continue(())
        })?;
        Ok((marker, objects))
    }
}
