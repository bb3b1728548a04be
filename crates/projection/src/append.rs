//! Write path: unconditional puts, invariant-guarded takes.

use core::cell::RefCell;

use stockpile_core::{DomainError, Version, validate_request};
use stockpile_events::{RawEvent, StockEvent, codec};
use stockpile_log::EventLog;
use stockpile_store::{ProjectionStore, TxMode};
use tracing::debug;

use crate::error::AggregateError;
use crate::service::StockAggregate;
use crate::state;

impl<L, S> StockAggregate<L, S>
where
    L: EventLog,
    S: ProjectionStore,
{
    /// Append a Put event.
    ///
    /// Puts carry no invariant, so they go to the log unconditionally. The
    /// local projection is not touched here; the event comes back through
    /// the normal sync path, keeping exactly one apply code path.
    pub fn put(&self, object: &str, quantity: i64) -> Result<Version, AggregateError> {
        validate_request(object, quantity)?;

        let raw = codec::encode(&StockEvent::put(object, quantity))?;
        let version = self.log().append(raw)?;
        debug!(%version, object, quantity, "put appended");
        Ok(version)
    }

    /// Append a Take event, guaranteeing stock never goes negative under
    /// concurrent writers.
    ///
    /// The whole operation runs inside one read-write transaction: the
    /// quantity pre-check, the conditional append against the assumed log
    /// head, and, when the head has moved, a resync of exactly the missed
    /// events, after which the pre-check runs again on the refreshed state.
    /// The loop ends when the append is accepted or the refreshed quantity
    /// no longer covers the request, which aborts the transaction with
    /// [`DomainError::InsufficientQuantity`] and leaves both the log and
    /// the local state untouched.
    ///
    /// A successful take does not update the local quantity either; like a
    /// put, the event is applied when it is scanned back.
    pub fn take(&self, object: &str, quantity: i64) -> Result<Version, AggregateError> {
        validate_request(object, quantity)?;

        self.store().within_tx(TxMode::ReadWrite, |tx| {
            let assumed = state::version(tx)?.unwrap_or(Version::EMPTY_LOG);

            // Both callbacks work on this transaction; they are invoked
            // strictly one at a time.
            let tx = RefCell::new(tx);

            self.log().try_append(
                assumed,
                || -> Result<RawEvent, AggregateError> {
                    let guard = tx.borrow();
                    let stored = state::quantity(&**guard, object)?;
                    if stored - quantity < 0 {
                        debug!(object, quantity, stored, "take rejected");
                        return Err(DomainError::insufficient_quantity(
                            object, quantity, stored,
                        )
                        .into());
                    }
                    Ok(codec::encode(&StockEvent::take(object, quantity))?)
                },
                || -> Result<Version, AggregateError> {
                    debug!(object, "log head moved; resynchronizing");
                    let mut guard = tx.borrow_mut();
                    self.sync_in_tx(&mut **guard)
                },
            )
        })
    }
}
