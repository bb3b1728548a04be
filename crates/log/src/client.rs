//! The [`EventLog`] capability trait.

use std::sync::Arc;

use stockpile_core::Version;
use stockpile_events::RawEvent;
use thiserror::Error;

use crate::cancel::CancelToken;

/// An event together with the version the log assigned to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggedEvent {
    pub version: Version,
    pub event: RawEvent,
}

/// Event log client failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LogError {
    /// The log, or the connection to it, failed.
    #[error("event log: {0}")]
    Connectivity(String),

    /// A scan was requested from a version the log does not hold.
    #[error("invalid scan version: {0}")]
    InvalidVersion(Version),
}

/// Client for the shared append-only event log.
///
/// ## Versioning
///
/// Every accepted event is assigned a [`Version`]; versions are totally
/// ordered and strictly increase in append order. [`Version::EMPTY_LOG`]
/// is reserved for "the log holds nothing yet".
///
/// ## Conditional appends
///
/// [`try_append`](EventLog::try_append) is the optimistic-concurrency
/// primitive: the caller names the head version its decision was based on,
/// and the append is only accepted while that is still the head. A version
/// mismatch is **not an error**: the client invokes `on_conflict` so the
/// caller can catch its state up, then retries with the returned version.
/// Caller errors thread through `E`, so a domain-level abort inside
/// `build_event` propagates untouched with nothing appended.
pub trait EventLog: Send + Sync {
    /// Durably append one event unconditionally. Returns its version.
    fn append(&self, event: RawEvent) -> Result<Version, LogError>;

    /// Conditionally append the event produced by `build_event`, accepted
    /// only while the log head still equals `assumed`.
    ///
    /// On a head mismatch `on_conflict` must return a fresh version to
    /// retry against; the call loops until the append is accepted or a
    /// callback fails. Callbacks are invoked strictly one at a time.
    fn try_append<E>(
        &self,
        assumed: Version,
        build_event: impl FnMut() -> Result<RawEvent, E>,
        on_conflict: impl FnMut() -> Result<Version, E>,
    ) -> Result<Version, E>
    where
        E: From<LogError>;

    /// Deliver events in version order, starting **at** `from` inclusive.
    ///
    /// With `follow` the call blocks awaiting new events after draining
    /// the existing ones; without it the scan ends at the current head.
    /// A callback error aborts the scan and propagates.
    fn scan<E>(
        &self,
        from: Version,
        follow: bool,
        on_event: impl FnMut(LoggedEvent) -> Result<(), E>,
    ) -> Result<(), E>
    where
        E: From<LogError>;

    /// Block until `cancel` fires, invoking `on_version` for every append
    /// the log accepts. Cancellation is a clean shutdown, not an error.
    fn listen(
        &self,
        cancel: &CancelToken,
        on_version: impl FnMut(Version),
    ) -> Result<(), LogError>;

    /// Version of the first event in the log, or [`Version::EMPTY_LOG`].
    fn initial_version(&self) -> Result<Version, LogError>;
}

impl<L> EventLog for Arc<L>
where
    L: EventLog + ?Sized,
{
    fn append(&self, event: RawEvent) -> Result<Version, LogError> {
        (**self).append(event)
    }

    fn try_append<E>(
        &self,
        assumed: Version,
        build_event: impl FnMut() -> Result<RawEvent, E>,
        on_conflict: impl FnMut() -> Result<Version, E>,
    ) -> Result<Version, E>
    where
        E: From<LogError>,
    {
        (**self).try_append(assumed, build_event, on_conflict)
    }

    fn scan<E>(
        &self,
        from: Version,
        follow: bool,
        on_event: impl FnMut(LoggedEvent) -> Result<(), E>,
    ) -> Result<(), E>
    where
        E: From<LogError>,
    {
        (**self).scan(from, follow, on_event)
    }

    fn listen(
        &self,
        cancel: &CancelToken,
        on_version: impl FnMut(Version),
    ) -> Result<(), LogError> {
        (**self).listen(cancel, on_version)
    }

    fn initial_version(&self) -> Result<Version, LogError> {
        (**self).initial_version()
    }
}
