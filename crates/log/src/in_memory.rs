//! In-memory event log for tests/dev.

use std::sync::mpsc;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use stockpile_core::Version;
use stockpile_events::RawEvent;
use tracing::trace;

use crate::cancel::CancelToken;
use crate::client::{EventLog, LogError, LoggedEvent};

const POLL_TICK: Duration = Duration::from_millis(50);

/// In-memory append-only log.
///
/// Versions are assigned 1, 2, 3, … in append order; the head is the
/// version of the last accepted event. Change notifications fan out over
/// plain channels, dropping dead subscribers as they go.
#[derive(Debug, Default)]
pub struct InMemoryEventLog {
    events: Mutex<Vec<RawEvent>>,
    subscribers: Mutex<Vec<mpsc::Sender<Version>>>,
}

impl InMemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_events(&self) -> Result<MutexGuard<'_, Vec<RawEvent>>, LogError> {
        self.events
            .lock()
            .map_err(|_| LogError::Connectivity("event lock poisoned".to_string()))
    }

    fn subscribe(&self) -> Result<mpsc::Receiver<Version>, LogError> {
        let (tx, rx) = mpsc::channel();
        self.subscribers
            .lock()
            .map_err(|_| LogError::Connectivity("subscriber lock poisoned".to_string()))?
            .push(tx);
        Ok(rx)
    }

    fn notify(&self, version: Version) {
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.retain(|tx| tx.send(version).is_ok());
        }
    }

    fn head(events: &[RawEvent]) -> Version {
        Version::new(events.len() as u64)
    }
}

impl EventLog for InMemoryEventLog {
    fn append(&self, event: RawEvent) -> Result<Version, LogError> {
        let version = {
            let mut events = self.lock_events()?;
            events.push(event);
            Self::head(&events)
        };
        trace!(%version, "append accepted");
        self.notify(version);
        Ok(version)
    }

    fn try_append<E>(
        &self,
        mut assumed: Version,
        mut build_event: impl FnMut() -> Result<RawEvent, E>,
        mut on_conflict: impl FnMut() -> Result<Version, E>,
    ) -> Result<Version, E>
    where
        E: From<LogError>,
    {
        loop {
            let appended = {
                let mut events = self.lock_events().map_err(E::from)?;
                if Self::head(&events) == assumed {
                    // The head is briefly locked here, so `build_event`
                    // must not call back into the log.
                    let event = build_event()?;
                    events.push(event);
                    Some(Self::head(&events))
                } else {
                    None
                }
            };

            match appended {
                Some(version) => {
                    trace!(%version, "conditional append accepted");
                    self.notify(version);
                    return Ok(version);
                }
                None => {
                    // Head moved past `assumed`; let the caller catch up and
                    // retry against whatever it reports back.
                    trace!(%assumed, "conditional append conflict");
                    assumed = on_conflict()?;
                }
            }
        }
    }

    fn scan<E>(
        &self,
        from: Version,
        follow: bool,
        mut on_event: impl FnMut(LoggedEvent) -> Result<(), E>,
    ) -> Result<(), E>
    where
        E: From<LogError>,
    {
        if from.is_empty_log() {
            return Err(E::from(LogError::InvalidVersion(from)));
        }
        {
            let events = self.lock_events().map_err(E::from)?;
            if from > Self::head(&events) {
                return Err(E::from(LogError::InvalidVersion(from)));
            }
        }

        // Subscribe before draining so a follow scan misses nothing.
        let updates = if follow {
            Some(self.subscribe().map_err(E::from)?)
        } else {
            None
        };

        let mut next = from.as_u64();
        loop {
            let batch: Vec<LoggedEvent> = {
                let events = self.lock_events().map_err(E::from)?;
                events
                    .iter()
                    .enumerate()
                    .skip(next as usize - 1)
                    .map(|(index, event)| LoggedEvent {
                        version: Version::new(index as u64 + 1),
                        event: event.clone(),
                    })
                    .collect()
            };
            for logged in batch {
                next = logged.version.as_u64() + 1;
                on_event(logged)?;
            }

            match &updates {
                None => return Ok(()),
                Some(receiver) => {
                    // Block awaiting new events; the stream ends only when
                    // the log itself goes away.
                    if receiver.recv().is_err() {
                        return Ok(());
                    }
                }
            }
        }
    }

    fn listen(
        &self,
        cancel: &CancelToken,
        mut on_version: impl FnMut(Version),
    ) -> Result<(), LogError> {
        let updates = self.subscribe()?;
        loop {
            if cancel.is_cancelled() {
                trace!("listen cancelled");
                return Ok(());
            }
            match updates.recv_timeout(POLL_TICK) {
                Ok(version) => on_version(version),
                Err(mpsc::RecvTimeoutError::Timeout) => continue,
                Err(mpsc::RecvTimeoutError::Disconnected) => return Ok(()),
            }
        }
    }

    fn initial_version(&self) -> Result<Version, LogError> {
        let events = self.lock_events()?;
        Ok(if events.is_empty() {
            Version::EMPTY_LOG
        } else {
            Version::new(1)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    fn raw(label: &str, payload: &str) -> RawEvent {
        RawEvent {
            label: label.to_string(),
            payload: payload.to_string(),
        }
    }

    #[test]
    fn appends_assign_increasing_versions() {
        let log = InMemoryEventLog::new();
        assert_eq!(log.append(raw("put", "{}")).unwrap(), Version::new(1));
        assert_eq!(log.append(raw("put", "{}")).unwrap(), Version::new(2));
    }

    #[test]
    fn initial_version_reports_empty_log() {
        let log = InMemoryEventLog::new();
        assert_eq!(log.initial_version().unwrap(), Version::EMPTY_LOG);

        log.append(raw("put", "{}")).unwrap();
        assert_eq!(log.initial_version().unwrap(), Version::new(1));
    }

    #[test]
    fn scan_is_inclusive_and_ordered() {
        let log = InMemoryEventLog::new();
        log.append(raw("put", "a")).unwrap();
        log.append(raw("take", "b")).unwrap();
        log.append(raw("put", "c")).unwrap();

        let mut seen = Vec::new();
        log.scan(Version::new(2), false, |logged| {
            seen.push((logged.version, logged.event.payload));
            Ok::<_, LogError>(())
        })
        .unwrap();

        assert_eq!(
            seen,
            vec![
                (Version::new(2), "b".to_string()),
                (Version::new(3), "c".to_string()),
            ]
        );
    }

    #[test]
    fn scan_rejects_versions_the_log_does_not_hold() {
        let log = InMemoryEventLog::new();
        log.append(raw("put", "a")).unwrap();

        let err = log
            .scan(Version::new(2), false, |_| Ok::<_, LogError>(()))
            .unwrap_err();
        assert_eq!(err, LogError::InvalidVersion(Version::new(2)));

        let err = log
            .scan(Version::EMPTY_LOG, false, |_| Ok::<_, LogError>(()))
            .unwrap_err();
        assert_eq!(err, LogError::InvalidVersion(Version::EMPTY_LOG));
    }

    #[test]
    fn scan_aborts_on_callback_error() {
        let log = InMemoryEventLog::new();
        log.append(raw("put", "a")).unwrap();
        log.append(raw("put", "b")).unwrap();

        let mut count = 0;
        let err = log
            .scan(Version::new(1), false, |_| {
                count += 1;
                Err(LogError::Connectivity("stop".to_string()))
            })
            .unwrap_err();
        assert_eq!(count, 1);
        assert_eq!(err, LogError::Connectivity("stop".to_string()));
    }

    #[test]
    fn try_append_accepts_at_matching_head() {
        let log = InMemoryEventLog::new();
        let version = log
            .try_append(
                Version::EMPTY_LOG,
                || Ok::<_, LogError>(raw("put", "a")),
                || panic!("no conflict expected"),
            )
            .unwrap();
        assert_eq!(version, Version::new(1));
    }

    #[test]
    fn try_append_resolves_conflicts_through_callback() {
        let log = InMemoryEventLog::new();
        log.append(raw("put", "a")).unwrap();

        let mut conflicts = 0;
        let version = log
            .try_append(
                Version::EMPTY_LOG,
                || Ok::<_, LogError>(raw("take", "b")),
                || {
                    conflicts += 1;
                    log.initial_version()
                },
            )
            .unwrap();

        assert_eq!(conflicts, 1);
        assert_eq!(version, Version::new(2));
    }

    #[test]
    fn try_append_aborts_cleanly_when_build_fails() {
        let log = InMemoryEventLog::new();
        let err = log
            .try_append(
                Version::EMPTY_LOG,
                || Err(LogError::Connectivity("domain abort".to_string())),
                || panic!("no conflict expected"),
            )
            .unwrap_err();
        assert_eq!(err, LogError::Connectivity("domain abort".to_string()));
        assert_eq!(log.initial_version().unwrap(), Version::EMPTY_LOG);
    }

    #[test]
    fn listen_delivers_versions_until_cancelled() {
        let log = Arc::new(InMemoryEventLog::new());
        let cancel = CancelToken::new();

        let (tx, rx) = mpsc::channel();
        let listener = {
            let log = log.clone();
            let cancel = cancel.clone();
            thread::spawn(move || {
                log.listen(&cancel, |version| {
                    let _ = tx.send(version);
                })
            })
        };

        log.append(raw("put", "a")).unwrap();
        assert_eq!(
            rx.recv_timeout(Duration::from_secs(1)).unwrap(),
            Version::new(1)
        );

        cancel.cancel();
        assert!(listener.join().unwrap().is_ok());
    }

    #[test]
    fn follow_scan_delivers_later_appends() {
        let log = Arc::new(InMemoryEventLog::new());
        log.append(raw("put", "a")).unwrap();

        let scanner = {
            let log = log.clone();
            thread::spawn(move || {
                let mut seen = Vec::new();
                let result = log.scan(Version::new(1), true, |logged| {
                    seen.push(logged.version);
                    if seen.len() == 2 {
                        // Enough; abort the follow through the callback.
                        return Err(LogError::Connectivity("done".to_string()));
                    }
                    Ok(())
                });
                (seen, result)
            })
        };

        // The scanner drains the first event, then blocks for this one.
        thread::sleep(Duration::from_millis(50));
        log.append(raw("put", "b")).unwrap();

        let (seen, result) = scanner.join().unwrap();
        assert_eq!(seen, vec![Version::new(1), Version::new(2)]);
        assert_eq!(result, Err(LogError::Connectivity("done".to_string())));
    }
}
