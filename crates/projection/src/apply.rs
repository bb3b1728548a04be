//! The single state-transition path every projection runs.

use stockpile_events::{StockEvent, codec};
use stockpile_log::LoggedEvent;
use stockpile_store::StoreTx;
use tracing::debug;

use crate::error::AggregateError;
use crate::state;

/// Next stored quantity after `event`, or `None` when the entry is removed.
///
/// Pure. Every service replaying the log runs this same function, which is
/// what lets independently-owned projections converge to the same state
/// without ever talking to each other.
pub fn next_quantity(current: i64, event: &StockEvent) -> Option<i64> {
    let next = match event {
        StockEvent::Put { quantity, .. } => current + quantity,
        StockEvent::Take { quantity, .. } => current - quantity,
    };
    (next >= 1).then_some(next)
}

/// Apply one logged event inside the caller's transaction, advancing the
/// version marker with it.
///
/// Decode, read, transition, write and marker update happen in the same
/// transaction, so a failed pass rolls back as a unit.
pub fn apply_event(tx: &mut dyn StoreTx, logged: &LoggedEvent) -> Result<(), AggregateError> {
    let event = codec::decode(&logged.event)?;
    let current = state::quantity(tx, event.object())?;

    match next_quantity(current, &event) {
        Some(next) => {
            debug!(
                version = %logged.version,
                object = event.object(),
                current,
                next,
                "applying event"
            );
            state::set_quantity(tx, event.object(), next)?;
        }
        None => {
            debug!(
                version = %logged.version,
                object = event.object(),
                "removing object"
            );
            state::delete_object(tx, event.object())?;
        }
    }
    state::set_version(tx, logged.version)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn put_adds_to_current() {
        assert_eq!(next_quantity(0, &StockEvent::put("apple", 5)), Some(5));
        assert_eq!(next_quantity(3, &StockEvent::put("apple", 2)), Some(5));
    }

    #[test]
    fn take_subtracts_from_current() {
        assert_eq!(next_quantity(5, &StockEvent::take("apple", 2)), Some(3));
    }

    #[test]
    fn reaching_zero_removes_the_entry() {
        assert_eq!(next_quantity(5, &StockEvent::take("apple", 5)), None);
        assert_eq!(next_quantity(2, &StockEvent::take("apple", 7)), None);
    }

    #[test]
    fn zero_quantity_put_on_absent_object_stays_absent() {
        assert_eq!(next_quantity(0, &StockEvent::put("apple", 0)), None);
    }

    /// Reference replay over a plain map, mirroring the absence ⇔ 0 rule.
    fn replay(events: &[StockEvent]) -> BTreeMap<String, i64> {
        let mut state = BTreeMap::new();
        for event in events {
            let current = state.get(event.object()).copied().unwrap_or(0);
            match next_quantity(current, event) {
                Some(next) => {
                    state.insert(event.object().to_string(), next);
                }
                None => {
                    state.remove(event.object());
                }
            }
        }
        state
    }

    fn arb_event() -> impl Strategy<Value = StockEvent> {
        (
            prop::sample::select(vec!["apple", "pear", "fig"]),
            0i64..10,
            prop::bool::ANY,
        )
            .prop_map(|(object, quantity, is_put)| {
                if is_put {
                    StockEvent::put(object, quantity)
                } else {
                    StockEvent::take(object, quantity)
                }
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: replaying a prefix and then the rest equals replaying
        /// everything at once; the transition has no hidden state.
        #[test]
        fn replay_is_composable(
            events in prop::collection::vec(arb_event(), 0..40),
            split in 0usize..40,
        ) {
            let split = split.min(events.len());

            let mut piecewise = replay(&events[..split]);
            for event in &events[split..] {
                let current = piecewise.get(event.object()).copied().unwrap_or(0);
                match next_quantity(current, event) {
                    Some(next) => {
                        piecewise.insert(event.object().to_string(), next);
                    }
                    None => {
                        piecewise.remove(event.object());
                    }
                }
            }

            prop_assert_eq!(piecewise, replay(&events));
        }

        /// Property: no retained entry ever holds a quantity below 1.
        #[test]
        fn retained_entries_stay_positive(
            events in prop::collection::vec(arb_event(), 0..60),
        ) {
            for quantity in replay(&events).values() {
                prop_assert!(*quantity >= 1);
            }
        }
    }
}
