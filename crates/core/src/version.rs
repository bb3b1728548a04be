//! Log position / optimistic-concurrency token.

use core::fmt;
use core::num::ParseIntError;
use core::str::FromStr;

/// Position the event log assigns to each accepted event.
///
/// A `Version` is three things at once: the event's place in the total
/// order, the projection's replay cursor, and the token a conditional
/// append is checked against. It is opaque to everything but the log:
/// consumers only store it, compare it, and hand it back.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version(u64);

impl Version {
    /// Sentinel the log reports when it holds no events yet.
    pub const EMPTY_LOG: Version = Version(0);

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Whether this is the empty-log sentinel.
    pub fn is_empty_log(&self) -> bool {
        self.0 == 0
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for Version {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versions_are_totally_ordered() {
        assert!(Version::new(1) < Version::new(2));
        assert!(Version::EMPTY_LOG < Version::new(1));
        assert_eq!(Version::new(3), Version::new(3));
    }

    #[test]
    fn sentinel_marks_empty_log() {
        assert!(Version::EMPTY_LOG.is_empty_log());
        assert!(!Version::new(1).is_empty_log());
    }

    #[test]
    fn round_trips_through_strings() {
        let v = Version::new(42);
        let parsed: Version = v.to_string().parse().unwrap();
        assert_eq!(parsed, v);
    }

    #[test]
    fn rejects_garbage() {
        assert!("not-a-version".parse::<Version>().is_err());
    }
}
