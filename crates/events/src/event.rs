//! Typed domain events.

/// Wire label of a Put event.
pub const LABEL_PUT: &str = "put";
/// Wire label of a Take event.
pub const LABEL_TAKE: &str = "take";

/// A state-changing stock event.
///
/// Events are:
/// - **immutable** (appended once, never mutated)
/// - a **closed set**: anything else on the wire is rejected at decode time
///
/// The quantity is validated non-negative at the input edge; replay treats
/// whatever the log accepted as fact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StockEvent {
    /// `quantity` instances of `object` were put onto the pile.
    Put { object: String, quantity: i64 },
    /// `quantity` instances of `object` were taken from the pile.
    Take { object: String, quantity: i64 },
}

impl StockEvent {
    pub fn put(object: impl Into<String>, quantity: i64) -> Self {
        Self::Put {
            object: object.into(),
            quantity,
        }
    }

    pub fn take(object: impl Into<String>, quantity: i64) -> Self {
        Self::Take {
            object: object.into(),
            quantity,
        }
    }

    /// Stable wire label for this operation.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Put { .. } => LABEL_PUT,
            Self::Take { .. } => LABEL_TAKE,
        }
    }

    pub fn object(&self) -> &str {
        match self {
            Self::Put { object, .. } | Self::Take { object, .. } => object,
        }
    }

    pub fn quantity(&self) -> i64 {
        match self {
            Self::Put { quantity, .. } | Self::Take { quantity, .. } => *quantity,
        }
    }
}
