//! Consistency levels.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of replica acknowledgements required before an operation completes.
///
/// The client passes the level through opaquely; the store enforces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ConsistencyLevel {
    /// Any node, including a hinted handoff, for writes.
    Any,
    /// One replica.
    #[default]
    One,
    /// Two replicas.
    Two,
    /// Three replicas.
    Three,
    /// A majority of replicas.
    Quorum,
    /// A majority of replicas in the local data center.
    LocalQuorum,
    /// A majority of replicas in every data center.
    EachQuorum,
    /// Every replica.
    All,
}

impl ConsistencyLevel {
    /// Returns the numeric code used on the wire.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            ConsistencyLevel::One => 1,
            ConsistencyLevel::Quorum => 2,
            ConsistencyLevel::LocalQuorum => 3,
            ConsistencyLevel::EachQuorum => 4,
            ConsistencyLevel::All => 5,
            ConsistencyLevel::Any => 6,
            ConsistencyLevel::Two => 7,
            ConsistencyLevel::Three => 8,
        }
    }

    /// Parses a wire code.
    #[must_use]
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(ConsistencyLevel::One),
            2 => Some(ConsistencyLevel::Quorum),
            3 => Some(ConsistencyLevel::LocalQuorum),
            4 => Some(ConsistencyLevel::EachQuorum),
            5 => Some(ConsistencyLevel::All),
            6 => Some(ConsistencyLevel::Any),
            7 => Some(ConsistencyLevel::Two),
            8 => Some(ConsistencyLevel::Three),
            _ => None,
        }
    }
}

impl fmt::Display for ConsistencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsistencyLevel::Any => write!(f, "ANY"),
            ConsistencyLevel::One => write!(f, "ONE"),
            ConsistencyLevel::Two => write!(f, "TWO"),
            ConsistencyLevel::Three => write!(f, "THREE"),
            ConsistencyLevel::Quorum => write!(f, "QUORUM"),
            ConsistencyLevel::LocalQuorum => write!(f, "LOCAL_QUORUM"),
            ConsistencyLevel::EachQuorum => write!(f, "EACH_QUORUM"),
            ConsistencyLevel::All => write!(f, "ALL"),
        }
    }
}
