//! Stop identity
//!
//! Stops are keyed by a [`StopId`] everywhere in the stack. The id is
//! backed by the stop's name, so it is stable across runs, hashable and
//! totally ordered. Ordering is what keeps traversal and synchronisation
//! deterministic.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::error::StopError;

/// Identifier of a stop in the network
///
/// A stop must have a name; constructing an id from an empty or
/// whitespace-only name fails with [`StopError::NoName`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StopId(String);

impl StopId {
    /// Create a new stop id from a name
    ///
    /// Surrounding whitespace is trimmed before validation.
    pub fn new(name: impl Into<String>) -> Result<Self, StopError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(StopError::NoName);
        }
        if trimmed.len() == name.len() {
            Ok(Self(name))
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }

    /// Get the stop's name
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl Display for StopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StopId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for StopId {
    type Error = StopError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for StopId {
    type Error = StopError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<StopId> for String {
    fn from(id: StopId) -> Self {
        id.0
    }
}

/// Integer grid coordinates of a stop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    /// Create a position from its coordinates
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(i32, i32)> for Position {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}
