use std::{fmt, str::FromStr};

use serde_with::{DeserializeFromStr, SerializeDisplay};

use crate::{
    domain::{Direction, Version},
    error::RequestError,
};

/// Opaque page boundary marker. Round-trips exactly to the version it was made from.
///
/// # Examples
///
/// ```
/// # use ledger_movements::prelude::*;
/// let cursor: Cursor = "383074".parse().unwrap();
/// assert_eq!(cursor.version(), Version(383074));
/// assert_eq!(cursor.to_string(), "383074");
/// assert!("0x1f".parse::<Cursor>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, SerializeDisplay, DeserializeFromStr)]
pub struct Cursor(Version);

impl Cursor {
    pub fn version(&self) -> Version {
        self.0
    }
}

impl From<Version> for Cursor {
    fn from(version: Version) -> Self {
        Self(version)
    }
}

impl FromStr for Cursor {
    type Err = RequestError;

    /// Only plain base-10 digits are accepted; no sign, whitespace or radix prefix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(RequestError::InvalidCursor(s.to_string()));
        }
        s.parse::<u64>()
            .map(|v| Self(Version(v)))
            .map_err(|_| RequestError::InvalidCursor(s.to_string()))
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Fixed edge of a page on the version axis, as an index into the sorted versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// First index of an ascending page.
    Start(usize),
    /// One past the last index of a descending page.
    End(usize),
}

/// Locates the page anchor for `cursor` in O(log n).
///
/// ASC bisects right (first version strictly greater than the cursor) and DESC bisects
/// left (first version at or above the cursor), so the boundary element is never
/// emitted twice and never skipped.
pub fn resolve(versions: &[Version], direction: Direction, cursor: Option<Cursor>) -> Anchor {
    match (direction, cursor) {
        (Direction::Asc, None) => Anchor::Start(0),
        (Direction::Asc, Some(c)) => Anchor::Start(versions.partition_point(|&v| v <= c.version())),
        (Direction::Desc, None) => Anchor::End(versions.len()),
        (Direction::Desc, Some(c)) => Anchor::End(versions.partition_point(|&v| v < c.version())),
    }
}
