//! Site identifier type.
//!
//! Every document is owned by exactly one site. [`SiteId`] is the opaque key
//! the store uses to scope reads and writes to that site.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// An opaque site identifier.
///
/// Site identifiers are assigned by the store when a site is created and are
/// stable for the life of the site.
///
/// # Examples
///
/// ```
/// use folio_persistence::tenant::SiteId;
///
/// let site = SiteId::new(3);
/// assert_eq!(site.get(), 3);
/// assert_eq!(site.to_string(), "3");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteId(i64);

impl SiteId {
    /// Creates a site ID from its raw value.
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SiteId({})", self.0)
    }
}

impl FromStr for SiteId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(SiteId)
    }
}

impl From<i64> for SiteId {
    fn from(id: i64) -> Self {
        SiteId(id)
    }
}
