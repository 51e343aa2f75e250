//! Object identifiers.
//!
//! OIDs are stored in their dotted textual form without a leading dot.
//! Table indices (the part of a response OID after the column OID) are
//! plain strings such as `"3"` or `"1.4.192.168.0.1"` and are compared
//! component by component with [`cmp_index`].

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValueError;

static OID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(0|[1-9][0-9]*)(\.(0|[1-9][0-9]*))*$").expect("valid OID pattern")
});

/// A dotted numeric object identifier.
///
/// Sub-identifiers are canonical (no leading zeros) and fit in 32 bits, so
/// two OIDs are equal exactly when their components are.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Oid(String);

impl Oid {
    /// Parse and validate a dotted OID. A leading dot is accepted.
    pub fn parse(s: &str) -> Result<Self, ValueError> {
        let trimmed = s.trim();
        let stripped = trimmed.strip_prefix('.').unwrap_or(trimmed);
        let canonical = OID_PATTERN.is_match(stripped)
            && stripped.split('.').all(|p| p.parse::<u32>().is_ok());
        if !canonical {
            return Err(ValueError::InvalidOid(s.to_string()));
        }
        Ok(Oid(stripped.to_string()))
    }

    /// Dotted form without leading dot.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric components.
    pub fn components(&self) -> Vec<u64> {
        parse_components(&self.0)
    }

    /// Append an index (`"3"`, `"1.2"`) to this OID.
    pub fn append_index(&self, index: &str) -> Result<Oid, ValueError> {
        let index = index.trim_matches('.');
        if index.is_empty() {
            return Ok(self.clone());
        }
        Oid::parse(&format!("{}.{}", self.0, index))
    }

    /// Whether `prefix` is a component-wise prefix of (or equal to) this OID.
    pub fn starts_with(&self, prefix: &Oid) -> bool {
        self.0 == prefix.0
            || (self.0.starts_with(&prefix.0)
                && self.0.as_bytes().get(prefix.0.len()) == Some(&b'.'))
    }

    /// The index following `prefix`, if this OID lies strictly below it.
    pub fn index_after(&self, prefix: &Oid) -> Option<&str> {
        if self.0.len() > prefix.0.len() && self.starts_with(prefix) {
            Some(&self.0[prefix.0.len() + 1..])
        } else {
            None
        }
    }

    /// Numeric comparison of two OIDs, component by component.
    pub fn cmp_index(&self, other: &Oid) -> Ordering {
        cmp_index(&self.0, &other.0)
    }
}

fn parse_components(s: &str) -> Vec<u64> {
    s.split('.')
        .filter(|p| !p.is_empty())
        .map(|p| p.parse::<u64>().unwrap_or(u64::MAX))
        .collect()
}

/// Compare two dotted indices numerically per component.
///
/// Shorter indices sort before longer ones sharing the same prefix.
pub fn cmp_index(a: &str, b: &str) -> Ordering {
    let left = parse_components(a);
    let right = parse_components(b);
    left.cmp(&right)
}

impl FromStr for Oid {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Oid::parse(s)
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Oid({})", self.0)
    }
}

impl PartialOrd for Oid {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Oid {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_index(other)
    }
}

impl Serialize for Oid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Oid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Oid::parse(&s).map_err(serde::de::Error::custom)
    }
}
