//! String matching shared by conditions, filters and switches.

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ClassError;

/// How a candidate value is compared against the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MatchMode {
    #[default]
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "!contains")]
    NotContains,
    #[serde(rename = "startsWith")]
    StartsWith,
    #[serde(rename = "!startsWith")]
    NotStartsWith,
    #[serde(rename = "regex")]
    Regex,
    #[serde(rename = "!regex")]
    NotRegex,
    #[serde(rename = "equals")]
    Equals,
    #[serde(rename = "!equals")]
    NotEquals,
}

impl MatchMode {
    /// Negated modes require every candidate to mismatch.
    pub fn is_negated(&self) -> bool {
        matches!(
            self,
            MatchMode::NotContains
                | MatchMode::NotStartsWith
                | MatchMode::NotRegex
                | MatchMode::NotEquals
        )
    }

    fn uses_regex(&self) -> bool {
        matches!(self, MatchMode::Regex | MatchMode::NotRegex)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMode::Contains => "contains",
            MatchMode::NotContains => "!contains",
            MatchMode::StartsWith => "startsWith",
            MatchMode::NotStartsWith => "!startsWith",
            MatchMode::Regex => "regex",
            MatchMode::NotRegex => "!regex",
            MatchMode::Equals => "equals",
            MatchMode::NotEquals => "!equals",
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A match mode with its candidate values, regexes compiled up front.
#[derive(Debug, Clone)]
pub struct StringMatcher {
    mode: MatchMode,
    values: Vec<String>,
    regexes: Vec<Regex>,
}

impl StringMatcher {
    /// Build a matcher. Regex candidates are compiled here.
    pub fn new(mode: MatchMode, values: Vec<String>) -> Result<Self, ClassError> {
        let regexes = if mode.uses_regex() {
            values.iter().map(|v| compile(v)).collect::<Result<_, _>>()?
        } else {
            Vec::new()
        };
        Ok(Self {
            mode,
            values,
            regexes,
        })
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Affirmative modes: any candidate matches. Negated: all mismatch.
    pub fn matches(&self, input: &str) -> bool {
        let hit = |i: usize| -> bool {
            let candidate = &self.values[i];
            match self.mode {
                MatchMode::Contains | MatchMode::NotContains => input.contains(candidate.as_str()),
                MatchMode::StartsWith | MatchMode::NotStartsWith => {
                    input.starts_with(candidate.as_str())
                }
                MatchMode::Regex | MatchMode::NotRegex => self.regexes[i].is_match(input),
                MatchMode::Equals | MatchMode::NotEquals => input == candidate,
            }
        };

        if self.mode.is_negated() {
            (0..self.values.len()).all(|i| !hit(i))
        } else {
            (0..self.values.len()).any(hit)
        }
    }
}

/// Compile a regex from a class file.
pub(crate) fn compile(pattern: &str) -> Result<Regex, ClassError> {
    Regex::new(pattern).map_err(|source| ClassError::InvalidRegex {
        pattern: pattern.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher(mode: MatchMode, values: &[&str]) -> StringMatcher {
        StringMatcher::new(mode, values.iter().map(|v| v.to_string()).collect()).unwrap()
    }

    #[test]
    fn test_affirmative_modes() {
        assert!(matcher(MatchMode::Contains, &["tik"]).matches("Mikrotik"));
        assert!(matcher(MatchMode::StartsWith, &["x", "1.3.6.1.4.1.14988"]).matches("1.3.6.1.4.1.14988.1"));
        assert!(matcher(MatchMode::Equals, &["CHR"]).matches("CHR"));
        assert!(!matcher(MatchMode::Equals, &["CHR"]).matches("CHR "));
        assert!(matcher(MatchMode::Regex, &["^RouterOS [A-Z]+$"]).matches("RouterOS CHR"));
    }

    #[test]
    fn test_negated_modes_require_all_mismatch() {
        let m = matcher(MatchMode::NotContains, &["Cisco", "Juniper"]);
        assert!(m.matches("Mikrotik"));
        assert!(!m.matches("Juniper Networks"));

        assert!(!matcher(MatchMode::NotEquals, &["a", "b"]).matches("b"));
        assert!(matcher(MatchMode::NotRegex, &["^eth"]).matches("lo"));
    }

    #[test]
    fn test_invalid_regex() {
        let err = StringMatcher::new(MatchMode::Regex, vec!["(".into()]).unwrap_err();
        assert!(matches!(err, ClassError::InvalidRegex { .. }));
        // non-regex modes never compile their values
        assert!(StringMatcher::new(MatchMode::Contains, vec!["(".into()]).is_ok());
    }

    #[test]
    fn test_mode_names() {
        let mode: MatchMode = serde_yaml::from_str("'!startsWith'").unwrap();
        assert_eq!(mode, MatchMode::NotStartsWith);
        assert_eq!(MatchMode::NotStartsWith.to_string(), "!startsWith");
    }
}
