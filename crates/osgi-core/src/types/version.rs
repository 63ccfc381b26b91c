//! OSGi version and version range types.
//!
//! Versions follow the `major.minor.micro.qualifier` scheme. Missing numeric
//! components default to zero and the qualifier is compared lexicographically
//! after the numeric parts. Ranges use interval notation (`[1.0,2.0)`).

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// OSGi version (major.minor.micro.qualifier)
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub micro: u64,
    pub qualifier: String,
}

/// Version interval with bracket-sensitive bounds
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionRange {
    pub floor: Version,
    pub floor_inclusive: bool,
    pub ceiling: Version,
    pub ceiling_inclusive: bool,
}

/// Version parsing and validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    #[error("Invalid version format: {input}")]
    InvalidFormat { input: String },

    #[error("Invalid number in version '{input}': {component}")]
    InvalidNumber { input: String, component: String },

    #[error("Invalid qualifier in version '{input}': {qualifier}")]
    InvalidQualifier { input: String, qualifier: String },

    #[error("Invalid version range: {input}")]
    InvalidRange { input: String },
}

impl Version {
    /// Create a new version without qualifier
    pub fn new(major: u64, minor: u64, micro: u64) -> Self {
        Self {
            major,
            minor,
            micro,
            qualifier: String::new(),
        }
    }

    /// The lowest possible version, `0.0.0`
    pub fn zero() -> Self {
        Self::default()
    }

    /// Attach a qualifier
    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = qualifier.into();
        self
    }

    /// Parse a version string; empty input is `0.0.0`
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        input.parse()
    }

    /// True if `input` is a well-formed point version
    pub fn is_valid(input: &str) -> bool {
        Self::parse(input).is_ok()
    }
}

fn parse_component(input: &str, component: &str) -> Result<u64, VersionError> {
    if component.is_empty() || !component.bytes().all(|b| b.is_ascii_digit()) {
        return Err(VersionError::InvalidNumber {
            input: input.to_string(),
            component: component.to_string(),
        });
    }
    component.parse().map_err(|_| VersionError::InvalidNumber {
        input: input.to_string(),
        component: component.to_string(),
    })
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        if input.is_empty() {
            return Ok(Version::zero());
        }

        let mut parts = input.splitn(4, '.');
        let major = match parts.next() {
            Some(major) => parse_component(input, major)?,
            None => {
                return Err(VersionError::InvalidFormat {
                    input: input.to_string(),
                })
            },
        };
        let minor = parts
            .next()
            .map(|minor| parse_component(input, minor))
            .transpose()?
            .unwrap_or(0);
        let micro = parts
            .next()
            .map(|micro| parse_component(input, micro))
            .transpose()?
            .unwrap_or(0);

        let qualifier = parts.next();
        if let Some(qualifier) = qualifier {
            let valid = !qualifier.is_empty()
                && qualifier
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
            if !valid {
                return Err(VersionError::InvalidQualifier {
                    input: input.to_string(),
                    qualifier: qualifier.to_string(),
                });
            }
        }

        Ok(Version {
            major,
            minor,
            micro,
            qualifier: qualifier.unwrap_or_default().to_string(),
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.micro)?;
        if !self.qualifier.is_empty() {
            write!(f, ".{}", self.qualifier)?;
        }
        Ok(())
    }
}

impl TryFrom<String> for Version {
    type Error = VersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.to_string()
    }
}

impl VersionRange {
    /// Parse an interval such as `[1.0,2.0)` or `(1.2.3,2]`
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        input.parse()
    }

    /// True if `input` is written in interval notation and both bounds parse
    pub fn is_range(input: &str) -> bool {
        Self::parse(input).is_ok()
    }

    /// Test membership honouring inclusive/exclusive bounds
    pub fn contains(&self, version: &Version) -> bool {
        let above_floor = match version.cmp(&self.floor) {
            Ordering::Greater => true,
            Ordering::Equal => self.floor_inclusive,
            Ordering::Less => false,
        };
        let below_ceiling = match version.cmp(&self.ceiling) {
            Ordering::Less => true,
            Ordering::Equal => self.ceiling_inclusive,
            Ordering::Greater => false,
        };
        above_floor && below_ceiling
    }
}

impl FromStr for VersionRange {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        let invalid = || VersionError::InvalidRange {
            input: input.to_string(),
        };

        let floor_inclusive = match input.chars().next() {
            Some('[') => true,
            Some('(') => false,
            _ => return Err(invalid()),
        };
        let ceiling_inclusive = match input.chars().last() {
            Some(']') => true,
            Some(')') => false,
            _ => return Err(invalid()),
        };
        if input.len() < 2 {
            return Err(invalid());
        }

        let inner = &input[1..input.len() - 1];
        let (floor, ceiling) = inner.split_once(',').ok_or_else(invalid)?;
        if floor.trim().is_empty() || ceiling.trim().is_empty() || ceiling.contains(',') {
            return Err(invalid());
        }

        Ok(VersionRange {
            floor: floor.parse().map_err(|_| invalid())?,
            floor_inclusive,
            ceiling: ceiling.parse().map_err(|_| invalid())?,
            ceiling_inclusive,
        })
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{},{}{}",
            if self.floor_inclusive { '[' } else { '(' },
            self.floor,
            self.ceiling,
            if self.ceiling_inclusive { ']' } else { ')' }
        )
    }
}

/// Compare two version strings; empty strings are `0.0.0`
pub fn compare_versions(a: &str, b: &str) -> Result<Ordering, VersionError> {
    Ok(Version::parse(a)?.cmp(&Version::parse(b)?))
}

/// Floor-or-range compatibility test.
///
/// `range_or_lower` is either an interval or a plain lower bound. `given` is
/// normally a point version; when it is itself an interval the two are only
/// compatible if they are textually identical, or if `range_or_lower` is not
/// an interval and `given` contains `0.0.0`. Intervals are never compared
/// algebraically.
pub fn is_compatible_version(range_or_lower: &str, given: &str) -> bool {
    let range_or_lower = range_or_lower.trim();
    let given = given.trim();

    let given_version = match Version::parse(given) {
        Ok(version) => version,
        Err(_) => {
            let Ok(given_range) = VersionRange::parse(given) else {
                return false;
            };
            if range_or_lower.is_empty() || !VersionRange::is_range(range_or_lower) {
                return given_range.contains(&Version::zero());
            }
            return range_or_lower == given;
        },
    };

    if range_or_lower.is_empty() {
        return true;
    }
    if range_or_lower.starts_with('[') || range_or_lower.starts_with('(') {
        return VersionRange::parse(range_or_lower)
            .map(|range| range.contains(&given_version))
            .unwrap_or(false);
    }
    Version::parse(range_or_lower)
        .map(|floor| floor <= given_version)
        .unwrap_or(false)
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn version_strategy() -> impl Strategy<Value = Version> {
        (0u64..20, 0u64..20, 0u64..20, prop::option::of("[a-z0-9_-]{1,6}")).prop_map(
            |(major, minor, micro, qualifier)| Version {
                major,
                minor,
                micro,
                qualifier: qualifier.unwrap_or_default(),
            },
        )
    }

    proptest! {
        #[test]
        fn version_round_trip(v in version_strategy()) {
            let parsed = Version::parse(&v.to_string()).unwrap();
            prop_assert_eq!(parsed, v);
        }

        #[test]
        fn compare_is_total_order(a in version_strategy(), b in version_strategy(), c in version_strategy()) {
            prop_assert_eq!(a.cmp(&a), Ordering::Equal);
            prop_assert_eq!(a.cmp(&b), b.cmp(&a).reverse());
            if a <= b && b <= c {
                prop_assert!(a <= c, "Transitivity violated: {} <= {} <= {}", a, b, c);
            }
        }

        #[test]
        fn floor_compatibility_matches_ordering(a in version_strategy(), b in version_strategy()) {
            let compatible = is_compatible_version(&a.to_string(), &b.to_string());
            prop_assert_eq!(compatible, a <= b);
        }

        #[test]
        fn inclusive_range_contains_its_bounds(a in version_strategy(), b in version_strategy()) {
            let (low, high) = if a <= b { (a, b) } else { (b, a) };
            let range = format!("[{},{}]", low, high);
            prop_assert!(is_compatible_version(&range, &low.to_string()));
            prop_assert!(is_compatible_version(&range, &high.to_string()));
        }
    }
}
