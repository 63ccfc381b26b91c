//! Capability requirement filters.
//!
//! This is deliberately not an LDAP evaluator. Only simple `(key=value)`
//! assertions are extracted and compared against the attributes a capability
//! provider declares; every other operator is accepted as matching.

use indexmap::IndexMap;
use std::fmt;

/// Filter attached to a required capability
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Filter {
    text: String,
}

impl Filter {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.trim().to_string(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Simple equality assertions found in the filter text
    pub fn assertions(&self) -> Vec<(&str, &str)> {
        self.text
            .split(['(', ')'])
            .filter_map(|term| {
                let (key, value) = term.split_once('=')?;
                // `>=`, `<=` and `~=` are not equality assertions
                if key.ends_with(['>', '<', '~']) || key.trim().is_empty() {
                    return None;
                }
                Some((key.trim(), value.trim()))
            })
            .collect()
    }

    /// Crude check against a provider's declared attributes.
    ///
    /// An assertion only fails when the provider declares the attribute with a
    /// different value; `*` in the asserted value matches any run of text.
    pub fn is_matching(&self, attributes: &IndexMap<String, String>) -> bool {
        self.assertions().into_iter().all(|(key, expected)| {
            match attributes.get(key) {
                Some(actual) => wildcard_match(expected, actual),
                None => true,
            }
        })
    }
}

fn wildcard_match(pattern: &str, value: &str) -> bool {
    if !pattern.contains('*') {
        return pattern == value;
    }
    let mut rest = value;
    let parts: Vec<&str> = pattern.split('*').collect();
    for (index, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        if index == 0 {
            match rest.strip_prefix(part) {
                Some(stripped) => rest = stripped,
                None => return false,
            }
        } else if index == parts.len() - 1 {
            return rest.ends_with(part);
        } else {
            match rest.find(part) {
                Some(position) => rest = &rest[position + part.len()..],
                None => return false,
            }
        }
    }
    true
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attributes(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_assertions() {
        let filter = Filter::new("(&(osgi.extender=osgi.component)(version>=1.3)(!(x=y)))");
        assert_eq!(
            filter.assertions(),
            vec![("osgi.extender", "osgi.component"), ("x", "y")]
        );
    }

    #[test]
    fn test_matching_against_attributes() {
        let filter = Filter::new("(&(osgi.extender=osgi.component)(version>=1.3))");
        assert!(filter.is_matching(&attributes(&[("osgi.extender", "osgi.component")])));
        assert!(!filter.is_matching(&attributes(&[("osgi.extender", "osgi.cdi")])));
        assert!(filter.is_matching(&attributes(&[])));
        assert!(Filter::default().is_matching(&attributes(&[("a", "b")])));
    }

    #[test]
    fn test_wildcards() {
        assert!(wildcard_match("Java*", "JavaSE"));
        assert!(wildcard_match("*SE", "JavaSE"));
        assert!(wildcard_match("J*a*E", "JavaSE"));
        assert!(!wildcard_match("Jakarta*", "JavaSE"));
    }
}
