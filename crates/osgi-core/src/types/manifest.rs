//! Manifest requirement and export descriptors.
//!
//! A [`ManifestEntry`] is one parsed clause of a bundle manifest header such as
//! `Require-Bundle` or `Import-Package`: a name, a version-or-range string and
//! the attribute flags that influence resolution.

use indexmap::IndexMap;
use std::fmt;
use thiserror::Error;

use super::version::{is_compatible_version, Version, VersionRange};

/// Reserved version value standing in for a not yet released version
pub const DUMMY_VERSION_SENTINEL: &str = "${dummy.version}";

/// Manifest header a set of entries was parsed from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderKind {
    RequireBundle,
    FragmentHost,
    ImportPackage,
    DynamicImport,
    ExportPackage,
    RequireCapability,
    ProvideCapability,
}

impl HeaderKind {
    /// Attribute carrying the entry version for this header
    pub fn version_attribute(&self) -> &'static str {
        match self {
            HeaderKind::RequireBundle | HeaderKind::FragmentHost => "bundle-version",
            _ => "version",
        }
    }

    /// Canonical manifest header name
    pub fn header_name(&self) -> &'static str {
        match self {
            HeaderKind::RequireBundle => "Require-Bundle",
            HeaderKind::FragmentHost => "Fragment-Host",
            HeaderKind::ImportPackage => "Import-Package",
            HeaderKind::DynamicImport => "DynamicImport-Package",
            HeaderKind::ExportPackage => "Export-Package",
            HeaderKind::RequireCapability => "Require-Capability",
            HeaderKind::ProvideCapability => "Provide-Capability",
        }
    }
}

/// Manifest parsing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ManifestError {
    #[error("Manifest entry name must not be empty")]
    EmptyName,

    #[error("Malformed {header} clause '{clause}': {reason}")]
    MalformedClause {
        header: &'static str,
        clause: String,
        reason: String,
    },
}

/// Attribute flags attached to a manifest entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryAttributes {
    pub optional: bool,
    pub reexport: bool,
    pub dynamic_import: bool,
    pub split: bool,
    /// `bundle-version` on package entries (version of the exporting bundle)
    pub bundle_version: Option<String>,
    pub platform_filter: Option<String>,
    /// LDAP-style filter of a capability requirement
    pub filter: Option<String>,
    /// Every other attribute or directive, in declaration order
    pub extra: IndexMap<String, String>,
}

/// Immutable requirement/export descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    name: String,
    version: String,
    attributes: EntryAttributes,
}

/// Anything with a name and a version that an entry can be matched against
pub trait NamedElement {
    fn name(&self) -> &str;
    fn version(&self) -> &str;
}

impl ManifestEntry {
    /// Create an entry; the name is trimmed and must not be empty
    pub fn new(name: &str, version: &str) -> Result<Self, ManifestError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ManifestError::EmptyName);
        }
        Ok(Self {
            name: name.to_string(),
            version: version.trim().to_string(),
            attributes: EntryAttributes::default(),
        })
    }

    pub fn optional(mut self) -> Self {
        self.attributes.optional = true;
        self
    }

    pub fn reexport(mut self) -> Self {
        self.attributes.reexport = true;
        self
    }

    pub fn dynamic_import(mut self) -> Self {
        self.attributes.dynamic_import = true;
        self
    }

    pub fn split(mut self) -> Self {
        self.attributes.split = true;
        self
    }

    pub fn with_bundle_version(mut self, bundle_version: &str) -> Self {
        self.attributes.bundle_version = Some(bundle_version.trim().to_string());
        self
    }

    pub fn with_platform_filter(mut self, filter: &str) -> Self {
        self.attributes.platform_filter = Some(filter.trim().to_string());
        self
    }

    pub fn with_filter(mut self, filter: &str) -> Self {
        self.attributes.filter = Some(filter.trim().to_string());
        self
    }

    pub fn with_attribute(mut self, key: &str, value: &str) -> Self {
        self.attributes
            .extra
            .insert(key.trim().to_string(), value.trim().to_string());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Version or range string; empty means any version
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn attributes(&self) -> &EntryAttributes {
        &self.attributes
    }

    pub fn is_optional(&self) -> bool {
        self.attributes.optional
    }

    pub fn is_reexport(&self) -> bool {
        self.attributes.reexport
    }

    pub fn is_dynamic_import(&self) -> bool {
        self.attributes.dynamic_import
    }

    pub fn is_split(&self) -> bool {
        self.attributes.split
    }

    pub fn bundle_version(&self) -> Option<&str> {
        self.attributes.bundle_version.as_deref()
    }

    pub fn platform_filter(&self) -> Option<&str> {
        self.attributes.platform_filter.as_deref()
    }

    pub fn filter(&self) -> Option<&str> {
        self.attributes.filter.as_deref()
    }

    /// True if a missing target should only be reported as a warning
    pub fn is_lenient(&self) -> bool {
        self.attributes.optional || self.attributes.dynamic_import
    }

    /// Dynamic imports may name a whole package tree (`com.acme.*` or `*`)
    pub fn is_wildcard(&self) -> bool {
        self.name == "*" || self.name.ends_with(".*")
    }

    /// Replace the reserved sentinel in the version strings.
    ///
    /// Without a substitute the sentinel is dropped, which turns the entry into
    /// an "any version" requirement.
    pub fn with_dummy_version(&self, dummy: Option<&str>) -> Self {
        let substitute = |value: &str| {
            if value.trim() == DUMMY_VERSION_SENTINEL {
                dummy.unwrap_or("").to_string()
            } else {
                // inside an interval the bound must stay a version
                value.replace(DUMMY_VERSION_SENTINEL, dummy.unwrap_or("0.0.0"))
            }
        };
        let mut entry = self.clone();
        if entry.version.contains(DUMMY_VERSION_SENTINEL) {
            entry.version = substitute(&entry.version);
        }
        if let Some(bundle_version) = entry.attributes.bundle_version.as_mut() {
            if bundle_version.contains(DUMMY_VERSION_SENTINEL) {
                *bundle_version = substitute(bundle_version);
            }
        }
        entry
    }

    /// Version compatibility with the entry's version-or-range
    pub fn is_matching_version(&self, version: &str) -> bool {
        is_compatible_version(&self.version, version)
    }

    /// Name equality plus version compatibility
    pub fn matches(&self, name: &str, version: &str) -> bool {
        self.name == name && self.is_matching_version(version)
    }

    /// Plain requirement match against an element
    pub fn is_matching<E: NamedElement + ?Sized>(&self, element: &E) -> bool {
        self.matches(element.name(), element.version())
    }

    /// Strict match used by feature includes and fragment hosts.
    ///
    /// An empty or `0.0.0` version accepts any candidate, an interval must
    /// contain the candidate, and a point version must be equal to it.
    pub fn exact_match(&self, name: &str, version: &str) -> bool {
        if self.name != name {
            return false;
        }
        let Ok(candidate) = Version::parse(version) else {
            return false;
        };
        if self.version.is_empty() {
            return true;
        }
        if let Ok(range) = VersionRange::parse(&self.version) {
            return range.contains(&candidate);
        }
        match Version::parse(&self.version) {
            Ok(wanted) if wanted == Version::zero() => true,
            Ok(wanted) => wanted == candidate,
            Err(_) => false,
        }
    }

    /// Parse a complete manifest header into its entries
    pub fn parse_header(kind: HeaderKind, header: &str) -> Result<Vec<Self>, ManifestError> {
        let mut entries = Vec::new();
        for clause in split_outside_quotes(header, ',') {
            let clause = clause.trim();
            if clause.is_empty() {
                continue;
            }
            entries.extend(parse_clause(kind, clause)?);
        }
        Ok(entries)
    }
}

impl fmt::Display for ManifestEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.version.is_empty() {
            write!(f, " {}", self.version)?;
        }
        if self.attributes.optional {
            write!(f, " *optional*")?;
        }
        if self.attributes.dynamic_import {
            write!(f, " *dynamic*")?;
        }
        if self.attributes.reexport {
            write!(f, " *reexport*")?;
        }
        Ok(())
    }
}

fn parse_clause(kind: HeaderKind, clause: &str) -> Result<Vec<ManifestEntry>, ManifestError> {
    let malformed = |reason: &str| ManifestError::MalformedClause {
        header: kind.header_name(),
        clause: clause.to_string(),
        reason: reason.to_string(),
    };

    let mut names = Vec::new();
    let mut params = Vec::new();
    for part in split_outside_quotes(clause, ';') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        match part.split_once('=') {
            None if params.is_empty() => names.push(part),
            None => return Err(malformed("name after parameters")),
            Some((key, value)) => {
                let (key, directive) = match key.trim().strip_suffix(':') {
                    Some(key) => (key.trim(), true),
                    None => (key.trim(), false),
                };
                // typed attributes such as `version:Version=1.0`
                let key = key.split(':').next().unwrap_or(key).trim();
                if key.is_empty() {
                    return Err(malformed("empty parameter name"));
                }
                params.push((key.to_string(), unquote(value.trim()).to_string(), directive));
            },
        }
    }
    if names.is_empty() {
        return Err(malformed("missing name"));
    }

    let version_attribute = kind.version_attribute();
    let mut version = String::new();
    let mut attributes = EntryAttributes {
        dynamic_import: kind == HeaderKind::DynamicImport,
        ..EntryAttributes::default()
    };
    for (key, value, directive) in params {
        match (key.as_str(), directive) {
            (key, false) if key == version_attribute => version = value,
            ("bundle-version", false) => attributes.bundle_version = Some(value),
            ("resolution", true) => attributes.optional = value == "optional",
            ("visibility", true) => attributes.reexport = value == "reexport",
            ("mandatory", true) if value.split(',').any(|v| v.trim() == "split") => {
                attributes.split = true;
                attributes.extra.insert(key.clone(), value);
            },
            ("split", _) => attributes.split = value.eq_ignore_ascii_case("true"),
            ("filter", true) => attributes.filter = Some(value),
            ("platform-filter", _) => attributes.platform_filter = Some(value),
            _ => {
                attributes.extra.insert(key.clone(), value);
            },
        }
    }

    names
        .into_iter()
        .map(|name| {
            let mut entry = ManifestEntry::new(unquote(name), &version)?;
            entry.attributes = attributes.clone();
            Ok(entry)
        })
        .collect()
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

/// Split on `separator` while ignoring separators inside double quotes
fn split_outside_quotes(input: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (index, c) in input.char_indices() {
        if c == '"' {
            in_quotes = !in_quotes;
        } else if c == separator && !in_quotes {
            parts.push(&input[start..index]);
            start = index + c.len_utf8();
        }
    }
    parts.push(&input[start..]);
    parts
}
