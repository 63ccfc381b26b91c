//! Structured input handed over by the manifest/feature reading layer.
//!
//! Header fields hold the raw manifest header values; the registry turns them
//! into [`ManifestEntry`] lists.

use camino::Utf8PathBuf;
use osgi_core::types::ManifestError;
use osgi_core::ManifestEntry;
use serde::{Deserialize, Serialize};

/// One bundle as read from its MANIFEST.MF
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct PluginDescriptor {
    pub name: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Utf8PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fragment_host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub require_bundle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub import_package: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dynamic_import_package: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_package: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub require_capability: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provide_capability: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bundle_classpath: Vec<String>,
}

impl PluginDescriptor {
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            ..Self::default()
        }
    }

    pub fn with_path(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn fragment_host(mut self, header: &str) -> Self {
        self.fragment_host = Some(header.to_string());
        self
    }

    pub fn require_bundle(mut self, header: &str) -> Self {
        self.require_bundle = Some(header.to_string());
        self
    }

    pub fn import_package(mut self, header: &str) -> Self {
        self.import_package = Some(header.to_string());
        self
    }

    pub fn dynamic_import_package(mut self, header: &str) -> Self {
        self.dynamic_import_package = Some(header.to_string());
        self
    }

    pub fn export_package(mut self, header: &str) -> Self {
        self.export_package = Some(header.to_string());
        self
    }

    pub fn require_capability(mut self, header: &str) -> Self {
        self.require_capability = Some(header.to_string());
        self
    }

    pub fn provide_capability(mut self, header: &str) -> Self {
        self.provide_capability = Some(header.to_string());
        self
    }

    pub fn bundle_classpath(mut self, entries: &[&str]) -> Self {
        self.bundle_classpath = entries.iter().map(|e| e.to_string()).collect();
        self
    }
}

/// Kind of a feature.xml `<plugin>`/`<includes>`/`<import>` reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureEntryKind {
    Plugin,
    Feature,
}

/// One plugin or feature reference of a feature descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FeatureEntry {
    pub kind: FeatureEntryKind,
    pub id: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub optional: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ws: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,
}

impl FeatureEntry {
    pub fn plugin(id: &str, version: &str) -> Self {
        Self {
            kind: FeatureEntryKind::Plugin,
            id: id.to_string(),
            version: version.to_string(),
            optional: false,
            os: None,
            ws: None,
            arch: None,
        }
    }

    pub fn feature(id: &str, version: &str) -> Self {
        Self {
            kind: FeatureEntryKind::Feature,
            ..Self::plugin(id, version)
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn for_platform(mut self, os: Option<&str>, ws: Option<&str>, arch: Option<&str>) -> Self {
        self.os = os.map(str::to_string);
        self.ws = ws.map(str::to_string);
        self.arch = arch.map(str::to_string);
        self
    }

    /// `(&(osgi.os=..)(osgi.ws=..)(osgi.arch=..))` for platform-specific entries
    pub fn platform_filter(&self) -> Option<String> {
        let terms: Vec<String> = [
            ("osgi.os", &self.os),
            ("osgi.ws", &self.ws),
            ("osgi.arch", &self.arch),
        ]
        .iter()
        .filter_map(|(key, value)| value.as_ref().map(|v| format!("({}={})", key, v)))
        .collect();

        match terms.len() {
            0 => None,
            1 => terms.into_iter().next(),
            _ => Some(format!("(&{})", terms.concat())),
        }
    }

    pub fn to_manifest_entry(&self) -> Result<ManifestEntry, ManifestError> {
        let mut entry = ManifestEntry::new(&self.id, &self.version)?;
        if self.optional {
            entry = entry.optional();
        }
        if let Some(filter) = self.platform_filter() {
            entry = entry.with_platform_filter(&filter);
        }
        Ok(entry)
    }
}

/// One feature as read from its feature.xml
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct FeatureDescriptor {
    pub name: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Utf8PathBuf>,
    pub includes: Vec<FeatureEntry>,
    pub requires: Vec<FeatureEntry>,
}

impl FeatureDescriptor {
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            ..Self::default()
        }
    }

    pub fn with_path(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn include(mut self, entry: FeatureEntry) -> Self {
        self.includes.push(entry);
        self
    }

    pub fn require(mut self, entry: FeatureEntry) -> Self {
        self.requires.push(entry);
        self
    }
}
