//! Features: named groupings of plugins and other features.

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexSet;
use osgi_core::{ManifestEntry, NamedElement, Version};

use super::{label, FeatureId, OsgiElement, PluginId, ProblemLog};

#[derive(Debug, Clone)]
pub struct Feature {
    pub(crate) name: String,
    pub(crate) version: Version,
    pub(crate) version_text: String,
    pub(crate) path: Utf8PathBuf,

    pub(crate) included_plugin_entries: Vec<ManifestEntry>,
    pub(crate) included_feature_entries: Vec<ManifestEntry>,
    pub(crate) required_plugin_entries: Vec<ManifestEntry>,
    pub(crate) required_feature_entries: Vec<ManifestEntry>,

    /// resolved_plugins holds included and required plugins
    pub(crate) osgi: OsgiElement,
    pub(crate) included_plugins: IndexSet<PluginId>,
    pub(crate) required_plugins: IndexSet<PluginId>,
    pub(crate) included_features: IndexSet<FeatureId>,
    pub(crate) required_features: IndexSet<FeatureId>,
    pub(crate) required_by_features: IndexSet<FeatureId>,
    pub(crate) recursive_features: Option<IndexSet<FeatureId>>,
    pub(crate) recursive_plugins: Option<IndexSet<PluginId>>,

    pub(crate) log: ProblemLog,
}

impl Feature {
    pub(crate) fn new(name: String, version: Version, version_text: String, path: Utf8PathBuf) -> Self {
        Self {
            name,
            version,
            version_text,
            path,
            included_plugin_entries: Vec::new(),
            included_feature_entries: Vec::new(),
            required_plugin_entries: Vec::new(),
            required_feature_entries: Vec::new(),
            osgi: OsgiElement::default(),
            included_plugins: IndexSet::new(),
            required_plugins: IndexSet::new(),
            included_features: IndexSet::new(),
            required_features: IndexSet::new(),
            required_by_features: IndexSet::new(),
            recursive_features: None,
            recursive_plugins: None,
            log: ProblemLog::default(),
        }
    }

    pub(crate) fn reset_resolution(&mut self) {
        self.osgi.clear();
        self.included_plugins.clear();
        self.required_plugins.clear();
        self.included_features.clear();
        self.required_features.clear();
        self.required_by_features.clear();
        self.recursive_features = None;
        self.recursive_plugins = None;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn included_plugin_entries(&self) -> &[ManifestEntry] {
        &self.included_plugin_entries
    }

    pub fn included_feature_entries(&self) -> &[ManifestEntry] {
        &self.included_feature_entries
    }

    pub fn required_plugin_entries(&self) -> &[ManifestEntry] {
        &self.required_plugin_entries
    }

    pub fn required_feature_entries(&self) -> &[ManifestEntry] {
        &self.required_feature_entries
    }

    /// Included and required plugins
    pub fn resolved_plugins(&self) -> &IndexSet<PluginId> {
        &self.osgi.resolved_plugins
    }

    pub fn included_plugins(&self) -> &IndexSet<PluginId> {
        &self.included_plugins
    }

    pub fn required_plugins(&self) -> &IndexSet<PluginId> {
        &self.required_plugins
    }

    pub fn included_features(&self) -> &IndexSet<FeatureId> {
        &self.included_features
    }

    pub fn required_features(&self) -> &IndexSet<FeatureId> {
        &self.required_features
    }

    pub fn included_in_features(&self) -> &IndexSet<FeatureId> {
        &self.osgi.included_in_features
    }

    pub fn required_by_features(&self) -> &IndexSet<FeatureId> {
        &self.required_by_features
    }

    /// Transitively included or required features; `None` before resolution
    pub fn recursive_features(&self) -> Option<&IndexSet<FeatureId>> {
        self.recursive_features.as_ref()
    }

    /// Plugins of this feature and of all its transitive features
    pub fn recursive_plugins(&self) -> Option<&IndexSet<PluginId>> {
        self.recursive_plugins.as_ref()
    }

    pub fn log(&self) -> &ProblemLog {
        &self.log
    }

    pub fn label(&self) -> String {
        label(&self.name, &self.version_text)
    }
}

impl NamedElement for Feature {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        &self.version_text
    }
}

impl PartialEq for Feature {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.version == other.version
    }
}

impl Eq for Feature {}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature(version: &str, path: &str) -> Feature {
        Feature::new(
            "org.acme.feature".to_string(),
            Version::parse(version).unwrap(),
            version.to_string(),
            Utf8PathBuf::from(path),
        )
    }

    #[test]
    fn test_identity_ignores_path() {
        assert_eq!(feature("1.0.0", "/a"), feature("1.0.0", "/b"));
        assert_ne!(feature("1.0.0", "/a"), feature("1.0.1", "/a"));
        assert_eq!(feature("1.0.0", "/a").label(), "org.acme.feature 1.0.0");
    }

    #[test]
    fn test_reset_clears_resolution_state() {
        let mut feature = feature("1.0.0", "/a");
        feature.included_plugins.insert(PluginId(0));
        feature.required_features.insert(FeatureId(1));
        feature.recursive_plugins = Some(IndexSet::from([PluginId(0)]));

        feature.reset_resolution();

        assert!(feature.included_plugins().is_empty());
        assert!(feature.required_features().is_empty());
        assert!(feature.recursive_plugins().is_none());
    }
}
