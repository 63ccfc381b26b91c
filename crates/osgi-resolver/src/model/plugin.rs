//! Plugins (bundles) and fragments.

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexSet;
use osgi_core::{ManifestEntry, NamedElement, Version};

use super::{label, CapabilityId, FeatureId, OsgiElement, PackageId, PluginId, ProblemLog};

/// Progress of the transitive closure computation for one plugin
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ClosureState {
    #[default]
    Unvisited,
    /// Being accumulated; cycle detection is not final yet
    Open,
    /// Complete and immutable
    Closed(IndexSet<PluginId>),
}

/// A registered bundle
#[derive(Debug, Clone)]
pub struct Plugin {
    pub(crate) name: String,
    pub(crate) version: Version,
    pub(crate) version_text: String,
    pub(crate) path: Utf8PathBuf,
    pub(crate) fragment: bool,

    // manifest input
    pub(crate) host_entry: Option<ManifestEntry>,
    pub(crate) required_plugin_entries: Vec<ManifestEntry>,
    pub(crate) imported_package_entries: Vec<ManifestEntry>,
    pub(crate) exported_package_entries: Vec<ManifestEntry>,
    pub(crate) required_capability_entries: Vec<ManifestEntry>,
    pub(crate) provided_capability_entries: Vec<ManifestEntry>,
    pub(crate) bundle_classpath: Vec<String>,

    // registration-time edges
    pub(crate) exported_packages: IndexSet<PackageId>,
    pub(crate) provided_capabilities: IndexSet<CapabilityId>,
    pub(crate) required_capabilities: IndexSet<CapabilityId>,

    // resolution edges
    pub(crate) osgi: OsgiElement,
    pub(crate) host: Option<PluginId>,
    pub(crate) fragments: IndexSet<PluginId>,
    pub(crate) required_by: IndexSet<PluginId>,
    pub(crate) reexported_plugins: IndexSet<PluginId>,
    pub(crate) reexported_by: IndexSet<PluginId>,
    pub(crate) required_by_features: IndexSet<FeatureId>,
    pub(crate) imported_packages: IndexSet<PackageId>,
    pub(crate) reexported_packages: IndexSet<PackageId>,
    pub(crate) recursive: ClosureState,

    pub(crate) log: ProblemLog,
}

impl Plugin {
    pub(crate) fn new(name: String, version: Version, version_text: String, path: Utf8PathBuf) -> Self {
        Self {
            name,
            version,
            version_text,
            path,
            fragment: false,
            host_entry: None,
            required_plugin_entries: Vec::new(),
            imported_package_entries: Vec::new(),
            exported_package_entries: Vec::new(),
            required_capability_entries: Vec::new(),
            provided_capability_entries: Vec::new(),
            bundle_classpath: Vec::new(),
            exported_packages: IndexSet::new(),
            provided_capabilities: IndexSet::new(),
            required_capabilities: IndexSet::new(),
            osgi: OsgiElement::default(),
            host: None,
            fragments: IndexSet::new(),
            required_by: IndexSet::new(),
            reexported_plugins: IndexSet::new(),
            reexported_by: IndexSet::new(),
            required_by_features: IndexSet::new(),
            imported_packages: IndexSet::new(),
            reexported_packages: IndexSet::new(),
            recursive: ClosureState::Unvisited,
            log: ProblemLog::default(),
        }
    }

    /// Drop everything a resolution pass derives; manifest input and
    /// registration-time edges stay.
    pub(crate) fn reset_resolution(&mut self) {
        self.osgi.clear();
        self.host = None;
        self.fragments.clear();
        self.required_by.clear();
        self.reexported_plugins.clear();
        self.reexported_by.clear();
        self.required_by_features.clear();
        self.imported_packages.clear();
        self.reexported_packages.clear();
        self.recursive = ClosureState::Unvisited;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Version as declared in the manifest
    pub fn version_text(&self) -> &str {
        &self.version_text
    }

    /// Bundle location (jar file or project directory)
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn is_fragment(&self) -> bool {
        self.fragment
    }

    pub fn host_entry(&self) -> Option<&ManifestEntry> {
        self.host_entry.as_ref()
    }

    /// Host bound during resolution
    pub fn host(&self) -> Option<PluginId> {
        self.host
    }

    pub fn fragments(&self) -> &IndexSet<PluginId> {
        &self.fragments
    }

    pub fn required_plugin_entries(&self) -> &[ManifestEntry] {
        &self.required_plugin_entries
    }

    pub fn imported_package_entries(&self) -> &[ManifestEntry] {
        &self.imported_package_entries
    }

    pub fn exported_package_entries(&self) -> &[ManifestEntry] {
        &self.exported_package_entries
    }

    pub fn required_capability_entries(&self) -> &[ManifestEntry] {
        &self.required_capability_entries
    }

    pub fn provided_capability_entries(&self) -> &[ManifestEntry] {
        &self.provided_capability_entries
    }

    pub fn bundle_classpath(&self) -> &[String] {
        &self.bundle_classpath
    }

    /// Plugins resolved from Require-Bundle, in declaration order
    pub fn required_plugins(&self) -> &IndexSet<PluginId> {
        &self.osgi.resolved_plugins
    }

    pub fn required_by(&self) -> &IndexSet<PluginId> {
        &self.required_by
    }

    /// Required plugins declared with `visibility:=reexport`
    pub fn reexported_plugins(&self) -> &IndexSet<PluginId> {
        &self.reexported_plugins
    }

    /// Plugins requiring this one with `visibility:=reexport`
    pub fn reexported_by(&self) -> &IndexSet<PluginId> {
        &self.reexported_by
    }

    pub fn included_in_features(&self) -> &IndexSet<FeatureId> {
        &self.osgi.included_in_features
    }

    pub fn required_by_features(&self) -> &IndexSet<FeatureId> {
        &self.required_by_features
    }

    pub fn imported_packages(&self) -> &IndexSet<PackageId> {
        &self.imported_packages
    }

    pub fn exported_packages(&self) -> &IndexSet<PackageId> {
        &self.exported_packages
    }

    /// Packages made visible to requirers through re-exported plugins
    pub fn reexported_packages(&self) -> &IndexSet<PackageId> {
        &self.reexported_packages
    }

    pub fn required_capabilities(&self) -> &IndexSet<CapabilityId> {
        &self.required_capabilities
    }

    pub fn provided_capabilities(&self) -> &IndexSet<CapabilityId> {
        &self.provided_capabilities
    }

    pub fn closure_state(&self) -> &ClosureState {
        &self.recursive
    }

    pub fn is_recursive_resolved(&self) -> bool {
        matches!(self.recursive, ClosureState::Closed(_))
    }

    /// Transitive closure; `None` until the closure is computed
    pub fn recursive_resolved_plugins(&self) -> Option<&IndexSet<PluginId>> {
        match &self.recursive {
            ClosureState::Closed(plugins) => Some(plugins),
            _ => None,
        }
    }

    /// True if the manifest exports a package of that name with `split`
    pub fn exports_split(&self, package: &str) -> bool {
        self.exported_package_entries
            .iter()
            .any(|entry| entry.name() == package && entry.is_split())
    }

    pub fn log(&self) -> &ProblemLog {
        &self.log
    }

    pub fn label(&self) -> String {
        label(&self.name, &self.version_text)
    }
}

impl NamedElement for Plugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        &self.version_text
    }
}

/// Fragments and their hosts are distinct nodes even with equal name and version
impl PartialEq for Plugin {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.version == other.version
            && self.fragment == other.fragment
            && self.host_entry.as_ref().map(ManifestEntry::name)
                == other.host_entry.as_ref().map(ManifestEntry::name)
    }
}

impl Eq for Plugin {}
