//! Java packages exported and imported by plugins.

use indexmap::IndexSet;
use osgi_core::{NamedElement, Version};

use super::{label, PluginId, ProblemLog};

/// Exporter reported for packages supplied by the runtime itself
pub const JRE_SYSTEM_LIBRARY: &str = "JRE System Library";

/// A package; identity is name plus version
#[derive(Debug, Clone)]
pub struct Package {
    pub(crate) name: String,
    pub(crate) version: Version,
    pub(crate) version_text: String,
    pub(crate) platform_library: bool,
    pub(crate) exported_by: IndexSet<PluginId>,
    pub(crate) reexported_by: IndexSet<PluginId>,
    pub(crate) imported_by: IndexSet<PluginId>,
    pub(crate) log: ProblemLog,
}

impl Package {
    pub(crate) fn new(name: String, version: Version, version_text: String) -> Self {
        Self {
            name,
            version,
            version_text,
            platform_library: false,
            exported_by: IndexSet::new(),
            reexported_by: IndexSet::new(),
            imported_by: IndexSet::new(),
            log: ProblemLog::default(),
        }
    }

    pub(crate) fn platform_library(name: String) -> Self {
        Self {
            platform_library: true,
            ..Self::new(name, Version::zero(), String::new())
        }
    }

    pub(crate) fn reset_resolution(&mut self) {
        self.reexported_by.clear();
        self.imported_by.clear();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    pub fn version_text(&self) -> &str {
        &self.version_text
    }

    /// Supplied by the runtime rather than by a plugin
    pub fn is_platform_library(&self) -> bool {
        self.platform_library
    }

    pub fn exported_by(&self) -> &IndexSet<PluginId> {
        &self.exported_by
    }

    pub fn reexported_by(&self) -> &IndexSet<PluginId> {
        &self.reexported_by
    }

    pub fn imported_by(&self) -> &IndexSet<PluginId> {
        &self.imported_by
    }

    /// Plugins exporting or re-exporting this package
    pub fn providers(&self) -> impl Iterator<Item = PluginId> + '_ {
        self.exported_by
            .iter()
            .chain(self.reexported_by.iter())
            .copied()
    }

    pub fn log(&self) -> &ProblemLog {
        &self.log
    }

    pub fn label(&self) -> String {
        label(&self.name, &self.version_text)
    }
}

impl NamedElement for Package {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        &self.version_text
    }
}

impl PartialEq for Package {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.version == other.version
    }
}

impl Eq for Package {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_is_name_and_version() {
        let mut a = Package::new("org.acme".into(), Version::new(1, 0, 0), "1.0".into());
        let b = Package::new("org.acme".into(), Version::new(1, 0, 0), "1.0.0".into());
        a.exported_by.insert(PluginId(7));
        assert_eq!(a, b);
    }

    #[test]
    fn test_platform_library_package() {
        let p = Package::platform_library("javax.xml".into());
        assert!(p.is_platform_library());
        assert_eq!(p.version(), &Version::zero());
        assert_eq!(p.label(), "javax.xml");
    }

    #[test]
    fn test_providers_chain_exporters_and_reexporters() {
        let mut p = Package::new("org.acme".into(), Version::zero(), String::new());
        p.exported_by.insert(PluginId(1));
        p.reexported_by.insert(PluginId(2));
        assert_eq!(p.providers().collect::<Vec<_>>(), vec![PluginId(1), PluginId(2)]);
    }
}
