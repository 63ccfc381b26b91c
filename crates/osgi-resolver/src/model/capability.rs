//! Generic provided and required capabilities.

use indexmap::{IndexMap, IndexSet};
use osgi_core::{Filter, NamedElement, Version};

use super::{label, CapabilityId, PluginId, ProblemLog};

/// Which side of the contract a capability instance represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapabilityRole {
    Provided,
    /// One instance per Require-Capability clause
    Required,
}

#[derive(Debug, Clone)]
pub struct Capability {
    pub(crate) name: String,
    pub(crate) version: Version,
    pub(crate) version_text: String,
    pub(crate) role: CapabilityRole,
    pub(crate) optional: bool,
    pub(crate) filter: Option<Filter>,
    pub(crate) attributes: IndexMap<String, String>,
    /// Provided: declaring plugins. Required: plugins of the resolved provider.
    pub(crate) provided_by: IndexSet<PluginId>,
    /// Provided: plugins resolved against it. Required: the declaring plugin.
    pub(crate) required_by: IndexSet<PluginId>,
    pub(crate) resolved_to: Option<CapabilityId>,
    pub(crate) log: ProblemLog,
}

impl Capability {
    pub(crate) fn provided(name: String, version: Version, version_text: String) -> Self {
        Self {
            name,
            version,
            version_text,
            role: CapabilityRole::Provided,
            optional: false,
            filter: None,
            attributes: IndexMap::new(),
            provided_by: IndexSet::new(),
            required_by: IndexSet::new(),
            resolved_to: None,
            log: ProblemLog::default(),
        }
    }

    pub(crate) fn required(name: String, filter: Option<Filter>, optional: bool) -> Self {
        Self {
            role: CapabilityRole::Required,
            optional,
            filter,
            ..Self::provided(name, Version::zero(), String::new())
        }
    }

    pub(crate) fn reset_resolution(&mut self) {
        self.resolved_to = None;
        match self.role {
            CapabilityRole::Provided => self.required_by.clear(),
            CapabilityRole::Required => self.provided_by.clear(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    pub fn role(&self) -> CapabilityRole {
        self.role
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn filter(&self) -> Option<&Filter> {
        self.filter.as_ref()
    }

    pub fn attributes(&self) -> &IndexMap<String, String> {
        &self.attributes
    }

    pub fn provided_by(&self) -> &IndexSet<PluginId> {
        &self.provided_by
    }

    pub fn required_by(&self) -> &IndexSet<PluginId> {
        &self.required_by
    }

    /// Provided capability a requirement was bound to
    pub fn resolved_to(&self) -> Option<CapabilityId> {
        self.resolved_to
    }

    /// Name equality plus the simplified filter check
    pub fn is_satisfied_by(&self, provided: &Capability) -> bool {
        self.name == provided.name
            && self
                .filter
                .as_ref()
                .map_or(true, |filter| filter.is_matching(&provided.attributes))
    }

    pub fn log(&self) -> &ProblemLog {
        &self.log
    }

    pub fn label(&self) -> String {
        match &self.filter {
            Some(filter) if !filter.is_empty() => format!("{} {}", self.name, filter),
            _ => label(&self.name, &self.version_text),
        }
    }
}

impl NamedElement for Capability {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        &self.version_text
    }
}

impl PartialEq for Capability {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.version == other.version
    }
}

impl Eq for Capability {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requirement_satisfied_by_name_and_filter() {
        let mut provided = Capability::provided("osgi.extender".into(), Version::new(1, 3, 0), "1.3".into());
        provided
            .attributes
            .insert("osgi.extender".into(), "osgi.component".into());

        let plain = Capability::required("osgi.extender".into(), None, false);
        assert!(plain.is_satisfied_by(&provided));

        let filtered = Capability::required(
            "osgi.extender".into(),
            Some(Filter::new("(osgi.extender=osgi.cdi)")),
            false,
        );
        assert!(!filtered.is_satisfied_by(&provided));

        let other = Capability::required("osgi.service".into(), None, false);
        assert!(!other.is_satisfied_by(&provided));
    }

    #[test]
    fn test_label_prefers_filter() {
        let required = Capability::required(
            "osgi.ee".into(),
            Some(Filter::new("(osgi.ee=JavaSE)")),
            true,
        );
        assert_eq!(required.label(), "osgi.ee (osgi.ee=JavaSE)");
        assert!(required.is_optional());
    }
}
