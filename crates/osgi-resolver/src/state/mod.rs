//! The platform registry.
//!
//! [`PlatformState`] owns every plugin, package, feature and capability of one
//! run. It is constructed empty, populated from descriptors, resolved once and
//! then read by classpath writers and reporters.

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::{IndexMap, IndexSet};
use osgi_core::types::HeaderKind;
use osgi_core::utils::normalize_path;
use osgi_core::{ManifestEntry, OsgiError, OsgiResult, Version};
use tracing::{debug, info};

use crate::closure;
use crate::descriptor::{FeatureDescriptor, FeatureEntryKind, PluginDescriptor};
use crate::model::{
    Capability, CapabilityId, CapabilityRole, ElementId, Feature, FeatureId, Package, PackageId,
    Plugin, PluginId, Problem, ProblemKind, ProblemLog, JRE_SYSTEM_LIBRARY,
};
use crate::resolver::DependencyResolver;

/// Package prefixes served by the runtime when no plugin exports them
pub const DEFAULT_PLATFORM_PACKAGES: &[&str] = &[
    "java.", "javax.", "org.w3c.", "org.xml.", "org.ietf.", "sun.", "com.sun.", "jdk.",
];

/// Binary output location of source plugins, relative to the plugin
pub const DEFAULT_OUTPUT_DIR: &str = "target/classes";

/// Knobs accepted by a resolution run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverOptions {
    /// Plugin or feature names whose cycles are reported as warnings
    pub ignored_cycles: IndexSet<String>,
    /// Substitute for the `${dummy.version}` sentinel
    pub dummy_version: Option<String>,
    pub platform_packages: Vec<String>,
    pub output_dir: Utf8PathBuf,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            ignored_cycles: IndexSet::new(),
            dummy_version: None,
            platform_packages: DEFAULT_PLATFORM_PACKAGES
                .iter()
                .map(|prefix| prefix.to_string())
                .collect(),
            output_dir: Utf8PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

impl ResolverOptions {
    pub fn ignore_cycles_of(mut self, name: &str) -> Self {
        self.ignored_cycles.insert(name.to_string());
        self
    }

    pub fn with_dummy_version(mut self, version: &str) -> Self {
        self.dummy_version = Some(version.to_string());
        self
    }

    pub fn is_cycle_ignored(&self, name: &str) -> bool {
        self.ignored_cycles.contains(name)
    }

    /// True if the runtime itself supplies the package
    pub fn is_platform_package(&self, name: &str) -> bool {
        self.platform_packages
            .iter()
            .any(|prefix| name.starts_with(prefix.as_str()))
    }
}

/// Registry of all elements of one platform
#[derive(Debug, Clone, Default)]
pub struct PlatformState {
    options: ResolverOptions,
    pub(crate) plugins: Vec<Plugin>,
    pub(crate) packages: Vec<Package>,
    pub(crate) features: Vec<Feature>,
    pub(crate) capabilities: Vec<Capability>,
    plugin_index: IndexMap<String, Vec<PluginId>>,
    package_index: IndexMap<String, Vec<PackageId>>,
    feature_index: IndexMap<String, Vec<FeatureId>>,
    /// Provided capabilities only; requirements are reached through their plugin
    capability_index: IndexMap<String, Vec<CapabilityId>>,
    /// Problems found while registering; they survive a new resolution pass
    registration_problems: Vec<Problem>,
    resolved: bool,
}

impl PlatformState {
    pub fn new(options: ResolverOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// Names whose dependency cycles are downgraded to warnings
    pub fn ignored_cycles(&self) -> &IndexSet<String> {
        &self.options.ignored_cycles
    }

    pub fn set_ignored_cycles<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.ignored_cycles = names.into_iter().map(Into::into).collect();
    }

    /// Register a plugin.
    ///
    /// Registering the same name, version and location twice returns the
    /// existing handle; the same name and version at another location is a
    /// separate plugin.
    pub fn add_plugin(&mut self, descriptor: &PluginDescriptor) -> OsgiResult<PluginId> {
        let name = descriptor.name.trim();
        if name.is_empty() {
            return Err(OsgiError::invalid_input("plugin", "name must not be empty"));
        }
        let version = Version::parse(&descriptor.version)?;
        let path = descriptor
            .path
            .as_deref()
            .map(normalize_path)
            .unwrap_or_default();

        if let Some(existing) = self.plugins_named(name).iter().copied().find(|id| {
            let plugin = &self.plugins[id.0];
            plugin.version == version && plugin.path == path
        }) {
            debug!("Plugin {} {} already registered", name, version);
            return Ok(existing);
        }

        let label = format!("{} {}", name, descriptor.version);
        let parse = |kind: HeaderKind, header: &Option<String>| -> OsgiResult<Vec<ManifestEntry>> {
            let Some(header) = header.as_deref() else {
                return Ok(Vec::new());
            };
            let entries = ManifestEntry::parse_header(kind, header).map_err(|source| {
                OsgiError::ManifestParse {
                    element: label.clone(),
                    source,
                }
            })?;
            Ok(entries
                .iter()
                .map(|entry| entry.with_dummy_version(self.options.dummy_version.as_deref()))
                .collect())
        };

        let hosts = parse(HeaderKind::FragmentHost, &descriptor.fragment_host)?;
        let required_plugins = parse(HeaderKind::RequireBundle, &descriptor.require_bundle)?;
        let mut imports = parse(HeaderKind::ImportPackage, &descriptor.import_package)?;
        imports.extend(parse(
            HeaderKind::DynamicImport,
            &descriptor.dynamic_import_package,
        )?);
        let exports = parse(HeaderKind::ExportPackage, &descriptor.export_package)?;
        let required_capabilities =
            parse(HeaderKind::RequireCapability, &descriptor.require_capability)?;
        let provided_capabilities =
            parse(HeaderKind::ProvideCapability, &descriptor.provide_capability)?;

        // export versions are points, reject them before anything is registered
        let export_versions = exports
            .iter()
            .map(|entry| Version::parse(entry.version()))
            .collect::<Result<Vec<_>, _>>()?;
        let provided_versions = provided_capabilities
            .iter()
            .map(|entry| Version::parse(entry.version()))
            .collect::<Result<Vec<_>, _>>()?;

        let id = PluginId(self.plugins.len());
        let mut plugin = Plugin::new(
            name.to_string(),
            version,
            descriptor.version.trim().to_string(),
            path,
        );
        plugin.fragment = !hosts.is_empty();
        if hosts.len() > 1 {
            let names: Vec<&str> = hosts.iter().map(ManifestEntry::name).collect();
            let problem = Problem::error(
                ProblemKind::StructuralError,
                format!(
                    "fragment {} declares more than one host: {}",
                    plugin.label(),
                    names.join(", ")
                ),
                id.into(),
            );
            plugin.log.add(problem.clone());
            self.registration_problems.push(problem);
        } else {
            plugin.host_entry = hosts.into_iter().next();
        }
        plugin.required_plugin_entries = required_plugins;
        plugin.imported_package_entries = imports;
        plugin.bundle_classpath = descriptor.bundle_classpath.clone();
        self.plugins.push(plugin);
        self.plugin_index.entry(name.to_string()).or_default().push(id);

        for (entry, version) in exports.iter().zip(export_versions) {
            let package = self.intern_package(entry.name(), version, entry.version());
            self.packages[package.0].exported_by.insert(id);
            self.plugins[id.0].exported_packages.insert(package);
        }
        for (entry, version) in provided_capabilities.iter().zip(provided_versions) {
            let capability = self.intern_provided_capability(entry, version);
            self.capabilities[capability.0].provided_by.insert(id);
            self.plugins[id.0].provided_capabilities.insert(capability);
        }
        for entry in &required_capabilities {
            let filter = entry.filter().map(osgi_core::Filter::new);
            let mut capability =
                Capability::required(entry.name().to_string(), filter, entry.is_lenient());
            capability.attributes = entry.attributes().extra.clone();
            capability.required_by.insert(id);
            let capability_id = CapabilityId(self.capabilities.len());
            self.capabilities.push(capability);
            self.plugins[id.0].required_capabilities.insert(capability_id);
        }

        let plugin = &mut self.plugins[id.0];
        plugin.exported_package_entries = exports;
        plugin.required_capability_entries = required_capabilities;
        plugin.provided_capability_entries = provided_capabilities;

        self.resolved = false;
        debug!("Registered plugin {}", self.plugins[id.0].label());
        Ok(id)
    }

    /// Register a feature; duplicates behave as for [`add_plugin`](Self::add_plugin)
    pub fn add_feature(&mut self, descriptor: &FeatureDescriptor) -> OsgiResult<FeatureId> {
        let name = descriptor.name.trim();
        if name.is_empty() {
            return Err(OsgiError::invalid_input("feature", "name must not be empty"));
        }
        let version = Version::parse(&descriptor.version)?;
        let path = descriptor
            .path
            .as_deref()
            .map(normalize_path)
            .unwrap_or_default();

        if let Some(existing) = self.features_named(name).iter().copied().find(|id| {
            let feature = &self.features[id.0];
            feature.version == version && feature.path == path
        }) {
            return Ok(existing);
        }

        let mut feature = Feature::new(
            name.to_string(),
            version,
            descriptor.version.trim().to_string(),
            path,
        );
        let dummy = self.options.dummy_version.as_deref();
        let convert = |entry: &crate::descriptor::FeatureEntry| {
            entry
                .to_manifest_entry()
                .map(|manifest| manifest.with_dummy_version(dummy))
                .map_err(|source| OsgiError::ManifestParse {
                    element: format!("feature {}", name),
                    source,
                })
        };
        for entry in &descriptor.includes {
            let manifest = convert(entry)?;
            match entry.kind {
                FeatureEntryKind::Plugin => feature.included_plugin_entries.push(manifest),
                FeatureEntryKind::Feature => feature.included_feature_entries.push(manifest),
            }
        }
        for entry in &descriptor.requires {
            let manifest = convert(entry)?;
            match entry.kind {
                FeatureEntryKind::Plugin => feature.required_plugin_entries.push(manifest),
                FeatureEntryKind::Feature => feature.required_feature_entries.push(manifest),
            }
        }

        let id = FeatureId(self.features.len());
        self.features.push(feature);
        self.feature_index.entry(name.to_string()).or_default().push(id);
        self.resolved = false;
        debug!("Registered feature {} {}", name, descriptor.version);
        Ok(id)
    }

    fn intern_package(&mut self, name: &str, version: Version, version_text: &str) -> PackageId {
        if let Some(existing) = self
            .packages_named(name)
            .iter()
            .copied()
            .find(|id| self.packages[id.0].version == version && !self.packages[id.0].platform_library)
        {
            return existing;
        }
        let id = PackageId(self.packages.len());
        self.packages.push(Package::new(
            name.to_string(),
            version,
            version_text.trim().to_string(),
        ));
        self.package_index.entry(name.to_string()).or_default().push(id);
        id
    }

    /// Synthetic package backed by the runtime, created on first use
    pub(crate) fn platform_library_package(&mut self, name: &str) -> PackageId {
        if let Some(existing) = self
            .packages_named(name)
            .iter()
            .copied()
            .find(|id| self.packages[id.0].platform_library)
        {
            return existing;
        }
        let id = PackageId(self.packages.len());
        self.packages.push(Package::platform_library(name.to_string()));
        self.package_index.entry(name.to_string()).or_default().push(id);
        debug!("Package {} is supplied by the platform", name);
        id
    }

    fn intern_provided_capability(&mut self, entry: &ManifestEntry, version: Version) -> CapabilityId {
        let existing = self.capability_index.get(entry.name()).and_then(|ids| {
            ids.iter()
                .copied()
                .find(|id| self.capabilities[id.0].version == version)
        });
        let id = match existing {
            Some(id) => id,
            None => {
                let id = CapabilityId(self.capabilities.len());
                self.capabilities.push(Capability::provided(
                    entry.name().to_string(),
                    version,
                    entry.version().trim().to_string(),
                ));
                self.capability_index
                    .entry(entry.name().to_string())
                    .or_default()
                    .push(id);
                id
            },
        };
        let capability = &mut self.capabilities[id.0];
        for (key, value) in &entry.attributes().extra {
            capability.attributes.insert(key.clone(), value.clone());
        }
        if !entry.version().is_empty() {
            capability
                .attributes
                .insert("version".to_string(), entry.version().to_string());
        }
        id
    }

    /// Attach every direct requirement of every plugin and feature.
    ///
    /// Derived sets and logs are rebuilt from scratch, so running this twice
    /// yields the same state and a changed ignore-list takes effect.
    pub fn resolve_dependencies(&mut self) {
        info!(
            "Resolving {} plugins, {} packages and {} features",
            self.plugins.len(),
            self.packages.len(),
            self.features.len()
        );
        self.reset_resolution();
        DependencyResolver::new(self).resolve_all();
        self.resolved = true;
    }

    /// Resolve direct requirements, then compute every transitive closure and
    /// report dependency cycles.
    pub fn compute_all_dependencies_recursive(&mut self) {
        self.resolve_dependencies();
        closure::compute_plugin_closures(self);
        closure::compute_feature_closures(self);
        info!(
            "Resolution finished with {} errors and {} warnings",
            self.error_count(),
            self.warning_count()
        );
    }

    fn reset_resolution(&mut self) {
        self.plugins.iter_mut().for_each(Plugin::reset_resolution);
        self.packages.iter_mut().for_each(Package::reset_resolution);
        self.features.iter_mut().for_each(Feature::reset_resolution);
        self.capabilities
            .iter_mut()
            .for_each(Capability::reset_resolution);

        self.plugins.iter_mut().for_each(|plugin| plugin.log.clear());
        self.packages.iter_mut().for_each(|package| package.log.clear());
        self.features.iter_mut().for_each(|feature| feature.log.clear());
        self.capabilities
            .iter_mut()
            .for_each(|capability| capability.log.clear());
        for problem in self.registration_problems.clone() {
            self.report(problem);
        }
        self.resolved = false;
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    pub(crate) fn log_mut(&mut self, owner: ElementId) -> &mut ProblemLog {
        match owner {
            ElementId::Plugin(id) => &mut self.plugins[id.0].log,
            ElementId::Package(id) => &mut self.packages[id.0].log,
            ElementId::Feature(id) => &mut self.features[id.0].log,
            ElementId::Capability(id) => &mut self.capabilities[id.0].log,
        }
    }

    /// Record a problem on its owner's log
    pub(crate) fn report(&mut self, problem: Problem) {
        let owner = problem.owner();
        self.log_mut(owner).add(problem);
    }

    // Element access. Handles are only minted by this registry, so indexing
    // with them cannot go out of bounds.

    pub fn plugin(&self, id: PluginId) -> &Plugin {
        &self.plugins[id.0]
    }

    pub fn package(&self, id: PackageId) -> &Package {
        &self.packages[id.0]
    }

    pub fn feature(&self, id: FeatureId) -> &Feature {
        &self.features[id.0]
    }

    pub fn capability(&self, id: CapabilityId) -> &Capability {
        &self.capabilities[id.0]
    }

    pub fn plugins(&self) -> impl Iterator<Item = (PluginId, &Plugin)> {
        self.plugins.iter().enumerate().map(|(i, p)| (PluginId(i), p))
    }

    pub fn packages(&self) -> impl Iterator<Item = (PackageId, &Package)> {
        self.packages.iter().enumerate().map(|(i, p)| (PackageId(i), p))
    }

    pub fn features(&self) -> impl Iterator<Item = (FeatureId, &Feature)> {
        self.features.iter().enumerate().map(|(i, f)| (FeatureId(i), f))
    }

    pub fn capabilities(&self) -> impl Iterator<Item = (CapabilityId, &Capability)> {
        self.capabilities
            .iter()
            .enumerate()
            .map(|(i, c)| (CapabilityId(i), c))
    }

    pub fn plugin_count(&self) -> usize {
        self.plugins.len()
    }

    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    pub fn plugins_named(&self, name: &str) -> &[PluginId] {
        self.plugin_index.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn packages_named(&self, name: &str) -> &[PackageId] {
        self.package_index.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn features_named(&self, name: &str) -> &[FeatureId] {
        self.feature_index.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Provided capabilities with that name
    pub fn capabilities_named(&self, name: &str) -> &[CapabilityId] {
        self.capability_index
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Plugin with that name and version; an empty version picks the highest
    pub fn find_plugin(&self, name: &str, version: &str) -> Option<PluginId> {
        let candidates = self.plugins_named(name);
        if version.trim().is_empty() {
            return candidates
                .iter()
                .copied()
                .reduce(|best, id| {
                    if self.plugins[id.0].version > self.plugins[best.0].version {
                        id
                    } else {
                        best
                    }
                });
        }
        let version = Version::parse(version).ok()?;
        candidates
            .iter()
            .copied()
            .find(|id| self.plugins[id.0].version == version)
    }

    /// Like [`find_plugin`](Self::find_plugin) but fails for unknown plugins
    pub fn require_plugin(&self, name: &str, version: &str) -> OsgiResult<PluginId> {
        self.find_plugin(name, version)
            .ok_or_else(|| OsgiError::UnknownElement {
                kind: "plugin",
                name: if version.trim().is_empty() {
                    name.to_string()
                } else {
                    format!("{} {}", name, version)
                },
            })
    }

    /// Plugins requiring this one, importing one of its packages or
    /// attached to it as fragments
    pub fn dependents_of(&self, id: PluginId) -> IndexSet<PluginId> {
        let plugin = &self.plugins[id.0];
        let mut dependents: IndexSet<PluginId> = plugin.required_by.iter().copied().collect();
        for package in &plugin.exported_packages {
            dependents.extend(self.packages[package.0].imported_by.iter().copied());
        }
        dependents.extend(plugin.fragments.iter().copied());
        dependents.shift_remove(&id);
        dependents
    }

    pub fn importers_of(&self, id: PackageId) -> &IndexSet<PluginId> {
        &self.packages[id.0].imported_by
    }

    pub fn log_of(&self, id: ElementId) -> &ProblemLog {
        match id {
            ElementId::Plugin(id) => &self.plugins[id.0].log,
            ElementId::Package(id) => &self.packages[id.0].log,
            ElementId::Feature(id) => &self.features[id.0].log,
            ElementId::Capability(id) => &self.capabilities[id.0].log,
        }
    }

    /// Every recorded problem, plugins first
    pub fn problems(&self) -> impl Iterator<Item = &Problem> {
        self.plugins
            .iter()
            .flat_map(|p| p.log.iter())
            .chain(self.packages.iter().flat_map(|p| p.log.iter()))
            .chain(self.features.iter().flat_map(|f| f.log.iter()))
            .chain(self.capabilities.iter().flat_map(|c| c.log.iter()))
    }

    pub fn error_count(&self) -> usize {
        self.problems().filter(|p| p.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.problems().filter(|p| !p.is_error()).count()
    }

    pub fn has_errors(&self) -> bool {
        self.problems().any(Problem::is_error)
    }

    /// `name version` of any element, for rendering related elements
    pub fn element_name(&self, id: ElementId) -> String {
        match id {
            ElementId::Plugin(id) => self.plugins[id.0].label(),
            ElementId::Package(id) => self.packages[id.0].label(),
            ElementId::Feature(id) => self.features[id.0].label(),
            ElementId::Capability(id) => self.capabilities[id.0].label(),
        }
    }

    /// Exporters of a package; packages supplied by the runtime report the
    /// JRE system library
    pub fn exporter_names(&self, id: PackageId) -> Vec<String> {
        let package = &self.packages[id.0];
        if package.platform_library {
            return vec![JRE_SYSTEM_LIBRARY.to_string()];
        }
        package
            .exported_by
            .iter()
            .map(|exporter| self.plugins[exporter.0].label())
            .collect()
    }

    pub fn plugin_location(&self, id: PluginId) -> &Utf8Path {
        self.plugins[id.0].path()
    }

    pub(crate) fn required_capability_ids(&self) -> Vec<CapabilityId> {
        self.capabilities()
            .filter(|(_, c)| c.role() == CapabilityRole::Required)
            .map(|(id, _)| id)
            .collect()
    }
}
