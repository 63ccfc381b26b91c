//! Direct requirement resolution.
//!
//! Every requirement is matched against all registered candidates of the
//! right kind. Ambiguity is settled deterministically: the highest version
//! wins (the first registered one among equals) and a warning lists all
//! candidates. There is no backtracking.

use indexmap::IndexSet;
use osgi_core::{is_compatible_version, ManifestEntry, Version};
use tracing::debug;

use crate::closure::reexport_closure;
use crate::model::{
    CapabilityId, ElementId, FeatureId, PackageId, PluginId, Problem, ProblemKind,
};
use crate::state::PlatformState;

/// Resolution algorithms run against a borrowed [`PlatformState`]
pub struct DependencyResolver<'s> {
    state: &'s mut PlatformState,
}

impl<'s> DependencyResolver<'s> {
    pub fn new(state: &'s mut PlatformState) -> Self {
        Self { state }
    }

    /// One complete pass over every plugin and feature.
    ///
    /// Hosts are bound first because fragment exports count as exports of
    /// their host when re-exports are propagated.
    pub fn resolve_all(&mut self) {
        self.bind_fragment_hosts();
        self.resolve_required_plugins();
        self.propagate_reexports();
        self.resolve_imported_packages();
        self.resolve_capabilities();
        self.check_split_packages();
        self.resolve_features();
    }

    fn version_of(&self, id: ElementId) -> &Version {
        match id {
            ElementId::Plugin(id) => &self.state.plugins[id.0].version,
            ElementId::Package(id) => &self.state.packages[id.0].version,
            ElementId::Feature(id) => &self.state.features[id.0].version,
            ElementId::Capability(id) => &self.state.capabilities[id.0].version,
        }
    }

    /// Pick the highest version; ties go to the first candidate
    pub fn select_highest<K>(&self, candidates: &[K]) -> Option<K>
    where
        K: Copy + Into<ElementId>,
    {
        let mut best = *candidates.first()?;
        for &candidate in &candidates[1..] {
            if self.version_of(candidate.into()) > self.version_of(best.into()) {
                best = candidate;
            }
        }
        Some(best)
    }

    /// Report an empty or ambiguous search on `owner` and return the winner
    fn arbitrate<K>(
        &mut self,
        owner: ElementId,
        what: &str,
        requirement: &str,
        candidates: &[K],
        lenient: bool,
    ) -> Option<K>
    where
        K: Copy + Into<ElementId>,
    {
        match candidates {
            [] => {
                let message = format!("{} not found: {}", what, requirement);
                let problem = if lenient {
                    Problem::warning(ProblemKind::UnresolvedReference, message, owner)
                } else {
                    Problem::error(ProblemKind::UnresolvedReference, message, owner)
                };
                self.state.report(problem);
                None
            },
            [only] => Some(*only),
            _ => {
                let best = self.select_highest(candidates);
                let names: Vec<String> = candidates
                    .iter()
                    .map(|&c| self.state.element_name(c.into()))
                    .collect();
                self.state.report(
                    Problem::warning(
                        ProblemKind::AmbiguousReference,
                        format!(
                            "more than one {} found for {}: {}",
                            what,
                            requirement,
                            names.join(", ")
                        ),
                        owner,
                    )
                    .with_related(candidates.iter().map(|&c| c.into())),
                );
                best
            },
        }
    }

    fn plugin_candidates(&self, entry: &ManifestEntry, exact: bool) -> Vec<PluginId> {
        self.state
            .plugins_named(entry.name())
            .iter()
            .copied()
            .filter(|id| {
                let plugin = &self.state.plugins[id.0];
                !plugin.fragment
                    && if exact {
                        entry.exact_match(&plugin.name, &plugin.version_text)
                    } else {
                        entry.is_matching(plugin)
                    }
            })
            .collect()
    }

    fn feature_candidates(&self, entry: &ManifestEntry, exact: bool) -> Vec<FeatureId> {
        self.state
            .features_named(entry.name())
            .iter()
            .copied()
            .filter(|id| {
                let feature = &self.state.features[id.0];
                if exact {
                    entry.exact_match(&feature.name, &feature.version_text)
                } else {
                    entry.is_matching(feature)
                }
            })
            .collect()
    }

    /// Bind every fragment to its host, both directions
    pub fn bind_fragment_hosts(&mut self) {
        for index in 0..self.state.plugins.len() {
            let id = PluginId(index);
            let Some(entry) = self.state.plugins[index].host_entry.clone() else {
                continue;
            };
            let candidates = self.plugin_candidates(&entry, true);
            let host = self.arbitrate(
                id.into(),
                "host plugin",
                &entry.to_string(),
                &candidates,
                entry.is_optional(),
            );
            if let Some(host) = host {
                self.state.plugins[index].host = Some(host);
                self.state.plugins[host.0].fragments.insert(id);
            }
        }
    }

    pub fn resolve_required_plugins(&mut self) {
        for index in 0..self.state.plugins.len() {
            let id = PluginId(index);
            let entries = self.state.plugins[index].required_plugin_entries.clone();
            for entry in &entries {
                let candidates = self.plugin_candidates(entry, false);
                let Some(target) = self.arbitrate(
                    id.into(),
                    "plugin",
                    &entry.to_string(),
                    &candidates,
                    entry.is_lenient(),
                ) else {
                    continue;
                };

                let plugin = &mut self.state.plugins[index];
                plugin.osgi.resolved_plugins.insert(target);
                if entry.is_reexport() {
                    plugin.reexported_plugins.insert(target);
                }
                let required = &mut self.state.plugins[target.0];
                required.required_by.insert(id);
                if entry.is_reexport() {
                    required.reexported_by.insert(id);
                }
            }
        }
    }

    /// Record, for every plugin, the packages visible to its requirers
    /// through re-exported plugins
    pub fn propagate_reexports(&mut self) {
        for index in 0..self.state.plugins.len() {
            let id = PluginId(index);
            if self.state.plugins[index].reexported_plugins.is_empty() {
                continue;
            }
            let mut packages: IndexSet<PackageId> = IndexSet::new();
            for reexported in reexport_closure(self.state, [id]) {
                let plugin = &self.state.plugins[reexported.0];
                packages.extend(plugin.exported_packages.iter().copied());
                for fragment in &plugin.fragments {
                    packages.extend(self.state.plugins[fragment.0].exported_packages.iter().copied());
                }
            }
            let own = &self.state.plugins[index].exported_packages;
            packages.retain(|package| !own.contains(package));

            for package in &packages {
                self.state.packages[package.0].reexported_by.insert(id);
            }
            self.state.plugins[index].reexported_packages = packages;
        }
    }

    fn package_matches(&self, entry: &ManifestEntry, id: PackageId) -> bool {
        let package = &self.state.packages[id.0];
        if package.platform_library || !entry.is_matching(package) {
            return false;
        }
        // bundle-version constrains the providing plugin, not the package
        match entry.bundle_version() {
            Some(bundle_version) => package.providers().any(|provider| {
                is_compatible_version(bundle_version, &self.state.plugins[provider.0].version_text)
            }),
            None => true,
        }
    }

    pub fn resolve_imported_packages(&mut self) {
        for index in 0..self.state.plugins.len() {
            let id = PluginId(index);
            let entries = self.state.plugins[index].imported_package_entries.clone();
            for entry in &entries {
                if entry.is_wildcard() {
                    debug!(
                        "Skipping wildcard import {} of {}",
                        entry.name(),
                        self.state.plugins[index].name
                    );
                    continue;
                }
                let candidates: Vec<PackageId> = self
                    .state
                    .packages_named(entry.name())
                    .iter()
                    .copied()
                    .filter(|package| self.package_matches(entry, *package))
                    .collect();

                let target = if candidates.is_empty()
                    && self.state.options().is_platform_package(entry.name())
                {
                    Some(self.state.platform_library_package(entry.name()))
                } else {
                    self.arbitrate(
                        id.into(),
                        "package",
                        &entry.to_string(),
                        &candidates,
                        entry.is_lenient(),
                    )
                };
                if let Some(package) = target {
                    self.state.plugins[index].imported_packages.insert(package);
                    self.state.packages[package.0].imported_by.insert(id);
                }
            }
        }
    }

    /// Bind each Require-Capability clause to a provided capability
    pub fn resolve_capabilities(&mut self) {
        for requirement_id in self.state.required_capability_ids() {
            let requirement = &self.state.capabilities[requirement_id.0];
            let Some(owner) = requirement.required_by.first().copied() else {
                continue;
            };
            let lenient = requirement.optional;
            let label = requirement.label();
            let candidates: Vec<CapabilityId> = self
                .state
                .capabilities_named(&requirement.name)
                .iter()
                .copied()
                .filter(|provided| requirement.is_satisfied_by(&self.state.capabilities[provided.0]))
                .collect();

            let Some(provided) =
                self.arbitrate(owner.into(), "capability", &label, &candidates, lenient)
            else {
                continue;
            };
            let providers = self.state.capabilities[provided.0].provided_by.clone();
            let requirement = &mut self.state.capabilities[requirement_id.0];
            requirement.resolved_to = Some(provided);
            requirement.provided_by = providers;
            self.state.capabilities[provided.0].required_by.insert(owner);
        }
    }

    /// Warn about packages that unrelated plugins contribute to
    pub fn check_split_packages(&mut self) {
        for index in 0..self.state.packages.len() {
            let package_id = PackageId(index);
            let package = &self.state.packages[index];
            if package.platform_library || package.exported_by.len() < 2 {
                continue;
            }
            let exporters: Vec<PluginId> = package.exported_by.iter().copied().collect();
            if exporters
                .iter()
                .all(|e| self.state.plugins[e.0].exports_split(&package.name))
            {
                continue;
            }
            // a host and its fragments form one family
            let families: IndexSet<PluginId> = exporters
                .iter()
                .map(|e| self.state.plugins[e.0].host.unwrap_or(*e))
                .collect();
            if families.len() < 2 {
                continue;
            }

            let importers: Vec<PluginId> = package.imported_by.iter().copied().collect();
            let names = self.state.exporter_names(package_id);
            let message = format!(
                "package {} contributed by multiple, not related plugins: {}",
                package.label(),
                names.join(", ")
            );

            self.state.report(
                Problem::warning(ProblemKind::SplitPackage, message.clone(), package_id.into())
                    .with_related(exporters.iter().map(|&e| e.into())),
            );
            for plugin in exporters.iter().chain(importers.iter()) {
                self.state.report(
                    Problem::warning(ProblemKind::SplitPackage, message.clone(), (*plugin).into())
                        .with_related([package_id.into()]),
                );
            }
        }
    }

    /// Attach included and required plugins and features of every feature
    pub fn resolve_features(&mut self) {
        for index in 0..self.state.features.len() {
            let id = FeatureId(index);
            let feature = &self.state.features[index];
            let included_plugins = feature.included_plugin_entries.clone();
            let included_features = feature.included_feature_entries.clone();
            let required_plugins = feature.required_plugin_entries.clone();
            let required_features = feature.required_feature_entries.clone();

            for entry in &included_plugins {
                // platform specific plugins may legitimately be absent
                let lenient = entry.is_optional() || entry.platform_filter().is_some();
                let candidates = self.plugin_candidates_any(entry, true);
                if let Some(plugin) =
                    self.arbitrate(id.into(), "included plugin", &entry.to_string(), &candidates, lenient)
                {
                    let feature = &mut self.state.features[index];
                    feature.included_plugins.insert(plugin);
                    feature.osgi.resolved_plugins.insert(plugin);
                    self.state.plugins[plugin.0]
                        .osgi
                        .included_in_features
                        .insert(id);
                }
            }

            for entry in &included_features {
                let lenient = entry.is_optional() || entry.platform_filter().is_some();
                let candidates = self.feature_candidates(entry, true);
                if let Some(included) = self.arbitrate(
                    id.into(),
                    "included feature",
                    &entry.to_string(),
                    &candidates,
                    lenient,
                ) {
                    self.state.features[index].included_features.insert(included);
                    self.state.features[included.0]
                        .osgi
                        .included_in_features
                        .insert(id);
                }
            }

            for entry in &required_plugins {
                let candidates = self.plugin_candidates_any(entry, false);
                if let Some(plugin) = self.arbitrate(
                    id.into(),
                    "required plugin",
                    &entry.to_string(),
                    &candidates,
                    entry.is_optional(),
                ) {
                    let feature = &mut self.state.features[index];
                    feature.required_plugins.insert(plugin);
                    feature.osgi.resolved_plugins.insert(plugin);
                    self.state.plugins[plugin.0].required_by_features.insert(id);
                }
            }

            for entry in &required_features {
                let candidates = self.feature_candidates(entry, false);
                if let Some(required) = self.arbitrate(
                    id.into(),
                    "required feature",
                    &entry.to_string(),
                    &candidates,
                    entry.is_optional(),
                ) {
                    self.state.features[index].required_features.insert(required);
                    self.state.features[required.0]
                        .required_by_features
                        .insert(id);
                }
            }
        }
    }

    /// Features may list fragments, so unlike bundle requirements these
    /// searches do not skip them
    fn plugin_candidates_any(&self, entry: &ManifestEntry, exact: bool) -> Vec<PluginId> {
        self.state
            .plugins_named(entry.name())
            .iter()
            .copied()
            .filter(|id| {
                let plugin = &self.state.plugins[id.0];
                if exact {
                    entry.exact_match(&plugin.name, &plugin.version_text)
                } else {
                    entry.is_matching(plugin)
                }
            })
            .collect()
    }
}
