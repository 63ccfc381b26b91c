//! Classpath projection.
//!
//! Turns resolved plugin relations into the ordered plugin sets and path
//! lists a build-file writer emits.

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexSet;
use osgi_core::utils::{is_archive, join_classpath_entry};

use crate::closure::reexport_closure;
use crate::model::PluginId;
use crate::state::PlatformState;

/// Read-only projections over a resolved [`PlatformState`]
pub struct ClasspathProjector<'s> {
    state: &'s PlatformState,
    output_dir: Utf8PathBuf,
}

impl<'s> ClasspathProjector<'s> {
    pub fn new(state: &'s PlatformState) -> Self {
        Self {
            state,
            output_dir: state.options().output_dir.clone(),
        }
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<Utf8PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    /// Plugins a plugin compiles against, in classpath order.
    ///
    /// Required plugins with what they re-export, then the host, exporters of
    /// imported packages, providers of required capabilities and finally
    /// plugins contributing split parts of a package already on the path.
    pub fn visible_on_compile_plugins(&self, id: PluginId) -> IndexSet<PluginId> {
        let plugin = self.state.plugin(id);
        let mut visible = IndexSet::new();

        for &required in plugin.required_plugins() {
            visible.insert(required);
            visible.extend(reexport_closure(self.state, [required]));
        }
        if let Some(host) = plugin.host() {
            visible.insert(host);
            visible.extend(reexport_closure(self.state, [host]));
        }
        for &package in plugin.imported_packages() {
            visible.extend(self.state.package(package).exported_by().iter().copied());
        }
        for &capability in plugin.required_capabilities() {
            visible.extend(self.state.capability(capability).provided_by().iter().copied());
        }

        let mut split_parts = Vec::new();
        for &member in &visible {
            for &package in self.state.plugin(member).exported_packages() {
                let name = self.state.package(package).name();
                for &same_name in self.state.packages_named(name) {
                    split_parts.extend(
                        self.state
                            .package(same_name)
                            .exported_by()
                            .iter()
                            .copied()
                            .filter(|exporter| self.state.plugin(*exporter).exports_split(name)),
                    );
                }
            }
        }
        visible.extend(split_parts);

        visible.shift_remove(&id);
        visible
    }

    /// Class folders and jars of the plugin itself.
    ///
    /// Without a Bundle-ClassPath a packed plugin contributes its archive and
    /// a source plugin its binary output directory.
    pub fn local_classpath(&self, id: PluginId) -> Vec<Utf8PathBuf> {
        let plugin = self.state.plugin(id);
        let location = plugin.path();
        let entries: Vec<&str> = if plugin.bundle_classpath().is_empty() {
            vec!["."]
        } else {
            plugin.bundle_classpath().iter().map(String::as_str).collect()
        };

        entries
            .into_iter()
            .map(|entry| self.resolve_entry(location, entry))
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect()
    }

    fn resolve_entry(&self, location: &Utf8Path, entry: &str) -> Utf8PathBuf {
        let entry = entry.trim();
        if (entry.is_empty() || entry == ".") && !is_archive(location) {
            return join_classpath_entry(location, self.output_dir.as_str());
        }
        join_classpath_entry(location, entry)
    }

    /// Local classpath followed by every compile-visible plugin's
    pub fn compile_classpath(&self, id: PluginId) -> Vec<Utf8PathBuf> {
        self.collect_paths(id, self.visible_on_compile_plugins(id))
    }

    /// Local classpath followed by the transitive closure's; empty before the
    /// closure is computed
    pub fn run_classpath(&self, id: PluginId) -> Vec<Utf8PathBuf> {
        let closure = self
            .state
            .plugin(id)
            .recursive_resolved_plugins()
            .cloned()
            .unwrap_or_default();
        self.collect_paths(id, closure)
    }

    fn collect_paths(&self, id: PluginId, plugins: IndexSet<PluginId>) -> Vec<Utf8PathBuf> {
        let mut paths: IndexSet<Utf8PathBuf> = self.local_classpath(id).into_iter().collect();
        for plugin in plugins {
            if plugin != id {
                paths.extend(self.local_classpath(plugin));
            }
        }
        paths.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::PluginDescriptor;
    use crate::state::ResolverOptions;

    fn resolve(plugins: &[PluginDescriptor]) -> PlatformState {
        let mut state = PlatformState::new(ResolverOptions::default());
        for plugin in plugins {
            state.add_plugin(plugin).unwrap();
        }
        state.compute_all_dependencies_recursive();
        state
    }

    fn names(state: &PlatformState, ids: &IndexSet<PluginId>) -> Vec<String> {
        ids.iter().map(|id| state.plugin(*id).name().to_string()).collect()
    }

    #[test]
    fn test_visible_set_order() {
        let state = resolve(&[
            PluginDescriptor::new("base", "1.0.0").export_package("org.base"),
            PluginDescriptor::new("api", "1.0.0").require_bundle("base;visibility:=reexport"),
            PluginDescriptor::new("host", "1.0.0"),
            PluginDescriptor::new("pkg", "1.0.0").export_package("org.pkg"),
            PluginDescriptor::new("frag", "1.0.0")
                .fragment_host("host")
                .require_bundle("api")
                .import_package("org.pkg"),
        ]);
        let frag = state.find_plugin("frag", "").unwrap();
        let visible = ClasspathProjector::new(&state).visible_on_compile_plugins(frag);
        assert_eq!(names(&state, &visible), vec!["api", "base", "host", "pkg"]);
    }

    #[test]
    fn test_split_contributors_are_added() {
        let state = resolve(&[
            PluginDescriptor::new("core", "1.0.0").export_package("org.shared"),
            PluginDescriptor::new("extra", "1.0.0")
                .with_path("/extra")
                .export_package("org.shared;split=true"),
            PluginDescriptor::new("user", "1.0.0").require_bundle("core"),
        ]);
        let user = state.find_plugin("user", "").unwrap();
        let visible = ClasspathProjector::new(&state).visible_on_compile_plugins(user);
        assert_eq!(names(&state, &visible), vec!["core", "extra"]);
    }

    #[test]
    fn test_local_classpath() {
        let state = resolve(&[
            PluginDescriptor::new("jar", "1.0.0").with_path("/repo/jar_1.0.0.jar"),
            PluginDescriptor::new("src", "1.0.0")
                .with_path("/ws/src")
                .bundle_classpath(&[".", "lib/dep.jar"]),
        ]);
        let projector = ClasspathProjector::new(&state);
        let jar = state.find_plugin("jar", "").unwrap();
        let src = state.find_plugin("src", "").unwrap();
        assert_eq!(
            projector.local_classpath(jar),
            vec![Utf8PathBuf::from("/repo/jar_1.0.0.jar")]
        );
        assert_eq!(
            projector.local_classpath(src),
            vec![
                Utf8PathBuf::from("/ws/src/target/classes"),
                Utf8PathBuf::from("/ws/src/lib/dep.jar")
            ]
        );
        assert_eq!(
            projector.with_output_dir("bin").local_classpath(src)[0],
            Utf8PathBuf::from("/ws/src/bin")
        );
    }

    #[test]
    fn test_compile_and_run_classpaths() {
        let state = resolve(&[
            PluginDescriptor::new("a", "1.0.0").with_path("/p/a.jar"),
            PluginDescriptor::new("b", "1.0.0").with_path("/p/b.jar").require_bundle("a"),
            PluginDescriptor::new("c", "1.0.0").with_path("/p/c.jar").require_bundle("b"),
        ]);
        let projector = ClasspathProjector::new(&state);
        let c = state.find_plugin("c", "").unwrap();
        assert_eq!(
            projector.compile_classpath(c),
            vec![Utf8PathBuf::from("/p/c.jar"), Utf8PathBuf::from("/p/b.jar")]
        );
        assert_eq!(
            projector.run_classpath(c),
            vec![
                Utf8PathBuf::from("/p/c.jar"),
                Utf8PathBuf::from("/p/b.jar"),
                Utf8PathBuf::from("/p/a.jar")
            ]
        );
    }
}
