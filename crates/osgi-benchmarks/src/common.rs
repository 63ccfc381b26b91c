//! Common utilities for benchmarks

use criterion::Criterion;
use osgi_resolver::{
    FeatureDescriptor, FeatureEntry, PlatformState, PluginDescriptor, ResolverOptions,
};
use pprof::criterion::{Output, PProfProfiler};

/// Configure criterion with flamegraph profiling support
pub fn criterion_config() -> Criterion {
    Criterion::default()
        .warm_up_time(std::time::Duration::from_secs(3))
        .measurement_time(std::time::Duration::from_secs(10))
        .sample_size(50)
        .with_profiler(PProfProfiler::new(100, Output::Flamegraph(None)))
}

/// Synthetic platform of `size` plugins.
///
/// Plugin `i` requires up to three lower-numbered plugins, re-exports the
/// first of them and imports a package of a fourth. Every tenth plugin gets
/// a fragment, every 25th a second version (so requirements become
/// ambiguous), and with `cyclic` every 50th plugin requires a later one.
pub fn synthetic_platform(size: usize, cyclic: bool) -> Vec<PluginDescriptor> {
    let mut plugins = Vec::with_capacity(size + size / 5);
    for i in 0..size {
        let name = plugin_name(i);
        let mut requirements: Vec<String> = (1..=3)
            .filter(|step| i >= step * 7)
            .map(|step| plugin_name(i - step * 7))
            .collect();
        if let Some(first) = requirements.first_mut() {
            first.push_str(";visibility:=reexport");
        }
        if cyclic && i % 50 == 0 && i + 13 < size {
            requirements.push(plugin_name(i + 13));
        }

        let mut plugin = PluginDescriptor::new(&name, "1.0.0")
            .with_path(format!("/platform/{}_1.0.0.jar", name))
            .export_package(&format!("{}.api;version=1.0.0,{}.internal", name, name));
        if !requirements.is_empty() {
            plugin = plugin.require_bundle(&requirements.join(","));
        }
        if i >= 11 {
            let exporter = plugin_name(i - 11);
            plugin = plugin.import_package(&format!(
                "{}.api;version=\"[1.0.0,2.0.0)\",javax.xml.parsers",
                exporter
            ));
        }
        plugins.push(plugin);

        if i % 25 == 0 {
            plugins.push(
                PluginDescriptor::new(&name, "1.1.0")
                    .with_path(format!("/platform/{}_1.1.0.jar", name)),
            );
        }
        if i % 10 == 0 {
            plugins.push(
                PluginDescriptor::new(&format!("{}.nl", name), "1.0.0")
                    .with_path(format!("/platform/{}.nl_1.0.0.jar", name))
                    .fragment_host(&format!("{};bundle-version=\"[1.0.0,2.0.0)\"", name)),
            );
        }
    }
    plugins
}

/// One feature per hundred plugins, each including its slice
pub fn synthetic_features(size: usize) -> Vec<FeatureDescriptor> {
    (0..size.div_ceil(100))
        .map(|index| {
            let mut feature = FeatureDescriptor::new(&format!("org.bench.feature{}", index), "1.0.0");
            for i in (index * 100)..((index + 1) * 100).min(size) {
                feature = feature.include(FeatureEntry::plugin(&plugin_name(i), "1.0.0"));
            }
            if index > 0 {
                feature = feature.require(FeatureEntry::feature(
                    &format!("org.bench.feature{}", index - 1),
                    "1.0.0",
                ));
            }
            feature
        })
        .collect()
}

/// Registered but not yet resolved state
pub fn build_state(size: usize, cyclic: bool) -> PlatformState {
    let mut state = PlatformState::new(ResolverOptions::default());
    for plugin in synthetic_platform(size, cyclic) {
        let _ = state.add_plugin(&plugin);
    }
    for feature in synthetic_features(size) {
        let _ = state.add_feature(&feature);
    }
    state
}

/// Version strings with qualifiers and ranges mixed in
pub fn version_strings(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| match i % 4 {
            0 => format!("{}.{}.{}", i % 7, i % 13, i % 29),
            1 => format!("{}.{}.{}.v2024{:04}", i % 5, i % 11, i % 3, i),
            2 => format!("[{}.0.0,{}.0.0)", i % 5, i % 5 + 1),
            _ => format!("({}.{},{}]", i % 3, i % 10, i % 3 + 2),
        })
        .collect()
}

pub fn plugin_name(index: usize) -> String {
    format!("org.bench.p{}", index)
}
