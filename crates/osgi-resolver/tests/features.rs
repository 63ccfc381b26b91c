//! Feature closures and feature cycles.

use osgi_resolver::{
    ElementId, FeatureDescriptor, FeatureEntry, FeatureId, PlatformState, PluginDescriptor,
    PluginId, ProblemKind, ResolverOptions, Severity,
};

fn platform(
    options: ResolverOptions,
    plugins: &[&str],
    features: &[FeatureDescriptor],
) -> PlatformState {
    let mut state = PlatformState::new(options);
    for name in plugins {
        state
            .add_plugin(&PluginDescriptor::new(name, "1.0.0"))
            .expect("valid plugin");
    }
    for feature in features {
        state.add_feature(feature).expect("valid feature");
    }
    state.compute_all_dependencies_recursive();
    state
}

fn feature_id(state: &PlatformState, name: &str) -> FeatureId {
    state.features_named(name)[0]
}

fn plugin_names(state: &PlatformState, plugins: &[PluginId]) -> Vec<String> {
    let mut names: Vec<String> = plugins.iter().map(|id| state.plugin(*id).name().to_string()).collect();
    names.sort();
    names
}

fn cycle_severities(state: &PlatformState, owner: FeatureId, other: FeatureId) -> Vec<Severity> {
    state
        .feature(owner)
        .log()
        .of_kind(ProblemKind::DependencyCycle)
        .filter(|p| p.related().contains(&ElementId::from(other)))
        .map(|p| p.severity())
        .collect()
}

/// `a` includes `b`, `b` includes `c`, `c` includes `a`
fn feature_ring() -> Vec<FeatureDescriptor> {
    vec![
        FeatureDescriptor::new("a", "1.0.0").include(FeatureEntry::feature("b", "1.0.0")),
        FeatureDescriptor::new("b", "1.0.0").include(FeatureEntry::feature("c", "1.0.0")),
        FeatureDescriptor::new("c", "1.0.0").include(FeatureEntry::feature("a", "1.0.0")),
    ]
}

#[test]
fn recursive_plugins_aggregate_included_and_required_features() {
    let state = platform(
        ResolverOptions::default(),
        &["p.root", "p.included", "p.required", "p.nested"],
        &[
            FeatureDescriptor::new("root", "1.0.0")
                .include(FeatureEntry::plugin("p.root", "1.0.0"))
                .include(FeatureEntry::feature("included", "1.0.0"))
                .require(FeatureEntry::feature("required", "1.0.0")),
            FeatureDescriptor::new("included", "1.0.0")
                .include(FeatureEntry::plugin("p.included", "1.0.0"))
                .include(FeatureEntry::feature("nested", "1.0.0")),
            FeatureDescriptor::new("required", "1.0.0")
                .require(FeatureEntry::plugin("p.required", "1.0.0")),
            FeatureDescriptor::new("nested", "1.0.0")
                .include(FeatureEntry::plugin("p.nested", "1.0.0")),
        ],
    );
    let root = state.feature(feature_id(&state, "root"));

    let features: Vec<&str> = root
        .recursive_features()
        .unwrap()
        .iter()
        .map(|id| state.feature(*id).name())
        .collect();
    assert_eq!(features.len(), 3);
    assert!(features.contains(&"nested"));

    let plugins: Vec<PluginId> = root.recursive_plugins().unwrap().iter().copied().collect();
    assert_eq!(
        plugin_names(&state, &plugins),
        vec!["p.included", "p.nested", "p.required", "p.root"]
    );
    assert!(!state.has_errors());

    let leaf = state.feature(feature_id(&state, "nested"));
    assert!(leaf.recursive_features().unwrap().is_empty());
    assert_eq!(leaf.recursive_plugins().unwrap().len(), 1);
}

#[test]
fn feature_including_itself_is_an_error() {
    let state = platform(
        ResolverOptions::default().ignore_cycles_of("selfish"),
        &[],
        &[FeatureDescriptor::new("selfish", "1.0.0").include(FeatureEntry::feature("selfish", "1.0.0"))],
    );
    let id = feature_id(&state, "selfish");
    let feature = state.feature(id);

    let problems: Vec<_> = feature.log().of_kind(ProblemKind::DependencyCycle).collect();
    assert_eq!(problems.len(), 1);
    assert!(problems[0].is_error());
    assert!(!feature.recursive_features().unwrap().contains(&id));
}

#[test]
fn feature_cycle_is_an_error_on_every_pair() {
    let state = platform(ResolverOptions::default(), &[], &feature_ring());
    let a = feature_id(&state, "a");
    let b = feature_id(&state, "b");
    let c = feature_id(&state, "c");

    assert_eq!(cycle_severities(&state, a, b), vec![Severity::Error]);
    assert_eq!(cycle_severities(&state, b, c), vec![Severity::Error]);
    assert_eq!(cycle_severities(&state, c, a), vec![Severity::Error]);
    assert_eq!(state.feature(a).recursive_features().unwrap().len(), 2);
}

#[test]
fn ignored_feature_downgrades_its_cycle() {
    let state = platform(ResolverOptions::default().ignore_cycles_of("a"), &[], &feature_ring());
    let b = feature_id(&state, "b");
    let c = feature_id(&state, "c");

    assert_eq!(cycle_severities(&state, b, c), vec![Severity::Warning]);
    assert_eq!(cycle_severities(&state, c, b), vec![Severity::Warning]);
    assert_eq!(state.error_count(), 0);
    assert_eq!(state.warning_count(), 6);
}

#[test]
fn required_feature_cycle_is_detected() {
    let state = platform(
        ResolverOptions::default(),
        &[],
        &[
            FeatureDescriptor::new("x", "1.0.0").require(FeatureEntry::feature("y", "1.0.0")),
            FeatureDescriptor::new("y", "1.0.0").include(FeatureEntry::feature("x", "1.0.0")),
        ],
    );
    let x = feature_id(&state, "x");
    let y = feature_id(&state, "y");

    assert_eq!(cycle_severities(&state, x, y), vec![Severity::Error]);
    assert_eq!(cycle_severities(&state, y, x), vec![Severity::Error]);
}
