//! End-to-end resolution scenarios.

use osgi_core::is_compatible_version;
use osgi_resolver::{
    ClasspathProjector, ElementId, PlatformState, PluginDescriptor, PluginId, ProblemKind,
    ResolverOptions, Severity,
};
use proptest::prelude::*;

fn platform(options: ResolverOptions, plugins: &[PluginDescriptor]) -> PlatformState {
    let mut state = PlatformState::new(options);
    for plugin in plugins {
        state.add_plugin(plugin).expect("valid descriptor");
    }
    state.compute_all_dependencies_recursive();
    state
}

fn plugin_id(state: &PlatformState, name: &str) -> PluginId {
    state.find_plugin(name, "").expect("registered plugin")
}

fn triangle() -> Vec<PluginDescriptor> {
    vec![
        PluginDescriptor::new("p1", "1.0.0").require_bundle("p2"),
        PluginDescriptor::new("p2", "1.0.0").require_bundle("p3"),
        PluginDescriptor::new("p3", "1.0.0").require_bundle("p1"),
    ]
}

fn cycle_problems_between(
    state: &PlatformState,
    owner: PluginId,
    other: PluginId,
) -> Vec<Severity> {
    state
        .plugin(owner)
        .log()
        .of_kind(ProblemKind::DependencyCycle)
        .filter(|p| p.related().contains(&ElementId::from(other)))
        .map(|p| p.severity())
        .collect()
}

#[test]
fn compatibility_examples() {
    assert!(is_compatible_version("1.0.0", "1.2.3"));
    assert!(!is_compatible_version("2", "1.2.3"));
    assert!(is_compatible_version("[1.2.3,2)", "1.2.3"));
    assert!(!is_compatible_version("(1.2.3,2)", "1.2.3"));
}

#[test]
fn mutual_requirements_are_cycle_errors() {
    let state = platform(ResolverOptions::default(), &triangle());
    let p1 = plugin_id(&state, "p1");
    let p3 = plugin_id(&state, "p3");

    assert_eq!(cycle_problems_between(&state, p1, p3), vec![Severity::Error]);
    assert_eq!(cycle_problems_between(&state, p3, p1), vec![Severity::Error]);
    assert!(state.has_errors());
}

#[test]
fn ignored_cycle_is_downgraded_on_both_participants() {
    let strict = platform(ResolverOptions::default(), &triangle());
    let lenient = platform(ResolverOptions::default().ignore_cycles_of("p1"), &triangle());
    let p1 = plugin_id(&lenient, "p1");
    let p3 = plugin_id(&lenient, "p3");

    assert_eq!(cycle_problems_between(&lenient, p1, p3), vec![Severity::Warning]);
    assert_eq!(cycle_problems_between(&lenient, p3, p1), vec![Severity::Warning]);
    assert!(!lenient.plugin(p1).log().has_errors());
    assert!(strict.error_count() > 0);
    assert_eq!(lenient.error_count(), 0);
}

#[test]
fn ignoring_one_member_downgrades_the_whole_cycle() {
    let state = platform(ResolverOptions::default().ignore_cycles_of("p1"), &triangle());
    let p2 = plugin_id(&state, "p2");
    let p3 = plugin_id(&state, "p3");

    assert_eq!(cycle_problems_between(&state, p2, p3), vec![Severity::Warning]);
    assert_eq!(cycle_problems_between(&state, p3, p2), vec![Severity::Warning]);
    assert!(!state.has_errors());
}

#[test]
fn separate_cycles_keep_their_own_severity() {
    let mut plugins = triangle();
    plugins.push(PluginDescriptor::new("q1", "1.0.0").require_bundle("q2"));
    plugins.push(PluginDescriptor::new("q2", "1.0.0").require_bundle("q1"));
    let state = platform(ResolverOptions::default().ignore_cycles_of("p1"), &plugins);
    let q1 = plugin_id(&state, "q1");
    let q2 = plugin_id(&state, "q2");

    assert_eq!(cycle_problems_between(&state, q1, q2), vec![Severity::Error]);
    assert_eq!(state.error_count(), 2);
}

#[test]
fn changed_ignore_list_takes_effect_on_next_resolution() {
    let mut state = platform(ResolverOptions::default(), &triangle());
    assert!(state.has_errors());

    state.set_ignored_cycles(["p2"]);
    state.compute_all_dependencies_recursive();

    assert_eq!(state.error_count(), 0);
    let ids: Vec<PluginId> = ["p1", "p2", "p3"].iter().map(|n| plugin_id(&state, n)).collect();
    for &owner in &ids {
        for &other in &ids {
            if owner != other {
                let severities = cycle_problems_between(&state, owner, other);
                assert!(severities.iter().all(|s| *s == Severity::Warning));
                assert!(severities.len() <= 1);
            }
        }
    }

    state.set_ignored_cycles(Vec::<String>::new());
    state.compute_all_dependencies_recursive();
    assert_eq!(state.warning_count(), 0);
    assert!(state.has_errors());
}

#[test]
fn fragment_and_host_are_not_a_cycle() {
    let state = platform(
        ResolverOptions::default(),
        &[
            PluginDescriptor::new("host", "1.0.0").export_package("org.host"),
            PluginDescriptor::new("frag", "1.0.0")
                .fragment_host("host")
                .import_package("org.host"),
        ],
    );
    let host = plugin_id(&state, "host");
    let frag = plugin_id(&state, "frag");

    assert!(state.plugin(frag).recursive_resolved_plugins().unwrap().contains(&host));
    assert!(state.plugin(host).recursive_resolved_plugins().unwrap().contains(&frag));
    assert_eq!(state.problems().count(), 0);
}

#[test]
fn sibling_fragments_are_not_a_cycle() {
    let state = platform(
        ResolverOptions::default(),
        &[
            PluginDescriptor::new("host", "1.0.0"),
            PluginDescriptor::new("f1", "1.0.0")
                .fragment_host("host")
                .import_package("org.f2"),
            PluginDescriptor::new("f2", "1.0.0")
                .fragment_host("host")
                .export_package("org.f2"),
        ],
    );
    let f1 = plugin_id(&state, "f1");
    let f2 = plugin_id(&state, "f2");

    assert!(state.plugin(f1).recursive_resolved_plugins().unwrap().contains(&f2));
    assert_eq!(
        state
            .problems()
            .filter(|p| p.kind() == ProblemKind::DependencyCycle)
            .count(),
        0
    );
}

#[test]
fn cycle_through_a_fragment_is_reported() {
    let state = platform(
        ResolverOptions::default(),
        &[
            PluginDescriptor::new("host", "1.0.0").require_bundle("other"),
            PluginDescriptor::new("frag", "1.0.0")
                .fragment_host("host")
                .export_package("org.frag"),
            PluginDescriptor::new("other", "1.0.0").import_package("org.frag"),
        ],
    );
    let other = plugin_id(&state, "other");
    let host = plugin_id(&state, "host");

    assert_eq!(cycle_problems_between(&state, host, other), vec![Severity::Error]);
}

#[test]
fn unrelated_exporters_of_one_package_are_reported() {
    let state = platform(
        ResolverOptions::default(),
        &[
            PluginDescriptor::new("a", "1.0.0").export_package("hello"),
            PluginDescriptor::new("b", "1.0.0").export_package("hello"),
            PluginDescriptor::new("c", "1.0.0").import_package("hello"),
        ],
    );
    let hello = state.packages_named("hello")[0];
    let marker = "contributed by multiple, not related plugins";

    let package_log = state.package(hello).log();
    assert!(package_log.iter().any(|p| p.message().contains(marker)));
    for name in ["a", "b", "c"] {
        let log = state.plugin(plugin_id(&state, name)).log();
        assert!(
            log.of_kind(ProblemKind::SplitPackage)
                .any(|p| p.severity() == Severity::Warning && p.message().contains(marker)),
            "no split warning on {}",
            name
        );
    }
}

#[test]
fn versioned_exports_that_do_not_collide_are_silent() {
    let state = platform(
        ResolverOptions::default(),
        &[
            PluginDescriptor::new("a", "1.0.0").export_package("hello;version=1.0.0"),
            PluginDescriptor::new("b", "1.0.0").export_package("hello;version=2.0.0"),
            PluginDescriptor::new("c", "1.0.0").import_package("hello;version=\"[1.0.0,2.0.0)\""),
        ],
    );
    for package in state.packages_named("hello") {
        assert!(state.package(*package).log().is_empty());
    }
    for name in ["a", "b", "c"] {
        assert!(state.plugin(plugin_id(&state, name)).log().is_empty());
    }
    let c = state.plugin(plugin_id(&state, "c"));
    let imported = state.package(*c.imported_packages().first().unwrap());
    assert_eq!(imported.version_text(), "1.0.0");
}

#[test]
fn reexported_plugins_are_visible_to_requirers() {
    let state = platform(
        ResolverOptions::default(),
        &[
            PluginDescriptor::new("a", "1.0.0"),
            PluginDescriptor::new("b", "1.0.0").require_bundle("a;visibility:=reexport"),
            PluginDescriptor::new("c", "1.0.0").require_bundle("b"),
        ],
    );
    let a = plugin_id(&state, "a");
    let c = plugin_id(&state, "c");
    let visible = ClasspathProjector::new(&state).visible_on_compile_plugins(c);
    assert!(visible.contains(&a));
    assert!(!state.plugin(c).required_plugins().contains(&a));
}

#[test]
fn resolving_twice_is_idempotent() {
    let descriptors = vec![
        PluginDescriptor::new("a", "1.0.0").export_package("hello").require_bundle("missing"),
        PluginDescriptor::new("b", "1.0.0").export_package("hello").require_bundle("c"),
        PluginDescriptor::new("c", "1.0.0")
            .import_package("hello")
            .require_bundle("b;visibility:=reexport"),
    ];
    let mut state = platform(ResolverOptions::default(), &descriptors);
    let before: Vec<Vec<String>> = state.plugins().map(|(_, p)| p.log().messages()).collect();
    let closures: Vec<_> = state
        .plugins()
        .map(|(_, p)| p.recursive_resolved_plugins().cloned())
        .collect();
    let errors = state.error_count();

    state.compute_all_dependencies_recursive();

    let after: Vec<Vec<String>> = state.plugins().map(|(_, p)| p.log().messages()).collect();
    let closures_after: Vec<_> = state
        .plugins()
        .map(|(_, p)| p.recursive_resolved_plugins().cloned())
        .collect();
    assert_eq!(before, after);
    assert_eq!(closures, closures_after);
    assert_eq!(errors, state.error_count());
}

#[test]
fn self_requirement_is_an_error() {
    let state = platform(
        ResolverOptions::default().ignore_cycles_of("narcissus"),
        &[PluginDescriptor::new("narcissus", "1.0.0").require_bundle("narcissus")],
    );
    let id = plugin_id(&state, "narcissus");
    let problems: Vec<_> = state
        .plugin(id)
        .log()
        .of_kind(ProblemKind::DependencyCycle)
        .collect();
    assert_eq!(problems.len(), 1);
    assert!(problems[0].is_error());
}

#[test]
fn dependents_cover_requirers_importers_and_fragments() {
    let state = platform(
        ResolverOptions::default(),
        &[
            PluginDescriptor::new("core", "1.0.0").export_package("org.core"),
            PluginDescriptor::new("req", "1.0.0").require_bundle("core"),
            PluginDescriptor::new("imp", "1.0.0").import_package("org.core"),
            PluginDescriptor::new("frag", "1.0.0").fragment_host("core"),
        ],
    );
    let core = plugin_id(&state, "core");
    let dependents: Vec<&str> = state
        .dependents_of(core)
        .iter()
        .map(|id| state.plugin(*id).name())
        .collect();
    assert_eq!(dependents, vec!["req", "imp", "frag"]);
}

fn chain_strategy() -> impl Strategy<Value = Vec<Vec<usize>>> {
    prop::collection::vec(prop::collection::vec(0usize..8, 0..3), 1..8)
}

proptest! {
    #[test]
    fn closure_is_stable_across_runs(requirements in chain_strategy()) {
        let count = requirements.len();
        let descriptors: Vec<PluginDescriptor> = requirements
            .iter()
            .enumerate()
            .map(|(index, targets)| {
                let header: Vec<String> = targets
                    .iter()
                    .filter(|t| **t < count)
                    .map(|t| format!("p{}", t))
                    .collect();
                let descriptor = PluginDescriptor::new(&format!("p{}", index), "1.0.0");
                if header.is_empty() {
                    descriptor
                } else {
                    descriptor.require_bundle(&header.join(","))
                }
            })
            .collect();

        let mut state = platform(ResolverOptions::default(), &descriptors);
        let first: Vec<_> = state
            .plugins()
            .map(|(_, p)| p.recursive_resolved_plugins().cloned())
            .collect();
        state.compute_all_dependencies_recursive();
        let second: Vec<_> = state
            .plugins()
            .map(|(_, p)| p.recursive_resolved_plugins().cloned())
            .collect();
        prop_assert_eq!(&first, &second);

        // every required plugin and everything it reaches is in the closure
        for (id, plugin) in state.plugins() {
            let closure = plugin.recursive_resolved_plugins().unwrap();
            for required in plugin.required_plugins() {
                if *required != id {
                    prop_assert!(closure.contains(required));
                    let nested = state.plugin(*required).recursive_resolved_plugins().unwrap();
                    for reached in nested {
                        prop_assert!(*reached == id || closure.contains(reached));
                    }
                }
            }
        }
    }
}
