//! Transitive closures and dependency cycle detection.
//!
//! Closures are computed with a worklist: every node starts with its direct
//! dependencies, and whenever a node's closure grows its dependents are queued
//! again. Closures only grow and the node set is finite, so the loop reaches a
//! fixpoint without recursion.

use std::collections::VecDeque;
use std::hash::Hash;

use indexmap::{IndexMap, IndexSet};
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::debug;

use crate::model::{ClosureState, ElementId, FeatureId, PluginId, Problem, ProblemKind, Severity};
use crate::state::PlatformState;

/// Transitive closure of a dependency relation.
///
/// The result maps every key of `edges` to all nodes reachable from it. A
/// node on a cycle reaches itself.
pub fn transitive_closure<K>(edges: &IndexMap<K, IndexSet<K>>) -> IndexMap<K, IndexSet<K>>
where
    K: Copy + Eq + Hash,
{
    let mut dependents: IndexMap<K, Vec<K>> = IndexMap::new();
    for (node, dependencies) in edges {
        for dependency in dependencies {
            dependents.entry(*dependency).or_default().push(*node);
        }
    }

    let mut closures = edges.clone();
    let mut queue: VecDeque<K> = edges.keys().copied().collect();
    let mut queued: IndexSet<K> = edges.keys().copied().collect();
    let mut visits = 0usize;

    while let Some(node) = queue.pop_front() {
        queued.swap_remove(&node);
        visits += 1;
        let Some(dependencies) = edges.get(&node) else {
            continue;
        };
        let Some(current) = closures.get(&node) else {
            continue;
        };

        let mut grown = current.clone();
        for dependency in dependencies {
            if let Some(reachable) = closures.get(dependency) {
                grown.extend(reachable.iter().copied());
            }
        }
        if grown.len() == current.len() {
            continue;
        }

        closures.insert(node, grown);
        for dependent in dependents.get(&node).into_iter().flatten() {
            if queued.insert(*dependent) {
                queue.push_back(*dependent);
            }
        }
    }

    debug!("Closure of {} nodes reached after {} visits", edges.len(), visits);
    closures
}

/// Plugins reachable from `roots` through re-exported requirements only
pub fn reexport_closure(
    state: &PlatformState,
    roots: impl IntoIterator<Item = PluginId>,
) -> IndexSet<PluginId> {
    let mut reached = IndexSet::new();
    let mut queue: VecDeque<PluginId> = roots.into_iter().collect();
    while let Some(id) = queue.pop_front() {
        for &next in &state.plugins[id.0].reexported_plugins {
            if reached.insert(next) {
                queue.push_back(next);
            }
        }
    }
    reached
}

/// Required plugins, host, fragments and exporters of imported packages
pub fn direct_dependencies(state: &PlatformState, id: PluginId) -> IndexSet<PluginId> {
    let plugin = &state.plugins[id.0];
    let mut dependencies: IndexSet<PluginId> =
        plugin.osgi.resolved_plugins.iter().copied().collect();
    dependencies.extend(plugin.host);
    dependencies.extend(plugin.fragments.iter().copied());
    for package in &plugin.imported_packages {
        dependencies.extend(
            state.packages[package.0]
                .exported_by
                .iter()
                .copied()
                .filter(|exporter| *exporter != id),
        );
    }
    dependencies
}

/// Members of dependency cycles, one group per strongly connected component.
///
/// Self loops are ignored; only components with more than one member are
/// returned.
pub fn cycle_components<K>(edges: &IndexMap<K, IndexSet<K>>) -> Vec<Vec<K>>
where
    K: Copy + Eq + Hash,
{
    let mut graph: DiGraph<K, ()> = DiGraph::new();
    let mut nodes: IndexMap<K, NodeIndex> = IndexMap::new();
    for (node, dependencies) in edges {
        for key in std::iter::once(node).chain(dependencies) {
            nodes.entry(*key).or_insert_with(|| graph.add_node(*key));
        }
    }
    for (node, dependencies) in edges {
        for dependency in dependencies {
            if dependency != node {
                graph.update_edge(nodes[node], nodes[dependency], ());
            }
        }
    }

    tarjan_scc(&graph)
        .into_iter()
        .filter(|component| component.len() > 1)
        .map(|component| component.into_iter().map(|index| graph[index]).collect())
        .collect()
}

/// Cycle component of every node that lies on a cycle, with the severity of
/// each component. One ignored member downgrades the whole component.
struct CycleGroups<K> {
    component_of: IndexMap<K, usize>,
    severities: Vec<Severity>,
}

impl<K: Copy + Eq + Hash> CycleGroups<K> {
    fn new(edges: &IndexMap<K, IndexSet<K>>, is_ignored: impl Fn(K) -> bool) -> Self {
        let components = cycle_components(edges);
        let mut component_of = IndexMap::new();
        let mut severities = Vec::with_capacity(components.len());
        for (index, members) in components.iter().enumerate() {
            component_of.extend(members.iter().map(|member| (*member, index)));
            let ignored = members.iter().any(|member| is_ignored(*member));
            severities.push(if ignored { Severity::Warning } else { Severity::Error });
        }
        Self {
            component_of,
            severities,
        }
    }

    /// Severity of the edge `from -> to` if both ends share a cycle
    fn severity(&self, from: K, to: K) -> Option<Severity> {
        let component = *self.component_of.get(&from)?;
        (self.component_of.get(&to) == Some(&component)).then(|| self.severities[component])
    }
}

/// The same problem on both participants of a cycle, each pointing at the
/// other one
fn cycle_problems<K>(a: K, b: K, message: String, severity: Severity) -> [Problem; 2]
where
    K: Copy + Into<ElementId>,
{
    [
        Problem::new(ProblemKind::DependencyCycle, severity, message.clone(), a.into())
            .with_related([b.into()]),
        Problem::new(ProblemKind::DependencyCycle, severity, message, b.into())
            .with_related([a.into()]),
    ]
}

/// Close every plugin and report plugin cycles.
///
/// A host and its fragments form one family. Dependencies inside a family
/// never count as a cycle, so cycles are searched on the graph of families.
pub fn compute_plugin_closures(state: &mut PlatformState) {
    let mut edges: IndexMap<PluginId, IndexSet<PluginId>> = IndexMap::new();
    for index in 0..state.plugins.len() {
        let id = PluginId(index);
        edges.insert(id, direct_dependencies(state, id));
        // open until the closing loop below
        state.plugins[index].recursive = ClosureState::Open;
    }

    let mut closures = transitive_closure(&edges);

    let family = |id: PluginId| state.plugins[id.0].host.unwrap_or(id);
    let mut family_edges: IndexMap<PluginId, IndexSet<PluginId>> = IndexMap::new();
    for (&id, dependencies) in &edges {
        let from = family(id);
        let targets = family_edges.entry(from).or_default();
        targets.extend(dependencies.iter().map(|dependency| family(*dependency)));
        targets.shift_remove(&from);
    }
    let groups = CycleGroups::new(&family_edges, |head| {
        std::iter::once(head)
            .chain(state.plugins[head.0].fragments.iter().copied())
            .any(|member| state.options().is_cycle_ignored(&state.plugins[member.0].name))
    });

    let mut problems = Vec::new();
    for (&id, dependencies) in &edges {
        for &dependency in dependencies {
            if dependency == id {
                let plugin = &state.plugins[id.0];
                problems.push(Problem::error(
                    ProblemKind::DependencyCycle,
                    format!("plugin {} requires itself", plugin.label()),
                    id.into(),
                ));
                continue;
            }
            let (from, to) = (family(id), family(dependency));
            if from == to {
                continue;
            }
            let Some(severity) = groups.severity(from, to) else {
                continue;
            };

            // same wording from either side so the logs de-duplicate
            let (first, second) = if id < dependency {
                (id, dependency)
            } else {
                (dependency, id)
            };
            let message = format!(
                "dependency cycle between {} and {}",
                state.plugins[first.0].label(),
                state.plugins[second.0].label()
            );
            problems.extend(cycle_problems(id, dependency, message, severity));
        }
    }
    for problem in problems {
        state.report(problem);
    }

    for index in 0..state.plugins.len() {
        let id = PluginId(index);
        let mut closure = closures.swap_remove(&id).unwrap_or_default();
        closure.shift_remove(&id);
        state.plugins[index].recursive = ClosureState::Closed(closure);
    }
}

/// Close every feature over its included and required features and report
/// feature cycles
pub fn compute_feature_closures(state: &mut PlatformState) {
    let mut edges: IndexMap<FeatureId, IndexSet<FeatureId>> = IndexMap::new();
    for (index, feature) in state.features.iter().enumerate() {
        let dependencies = feature
            .included_features
            .iter()
            .chain(feature.required_features.iter())
            .copied()
            .collect();
        edges.insert(FeatureId(index), dependencies);
    }

    let mut closures = transitive_closure(&edges);
    let groups = CycleGroups::new(&edges, |id| {
        state.options().is_cycle_ignored(&state.features[id.0].name)
    });

    let mut problems = Vec::new();
    for (&id, dependencies) in &edges {
        for &dependency in dependencies {
            if dependency == id {
                problems.push(Problem::error(
                    ProblemKind::DependencyCycle,
                    format!("feature {} includes itself", state.features[id.0].label()),
                    id.into(),
                ));
                continue;
            }
            let Some(severity) = groups.severity(id, dependency) else {
                continue;
            };
            let (first, second) = if id < dependency {
                (id, dependency)
            } else {
                (dependency, id)
            };
            let message = format!(
                "dependency cycle between {} and {}",
                state.features[first.0].label(),
                state.features[second.0].label()
            );
            problems.extend(cycle_problems(id, dependency, message, severity));
        }
    }
    for problem in problems {
        state.report(problem);
    }

    for index in 0..state.features.len() {
        let id = FeatureId(index);
        let mut features = closures.swap_remove(&id).unwrap_or_default();
        features.shift_remove(&id);

        let mut plugins: IndexSet<PluginId> =
            state.features[index].osgi.resolved_plugins.clone();
        for feature in &features {
            plugins.extend(state.features[feature.0].osgi.resolved_plugins.iter().copied());
        }

        let feature = &mut state.features[index];
        feature.recursive_features = Some(features);
        feature.recursive_plugins = Some(plugins);
    }
}
