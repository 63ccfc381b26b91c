//! Plugin dependency graph using petgraph
//!
//! A directed view of the resolved direct plugin relations, used for build
//! ordering and for rendering cycles. Edges point from a plugin to what it
//! depends on.

use std::collections::HashMap;
use std::fmt;

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::Serialize;

use crate::model::PluginId;
use crate::state::PlatformState;

/// Why one plugin depends on another
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DependencyEdge {
    /// Require-Bundle
    Requires,
    /// Fragment to its host
    Host,
    /// Importer to an exporter of one of its packages
    Imports,
}

impl fmt::Display for DependencyEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DependencyEdge::Requires => f.write_str("requires"),
            DependencyEdge::Host => f.write_str("host"),
            DependencyEdge::Imports => f.write_str("imports"),
        }
    }
}

/// Directed plugin graph
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// Underlying directed graph
    graph: DiGraph<PluginId, DependencyEdge>,
    /// Map from plugin to node for fast lookups
    node_map: HashMap<PluginId, NodeIndex>,
}

impl DependencyGraph {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph from a resolved state
    pub fn from_state(state: &PlatformState) -> Self {
        let mut graph = Self::new();
        for (id, _) in state.plugins() {
            graph.add_plugin(id);
        }
        for (id, plugin) in state.plugins() {
            for &required in plugin.required_plugins() {
                graph.add_dependency(id, required, DependencyEdge::Requires);
            }
            if let Some(host) = plugin.host() {
                graph.add_dependency(id, host, DependencyEdge::Host);
            }
            for &package in plugin.imported_packages() {
                for &exporter in state.package(package).exported_by() {
                    if exporter != id {
                        graph.add_dependency(id, exporter, DependencyEdge::Imports);
                    }
                }
            }
        }
        graph
    }

    /// Add a plugin node; adding it again returns the existing node
    pub fn add_plugin(&mut self, plugin: PluginId) -> NodeIndex {
        if let Some(existing) = self.node_map.get(&plugin) {
            return *existing;
        }
        let node = self.graph.add_node(plugin);
        self.node_map.insert(plugin, node);
        node
    }

    /// Add an edge, once per (from, to, kind)
    pub fn add_dependency(&mut self, from: PluginId, to: PluginId, edge: DependencyEdge) {
        let from = self.add_plugin(from);
        let to = self.add_plugin(to);
        let exists = self
            .graph
            .edges_connecting(from, to)
            .any(|existing| *existing.weight() == edge);
        if !exists {
            self.graph.add_edge(from, to, edge);
        }
    }

    /// Direct dependencies with the reason of each edge
    pub fn dependencies_of(&self, plugin: PluginId) -> Vec<(PluginId, DependencyEdge)> {
        let Some(node) = self.node_map.get(&plugin) else {
            return Vec::new();
        };
        let mut dependencies: Vec<(PluginId, DependencyEdge)> = self
            .graph
            .edges(*node)
            .map(|edge| (self.graph[edge.target()], *edge.weight()))
            .collect();
        // petgraph yields the newest edge first
        dependencies.reverse();
        dependencies
    }

    /// Strongly connected components, dependencies before their dependents
    pub fn build_groups(&self) -> Vec<Vec<PluginId>> {
        tarjan_scc(&self.graph)
            .into_iter()
            .map(|component| {
                let mut plugins: Vec<PluginId> =
                    component.into_iter().map(|node| self.graph[node]).collect();
                plugins.sort();
                plugins
            })
            .collect()
    }

    /// Plugins in an order where dependencies come first; cycle members
    /// are adjacent
    pub fn build_order(&self) -> Vec<PluginId> {
        self.build_groups().into_iter().flatten().collect()
    }

    /// Cycles: components with more than one member, and self loops
    pub fn cycles(&self) -> Vec<Vec<PluginId>> {
        self.build_groups()
            .into_iter()
            .filter(|component| match component.as_slice() {
                [single] => self
                    .node_map
                    .get(single)
                    .map_or(false, |node| self.graph.contains_edge(*node, *node)),
                _ => true,
            })
            .collect()
    }

    /// Format cycle as "a -> b -> c -> a"
    pub fn format_cycle(state: &PlatformState, cycle: &[PluginId]) -> String {
        if cycle.is_empty() {
            return "No cycle".to_string();
        }
        let mut names: Vec<&str> = cycle.iter().map(|id| state.plugin(*id).name()).collect();
        names.push(names[0]);
        names.join(" -> ")
    }

    /// Get number of plugins in the graph
    pub fn plugin_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Get number of dependency edges in the graph
    pub fn dependency_count(&self) -> usize {
        self.graph.edge_count()
    }
}
