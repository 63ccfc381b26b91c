//! Dependency resolution engine for OSGi platforms
//!
//! This crate resolves the requirements between plugins, fragments, features,
//! packages and capabilities, detects dependency cycles and projects the
//! result onto per-plugin classpaths.
//!
//! A run follows a fixed lifecycle: build a [`PlatformState`], register
//! descriptors, call [`PlatformState::compute_all_dependencies_recursive`],
//! then read resolved sets, problem logs and classpaths.

pub mod classpath;
pub mod closure;
pub mod descriptor;
pub mod graph;
pub mod model;
pub mod resolver;
pub mod state;

// Re-export main types
pub use classpath::ClasspathProjector;
pub use descriptor::{FeatureDescriptor, FeatureEntry, FeatureEntryKind, PluginDescriptor};
pub use graph::{DependencyEdge, DependencyGraph};
pub use model::{
    Capability, CapabilityId, ClosureState, ElementId, Feature, FeatureId, Package, PackageId,
    Plugin, PluginId, Problem, ProblemKind, ProblemLog, Severity, JRE_SYSTEM_LIBRARY,
};
pub use resolver::DependencyResolver;
pub use state::{PlatformState, ResolverOptions};

use osgi_core::OsgiError;

/// Result type for resolver operations
pub type ResolverResult<T> = Result<T, OsgiError>;
