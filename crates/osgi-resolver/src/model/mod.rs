//! Element arena model.
//!
//! Plugins, packages, features and capabilities reference each other through
//! stable integer ids into the arenas owned by
//! [`PlatformState`](crate::state::PlatformState). Every edge is stored on both
//! ends so that "who exports X" or "who requires Y" is a lookup, never a scan.

pub mod capability;
pub mod feature;
pub mod package;
pub mod plugin;
pub mod problem;

pub use capability::{Capability, CapabilityRole};
pub use feature::Feature;
pub use package::{Package, JRE_SYSTEM_LIBRARY};
pub use plugin::{ClosureState, Plugin};
pub use problem::{Problem, ProblemKind, ProblemLog, Severity};

use indexmap::IndexSet;
use serde::Serialize;
use std::fmt;

macro_rules! element_id {
    ($(#[$meta:meta])* $name:ident, $variant:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        pub struct $name(pub(crate) usize);

        impl $name {
            /// Position in the owning arena
            pub fn index(self) -> usize {
                self.0
            }
        }

        impl From<$name> for ElementId {
            fn from(id: $name) -> Self {
                ElementId::$variant(id)
            }
        }
    };
}

element_id!(
    /// Handle of a registered plugin
    PluginId,
    Plugin
);
element_id!(
    /// Handle of a registered package
    PackageId,
    Package
);
element_id!(
    /// Handle of a registered feature
    FeatureId,
    Feature
);
element_id!(
    /// Handle of a registered capability
    CapabilityId,
    Capability
);

/// Any element that can own or be referenced by a problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ElementId {
    Plugin(PluginId),
    Package(PackageId),
    Feature(FeatureId),
    Capability(CapabilityId),
}

impl ElementId {
    pub fn kind(&self) -> &'static str {
        match self {
            ElementId::Plugin(_) => "plugin",
            ElementId::Package(_) => "package",
            ElementId::Feature(_) => "feature",
            ElementId::Capability(_) => "capability",
        }
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let index = match self {
            ElementId::Plugin(id) => id.0,
            ElementId::Package(id) => id.0,
            ElementId::Feature(id) => id.0,
            ElementId::Capability(id) => id.0,
        };
        write!(f, "{}#{}", self.kind(), index)
    }
}

/// Bookkeeping shared by plugins and features
#[derive(Debug, Clone, Default)]
pub struct OsgiElement {
    pub(crate) resolved_plugins: IndexSet<PluginId>,
    pub(crate) included_in_features: IndexSet<FeatureId>,
}

impl OsgiElement {
    /// Plugins this element resolved its requirements to
    pub fn resolved_plugins(&self) -> &IndexSet<PluginId> {
        &self.resolved_plugins
    }

    /// Features including this element
    pub fn included_in_features(&self) -> &IndexSet<FeatureId> {
        &self.included_in_features
    }

    pub(crate) fn clear(&mut self) {
        self.resolved_plugins.clear();
        self.included_in_features.clear();
    }
}

/// `name version` label used in diagnostics
pub(crate) fn label(name: &str, version: &str) -> String {
    if version.is_empty() {
        name.to_string()
    } else {
        format!("{} {}", name, version)
    }
}
