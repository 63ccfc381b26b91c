//! Platform descriptions: the plugins and features of one run, as produced
//! by the manifest and feature.xml reader.
//!
//! Accepted as JSON or TOML; the format is picked from the file extension.

use camino::Utf8Path;
use osgi_core::utils::path::get_extension;
use osgi_core::OsgiError;
use osgi_resolver::{FeatureDescriptor, PlatformState, PluginDescriptor, ResolverOptions};
use serde::{Deserialize, Serialize};

use crate::toml::line_column;
use crate::ConfigResult;

/// Everything a resolution run registers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformDescription {
    pub plugins: Vec<PluginDescriptor>,
    pub features: Vec<FeatureDescriptor>,
}

impl PlatformDescription {
    pub fn parse_json(content: &str, file: &str) -> ConfigResult<Self> {
        serde_json::from_str(content).map_err(|e| OsgiError::JsonParse {
            file: file.to_string(),
            message: format!("{} (line {}, column {})", e, e.line(), e.column()),
        })
    }

    pub fn parse_toml(content: &str, file: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| {
            let (line, column) = e
                .span()
                .map(|span| line_column(content, span.start))
                .unwrap_or((0, 0));
            OsgiError::TomlParse {
                file: file.to_string(),
                message: e.message().trim().to_string(),
                line,
                column,
            }
        })
    }

    /// Load a `.json` or `.toml` description
    pub fn load(path: &Utf8Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| OsgiError::io(format!("Failed to read {}", path), e))?;
        match get_extension(path).as_deref() {
            Some("json") => Self::parse_json(&content, path.as_str()),
            Some("toml") => Self::parse_toml(&content, path.as_str()),
            _ => Err(OsgiError::ConfigValidation {
                field: "platform".to_string(),
                reason: format!("{} is neither a .json nor a .toml file", path),
            }),
        }
    }

    /// Register every descriptor into a fresh state
    pub fn into_state(self, options: ResolverOptions) -> ConfigResult<PlatformState> {
        let mut state = PlatformState::new(options);
        for plugin in &self.plugins {
            state.add_plugin(plugin)?;
        }
        for feature in &self.features {
            state.add_feature(feature)?;
        }
        Ok(state)
    }
}
