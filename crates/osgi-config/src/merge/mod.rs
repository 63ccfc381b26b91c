//! Configuration layering, fallback logic, and environment overrides

use std::collections::HashMap;

use camino::{Utf8Path, Utf8PathBuf};
use osgi_core::OsgiError;
use osgi_resolver::ResolverOptions;

use crate::toml::{load_from_file, validate_config, DepsToml, CONFIG_FILE_NAME};
use crate::ConfigResult;

/// Prefix of the environment variables that override configuration
pub const ENV_PREFIX: &str = "OSGI_DEPS_";

/// Main configuration loading interface
pub struct ConfigLoader {
    /// Current working directory
    cwd: Utf8PathBuf,
}

/// Configuration layering and merging
#[derive(Debug, Default)]
pub struct ConfigLayering {
    /// Global configuration
    global_config: Option<DepsToml>,
    /// Project configuration
    project_config: Option<DepsToml>,
    /// Environment overrides
    env_overrides: HashMap<String, String>,
    /// CLI flag overrides
    cli_overrides: CliOverrides,
}

/// Values given on the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOverrides {
    /// Added to the ignore-list of every lower layer
    pub ignored_cycles: Vec<String>,
    pub dummy_version: Option<String>,
    pub output_dir: Option<String>,
}

/// Configuration source tracking
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    /// Global config file
    Global(Utf8PathBuf),
    /// Project osgi-deps.toml file
    Project(Utf8PathBuf),
    /// File named with --config
    Explicit(Utf8PathBuf),
    /// Environment variable
    Environment(String),
    /// CLI flag
    CommandLine,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new(cwd: Utf8PathBuf) -> Self {
        Self { cwd }
    }

    /// Find configuration file in project (walks up directory tree)
    pub fn resolve_config_path(&self, filename: &str) -> Option<Utf8PathBuf> {
        let mut current = Some(self.cwd.as_path());
        while let Some(dir) = current {
            let config_path = dir.join(filename);
            if config_path.is_file() {
                return Some(config_path);
            }
            current = dir.parent();
        }
        None
    }

    /// Load the nearest osgi-deps.toml, if any
    pub fn load_project_config(&self) -> ConfigResult<Option<(DepsToml, ConfigSource)>> {
        match self.resolve_config_path(CONFIG_FILE_NAME) {
            Some(path) => {
                let config = load_from_file(&path)?;
                Ok(Some((config, ConfigSource::Project(path))))
            },
            None => Ok(None),
        }
    }

    /// Load a file named explicitly; unlike the project lookup it must exist
    pub fn load_explicit_config(&self, path: &Utf8Path) -> ConfigResult<(DepsToml, ConfigSource)> {
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        };
        let config = load_from_file(&path)?;
        Ok((config, ConfigSource::Explicit(path)))
    }

    /// Location of the user-wide configuration file
    pub fn global_config_path() -> ConfigResult<Utf8PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| OsgiError::ConfigValidation {
            field: "config_dir".to_string(),
            reason: "Could not determine the user configuration directory".to_string(),
        })?;

        let config_dir = Utf8PathBuf::try_from(config_dir).map_err(|e| OsgiError::ConfigValidation {
            field: "config_dir".to_string(),
            reason: format!("Invalid configuration directory path: {}", e),
        })?;
        Ok(config_dir.join("osgi-deps").join("config.toml"))
    }

    /// Load global configuration
    pub fn load_global_config(&self) -> ConfigResult<Option<DepsToml>> {
        let Ok(global_config_path) = Self::global_config_path() else {
            return Ok(None);
        };
        if global_config_path.is_file() {
            Ok(Some(load_from_file(&global_config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Resolver options from all layers: global file, project (or explicit)
    /// file, environment, command line
    pub fn load_resolver_options(
        &self,
        explicit: Option<&Utf8Path>,
        cli: CliOverrides,
    ) -> ConfigResult<ResolverOptions> {
        let project = match explicit {
            Some(path) => Some(self.load_explicit_config(path)?.0),
            None => self.load_project_config()?.map(|(config, _)| config),
        };
        let merged = ConfigLayering::new()
            .with_global(self.load_global_config()?)
            .with_project(project)
            .with_env(ConfigLayering::collect_env_overrides())
            .with_cli(cli)
            .merge()?;
        Ok(merged.resolver.to_options())
    }
}

impl ConfigLayering {
    /// Create a new configuration layering system
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_global(mut self, config: Option<DepsToml>) -> Self {
        self.global_config = config;
        self
    }

    pub fn with_project(mut self, config: Option<DepsToml>) -> Self {
        self.project_config = config;
        self
    }

    pub fn with_env(mut self, overrides: HashMap<String, String>) -> Self {
        self.env_overrides = overrides;
        self
    }

    pub fn with_cli(mut self, overrides: CliOverrides) -> Self {
        self.cli_overrides = overrides;
        self
    }

    pub fn merge(self) -> ConfigResult<DepsToml> {
        Self::merge_configs(
            self.global_config,
            self.project_config,
            self.env_overrides,
            self.cli_overrides,
        )
    }

    /// Merge multiple configuration layers.
    ///
    /// Scalar settings are taken from the highest layer that sets them; the
    /// cycle ignore-list is the union of all layers.
    pub fn merge_configs(
        global_config: Option<DepsToml>,
        project_config: Option<DepsToml>,
        env_overrides: HashMap<String, String>,
        cli_overrides: CliOverrides,
    ) -> ConfigResult<DepsToml> {
        let mut merged = global_config.unwrap_or_default();

        if let Some(project) = project_config {
            let project = project.resolver;
            let resolver = &mut merged.resolver;
            append_unique(&mut resolver.ignored_cycles, project.ignored_cycles);
            if project.dummy_version.is_some() {
                resolver.dummy_version = project.dummy_version;
            }
            if project.platform_packages.is_some() {
                resolver.platform_packages = project.platform_packages;
            }
            if project.output_dir.is_some() {
                resolver.output_dir = project.output_dir;
            }
        }

        // Apply environment variable overrides
        Self::apply_env_overrides(&mut merged, &env_overrides);

        // Apply CLI flag overrides (highest priority)
        Self::apply_cli_overrides(&mut merged, cli_overrides);

        validate_config(&merged)?;
        Ok(merged)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(config: &mut DepsToml, overrides: &HashMap<String, String>) {
        let resolver = &mut config.resolver;
        for (key, value) in overrides {
            match key.strip_prefix(ENV_PREFIX) {
                Some("IGNORED_CYCLES") => {
                    append_unique(&mut resolver.ignored_cycles, split_list(value));
                },
                Some("DUMMY_VERSION") => {
                    resolver.dummy_version = Some(value.trim().to_string());
                },
                Some("OUTPUT_DIR") => {
                    resolver.output_dir = Some(value.trim().to_string());
                },
                Some("PLATFORM_PACKAGES") => {
                    resolver.platform_packages = Some(split_list(value));
                },
                _ => {
                    // Unknown environment variable, ignore
                },
            }
        }
    }

    /// Apply CLI flag overrides
    fn apply_cli_overrides(config: &mut DepsToml, overrides: CliOverrides) {
        let resolver = &mut config.resolver;
        append_unique(&mut resolver.ignored_cycles, overrides.ignored_cycles);
        if overrides.dummy_version.is_some() {
            resolver.dummy_version = overrides.dummy_version;
        }
        if overrides.output_dir.is_some() {
            resolver.output_dir = overrides.output_dir;
        }
    }

    /// Collect environment variable overrides
    pub fn collect_env_overrides() -> HashMap<String, String> {
        std::env::vars()
            .filter(|(key, _)| key.starts_with(ENV_PREFIX))
            .collect()
    }
}

/// Comma separated list, blanks dropped
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn append_unique(target: &mut Vec<String>, items: Vec<String>) {
    for item in items {
        if !target.contains(&item) {
            target.push(item);
        }
    }
}
