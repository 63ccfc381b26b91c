//! osgi-deps.toml configuration parsing and serialization

use camino::{Utf8Path, Utf8PathBuf};
use osgi_core::types::DUMMY_VERSION_SENTINEL;
use osgi_core::{OsgiError, Version};
use osgi_resolver::ResolverOptions;
use serde::{Deserialize, Serialize};

use crate::ConfigResult;

/// File name looked up from the working directory upwards
pub const CONFIG_FILE_NAME: &str = "osgi-deps.toml";

/// Complete osgi-deps.toml configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepsToml {
    /// Resolver settings
    #[serde(default)]
    pub resolver: ResolverSection,
}

/// `[resolver]` section.
///
/// Unset fields fall through to lower configuration layers and finally to
/// the resolver defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ResolverSection {
    /// Plugin or feature names whose cycles are only warnings
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ignored_cycles: Vec<String>,

    /// Replacement for `${dummy.version}` in requirement versions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dummy_version: Option<String>,

    /// Package prefixes supplied by the runtime
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_packages: Option<Vec<String>>,

    /// Binary output directory of source plugins
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<String>,
}

impl ResolverSection {
    /// Resolver options with defaults for everything unset
    pub fn to_options(&self) -> ResolverOptions {
        let mut options = ResolverOptions::default();
        options.ignored_cycles = self.ignored_cycles.iter().cloned().collect();
        options.dummy_version = self.dummy_version.clone();
        if let Some(prefixes) = &self.platform_packages {
            options.platform_packages = prefixes.clone();
        }
        if let Some(output_dir) = &self.output_dir {
            options.output_dir = Utf8PathBuf::from(output_dir);
        }
        options
    }
}

/// Parse TOML string to DepsToml configuration
pub fn parse_deps_toml(content: &str, file: &str) -> ConfigResult<DepsToml> {
    // First try with toml_edit for better error reporting
    content
        .parse::<toml_edit::DocumentMut>()
        .map_err(|e| toml_error(content, file, e.message(), e.span()))?;

    // Then parse with serde for type safety
    let config: DepsToml = toml::from_str(content)
        .map_err(|e| toml_error(content, file, e.message(), e.span()))?;

    validate_config(&config)?;

    Ok(config)
}

fn toml_error(
    content: &str,
    file: &str,
    message: &str,
    span: Option<std::ops::Range<usize>>,
) -> OsgiError {
    let (line, column) = span
        .map(|span| line_column(content, span.start))
        .unwrap_or((0, 0));
    OsgiError::TomlParse {
        file: file.to_string(),
        message: message.trim().to_string(),
        line,
        column,
    }
}

/// 1-based line and column of a byte offset
pub(crate) fn line_column(content: &str, offset: usize) -> (usize, usize) {
    let prefix = &content[..offset.min(content.len())];
    let line = prefix.matches('\n').count() + 1;
    let column = prefix
        .rfind('\n')
        .map_or(prefix.len(), |newline| prefix.len() - newline - 1)
        + 1;
    (line, column)
}

/// Serialize DepsToml to TOML string
pub fn serialize_deps_toml(config: &DepsToml) -> ConfigResult<String> {
    toml::to_string_pretty(config).map_err(|e| OsgiError::ConfigValidation {
        field: "config".to_string(),
        reason: format!("TOML serialization error: {}", e),
    })
}

/// Validate configuration values
pub fn validate_config(config: &DepsToml) -> ConfigResult<()> {
    let resolver = &config.resolver;

    if let Some(dummy) = &resolver.dummy_version {
        if dummy.contains(DUMMY_VERSION_SENTINEL) {
            return Err(OsgiError::ConfigValidation {
                field: "resolver.dummy-version".to_string(),
                reason: "must not contain the sentinel it replaces".to_string(),
            });
        }
        Version::parse(dummy).map_err(|e| OsgiError::ConfigValidation {
            field: "resolver.dummy-version".to_string(),
            reason: e.to_string(),
        })?;
    }

    if resolver.ignored_cycles.iter().any(|name| name.trim().is_empty()) {
        return Err(OsgiError::ConfigValidation {
            field: "resolver.ignored-cycles".to_string(),
            reason: "names must not be empty".to_string(),
        });
    }

    if let Some(prefixes) = &resolver.platform_packages {
        if prefixes.iter().any(|prefix| prefix.trim().is_empty()) {
            return Err(OsgiError::ConfigValidation {
                field: "resolver.platform-packages".to_string(),
                reason: "prefixes must not be empty".to_string(),
            });
        }
    }

    if let Some(output_dir) = &resolver.output_dir {
        if output_dir.trim().is_empty() || Utf8Path::new(output_dir).is_absolute() {
            return Err(OsgiError::ConfigValidation {
                field: "resolver.output-dir".to_string(),
                reason: "must be a non-empty path relative to the plugin".to_string(),
            });
        }
    }

    Ok(())
}

/// Load and parse osgi-deps.toml from file path
pub fn load_from_file(path: &Utf8Path) -> ConfigResult<DepsToml> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| OsgiError::io(format!("Failed to read {}", path), e))?;
    parse_deps_toml(&content, path.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_config() {
        let config = parse_deps_toml("", "osgi-deps.toml").unwrap();
        assert_eq!(config, DepsToml::default());
        assert_eq!(config.resolver.to_options(), ResolverOptions::default());
    }

    #[test]
    fn test_parse_resolver_section() {
        let toml = r#"
[resolver]
ignored-cycles = ["org.legacy.a", "org.legacy.b"]
dummy-version = "4.2.0"
platform-packages = ["java.", "javax."]
output-dir = "bin"
"#;
        let config = parse_deps_toml(toml, "osgi-deps.toml").unwrap();
        let options = config.resolver.to_options();
        assert!(options.is_cycle_ignored("org.legacy.b"));
        assert_eq!(options.dummy_version.as_deref(), Some("4.2.0"));
        assert_eq!(options.platform_packages, vec!["java.", "javax."]);
        assert_eq!(options.output_dir, Utf8PathBuf::from("bin"));
    }

    #[test]
    fn test_syntax_error_has_position() {
        let toml = "[resolver]\nignored-cycles = [\"a\"\n";
        let err = parse_deps_toml(toml, "osgi-deps.toml").unwrap_err();
        match err {
            OsgiError::TomlParse { file, line, column, .. } => {
                assert_eq!(file, "osgi-deps.toml");
                assert!(line >= 2);
                assert!(column >= 1);
            },
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_type_error_has_position() {
        let toml = "[resolver]\ndummy-version = 3\n";
        let err = parse_deps_toml(toml, "osgi-deps.toml").unwrap_err();
        assert!(matches!(err, OsgiError::TomlParse { line: 2, .. }));
    }

    #[test]
    fn test_invalid_dummy_version() {
        let toml = "[resolver]\ndummy-version = \"not.a.version\"\n";
        let err = parse_deps_toml(toml, "osgi-deps.toml").unwrap_err();
        assert!(matches!(err, OsgiError::ConfigValidation { ref field, .. } if field == "resolver.dummy-version"));
    }

    #[test]
    fn test_absolute_output_dir_rejected() {
        let toml = "[resolver]\noutput-dir = \"/abs\"\n";
        assert!(parse_deps_toml(toml, "osgi-deps.toml").is_err());
    }

    #[test]
    fn test_round_trip_serialization() {
        let config = DepsToml {
            resolver: ResolverSection {
                ignored_cycles: vec!["org.legacy".to_string()],
                dummy_version: Some("1.0.0".to_string()),
                platform_packages: None,
                output_dir: Some("bin".to_string()),
            },
        };
        let serialized = serialize_deps_toml(&config).unwrap();
        let reparsed = parse_deps_toml(&serialized, "osgi-deps.toml").unwrap();
        assert_eq!(config, reparsed);
    }

    #[test]
    fn test_line_column() {
        let content = "a\nbc\ndef";
        assert_eq!(line_column(content, 0), (1, 1));
        assert_eq!(line_column(content, 3), (2, 2));
        assert_eq!(line_column(content, 5), (3, 1));
    }
}
