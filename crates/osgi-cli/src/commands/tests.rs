//! Unit tests for CLI commands.

use super::*;
use crate::Cli;
use clap::Parser;
use osgi_core::OsgiError;
use tempfile::TempDir;

const PLATFORM: &str = r#"
[[plugins]]
name = "org.acme.core"
version = "1.0.0"
path = "/platform/org.acme.core_1.0.0.jar"
export-package = "org.acme.core"

[[plugins]]
name = "org.acme.ui"
version = "1.0.0"
path = "/platform/org.acme.ui_1.0.0.jar"
import-package = "org.acme.core"
"#;

/// Create a test command context with a platform file in a temporary directory
fn create_test_context(temp_dir: &TempDir, platform: &str) -> CommandContext {
    let cwd = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
    std::fs::write(cwd.join("platform.toml"), platform).unwrap();
    CommandContext::with_options(cwd, ResolverOptions::default())
}

fn invocation(plugin: Option<&str>) -> Invocation {
    Invocation {
        platform: Some(Utf8PathBuf::from("platform.toml")),
        plugin: plugin.map(str::to_string),
        ..Invocation::default()
    }
}

#[test]
fn test_every_command_kind_has_a_handler() {
    for kind in [
        CommandKind::Check,
        CommandKind::Deps,
        CommandKind::Dependents,
        CommandKind::Classpath,
        CommandKind::Order,
        CommandKind::Version,
    ] {
        assert_eq!(
            HANDLERS.iter().filter(|(candidate, _)| *candidate == kind).count(),
            1,
            "{:?}",
            kind
        );
    }
}

#[test]
fn test_parse_classpath_command() {
    let cli = Cli::try_parse_from([
        "osgi-deps",
        "--ignore-cycle",
        "org.a",
        "--ignore-cycle",
        "org.b",
        "classpath",
        "platform.json",
        "org.acme.ui",
        "--run",
        "--plugin-version",
        "1.0.0",
    ])
    .unwrap();
    assert_eq!(cli.ignore_cycles, vec!["org.a", "org.b"]);

    let (kind, invocation) = cli.command.into_invocation();
    assert_eq!(kind, CommandKind::Classpath);
    assert!(invocation.run);
    assert_eq!(invocation.plugin.as_deref(), Some("org.acme.ui"));
    assert_eq!(invocation.version.as_deref(), Some("1.0.0"));
}

#[test]
fn test_check_succeeds_on_clean_platform() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_test_context(&temp_dir, PLATFORM);
    assert_eq!(check(&invocation(None), &ctx).unwrap(), Status::Success);
}

#[test]
fn test_check_fails_on_errors() {
    let temp_dir = TempDir::new().unwrap();
    let platform = format!("{}require-bundle = \"org.acme.missing\"\n", PLATFORM);
    let ctx = create_test_context(&temp_dir, &platform);
    assert_eq!(check(&invocation(None), &ctx).unwrap(), Status::Failure);
}

#[test]
fn test_unknown_plugin_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_test_context(&temp_dir, PLATFORM);
    let err = deps(&invocation(Some("org.acme.nope")), &ctx).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<OsgiError>(),
        Some(OsgiError::UnknownElement { .. })
    ));
}

#[test]
fn test_plugin_commands_run() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_test_context(&temp_dir, PLATFORM);

    assert_eq!(deps(&invocation(Some("org.acme.ui")), &ctx).unwrap(), Status::Success);
    assert_eq!(dependents(&invocation(Some("org.acme.core")), &ctx).unwrap(), Status::Success);
    assert_eq!(classpath(&invocation(Some("org.acme.ui")), &ctx).unwrap(), Status::Success);
    assert_eq!(order(&invocation(None), &ctx).unwrap(), Status::Success);
}

#[test]
fn test_missing_platform_file() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_test_context(&temp_dir, PLATFORM);
    let missing = Invocation {
        platform: Some(Utf8PathBuf::from("absent.json")),
        ..Invocation::default()
    };
    let err = check(&missing, &ctx).unwrap_err();
    assert!(err.to_string().contains("absent.json"));
}

#[test]
fn test_dispatch_version() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_test_context(&temp_dir, PLATFORM);
    assert_eq!(dispatch_command(Commands::Version, &ctx).unwrap(), Status::Success);
}
