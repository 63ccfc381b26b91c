//! # osgi-deps
//!
//! Resolves the dependencies of an OSGi platform description and reports
//! problems, dependency sets, classpaths and build order.
//!
//! This is the entry point of the CLI. It parses arguments, sets up logging
//! and dispatches to the command handlers.

use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::CommandContext;
use output::errors::ErrorFormatter;

/// OSGi bundle dependency resolver
#[derive(Parser, Debug)]
#[command(name = "osgi-deps", version, about = "OSGi bundle dependency resolver")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file used instead of the nearest osgi-deps.toml
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Report cycles involving NAME as warnings (repeatable)
    #[arg(long = "ignore-cycle", global = true, value_name = "NAME")]
    pub ignore_cycles: Vec<String>,

    /// Version substituted for ${dummy.version}
    #[arg(long, global = true, value_name = "VERSION")]
    pub dummy_version: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve a platform and print every problem
    Check(PlatformArgs),
    /// Print the recursive dependencies of a plugin
    Deps(PluginArgs),
    /// Print the plugins depending on a plugin
    Dependents(PluginArgs),
    /// Print the classpath of a plugin
    Classpath {
        #[command(flatten)]
        target: PluginArgs,
        /// Runtime classpath instead of the compile classpath
        #[arg(long)]
        run: bool,
    },
    /// Print plugins in build order, dependencies first
    Order(PlatformArgs),
    /// Show version information
    Version,
}

#[derive(Args, Debug, Clone)]
pub struct PlatformArgs {
    /// Platform description (.json or .toml)
    pub platform: Utf8PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct PluginArgs {
    /// Platform description (.json or .toml)
    pub platform: Utf8PathBuf,
    /// Plugin symbolic name
    pub plugin: String,
    /// Plugin version, highest registered when omitted
    #[arg(long, value_name = "VERSION")]
    pub plugin_version: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.log_json);
    setup_panic_handler();

    info!("Starting osgi-deps v{}", env!("CARGO_PKG_VERSION"));

    let formatter = if cli.log_json {
        ErrorFormatter::plain()
    } else {
        ErrorFormatter::new()
    };
    match run_cli(cli) {
        Ok(status) => status.into(),
        Err(err) => {
            eprintln!("{}", formatter.format_error(&err));
            ExitCode::FAILURE
        },
    }
}

fn run_cli(cli: Cli) -> anyhow::Result<commands::Status> {
    let overrides = osgi_config::CliOverrides {
        ignored_cycles: cli.ignore_cycles,
        dummy_version: cli.dummy_version,
        output_dir: None,
    };
    let ctx = CommandContext::new(cli.config.as_deref(), overrides)?;
    commands::dispatch_command(cli.command, &ctx)
}

fn setup_logging(verbose: bool, json: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "osgi_deps={level},osgi_resolver={level},osgi_config={level}"
        ))
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|panic_info| {
        error!("osgi-deps encountered an unexpected error: {}", panic_info);
        eprintln!("osgi-deps crashed! This is a bug.");
        eprintln!("Error: {}", panic_info);
    }));
}
