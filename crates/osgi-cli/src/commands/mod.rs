//! Command implementations and dispatch logic.
//!
//! A parsed command is split into its [`CommandKind`] tag and a flat
//! [`Invocation`]; the tag selects the handler from [`HANDLERS`].

use std::process::ExitCode;

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use osgi_config::{CliOverrides, ConfigLoader, PlatformDescription};
use osgi_resolver::{ClasspathProjector, DependencyGraph, PlatformState, PluginId, ResolverOptions};
use tracing::{debug, info};

use crate::output::OutputHandler;
use crate::{Commands, PlatformArgs, PluginArgs};

#[cfg(test)]
mod tests;

/// Shared context for all commands
pub struct CommandContext {
    pub cwd: Utf8PathBuf,
    pub output: OutputHandler,
    pub options: ResolverOptions,
}

impl CommandContext {
    /// Context for the current directory with layered configuration
    pub fn new(config: Option<&Utf8Path>, overrides: CliOverrides) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;
        let cwd = Utf8PathBuf::try_from(cwd).context("Current directory is not valid UTF-8")?;
        let options = ConfigLoader::new(cwd.clone())
            .load_resolver_options(config, overrides)
            .context("Failed to load configuration")?;
        Ok(Self::with_options(cwd, options))
    }

    pub fn with_options(cwd: Utf8PathBuf, options: ResolverOptions) -> Self {
        Self {
            cwd,
            output: OutputHandler::new(),
            options,
        }
    }

    /// Load a platform description and run the full resolution on it
    pub fn load_platform(&self, path: &Utf8Path) -> Result<PlatformState> {
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        };
        let description = PlatformDescription::load(&path)
            .with_context(|| format!("Failed to load platform description {}", path))?;
        let mut state = description
            .into_state(self.options.clone())
            .with_context(|| format!("Invalid platform description {}", path))?;
        state.compute_all_dependencies_recursive();
        info!(
            plugins = state.plugin_count(),
            errors = state.error_count(),
            warnings = state.warning_count(),
            "Platform resolved"
        );
        Ok(state)
    }
}

/// Outcome of a command that ran to completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    /// The run finished but the platform has errors
    Failure,
}

impl From<Status> for ExitCode {
    fn from(status: Status) -> Self {
        match status {
            Status::Success => ExitCode::SUCCESS,
            Status::Failure => ExitCode::FAILURE,
        }
    }
}

/// Command tag used to select a handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Check,
    Deps,
    Dependents,
    Classpath,
    Order,
    Version,
}

/// Arguments of any command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    pub platform: Option<Utf8PathBuf>,
    pub plugin: Option<String>,
    pub version: Option<String>,
    pub run: bool,
}

impl Invocation {
    fn for_platform(args: PlatformArgs) -> Self {
        Self {
            platform: Some(args.platform),
            ..Self::default()
        }
    }

    fn for_plugin(args: PluginArgs) -> Self {
        Self {
            platform: Some(args.platform),
            plugin: Some(args.plugin),
            version: args.plugin_version,
            run: false,
        }
    }

    fn platform(&self) -> Result<&Utf8Path> {
        self.platform.as_deref().context("Missing platform description argument")
    }

    fn plugin(&self, state: &PlatformState) -> Result<PluginId> {
        let name = self.plugin.as_deref().context("Missing plugin argument")?;
        let id = state.require_plugin(name, self.version.as_deref().unwrap_or(""))?;
        Ok(id)
    }
}

impl Commands {
    pub fn into_invocation(self) -> (CommandKind, Invocation) {
        match self {
            Commands::Check(args) => (CommandKind::Check, Invocation::for_platform(args)),
            Commands::Deps(args) => (CommandKind::Deps, Invocation::for_plugin(args)),
            Commands::Dependents(args) => (CommandKind::Dependents, Invocation::for_plugin(args)),
            Commands::Classpath { target, run } => (
                CommandKind::Classpath,
                Invocation {
                    run,
                    ..Invocation::for_plugin(target)
                },
            ),
            Commands::Order(args) => (CommandKind::Order, Invocation::for_platform(args)),
            Commands::Version => (CommandKind::Version, Invocation::default()),
        }
    }
}

type Handler = fn(&Invocation, &CommandContext) -> Result<Status>;

/// Handler for every command kind
pub const HANDLERS: &[(CommandKind, Handler)] = &[
    (CommandKind::Check, check as Handler),
    (CommandKind::Deps, deps as Handler),
    (CommandKind::Dependents, dependents as Handler),
    (CommandKind::Classpath, classpath as Handler),
    (CommandKind::Order, order as Handler),
    (CommandKind::Version, show_version as Handler),
];

/// Dispatch a command to its handler
pub fn dispatch_command(command: Commands, ctx: &CommandContext) -> Result<Status> {
    let (kind, invocation) = command.into_invocation();
    let handler = HANDLERS
        .iter()
        .find(|(candidate, _)| *candidate == kind)
        .map(|(_, handler)| *handler)
        .with_context(|| format!("No handler registered for {:?}", kind))?;
    debug!(?kind, "Dispatching command");
    handler(&invocation, ctx)
}

/// Print every problem; fails when any error was logged
fn check(invocation: &Invocation, ctx: &CommandContext) -> Result<Status> {
    let state = ctx.load_platform(invocation.platform()?)?;

    for problem in state.problems() {
        ctx.output.problem(&state.element_name(problem.owner()), problem);
    }

    let summary = format!(
        "{} plugins, {} features: {} errors, {} warnings",
        state.plugin_count(),
        state.feature_count(),
        state.error_count(),
        state.warning_count()
    );
    if state.has_errors() {
        ctx.output.warn(&summary);
        Ok(Status::Failure)
    } else {
        ctx.output.success(&summary);
        Ok(Status::Success)
    }
}

fn deps(invocation: &Invocation, ctx: &CommandContext) -> Result<Status> {
    let state = ctx.load_platform(invocation.platform()?)?;
    let id = invocation.plugin(&state)?;
    let plugin = state.plugin(id);

    ctx.output.heading(&plugin.label());
    for dependency in plugin.recursive_resolved_plugins().into_iter().flatten() {
        ctx.output.line(&state.plugin(*dependency).label());
    }
    if !plugin.imported_packages().is_empty() {
        ctx.output.heading("Imported packages");
        for &package in plugin.imported_packages() {
            ctx.output.line(&format!(
                "{} from {}",
                state.package(package).label(),
                state.exporter_names(package).join(", ")
            ));
        }
    }
    for problem in plugin.log().iter() {
        ctx.output.warn(&problem.log_message());
    }
    Ok(Status::Success)
}

fn dependents(invocation: &Invocation, ctx: &CommandContext) -> Result<Status> {
    let state = ctx.load_platform(invocation.platform()?)?;
    let id = invocation.plugin(&state)?;

    ctx.output.heading(&state.plugin(id).label());
    for dependent in state.dependents_of(id) {
        ctx.output.line(&state.plugin(dependent).label());
    }
    Ok(Status::Success)
}

fn classpath(invocation: &Invocation, ctx: &CommandContext) -> Result<Status> {
    let state = ctx.load_platform(invocation.platform()?)?;
    let id = invocation.plugin(&state)?;

    let projector = ClasspathProjector::new(&state);
    let entries = if invocation.run {
        projector.run_classpath(id)
    } else {
        projector.compile_classpath(id)
    };
    for entry in entries {
        ctx.output.line(entry.as_str());
    }
    Ok(Status::Success)
}

/// Build order; members of a cycle are printed as one bracketed group
fn order(invocation: &Invocation, ctx: &CommandContext) -> Result<Status> {
    let state = ctx.load_platform(invocation.platform()?)?;
    let graph = DependencyGraph::from_state(&state);

    for group in graph.build_groups() {
        let names: Vec<&str> = group.iter().map(|id| state.plugin(*id).name()).collect();
        if names.len() == 1 {
            ctx.output.line(names[0]);
        } else {
            ctx.output.line(&format!("[{}]", names.join(", ")));
        }
    }
    for cycle in graph.cycles() {
        ctx.output
            .warn(&format!("cycle: {}", DependencyGraph::format_cycle(&state, &cycle)));
    }
    Ok(Status::Success)
}

fn show_version(_invocation: &Invocation, ctx: &CommandContext) -> Result<Status> {
    let target = format!("{}-{}", std::env::consts::ARCH, std::env::consts::OS);

    ctx.output.line(&format!("osgi-deps v{}", env!("CARGO_PKG_VERSION")));
    ctx.output.line(&format!("Built: {}", env!("OSGI_DEPS_BUILD_DATE")));
    ctx.output.line(&format!("Target: {}", target));
    ctx.output.line(&format!("Rust: {}", env!("OSGI_DEPS_RUSTC_VERSION")));
    Ok(Status::Success)
}
