//! CLI entry point for hotloop.
//!
//! Watches a project's source tree, recompiles on change, and keeps one
//! worker process running the latest successful build.
//!
//! # Usage
//!
//! ```bash
//! hotloop [OPTIONS] <COMMAND>
//!
//! # Run the development loop on port 9000
//! hotloop dev --port 9000
//!
//! # Compile once without starting a worker
//! hotloop -C path/to/project build
//!
//! # Download declared dependencies and show the outcome
//! hotloop deps
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use color_eyre::Section;
use color_eyre::eyre::{WrapErr, eyre};
use hl_core::{BuildResult, ProjectConfig};
use hl_deps::{FailureCategory, Resolutions, Resolver, registry};
use hl_orchestrator::{Orchestrator, OrchestratorError};
use hl_watcher::{FileWatcher, SourceFilter};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// CLI ARGUMENT TYPES
// =============================================================================

/// Development loop for JVM services: watch, compile, restart.
#[derive(Parser)]
#[command(name = "hotloop", version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    command: Commands,

    /// Project root containing `hotloop.json`.
    #[arg(short = 'C', long, global = true, default_value = ".", env = "HOTLOOP_PROJECT")]
    project: Utf8PathBuf,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Watch sources, rebuild on change, and keep the worker running.
    Dev {
        /// Port passed to the worker (overrides the descriptor).
        #[arg(short, long, env = "HOTLOOP_PORT")]
        port: Option<u16>,
    },

    /// Compile once without starting a worker.
    Build,

    /// Resolve and cache declared dependencies.
    Deps {
        /// Print the cached classpath instead of resolving.
        #[arg(long)]
        list: bool,
    },
}

// =============================================================================
// INITIALIZATION FUNCTIONS
// =============================================================================

/// Initializes the tracing subscriber for logging.
///
/// Respects the `RUST_LOG` environment variable if set. Otherwise, uses
/// `debug` level if `--verbose` is set, or `info` level by default.
/// Noisy crates are filtered to `warn` level.
fn init_tracing(verbose: bool, no_color: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { "info" };
        EnvFilter::new(format!("{level},hyper=warn,hyper_util=warn,reqwest=warn,mio=warn,notify=warn"))
    });

    let use_ansi = !no_color && std::env::var("NO_COLOR").is_err();

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_ansi(use_ansi))
        .with(filter)
        .init();
}

/// Canonicalizes the project root.
fn project_root(path: &Utf8Path) -> color_eyre::Result<Utf8PathBuf> {
    if !path.is_dir() {
        return Err(eyre!("Project directory does not exist: {path}"));
    }
    path.canonicalize_utf8()
        .wrap_err_with(|| format!("Failed to resolve project directory: {path}"))
}

fn load_config(project_root: &Utf8Path) -> color_eyre::Result<ProjectConfig> {
    ProjectConfig::load(project_root).map_err(|e| with_hint(e.into()))
}

/// Converts a fatal startup error into a report carrying its hint.
fn with_hint(error: OrchestratorError) -> color_eyre::Report {
    let hint = error.hint();
    let report = color_eyre::Report::new(error);
    match hint {
        Some(hint) => report.suggestion(hint),
        None => report,
    }
}

/// Cancels `token` on Ctrl-C, or SIGTERM on Unix.
fn spawn_signal_handler(token: CancellationToken) {
    tokio::spawn(async move {
        wait_for_signal().await;
        info!("Shutting down");
        token.cancel();
    });
}

async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => info!("Received SIGTERM"),
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

/// Runs the development loop until interrupted.
async fn run_dev(project_root: Utf8PathBuf, port: Option<u16>) -> color_eyre::Result<()> {
    let config = load_config(&project_root)?;

    let source_root = config.source_root(&project_root);
    let watch_root = source_root
        .canonicalize_utf8()
        .wrap_err_with(|| format!("Source directory not found: {source_root}"))
        .suggestion("create it, or set sourceDir in hotloop.json")?;
    let watch_config = config.watch.clone();

    let mut orchestrator = Orchestrator::prepare(project_root, config, port)
        .await
        .map_err(with_hint)?;

    let filter = SourceFilter::new(&watch_root, &watch_config.source_extension);
    let mut watcher = FileWatcher::new(&watch_root, &watch_config, filter)
        .await
        .wrap_err("Failed to start file watcher")?;
    info!(
        watch_root = %watcher.watch_path(),
        port = orchestrator.port(),
        unresolved = orchestrator.unresolved().len(),
        "Watching for changes"
    );

    let shutdown = CancellationToken::new();
    spawn_signal_handler(shutdown.clone());

    orchestrator.run(watcher.events(), shutdown).await;

    if let Err(e) = watcher.shutdown().await {
        warn!(error = %e, "File watcher did not shut down cleanly");
    }
    Ok(())
}

/// Resolves, locates, and compiles once.
async fn run_build(project_root: Utf8PathBuf) -> color_eyre::Result<()> {
    let config = load_config(&project_root)?;
    let orchestrator = Orchestrator::prepare(project_root, config, None)
        .await
        .map_err(with_hint)?;

    match orchestrator.build_once().await {
        BuildResult::Success => {
            info!(source_root = %orchestrator.source_root(), "Build finished");
            Ok(())
        }
        BuildResult::Failure(failure) => Err(eyre!("Build failed ({:?})", failure.kind)),
    }
}

/// Resolves declared dependencies, or lists the cache with `--list`.
async fn run_deps(project_root: &Utf8Path, list: bool) -> color_eyre::Result<()> {
    let config = load_config(project_root)?;
    let resolver =
        Resolver::from_config(project_root, &config).map_err(|e| with_hint(e.into()))?;

    if list {
        print_classpath(&resolver.cache().classpath());
        return Ok(());
    }

    let resolutions = resolver.resolve(&config.dependencies).await;
    print_resolutions(&resolutions);

    if resolutions.failed_count() > 0 {
        return Err(eyre!(
            "{} of {} dependencies could not be resolved",
            resolutions.failed_count(),
            resolutions.len()
        ));
    }
    Ok(())
}

// =============================================================================
// OUTPUT HELPERS
// =============================================================================

/// Prints one line per dependency with its outcome.
fn print_resolutions(resolutions: &Resolutions) {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();

    if resolutions.is_empty() {
        let _ = writeln!(handle, "No dependencies declared");
        return;
    }

    let width = resolutions
        .iter()
        .map(|r| r.spec.to_string().len())
        .max()
        .unwrap_or_default();

    for resolution in resolutions {
        let spec = resolution.spec.to_string();
        let _ = match &resolution.result {
            Ok(artifact) => writeln!(handle, "  ok      {spec:<width$}  {}", artifact.path),
            Err(e) => writeln!(handle, "  failed  {spec:<width$}  {e}"),
        };
    }

    let _ = writeln!(handle);
    let _ = writeln!(
        handle,
        "Resolved: {}  Failed: {}",
        resolutions.resolved_count(),
        resolutions.failed_count()
    );

    if resolutions
        .failures()
        .any(|(_, e)| e.category() == FailureCategory::UnknownDependency)
    {
        let known: Vec<&str> = registry::known_names().collect();
        let _ = writeln!(handle, "Known dependencies: {}", known.join(", "));
    }
}

/// Prints the cached jars, one per line.
fn print_classpath(classpath: &[Utf8PathBuf]) {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();

    if classpath.is_empty() {
        let _ = writeln!(handle, "Cache is empty");
        return;
    }
    for path in classpath {
        let _ = writeln!(handle, "{path}");
    }
}

// =============================================================================
// MAIN ENTRY POINT
// =============================================================================

/// Application entry point.
#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    // 1. Install color-eyre FIRST (before any potential panics)
    color_eyre::install()?;

    // 2. Parse CLI arguments
    let cli = Cli::parse();

    // 3. Initialize tracing (handles --no-color for log output)
    init_tracing(cli.verbose, cli.no_color);

    // 4. Route to appropriate command
    let project_root = project_root(&cli.project)?;
    match cli.command {
        Commands::Dev { port } => run_dev(project_root, port).await,
        Commands::Build => run_build(project_root).await,
        Commands::Deps { list } => run_deps(&project_root, list).await,
    }
}
