//! Top-level CLI definition and dispatch.

use std::any::Any;
use std::io::{self, IsTerminal, Write};
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell as CompletionShell, generate};
use colored::{Colorize, control};
use serde_json::{Value, json};
use thiserror::Error;

use pycache_sweeper::core::config::{Config, LoggingConfig};
use pycache_sweeper::core::errors::SweepError;
use pycache_sweeper::core::paths;
use pycache_sweeper::logger::file::FileSink;
use pycache_sweeper::logger::record::{EventType, Level, LogRecord};
use pycache_sweeper::logger::sink::{ConsoleSink, EventSink, TeeSink};
use pycache_sweeper::orchestrator::signals::SignalHandler;
use pycache_sweeper::orchestrator::{Orchestrator, RunSummary};
use pycache_sweeper::scanner::protection;

/// pysweep: remove Python bytecode caches while staying out of system directories.
#[derive(Debug, Parser)]
#[command(
    name = "pysweep",
    author,
    version,
    about = "Python bytecode cache sweeper",
    long_about = None,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Force JSON output mode.
    #[arg(long, global = true)]
    json: bool,
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Log every event to the console, including skipped paths.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,
    /// Quiet mode (errors only).
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    /// Write the run log to this file instead of the configured one.
    #[arg(long, global = true, value_name = "PATH", conflicts_with = "no_log_file")]
    log_file: Option<PathBuf>,
    /// Do not write a log file.
    #[arg(long, global = true)]
    no_log_file: bool,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Remove __pycache__ directories and .pyc/.pyo files under the given roots.
    Sweep(SweepArgs),
    /// Report whether paths pass the system-path safety filter.
    CheckPath(CheckPathArgs),
    /// View configuration state.
    Config(ConfigArgs),
    /// Generate shell completions.
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Args, Default)]
struct SweepArgs {
    /// Roots to sweep. Defaults to `sweep.root_paths` from the config.
    #[arg(value_name = "ROOT")]
    roots: Vec<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct CheckPathArgs {
    /// Paths to check.
    #[arg(required = true, value_name = "PATH")]
    paths: Vec<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct ConfigArgs {
    #[command(subcommand)]
    command: Option<ConfigCommand>,
}

#[derive(Debug, Clone, Copy, Subcommand)]
enum ConfigCommand {
    /// Print the config file path.
    Path,
    /// Print the effective configuration.
    Show,
}

#[derive(Debug, Clone, Args)]
struct CompletionsArgs {
    /// Shell to generate completion script for.
    #[arg(value_enum)]
    shell: CompletionShell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Human,
    Json,
}

/// CLI error type with explicit exit-code mapping.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid user input or configuration.
    #[error("{0}")]
    User(String),
    /// Environment/runtime failure.
    #[error("{0}")]
    Runtime(String),
    /// Internal bug or invariant violation.
    #[error("{0}")]
    Internal(String),
    /// The sweep finished but some removals failed.
    #[error("{0}")]
    Partial(String),
    /// Stopped by SIGINT/SIGTERM.
    #[error("{0}")]
    Interrupted(String),
    /// JSON serialization failed.
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
    /// Output write failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::User(_) => 1,
            Self::Runtime(_) | Self::Io(_) => 2,
            Self::Internal(_) | Self::Json(_) => 3,
            Self::Partial(_) => 4,
            Self::Interrupted(_) => 130,
        }
    }
}

impl From<SweepError> for CliError {
    fn from(err: SweepError) -> Self {
        match err {
            SweepError::InvalidConfig { .. }
            | SweepError::MissingConfig { .. }
            | SweepError::ConfigParse { .. } => Self::User(err.to_string()),
            SweepError::Interrupted => Self::Interrupted(err.to_string()),
            SweepError::Serialization { .. } | SweepError::Unexpected { .. } => {
                Self::Internal(err.to_string())
            }
            SweepError::Deletion { .. } | SweepError::Traversal { .. } | SweepError::Io { .. } => {
                Self::Runtime(err.to_string())
            }
        }
    }
}

/// Dispatch CLI commands.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.no_color {
        control::set_override(false);
    }

    match &cli.command {
        Command::Sweep(args) => run_sweep(cli, args),
        Command::CheckPath(args) => run_check_path(cli, args),
        Command::Config(args) => run_config(cli, args),
        Command::Completions(args) => {
            let mut command = Cli::command();
            let binary_name = command.get_name().to_string();
            generate(args.shell, &mut command, binary_name, &mut io::stdout());
            Ok(())
        }
    }
}

// ──────────────────── sweep ────────────────────

fn run_sweep(cli: &Cli, args: &SweepArgs) -> Result<(), CliError> {
    let mut config = Config::load(cli.config.as_deref())?;
    apply_log_flags(cli, &mut config.logging);

    let requested = if args.roots.is_empty() {
        config.sweep.root_paths.clone()
    } else {
        args.roots.clone()
    };
    let roots = paths::resolve_roots(&requested);

    let (sink, log_label) = build_sink(cli, &config.logging);
    let handler = SignalHandler::new();
    let cancel = || handler.is_interrupted();

    let summary = guarded(&sink, &log_label, || {
        Orchestrator::new(&sink)
            .with_cancel_check(&cancel)
            .run(&roots)
    })?;
    sink.flush();

    match output_mode(cli) {
        OutputMode::Human => print_summary_human(&summary, &log_label),
        OutputMode::Json => {
            let payload = json!({
                "command": "sweep",
                "log_file": log_label,
                "summary": serde_json::to_value(&summary)?,
            });
            write_json_line(&payload)?;
        }
    }

    sweep_exit(&summary, &log_label)
}

fn apply_log_flags(cli: &Cli, logging: &mut LoggingConfig) {
    if let Some(path) = &cli.log_file {
        logging.file.clone_from(path);
        logging.file_enabled = true;
    }
    if cli.no_log_file {
        logging.file_enabled = false;
    }
}

/// Run `f`, turning a panic into a logged `unexpected_failure` record and an
/// internal error that points the user at the log.
fn guarded<T>(
    sink: &dyn EventSink,
    log_label: &str,
    f: impl FnOnce() -> T,
) -> Result<T, CliError> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => Ok(value),
        Err(payload) => {
            let err = SweepError::Unexpected {
                details: panic_message(&*payload),
            };
            sink.emit(
                &LogRecord::new(EventType::UnexpectedFailure, Level::Error, err.to_string())
                    .with_error_code(err.code()),
            );
            sink.flush();
            Err(CliError::Internal(format!(
                "An unexpected error occurred. Check {log_label} for details."
            )))
        }
    }
}

/// Build the tee of file and console sinks. Returns the sink and the place
/// the user should look for details.
fn build_sink(cli: &Cli, logging: &LoggingConfig) -> (TeeSink, String) {
    let mut tee = TeeSink::new();
    let mut label = "the console output".to_string();

    if logging.file_enabled {
        let file = FileSink::open(logging.file_config());
        label = file
            .active_path()
            .map_or_else(|| "stderr".to_string(), |p| p.display().to_string());
        tee = tee.with(file);
    }
    if logging.console || cli.verbose {
        tee = tee.with(ConsoleSink::new(console_level(
            cli.verbose,
            cli.quiet,
            logging.console_level,
        )));
    }
    (tee, label)
}

const fn console_level(verbose: bool, quiet: bool, configured: Level) -> Level {
    if verbose {
        Level::Debug
    } else if quiet {
        Level::Error
    } else {
        configured
    }
}

fn sweep_exit(summary: &RunSummary, log_label: &str) -> Result<(), CliError> {
    if summary.interrupted {
        return Err(SweepError::Interrupted.into());
    }
    if summary.total_errors > 0 {
        return Err(CliError::Partial(format!(
            "{} item(s) could not be removed. Check {log_label} for details.",
            summary.total_errors
        )));
    }
    Ok(())
}

fn print_summary_human(summary: &RunSummary, log_label: &str) {
    for root in &summary.skipped_roots {
        println!("  {} {}", "skipped".yellow(), root.display());
    }
    for report in &summary.reports {
        let errors = if report.errors > 0 {
            report.errors.to_string().red().to_string()
        } else {
            report.errors.to_string()
        };
        println!(
            "  {}: removed {}, errors {errors} ({:.2}s)",
            report.root.display(),
            report.removed.to_string().green(),
            report.elapsed.as_secs_f64()
        );
    }
    let closing = closing_line(summary, log_label);
    if summary.interrupted {
        println!("{}", closing.yellow().bold());
    } else {
        println!("{closing}");
    }
}

fn closing_line(summary: &RunSummary, log_label: &str) -> String {
    if summary.interrupted {
        format!("Cleanup interrupted by user. Check {log_label} for details.")
    } else {
        format!(
            "Cleanup completed. Removed {} items. Errors: {}. Check {log_label} for details.",
            summary.total_removed, summary.total_errors
        )
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "panic with non-string payload".to_string())
}

// ──────────────────── check-path ────────────────────

fn run_check_path(cli: &Cli, args: &CheckPathArgs) -> Result<(), CliError> {
    let results: Vec<(PathBuf, Option<&'static str>)> = args
        .paths
        .iter()
        .map(|raw| {
            let path = paths::resolve_root(raw);
            let term = protection::denied_term(&path);
            (path, term)
        })
        .collect();

    match output_mode(cli) {
        OutputMode::Human => {
            for (path, term) in &results {
                match term {
                    None => println!("{} {}", "safe  ".green(), path.display()),
                    Some(term) => println!(
                        "{} {} (matches {term:?})",
                        "denied".red().bold(),
                        path.display()
                    ),
                }
            }
        }
        OutputMode::Json => {
            let entries: Vec<Value> = results
                .iter()
                .map(|(path, term)| {
                    json!({
                        "path": path.to_string_lossy(),
                        "safe": term.is_none(),
                        "matched_term": term,
                    })
                })
                .collect();
            write_json_line(&json!({
                "command": "check-path",
                "results": entries,
            }))?;
        }
    }
    Ok(())
}

// ──────────────────── config ────────────────────

fn run_config(cli: &Cli, args: &ConfigArgs) -> Result<(), CliError> {
    match args.command {
        None | Some(ConfigCommand::Path) => {
            let path = cli.config.clone().unwrap_or_else(Config::default_path);
            let exists = path.exists();

            match output_mode(cli) {
                OutputMode::Human => {
                    println!("{}", path.display());
                    if !exists {
                        println!("  (file does not exist; defaults will be used)");
                    }
                }
                OutputMode::Json => {
                    let payload = json!({
                        "command": "config path",
                        "path": path.to_string_lossy(),
                        "exists": exists,
                    });
                    write_json_line(&payload)?;
                }
            }
            Ok(())
        }
        Some(ConfigCommand::Show) => {
            let mut config = Config::load(cli.config.as_deref())?;
            apply_log_flags(cli, &mut config.logging);
            let hash = config.stable_hash()?;

            match output_mode(cli) {
                OutputMode::Human => {
                    println!("# hash: {hash}");
                    println!("{}", config.to_toml_string()?);
                }
                OutputMode::Json => {
                    let payload = json!({
                        "command": "config show",
                        "hash": hash,
                        "config": serde_json::to_value(&config)?,
                    });
                    write_json_line(&payload)?;
                }
            }
            Ok(())
        }
    }
}

// ──────────────────── output ────────────────────

fn write_json_line(payload: &Value) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, payload)?;
    writeln!(stdout)?;
    Ok(())
}

fn output_mode(cli: &Cli) -> OutputMode {
    let env_mode = std::env::var("PYSWEEP_OUTPUT_FORMAT").ok();
    resolve_output_mode(cli.json, env_mode.as_deref(), io::stdout().is_terminal())
}

fn resolve_output_mode(json_flag: bool, env_mode: Option<&str>, stdout_is_tty: bool) -> OutputMode {
    if json_flag {
        return OutputMode::Json;
    }

    match env_mode
        .map(str::trim)
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("json") => OutputMode::Json,
        Some("human") => OutputMode::Human,
        _ if stdout_is_tty => OutputMode::Human,
        _ => OutputMode::Json,
    }
}
