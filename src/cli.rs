// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `devloop`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "devloop",
    version,
    about = "Rebuild and restart a project whenever its sources change.",
    long_about = None
)]
pub struct CliArgs {
    /// Project root to watch and build.
    ///
    /// Default: the current working directory.
    #[arg(long, value_name = "PATH")]
    pub project: Option<String>,

    /// Path to the config file (TOML).
    ///
    /// Default: `Devloop.toml` in the project root. A missing file means
    /// built-in defaults.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Name of the built executable (overrides `[run].binary`).
    #[arg(long, value_name = "NAME")]
    pub binary: Option<String>,

    /// Quiescence window in milliseconds (overrides `[watch].debounce_ms`).
    #[arg(long, value_name = "MS")]
    pub debounce_ms: Option<u64>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `DEVLOOP_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Do not build and start the project before the first change.
    #[arg(long)]
    pub no_initial_build: bool,

    /// Resolve config and watch set, print them, but don't build or run.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
