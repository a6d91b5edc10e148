// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{default_config_path, load_or_default, ConfigFile};
use crate::engine::{EventLoop, EventLoopOptions, RebuildCoordinator};
use crate::errors::{DevloopError, Result};
use crate::exec::backend::resolve_binary_name;
use crate::exec::CommandBackend;
use crate::fs::{FileSystem, RealFileSystem};
use crate::watch::{compute_watch_set, spawn_notify_watcher, PathFilter, WatchSet, WatchSetManager};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - project root + config resolution
/// - watch set computation and registration with `notify`
/// - the rebuild coordinator with the shell build backend
/// - the event loop
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let root = resolve_project_root(args.project.as_deref())?;

    let config_path = args
        .config
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(|| default_config_path(&root));
    let mut cfg = load_or_default(&config_path)?;
    apply_cli_overrides(&mut cfg, &args)?;
    let cfg = Arc::new(cfg);

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);

    if args.dry_run {
        let set = compute_watch_set(
            fs.as_ref(),
            &root,
            &cfg.watch.exclude_dirs,
            &cfg.watch.extra_files,
        )?;
        print_dry_run(&cfg, &root, &set);
        return Ok(());
    }

    // Without a notification backend nothing can be watched: fatal.
    let (registrar, streams) = spawn_notify_watcher()?;

    let mut watch_set = WatchSetManager::new(fs, root.clone(), &cfg.watch, registrar);
    let report = watch_set.refresh()?;
    if !report.failed.is_empty() {
        warn!(
            failed = report.failed.len(),
            "some paths could not be watched; continuing with the rest"
        );
    }
    info!(paths = report.registered, root = ?root, "watch set registered");

    let backend = CommandBackend::from_config(&cfg, &root);
    debug!(binary = backend.binary(), steps = ?backend.expanded_steps(), "build backend ready");

    let coordinator = RebuildCoordinator::new(
        root.clone(),
        backend,
        cfg.config.triggered_while_building,
    );

    let event_loop = EventLoop::new(
        PathFilter::from_config(&cfg),
        cfg.debounce(),
        coordinator,
        watch_set,
        streams,
        EventLoopOptions {
            initial_build: !args.no_initial_build,
        },
    );

    println!("[devloop] Running the project, and watching for changes...");
    event_loop.run(ctrl_c()).await
}

/// Resolve the project root to an absolute, canonical directory.
pub fn resolve_project_root(project: Option<&str>) -> Result<PathBuf> {
    let path = match project {
        Some(p) => PathBuf::from(p),
        None => std::env::current_dir()
            .map_err(|e| DevloopError::ProjectRoot(format!("current directory: {e}")))?,
    };

    let root = path
        .canonicalize()
        .map_err(|e| DevloopError::ProjectRoot(format!("{}: {e}", path.display())))?;

    if !root.is_dir() {
        return Err(DevloopError::ProjectRoot(format!(
            "{} is not a directory",
            root.display()
        )));
    }

    Ok(root)
}

/// Apply `--debounce-ms` and `--binary` on top of the loaded config.
pub fn apply_cli_overrides(cfg: &mut ConfigFile, args: &CliArgs) -> Result<()> {
    if let Some(ms) = args.debounce_ms {
        if ms == 0 {
            return Err(DevloopError::ConfigError(
                "--debounce-ms must be >= 1 (got 0)".to_string(),
            ));
        }
        cfg.watch.debounce_ms = ms;
    }

    if let Some(binary) = &args.binary {
        if binary.trim().is_empty() {
            return Err(DevloopError::ConfigError(
                "--binary must not be empty".to_string(),
            ));
        }
        cfg.run.binary = Some(binary.clone());
    }

    Ok(())
}

/// Resolves on Ctrl-C. If the signal handler cannot be installed, never
/// resolves: the session then ends only when the process is killed.
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}

/// Print the resolved configuration and watch set.
fn print_dry_run(cfg: &ConfigFile, root: &Path, set: &WatchSet) {
    println!("devloop dry-run");
    println!("  project = {}", root.display());
    println!(
        "  config.triggered_while_building = {:?}",
        cfg.config.triggered_while_building
    );
    println!("  watch.debounce_ms = {}", cfg.watch.debounce_ms);
    println!("  watch.exclude_dirs = {:?}", cfg.watch.exclude_dirs);
    println!("  watch.ignore_markers = {:?}", cfg.watch.ignore_markers);
    println!("  watch.ignore_suffixes = {:?}", cfg.watch.ignore_suffixes);
    println!("  watch.extensions = {:?}", cfg.watch.extensions);

    let backend = CommandBackend::from_config(cfg, root);
    println!("  run.binary = {}", resolve_binary_name(cfg, root));
    println!("  run.executable = {}", backend.executable(root).display());
    println!();

    println!("build steps ({}):", cfg.build.steps.len());
    for step in backend.expanded_steps() {
        println!("  - {step}");
    }
    println!();

    println!("watched directories ({}):", set.dirs.len());
    for dir in &set.dirs {
        println!("  - {}", dir.display());
    }
    if !set.files.is_empty() {
        println!("watched files ({}):", set.files.len());
        for file in &set.files {
            println!("  - {}", file.display());
        }
    }

    debug!("dry-run complete (nothing built)");
}
