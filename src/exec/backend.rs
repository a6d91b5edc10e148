// src/exec/backend.rs

//! Pluggable build/start backend.
//!
//! The rebuild coordinator talks to a `ProjectBackend` instead of spawning
//! commands itself, so tests can swap in a fake that scripts build results
//! and counts live processes.
//!
//! - [`CommandBackend`] is the production implementation. It runs the
//!   configured build steps through the platform shell and launches the
//!   artifact with [`ProcessHandle::start`].

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::process::Command;
use tracing::{debug, error, info};

use crate::config::ConfigFile;
use crate::exec::process::{artifact_path, executable_name, ProcessHandle};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Outcome of one build for the coordinator. Only success matters; the exit
/// code is carried for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    Success,
    Failed(i32),
}

impl BuildOutcome {
    pub fn is_success(self) -> bool {
        matches!(self, BuildOutcome::Success)
    }
}

/// The two operations the supervisor consumes from the outside world.
pub trait ProjectBackend: Send + Sync + 'static {
    /// Compile/bundle the project. May take arbitrary time.
    fn build<'a>(&'a self, project: &'a Path) -> BoxFuture<'a, BuildOutcome>;

    /// Launch the already-built artifact without waiting for it to exit.
    fn start<'a>(&'a self, project: &'a Path) -> BoxFuture<'a, Result<ProcessHandle>>;
}

/// Runs shell build steps and starts `<artifact_dir>/<binary>`.
#[derive(Debug, Clone)]
pub struct CommandBackend {
    steps: Vec<String>,
    binary: String,
    artifact_dir: String,
}

impl CommandBackend {
    pub fn new(steps: Vec<String>, binary: impl Into<String>, artifact_dir: impl Into<String>) -> Self {
        Self {
            steps,
            binary: binary.into(),
            artifact_dir: artifact_dir.into(),
        }
    }

    /// Build from config. The binary name defaults to the project
    /// directory's base name.
    pub fn from_config(cfg: &ConfigFile, project: &Path) -> Self {
        Self::new(
            cfg.build.steps.clone(),
            resolve_binary_name(cfg, project),
            cfg.run.artifact_dir.clone(),
        )
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    pub fn steps(&self) -> &[String] {
        &self.steps
    }

    /// Build steps with `{name}` replaced by the platform executable name.
    pub fn expanded_steps(&self) -> Vec<String> {
        let name = executable_name(&self.binary);
        self.steps.iter().map(|s| s.replace("{name}", &name)).collect()
    }

    pub fn executable(&self, project: &Path) -> PathBuf {
        artifact_path(project, &self.artifact_dir, &self.binary)
    }

    async fn run_step(&self, project: &Path, step: &str) -> Result<BuildOutcome> {
        debug!(step = %step, "running build step");

        let mut cmd = shell_command(step);
        cmd.current_dir(project)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = cmd
            .output()
            .await
            .with_context(|| format!("spawning build step '{step}'"))?;

        if output.status.success() {
            return Ok(BuildOutcome::Success);
        }

        let code = output.status.code().unwrap_or(-1);
        error!(step = %step, exit_code = code, "build step failed");
        // Surface the tool's own diagnostics; nobody parses them.
        eprintln!("{}", String::from_utf8_lossy(&output.stdout));
        eprintln!("{}", String::from_utf8_lossy(&output.stderr));
        Ok(BuildOutcome::Failed(code))
    }
}

impl ProjectBackend for CommandBackend {
    fn build<'a>(&'a self, project: &'a Path) -> BoxFuture<'a, BuildOutcome> {
        Box::pin(async move {
            for step in self.expanded_steps() {
                match self.run_step(project, &step).await {
                    Ok(BuildOutcome::Success) => {}
                    Ok(failed) => return failed,
                    Err(err) => {
                        error!(step = %step, error = %err, "build step could not run");
                        return BuildOutcome::Failed(-1);
                    }
                }
            }
            info!("build finished");
            BuildOutcome::Success
        })
    }

    fn start<'a>(&'a self, project: &'a Path) -> BoxFuture<'a, Result<ProcessHandle>> {
        Box::pin(async move { ProcessHandle::start(project, &self.executable(project)) })
    }
}

/// Executable name from config, falling back to the project directory name.
pub fn resolve_binary_name(cfg: &ConfigFile, project: &Path) -> String {
    cfg.run.binary.clone().unwrap_or_else(|| {
        project
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "app".to_string())
    })
}

/// Build a shell command appropriate for the platform.
fn shell_command(line: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(line);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(line);
        c
    }
}
