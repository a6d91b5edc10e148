// src/exec/process.rs

//! A single running instance of the project's executable.

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::process::{Child, Command};
use tracing::{debug, info};

/// Something that can be terminated and reaped.
///
/// [`ChildProcess`] is the real implementation; tests provide instrumented
/// fakes.
pub trait RunningProcess: Send + fmt::Debug {
    /// OS process id, if known.
    fn id(&self) -> Option<u32>;

    /// Send a termination signal, then wait until the process has fully
    /// exited. An error because the process is already gone is swallowed.
    fn terminate(&mut self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

/// A spawned OS process.
#[derive(Debug)]
pub struct ChildProcess {
    child: Child,
}

impl ChildProcess {
    pub fn new(child: Child) -> Self {
        Self { child }
    }
}

impl RunningProcess for ChildProcess {
    fn id(&self) -> Option<u32> {
        self.child.id()
    }

    fn terminate(&mut self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            let pid = self.child.id();

            if let Err(e) = self.child.start_kill() {
                debug!(?pid, error = %e, "kill failed; process already exited");
            }

            match self.child.wait().await {
                Ok(status) => debug!(?pid, %status, "process reaped"),
                Err(e) => debug!(?pid, error = %e, "wait failed; treating as stopped"),
            }
        })
    }
}

/// Owner of at most one running process.
///
/// An empty handle stands for "nothing running". [`ProcessHandle::stop`] is
/// safe to call any number of times.
#[derive(Debug, Default)]
pub struct ProcessHandle {
    inner: Option<Box<dyn RunningProcess>>,
}

impl ProcessHandle {
    pub fn new(process: impl RunningProcess + 'static) -> Self {
        Self {
            inner: Some(Box::new(process)),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Launch `executable` with `project` as working directory.
    ///
    /// stdout/stderr are inherited so the project's output shows up in the
    /// supervisor's terminal. Returns as soon as the process is spawned.
    pub fn start(project: &Path, executable: &Path) -> Result<Self> {
        let child = Command::new(executable)
            .current_dir(project)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("spawning {:?}", executable))?;

        info!(pid = ?child.id(), executable = ?executable, "project process started");
        Ok(Self::new(ChildProcess::new(child)))
    }

    pub fn is_live(&self) -> bool {
        self.inner.is_some()
    }

    pub fn pid(&self) -> Option<u32> {
        self.inner.as_ref().and_then(|p| p.id())
    }

    /// Terminate and reap the process, leaving the handle empty.
    pub async fn stop(&mut self) {
        if let Some(mut process) = self.inner.take() {
            let pid = process.id();
            debug!(?pid, "stopping project process");
            process.terminate().await;
            info!(?pid, "project process stopped");
        }
    }
}

/// Location of the built executable: `<project>/<artifact_dir>/<binary>`,
/// with `.exe` appended on Windows.
pub fn artifact_path(project: &Path, artifact_dir: &str, binary: &str) -> PathBuf {
    project.join(artifact_dir).join(executable_name(binary))
}

pub fn executable_name(binary: &str) -> String {
    if cfg!(windows) && !binary.ends_with(".exe") {
        format!("{binary}.exe")
    } else {
        binary.to_string()
    }
}
