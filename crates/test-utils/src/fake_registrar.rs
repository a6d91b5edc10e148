use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use devloop::watch::WatchRegistrar;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrarCall {
    Watch(PathBuf),
    Unwatch(PathBuf),
}

/// A registrar that records calls instead of talking to the OS.
///
/// Clones share state, so a test can keep one clone after handing the other
/// to a `WatchSetManager`.
#[derive(Debug, Clone, Default)]
pub struct FakeRegistrar {
    calls: Arc<Mutex<Vec<RegistrarCall>>>,
    failing: Arc<Mutex<HashSet<PathBuf>>>,
}

impl FakeRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `watch(path)` fail for this path.
    pub fn fail_on(&self, path: impl Into<PathBuf>) {
        self.failing.lock().unwrap().insert(path.into());
    }

    pub fn calls(&self) -> Vec<RegistrarCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Paths currently subscribed, replaying watch/unwatch in order.
    pub fn active(&self) -> Vec<PathBuf> {
        let mut active: Vec<PathBuf> = Vec::new();
        for call in self.calls.lock().unwrap().iter() {
            match call {
                RegistrarCall::Watch(p) => active.push(p.clone()),
                RegistrarCall::Unwatch(p) => {
                    if let Some(i) = active.iter().position(|a| a == p) {
                        active.remove(i);
                    }
                }
            }
        }
        active
    }
}

impl WatchRegistrar for FakeRegistrar {
    fn watch(&mut self, path: &Path) -> Result<()> {
        if self.failing.lock().unwrap().contains(path) {
            return Err(anyhow!("cannot watch {:?}", path));
        }
        self.calls
            .lock()
            .unwrap()
            .push(RegistrarCall::Watch(path.to_path_buf()));
        Ok(())
    }

    fn unwatch(&mut self, path: &Path) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(RegistrarCall::Unwatch(path.to_path_buf()));
        Ok(())
    }
}
