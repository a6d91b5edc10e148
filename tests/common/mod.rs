#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use devloop::config::ConfigFile;
use devloop::engine::{EventLoop, EventLoopOptions, RebuildCoordinator};
use devloop::fs::mock::MockFileSystem;
use devloop::types::{ChangeEvent, ChangeKind, TriggerWhileBuildingBehaviour};
use devloop::watch::{PathFilter, WatchSetManager, WatchStreams};

pub use devloop_test_utils::builders::DevloopConfigBuilder;
pub use devloop_test_utils::{
    init_tracing, with_timeout, BackendCall, FakeBackend, FakeRegistrar, RegistrarCall,
};

pub const ROOT: &str = "/project";

pub fn root() -> PathBuf {
    PathBuf::from(ROOT)
}

/// A small project tree in memory:
///
/// ```text
/// /project/main.go
/// /project/src/app.css
/// /project/src/lib/util.ts
/// /project/node_modules/pkg/index.js
/// /project/dist/app
/// ```
pub fn sample_tree() -> MockFileSystem {
    let fs = MockFileSystem::new();
    fs.add_file("/project/main.go");
    fs.add_file("/project/src/app.css");
    fs.add_file("/project/src/lib/util.ts");
    fs.add_file("/project/node_modules/pkg/index.js");
    fs.add_file("/project/dist/app");
    fs
}

pub fn change(rel: &str, kind: ChangeKind) -> ChangeEvent {
    ChangeEvent::new(Path::new(ROOT).join(rel), kind)
}

/// Event loop wired to fakes, running on its own task.
pub struct Harness {
    pub events: mpsc::UnboundedSender<ChangeEvent>,
    pub errors: mpsc::UnboundedSender<notify::Error>,
    pub backend: FakeBackend,
    pub registrar: FakeRegistrar,
    pub fs: MockFileSystem,
    pub coordinator: RebuildCoordinator<FakeBackend>,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<devloop::errors::Result<()>>,
}

pub struct HarnessOptions {
    pub debounce_ms: u64,
    pub behaviour: TriggerWhileBuildingBehaviour,
    pub initial_build: bool,
}

impl Default for HarnessOptions {
    fn default() -> Self {
        Self {
            debounce_ms: 500,
            behaviour: TriggerWhileBuildingBehaviour::Drop,
            initial_build: false,
        }
    }
}

impl Harness {
    pub fn start(backend: FakeBackend, options: HarnessOptions) -> Self {
        let cfg: ConfigFile = DevloopConfigBuilder::new()
            .debounce_ms(options.debounce_ms)
            .behaviour(options.behaviour)
            .build();

        let fs = sample_tree();
        let registrar = FakeRegistrar::new();
        let mut manager =
            WatchSetManager::new(Arc::new(fs.clone()), root(), &cfg.watch, registrar.clone());
        manager.refresh().expect("initial watch set");

        let coordinator =
            RebuildCoordinator::new(root(), backend.clone(), cfg.config.triggered_while_building);

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (errors_tx, errors_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let event_loop = EventLoop::new(
            PathFilter::from_config(&cfg),
            Duration::from_millis(options.debounce_ms),
            coordinator.clone(),
            manager,
            WatchStreams {
                events: events_rx,
                errors: errors_rx,
            },
            EventLoopOptions {
                initial_build: options.initial_build,
            },
        );

        let handle = tokio::spawn(event_loop.run(async move {
            let _ = shutdown_rx.await;
        }));

        Self {
            events: events_tx,
            errors: errors_tx,
            backend,
            registrar,
            fs,
            coordinator,
            shutdown: Some(shutdown_tx),
            handle,
        }
    }

    pub fn send(&self, event: ChangeEvent) {
        self.events.send(event).expect("event loop alive");
    }

    /// Request shutdown and wait for the loop to finish.
    pub async fn shutdown(mut self) -> devloop::errors::Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.handle.await.expect("event loop task panicked")
    }
}

pub async fn sleep_ms(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}
