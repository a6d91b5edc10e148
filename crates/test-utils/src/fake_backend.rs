use std::collections::VecDeque;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use tokio::sync::{watch, Semaphore};

use devloop::exec::{BoxFuture, BuildOutcome, ProcessHandle, ProjectBackend, RunningProcess};

/// One observable backend interaction, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendCall {
    /// n-th build (1-based) started.
    Build(usize),
    /// Process generation started.
    Start(u64),
    /// Start was scripted to fail.
    StartFailed,
    /// Process generation stopped and reaped.
    Stop(u64),
}

#[derive(Debug, Default)]
struct Probe {
    calls: Vec<BackendCall>,
    builds: usize,
    live: usize,
    max_live: usize,
    next_generation: u64,
}

/// A fake `ProjectBackend`:
/// - build results are scripted (default: success)
/// - builds can be held at a gate until the test releases them
/// - started "processes" are counted so tests can assert that two
///   generations are never alive at once.
#[derive(Debug, Clone)]
pub struct FakeBackend {
    probe: Arc<Mutex<Probe>>,
    build_results: Arc<Mutex<VecDeque<BuildOutcome>>>,
    start_failures: Arc<Mutex<VecDeque<bool>>>,
    gate: Option<Arc<Semaphore>>,
    build_delay: Option<Duration>,
    builds_tx: Arc<watch::Sender<usize>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        let (builds_tx, _) = watch::channel(0usize);
        Self {
            probe: Arc::new(Mutex::new(Probe::default())),
            build_results: Arc::new(Mutex::new(VecDeque::new())),
            start_failures: Arc::new(Mutex::new(VecDeque::new())),
            gate: None,
            build_delay: None,
            builds_tx: Arc::new(builds_tx),
        }
    }

    /// Script the outcomes of the next builds, in order.
    pub fn with_build_results(self, results: impl IntoIterator<Item = BuildOutcome>) -> Self {
        self.build_results.lock().unwrap().extend(results);
        self
    }

    /// Script whether the next starts fail, in order.
    pub fn with_start_failures(self, failures: impl IntoIterator<Item = bool>) -> Self {
        self.start_failures.lock().unwrap().extend(failures);
        self
    }

    /// Make every build wait for [`FakeBackend::release_build`].
    pub fn with_build_gate(mut self) -> Self {
        self.gate = Some(Arc::new(Semaphore::new(0)));
        self
    }

    /// Make every build take this long (use with a paused clock).
    pub fn with_build_delay(mut self, delay: Duration) -> Self {
        self.build_delay = Some(delay);
        self
    }

    /// Let one gated build finish.
    pub fn release_build(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    /// Wait until at least `n` builds have started.
    pub async fn wait_for_builds(&self, n: usize) {
        let mut rx = self.builds_tx.subscribe();
        rx.wait_for(|count| *count >= n)
            .await
            .expect("build counter sender dropped");
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.probe.lock().unwrap().calls.clone()
    }

    pub fn builds(&self) -> usize {
        self.probe.lock().unwrap().builds
    }

    pub fn starts(&self) -> usize {
        self.count(|c| matches!(c, BackendCall::Start(_)))
    }

    pub fn stops(&self) -> usize {
        self.count(|c| matches!(c, BackendCall::Stop(_)))
    }

    /// Processes currently alive.
    pub fn live(&self) -> usize {
        self.probe.lock().unwrap().live
    }

    /// Largest number of processes ever alive at the same time.
    pub fn max_live(&self) -> usize {
        self.probe.lock().unwrap().max_live
    }

    fn count(&self, pred: impl Fn(&BackendCall) -> bool) -> usize {
        self.probe.lock().unwrap().calls.iter().filter(|c| pred(c)).count()
    }
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectBackend for FakeBackend {
    fn build<'a>(&'a self, _project: &'a Path) -> BoxFuture<'a, BuildOutcome> {
        Box::pin(async move {
            let n = {
                let mut probe = self.probe.lock().unwrap();
                probe.builds += 1;
                let n = probe.builds;
                probe.calls.push(BackendCall::Build(n));
                n
            };
            self.builds_tx.send_replace(n);

            if let Some(gate) = &self.gate {
                gate.acquire().await.expect("gate closed").forget();
            }
            if let Some(delay) = self.build_delay {
                tokio::time::sleep(delay).await;
            }

            self.build_results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(BuildOutcome::Success)
        })
    }

    fn start<'a>(&'a self, _project: &'a Path) -> BoxFuture<'a, anyhow::Result<ProcessHandle>> {
        Box::pin(async move {
            let fail = self.start_failures.lock().unwrap().pop_front().unwrap_or(false);

            let mut probe = self.probe.lock().unwrap();
            if fail {
                probe.calls.push(BackendCall::StartFailed);
                return Err(anyhow!("address already in use"));
            }

            probe.next_generation += 1;
            let generation = probe.next_generation;
            probe.live += 1;
            probe.max_live = probe.max_live.max(probe.live);
            probe.calls.push(BackendCall::Start(generation));

            Ok(ProcessHandle::new(FakeProcess {
                generation,
                probe: Arc::clone(&self.probe),
            }))
        })
    }
}

/// Process stand-in that reports its own termination to the probe.
#[derive(Debug)]
struct FakeProcess {
    generation: u64,
    probe: Arc<Mutex<Probe>>,
}

impl RunningProcess for FakeProcess {
    fn id(&self) -> Option<u32> {
        Some(10_000 + self.generation as u32)
    }

    fn terminate(&mut self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            // Reaping takes a moment; the new generation must not start meanwhile.
            tokio::task::yield_now().await;
            let mut probe = self.probe.lock().unwrap();
            probe.live -= 1;
            probe.calls.push(BackendCall::Stop(self.generation));
        })
    }
}
