// src/engine/coordinator.rs

//! Serialises build + restart cycles and owns the live process.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::engine::core::{CycleEvent, CycleState};
use crate::engine::guard::{GuardPermit, RebuildGuard};
use crate::engine::{TriggerOutcome, TriggerReason};
use crate::exec::{BuildOutcome, ProcessHandle, ProjectBackend};
use crate::types::TriggerWhileBuildingBehaviour;

/// Drives [`CycleState`] against a [`ProjectBackend`].
///
/// - [`trigger`](Self::trigger) never blocks: it either starts a cycle on a
///   new Tokio task or reports the trigger as dropped/queued.
/// - At most one cycle runs at a time ([`RebuildGuard`]).
/// - The old process is stopped and reaped before the new one is started,
///   and only after a successful build.
///
/// Cloning is cheap and shares the same coordinator.
pub struct RebuildCoordinator<B: ProjectBackend> {
    inner: Arc<Inner<B>>,
}

impl<B: ProjectBackend> Clone for RebuildCoordinator<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: ProjectBackend> fmt::Debug for RebuildCoordinator<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RebuildCoordinator")
            .field("project", &self.inner.project)
            .field("state", &self.state())
            .field("generation", &self.generation())
            .finish_non_exhaustive()
    }
}

struct Inner<B> {
    project: PathBuf,
    backend: B,
    behaviour: TriggerWhileBuildingBehaviour,
    guard: RebuildGuard,
    /// A trigger arrived while the guard was held (queue behaviour only).
    pending: AtomicBool,
    state: Mutex<CycleState>,
    /// The single live-process slot. Only the task holding the guard and
    /// `shutdown` touch it.
    live: tokio::sync::Mutex<ProcessHandle>,
    generation: AtomicU64,
    shutting_down: AtomicBool,
    in_flight: Mutex<Option<JoinHandle<()>>>,
}

impl<B: ProjectBackend> RebuildCoordinator<B> {
    pub fn new(
        project: impl Into<PathBuf>,
        backend: B,
        behaviour: TriggerWhileBuildingBehaviour,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                project: project.into(),
                backend,
                behaviour,
                guard: RebuildGuard::new(),
                pending: AtomicBool::new(false),
                state: Mutex::new(CycleState::Idle),
                live: tokio::sync::Mutex::new(ProcessHandle::empty()),
                generation: AtomicU64::new(0),
                shutting_down: AtomicBool::new(false),
                in_flight: Mutex::new(None),
            }),
        }
    }

    pub fn project(&self) -> &Path {
        &self.inner.project
    }

    pub fn backend(&self) -> &B {
        &self.inner.backend
    }

    pub fn state(&self) -> CycleState {
        *self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of processes successfully started so far.
    pub fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::Acquire)
    }

    pub fn is_rebuilding(&self) -> bool {
        self.inner.guard.is_held()
    }

    pub async fn has_live_process(&self) -> bool {
        self.inner.live.lock().await.is_live()
    }

    /// Request a rebuild cycle.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn trigger(&self, reason: TriggerReason) -> TriggerOutcome {
        let inner = &self.inner;

        if inner.shutting_down.load(Ordering::Acquire) {
            debug!(?reason, "shutting down; ignoring trigger");
            return TriggerOutcome::Dropped;
        }

        let queue = inner.behaviour == TriggerWhileBuildingBehaviour::Queue;
        if queue {
            // Set before trying the guard so a cycle that is just finishing
            // cannot miss it.
            inner.pending.store(true, Ordering::Release);
        }

        let Some(permit) = inner.guard.try_acquire() else {
            return if queue {
                info!(?reason, "rebuild in progress; queued one follow-up cycle");
                TriggerOutcome::Queued
            } else {
                info!(?reason, "rebuild in progress; dropping trigger");
                TriggerOutcome::Dropped
            };
        };
        inner.pending.store(false, Ordering::Release);

        // Spawn under the slot lock: the next holder of the guard can only
        // store its handle after this one, so `in_flight` is never stale.
        let mut slot = inner.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        let task_inner = Arc::clone(inner);
        *slot = Some(tokio::spawn(async move {
            run_cycles(task_inner, permit, reason).await;
        }));

        TriggerOutcome::Started
    }

    /// Wait until no cycle is running (including queued follow-ups).
    pub async fn wait_idle(&self) {
        loop {
            let handle = self
                .inner
                .in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();

            match handle {
                Some(handle) => {
                    if let Err(e) = handle.await {
                        warn!(error = %e, "rebuild task ended abnormally");
                    }
                }
                None => break,
            }
        }
    }

    /// Stop accepting triggers, abort an in-flight cycle and stop the live
    /// process.
    pub async fn shutdown(&self) {
        let inner = &self.inner;
        inner.shutting_down.store(true, Ordering::Release);

        let handle = inner
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if !handle.is_finished() {
                info!("aborting in-flight rebuild");
            }
            handle.abort();
            let _ = handle.await;
        }

        inner.live.lock().await.stop().await;
        info!("coordinator shut down");
    }
}

/// Body of a rebuild task: one cycle, plus at most one collapsed follow-up
/// per burst of queued triggers.
async fn run_cycles<B: ProjectBackend>(
    inner: Arc<Inner<B>>,
    permit: GuardPermit,
    reason: TriggerReason,
) {
    let mut permit = permit;
    let mut reason = reason;

    loop {
        inner.run_cycle(reason).await;
        drop(permit);

        if inner.behaviour != TriggerWhileBuildingBehaviour::Queue
            || !inner.pending.load(Ordering::Acquire)
            || inner.shutting_down.load(Ordering::Acquire)
        {
            break;
        }

        match inner.guard.try_acquire() {
            Some(next) => {
                inner.pending.store(false, Ordering::Release);
                permit = next;
                reason = TriggerReason::Queued;
                debug!("running queued rebuild");
            }
            // A fresh trigger already took the guard and will cover it.
            None => break,
        }
    }
}

impl<B: ProjectBackend> Inner<B> {
    fn apply(&self, event: CycleEvent) -> CycleState {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match state.next(event) {
            Ok(next) => {
                debug!(from = ?*state, to = ?next, ?event, "cycle transition");
                *state = next;
            }
            Err(err) => error!(error = %err, "ignoring invalid cycle transition"),
        }
        *state
    }

    async fn run_cycle(&self, reason: TriggerReason) {
        self.apply(CycleEvent::Triggered);
        info!(?reason, "rebuilding project");
        println!("[devloop] Rebuilding project...");

        let outcome = self.backend.build(&self.project).await;
        if let BuildOutcome::Failed(code) = outcome {
            self.apply(CycleEvent::BuildFailed);
            warn!(exit_code = code, "build failed; keeping previous process");
            println!("[devloop] Build failed, waiting for next file change...");
            return;
        }
        self.apply(CycleEvent::BuildSucceeded);

        let mut live = self.live.lock().await;

        // Old generation is fully reaped before the new one exists.
        live.stop().await;

        if self.shutting_down.load(Ordering::Acquire) {
            self.apply(CycleEvent::StartFailed);
            info!("shutdown requested; not starting a new process");
            return;
        }

        match self.backend.start(&self.project).await {
            Ok(handle) => {
                let pid = handle.pid();
                *live = handle;
                let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
                self.apply(CycleEvent::StartSucceeded);
                info!(generation, ?pid, "project restarted");
                println!("[devloop] Project restarted");
            }
            Err(err) => {
                self.apply(CycleEvent::StartFailed);
                error!(error = %err, "failed to start project");
                println!("[devloop] Failed to start app, waiting for next file change...");
            }
        }
    }
}
