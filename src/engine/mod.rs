// src/engine/mod.rs

//! Rebuild orchestration.
//!
//! This module ties together:
//! - the pure cycle state machine ([`core`])
//! - the single-slot rebuild guard ([`guard`])
//! - the debounce timer ([`debounce`])
//! - the coordinator that runs build + restart cycles ([`coordinator`])
//! - the event loop that reacts to change events, watcher errors, the
//!   debounce timer and shutdown ([`runtime`])

/// Why a rebuild was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    /// Initial cycle when the dev session starts.
    Startup,
    /// The debounce timer fired after relevant file changes.
    FileChange,
    /// Follow-up cycle for triggers collected while a build was running.
    Queued,
}

/// What happened to a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// A new cycle was started.
    Started,
    /// A cycle was already running; the trigger was discarded.
    Dropped,
    /// A cycle was already running; one follow-up cycle will run after it.
    Queued,
}

pub mod coordinator;
pub mod core;
pub mod debounce;
pub mod guard;
pub mod runtime;

pub use coordinator::RebuildCoordinator;
pub use core::{CycleEvent, CycleState, FailureStage, InvalidTransition};
pub use debounce::Debouncer;
pub use guard::{GuardPermit, RebuildGuard};
pub use runtime::{EventLoop, EventLoopOptions};
