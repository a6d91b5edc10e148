// src/engine/core.rs

//! Pure rebuild-cycle state machine.
//!
//! This module is synchronous and deterministic: it only knows which state
//! follows which event. The coordinator drives it while performing the
//! actual IO, and tests can exercise every transition without Tokio,
//! channels or processes.
//!
//! ```text
//!            trigger              build ok             start ok
//!   Idle ───────────► Building ───────────► Starting ───────────► Running
//!   Running ────┘        │ build failed        │ start failed
//!   Failed ─────┘        ▼                     ▼
//!                    Failed(Build)        Failed(Start)
//! ```

use thiserror::Error;

/// Which step of a cycle failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    /// The build collaborator reported failure; any previous process is
    /// still running.
    Build,
    /// The build succeeded but the new process could not be launched; no
    /// process is running.
    Start,
}

/// Where the coordinator is in its build/restart cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CycleState {
    /// No cycle has run yet.
    #[default]
    Idle,
    Building,
    /// Build done; retiring the old process and launching the new one.
    Starting,
    /// Last cycle succeeded and its process is the live one.
    Running,
    Failed(FailureStage),
}

/// Inputs to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleEvent {
    Triggered,
    BuildSucceeded,
    BuildFailed,
    StartSucceeded,
    StartFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid cycle transition: {event:?} while {state:?}")]
pub struct InvalidTransition {
    pub state: CycleState,
    pub event: CycleEvent,
}

impl CycleState {
    /// Whether a new cycle may begin from this state.
    pub fn accepts_trigger(self) -> bool {
        matches!(
            self,
            CycleState::Idle | CycleState::Running | CycleState::Failed(_)
        )
    }

    /// Whether a cycle is in progress.
    pub fn is_busy(self) -> bool {
        matches!(self, CycleState::Building | CycleState::Starting)
    }

    /// Compute the state that follows `event`.
    pub fn next(self, event: CycleEvent) -> Result<CycleState, InvalidTransition> {
        use CycleEvent as E;
        use CycleState as S;

        match (self, event) {
            (s, E::Triggered) if s.accepts_trigger() => Ok(S::Building),
            (S::Building, E::BuildSucceeded) => Ok(S::Starting),
            (S::Building, E::BuildFailed) => Ok(S::Failed(FailureStage::Build)),
            (S::Starting, E::StartSucceeded) => Ok(S::Running),
            (S::Starting, E::StartFailed) => Ok(S::Failed(FailureStage::Start)),
            (state, event) => Err(InvalidTransition { state, event }),
        }
    }
}
