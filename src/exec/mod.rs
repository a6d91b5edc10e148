// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`process`] owns the running project instance ([`ProcessHandle`]) and
//!   its terminate-and-reap semantics.
//! - [`backend`] provides the `ProjectBackend` trait (build + start) and the
//!   shell-based `CommandBackend` used in production, which tests replace
//!   with a fake.

pub mod backend;
pub mod process;

pub use backend::{BoxFuture, BuildOutcome, CommandBackend, ProjectBackend};
pub use process::{ChildProcess, ProcessHandle, RunningProcess};
