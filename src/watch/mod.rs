// src/watch/mod.rs

//! File watching and change relevance.
//!
//! This module is responsible for:
//! - Deciding whether a changed path matters ([`filter`]).
//! - Walking the project tree into a [`WatchSet`] and keeping the
//!   notification backend subscribed to it ([`watch_set`]).
//! - Wiring the cross-platform `notify` watcher into tokio channels
//!   ([`watcher`]).
//!
//! It knows nothing about builds or processes; it only turns filesystem
//! activity into [`crate::types::ChangeEvent`]s.

pub mod filter;
pub mod path_utils;
pub mod watch_set;
pub mod watcher;

pub use filter::PathFilter;
pub use watch_set::{
    compute_watch_set, RegistrationReport, WatchRegistrar, WatchSet, WatchSetManager,
};
pub use watcher::{change_events_from, spawn_notify_watcher, NotifyRegistrar, WatchStreams};
