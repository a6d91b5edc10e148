// src/watch/watcher.rs

use std::path::Path;

use anyhow::{Context, Result};
use notify::event::ModifyKind;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::types::{ChangeEvent, ChangeKind};
use crate::watch::watch_set::WatchRegistrar;

/// Receiving ends of the notification capability.
///
/// `events` carries one [`ChangeEvent`] per affected path; `errors` carries
/// backend errors, which are never fatal.
#[derive(Debug)]
pub struct WatchStreams {
    pub events: mpsc::UnboundedReceiver<ChangeEvent>,
    pub errors: mpsc::UnboundedReceiver<notify::Error>,
}

/// `notify`-backed registrar. Dropping it stops all watching.
pub struct NotifyRegistrar {
    inner: RecommendedWatcher,
}

impl std::fmt::Debug for NotifyRegistrar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyRegistrar").finish()
    }
}

impl WatchRegistrar for NotifyRegistrar {
    fn watch(&mut self, path: &Path) -> Result<()> {
        self.inner
            .watch(path, RecursiveMode::NonRecursive)
            .with_context(|| format!("watching {:?}", path))
    }

    fn unwatch(&mut self, path: &Path) -> Result<()> {
        self.inner
            .unwatch(path)
            .with_context(|| format!("unwatching {:?}", path))
    }
}

/// Create the platform watcher and the channels its callback feeds.
///
/// Nothing is watched yet; paths are added through the returned registrar.
/// Failing to create the watcher at all is a fatal setup error.
pub fn spawn_notify_watcher() -> crate::errors::Result<(NotifyRegistrar, WatchStreams)> {
    let (event_tx, event_rx) = mpsc::unbounded_channel::<ChangeEvent>();
    let (error_tx, error_rx) = mpsc::unbounded_channel::<notify::Error>();

    // Called synchronously on notify's own thread.
    let watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                for change in change_events_from(&event) {
                    if event_tx.send(change).is_err() {
                        // Event loop is gone; nothing left to notify.
                        return;
                    }
                }
            }
            Err(err) => {
                let _ = error_tx.send(err);
            }
        },
        Config::default(),
    )?;

    Ok((
        NotifyRegistrar { inner: watcher },
        WatchStreams {
            events: event_rx,
            errors: error_rx,
        },
    ))
}

/// Map a raw `notify` event to zero or more change events.
///
/// Access and "other" notifications are ignored; they never change content.
pub fn change_events_from(event: &Event) -> Vec<ChangeEvent> {
    let kind = match event.kind {
        EventKind::Create(_) => ChangeKind::Created,
        EventKind::Modify(ModifyKind::Name(_)) => ChangeKind::Renamed,
        EventKind::Modify(_) | EventKind::Any => ChangeKind::Modified,
        EventKind::Remove(_) => ChangeKind::Removed,
        EventKind::Access(_) | EventKind::Other => return Vec::new(),
    };

    event
        .paths
        .iter()
        .map(|p| ChangeEvent::new(p.clone(), kind))
        .collect()
}
