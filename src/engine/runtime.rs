// src/engine/runtime.rs

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, trace, warn};

use crate::engine::{Debouncer, RebuildCoordinator, TriggerOutcome, TriggerReason};
use crate::errors::Result;
use crate::exec::ProjectBackend;
use crate::types::ChangeEvent;
use crate::watch::path_utils::filter_key;
use crate::watch::{PathFilter, WatchRegistrar, WatchSetManager, WatchStreams};

/// Options for the event loop.
#[derive(Debug, Clone, Copy)]
pub struct EventLoopOptions {
    /// Run one build + start cycle before waiting for changes.
    pub initial_build: bool,
}

impl Default for EventLoopOptions {
    fn default() -> Self {
        Self {
            initial_build: true,
        }
    }
}

/// The single control loop.
///
/// Waits on change events, watcher errors, the debounce deadline and the
/// shutdown signal. Rebuilds run on their own task (see
/// [`RebuildCoordinator`]), so events keep being filtered and keep re-arming
/// the timer while a build is running.
pub struct EventLoop<B: ProjectBackend, R: WatchRegistrar> {
    root: PathBuf,
    filter: PathFilter,
    debouncer: Debouncer,
    coordinator: RebuildCoordinator<B>,
    watch_set: WatchSetManager<R>,
    streams: WatchStreams,
    options: EventLoopOptions,
    /// A structural change was seen since the last refresh.
    refresh_pending: bool,
    last_change: Option<ChangeEvent>,
}

impl<B: ProjectBackend, R: WatchRegistrar> fmt::Debug for EventLoop<B, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLoop")
            .field("root", &self.root)
            .field("debouncer", &self.debouncer)
            .field("coordinator", &self.coordinator)
            .finish_non_exhaustive()
    }
}

impl<B: ProjectBackend, R: WatchRegistrar> EventLoop<B, R> {
    pub fn new(
        filter: PathFilter,
        debounce: Duration,
        coordinator: RebuildCoordinator<B>,
        watch_set: WatchSetManager<R>,
        streams: WatchStreams,
        options: EventLoopOptions,
    ) -> Self {
        Self {
            root: watch_set.root().to_path_buf(),
            filter,
            debouncer: Debouncer::new(debounce),
            coordinator,
            watch_set,
            streams,
            options,
            refresh_pending: false,
            last_change: None,
        }
    }

    /// Run until `shutdown` resolves or the change stream closes, then stop
    /// the live process.
    pub async fn run(mut self, shutdown: impl Future<Output = ()>) -> Result<()> {
        info!(root = ?self.root, window = ?self.debouncer.window(), "watching for changes");

        if self.options.initial_build {
            self.coordinator.trigger(TriggerReason::Startup);
        }

        tokio::pin!(shutdown);

        loop {
            let deadline = self.debouncer.deadline();

            tokio::select! {
                _ = &mut shutdown => {
                    info!("shutdown requested");
                    break;
                }

                maybe_event = self.streams.events.recv() => match maybe_event {
                    Some(event) => self.on_change(event),
                    None => {
                        info!("change stream closed; exiting");
                        break;
                    }
                },

                Some(err) = self.streams.errors.recv() => {
                    warn!(error = %err, "file watcher error; continuing");
                }

                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    if self.debouncer.fire(Instant::now()) {
                        self.on_debounce_fired();
                    }
                }
            }
        }

        self.coordinator.shutdown().await;
        info!("event loop exiting");
        Ok(())
    }

    /// Filter one raw event and re-arm the timer if it is relevant.
    ///
    /// A directory created or removed under a name the extension stage
    /// rejects (`src/v1.2`) does not re-arm the timer, but the watch set is
    /// refreshed right away so changes inside it are seen.
    fn on_change(&mut self, event: ChangeEvent) {
        let key = filter_key(&self.root, &event.path);

        if self.filter.is_excluded(&key) {
            trace!(path = %key, kind = %event.kind, "ignoring change");
            return;
        }

        let structural =
            event.kind.is_structural() && self.watch_set.affects_structure(&event.path);

        if !self.filter.has_accepted_extension(&key) {
            if structural {
                debug!(path = %key, kind = %event.kind, "directory layout changed");
                self.refresh_watch_set();
            } else {
                trace!(path = %key, kind = %event.kind, "ignoring change");
            }
            return;
        }

        debug!(path = %key, kind = %event.kind, "relevant change; (re)arming debounce");

        if structural {
            self.refresh_pending = true;
        }

        self.debouncer.arm(Instant::now());
        self.last_change = Some(event);
    }

    fn refresh_watch_set(&mut self) {
        self.refresh_pending = false;
        if let Err(err) = self.watch_set.refresh() {
            warn!(error = %err, "failed to refresh watch set; keeping previous one");
        }
    }

    fn on_debounce_fired(&mut self) {
        if self.refresh_pending {
            self.refresh_watch_set();
        }

        if let Some(change) = self.last_change.take() {
            let key = filter_key(&self.root, &change.path);
            info!(path = %key, kind = %change.kind, "file changed");
            println!("\n[devloop] File changed: {key}");
        }

        match self.coordinator.trigger(TriggerReason::FileChange) {
            TriggerOutcome::Started => debug!("rebuild started"),
            TriggerOutcome::Dropped => {
                debug!("rebuild already running; change will be picked up later")
            }
            TriggerOutcome::Queued => debug!("rebuild already running; follow-up queued"),
        }
    }

    pub fn coordinator(&self) -> &RebuildCoordinator<B> {
        &self.coordinator
    }
}
