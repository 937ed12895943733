//! Detection engine - runs the detection strategies and owns their state.
//!
//! Each `start()` creates a fresh run: its own dedup cache, cancellation
//! token, timers and watch handles. `stop()` tears the run down. Cycles
//! still in flight from a stopped run see its `active` flag cleared and
//! discard their results.

mod recent;
mod scan;
mod watch;

use crate::config::DetectConfig;
use crate::dedup::DedupCache;
use crate::error::{DetectError, SourceError};
use crate::event::{DetectCallback, DetectEvent, DetectionStrategy, EngineFault, FileOpenEvent};
use crate::source::{DirectoryChangeSource, ProcessSnapshotSource, RecentItemsSource, WatchHandle};
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// The OS-facing collaborators the engine polls.
#[derive(Clone)]
pub struct Sources {
    pub processes: Arc<dyn ProcessSnapshotSource>,
    pub directories: Arc<dyn DirectoryChangeSource>,
    pub recent: Arc<dyn RecentItemsSource>,
}

/// Cheap snapshot of engine state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EngineStatus {
    pub running: bool,
    pub dedup_entries: usize,
    pub watcher_count: usize,
    pub active_timers: usize,
}

/// State shared between the timers and cycles of one run.
pub(crate) struct RunState {
    active: AtomicBool,
    dedup: Mutex<DedupCache>,
    config: DetectConfig,
    processes: Arc<dyn ProcessSnapshotSource>,
    recent: Arc<dyn RecentItemsSource>,
    callback: DetectCallback,
}

impl RunState {
    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Insert into the dedup cache. False if already there.
    fn remember(&self, key: String) -> bool {
        let Ok(mut cache) = self.dedup.lock() else {
            return false;
        };
        cache.insert_if_absent(key, Instant::now())
    }

    fn has_seen(&self, key: &str) -> bool {
        self.dedup
            .lock()
            .map(|cache| cache.contains(key))
            .unwrap_or(false)
    }

    fn dedup_len(&self) -> usize {
        self.dedup.lock().map(|cache| cache.len()).unwrap_or(0)
    }

    fn emit(&self, event: FileOpenEvent) {
        if !self.is_active() {
            tracing::debug!(file = %event.file_name, "Engine stopped, discarding detection");
            return;
        }

        tracing::info!(
            strategy = %event.strategy,
            file = %event.file_name,
            reader = %event.reader,
            pid = %event.process_id,
            "File opened"
        );
        (self.callback)(DetectEvent::FileOpened(event));
    }

    /// Await a source call under the configured timeout.
    ///
    /// Failures are logged and turned into `None`; they never escape the
    /// strategy that made the call.
    async fn guarded<T, Fut>(
        &self,
        strategy: DetectionStrategy,
        operation: &'static str,
        call: Fut,
    ) -> Option<T>
    where
        Fut: Future<Output = Result<T, SourceError>>,
    {
        let limit = self.config.source_timeout();
        match tokio::time::timeout(limit, call).await {
            Ok(Ok(value)) => Some(value),
            Ok(Err(e)) => {
                tracing::warn!(%strategy, operation, error = %e, "Source call failed");
                None
            }
            Err(_) => {
                tracing::warn!(%strategy, operation, timeout = ?limit, "Source call timed out");
                None
            }
        }
    }
}

struct ActiveRun {
    state: Arc<RunState>,
    cancel: CancellationToken,
    timers: Vec<JoinHandle<()>>,
    watchers: HashMap<PathBuf, Box<dyn WatchHandle>>,
}

impl ActiveRun {
    fn shutdown(mut self) {
        self.state.active.store(false, Ordering::SeqCst);
        self.cancel.cancel();

        for (path, mut handle) in self.watchers.drain() {
            if let Err(e) = handle.close() {
                tracing::warn!(path = %path.display(), error = %e, "Failed to close directory watch");
            }
        }

        if let Ok(mut cache) = self.state.dedup.lock() {
            cache.clear();
        }
    }
}

/// Detects documents being opened, from four independently scheduled strategies.
pub struct DetectionEngine {
    config: DetectConfig,
    sources: Sources,
    callback: DetectCallback,
    run: Option<ActiveRun>,
}

impl DetectionEngine {
    pub fn new(config: DetectConfig, sources: Sources, callback: DetectCallback) -> Self {
        Self {
            config,
            sources,
            callback,
            run: None,
        }
    }

    /// Start all strategies on the current tokio runtime.
    ///
    /// Returns immediately. A second call while running is a no-op. If no
    /// runtime is available the engine stays stopped and reports
    /// [`DetectEvent::Error`].
    pub fn start(&mut self) {
        if self.run.is_some() {
            tracing::info!("Detection engine already running");
            return;
        }

        match self.launch() {
            Ok(run) => {
                tracing::info!(
                    timers = run.timers.len(),
                    watchers = run.watchers.len(),
                    "Detection engine started"
                );
                self.run = Some(run);
            }
            Err(e) => {
                tracing::error!(error = %e, "Detection engine failed to start");
                self.stop();
                (self.callback)(DetectEvent::Error(EngineFault::new(
                    "detection engine failed to start",
                    &e,
                )));
            }
        }
    }

    /// Stop all strategies and release watches. No-op when not running.
    pub fn stop(&mut self) {
        let Some(run) = self.run.take() else {
            tracing::debug!("Detection engine not running");
            return;
        };

        run.shutdown();
        tracing::info!("Detection engine stopped");
    }

    pub fn is_running(&self) -> bool {
        self.run.is_some()
    }

    pub fn status(&self) -> EngineStatus {
        let Some(run) = &self.run else {
            return EngineStatus::default();
        };

        EngineStatus {
            running: true,
            dedup_entries: run.state.dedup_len(),
            watcher_count: run.watchers.len(),
            active_timers: run.timers.iter().filter(|t| !t.is_finished()).count(),
        }
    }

    fn launch(&self) -> Result<ActiveRun, DetectError> {
        let runtime = Handle::try_current().map_err(|e| DetectError::NoRuntime(e.to_string()))?;

        let state = Arc::new(RunState {
            active: AtomicBool::new(true),
            dedup: Mutex::new(DedupCache::new()),
            config: self.config.clone(),
            processes: Arc::clone(&self.sources.processes),
            recent: Arc::clone(&self.sources.recent),
            callback: Arc::clone(&self.callback),
        });
        let cancel = CancellationToken::new();

        let mut timers = vec![
            spawn_periodic(
                &runtime,
                "process-scan",
                self.config.process_scan_interval(),
                &state,
                &cancel,
                scan::scan_processes,
            ),
            spawn_periodic(
                &runtime,
                "handle-scan",
                self.config.handle_scan_interval(),
                &state,
                &cancel,
                scan::scan_handles,
            ),
        ];

        if self.sources.recent.is_available() {
            timers.push(spawn_periodic(
                &runtime,
                "recent-scan",
                self.config.recent_scan_interval(),
                &state,
                &cancel,
                recent::scan_recent,
            ));
        } else {
            tracing::info!("No recent-items folder, recent file detection disabled");
        }

        timers.push(spawn_periodic(
            &runtime,
            "dedup-cleanup",
            self.config.cleanup_interval(),
            &state,
            &cancel,
            purge_dedup,
        ));

        let (sender, changes) = mpsc::unbounded_channel();
        let watchers = watch::subscribe_all(
            self.sources.directories.as_ref(),
            &self.config.watch_directories(),
            &sender,
        );
        drop(sender);
        runtime.spawn(watch::listen(Arc::clone(&state), changes, cancel.clone()));

        Ok(ActiveRun {
            state,
            cancel,
            timers,
            watchers,
        })
    }
}

impl Drop for DetectionEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Run `cycle` every `period` until cancelled. The first run is one period
/// after start.
fn spawn_periodic<F, Fut>(
    runtime: &Handle,
    name: &'static str,
    period: Duration,
    state: &Arc<RunState>,
    cancel: &CancellationToken,
    cycle: F,
) -> JoinHandle<()>
where
    F: Fn(Arc<RunState>) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let state = Arc::clone(state);
    let cancel = cancel.clone();

    runtime.spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::debug!(timer = name, ?period, "Timer started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    // Detached, so a slow source call never holds back the next tick.
                    tokio::spawn(cycle(Arc::clone(&state)));
                }
            }
        }

        tracing::debug!(timer = name, "Timer stopped");
    })
}

async fn purge_dedup(state: Arc<RunState>) {
    if !state.is_active() {
        return;
    }

    let max_age = state.config.dedup_max_age();
    let Ok(mut cache) = state.dedup.lock() else {
        return;
    };
    let purged = cache.purge_older_than(Instant::now(), max_age);
    if purged > 0 {
        tracing::debug!(purged, remaining = cache.len(), "Purged dedup cache");
    }
}
