//! Soft delete with a grace period and undo.
//!
//! A deletion request hides its paths from listings right away and arms a
//! one-shot timer. When the timer fires the paths are removed for good; an
//! undo before that point drops the batch without touching the disk. A new
//! request while a batch is pending deletes the old batch immediately.
//!
//! The batch, its generation and its timer handle live behind one mutex and
//! the timer deletes while holding it, so an undo racing an expiring timer
//! either wins outright or sees that the batch is already committed. The
//! timer runs its deletion on the blocking pool.

use crate::errors::CoreError;
use crate::fs::{delete_path, FileSystem};
use crate::models::FlushReport;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

struct PendingBatch {
    generation: u64,
    paths: Vec<PathBuf>,
    requested_at: DateTime<Utc>,
    timer: Option<JoinHandle<()>>,
}

#[derive(Default)]
struct PendingState {
    next_generation: u64,
    batch: Option<PendingBatch>,
}

struct Inner {
    fs: Arc<dyn FileSystem>,
    state: Mutex<PendingState>,
    flushes: watch::Sender<u64>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, PendingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Deletes the pending batch, if any, and clears it.
    fn flush_locked(&self, state: &mut PendingState, abort_timer: bool) -> FlushReport {
        let Some(batch) = state.batch.take() else {
            return FlushReport::default();
        };
        if let (Some(timer), true) = (batch.timer, abort_timer) {
            timer.abort();
        }

        debug!(
            "flushing deletion batch #{} ({} paths, requested at {})",
            batch.generation,
            batch.paths.len(),
            batch.requested_at
        );
        let mut report = FlushReport::default();
        for path in batch.paths {
            match delete_path(self.fs.as_ref(), &path) {
                Ok(()) => report.deleted.push(path),
                Err(err) => {
                    warn!("{err}");
                    report.failed.push(path);
                }
            }
        }
        self.flushes.send_modify(|count| *count += 1);
        report
    }

    fn expire(&self, generation: u64) {
        let mut state = self.lock();
        let current = state.batch.as_ref().map(|b| b.generation);
        if current != Some(generation) {
            debug!("deletion timer #{generation} expired after its batch was replaced");
            return;
        }
        debug!("deletion timer #{generation} expired");
        self.flush_locked(&mut state, false);
    }
}

/// Read-only view of the paths waiting for deletion.
#[derive(Clone)]
pub struct PendingView {
    inner: Arc<Inner>,
}

impl PendingView {
    pub fn contains(&self, path: &Path) -> bool {
        self.inner
            .lock()
            .batch
            .as_ref()
            .map(|b| b.paths.iter().any(|p| p == path))
            .unwrap_or(false)
    }

    pub fn snapshot(&self) -> HashSet<PathBuf> {
        self.inner
            .lock()
            .batch
            .as_ref()
            .map(|b| b.paths.iter().cloned().collect())
            .unwrap_or_default()
    }
}

/// Owner of the pending deletion batch and its timer.
pub struct DeferredDeletion {
    inner: Arc<Inner>,
    grace_period: Duration,
    runtime: Option<Handle>,
}

impl DeferredDeletion {
    pub fn new(fs: Arc<dyn FileSystem>, grace_period: Duration) -> Self {
        let (flushes, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                fs,
                state: Mutex::new(PendingState::default()),
                flushes,
            }),
            grace_period,
            runtime: None,
        }
    }

    /// Schedules timers on `runtime` instead of the caller's ambient runtime.
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn view(&self) -> PendingView {
        PendingView {
            inner: Arc::clone(&self.inner),
        }
    }

    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    /// Schedules `paths` for deletion once the grace period elapses.
    ///
    /// Any batch still pending is deleted first; its report is returned.
    /// An empty `paths` only performs that flush.
    ///
    /// Timers run on the runtime given to [`Self::with_runtime`], else on the
    /// caller's. With neither, nothing is flushed or scheduled and
    /// [`CoreError::NoRuntime`] is returned.
    pub fn request_deletion(&self, paths: Vec<PathBuf>) -> crate::Result<FlushReport> {
        debug!("request_deletion({paths:?})");
        let runtime = self
            .runtime
            .clone()
            .or_else(|| Handle::try_current().ok())
            .ok_or(CoreError::NoRuntime)?;

        let mut state = self.inner.lock();
        let report = self.inner.flush_locked(&mut state, true);
        if paths.is_empty() {
            return Ok(report);
        }

        state.next_generation += 1;
        let generation = state.next_generation;
        let inner = Arc::clone(&self.inner);
        let grace_period = self.grace_period;
        let timer = runtime.spawn(async move {
            tokio::time::sleep(grace_period).await;
            let expired = tokio::task::spawn_blocking(move || inner.expire(generation)).await;
            if let Err(err) = expired {
                warn!("deletion timer #{generation} failed: {err}");
            }
        });

        state.batch = Some(PendingBatch {
            generation,
            paths,
            requested_at: Utc::now(),
            timer: Some(timer),
        });
        Ok(report)
    }

    /// Cancels the pending timer and forgets its batch without deleting.
    ///
    /// Returns true when paths were restored and the view should refresh.
    pub fn undo_deletion(&self) -> bool {
        let mut state = self.inner.lock();
        let Some(batch) = state.batch.take() else {
            debug!("undo_deletion: nothing pending");
            return false;
        };
        let Some(timer) = batch.timer else {
            return false;
        };
        timer.abort();
        debug!(
            "undo_deletion: batch #{} restored {} paths",
            batch.generation,
            batch.paths.len()
        );
        !batch.paths.is_empty()
    }

    /// Deletes the pending batch now, whether or not its timer fired.
    pub fn flush_pending_deletion(&self) -> FlushReport {
        let mut state = self.inner.lock();
        self.inner.flush_locked(&mut state, true)
    }

    pub fn is_pending(&self) -> bool {
        self.inner.lock().batch.is_some()
    }

    pub fn pending_paths(&self) -> Vec<PathBuf> {
        self.inner
            .lock()
            .batch
            .as_ref()
            .map(|b| b.paths.clone())
            .unwrap_or_default()
    }

    /// Counter bumped after every completed flush.
    pub fn subscribe_flushes(&self) -> watch::Receiver<u64> {
        self.inner.flushes.subscribe()
    }
}
