//! Bounded worker pool with fire-and-forget submission and blocking
//! per-task collection.
//!
//! Usage is always submit-all, `join`, then collect. `join` runs every queued
//! task inside a Rayon scope, which returns only once all of them finished,
//! so no handle is read while tasks are still running. A pool of one worker
//! runs each task inline at submission.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::error::{RemapError, Result};

enum PoolInner {
    Inline,
    Threads(rayon::ThreadPool),
}

type QueuedTask = Box<dyn FnOnce() + Send + 'static>;

/// Result slot shared between a queued task and its handle.
type Slot<T> = Arc<Mutex<Option<Result<T>>>>;

pub struct WorkerPool {
    inner: PoolInner,
    workers: usize,
    queued: Vec<QueuedTask>,
}

impl WorkerPool {
    /// Create a pool with `workers` execution slots (must be at least 1).
    pub fn new(workers: usize) -> Result<Self> {
        let inner = match workers {
            0 => {
                return Err(RemapError::InvalidConfig(
                    "worker count must be at least 1".into(),
                ))
            }
            1 => PoolInner::Inline,
            n => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .thread_name(|i| format!("remap-worker-{i}"))
                    .build()
                    .map_err(|e| RemapError::InvalidConfig(format!("worker pool: {e}")))?;
                PoolInner::Threads(pool)
            }
        };
        debug!(workers, "Created worker pool");
        Ok(Self {
            inner,
            workers,
            queued: Vec::new(),
        })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Submit a task. `label` identifies the task's scope (grid or group) in
    /// errors raised by a panicking task.
    pub fn submit<T, F>(&mut self, label: impl Into<String>, task: F) -> TaskHandle<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let label = label.into();
        let slot: Slot<T> = Arc::new(Mutex::new(None));
        match &self.inner {
            PoolInner::Inline => {
                store(&slot, run_guarded(&label, task));
            }
            PoolInner::Threads(_) => {
                let task_slot = Arc::clone(&slot);
                let task_label = label.clone();
                self.queued.push(Box::new(move || {
                    store(&task_slot, run_guarded(&task_label, task));
                }));
            }
        }
        TaskHandle { label, slot }
    }

    /// Stop accepting work and block until every submitted task finished.
    pub fn join(self) {
        if let PoolInner::Threads(pool) = &self.inner {
            let queued = self.queued;
            let count = queued.len();
            pool.scope(|scope| {
                for task in queued {
                    scope.spawn(move |_| task());
                }
            });
            debug!(workers = self.workers, tasks = count, "Worker pool drained");
        }
    }
}

fn store<T>(slot: &Slot<T>, result: Result<T>) {
    *slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(result);
}

/// Result slot of one submitted task.
pub struct TaskHandle<T> {
    label: String,
    slot: Slot<T>,
}

impl<T> TaskHandle<T> {
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Fetch the task's result. Only meaningful after the pool was joined.
    pub fn collect(self) -> Result<T> {
        let result = self.slot.lock().unwrap_or_else(|e| e.into_inner()).take();
        result.unwrap_or_else(|| {
            Err(RemapError::backend(
                self.label,
                "task did not run before collection",
            ))
        })
    }
}

fn run_guarded<T, F>(label: &str, task: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    match panic::catch_unwind(AssertUnwindSafe(task)) {
        Ok(result) => result,
        Err(payload) => Err(RemapError::backend(
            label,
            format!("task panicked: {}", panic_message(payload.as_ref())),
        )),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
