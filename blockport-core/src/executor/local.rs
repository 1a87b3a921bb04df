//! In-process executor.
//!
//! Runs tasks on the tokio runtime, pretending to be a cluster of named
//! workers. Each worker has its own concurrency limit, and tasks are placed
//! round robin over the workers their restriction allows. The most recent
//! placement decisions are kept in a bounded log so locality can be
//! inspected.

use std::{
    collections::{HashSet, VecDeque},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use indexmap::IndexMap;
use parking_lot::Mutex;
use tokio::sync::Semaphore;

use super::Executor;
use crate::{
    block::WorkerId,
    error::{ExecutorError, TaskError},
    task::{Restrictions, TaskFuture, TaskGraph, TaskKey},
};

/// Placements kept by [`LocalExecutor::new`].
pub const DEFAULT_PLACEMENT_LOG: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub key: TaskKey,
    pub worker: WorkerId,
    /// Whether the worker was one of the task's restricted workers.
    pub preferred: bool,
}

#[derive(Debug, Clone)]
pub struct LocalExecutor {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    workers: IndexMap<WorkerId, Arc<Semaphore>>,
    next: AtomicUsize,
    placement_log: usize,
    placements: Mutex<VecDeque<Placement>>,
}

impl LocalExecutor {
    pub fn new<I, W>(workers: I, concurrency: usize) -> Self
    where
        I: IntoIterator<Item = W>,
        W: Into<WorkerId>,
    {
        Self::with_placement_log(workers, concurrency, DEFAULT_PLACEMENT_LOG)
    }

    /// Like [`LocalExecutor::new`], keeping at most `capacity` placements.
    /// A capacity of zero disables the log.
    pub fn with_placement_log<I, W>(workers: I, concurrency: usize, capacity: usize) -> Self
    where
        I: IntoIterator<Item = W>,
        W: Into<WorkerId>,
    {
        let workers = workers
            .into_iter()
            .map(|w| (w.into(), Arc::new(Semaphore::new(concurrency.max(1)))))
            .collect();
        LocalExecutor {
            inner: Arc::new(Inner {
                workers,
                next: AtomicUsize::new(0),
                placement_log: capacity,
                placements: Mutex::new(VecDeque::with_capacity(capacity.min(DEFAULT_PLACEMENT_LOG))),
            }),
        }
    }

    pub fn from_config() -> Self {
        let config = &blockport_config::CONFIG;
        Self::new(config.worker_list(), config.worker_concurrency)
    }

    /// The most recent placement decisions, oldest first.
    pub fn placements(&self) -> Vec<Placement> {
        self.inner.placements.lock().iter().cloned().collect()
    }

    /// Drains the placement log.
    pub fn take_placements(&self) -> Vec<Placement> {
        self.inner.placements.lock().drain(..).collect()
    }

    fn record(&self, placement: Placement) {
        if self.inner.placement_log == 0 {
            return;
        }
        let mut placements = self.inner.placements.lock();
        if placements.len() == self.inner.placement_log {
            placements.pop_front();
        }
        placements.push_back(placement);
    }

    fn pick(&self, candidates: &[&WorkerId]) -> WorkerId {
        let i = self.inner.next.fetch_add(1, Ordering::Relaxed);
        candidates[i % candidates.len()].clone()
    }

    /// Chooses a worker for `key`, or `None` when a strict restriction names
    /// no known worker.
    fn place(&self, key: &TaskKey, restrictions: &Restrictions) -> Option<(WorkerId, bool)> {
        let all: Vec<&WorkerId> = self.inner.workers.keys().collect();
        let Some(allowed) = restrictions.workers_for(key) else {
            return Some((self.pick(&all), false));
        };

        let eligible: Vec<&WorkerId> = all.iter().copied().filter(|w| allowed.contains(*w)).collect();
        if !eligible.is_empty() {
            Some((self.pick(&eligible), true))
        } else if restrictions.is_loose(key) {
            Some((self.pick(&all), false))
        } else {
            None
        }
    }
}

#[async_trait::async_trait]
impl Executor for LocalExecutor {
    fn workers(&self) -> Vec<WorkerId> {
        self.inner.workers.keys().cloned().collect()
    }

    async fn submit(&self, graph: TaskGraph) -> Result<Vec<TaskFuture>, ExecutorError> {
        if self.inner.workers.is_empty() {
            return Err(ExecutorError::NoWorkers);
        }
        let mut seen = HashSet::with_capacity(graph.len());
        for key in graph.keys() {
            if !seen.insert(key) {
                return Err(ExecutorError::DuplicateKey(key.to_string()));
            }
        }

        let (tasks, restrictions) = graph.into_parts();
        let mut futures = Vec::with_capacity(tasks.len());
        let mut fallbacks = 0usize;

        for task in tasks {
            let (key, inputs, job) = task.into_parts();
            let Some((worker, preferred)) = self.place(&key, &restrictions) else {
                tracing::warn!("No eligible worker for task {}", key);
                let error = TaskError::NoWorker {
                    key: key.to_string(),
                };
                futures.push(TaskFuture::ready(key, Err(error)));
                continue;
            };
            if !preferred && restrictions.workers_for(&key).is_some() {
                fallbacks += 1;
            }

            let semaphore = self.inner.workers[&worker].clone();
            let handle = tokio::spawn(async move {
                // Inputs may come from tasks queued on this very worker.
                futures::future::join_all(inputs).await;
                let _permit = semaphore.acquire_owned().await;
                job().await
            });

            self.record(Placement {
                key: key.clone(),
                worker,
                preferred,
            });

            let task_key = key.clone();
            futures.push(TaskFuture::new(key, async move {
                match handle.await {
                    Ok(result) => result,
                    Err(e) if e.is_cancelled() => Err(TaskError::Cancelled {
                        key: task_key.to_string(),
                    }),
                    Err(e) => Err(TaskError::failed(&task_key, e)),
                }
            }));
        }

        tracing::debug!(
            "Submitted {} tasks ({} restricted, {} placed off their preferred workers)",
            futures.len(),
            restrictions.len(),
            fallbacks
        );
        Ok(futures)
    }
}
