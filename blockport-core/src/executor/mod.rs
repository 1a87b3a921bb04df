use std::{fmt::Debug, sync::Arc};

use parking_lot::RwLock;

use crate::{
    block::WorkerId,
    error::ExecutorError,
    task::{TaskFuture, TaskGraph},
};

pub mod local;

/// A task executor with locality aware placement.
#[async_trait::async_trait]
pub trait Executor: Debug + Send + Sync {
    /// Workers currently known to the executor.
    fn workers(&self) -> Vec<WorkerId>;

    /// Schedule every task of `graph`, returning one future per task in
    /// graph order. Returns as soon as the tasks are scheduled.
    ///
    /// A task with a strict restriction only runs on one of its listed
    /// workers; with a loose restriction the listed workers are preferred
    /// but any worker may run it.
    async fn submit(&self, graph: TaskGraph) -> Result<Vec<TaskFuture>, ExecutorError>;
}

static DEFAULT_EXECUTOR: RwLock<Option<Arc<dyn Executor>>> = parking_lot::const_rwlock(None);

/// Register the process wide default executor, returning the previous one.
///
/// The default is meant to be resolved once at application start up (see
/// [`crate::BlockPort::from_defaults`]); library functions always take their
/// executor as an argument.
pub fn set_default(executor: Arc<dyn Executor>) -> Option<Arc<dyn Executor>> {
    DEFAULT_EXECUTOR.write().replace(executor)
}

pub fn default_executor() -> Result<Arc<dyn Executor>, ExecutorError> {
    DEFAULT_EXECUTOR.read().clone().ok_or(ExecutorError::NoDefault)
}

pub fn clear_default() -> Option<Arc<dyn Executor>> {
    DEFAULT_EXECUTOR.write().take()
}
