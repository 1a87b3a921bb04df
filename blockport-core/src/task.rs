use std::{
    collections::{BTreeSet, HashSet},
    fmt::{Debug, Display},
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use bytes::Bytes;
use futures::{
    future::{BoxFuture, Shared},
    FutureExt,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{block::WorkerId, error::TaskError};

pub type TaskResult = Result<Value, TaskError>;

/// Identity of a task within the executor.
///
/// Keys compare by their fields; the `Display` form is only meant for logs
/// and scheduler dashboards.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKey {
    ReadBinary {
        filename: String,
        offset: u64,
        length: u64,
    },
    Write {
        filename: String,
    },
    /// Caller defined task, e.g. a computation producing bytes to be written.
    Named(String),
}

impl TaskKey {
    pub fn read_binary(filename: impl Into<String>, offset: u64, length: u64) -> Self {
        TaskKey::ReadBinary {
            filename: filename.into(),
            offset,
            length,
        }
    }
}

impl Display for TaskKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskKey::ReadBinary {
                filename,
                offset,
                length,
            } => write!(f, "read-binary-{}-{}-{}", filename, offset, length),
            TaskKey::Write { filename } => write!(f, "write-{}", filename),
            TaskKey::Named(name) => f.write_str(name),
        }
    }
}

/// Result value of a task. Values cross the executor boundary, so they are
/// dynamically typed and serializable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    Null,
    Int(u64),
    Text(String),
    Bytes(Bytes),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Int(_) => "int",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<u64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl From<Bytes> for Value {
    fn from(value: Bytes) -> Self {
        Value::Bytes(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(Bytes::from(value))
    }
}

impl From<&'static [u8]> for Value {
    fn from(value: &'static [u8]) -> Self {
        Value::Bytes(Bytes::from_static(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::Int(value)
    }
}

pub type Job = Box<dyn FnOnce() -> BoxFuture<'static, TaskResult> + Send>;

/// A named unit of deferred work. Constructing a task never runs it; the
/// job is only invoked by the executor the task is submitted to.
///
/// Inputs are futures the job depends on. Executors wait for them before
/// giving the task a worker slot, so a task never holds a slot while its
/// producer is still queued.
pub struct Task {
    key: TaskKey,
    inputs: Vec<TaskFuture>,
    job: Job,
}

impl Task {
    pub fn new<F, Fut>(key: TaskKey, job: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = TaskResult> + Send + 'static,
    {
        Task {
            key,
            inputs: Vec::new(),
            job: Box::new(move || job().boxed()),
        }
    }

    pub fn with_inputs(mut self, inputs: Vec<TaskFuture>) -> Self {
        self.inputs.extend(inputs);
        self
    }

    pub fn key(&self) -> &TaskKey {
        &self.key
    }

    pub fn inputs(&self) -> &[TaskFuture] {
        &self.inputs
    }

    pub fn into_parts(self) -> (TaskKey, Vec<TaskFuture>, Job) {
        (self.key, self.inputs, self.job)
    }

    /// Runs the job on the current task, bypassing any executor.
    pub async fn run(self) -> TaskResult {
        futures::future::join_all(self.inputs).await;
        (self.job)().await
    }
}

impl Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("key", &self.key)
            .field("inputs", &self.inputs.len())
            .finish_non_exhaustive()
    }
}

/// Placement hints: which workers each task should run on. A loose
/// restriction lets the scheduler pick another worker when none of the
/// listed ones is available.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Restrictions {
    workers: IndexMap<TaskKey, BTreeSet<WorkerId>>,
    loose: HashSet<TaskKey>,
}

impl Restrictions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn restrict(&mut self, key: TaskKey, workers: BTreeSet<WorkerId>, loose: bool) {
        if loose {
            self.loose.insert(key.clone());
        } else {
            self.loose.remove(&key);
        }
        self.workers.insert(key, workers);
    }

    pub fn workers_for(&self, key: &TaskKey) -> Option<&BTreeSet<WorkerId>> {
        self.workers.get(key)
    }

    pub fn is_loose(&self, key: &TaskKey) -> bool {
        self.loose.contains(key)
    }

    pub fn loose_keys(&self) -> impl Iterator<Item = &TaskKey> {
        self.loose.iter()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TaskKey, &BTreeSet<WorkerId>)> {
        self.workers.iter()
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }
}

/// Ordered tasks plus the restrictions that apply to them, submitted to an
/// executor as one unit.
#[derive(Debug, Default)]
pub struct TaskGraph {
    tasks: Vec<Task>,
    restrictions: Restrictions,
}

impl TaskGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, task: Task) {
        self.tasks.push(task);
    }

    pub fn push_restricted(&mut self, task: Task, workers: BTreeSet<WorkerId>, loose: bool) {
        self.restrictions.restrict(task.key().clone(), workers, loose);
        self.tasks.push(task);
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &TaskKey> {
        self.tasks.iter().map(Task::key)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn restrictions(&self) -> &Restrictions {
        &self.restrictions
    }

    pub fn into_parts(self) -> (Vec<Task>, Restrictions) {
        (self.tasks, self.restrictions)
    }
}

/// Handle to the result of a submitted task.
///
/// Cloning is cheap and every clone resolves to the same result, so a future
/// can be awaited by the caller and passed on as the input of other tasks.
#[derive(Clone)]
pub struct TaskFuture {
    key: TaskKey,
    inner: Shared<BoxFuture<'static, TaskResult>>,
}

impl TaskFuture {
    pub fn new<Fut>(key: TaskKey, fut: Fut) -> Self
    where
        Fut: Future<Output = TaskResult> + Send + 'static,
    {
        TaskFuture {
            key,
            inner: fut.boxed().shared(),
        }
    }

    /// A future that is already resolved.
    pub fn ready(key: TaskKey, result: TaskResult) -> Self {
        Self::new(key, futures::future::ready(result))
    }

    pub fn key(&self) -> &TaskKey {
        &self.key
    }

    /// The result, if the task has finished and the result has been observed
    /// through this or any other clone.
    pub fn peek(&self) -> Option<&TaskResult> {
        self.inner.peek()
    }
}

impl Future for TaskFuture {
    type Output = TaskResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.inner).poll(cx)
    }
}

impl Debug for TaskFuture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskFuture")
            .field("key", &self.key)
            .field("done", &self.peek().is_some())
            .finish()
    }
}
