use std::sync::Arc;

use bytes::Bytes;

use crate::{
    block::BlockDescriptor,
    error::{Result, TaskError},
    executor::Executor,
    fs::DistributedFileSystem,
    locate::locate,
    task::{Task, TaskFuture, TaskGraph, TaskKey, Value},
};

#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    /// Build the read tasks without submitting them.
    pub lazy: bool,
    /// Align every block to whole records ending in this delimiter.
    pub delimiter: Option<Bytes>,
}

impl ReadOptions {
    pub fn lazy() -> Self {
        ReadOptions {
            lazy: true,
            ..Default::default()
        }
    }

    pub fn with_delimiter(mut self, delimiter: impl Into<Bytes>) -> Self {
        self.delimiter = Some(delimiter.into());
        self
    }
}

#[derive(Debug)]
pub enum ReadOutput {
    /// One future per block, already running.
    Eager(Vec<TaskFuture>),
    /// One deferred task per block together with the placement hints to
    /// submit them with.
    Lazy(TaskGraph),
}

impl ReadOutput {
    pub fn len(&self) -> usize {
        match self {
            ReadOutput::Eager(futures) => futures.len(),
            ReadOutput::Lazy(graph) => graph.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_futures(self) -> Option<Vec<TaskFuture>> {
        match self {
            ReadOutput::Eager(futures) => Some(futures),
            ReadOutput::Lazy(_) => None,
        }
    }

    pub fn into_graph(self) -> Option<TaskGraph> {
        match self {
            ReadOutput::Lazy(graph) => Some(graph),
            ReadOutput::Eager(_) => None,
        }
    }
}

/// Turn every block of the files matching `path` into a read task placed
/// near the hosts storing that block.
///
/// Restrictions are loose: a block may be read by any worker when none of
/// its hosts runs one. With `options.lazy` the tasks are returned as a graph
/// for the caller to submit; otherwise they are submitted right away.
pub async fn read_binary(
    fs: &Arc<dyn DistributedFileSystem>,
    executor: &dyn Executor,
    path: &str,
    options: ReadOptions,
) -> Result<ReadOutput> {
    let blocks = locate(fs.as_ref(), path).await?;
    tracing::debug!("Read {} blocks of binary bytes from {}", blocks.len(), path);

    let graph = read_graph(fs, blocks, options.delimiter);
    if options.lazy {
        return Ok(ReadOutput::Lazy(graph));
    }
    Ok(ReadOutput::Eager(executor.submit(graph).await?))
}

fn read_graph(
    fs: &Arc<dyn DistributedFileSystem>,
    blocks: Vec<BlockDescriptor>,
    delimiter: Option<Bytes>,
) -> TaskGraph {
    let mut graph = TaskGraph::new();
    for block in blocks {
        let BlockDescriptor {
            filename,
            offset,
            length,
            hosts,
        } = block;
        let key = TaskKey::read_binary(filename.clone(), offset, length);
        let task_key = key.clone();
        let fs = fs.clone();
        let delimiter = delimiter.clone();

        let task = Task::new(key, move || async move {
            fs.read_block(&filename, offset, length, delimiter.as_deref())
                .await
                .map(Value::Bytes)
                .map_err(|e| TaskError::failed(&task_key, e))
        });
        graph.push_restricted(task, hosts, true);
    }
    graph
}
