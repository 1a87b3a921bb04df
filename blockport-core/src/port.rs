use std::sync::Arc;

use crate::{
    block::BlockDescriptor,
    error::Result,
    executor::{self, local::LocalExecutor, Executor},
    fs::{local::LocalFileSystem, DistributedFileSystem},
    locate::locate,
    read::{read_binary, ReadOptions, ReadOutput},
    task::{TaskFuture, Value},
    write::{write, write_binary},
};

/// A filesystem paired with the executor its blocks are read and written
/// through.
#[derive(Debug, Clone)]
pub struct BlockPort {
    fs: Arc<dyn DistributedFileSystem>,
    executor: Arc<dyn Executor>,
}

impl BlockPort {
    pub fn new(fs: Arc<dyn DistributedFileSystem>, executor: Arc<dyn Executor>) -> Self {
        BlockPort { fs, executor }
    }

    /// Resolve the defaults once, at start up: the registered default
    /// executor (an in-process [`LocalExecutor`] from the configuration is
    /// created and registered when there is none) and a [`LocalFileSystem`]
    /// over the configured data directory.
    pub fn from_defaults() -> anyhow::Result<Self> {
        let executor = match executor::default_executor() {
            Ok(executor) => executor,
            Err(_) => {
                let local: Arc<dyn Executor> = Arc::new(LocalExecutor::from_config());
                if local.workers().is_empty() {
                    anyhow::bail!("No workers configured for the local executor");
                }
                tracing::info!("Using local executor with workers {:?}", local.workers());
                executor::set_default(local.clone());
                local
            }
        };
        let fs = Arc::new(LocalFileSystem::from_config());
        tracing::info!("Using local filesystem rooted at {}", fs.root().display());
        Ok(Self::new(fs, executor))
    }

    pub fn filesystem(&self) -> &Arc<dyn DistributedFileSystem> {
        &self.fs
    }

    pub fn executor(&self) -> &Arc<dyn Executor> {
        &self.executor
    }

    pub async fn locate(&self, path: &str) -> Result<Vec<BlockDescriptor>> {
        locate(self.fs.as_ref(), path).await
    }

    pub async fn read_binary(&self, path: &str, options: ReadOptions) -> Result<ReadOutput> {
        read_binary(&self.fs, self.executor.as_ref(), path, options).await
    }

    pub async fn write(&self, filename: &str, data: Value) -> Result<u64> {
        write(self.fs.as_ref(), filename, data).await
    }

    pub async fn write_binary(&self, path: &str, futures: Vec<TaskFuture>) -> Result<Vec<TaskFuture>> {
        write_binary(&self.fs, self.executor.as_ref(), path, futures).await
    }
}
