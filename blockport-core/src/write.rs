use std::sync::Arc;

use blockport_common::OutputLayout;

use crate::{
    error::{Error, FsResult, Result, TaskError},
    executor::Executor,
    fs::{BlockWriter, DistributedFileSystem},
    task::{Task, TaskFuture, TaskGraph, TaskKey, Value},
};

/// Open writer that is aborted unless it was closed successfully.
///
/// Dropping the guard while still armed (e.g. the task was cancelled) spawns
/// the abort on the current runtime.
struct WriteGuard {
    filename: String,
    writer: Option<Box<dyn BlockWriter>>,
}

impl WriteGuard {
    fn new(filename: &str, writer: Box<dyn BlockWriter>) -> Self {
        WriteGuard {
            filename: filename.to_string(),
            writer: Some(writer),
        }
    }

    async fn write_all(&mut self, data: &[u8]) -> FsResult<()> {
        match self.writer.as_mut() {
            Some(writer) => writer.write_all(data).await,
            None => Ok(()),
        }
    }

    /// Closes the writer and disarms the guard. A failed close leaves it armed.
    async fn close(&mut self) -> FsResult<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer.close().await?;
        }
        self.writer = None;
        Ok(())
    }

    async fn abort(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.abort().await {
                tracing::warn!("Failed to abort write to {}: {}", self.filename, e);
            }
        }
    }
}

impl Drop for WriteGuard {
    fn drop(&mut self) {
        let Some(mut writer) = self.writer.take() else {
            return;
        };
        let filename = std::mem::take(&mut self.filename);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = writer.abort().await {
                        tracing::warn!("Failed to abort write to {}: {}", filename, e);
                    }
                });
            }
            Err(_) => tracing::warn!("Write to {} dropped outside a runtime, left as is", filename),
        }
    }
}

/// Write one buffer to `filename`, returning the number of bytes written.
///
/// Only [`Value::Bytes`] can be written; anything else is rejected before
/// the filesystem is touched. The file is aborted if writing or closing it
/// fails, or if the returned future is dropped half way.
pub async fn write(fs: &dyn DistributedFileSystem, filename: &str, data: Value) -> Result<u64> {
    let data = match data {
        Value::Bytes(data) => data,
        other => {
            return Err(Error::InvalidArgument(format!(
                "Data to write must be bytes, got {}",
                other.type_name()
            )))
        }
    };

    let mut guard = WriteGuard::new(filename, fs.create(filename).await?);
    let written = match guard.write_all(&data).await {
        Ok(()) => guard.close().await,
        Err(e) => Err(e),
    };
    if let Err(e) = written {
        guard.abort().await;
        return Err(e.into());
    }
    Ok(data.len() as u64)
}

/// Write the buffers produced by `futures` to one file each.
///
/// `path` is either a template such as `/data/file.*.dat`, where `*` is
/// replaced by the zero padded item index, or a directory under which the
/// files are named by index. Directories are created first. Returns one
/// future per item resolving to the number of bytes written, in input order.
pub async fn write_binary(
    fs: &Arc<dyn DistributedFileSystem>,
    executor: &dyn Executor,
    path: &str,
    futures: Vec<TaskFuture>,
) -> Result<Vec<TaskFuture>> {
    let layout = OutputLayout::new(path, futures.len())?;
    for directory in &layout.directories {
        fs.mkdir(directory).await?;
    }

    let mut graph = TaskGraph::new();
    for (filename, input) in layout.filenames.into_iter().zip(futures) {
        let key = TaskKey::Write {
            filename: filename.clone(),
        };
        let task_key = key.clone();
        let fs = fs.clone();
        let inputs = vec![input.clone()];

        let task = Task::new(key, move || async move {
            let data = input.await?;
            write(fs.as_ref(), &filename, data)
                .await
                .map(Value::Int)
                .map_err(|e| TaskError::failed(&task_key, e))
        });
        graph.push(task.with_inputs(inputs));
    }

    tracing::debug!("Writing {} buffers to {}", graph.len(), path);
    Ok(executor.submit(graph).await?)
}

#[cfg(test)]
mod tests {
    use std::{
        collections::BTreeSet,
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    use bytes::Bytes;
    use object_store::memory::InMemory;

    use super::*;
    use crate::{
        block::BlockLocation,
        error::FsError,
        fs::{local::LocalFileSystem, object_fs::ObjectStoreFileSystem},
    };

    /// Writer whose close always fails.
    struct BrokenClose {
        inner: Box<dyn BlockWriter>,
        aborts: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl BlockWriter for BrokenClose {
        async fn write_all(&mut self, data: &[u8]) -> FsResult<()> {
            self.inner.write_all(data).await
        }

        async fn close(&mut self) -> FsResult<()> {
            Err(FsError::Io(std::io::Error::other("close failed")))
        }

        async fn abort(&mut self) -> FsResult<()> {
            self.aborts.fetch_add(1, Ordering::SeqCst);
            self.inner.abort().await
        }
    }

    #[derive(Debug)]
    struct BrokenCloseFs {
        inner: LocalFileSystem,
        aborts: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl DistributedFileSystem for BrokenCloseFs {
        async fn glob(&self, pattern: &str) -> FsResult<Vec<String>> {
            self.inner.glob(pattern).await
        }

        async fn block_locations(&self, path: &str) -> FsResult<Vec<BlockLocation>> {
            self.inner.block_locations(path).await
        }

        async fn read_block(
            &self,
            path: &str,
            offset: u64,
            length: u64,
            delimiter: Option<&[u8]>,
        ) -> FsResult<Bytes> {
            self.inner.read_block(path, offset, length, delimiter).await
        }

        async fn create(&self, path: &str) -> FsResult<Box<dyn BlockWriter>> {
            Ok(Box::new(BrokenClose {
                inner: self.inner.create(path).await?,
                aborts: self.aborts.clone(),
            }))
        }

        async fn mkdir(&self, path: &str) -> FsResult<()> {
            self.inner.mkdir(path).await
        }

        async fn exists(&self, path: &str) -> FsResult<bool> {
            self.inner.exists(path).await
        }

        async fn size(&self, path: &str) -> FsResult<u64> {
            self.inner.size(path).await
        }
    }

    #[tokio::test]
    async fn write_returns_byte_count() {
        let fs = ObjectStoreFileSystem::new(Arc::new(InMemory::new()), 16, BTreeSet::new());
        let written = write(&fs, "/out/a", Value::Bytes(Bytes::from_static(b"abc")))
            .await
            .unwrap();
        assert_eq!(written, 3);
        assert_eq!(fs.size("/out/a").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn empty_buffer_is_written() {
        let fs = ObjectStoreFileSystem::new(Arc::new(InMemory::new()), 16, BTreeSet::new());
        assert_eq!(write(&fs, "/out/empty", Value::Bytes(Bytes::new())).await.unwrap(), 0);
        assert!(fs.exists("/out/empty").await.unwrap());
    }

    #[tokio::test]
    async fn null_is_rejected() {
        let fs = ObjectStoreFileSystem::new(Arc::new(InMemory::new()), 16, BTreeSet::new());
        let err = write(&fs, "/out/a", Value::Null).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid argument: Data to write must be bytes, got null");
    }

    #[tokio::test]
    async fn failed_close_aborts_the_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let fs = BrokenCloseFs {
            inner: LocalFileSystem::new(dir.path(), 16, BTreeSet::new()),
            aborts: Arc::new(AtomicUsize::new(0)),
        };

        let err = write(&fs, "/out/a", Value::Bytes(Bytes::from_static(b"abc")))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Filesystem(FsError::Io(_))));
        assert_eq!(fs.aborts.load(Ordering::SeqCst), 1);
        assert!(!dir.path().join("out/a").exists());
    }

    #[tokio::test]
    async fn dropped_guard_aborts_in_the_background() {
        let dir = tempfile::tempdir().expect("temp dir");
        let fs = LocalFileSystem::new(dir.path(), 16, BTreeSet::new());
        let target = dir.path().join("out/partial");

        let mut guard = WriteGuard::new("/out/partial", fs.create("/out/partial").await.unwrap());
        guard.write_all(b"half").await.unwrap();
        assert!(target.exists());
        drop(guard);

        tokio::time::timeout(Duration::from_secs(5), async {
            while target.exists() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("partial file removed");
    }

    #[tokio::test]
    async fn closed_guard_keeps_the_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let fs = LocalFileSystem::new(dir.path(), 16, BTreeSet::new());

        let mut guard = WriteGuard::new("/out/done", fs.create("/out/done").await.unwrap());
        guard.write_all(b"done").await.unwrap();
        guard.close().await.unwrap();
        drop(guard);

        tokio::task::yield_now().await;
        assert_eq!(std::fs::read(dir.path().join("out/done")).unwrap(), b"done");
    }
}
