//! Filesystem abstraction.
//!
//! Everything this crate needs from a distributed filesystem goes through
//! [`DistributedFileSystem`]. Two reference backends are provided:
//! - [`object_fs::ObjectStoreFileSystem`] for any `object_store` backend
//! - [`local::LocalFileSystem`] for a directory on the local disk

use std::fmt::Debug;

use bytes::Bytes;

use crate::{block::BlockLocation, error::FsResult};

pub mod delimiter;
pub mod local;
pub mod object_fs;

#[async_trait::async_trait]
pub trait DistributedFileSystem: Debug + Send + Sync {
    /// Expand a path or glob pattern into the matching file names. A plain
    /// path that does not exist yields an empty list.
    async fn glob(&self, pattern: &str) -> FsResult<Vec<String>>;

    /// Physical block layout of a file, in file order.
    async fn block_locations(&self, path: &str) -> FsResult<Vec<BlockLocation>>;

    /// Read `length` bytes starting at `offset`.
    ///
    /// With a delimiter the range is widened to whole records: unless
    /// `offset` is zero the read starts just past the first delimiter at or
    /// after `offset`, and it ends just past the first delimiter at or after
    /// `offset + length` (or at the end of the file).
    async fn read_block(
        &self,
        path: &str,
        offset: u64,
        length: u64,
        delimiter: Option<&[u8]>,
    ) -> FsResult<Bytes>;

    /// Open `path` for writing, replacing any existing file.
    async fn create(&self, path: &str) -> FsResult<Box<dyn BlockWriter>>;

    /// Create a directory and its parents. Existing directories are fine.
    async fn mkdir(&self, path: &str) -> FsResult<()>;

    async fn exists(&self, path: &str) -> FsResult<bool>;

    /// Size of a file in bytes.
    async fn size(&self, path: &str) -> FsResult<u64>;
}

/// A file opened for writing. Data only becomes visible after `close`;
/// `abort` discards whatever has been written. A writer that failed to
/// close can still be aborted.
#[async_trait::async_trait]
pub trait BlockWriter: Send {
    async fn write_all(&mut self, data: &[u8]) -> FsResult<()>;

    async fn close(&mut self) -> FsResult<()>;

    async fn abort(&mut self) -> FsResult<()>;
}

/// Prefixes relative paths with `/` so all backends report absolute names.
pub(crate) fn absolute(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}
