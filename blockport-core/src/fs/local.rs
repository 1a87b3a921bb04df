use std::{
    collections::BTreeSet,
    io::SeekFrom,
    path::{Component, PathBuf},
};

use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};

use blockport_common::{compile_pattern, has_glob};

use super::{
    absolute,
    delimiter::{self, RangeSource},
    BlockWriter, DistributedFileSystem,
};
use crate::{
    block::{fixed_block_layout, BlockLocation, WorkerId},
    error::{FsError, FsResult},
};

/// [`DistributedFileSystem`] rooted at a directory on the local disk, with
/// `/` mapped to the root. Files are split into fixed size blocks, all
/// reported on the configured hosts.
#[derive(Debug, Clone)]
pub struct LocalFileSystem {
    root: PathBuf,
    block_size: u64,
    hosts: BTreeSet<WorkerId>,
    scan_size: usize,
}

impl LocalFileSystem {
    pub fn new(root: impl Into<PathBuf>, block_size: u64, hosts: BTreeSet<WorkerId>) -> Self {
        LocalFileSystem {
            root: root.into(),
            block_size: block_size.max(1),
            hosts,
            scan_size: 64 * 1024,
        }
    }

    pub fn from_config() -> Self {
        let config = &blockport_config::CONFIG;
        let hosts = config.host_list().into_iter().map(WorkerId::from).collect();
        Self::new(config.data_dir.clone(), config.block_size, hosts)
            .with_scan_size(config.delimiter_scan_size)
    }

    pub fn with_scan_size(mut self, scan_size: usize) -> Self {
        self.scan_size = scan_size.max(1);
        self
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    /// Maps a filesystem path below the root. Parent components are rejected
    /// so a path can never escape the root.
    fn resolve(&self, path: &str) -> FsResult<PathBuf> {
        let relative = std::path::Path::new(path.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
        {
            return Err(FsError::InvalidPath {
                path: path.to_string(),
                reason: "path escapes the filesystem root".to_string(),
            });
        }
        Ok(self.root.join(relative))
    }
}

fn name_under(root: &std::path::Path, full: &std::path::Path) -> Option<String> {
    let relative = full.strip_prefix(root).ok()?;
    Some(absolute(&relative.to_string_lossy().replace('\\', "/")))
}

struct LocalRange {
    path: PathBuf,
}

#[async_trait::async_trait]
impl RangeSource for LocalRange {
    async fn len(&self) -> FsResult<u64> {
        Ok(tokio::fs::metadata(&self.path).await?.len())
    }

    async fn read_range(&self, start: u64, end: u64) -> FsResult<Bytes> {
        let mut file = tokio::fs::File::open(&self.path).await?;
        file.seek(SeekFrom::Start(start)).await?;
        let mut buf = vec![0u8; (end - start) as usize];
        file.read_exact(&mut buf).await?;
        Ok(Bytes::from(buf))
    }
}

struct LocalWriter {
    path: PathBuf,
    file: tokio::fs::File,
}

#[async_trait::async_trait]
impl BlockWriter for LocalWriter {
    async fn write_all(&mut self, data: &[u8]) -> FsResult<()> {
        Ok(self.file.write_all(data).await?)
    }

    async fn close(&mut self) -> FsResult<()> {
        self.file.flush().await?;
        self.file.sync_all().await?;
        Ok(())
    }

    async fn abort(&mut self) -> FsResult<()> {
        match tokio::fs::remove_file(&self.path).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl DistributedFileSystem for LocalFileSystem {
    async fn glob(&self, pattern: &str) -> FsResult<Vec<String>> {
        let full = self.resolve(pattern)?;

        if !has_glob(pattern) {
            let is_file = matches!(tokio::fs::metadata(&full).await, Ok(meta) if meta.is_file());
            return Ok(if is_file {
                vec![absolute(pattern)]
            } else {
                Vec::new()
            });
        }

        let relative = pattern.trim_start_matches('/').to_string();
        let root = self.root.clone();
        let mut names = tokio::task::spawn_blocking(move || -> FsResult<Vec<String>> {
            // Matches come back under the literal pattern prefix, so anchor the
            // pattern at the canonical root to be able to strip it again.
            let root = match std::fs::canonicalize(&root) {
                Ok(root) => root,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
                Err(e) => return Err(e.into()),
            };
            let escaped_root = glob::Pattern::escape(&root.to_string_lossy());
            let full_pattern = format!("{}/{}", escaped_root.trim_end_matches('/'), relative);
            let (_, options) = compile_pattern(&full_pattern)?;

            let mut names = Vec::new();
            for entry in glob::glob_with(&full_pattern, options)? {
                let path = entry.map_err(glob::GlobError::into_error)?;
                if path.is_file() {
                    names.extend(name_under(&root, &path));
                }
            }
            Ok(names)
        })
        .await
        .map_err(std::io::Error::other)??;

        names.sort();
        tracing::debug!("glob {} matched {} files", pattern, names.len());
        Ok(names)
    }

    async fn block_locations(&self, path: &str) -> FsResult<Vec<BlockLocation>> {
        let size = self.size(path).await?;
        Ok(fixed_block_layout(size, self.block_size, &self.hosts))
    }

    async fn read_block(
        &self,
        path: &str,
        offset: u64,
        length: u64,
        delimiter: Option<&[u8]>,
    ) -> FsResult<Bytes> {
        let source = LocalRange {
            path: self.resolve(path)?,
        };
        delimiter::read_block(&source, offset, length, delimiter, self.scan_size).await
    }

    async fn create(&self, path: &str) -> FsResult<Box<dyn BlockWriter>> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let file = tokio::fs::File::create(&full).await?;
        Ok(Box::new(LocalWriter { path: full, file }))
    }

    async fn mkdir(&self, path: &str) -> FsResult<()> {
        let full = self.resolve(path)?;
        tokio::fs::create_dir_all(&full).await?;
        Ok(())
    }

    async fn exists(&self, path: &str) -> FsResult<bool> {
        Ok(tokio::fs::try_exists(self.resolve(path)?).await?)
    }

    async fn size(&self, path: &str) -> FsResult<u64> {
        let full = self.resolve(path)?;
        match tokio::fs::metadata(&full).await {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(FsError::NotFound(absolute(path)))
            }
            Err(e) => Err(e.into()),
        }
    }
}
