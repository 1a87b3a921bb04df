use std::{collections::BTreeSet, fmt::Display, sync::Arc};

use bytes::Bytes;
use futures::TryStreamExt;
use object_store::{buffered::BufWriter, path::Path, ObjectStore};
use tokio::io::AsyncWriteExt;

use blockport_common::{compile_pattern, split_path_and_glob};

use super::{
    absolute,
    delimiter::{self, RangeSource},
    BlockWriter, DistributedFileSystem,
};
use crate::{
    block::{fixed_block_layout, BlockLocation, WorkerId},
    error::{FsError, FsResult},
};

/// [`DistributedFileSystem`] over any `object_store` backend.
///
/// Object stores do not expose a block layout, so every object is split into
/// fixed size blocks that are all reported on the configured hosts. The
/// namespace is flat: `mkdir` succeeds without doing anything.
#[derive(Debug, Clone)]
pub struct ObjectStoreFileSystem {
    inner: Arc<dyn ObjectStore>,
    block_size: u64,
    hosts: BTreeSet<WorkerId>,
    scan_size: usize,
}

impl ObjectStoreFileSystem {
    pub fn new(inner: Arc<dyn ObjectStore>, block_size: u64, hosts: BTreeSet<WorkerId>) -> Self {
        ObjectStoreFileSystem {
            inner,
            block_size: block_size.max(1),
            hosts,
            scan_size: 64 * 1024,
        }
    }

    pub fn from_config(inner: Arc<dyn ObjectStore>) -> Self {
        let config = &blockport_config::CONFIG;
        let hosts = config.host_list().into_iter().map(WorkerId::from).collect();
        Self::new(inner, config.block_size, hosts).with_scan_size(config.delimiter_scan_size)
    }

    pub fn with_scan_size(mut self, scan_size: usize) -> Self {
        self.scan_size = scan_size.max(1);
        self
    }

    fn location(path: &str) -> Path {
        Path::from(path)
    }

    async fn head_size(&self, path: &str) -> FsResult<u64> {
        let meta = self.inner.head(&Self::location(path)).await?;
        Ok(meta.size as u64)
    }
}

impl Display for ObjectStoreFileSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ObjectStoreFileSystem wrapping: {}", self.inner)
    }
}

struct ObjectRange<'a> {
    store: &'a dyn ObjectStore,
    location: Path,
}

#[async_trait::async_trait]
impl RangeSource for ObjectRange<'_> {
    async fn len(&self) -> FsResult<u64> {
        Ok(self.store.head(&self.location).await?.size as u64)
    }

    async fn read_range(&self, start: u64, end: u64) -> FsResult<Bytes> {
        Ok(self
            .store
            .get_range(&self.location, start as usize..end as usize)
            .await?)
    }
}

struct ObjectWriter(BufWriter);

#[async_trait::async_trait]
impl BlockWriter for ObjectWriter {
    async fn write_all(&mut self, data: &[u8]) -> FsResult<()> {
        Ok(self.0.write_all(data).await?)
    }

    async fn close(&mut self) -> FsResult<()> {
        Ok(self.0.shutdown().await?)
    }

    async fn abort(&mut self) -> FsResult<()> {
        Ok(self.0.abort().await?)
    }
}

#[async_trait::async_trait]
impl DistributedFileSystem for ObjectStoreFileSystem {
    async fn glob(&self, pattern: &str) -> FsResult<Vec<String>> {
        let pattern = absolute(pattern);
        let (base, glob) = split_path_and_glob(&pattern);

        if glob.is_none() {
            return Ok(if self.exists(&pattern).await? {
                vec![pattern]
            } else {
                Vec::new()
            });
        }

        let (matcher, options) = compile_pattern(&pattern)?;
        let prefix = Self::location(&base);
        let mut names: Vec<String> = self
            .inner
            .list(Some(&prefix))
            .map_ok(|meta| absolute(meta.location.as_ref()))
            .try_filter(|name| futures::future::ready(matcher.matches_with(name, options)))
            .try_collect()
            .await?;
        names.sort();

        tracing::debug!("glob {} matched {} objects", pattern, names.len());
        Ok(names)
    }

    async fn block_locations(&self, path: &str) -> FsResult<Vec<BlockLocation>> {
        let size = self.head_size(path).await?;
        Ok(fixed_block_layout(size, self.block_size, &self.hosts))
    }

    async fn read_block(
        &self,
        path: &str,
        offset: u64,
        length: u64,
        delimiter: Option<&[u8]>,
    ) -> FsResult<Bytes> {
        let source = ObjectRange {
            store: self.inner.as_ref(),
            location: Self::location(path),
        };
        delimiter::read_block(&source, offset, length, delimiter, self.scan_size).await
    }

    async fn create(&self, path: &str) -> FsResult<Box<dyn BlockWriter>> {
        let writer = BufWriter::new(self.inner.clone(), Self::location(path));
        Ok(Box::new(ObjectWriter(writer)))
    }

    async fn mkdir(&self, path: &str) -> FsResult<()> {
        tracing::trace!("mkdir {} is a no-op on an object store", path);
        Ok(())
    }

    async fn exists(&self, path: &str) -> FsResult<bool> {
        match self.inner.head(&Self::location(path)).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(FsError::ObjectStore(e)),
        }
    }

    async fn size(&self, path: &str) -> FsResult<u64> {
        self.head_size(path).await
    }
}
