#![allow(dead_code)]

use std::{
    collections::BTreeSet,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use blockport_core::{
    error::FsResult, BlockLocation, BlockWriter, DistributedFileSystem, ObjectStoreFileSystem,
    WorkerId,
};
use bytes::Bytes;
use object_store::{memory::InMemory, path::Path, ObjectStore, PutPayload};
use parking_lot::Mutex;

/// Object store backed filesystem that records how it is used.
#[derive(Debug)]
pub struct CountingFileSystem {
    pub store: Arc<dyn ObjectStore>,
    inner: ObjectStoreFileSystem,
    pub reads: AtomicUsize,
    pub creates: AtomicUsize,
    pub mkdirs: Mutex<Vec<String>>,
}

impl CountingFileSystem {
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }
}

pub fn hosts(names: &[&str]) -> BTreeSet<WorkerId> {
    names.iter().map(|n| WorkerId::from(*n)).collect()
}

/// Filesystem with the given files, split into `block_size` blocks stored on
/// `node-1` and `node-2`.
pub async fn memory_fs(files: &[(&str, &[u8])], block_size: u64) -> Arc<CountingFileSystem> {
    let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
    for (path, data) in files {
        store
            .put(&Path::from(*path), PutPayload::from(data.to_vec()))
            .await
            .expect("put object");
    }
    Arc::new(CountingFileSystem {
        store: store.clone(),
        inner: ObjectStoreFileSystem::new(store, block_size, hosts(&["node-1", "node-2"])),
        reads: AtomicUsize::new(0),
        creates: AtomicUsize::new(0),
        mkdirs: Mutex::new(Vec::new()),
    })
}

#[async_trait::async_trait]
impl DistributedFileSystem for CountingFileSystem {
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
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.read_block(path, offset, length, delimiter).await
    }

    async fn create(&self, path: &str) -> FsResult<Box<dyn BlockWriter>> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.inner.create(path).await
    }

    async fn mkdir(&self, path: &str) -> FsResult<()> {
        self.mkdirs.lock().push(path.to_string());
        self.inner.mkdir(path).await
    }

    async fn exists(&self, path: &str) -> FsResult<bool> {
        self.inner.exists(path).await
    }

    async fn size(&self, path: &str) -> FsResult<u64> {
        self.inner.size(path).await
    }
}
