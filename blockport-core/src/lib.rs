//! Locality aware reads and indexed writes of block-structured files through
//! a distributed task executor.
//!
//! The filesystem ([`DistributedFileSystem`]) reports where every block of a
//! file lives; the executor ([`Executor`]) runs work near that data. This crate
//! only reshapes block metadata into tasks and output paths into write tasks.

pub mod block;
pub mod error;
pub mod executor;
pub mod fs;
pub mod locate;
pub mod logging;
pub mod port;
pub mod read;
pub mod task;
pub mod write;

pub use block::{BlockDescriptor, BlockLocation, WorkerId};
pub use error::{Error, ExecutorError, FsError, Result, TaskError};
pub use executor::{local::LocalExecutor, Executor};
pub use fs::{
    local::LocalFileSystem, object_fs::ObjectStoreFileSystem, BlockWriter, DistributedFileSystem,
};
pub use locate::locate;
pub use port::BlockPort;
pub use read::{read_binary, ReadOptions, ReadOutput};
pub use task::{Restrictions, Task, TaskFuture, TaskGraph, TaskKey, TaskResult, Value};
pub use write::{write, write_binary};
