use std::{collections::BTreeSet, fmt::Display};

use serde::{Deserialize, Serialize};

/// Name of a worker or storage host. Filesystems report block replicas by
/// host and executors place tasks by the same name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerId(String);

impl WorkerId {
    pub fn new(name: impl Into<String>) -> Self {
        WorkerId(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for WorkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WorkerId {
    fn from(value: &str) -> Self {
        WorkerId(value.to_string())
    }
}

impl From<String> for WorkerId {
    fn from(value: String) -> Self {
        WorkerId(value)
    }
}

/// One physical block of a file as reported by the filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockLocation {
    pub offset: u64,
    pub length: u64,
    pub hosts: BTreeSet<WorkerId>,
}

/// A [`BlockLocation`] together with the file it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDescriptor {
    pub filename: String,
    pub offset: u64,
    pub length: u64,
    pub hosts: BTreeSet<WorkerId>,
}

impl BlockDescriptor {
    pub fn new(filename: impl Into<String>, location: BlockLocation) -> Self {
        BlockDescriptor {
            filename: filename.into(),
            offset: location.offset,
            length: location.length,
            hosts: location.hosts,
        }
    }
}

/// Splits a file of `size` bytes into consecutive blocks of `block_size`
/// bytes, every block replicated on all of `hosts`. Empty files have no
/// blocks.
pub fn fixed_block_layout(size: u64, block_size: u64, hosts: &BTreeSet<WorkerId>) -> Vec<BlockLocation> {
    let block_size = block_size.max(1);
    (0..size)
        .step_by(block_size as usize)
        .map(|offset| BlockLocation {
            offset,
            length: block_size.min(size - offset),
            hosts: hosts.clone(),
        })
        .collect()
}
