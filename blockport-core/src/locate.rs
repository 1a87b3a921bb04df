use crate::{
    block::BlockDescriptor,
    error::{FsError, Result},
    fs::DistributedFileSystem,
};

/// Expand `path` (a file name or glob pattern) and list the physical blocks
/// of every matching file.
///
/// Blocks are returned file by file in the order the filesystem enumerates
/// the files, and in the filesystem's own block order within a file.
pub async fn locate(fs: &dyn DistributedFileSystem, path: &str) -> Result<Vec<BlockDescriptor>> {
    let filenames = fs.glob(path).await?;
    if filenames.is_empty() {
        return Err(FsError::NoMatch(path.to_string()).into());
    }

    let mut blocks = Vec::new();
    for filename in &filenames {
        let locations = fs.block_locations(filename).await?;
        blocks.extend(
            locations
                .into_iter()
                .map(|location| BlockDescriptor::new(filename.clone(), location)),
        );
    }

    tracing::debug!(
        "Located {} blocks in {} files matching {}",
        blocks.len(),
        filenames.len(),
        path
    );
    Ok(blocks)
}
