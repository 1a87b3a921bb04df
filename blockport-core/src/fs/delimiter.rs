//! Record-aligned block reads.
//!
//! Blocks are cut at fixed byte offsets, which usually splits a record in
//! two. Given a delimiter, each block read is shifted to start after the first
//! delimiter at or past its offset and to end after the first delimiter at or
//! past its end, so that consecutive blocks cover every record exactly once.

use bytes::Bytes;

use crate::error::FsResult;

/// Random access to the bytes of one file.
#[async_trait::async_trait]
pub(crate) trait RangeSource: Send + Sync {
    async fn len(&self) -> FsResult<u64>;

    /// Bytes in `start..end`. Callers keep `end` within `len()`.
    async fn read_range(&self, start: u64, end: u64) -> FsResult<Bytes>;
}

pub(crate) async fn read_block<S: RangeSource + ?Sized>(
    source: &S,
    offset: u64,
    length: u64,
    delimiter: Option<&[u8]>,
    scan_size: usize,
) -> FsResult<Bytes> {
    let size = source.len().await?;
    let (start, end) = match delimiter {
        Some(delimiter) if !delimiter.is_empty() => {
            let start = seek_delimiter(source, offset, size, delimiter, scan_size).await?;
            let end = seek_delimiter(
                source,
                offset.saturating_add(length),
                size,
                delimiter,
                scan_size,
            )
            .await?;
            (start, end.max(start))
        }
        _ => (offset.min(size), offset.saturating_add(length).min(size)),
    };

    if start >= end {
        return Ok(Bytes::new());
    }
    source.read_range(start, end).await
}

/// Position just past the first `delimiter` found at or after `position`,
/// or the end of the file when there is none. Position zero is a record
/// boundary by definition.
pub(crate) async fn seek_delimiter<S: RangeSource + ?Sized>(
    source: &S,
    position: u64,
    size: u64,
    delimiter: &[u8],
    scan_size: usize,
) -> FsResult<u64> {
    if position == 0 {
        return Ok(0);
    }
    let scan_size = scan_size.max(delimiter.len()) as u64;
    let mut cursor = position;
    // Tail of the previous chunk, so delimiters spanning two chunks are found.
    let mut carry: Vec<u8> = Vec::new();

    while cursor < size {
        let chunk_end = cursor.saturating_add(scan_size).min(size);
        let chunk = source.read_range(cursor, chunk_end).await?;
        let window_start = cursor - carry.len() as u64;
        carry.extend_from_slice(&chunk);

        if let Some(i) = find(&carry, delimiter) {
            return Ok(window_start + (i + delimiter.len()) as u64);
        }

        let keep = delimiter.len().saturating_sub(1).min(carry.len());
        carry.drain(..carry.len() - keep);
        cursor = chunk_end;
    }
    Ok(size)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
