//! Naming of the files produced when a sequence of buffers is written out.
//!
//! An output path is either a template such as `/data/file.*.dat`, where every
//! `*` is replaced by the item index, or a plain directory such as `/data`
//! under which the items are named by index alone. Indices are zero padded
//! to the width of the largest index so that names sort lexically.

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum OutputPathError {
    #[error("Cannot name output files for an empty sequence (path: {0})")]
    EmptySequence(String),
}

/// Number of decimal digits needed to render every index in `0..count`.
pub fn index_width(count: usize) -> usize {
    count
        .saturating_sub(1)
        .checked_ilog10()
        .map_or(1, |digits| digits as usize + 1)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    /// Directories that have to exist before any file is written. A `*` in
    /// the directory part yields one directory per item; a template without a
    /// directory component yields none.
    pub directories: Vec<String>,
    pub filenames: Vec<String>,
}

impl OutputLayout {
    pub fn new(path: &str, count: usize) -> Result<Self, OutputPathError> {
        if count == 0 {
            return Err(OutputPathError::EmptySequence(path.to_string()));
        }
        let width = index_width(count);
        let pad = |i: usize| format!("{:0width$}", i, width = width);

        if path.contains('*') {
            let directories = match path.rfind('/') {
                Some(0) => vec!["/".to_string()],
                Some(i) if path[..i].contains('*') => {
                    (0..count).map(|n| path[..i].replace('*', &pad(n))).collect()
                }
                Some(i) => vec![path[..i].to_string()],
                None => Vec::new(),
            };
            let filenames = (0..count).map(|i| path.replace('*', &pad(i))).collect();
            Ok(Self {
                directories,
                filenames,
            })
        } else {
            let filenames = (0..count)
                .map(|i| {
                    if path.ends_with('/') {
                        format!("{}{}", path, pad(i))
                    } else {
                        format!("{}/{}", path, pad(i))
                    }
                })
                .collect();
            Ok(Self {
                directories: vec![path.to_string()],
                filenames,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_covers_largest_index() {
        assert_eq!(index_width(1), 1);
        assert_eq!(index_width(10), 1);
        assert_eq!(index_width(11), 2);
        assert_eq!(index_width(12), 2);
        assert_eq!(index_width(100), 2);
        assert_eq!(index_width(101), 3);
    }

    #[test]
    fn single_item_template() {
        let layout = OutputLayout::new("/data/file.*.dat", 1).unwrap();
        assert_eq!(layout.directories, vec!["/data"]);
        assert_eq!(layout.filenames, vec!["/data/file.0.dat"]);
    }

    #[test]
    fn two_digit_counts_are_padded() {
        let layout = OutputLayout::new("/data/file.*.dat", 12).unwrap();
        assert_eq!(layout.filenames.len(), 12);
        assert_eq!(layout.filenames[0], "/data/file.00.dat");
        assert_eq!(layout.filenames[9], "/data/file.09.dat");
        assert_eq!(layout.filenames[11], "/data/file.11.dat");
    }

    #[test]
    fn every_wildcard_is_substituted() {
        let layout = OutputLayout::new("/out/*/part-*.bin", 2).unwrap();
        assert_eq!(layout.filenames, vec!["/out/0/part-0.bin", "/out/1/part-1.bin"]);
        assert_eq!(layout.directories, vec!["/out/0", "/out/1"]);
    }

    #[test]
    fn directory_target() {
        let layout = OutputLayout::new("/data", 3).unwrap();
        assert_eq!(layout.directories, vec!["/data"]);
        assert_eq!(layout.filenames, vec!["/data/0", "/data/1", "/data/2"]);

        let layout = OutputLayout::new("/data/", 2).unwrap();
        assert_eq!(layout.filenames, vec!["/data/0", "/data/1"]);
    }

    #[test]
    fn template_without_directory() {
        let layout = OutputLayout::new("part-*.dat", 1).unwrap();
        assert!(layout.directories.is_empty());
        assert_eq!(layout.filenames, vec!["part-0.dat"]);

        let layout = OutputLayout::new("/part-*.dat", 1).unwrap();
        assert_eq!(layout.directories, vec!["/"]);
    }

    #[test]
    fn empty_sequence_is_rejected() {
        assert_eq!(
            OutputLayout::new("/data", 0),
            Err(OutputPathError::EmptySequence("/data".to_string()))
        );
    }
}
