pub mod glob_path;
pub mod output_path;

pub use glob_path::{compile_pattern, has_glob, split_path_and_glob};
pub use output_path::{index_width, OutputLayout, OutputPathError};
