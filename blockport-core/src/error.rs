use blockport_common::OutputPathError;

pub type Result<T> = std::result::Result<T, Error>;
pub type FsResult<T> = std::result::Result<T, FsError>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Filesystem(#[from] FsError),
    #[error(transparent)]
    Executor(#[from] ExecutorError),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl From<OutputPathError> for Error {
    fn from(value: OutputPathError) -> Self {
        Error::InvalidArgument(value.to_string())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FsError {
    #[error("No files match {0}")]
    NoMatch(String),
    #[error("File not found: {0}")]
    NotFound(String),
    #[error("Invalid path {path}: {reason}")]
    InvalidPath { path: String, reason: String },
    #[error("Invalid glob pattern: {0}")]
    InvalidPattern(#[from] glob::PatternError),
    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error("Executor has no workers")]
    NoWorkers,
    #[error("No default executor has been registered")]
    NoDefault,
    #[error("Task {0} appears more than once in the submitted graph")]
    DuplicateKey(String),
}

/// Failure of a single task, delivered through its [`crate::TaskFuture`].
///
/// Task results are shared between every holder of a future, so the error
/// carries rendered messages rather than the source error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    #[error("Task {key} failed: {message}")]
    Failed { key: String, message: String },
    #[error("Task {key} has no eligible worker")]
    NoWorker { key: String },
    #[error("Task {key} was cancelled")]
    Cancelled { key: String },
}

impl TaskError {
    pub fn failed(key: impl ToString, err: impl std::fmt::Display) -> Self {
        TaskError::Failed {
            key: key.to_string(),
            message: err.to_string(),
        }
    }
}
