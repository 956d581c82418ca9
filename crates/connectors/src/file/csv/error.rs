use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FileError {
    #[error("File already exists: {0}")]
    AlreadyExists(PathBuf),
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV write error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("Record has {got} fields but the header has {expected}")]
    ArityMismatch { expected: usize, got: usize },
    #[error("Invalid path: {0}")]
    InvalidPath(PathBuf),
}

impl FileError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FileError::Io {
            path: path.into(),
            source,
        }
    }
}
