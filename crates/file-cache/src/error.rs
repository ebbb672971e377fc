//! Error types for the file cache

use crate::codec::CodecError;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum CacheError {
    /// The operation requires the key to be present
    NotFound(String),
    /// `add` requires the key to be absent
    AlreadyExists(String),
    /// Creating, reading or removing an artifact failed
    Storage {
        path: PathBuf,
        source: Box<std::io::Error>,
    },
    Serialization(CodecError),
    /// The sweeper was requested outside a tokio runtime
    NoRuntime(String),
}

impl CacheError {
    pub(crate) fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CacheError::Storage {
            path: path.into(),
            source: Box::new(source),
        }
    }
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::NotFound(key) => write!(f, "Item not found: {}", key),
            CacheError::AlreadyExists(key) => write!(f, "Item already exists: {}", key),
            CacheError::Storage { path, source } => {
                write!(f, "Storage error at {}: {}", path.display(), source)
            }
            CacheError::Serialization(err) => write!(f, "Serialization error: {}", err),
            CacheError::NoRuntime(msg) => write!(f, "No tokio runtime for sweeper: {}", msg),
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CacheError::Storage { source, .. } => Some(source.as_ref()),
            CacheError::Serialization(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CodecError> for CacheError {
    fn from(err: CodecError) -> Self {
        CacheError::Serialization(err)
    }
}

pub type Result<T> = std::result::Result<T, CacheError>;
