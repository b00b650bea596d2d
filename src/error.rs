use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors produced by the import pipeline and the catalog store.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("I/O failure at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed catalog {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("media tool failed on {}: {reason}", .video.display())]
    ExternalTool { video: PathBuf, reason: String },

    #[error("media tool timed out on {} after {after:?}", .video.display())]
    Timeout { video: PathBuf, after: Duration },

    #[error("no output folder chosen")]
    NoOutputFolder,

    #[error("an import is already running")]
    ImportInProgress,
}

/// Coarse error category exposed to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    Parse,
    ExternalTool,
    Config,
}

impl PipelineError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Io { .. } => ErrorKind::Io,
            PipelineError::Parse { .. } => ErrorKind::Parse,
            PipelineError::ExternalTool { .. } | PipelineError::Timeout { .. } => {
                ErrorKind::ExternalTool
            }
            PipelineError::NoOutputFolder | PipelineError::ImportInProgress => ErrorKind::Config,
        }
    }

    /// A value that could not be written out (e.g. a path that is not UTF-8).
    /// This is a write-side failure, never a corrupt file.
    pub fn unserializable(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, source),
        }
    }

    /// Convert a directory-walk failure. Loop detection carries no OS error,
    /// so it is reported as `InvalidData` at the offending path.
    pub fn from_walk(root: &std::path::Path, err: walkdir::Error) -> Self {
        let path = err
            .path()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| root.to_path_buf());
        let message = err.to_string();
        let source = err
            .into_io_error()
            .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidData, message));
        PipelineError::Io { path, source }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
