use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("storage '{storage}' is unavailable: {message}")]
    StorageUnavailable { storage: String, message: String },

    #[error("no snapshot available at or before {time} in storage '{storage}'")]
    NoSnapshotAvailable { time: String, storage: String },

    #[error("{command} failed: {message}")]
    EngineFailure { command: String, message: String },

    #[error("{context}: {}", path.display())]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn io(context: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            context,
            path: path.into(),
            source,
        }
    }
}
