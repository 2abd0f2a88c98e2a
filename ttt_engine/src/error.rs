use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid move at {index}: {reason}")]
    InvalidMove { index: usize, reason: &'static str },

    #[error("value table at {path} is corrupt: {message}")]
    CorruptTable { path: PathBuf, message: String },

    #[error("match history at {path} is malformed: {source}")]
    HistoryFormat {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid learner setting {name} = {value}: {reason}")]
    InvalidConfig {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
