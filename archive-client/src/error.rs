use std::path::PathBuf;

pub type ArchiveResult<T> = Result<T, ArchiveError>;

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("Receiver {0:?} cannot name an archive partition")]
    InvalidReceiver(String),

    #[error("I/O failure at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode message record: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Corrupt record {}: {source}", .path.display())]
    CorruptRecord {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
