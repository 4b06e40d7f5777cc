pub mod error;

use chat_core::Message;
use error::{ArchiveError, ArchiveResult};
use std::{
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
};
use tokio::{fs, io::AsyncWriteExt as _};

/// Filesystem archive of chat messages: one directory per receiver, one
/// JSON record per message. Record keys are timestamp-first, so a sorted
/// directory listing is already in delivery order.
pub struct MessageArchive {
    root: PathBuf,
    seq: AtomicU64,
}

impl MessageArchive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            seq: AtomicU64::new(0),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Appends one message to the receiver's partition. Records go through
    /// a tmp-then-rename write and never replace an existing record.
    pub async fn append(&self, message: &Message) -> ArchiveResult<PathBuf> {
        let partition = self.partition(&message.receiver)?;
        fs::create_dir_all(&partition).await.map_err(|e| ArchiveError::Io {
            path: partition.clone(),
            source: e,
        })?;

        // A fresh process restarts the sequence at zero, so a key can land
        // on a record written before the restart. Advance past those.
        let (key, path) = loop {
            let key = self.record_key(message);
            let path = partition.join(&key);
            if fs::metadata(&path).await.is_err() {
                break (key, path);
            }
        };
        let tmp = partition.join(format!("{key}.tmp"));

        let payload = serde_json::to_vec(message).map_err(ArchiveError::Encode)?;
        write_durable(&tmp, &path, &payload).await?;

        tracing::debug!(receiver = %message.receiver, record = %key, "message archived");
        Ok(path)
    }

    /// Returns every record stored for `receiver`, oldest first. An unknown
    /// receiver yields an empty list, a record that no longer decodes fails
    /// the whole scan.
    pub async fn scan(&self, receiver: &str) -> ArchiveResult<Vec<Message>> {
        let partition = self.partition(receiver)?;

        let mut dir = match fs::read_dir(&partition).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(ArchiveError::Io {
                    path: partition,
                    source: e,
                });
            }
        };

        let mut records = Vec::new();
        while let Some(entry) = dir.next_entry().await.map_err(|e| ArchiveError::Io {
            path: partition.clone(),
            source: e,
        })? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some("json") {
                records.push(path);
            }
        }
        records.sort();

        let mut messages = Vec::with_capacity(records.len());
        for path in records {
            let bytes = fs::read(&path).await.map_err(|e| ArchiveError::Io {
                path: path.clone(),
                source: e,
            })?;
            let message = serde_json::from_slice(&bytes)
                .map_err(|e| ArchiveError::CorruptRecord { path, source: e })?;
            messages.push(message);
        }
        Ok(messages)
    }

    // The receiver names a directory under the root, anything that could
    // escape or alias a path is refused.
    fn partition(&self, receiver: &str) -> ArchiveResult<PathBuf> {
        if receiver.is_empty() || !receiver.chars().all(is_identity_char) {
            return Err(ArchiveError::InvalidReceiver(receiver.to_owned()));
        }
        Ok(self.root.join(receiver))
    }

    fn record_key(&self, message: &Message) -> String {
        let ts = message.timestamp.format("%Y%m%d%H%M%S%f");
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        format!("message_{ts}_{seq:06}_{}.json", sanitize(&message.sender))
    }
}

fn is_identity_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn sanitize(identity: &str) -> String {
    identity
        .chars()
        .map(|c| if is_identity_char(c) { c } else { '_' })
        .collect()
}

async fn write_durable(tmp: &Path, path: &Path, payload: &[u8]) -> ArchiveResult<()> {
    let io_err = |at: &Path| {
        let at = at.to_owned();
        move |source| ArchiveError::Io { path: at, source }
    };

    let mut file = fs::File::create(tmp).await.map_err(io_err(tmp))?;
    file.write_all(payload).await.map_err(io_err(tmp))?;
    file.sync_all().await.map_err(io_err(tmp))?;
    fs::rename(tmp, path).await.map_err(io_err(path))?;
    Ok(())
}
