use chat_core::{Message, UnknownKind};
use chrono::{DateTime, Utc};

pub mod v1 {
    tonic::include_proto!("chat.v1");
}

pub use v1::message_history_client::MessageHistoryClient;
pub use v1::message_history_server::{MessageHistory, MessageHistoryServer};
pub use v1::message_store_client::MessageStoreClient;
pub use v1::message_store_server::{MessageStore, MessageStoreServer};
pub use v1::MessageRecord;

pub type ProtoResult<T> = Result<T, ProtoError>;

#[derive(Debug, thiserror::Error)]
pub enum ProtoError {
    #[error("Record carries an unknown kind: {0}")]
    UnknownKind(#[from] UnknownKind),
    #[error("Record carries an invalid timestamp: {0}")]
    InvalidTimestamp(#[from] chrono::ParseError),
}

impl From<&Message> for MessageRecord {
    fn from(message: &Message) -> Self {
        Self {
            text: message.text.clone(),
            sender: message.sender.clone(),
            receiver: message.receiver.clone(),
            kind: message.kind.as_str().to_owned(),
            timestamp: message.timestamp.to_rfc3339(),
        }
    }
}

impl From<Message> for MessageRecord {
    fn from(message: Message) -> Self {
        Self {
            kind: message.kind.as_str().to_owned(),
            timestamp: message.timestamp.to_rfc3339(),
            text: message.text,
            sender: message.sender,
            receiver: message.receiver,
        }
    }
}

impl TryFrom<MessageRecord> for Message {
    type Error = ProtoError;

    fn try_from(record: MessageRecord) -> ProtoResult<Self> {
        let kind = record.kind.parse()?;
        let timestamp = DateTime::parse_from_rfc3339(&record.timestamp)?.with_timezone(&Utc);

        Ok(Self {
            text: record.text,
            sender: record.sender,
            receiver: record.receiver,
            kind,
            timestamp,
        })
    }
}
