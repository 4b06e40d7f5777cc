use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Identity the hub speaks as when it originates a frame itself.
pub const SERVER_IDENTITY: &str = "server";

/// One chat frame as it travels between clients, the hub and the archive
/// services. The JSON field names are the wire contract, so renames here
/// are protocol changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub sender: String,
    pub receiver: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    NewClient,
    Chat,
    SessionEnd,
    Error,
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown message kind: {0}")]
pub struct UnknownKind(pub String);

impl MessageKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NewClient => "new_client",
            Self::Chat => "chat",
            Self::SessionEnd => "session_end",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new_client" => Ok(Self::NewClient),
            "chat" => Ok(Self::Chat),
            "session_end" => Ok(Self::SessionEnd),
            "error" => Ok(Self::Error),
            other => Err(UnknownKind(other.to_owned())),
        }
    }
}

impl Message {
    /// First frame a client sends after connecting, claiming `identity`.
    pub fn registration(identity: impl Into<String>) -> Self {
        let identity = identity.into();
        Self {
            text: identity.clone(),
            sender: identity,
            receiver: SERVER_IDENTITY.to_owned(),
            kind: MessageKind::NewClient,
            timestamp: Utc::now(),
        }
    }

    pub fn chat(
        sender: impl Into<String>,
        receiver: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            sender: sender.into(),
            receiver: receiver.into(),
            kind: MessageKind::Chat,
            timestamp: Utc::now(),
        }
    }

    pub fn session_end(sender: impl Into<String>) -> Self {
        Self {
            text: "Session ended".to_owned(),
            sender: sender.into(),
            receiver: SERVER_IDENTITY.to_owned(),
            kind: MessageKind::SessionEnd,
            timestamp: Utc::now(),
        }
    }

    /// Error frame addressed to one client, sent on behalf of the hub.
    pub fn error(receiver: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: SERVER_IDENTITY.to_owned(),
            receiver: receiver.into(),
            kind: MessageKind::Error,
            timestamp: Utc::now(),
        }
    }
}
