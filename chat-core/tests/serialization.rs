use anyhow::Result;
use chat_core::{Message, MessageKind, SERVER_IDENTITY};
use chrono::{TimeZone, Utc};

#[test]
fn test_chat_message_serialization() -> Result<()> {
    let message = Message {
        text: "hi".to_owned(),
        sender: "alice".to_owned(),
        receiver: "bob".to_owned(),
        kind: MessageKind::Chat,
        timestamp: Utc.with_ymd_and_hms(2026, 8, 22, 15, 4, 5).unwrap(),
    };

    let json = serde_json::to_string(&message)?;
    assert_eq!(
        json,
        r#"{"text":"hi","sender":"alice","receiver":"bob","type":"chat","timestamp":"2026-08-22T15:04:05Z"}"#
    );
    Ok(())
}

#[test]
fn test_kind_serialization() -> Result<()> {
    assert_eq!(serde_json::to_string(&MessageKind::NewClient)?, r#""new_client""#);
    assert_eq!(serde_json::to_string(&MessageKind::Chat)?, r#""chat""#);
    assert_eq!(serde_json::to_string(&MessageKind::SessionEnd)?, r#""session_end""#);
    assert_eq!(serde_json::to_string(&MessageKind::Error)?, r#""error""#);
    Ok(())
}

#[test]
fn test_foreign_frame_deserialization() -> Result<()> {
    let json = r#"{
        "timestamp": "2026-08-22T15:04:05.123456789Z",
        "type": "new_client",
        "receiver": "server",
        "sender": "alice",
        "text": "alice"
    }"#;

    let message: Message = serde_json::from_str(json)?;
    assert_eq!(message.kind, MessageKind::NewClient);
    assert_eq!(message.sender, "alice");
    assert_eq!(message.receiver, SERVER_IDENTITY);
    assert_eq!(message.timestamp.timestamp_subsec_nanos(), 123_456_789);
    Ok(())
}

#[test]
fn test_roundtrip_preserves_timestamp() -> Result<()> {
    let message = Message::chat("alice", "bob", "hello");
    let decoded: Message = serde_json::from_str(&serde_json::to_string(&message)?)?;
    assert_eq!(decoded, message);
    Ok(())
}

#[test]
fn test_unknown_kind_rejected() {
    let json = r#"{"text":"x","sender":"a","receiver":"b","type":"broadcast","timestamp":"2026-08-22T15:04:05Z"}"#;
    assert!(serde_json::from_str::<Message>(json).is_err());

    let err = "broadcast".parse::<MessageKind>().unwrap_err();
    assert_eq!(err.to_string(), "Unknown message kind: broadcast");
}

#[test]
fn test_kind_parse_matches_display() -> Result<()> {
    for kind in [
        MessageKind::NewClient,
        MessageKind::Chat,
        MessageKind::SessionEnd,
        MessageKind::Error,
    ] {
        assert_eq!(kind.as_str().parse::<MessageKind>()?, kind);
    }
    Ok(())
}

#[test]
fn test_registration_frame() {
    let message = Message::registration("alice");
    assert_eq!(message.kind, MessageKind::NewClient);
    assert_eq!(message.text, "alice");
    assert_eq!(message.sender, "alice");
    assert_eq!(message.receiver, SERVER_IDENTITY);
}

#[test]
fn test_error_frame_comes_from_server() {
    let message = Message::error("alice", "identity \"alice\" is already in use");
    assert_eq!(message.kind, MessageKind::Error);
    assert_eq!(message.sender, SERVER_IDENTITY);
    assert_eq!(message.receiver, "alice");
}
