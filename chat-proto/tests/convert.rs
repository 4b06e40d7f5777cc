use anyhow::Result;
use chat_core::{Message, MessageKind};
use chat_proto::{MessageRecord, ProtoError};

#[test]
fn test_record_roundtrip() -> Result<()> {
    let message = Message::chat("alice", "bob", "hello over grpc");

    let record = MessageRecord::from(&message);
    assert_eq!(record.kind, "chat");

    let decoded = Message::try_from(record)?;
    assert_eq!(decoded, message);
    Ok(())
}

#[test]
fn test_owned_conversion_matches_borrowed() {
    let message = Message::registration("alice");
    let borrowed = MessageRecord::from(&message);
    let owned = MessageRecord::from(message);
    assert_eq!(owned, borrowed);
}

#[test]
fn test_unknown_kind_fails_decode() {
    let record = MessageRecord {
        text: "x".to_owned(),
        sender: "a".to_owned(),
        receiver: "b".to_owned(),
        kind: "broadcast".to_owned(),
        timestamp: "2026-08-22T15:04:05Z".to_owned(),
    };

    assert!(matches!(
        Message::try_from(record),
        Err(ProtoError::UnknownKind(_))
    ));
}

#[test]
fn test_invalid_timestamp_fails_decode() {
    let record = MessageRecord {
        text: "x".to_owned(),
        sender: "a".to_owned(),
        receiver: "b".to_owned(),
        kind: "chat".to_owned(),
        timestamp: "yesterday".to_owned(),
    };

    assert!(matches!(
        Message::try_from(record),
        Err(ProtoError::InvalidTimestamp(_))
    ));
}

#[test]
fn test_timestamp_keeps_nanoseconds() -> Result<()> {
    let message = Message::chat("alice", "bob", "tick");
    let decoded = Message::try_from(MessageRecord::from(&message))?;
    assert_eq!(decoded.timestamp, message.timestamp);
    assert_eq!(decoded.kind, MessageKind::Chat);
    Ok(())
}
