use crate::{
    registry::{ClientHandle, DeliveryOutcome, OUTBOUND_BUFFER_SIZE, RegisterOutcome},
    state::ServerState,
};
use axum::{
    extract::{
        State, WebSocketUpgrade,
        ws::{Message as WsMessage, WebSocket},
    },
    response::IntoResponse,
};
use chat_core::{Message, MessageKind};
use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use tokio::sync::mpsc;
use uuid::Uuid;

pub async fn websocket_handler(
    State(state): State<ServerState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| session(state, socket))
}

async fn session(state: ServerState, socket: WebSocket) {
    let conn = Uuid::now_v7();
    let (ws_sender, ws_receiver) = socket.split();
    let (tx, rx) = mpsc::channel(OUTBOUND_BUFFER_SIZE);

    let send_task = tokio::spawn(write_frames(ws_sender, rx));

    let identity = read_frames(&state, conn, &tx, ws_receiver).await;

    // Whatever ended the read side, the identity must not stay claimed by
    // a dead connection.
    if let Some(identity) = identity.as_deref() {
        state.registry.deregister(identity, conn);
    }
    send_task.abort();

    tracing::info!(conn = %conn, identity = identity.as_deref().unwrap_or("-"), "session closed");
}

async fn write_frames(mut sink: SplitSink<WebSocket, WsMessage>, mut rx: mpsc::Receiver<Message>) {
    while let Some(message) = rx.recv().await {
        if let Ok(text) = serde_json::to_string(&message)
            && sink.send(WsMessage::Text(text.into())).await.is_err()
        {
            break;
        }
    }
}

/// Reads frames until the connection errors, closes or sends something
/// undecodable. Returns the identity this connection registered, if any.
async fn read_frames(
    state: &ServerState,
    conn: Uuid,
    tx: &mpsc::Sender<Message>,
    mut stream: SplitStream<WebSocket>,
) -> Option<String> {
    let mut identity: Option<String> = None;

    while let Some(frame) = stream.next().await {
        let decoded = match frame {
            Ok(WsMessage::Text(text)) => serde_json::from_str::<Message>(&text),
            Ok(WsMessage::Binary(bytes)) => serde_json::from_slice::<Message>(&bytes),
            Ok(WsMessage::Close(_)) => break,
            // Ping/pong are answered by axum itself.
            Ok(_) => continue,
            Err(e) => {
                tracing::warn!(conn = %conn, error = %e, "websocket read failed");
                break;
            }
        };

        let message = match decoded {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(conn = %conn, error = %e, "undecodable frame, closing session");
                break;
            }
        };

        match message.kind {
            MessageKind::NewClient => {
                handle_registration(state, conn, tx, &mut identity, message).await;
            }
            MessageKind::Chat => handle_chat(state, message).await,
            MessageKind::SessionEnd => {
                tracing::info!(conn = %conn, sender = %message.sender, "client announced session end");
                if let Some(identity) = identity.take() {
                    state.registry.deregister(&identity, conn);
                }
            }
            MessageKind::Error => {
                tracing::warn!(conn = %conn, sender = %message.sender, text = %message.text, "ignoring error frame from client");
            }
        }
    }

    identity
}

// The identity a client claims travels in the frame's text field.
async fn handle_registration(
    state: &ServerState,
    conn: Uuid,
    tx: &mpsc::Sender<Message>,
    identity: &mut Option<String>,
    message: Message,
) {
    let requested = message.text;

    if identity.is_some() {
        tracing::warn!(conn = %conn, requested = %requested, "connection tried to register twice");
        let rejection = Message::error(
            &requested,
            format!("connection is already registered, \"{requested}\" was not assigned"),
        );
        let _ = tx.send(rejection).await;
        return;
    }

    match state.registry.register(&requested, ClientHandle::new(conn, tx.clone())) {
        RegisterOutcome::Registered => {
            *identity = Some(requested.clone());
            tokio::spawn(replay_history(state.clone(), requested, conn));
        }
        RegisterOutcome::IdentityTaken => {
            let rejection = Message::error(
                &requested,
                format!("identity \"{requested}\" is already in use, no identity was assigned"),
            );
            let _ = tx.send(rejection).await;
        }
    }
}

// Both handoffs must finish before the sender's next frame is read, so one
// connection cannot flood past either bound.
async fn handle_chat(state: &ServerState, message: Message) {
    tracing::info!(sender = %message.sender, receiver = %message.receiver, "routing chat message");

    let receiver = message.receiver.clone();
    let (delivery, stored) = tokio::join!(
        state.registry.deliver(&receiver, message.clone()),
        state.store_queue.send(message),
    );

    match delivery {
        DeliveryOutcome::Delivered => {}
        DeliveryOutcome::Offline => {
            tracing::debug!(receiver = %receiver, "receiver offline, message kept for replay");
        }
        DeliveryOutcome::ConnectionGone => {
            tracing::warn!(receiver = %receiver, "receiver connection was dead, dropped it");
        }
    }

    if stored.is_err() {
        tracing::error!(receiver = %receiver, "store queue is closed, message not persisted");
    }
}

async fn replay_history(state: ServerState, identity: String, conn: Uuid) {
    let messages = match state.history.fetch_all(&identity).await {
        Ok(messages) => messages,
        Err(e) => {
            tracing::error!(identity = %identity, error = %e, "history fetch failed, nothing replayed");
            return;
        }
    };

    if messages.is_empty() {
        return;
    }
    tracing::info!(identity = %identity, count = messages.len(), "replaying stored messages");

    for message in messages {
        if state.registry.deliver_to(&identity, conn, message).await != DeliveryOutcome::Delivered {
            tracing::debug!(identity = %identity, "client went away during replay");
            break;
        }
    }
}
