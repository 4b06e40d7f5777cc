use crate::{backends::HistoryClient, registry::Registry};
use chat_core::Message;
use std::sync::Arc;
use tokio::sync::mpsc;

pub type ServerState = Arc<ServerData>;

pub struct ServerData {
    pub registry: Registry,
    pub history: HistoryClient,
    pub store_queue: mpsc::Sender<Message>,
}
