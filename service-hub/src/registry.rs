use chat_core::Message;
use dashmap::{DashMap, mapref::entry::Entry};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Frames queued towards one client before senders start waiting on it.
pub const OUTBOUND_BUFFER_SIZE: usize = 64;

/// Write handle for one live connection.
#[derive(Clone)]
pub struct ClientHandle {
    conn: Uuid,
    tx: mpsc::Sender<Message>,
}

impl ClientHandle {
    pub fn new(conn: Uuid, tx: mpsc::Sender<Message>) -> Self {
        Self { conn, tx }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    Registered,
    IdentityTaken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    Offline,
    ConnectionGone,
}

/// Identity to connection map. All mutation goes through this type.
#[derive(Default)]
pub struct Registry {
    clients: DashMap<String, ClientHandle>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            clients: DashMap::new(),
        }
    }

    /// Claims `identity` for a connection. First writer wins, a second
    /// claim leaves the original holder untouched.
    pub fn register(&self, identity: &str, handle: ClientHandle) -> RegisterOutcome {
        let outcome = match self.clients.entry(identity.to_owned()) {
            Entry::Occupied(_) => RegisterOutcome::IdentityTaken,
            Entry::Vacant(slot) => {
                slot.insert(handle);
                RegisterOutcome::Registered
            }
        };

        match outcome {
            RegisterOutcome::Registered => {
                tracing::info!(identity, total_clients = self.clients.len(), "client registered");
            }
            RegisterOutcome::IdentityTaken => {
                tracing::warn!(identity, "identity already in use");
            }
        }
        outcome
    }

    /// Releases `identity`, but only while connection `conn` still holds it.
    pub fn deregister(&self, identity: &str, conn: Uuid) -> bool {
        let removed = self
            .clients
            .remove_if(identity, |_, handle| handle.conn == conn)
            .is_some();

        if removed {
            tracing::info!(identity, total_clients = self.clients.len(), "client deregistered");
        }
        removed
    }

    pub async fn deliver(&self, receiver: &str, message: Message) -> DeliveryOutcome {
        let Some(handle) = self.handle_for(receiver) else {
            return DeliveryOutcome::Offline;
        };
        self.send_on(receiver, handle, message).await
    }

    /// Replay variant of [`deliver`](Self::deliver): the message goes out
    /// only while `receiver` is still served by connection `conn`.
    pub async fn deliver_to(&self, receiver: &str, conn: Uuid, message: Message) -> DeliveryOutcome {
        let Some(handle) = self.handle_for(receiver).filter(|h| h.conn == conn) else {
            return DeliveryOutcome::Offline;
        };
        self.send_on(receiver, handle, message).await
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.clients.contains_key(identity)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    // The handle is cloned out so no map guard is held across an await.
    fn handle_for(&self, receiver: &str) -> Option<ClientHandle> {
        self.clients.get(receiver).map(|entry| entry.value().clone())
    }

    async fn send_on(&self, receiver: &str, handle: ClientHandle, message: Message) -> DeliveryOutcome {
        if handle.tx.send(message).await.is_ok() {
            return DeliveryOutcome::Delivered;
        }

        // The write side is gone, later lookups must see the identity as offline.
        self.clients
            .remove_if(receiver, |_, current| current.conn == handle.conn);
        tracing::warn!(identity = receiver, "dropped closed connection from registry");
        DeliveryOutcome::ConnectionGone
    }
}
