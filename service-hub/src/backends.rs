use chat_core::Message;
use chat_proto::{
    MessageHistoryClient, MessageRecord, MessageStoreClient, ProtoError,
    v1::{FetchAllMessagesRequest, StoreMessageRequest},
};
use tokio::sync::mpsc;
use tonic::transport::{Channel, Endpoint};

/// Messages waiting for the persistence forwarder before senders block.
pub const STORE_QUEUE_SIZE: usize = 256;

pub type BackendResult<T> = Result<T, BackendError>;

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Invalid backend url: {0}")]
    InvalidUrl(tonic::transport::Error),

    #[error("Backend call failed: {0}")]
    Rpc(#[from] tonic::Status),

    #[error("Backend returned an undecodable record: {0}")]
    BadRecord(#[from] ProtoError),
}

/// Long-lived handle to the persistence service. The channel connects on
/// first use and redials on its own.
#[derive(Clone)]
pub struct PersistenceClient {
    inner: MessageStoreClient<Channel>,
}

impl PersistenceClient {
    pub fn connect_lazy(url: impl Into<String>) -> BackendResult<Self> {
        let channel = Endpoint::from_shared(url.into())
            .map_err(BackendError::InvalidUrl)?
            .connect_lazy();

        Ok(Self {
            inner: MessageStoreClient::new(channel),
        })
    }

    pub async fn store(&self, message: &Message) -> BackendResult<String> {
        let request = StoreMessageRequest {
            message: Some(MessageRecord::from(message)),
        };

        let response = self.inner.clone().store_message(request).await?;
        Ok(response.into_inner().status)
    }
}

/// Long-lived handle to the history service.
#[derive(Clone)]
pub struct HistoryClient {
    inner: MessageHistoryClient<Channel>,
}

impl HistoryClient {
    pub fn connect_lazy(url: impl Into<String>) -> BackendResult<Self> {
        let channel = Endpoint::from_shared(url.into())
            .map_err(BackendError::InvalidUrl)?
            .connect_lazy();

        Ok(Self {
            inner: MessageHistoryClient::new(channel),
        })
    }

    pub async fn fetch_all(&self, receiver: &str) -> BackendResult<Vec<Message>> {
        let request = FetchAllMessagesRequest {
            receiver: receiver.to_owned(),
        };

        let response = self.inner.clone().fetch_all_messages(request).await?;
        response
            .into_inner()
            .messages
            .into_iter()
            .map(|record| Message::try_from(record).map_err(BackendError::from))
            .collect()
    }
}

/// Starts the forwarder draining the store queue into the persistence
/// service. A failed call costs only the affected message.
pub fn spawn_store_forwarder(client: PersistenceClient) -> mpsc::Sender<Message> {
    let (tx, mut rx) = mpsc::channel::<Message>(STORE_QUEUE_SIZE);

    tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            match client.store(&message).await {
                Ok(status) => {
                    tracing::debug!(sender = %message.sender, receiver = %message.receiver, %status, "message stored");
                }
                Err(e) => {
                    tracing::error!(sender = %message.sender, receiver = %message.receiver, error = %e, "store call failed");
                }
            }
        }
    });

    tx
}
