use archive_client::{MessageArchive, error::ArchiveError};
use chat_core::Message;
use chat_proto::{
    MessageStore,
    v1::{StoreMessageRequest, StoreMessageResponse},
};
use std::sync::Arc;
use tonic::{Request, Response, Status};

/// Status string clients historically key on, so it stays verbatim.
pub const STORE_ACK: &str = "Message Persisted";

pub struct StoreService {
    archive: Arc<MessageArchive>,
}

impl StoreService {
    pub fn new(archive: Arc<MessageArchive>) -> Self {
        Self { archive }
    }
}

#[tonic::async_trait]
impl MessageStore for StoreService {
    async fn store_message(
        &self,
        request: Request<StoreMessageRequest>,
    ) -> Result<Response<StoreMessageResponse>, Status> {
        let record = request
            .into_inner()
            .message
            .ok_or_else(|| Status::invalid_argument("request carries no message"))?;
        let message =
            Message::try_from(record).map_err(|e| Status::invalid_argument(e.to_string()))?;

        tracing::info!(sender = %message.sender, receiver = %message.receiver, "storing message");

        self.archive.append(&message).await.map_err(|e| match e {
            ArchiveError::InvalidReceiver(_) => Status::invalid_argument(e.to_string()),
            other => {
                tracing::error!(error = %other, "failed to persist message");
                Status::internal(other.to_string())
            }
        })?;

        Ok(Response::new(StoreMessageResponse {
            status: STORE_ACK.to_owned(),
        }))
    }
}
