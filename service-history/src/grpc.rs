use archive_client::{MessageArchive, error::ArchiveError};
use chat_proto::{
    MessageHistory, MessageRecord,
    v1::{FetchAllMessagesRequest, FetchAllMessagesResponse},
};
use std::sync::Arc;
use tonic::{Request, Response, Status};

pub struct HistoryService {
    archive: Arc<MessageArchive>,
}

impl HistoryService {
    pub fn new(archive: Arc<MessageArchive>) -> Self {
        Self { archive }
    }
}

#[tonic::async_trait]
impl MessageHistory for HistoryService {
    async fn fetch_all_messages(
        &self,
        request: Request<FetchAllMessagesRequest>,
    ) -> Result<Response<FetchAllMessagesResponse>, Status> {
        let receiver = request.into_inner().receiver;

        let stored = self.archive.scan(&receiver).await.map_err(|e| match e {
            ArchiveError::InvalidReceiver(_) => Status::invalid_argument(e.to_string()),
            other => {
                tracing::error!(receiver = %receiver, error = %other, "history fetch failed");
                Status::internal(other.to_string())
            }
        })?;

        tracing::info!(receiver = %receiver, count = stored.len(), "history fetched");

        let messages = stored.iter().map(MessageRecord::from).collect();
        Ok(Response::new(FetchAllMessagesResponse { messages }))
    }
}
