mod grpc;

pub use grpc::{STORE_ACK, StoreService};

use archive_client::MessageArchive;
use chat_proto::MessageStoreServer;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;
use tracing_subscriber::EnvFilter;

pub struct ServerBuilder {
    tcp_listener: TcpListener,
    archive: Arc<MessageArchive>,
}

impl ServerBuilder {
    pub async fn new() -> Self {
        let tcp_listener = Self::init_tcp_listener().await;
        let archive = Self::init_archive();

        Self {
            tcp_listener,
            archive,
        }
    }

    async fn init_tcp_listener() -> TcpListener {
        let host = read_env_var("HOST");
        let port = read_env_var("PORT");
        let addr = format!("{host}:{port}");

        TcpListener::bind(addr).await.expect("the address is busy")
    }

    fn init_archive() -> Arc<MessageArchive> {
        Arc::new(MessageArchive::new(read_env_var("ARCHIVE_ROOT")))
    }

    pub fn init_tracing(self) -> Self {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .compact()
            .with_file(true)
            .with_line_number(true)
            .with_target(false)
            .init();

        self
    }

    pub async fn run(self) {
        tracing::info!(
            "message store listening on {}",
            self.tcp_listener.local_addr().unwrap()
        );

        Server::builder()
            .add_service(MessageStoreServer::new(StoreService::new(self.archive)))
            .serve_with_incoming_shutdown(
                TcpListenerStream::new(self.tcp_listener),
                shutdown_signal(),
            )
            .await
            .unwrap()
    }
}

fn read_env_var(key: &str) -> String {
    std::env::var(key).expect(&format!("{key} don`t set"))
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
}
