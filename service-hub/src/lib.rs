pub mod api;
pub mod backends;
mod error;
pub mod registry;
pub mod state;

use api::{not_found, ping, sessions::router::websocket_handler};
use axum::{Router, routing};
use axum_prometheus::{PrometheusMetricLayer, metrics_exporter_prometheus::PrometheusHandle};
use backends::{HistoryClient, PersistenceClient};
use registry::Registry;
use state::{ServerData, ServerState};
use std::{
    sync::{Arc, LazyLock},
    time::Duration,
};
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

// The prometheus recorder can only be installed once per process.
static METRICS: LazyLock<(PrometheusMetricLayer<'static>, PrometheusHandle)> =
    LazyLock::new(PrometheusMetricLayer::pair);

pub struct ServerBuilder {
    tcp_listener: TcpListener,
    router: Router,
}

impl ServerBuilder {
    pub async fn new() -> Self {
        let tcp_listener = Self::init_tcp_listener().await;
        let router = Self::init_router(Self::init_state());

        Self {
            tcp_listener,
            router,
        }
    }

    async fn init_tcp_listener() -> TcpListener {
        let host = read_env_var("HOST");
        let port = read_env_var("PORT");
        let addr = format!("{host}:{port}");

        TcpListener::bind(addr).await.expect("the address is busy")
    }

    /// Builds the state from the environment. The backend channels connect
    /// lazily, so the hub comes up even while the workers are still down.
    pub fn init_state() -> ServerState {
        let persistence = PersistenceClient::connect_lazy(read_env_var("PERSISTENCE_URL"))
            .expect("Invalid PERSISTENCE_URL");
        let history =
            HistoryClient::connect_lazy(read_env_var("HISTORY_URL")).expect("Invalid HISTORY_URL");

        Self::build_state(persistence, history)
    }

    pub fn build_state(persistence: PersistenceClient, history: HistoryClient) -> ServerState {
        Arc::new(ServerData {
            registry: Registry::new(),
            history,
            store_queue: backends::spawn_store_forwarder(persistence),
        })
    }

    pub fn init_router(state: ServerState) -> Router {
        let (prometheus_layer, metric_handle) = METRICS.clone();

        Router::new()
            .route("/ping", routing::get(ping))
            .route("/ws", routing::get(websocket_handler))
            .route(
                "/metrics",
                routing::get(|| async move { metric_handle.render() }),
            )
            .with_state(state)
            .fallback(not_found)
            .layer((
                TraceLayer::new_for_http(),
                prometheus_layer,
                TimeoutLayer::new(Duration::from_secs(10)),
            ))
    }

    pub fn init_cors(mut self) -> Self {
        use axum::http::{
            HeaderValue, Method,
            header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, ORIGIN},
        };
        use tower_http::cors::CorsLayer;

        let origins = read_env_var("ORIGINS")
            .split(',')
            .map(|s| s.trim())
            .map(|s| HeaderValue::from_str(s).expect("Invalid origin in ORIGINS"))
            .collect::<Vec<_>>();

        let cors = CorsLayer::new()
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([ORIGIN, AUTHORIZATION, ACCEPT, CONTENT_TYPE])
            .allow_origin(origins);

        self.router = self.router.layer(cors);
        self
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
            "listening on http{}",
            self.tcp_listener.local_addr().unwrap()
        );

        axum::serve(self.tcp_listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
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
        .expect("failed to install Ctrl+C handler")
}
