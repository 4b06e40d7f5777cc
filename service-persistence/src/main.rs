use mimalloc::MiMalloc;
use service_persistence::ServerBuilder;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().unwrap();

    ServerBuilder::new().await.init_tracing().run().await;
}
