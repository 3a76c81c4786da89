use store_server::{Config, Server, ServerState, init_logger};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before reading any configuration
    dotenv::dotenv().ok();

    init_logger();

    tracing::info!("Store server starting...");

    let config = Config::from_env();
    let state = ServerState::initialize(config).await?;

    Server::with_state(state).run().await?;

    Ok(())
}
