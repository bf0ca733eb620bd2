use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chromafan::{AppState, api::routes::create_router, config::Config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("chromafan=info,tower_http=info")),
        )
        .init();

    let config = Config::load()?;
    let server_addr = config.server_addr;

    let (app_state, sweeper) = AppState::build(config)?;
    let sources = app_state.sources().clone();
    let app = create_router(app_state);

    let listener = TcpListener::bind(server_addr).await?;
    info!("Listening on {}", server_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    sweeper.shutdown();
    sources.metrics().log_summary();
    info!("Server stopped");
    Ok(())
}
