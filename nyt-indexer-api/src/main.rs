use std::env;
use std::sync::Arc;

use tracing::{error, info};

use nyt_indexer_api::{create_router, AppState};
use nyt_indexer_repository::{AnalyticsClient, OpenSearchClient};
use nyt_indexer_shared::{init_tracing, LogFormat};

/// Default OpenSearch URL.
const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Default listen address.
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    init_tracing(LogFormat::from_setting(env::var("LOG_FORMAT").ok().as_deref()));

    if let Err(e) = serve().await {
        error!(error = %e, "API server failed");
        std::process::exit(1);
    }
}

async fn serve() -> Result<(), Box<dyn std::error::Error>> {
    let opensearch_url =
        env::var("OPENSEARCH_URL").unwrap_or_else(|_| DEFAULT_OPENSEARCH_URL.to_string());
    let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());

    let store = OpenSearchClient::new(&opensearch_url).await?;
    let state = AppState::new(AnalyticsClient::new(Arc::new(store)));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(bind_addr = %bind_addr, opensearch_url = %opensearch_url, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Received shutdown signal");
        })
        .await?;

    Ok(())
}
