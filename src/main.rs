use anyhow::{Context, Result};
use landmark::api::{
    create_admin_router, create_query_router, create_ws_router, AdminAppState, QueryAppState,
    WsAppState,
};
use landmark::config::{load_config, LandmarkConfig};
use landmark::feed::{run_feed, FeedClient};
use landmark::state::{run_metrics_broadcaster, EntityStore};
use landmark::topic::TopicScheme;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "landmark=info".into()),
        )
        .init();

    info!("Landmark starting...");

    let config = match std::env::var("LANDMARK_CONFIG") {
        Ok(path) => load_config(&path)?,
        Err(_) => {
            info!("LANDMARK_CONFIG not set, using defaults");
            LandmarkConfig::default()
        }
    };

    info!(
        feed_url = %config.feed.url,
        subject = %config.feed.subject,
        topic_prefix = %config.topics.prefix,
        bind_addr = %config.api.bind_addr,
        admin_token = config.api.admin_token.is_some(),
        "Configuration loaded"
    );

    let store = Arc::new(EntityStore::with_topics(TopicScheme::new(
        &config.topics.prefix,
    )));

    // Connect to the feed and start ingesting
    let feed = FeedClient::connect(config.feed.clone()).await?;
    let feed_store = Arc::clone(&store);
    tokio::spawn(async move {
        if let Err(e) = run_feed(feed_store, feed).await {
            error!(error = %e, "Feed subscriber failed");
        }
    });

    // Periodic metrics for WebSocket clients
    tokio::spawn(run_metrics_broadcaster(
        Arc::clone(&store),
        config.metrics.broadcast_interval_seconds,
        config.metrics.active_window_seconds,
    ));

    let query_state = Arc::new(QueryAppState {
        store: Arc::clone(&store),
    });
    let admin_state = Arc::new(AdminAppState {
        store: Arc::clone(&store),
        admin_token: config.api.admin_token.clone(),
        active_window_seconds: config.metrics.active_window_seconds,
    });
    let ws_state = Arc::new(WsAppState {
        store: Arc::clone(&store),
    });

    let app = create_query_router(query_state)
        .merge(create_admin_router(admin_state))
        .merge(create_ws_router(ws_state))
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(config.api.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.api.bind_addr))?;
    info!(bind_addr = %config.api.bind_addr, "API listening");

    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "API server error");
        }
    });

    // Wait for shutdown signal
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl_c signal")?;
    info!("Shutdown signal received");

    server_handle.abort();
    info!(entities = store.len(), "Landmark stopped");

    Ok(())
}
