//! legalops-router server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints and, when
//! configured, the background classification loop.

use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use legalops_router::api;
use legalops_router::app_state::AppState;
use legalops_router::config::RouterConfig;
use legalops_router::domain::EventBus;
use legalops_router::llm::LlmGateway;
use legalops_router::persistence::{MemoryStore, PostgresStore, WorkflowStore};
use legalops_router::service::{WorkflowService, scheduler};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = RouterConfig::from_env().map_err(|e| anyhow::anyhow!("invalid config: {e}"))?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!(addr = %config.listen_addr, "starting legalops-router");

    // Build persistence layer
    let store = build_store(&config).await?;

    // Build LLM gateway
    let llm = LlmGateway::from_config(&config).context("building LLM client")?;
    if llm.is_mock() {
        tracing::info!("LLM calls answered by mocks");
    } else {
        tracing::info!(model = %config.gemini_model, "LLM calls go to Gemini");
    }

    // Build service layer
    let event_bus = EventBus::new(config.event_bus_capacity);
    let service = Arc::new(WorkflowService::new(
        store,
        llm,
        event_bus,
        config.workflow_settings(),
    ));

    if let Some(period) = config.loop_interval() {
        tracing::info!(period_secs = period.as_secs(), "background loop enabled");
        scheduler::spawn_loop(Arc::clone(&service), period);
    }

    // Build router
    let app = api::build_app(AppState::new(service), config.request_timeout());

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

async fn build_store(config: &RouterConfig) -> anyhow::Result<Arc<dyn WorkflowStore>> {
    let Some(url) = config.database_url.as_deref() else {
        tracing::warn!("DATABASE_URL not set; using the in-memory store (data is lost on restart)");
        return Ok(Arc::new(MemoryStore::new()));
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .min_connections(config.database_min_connections)
        .acquire_timeout(std::time::Duration::from_secs(
            config.database_connect_timeout_secs,
        ))
        .connect(url)
        .await
        .context("connecting to PostgreSQL")?;

    let store = PostgresStore::new(pool);
    store.migrate().await.context("running migrations")?;
    tracing::info!(
        max_connections = config.database_max_connections,
        "connected to PostgreSQL"
    );
    Ok(Arc::new(store))
}
