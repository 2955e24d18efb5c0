//! MCP server over stdio or streamable HTTP.
//!
//! Both transports share [`build_engine`], which opens the configured storage
//! backend and loads the embedding model once.

use std::sync::Arc;

use anyhow::Result;
use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;
use rmcp::transport::streamable_http_server::StreamableHttpService;
use rmcp::ServiceExt;

use crate::config::ContinuousConfig;
use crate::db;
use crate::embedding;
use crate::memory::{EngineSettings, MemoryEngine};
use crate::tools::ContinuousTools;

/// Open storage and the embedding model, and wire them into an engine.
pub async fn build_engine(config: &ContinuousConfig) -> Result<Arc<MemoryEngine>> {
    let store = db::open_store(config).await?;
    tracing::info!(backend = store.backend(), "storage ready");

    let provider = embedding::create_provider(&config.embedding)?;
    let embedder: Arc<dyn embedding::EmbeddingProvider> = Arc::from(provider);
    tracing::info!(model = %config.embedding.model, "embedding provider ready");

    Ok(Arc::new(MemoryEngine::new(
        store,
        embedder,
        EngineSettings::from_config(config),
    )))
}

pub async fn serve_stdio(config: ContinuousConfig) -> Result<()> {
    tracing::info!("starting continuous MCP server on stdio");
    let engine = build_engine(&config).await?;

    let server = ContinuousTools::new(engine)
        .serve(rmcp::transport::stdio())
        .await?;
    tracing::info!("MCP server running, waiting for client");

    server.waiting().await?;
    tracing::info!("MCP server shut down");
    Ok(())
}

pub async fn serve_http(config: ContinuousConfig) -> Result<()> {
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let engine = build_engine(&config).await?;

    let service = StreamableHttpService::new(
        move || Ok(ContinuousTools::new(Arc::clone(&engine))),
        LocalSessionManager::default().into(),
        Default::default(),
    );
    let router = axum::Router::new().nest_service("/mcp", service);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("MCP server listening at http://{bind_addr}/mcp");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
            }
            tracing::info!("shutting down HTTP server");
        })
        .await?;
    Ok(())
}

/// Dispatch on `transport` (`"stdio"` or `"http"`).
pub async fn serve(config: ContinuousConfig, transport: &str) -> Result<()> {
    match transport {
        "stdio" => serve_stdio(config).await,
        "http" => serve_http(config).await,
        other => anyhow::bail!("unknown transport '{other}' (expected stdio or http)"),
    }
}
