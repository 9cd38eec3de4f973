//! AgentVerse Backend
//!
//! A REST API server for building AI agents, managing provider API keys and
//! chatting with agents through the Gemini API.

use agentverse::api;
use agentverse::config::Config;
use agentverse::llm::GeminiGenerator;
use agentverse::state::{AppState, FileStore, LocalRepository};
use axum::{
    extract::{DefaultBodyLimit, Request},
    middleware::Next,
    response::Response,
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

#[derive(Serialize)]
struct HelloResponse {
    message: String,
    status: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    message: String,
}

/// Request ID middleware - adds unique ID to each request for tracing
async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        uri = %uri,
    );

    let response = next.run(request).instrument(span).await;

    info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        status = %response.status().as_u16(),
        duration_ms = start.elapsed().as_millis(),
        "Request completed"
    );

    response
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load configuration
    let config = Config::from_env();
    info!("Configuration loaded: {:?}", config.server);
    info!(
        data_dir = %config.persistence.data_dir.display(),
        recovery = ?config.persistence.recovery,
        default_provider = %config.default_provider,
        model = %config.llm.model,
        "Storage and model settings"
    );

    // Initialize application state
    let repo = Arc::new(LocalRepository::new(
        FileStore::new(&config.persistence.data_dir),
        config.persistence.recovery,
    ));
    let generator = Arc::new(GeminiGenerator::new(config.llm.clone())?);
    let app_state = AppState::new(
        repo.clone(),
        repo,
        generator,
        config.default_provider.clone(),
    )
    .shared();

    // Build our application with routes
    let app = Router::new()
        // Health check and hello world
        .route("/", get(hello_world))
        .route("/api/health", get(health_check))
        .route("/api/tools", get(api::agents::list_tools))
        // Agent management API
        .route(
            "/api/agents",
            get(api::agents::list_agents).post(api::agents::create_agent),
        )
        .route(
            "/api/agents/:id",
            get(api::agents::get_agent)
                .put(api::agents::update_agent)
                .delete(api::agents::delete_agent),
        )
        // Chat API
        .route("/api/agents/:id/sessions", post(api::chat::open_session))
        .route(
            "/api/sessions/:id",
            get(api::chat::get_session).delete(api::chat::close_session),
        )
        .route(
            "/api/sessions/:id/messages",
            post(api::chat::post_message)
                .layer(DefaultBodyLimit::max(api::chat::MAX_TURN_BODY_BYTES)),
        )
        .route(
            "/api/sessions/:id/upload",
            post(api::chat::upload_message)
                .layer(DefaultBodyLimit::max(api::chat::MAX_TURN_BODY_BYTES)),
        )
        .route(
            "/api/sessions/:id/messages/:message_id/feedback",
            put(api::chat::set_feedback),
        )
        // API key management
        .route(
            "/api/keys",
            get(api::keys::list_keys).post(api::keys::create_key),
        )
        .route("/api/keys/:id", axum::routing::delete(api::keys::delete_key))
        // Flows
        .route("/api/flows/describe", post(api::flows::describe_agent))
        .route(
            "/api/flows/analyze-feedback",
            post(api::flows::analyze_feedback),
        )
        // Middleware (order matters - request_id should be first)
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Bind to address from config
    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid server address: {}", e))?;

    info!("AgentVerse running on http://{}", addr);
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Handle graceful shutdown signals (Ctrl+C, SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        },
    }
}

async fn hello_world() -> Json<HelloResponse> {
    Json(HelloResponse {
        message: "Hello from AgentVerse!".to_string(),
        status: "ok".to_string(),
    })
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        message: "AgentVerse is healthy".to_string(),
    })
}
