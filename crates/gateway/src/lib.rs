//! HTTP gateway for Concierge.
//!
//! Exposes the chat pipeline over REST:
//! - `GET /health`
//! - `POST /api/chat` with `{message, user_email}`, answering `{response}`
//! - `GET /api/chat/history/{user}`
//!
//! Built on Axum.

use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

use concierge_agent::TaskRunner;
use concierge_config::AppConfig;
use concierge_core::event::EventBus;
use concierge_core::session::Turn;
use concierge_routing::ChatService;
use concierge_session::InMemorySessionStore;

const MAX_BODY_BYTES: usize = 64 * 1024;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub chat: Arc<ChatService>,
}

type SharedState = Arc<GatewayState>;

/// Wire a [`ChatService`] from config.
///
/// The routing classifier is only enabled when a default provider is
/// configured; without one, unmatched messages fall through to ORDER.
pub fn assemble_chat(config: &AppConfig) -> ChatService {
    let event_bus = Arc::new(EventBus::default());
    let backend = concierge_backend::build_from_config(&config.backend);

    let runner = match concierge_providers::build_from_config(config).default_provider() {
        Some(provider) => Some(Arc::new(
            TaskRunner::from_config(provider, config).with_event_bus(event_bus.clone()),
        )),
        None => {
            warn!(provider = %config.default_provider, "No provider available, classifier disabled");
            None
        }
    };

    ChatService::from_config(
        config,
        runner,
        backend,
        Arc::new(InMemorySessionStore::new()),
        event_bus,
    )
}

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers([axum::http::header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/chat", post(chat_handler))
        .route("/api/chat/history/{user}", get(history_handler))
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let state = Arc::new(GatewayState {
        chat: Arc::new(assemble_chat(&config)),
    });
    let app = build_router(state);

    info!(addr = %addr, backend = ?config.backend.mode, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
    user_email: String,
}

#[derive(Serialize)]
struct ChatResponse {
    response: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn bad_request(message: &str) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
}

async fn chat_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let user = payload.user_email.trim();
    if user.is_empty() {
        return Err(bad_request("user_email must not be empty"));
    }

    info!(user = %user, message_len = payload.message.len(), "Chat message received");
    let response = state.chat.handle(user, &payload.message).await;
    Ok(Json(ChatResponse { response }))
}

#[derive(Serialize)]
struct HistoryResponse {
    user: String,
    turns: Vec<Turn>,
}

async fn history_handler(
    State(state): State<SharedState>,
    Path(user): Path<String>,
) -> Result<Json<HistoryResponse>, ApiError> {
    match state.chat.history(&user).await {
        Ok(turns) => Ok(Json(HistoryResponse { user, turns })),
        Err(e) => {
            error!(user = %user, error = %e, "History lookup failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "history unavailable".into(),
                }),
            ))
        }
    }
}
