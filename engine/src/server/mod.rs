//! HTTP channel endpoint
//!
//! Serves the Bot Framework messaging endpoint and a health check.
//!
//! # Endpoints
//!
//! - POST /api/messages - Process one inbound activity
//! - GET /health - Liveness check
//!
//! Activities with `deliveryMode: expectReplies`, or without a `serviceUrl`,
//! get their replies in the response body as `{"activities": [...]}`. All
//! other activities are answered through the connector and the endpoint
//! returns `{}`.

pub mod connector;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use sdk::{Activity, EngineError};
use serde_json::{json, Value};
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use crate::bot::adapter::{BotAdapter, BufferedTurnContext};
use connector::{ConnectorClient, ConnectorTurnContext};

/// Shared state for request handlers
#[derive(Debug, Clone)]
struct ServerState {
    adapter: BotAdapter,
    connector: ConnectorClient,
}

/// Error returned by request handlers, rendered as `{"error": ...}`
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Internal(String),
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::InvalidActivity(msg) => ApiError::BadRequest(msg),
            EngineError::Serialization(e) => ApiError::BadRequest(e.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => {
                error!("Internal server error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Build the application router
pub fn build_router(adapter: BotAdapter, connector: ConnectorClient) -> Router {
    let state = ServerState { adapter, connector };

    Router::new()
        .route("/api/messages", post(messages_handler))
        .route("/health", get(health_handler))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl-C or SIGTERM
pub async fn serve(addr: SocketAddr, adapter: BotAdapter) -> Result<(), EngineError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| EngineError::Network(format!("Failed to bind to {}: {}", addr, e)))?;

    serve_with_listener(listener, adapter, ConnectorClient::new(), shutdown_signal()).await
}

/// Serve on an already bound listener until `shutdown` completes
pub async fn serve_with_listener<F>(
    listener: TcpListener,
    adapter: BotAdapter,
    connector: ConnectorClient,
    shutdown: F,
) -> Result<(), EngineError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener
        .local_addr()
        .map_err(|e| EngineError::Network(format!("Failed to get local address: {}", e)))?;
    info!("bookworm listening on http://{}", addr);

    let app = build_router(adapter, connector);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            info!("Server shutting down gracefully");
        })
        .await
        .map_err(|e| EngineError::Network(format!("Server error: {}", e)))
}

/// Resolves on Ctrl-C, or on SIGTERM where available
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl-C"),
        _ = terminate => info!("Received SIGTERM signal"),
    }
}

async fn messages_handler(
    State(state): State<ServerState>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let activity: Activity = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid activity: {}", e)))?;

    debug!(
        activity_type = ?activity.activity_type,
        channel = activity.channel_id.as_deref().unwrap_or(""),
        "Received activity"
    );

    if activity.expects_replies() || activity.service_url.is_none() {
        let mut ctx = BufferedTurnContext::new(activity);
        state.adapter.process(&mut ctx).await;
        return Ok(Json(json!({ "activities": ctx.into_replies() })));
    }

    let mut ctx = ConnectorTurnContext::new(state.connector.clone(), activity)?;
    state.adapter.process(&mut ctx).await;
    Ok(Json(json!({})))
}

async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}
