//! HTTP front-end over the fan-out engine.
//!
//! Every response is `200 OK`; success or failure travels in the body so
//! clients never have to branch on status codes.

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::engine::Engine;
use crate::error::Error;

pub const EMPTY_TOPIC_MESSAGE: &str = "Please enter a topic";
pub const NOT_INITIALIZED_MESSAGE: &str = "language model is not initialized";

#[derive(Clone)]
pub struct AppState {
    /// `None` when the server runs without a configured model.
    pub engine: Option<Arc<dyn Engine>>,
}

impl AppState {
    pub fn new(engine: Arc<dyn Engine>) -> Self {
        Self {
            engine: Some(engine),
        }
    }

    pub fn uninitialized() -> Self {
        Self { engine: None }
    }
}

#[derive(Debug, Deserialize)]
pub struct ProcessRequest {
    #[serde(default)]
    pub topic: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ProcessResponse {
    pub success: bool,
    pub result: Option<String>,
    pub error: Option<String>,
}

impl ProcessResponse {
    fn ok(result: String) -> Self {
        Self {
            success: true,
            result: Some(result),
            error: None,
        }
    }

    fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub llm_initialized: bool,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/process", post(process_topic))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until Ctrl+C.
pub async fn serve(addr: &str, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_on(tokio::signal::ctrl_c()))
        .await?;
    Ok(())
}

/// Resolves once `signal` fires. A signal that fails to install never
/// resolves, so the server keeps running instead of exiting at once.
pub async fn shutdown_on<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => info!("shutting down"),
        Err(e) => {
            error!(error = %e, "failed to install shutdown signal handler");
            std::future::pending::<()>().await;
        }
    }
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        llm_initialized: state.engine.is_some(),
    })
}

async fn process_topic(
    State(state): State<AppState>,
    payload: Result<Json<ProcessRequest>, JsonRejection>,
) -> Json<ProcessResponse> {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!(error = %rejection, "rejected /process body");
            return Json(ProcessResponse::failed(format!(
                "error while processing request: {}",
                rejection.body_text()
            )));
        }
    };

    let topic = request.topic.trim();
    if topic.is_empty() {
        let err = Error::Validation(EMPTY_TOPIC_MESSAGE.to_string());
        return Json(ProcessResponse::failed(err.to_string()));
    }

    let Some(engine) = state.engine else {
        return Json(ProcessResponse::failed(NOT_INITIALIZED_MESSAGE));
    };

    match engine.run(topic).await {
        Ok(result) => Json(ProcessResponse::ok(result)),
        Err(e) => {
            warn!(kind = ?e.kind(), error = %e, "topic processing failed");
            Json(ProcessResponse::failed(e.to_string()))
        }
    }
}
