//! HTTP surface: `POST /validate`, `POST /submit`, `GET /healthz`.
//!
//! File work runs on the blocking pool. Internal failures are logged in
//! full and answered with a generic message.

use crate::config::PortalConfig;
use crate::error::{PortalError, Result};
use crate::intake::ReportSubmission;
use crate::portal::{Portal, ValidateRequest};
use crate::table::Row;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const INTERNAL_ERROR_MESSAGE: &str = "Internal server error.";
const SUBMIT_ERROR_MESSAGE: &str = "Error writing report data";

#[derive(Debug, Clone)]
pub struct AppState {
    pub portal: Arc<Portal>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(portal: Portal) -> Self {
        Self {
            portal: Arc::new(portal),
            started_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Row>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ValidateResponse {
    fn found(row: Row) -> Self {
        Self {
            success: true,
            data: Some(row),
            message: None,
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub started_at: DateTime<Utc>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/validate", post(validate))
        .route("/submit", post(submit))
        .with_state(state)
}

/// Status code for a failed validation.
pub fn status_for(err: &PortalError) -> StatusCode {
    match err {
        PortalError::RecordNotFound => StatusCode::NOT_FOUND,
        e if e.is_rejection() => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn healthz(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_owned(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
            started_at: state.started_at,
        }),
    )
}

async fn validate(
    State(state): State<AppState>,
    Json(request): Json<ValidateRequest>,
) -> (StatusCode, Json<ValidateResponse>) {
    let portal = Arc::clone(&state.portal);
    let outcome = match tokio::task::spawn_blocking(move || portal.validate(&request)).await {
        Ok(outcome) => outcome,
        Err(join_err) => Err(PortalError::LedgerUnavailable(format!(
            "validation task failed: {join_err}"
        ))),
    };

    match outcome {
        Ok(row) => (StatusCode::OK, Json(ValidateResponse::found(row))),
        Err(err) => {
            let status = status_for(&err);
            if status == StatusCode::INTERNAL_SERVER_ERROR {
                tracing::error!("Validation failed [{}]: {err}", err.code());
                (status, Json(ValidateResponse::failed(INTERNAL_ERROR_MESSAGE)))
            } else {
                (status, Json(ValidateResponse::failed(err.to_string())))
            }
        }
    }
}

async fn submit(
    State(state): State<AppState>,
    Json(report): Json<ReportSubmission>,
) -> (StatusCode, String) {
    let portal = Arc::clone(&state.portal);
    let outcome = match tokio::task::spawn_blocking(move || portal.submit(&report)).await {
        Ok(outcome) => outcome,
        Err(join_err) => Err(PortalError::StorageUnavailable(format!(
            "submit task failed: {join_err}"
        ))),
    };

    match outcome {
        Ok(outcome) => (StatusCode::OK, outcome.message().to_owned()),
        Err(err) => {
            tracing::error!("Submit failed [{}]: {err}", err.code());
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                SUBMIT_ERROR_MESSAGE.to_owned(),
            )
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        return;
    }
    tracing::info!("Shutdown signal received");
}

/// Bind and serve until Ctrl-C.
pub async fn serve(config: &PortalConfig) -> Result<()> {
    let addr = config.bind_addr()?;
    let state = AppState::new(Portal::new(config));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        "Portal listening on http://{addr} (data dir {})",
        config.data_dir.display()
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Portal stopped");
    Ok(())
}
