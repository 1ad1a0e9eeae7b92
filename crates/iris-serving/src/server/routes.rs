//! API route handlers

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use iris_classifier::{BundleMetadata, Error, Table};

use super::AppState;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: impl ToString) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
        .into_response()
}

fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::ArtifactNotPacked(_) | Error::NotFitted => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_REQUEST,
    }
}

/// `POST /predict`: JSON array of feature rows in, JSON array of labels out.
pub async fn predict(State(state): State<AppState>, body: Bytes) -> Response {
    let table = match std::str::from_utf8(&body)
        .map_err(|e| e.to_string())
        .and_then(|s| Table::from_json(s).map_err(|e| e.to_string()))
    {
        Ok(t) => t,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e),
    };

    // SVM evaluation is CPU bound; keep it off the async workers.
    let service = state.service.clone();
    let result = match tokio::task::spawn_blocking(move || service.predict(&table)).await {
        Ok(result) => result,
        Err(e) => {
            log::error!("Prediction task failed: {}", e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, e);
        }
    };

    match result {
        Ok(labels) => {
            log::debug!("Predicted {} rows", labels.len());
            Json(labels).into_response()
        }
        Err(e) => {
            log::warn!("Prediction rejected: {}", e);
            error_response(status_for(&e), e)
        }
    }
}

pub async fn healthz() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

pub async fn metadata(State(state): State<AppState>) -> Json<BundleMetadata> {
    Json(state.metadata.as_ref().clone())
}
