//! Route handlers

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info_span};
use uuid::Uuid;

use crate::app::AppContext;
use crate::errors::RagError;
use crate::rag::Answer;

/// Body of `POST /ask`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    pub query: String,
}

/// Body of `GET /`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootResponse {
    pub ok: bool,
    pub title: String,
}

pub fn router(state: Arc<AppContext>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/ask", post(ask))
        .with_state(state)
}

async fn root(State(state): State<Arc<AppContext>>) -> Json<RootResponse> {
    Json(RootResponse {
        ok: true,
        title: state.title().to_string(),
    })
}

async fn ask(
    State(state): State<Arc<AppContext>>,
    Json(request): Json<AskRequest>,
) -> Result<Json<Answer>, ApiError> {
    let span = info_span!("ask", request_id = %Uuid::new_v4());

    // Embedding, search and generation all block
    let answer = tokio::task::spawn_blocking(move || {
        span.in_scope(|| state.pipeline().answer(&request.query))
    })
    .await
    .map_err(|e| ApiError(RagError::Generic(format!("Request task failed: {}", e))))??;

    Ok(Json(answer))
}

/// Any pipeline failure; reported to clients as a bare 500
#[derive(Debug)]
pub struct ApiError(pub RagError);

impl From<RagError> for ApiError {
    fn from(err: RagError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!(error = %self.0, "Request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
    }
}
