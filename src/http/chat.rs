//! Chat proxy endpoint.
//!
//! Forwards one chat turn to the remote backend through the retry executor.
//! The backend sleeps when idle, so the first attempt gets the long
//! cold-start deadline and failures are retried on a budget.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::http::request::request_id;
use crate::http::server::AppState;
use crate::resilience::fetch_with_retry;

/// One chat turn from the frontend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub user_id: String,
    pub message: String,
}

/// The backend's reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

/// `POST /api/chat`
pub async fn chat_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<ChatRequest>,
) -> Response {
    let request_id = request_id(&headers).to_string();

    tracing::debug!(
        request_id = %request_id,
        user_id = %payload.user_id,
        "Proxying chat request"
    );

    let upstream_request = state.http.post(state.chat_url.clone()).json(&payload);

    let upstream = match fetch_with_retry(upstream_request, &state.retry_policy).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Chat backend unreachable");
            return (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": "Failed to reach chat service" })),
            )
                .into_response();
        }
    };

    let status = upstream.status();
    if !status.is_success() {
        let detail = upstream.text().await.unwrap_or_default();
        tracing::warn!(request_id = %request_id, status = %status, "Chat backend returned error");
        return (
            status,
            Json(json!({ "error": "Upstream error", "detail": detail })),
        )
            .into_response();
    }

    match upstream.json::<ChatResponse>().await {
        Ok(reply) => Json(reply).into_response(),
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Chat backend sent malformed reply");
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": "Invalid response from chat service" })),
            )
                .into_response()
        }
    }
}
