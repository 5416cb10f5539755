//! Auth delegation and the premium-access gate.
//!
//! # Responsibilities
//! - Forward credential flows to the identity provider
//! - Resolve a bearer token into an `AccessInfo` for page gating
//!
//! # Design Decisions
//! - The gateway stores no session state; every call rides on the
//!   provider-issued bearer token
//! - Deny by default: anything without a valid token is 401

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::http::server::AppState;
use crate::provider::ProviderError;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub name: Option<String>,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RecoverRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePasswordRequest {
    pub password: String,
}

/// `POST /api/auth/login`
pub async fn login(State(state): State<AppState>, Json(body): Json<LoginRequest>) -> Response {
    match state
        .provider
        .sign_in_with_password(&body.email, &body.password)
        .await
    {
        Ok(session) => Json(session).into_response(),
        Err(e) => provider_error_response(e),
    }
}

/// `POST /api/auth/signup`
pub async fn signup(State(state): State<AppState>, Json(body): Json<SignupRequest>) -> Response {
    match state
        .provider
        .sign_up(body.name.as_deref(), &body.email, &body.password)
        .await
    {
        Ok(session) => (StatusCode::CREATED, Json(session)).into_response(),
        Err(e) => provider_error_response(e),
    }
}

/// `POST /api/auth/logout`
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(token) = bearer_token(&headers) else {
        return unauthorized();
    };
    match state.provider.sign_out(token).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => provider_error_response(e),
    }
}

/// `POST /api/auth/recover`
pub async fn recover(State(state): State<AppState>, Json(body): Json<RecoverRequest>) -> Response {
    match state.provider.request_password_reset(&body.email).await {
        Ok(()) => Json(json!({ "message": "Password reset email sent" })).into_response(),
        Err(e) => provider_error_response(e),
    }
}

/// `POST /api/auth/password`
pub async fn update_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<UpdatePasswordRequest>,
) -> Response {
    let Some(token) = bearer_token(&headers) else {
        return unauthorized();
    };
    match state.provider.update_password(token, &body.password).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => provider_error_response(e),
    }
}

/// `GET /api/access`
///
/// Resolves the caller's entitlements. The response is always a complete
/// `AccessInfo`; conservative defaults stand in for missing rows.
pub async fn access(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(token) = bearer_token(&headers) else {
        return unauthorized();
    };

    let user = match state.provider.get_user(token).await {
        Ok(user) => user,
        Err(e) => return provider_error_response(e),
    };

    match state.provider.load_access(&user).await {
        Ok(info) => Json(info).into_response(),
        Err(e) => provider_error_response(e),
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|t| !t.is_empty())
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "Missing or invalid authorization" })),
    )
        .into_response()
}

fn provider_error_response(err: ProviderError) -> Response {
    match err {
        ProviderError::InvalidCredentials => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Invalid email or password" })),
        )
            .into_response(),
        ProviderError::Unauthorized => unauthorized(),
        ProviderError::Status { status, detail } if (400..500).contains(&status) => {
            // Client-caused provider rejections pass through with detail.
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_REQUEST);
            (status, Json(json!({ "error": "Provider error", "detail": detail }))).into_response()
        }
        e => {
            tracing::error!(error = %e, "Identity provider failure");
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": "Could not reach authentication service" })),
            )
                .into_response()
        }
    }
}
