//! Provider client and access-gate tests against a mock identity provider.

use std::collections::HashMap;
use std::net::SocketAddr;

use axum::extract::Query;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use delta_gateway::config::{GatewayConfig, ProviderConfig};
use delta_gateway::provider::{AuthUser, ProviderClient, ProviderError};
use delta_gateway::{HttpServer, Shutdown};

mod common;

/// Mock provider with two known users:
/// - `u-dev` (`eric@egeng.co`, password `devpass`, token `tok-dev`): no rows
/// - `u-sub` (`sub@example.com`, password `subpass`, token `tok-sub`):
///   profile with role `user`, active `pro` subscription ending in 30 days
async fn start_mock_provider() -> SocketAddr {
    let app = Router::new()
        .route("/auth/v1/token", post(token))
        .route("/auth/v1/user", get(user_info).put(update_user))
        .route("/auth/v1/logout", post(|| async { StatusCode::NO_CONTENT }))
        .route("/auth/v1/recover", post(|| async { Json(json!({})) }))
        .route("/rest/v1/profiles", get(profiles))
        .route("/rest/v1/subscriptions", get(subscriptions));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn token(Json(body): Json<Value>) -> impl IntoResponse {
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();
    let session = match (email, password) {
        ("eric@egeng.co", "devpass") => session_json("tok-dev", "u-dev", "eric@egeng.co"),
        ("sub@example.com", "subpass") => session_json("tok-sub", "u-sub", "sub@example.com"),
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "invalid_grant" })),
            )
                .into_response()
        }
    };
    Json(session).into_response()
}

fn session_json(token: &str, id: &str, email: &str) -> Value {
    json!({
        "access_token": token,
        "refresh_token": "refresh",
        "expires_in": 3600,
        "token_type": "bearer",
        "user": { "id": id, "email": email },
    })
}

fn user_for_token(headers: &HeaderMap) -> Option<Value> {
    let auth = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    match auth {
        "Bearer tok-dev" => Some(json!({ "id": "u-dev", "email": "eric@egeng.co" })),
        "Bearer tok-sub" => Some(json!({ "id": "u-sub", "email": "sub@example.com" })),
        _ => None,
    }
}

async fn user_info(headers: HeaderMap) -> impl IntoResponse {
    match user_for_token(&headers) {
        Some(user) => Json(user).into_response(),
        None => (StatusCode::UNAUTHORIZED, Json(json!({ "error": "invalid token" }))).into_response(),
    }
}

async fn update_user(headers: HeaderMap, Json(_body): Json<Value>) -> impl IntoResponse {
    match user_for_token(&headers) {
        Some(user) => Json(user).into_response(),
        None => StatusCode::UNAUTHORIZED.into_response(),
    }
}

async fn profiles(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let rows = if params.get("id").map(String::as_str) == Some("eq.u-sub") {
        json!([{
            "id": "u-sub",
            "email": "sub@example.com",
            "name": "Subscriber",
            "role": "user",
            "created_at": "2026-01-15T00:00:00Z",
            "updated_at": "2026-01-15T00:00:00Z",
        }])
    } else {
        json!([])
    };
    Json(rows)
}

async fn subscriptions(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let rows = if params.get("user_id").map(String::as_str) == Some("eq.u-sub") {
        let period_end = (Utc::now() + Duration::days(30)).to_rfc3339();
        json!([{
            "id": "sub-1",
            "user_id": "u-sub",
            "plan": "pro",
            "status": "active",
            "source": "web",
            "current_period_end": period_end,
        }])
    } else {
        json!([])
    };
    Json(rows)
}

fn provider_config(addr: SocketAddr) -> ProviderConfig {
    ProviderConfig {
        base_url: format!("http://{addr}"),
        anon_key: "anon-key".into(),
        ..ProviderConfig::default()
    }
}

#[tokio::test]
async fn sign_in_round_trip() {
    let addr = start_mock_provider().await;
    let client = ProviderClient::new(&provider_config(addr)).unwrap();

    let session = client
        .sign_in_with_password("sub@example.com", "subpass")
        .await
        .unwrap();
    assert_eq!(session.access_token, "tok-sub");
    assert_eq!(session.user.email.as_deref(), Some("sub@example.com"));

    let err = client
        .sign_in_with_password("sub@example.com", "wrong")
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::InvalidCredentials));
}

#[tokio::test]
async fn invalid_token_is_unauthorized() {
    let addr = start_mock_provider().await;
    let client = ProviderClient::new(&provider_config(addr)).unwrap();

    let err = client.get_user("tok-bogus").await.unwrap_err();
    assert!(matches!(err, ProviderError::Unauthorized));
}

#[tokio::test]
async fn row_reads_distinguish_present_and_absent() {
    let addr = start_mock_provider().await;
    let client = ProviderClient::new(&provider_config(addr)).unwrap();

    let profile = client.fetch_profile("u-sub").await.unwrap().unwrap();
    assert_eq!(profile.email, "sub@example.com");

    assert!(client.fetch_profile("u-dev").await.unwrap().is_none());
    assert!(client.fetch_subscription("u-dev").await.unwrap().is_none());
}

#[tokio::test]
async fn allow_listed_user_gets_premium_without_rows() {
    let addr = start_mock_provider().await;
    let client = ProviderClient::new(&provider_config(addr)).unwrap();

    let user = AuthUser {
        id: "u-dev".into(),
        email: Some("eric@egeng.co".into()),
    };
    let info = client.load_access(&user).await.unwrap();

    assert!(info.has_premium_access);
    assert!(info.is_developer);
    // Billing fields still report what the store says: nothing.
    assert_eq!(serde_json::to_value(&info).unwrap()["plan"], "free");
}

#[tokio::test]
async fn subscriber_gets_premium_from_active_subscription() {
    let addr = start_mock_provider().await;
    let client = ProviderClient::new(&provider_config(addr)).unwrap();

    let user = AuthUser {
        id: "u-sub".into(),
        email: Some("sub@example.com".into()),
    };
    let info = client.load_access(&user).await.unwrap();

    assert!(info.has_premium_access);
    assert!(!info.is_developer);
    assert_eq!(serde_json::to_value(&info).unwrap()["plan"], "pro");
    assert!(info.expires_at.is_some());
}

#[tokio::test]
async fn access_endpoint_gates_on_bearer_token() {
    let provider_addr = start_mock_provider().await;
    let upstream = common::start_fixed_upstream(200, r#"{"response":"unused"}"#).await;

    let mut config = GatewayConfig::default();
    config.upstream.base_url = format!("http://{upstream}");
    config.provider = provider_config(provider_addr);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let signal = shutdown.signalled();
    let server = HttpServer::new(config).unwrap();
    let handle = tokio::spawn(async move { server.run_until(listener, signal).await });

    let client = reqwest::Client::new();

    // No token: denied.
    let response = client
        .get(format!("http://{addr}/api/access"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    // Developer token: premium without any billing rows.
    let response = client
        .get(format!("http://{addr}/api/access"))
        .header(header::AUTHORIZATION, "Bearer tok-dev")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["hasPremiumAccess"], true);
    assert_eq!(body["isDeveloper"], true);
    assert_eq!(body["plan"], "free");

    // Subscriber token: premium from the subscription row.
    let response = client
        .get(format!("http://{addr}/api/access"))
        .header(header::AUTHORIZATION, "Bearer tok-sub")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["hasPremiumAccess"], true);
    assert_eq!(body["isDeveloper"], false);
    assert_eq!(body["plan"], "pro");

    shutdown.trigger();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn login_endpoint_delegates_to_the_provider() {
    let provider_addr = start_mock_provider().await;
    let upstream = common::start_fixed_upstream(200, r#"{"response":"unused"}"#).await;

    let mut config = GatewayConfig::default();
    config.upstream.base_url = format!("http://{upstream}");
    config.provider = provider_config(provider_addr);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let signal = shutdown.signalled();
    let server = HttpServer::new(config).unwrap();
    let handle = tokio::spawn(async move { server.run_until(listener, signal).await });

    let client = reqwest::Client::new();

    let response = client
        .post(format!("http://{addr}/api/auth/login"))
        .json(&json!({ "email": "sub@example.com", "password": "subpass" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["access_token"], "tok-sub");

    let response = client
        .post(format!("http://{addr}/api/auth/login"))
        .json(&json!({ "email": "sub@example.com", "password": "nope" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    shutdown.trigger();
    handle.await.unwrap().unwrap();
}
