//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, limits, request ID, timeout)
//! - Bind server to listener, drive graceful shutdown
//! - Hold the shared state handlers need (clients, retry policy)

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{DefaultBodyLimit, MatchedPath, Request};
use axum::http::{header, HeaderValue, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use thiserror::Error;
use tokio::net::TcpListener;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower::ServiceBuilder;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use url::Url;

use crate::config::GatewayConfig;
use crate::http::{auth, chat, request};
use crate::observability::metrics;
use crate::provider::{ProviderClient, ProviderError};
use crate::resilience::RetryPolicy;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Outbound client for the chat backend.
    pub http: reqwest::Client,
    /// Identity provider client.
    pub provider: Arc<ProviderClient>,
    /// Retry policy for chat backend calls.
    pub retry_policy: RetryPolicy,
    /// Resolved chat endpoint on the backend.
    pub chat_url: Url,
}

/// Errors surfaced while assembling the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid upstream configuration: {0}")]
    Upstream(String),

    #[error("failed to build outbound client: {0}")]
    Client(#[from] reqwest::Error),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
}

impl HttpServer {
    /// Create a new HTTP server from validated configuration.
    pub fn new(config: GatewayConfig) -> Result<Self, ServerError> {
        let chat_url = chat_endpoint(&config)?;
        let provider = Arc::new(ProviderClient::new(&config.provider)?);

        // No client-level timeout: the retry executor owns per-attempt deadlines.
        let http = reqwest::Client::builder().build()?;

        let state = AppState {
            http,
            provider,
            retry_policy: RetryPolicy::from(config.retries),
            chat_url,
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let mut router = Router::new()
            .route("/health", get(health))
            .route("/api/chat", post(chat::chat_handler))
            .route("/api/auth/login", post(auth::login))
            .route("/api/auth/signup", post(auth::signup))
            .route("/api/auth/logout", post(auth::logout))
            .route("/api/auth/recover", post(auth::recover))
            .route("/api/auth/password", post(auth::update_password))
            .route("/api/access", get(auth::access))
            .route_layer(middleware::from_fn(track_metrics))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    // Outermost: excess requests queue here, sharing one
                    // semaphore across every connection.
                    .layer(GlobalConcurrencyLimitLayer::new(
                        config.listener.max_connections,
                    ))
                    .layer(request::set_request_id_layer())
                    .layer(TraceLayer::new_for_http())
                    .layer(TimeoutLayer::new(Duration::from_secs(
                        config.timeouts.request_secs,
                    )))
                    .layer(DefaultBodyLimit::max(config.security.max_body_size))
                    .layer(request::propagate_request_id_layer()),
            );

        if config.security.enable_headers {
            router = router.layer(SetResponseHeaderLayer::if_not_present(
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ));
        }

        router
    }

    /// Run the server until an OS shutdown signal arrives.
    pub async fn run(self, listener: TcpListener) -> std::io::Result<()> {
        self.run_until(listener, crate::lifecycle::signals::shutdown_signal())
            .await
    }

    /// Run the server until `signal` resolves.
    pub async fn run_until<F>(self, listener: TcpListener, signal: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(signal)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

fn chat_endpoint(config: &GatewayConfig) -> Result<Url, ServerError> {
    let base: Url = config
        .upstream
        .base_url
        .parse()
        .map_err(|e| ServerError::Upstream(format!("base_url: {e}")))?;
    base.join(&config.upstream.chat_path)
        .map_err(|e| ServerError::Upstream(format!("chat_path: {e}")))
}

/// `GET /health`
async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// Per-request metrics, keyed by matched route so path parameters
/// never explode label cardinality.
async fn track_metrics(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|m| m.as_str().to_owned())
        .unwrap_or_else(|| req.uri().path().to_owned());

    let response = next.run(req).await;

    metrics::record_request(method.as_str(), response.status().as_u16(), &route, start);
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_endpoint_joins_base_and_path() {
        let mut config = GatewayConfig::default();
        config.upstream.base_url = "https://delta-80ht.onrender.com".into();
        config.upstream.chat_path = "/chat".into();
        let url = chat_endpoint(&config).unwrap();
        assert_eq!(url.as_str(), "https://delta-80ht.onrender.com/chat");
    }

    #[test]
    fn server_builds_from_default_config() {
        assert!(HttpServer::new(GatewayConfig::default()).is_ok());
    }
}
