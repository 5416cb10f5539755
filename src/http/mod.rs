//! HTTP surface of the gateway.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, metrics)
//!     → request.rs (request ID in, propagated out)
//!     → chat.rs (proxy to the chat backend via resilience::retry)
//!     → auth.rs (delegate to provider, premium-access gate)
//! ```

pub mod auth;
pub mod chat;
pub mod request;
pub mod server;

pub use chat::{ChatRequest, ChatResponse};
pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use server::{AppState, HttpServer, ServerError};
