//! API gateway for the Delta website.
//!
//! Fronts two external collaborators: a chat backend that sleeps when idle
//! (wrapped by the resilience layer) and an identity/subscription provider
//! (wrapped by the provider client and access resolver).

pub mod access;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod provider;
pub mod resilience;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
