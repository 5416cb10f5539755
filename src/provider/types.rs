//! Identity provider wire types and errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result alias for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// The authenticated user object returned by the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// A session issued by the provider on sign-in or sign-up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub token_type: Option<String>,
    pub user: AuthUser,
}

/// Errors that can occur talking to the identity provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The configured endpoint could not be turned into a client.
    #[error("invalid provider configuration: {0}")]
    Config(String),

    /// Transport failed or the request timed out.
    #[error("provider unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    /// Sign-in rejected the supplied credentials.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Bearer token missing, expired, or revoked.
    #[error("unauthorized")]
    Unauthorized,

    /// The provider answered with an unexpected status.
    #[error("provider returned status {status}: {detail}")]
    Status { status: u16, detail: String },

    /// The provider answered with a body this client cannot interpret.
    #[error("unexpected provider response: {0}")]
    Decode(String),
}
