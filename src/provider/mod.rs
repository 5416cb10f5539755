//! Identity provider subsystem.
//!
//! # Data Flow
//! ```text
//! http/auth handlers
//!     → client.rs (auth delegation, row reads)
//!     → types.rs (Session, AuthUser, ProviderError)
//!     → access::resolver (entitlement projection)
//! ```
//!
//! # Design Decisions
//! - The provider owns auth state; the gateway holds no session store
//! - One bounded timeout per call, no retries (provider is presumed warm)

pub mod client;
pub mod types;

pub use client::ProviderClient;
pub use types::{AuthUser, ProviderError, ProviderResult, Session};
