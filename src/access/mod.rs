//! Access-tier resolution subsystem.
//!
//! # Data Flow
//! ```text
//! provider rows (profiles, subscriptions)
//!     → types.rs (nullable-field models of the remote store)
//!     → resolver.rs (pure projection → AccessInfo)
//!     → http layer (boolean gate for premium pages)
//! ```
//!
//! # Design Decisions
//! - Resolution is a pure function; callers supply the evaluation instant
//! - Missing rows never error, they degrade to free-tier defaults
//! - The developer allow-list bypasses billing but never rewrites it

pub mod resolver;
pub mod types;

pub use resolver::{is_developer_email, resolve_access, AccessInfo, DEVELOPER_EMAILS};
pub use types::{Plan, Profile, Role, Subscription, SubscriptionStatus};
