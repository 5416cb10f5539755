//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to the chat backend:
//!     → retry.rs (per-attempt deadline, classify failure, retry with backoff)
//!     → On response: returned as-is, any HTTP status included
//!     → On exhausted budget: original error surfaced to the handler
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every upstream call has a deadline
//! - Only transport-level failures are retried; HTTP errors never are
//! - Each call owns its timer and budget; concurrent calls never interact

pub mod retry;

pub use retry::{fetch_with_retry, FetchError, RetryPolicy};
