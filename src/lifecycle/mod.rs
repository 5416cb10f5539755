//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Init logging/metrics → Bind → Serve
//!
//! Shutdown:
//!     SIGTERM/ctrl-c (signals.rs) or Shutdown::trigger (shutdown.rs)
//!     → axum graceful shutdown → drain connections → exit
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
