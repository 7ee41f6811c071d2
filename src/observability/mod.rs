//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Mounts and the server produce:
//!     → logging.rs (structured log events, verbose resolution reports)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout via tracing-subscriber
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every log line via the trace span
//! - Metrics are cheap (no-op until a recorder is installed)

pub mod logging;
pub mod metrics;

pub use logging::{init_tracing, ResolutionEvent};
