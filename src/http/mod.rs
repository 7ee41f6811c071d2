//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace span, timeout)
//!     → middleware/mock.rs (one layer per mount, in config order)
//!         → dispatch::Mount (resolve, negotiate.rs, body.rs)
//!         → response.rs (data bytes, 404 page, error statuses)
//!     → fallback 404 when no mount answered
//!     → Send to client
//! ```

pub mod body;
pub mod middleware;
pub mod negotiate;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::MockServer;
