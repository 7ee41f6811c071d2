//! Filesystem-mirrored HTTP mock server.
//!
//! A directory tree stands in for a URL hierarchy: `users/__id__/GET.json`
//! answers `GET /users/42` with the file's bytes, and `users/__id__/POST.toml`
//! runs a handler script with `id = 42` captured.

pub mod config;
pub mod dispatch;
pub mod handler;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::schema::{MockServerConfig, MountConfig};
pub use dispatch::{mount, DispatchError, Mount, MountOutcome, PendingResponse};
pub use handler::{Exchange, HandlerRegistry};
pub use http::MockServer;
pub use lifecycle::Shutdown;
