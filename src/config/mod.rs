//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) or CLI flags
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → MockServerConfig (validated, immutable)
//!     → one MountConfig per mount, shared via Arc
//!
//! While serving (watch = true):
//!     watcher.rs detects a change under a mount's target
//!     → the mount's route index is marked stale
//!     → the next request rescans the tree
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the mock tree itself is live
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{
    BodyParserKind, BodyParserOptions, BodyParserSetting, ListenerConfig, MockServerConfig,
    MountConfig, ObservabilityConfig, ResponseType, TimeoutConfig, VerboseSink,
};
