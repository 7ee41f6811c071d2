//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path + method
//!     → path.rs (strip base URL and query, split segments)
//!     → index.rs (current snapshot of the mock tree)
//!     → resolver.rs (literal walk, then backtracking search)
//!         → matcher.rs (admissible children per segment)
//!     → Return: ResolvedTarget or not found
//! ```
//!
//! # Design Decisions
//! - The directory tree is the routing table; the index is only a snapshot
//! - Deterministic: same tree and request always resolve to the same file
//! - First match wins (exact before capture, captures in name order)

pub mod index;
pub mod matcher;
pub mod path;
pub mod resolver;

pub use index::{IndexCache, RefreshPolicy, RouteIndex, RouteNode};
pub use matcher::Params;
pub use resolver::{resolve, MethodFiles, ResolvedTarget, TargetKind};
