//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (Host header, path)
//!     → resolver.rs (distribution by host, behavior by pattern,
//!                    origin by name)
//!     → pattern.rs (glob evaluation)
//!     → Resolution or a distinct SelectionError
//! ```
//!
//! # Design Decisions
//! - Deterministic: same input always resolves the same way
//! - First match wins, in declaration order
//! - A host matching two distributions is a configuration error caught at
//!   load time, never resolved silently at runtime

pub mod pattern;
pub mod resolver;

pub use resolver::{resolve, Resolution, SelectionError};
