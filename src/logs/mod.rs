//! Log accumulation and subscription fan-out subsystem.
//!
//! # Data Flow
//! ```text
//! function invocation
//!     → store.rs (group per function, stream per version, append lines)
//!     → dispatcher.rs (drain once per cycle, filter per subscription,
//!                      gzip+base64 envelope, fire-and-forget delivery)
//!     → destination function
//! ```
//!
//! # Design Decisions
//! - A line never survives past the cycle it was drained in, and is never
//!   delivered twice
//! - Deliveries are best effort; failures are swallowed by contract

pub mod dispatcher;
pub mod store;

pub use dispatcher::SubscriptionDispatcher;
pub use store::{LogGroup, LogStore, LogStream};
