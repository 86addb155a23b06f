//! Origin interaction subsystem.
//!
//! # Data Flow
//! ```text
//! origin-bound EdgeRequest
//!     → client.rs (URL + header construction, Host override)
//!     → real backend origin
//!     → content-encoding aware body decode
//!     → EdgeResponse (never carries content-encoding)
//! ```

pub mod client;

pub use client::{FetchError, OriginClient};
