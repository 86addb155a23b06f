//! HTTP primitives and the host surface.
//!
//! `headers` and `body` are the crate's own representations, chosen to
//! survive the wire boundary to invoked functions without losing order,
//! duplicates, or binary content. `server` is the Axum front door.

pub mod body;
pub mod headers;
pub mod server;

pub use headers::Headers;
pub use server::HttpServer;
