//! Edge pipeline subsystem.
//!
//! # Data Flow
//! ```text
//! inbound message
//!     → viewer.rs (connection facts, simulated geo)
//!     → request.rs (per-stage request construction)
//!     → event.rs (wire envelope, result classification)
//!     → pipeline.rs (stage orchestration)
//!     → response.rs (generated errors, client response writing)
//! ```

pub mod event;
pub mod pipeline;
pub mod request;
pub mod response;
pub mod viewer;

pub use pipeline::{EdgePipeline, InboundRequest, PipelineError};
