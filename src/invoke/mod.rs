//! Function-invocation boundary.
//!
//! # Data Flow
//! ```text
//! pipeline / dispatcher
//!     → registry.rs (name lookup, per-invocation log stream, START/END
//!                    and REPORT bookkeeping)
//!     → EdgeFunction::invoke (externally supplied implementation)
//!     → serde_json::Value result, classified by the caller
//! ```
//!
//! # Design Decisions
//! - Execution and isolation are deliberately abstracted behind this one
//!   trait; an embedded interpreter, a subprocess, or a plain Rust impl
//!   all satisfy the contract
//! - The remaining-time figure is informational only, never enforced

pub mod context;
pub mod registry;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub use context::InvocationContext;
pub use registry::FunctionRegistry;

#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("no function named '{0}' declared")]
    UnknownFunction(String),

    #[error("{message}")]
    Failed { message: String },
}

impl InvokeError {
    /// Wrap an arbitrary function failure.
    pub fn failed(message: impl Into<String>) -> Self {
        InvokeError::Failed {
            message: message.into(),
        }
    }
}

/// Externally supplied edge function code.
///
/// The crate never loads or isolates user code itself; it only calls this
/// one operation with the wire event and classifies what comes back.
#[async_trait]
pub trait EdgeFunction: Send + Sync {
    async fn invoke(
        &self,
        request_id: &str,
        event: Value,
        ctx: &InvocationContext,
    ) -> Result<Value, InvokeError>;
}
