//! Local CDN edge-compute emulator library.
//!
//! Emulates a CDN edge in front of real backend origins: distributions
//! route inbound hosts and paths, edge functions run at the viewer-request
//! and origin-request checkpoints, and their log output fans out to
//! subscription destinations.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌────────────────────────────────────────────────┐
//!                      │                 EDGE EMULATOR                  │
//!                      │                                                │
//!   Client Request     │  ┌────────┐   ┌─────────┐   ┌──────────────┐  │
//!   ───────────────────┼─▶│  http  │──▶│ routing │──▶│     edge     │  │
//!                      │  │ server │   │resolver │   │   pipeline   │  │
//!                      │  └────────┘   └─────────┘   └──────┬───────┘  │
//!                      │                                    │          │
//!                      │                   ┌────────────────┤          │
//!                      │                   ▼                ▼          │
//!                      │            ┌────────────┐   ┌────────────┐    │
//!                      │            │   invoke   │   │   origin   │    │
//!                      │            │  registry  │   │   client   │◀───┼── Backend
//!                      │            └─────┬──────┘   └────────────┘    │    Origin
//!                      │                  │                            │
//!                      │                  ▼                            │
//!                      │            ┌────────────┐   ┌────────────┐    │
//!                      │            │ log store  │──▶│ dispatcher │    │
//!                      │            └────────────┘   └────────────┘    │
//!                      └────────────────────────────────────────────────┘
//! ```
//!
//! Function execution itself is externally supplied: implement
//! [`invoke::EdgeFunction`] and register it under the name the
//! configuration binds.

// Core subsystems
pub mod config;
pub mod edge;
pub mod http;
pub mod origin;
pub mod routing;

// Function execution and its observability
pub mod invoke;
pub mod logs;

pub mod constants;

pub use config::{load_config, EmulatorConfig};
pub use edge::EdgePipeline;
pub use http::HttpServer;
pub use invoke::{EdgeFunction, FunctionRegistry, InvocationContext, InvokeError};
pub use logs::{LogStore, SubscriptionDispatcher};
