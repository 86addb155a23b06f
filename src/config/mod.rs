//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → EmulatorConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::load_config;
pub use schema::BehaviorConfig;
pub use schema::DistributionConfig;
pub use schema::EmulatorConfig;
pub use schema::EventType;
pub use schema::ListenerConfig;
pub use schema::OriginConfig;
pub use schema::SubscriptionConfig;
