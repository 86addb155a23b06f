//! Distribution, behavior, and origin resolution.
//!
//! # Responsibilities
//! - Select the distribution whose domain set contains the inbound host
//! - Select the first behavior whose pattern matches the path
//! - Look up the behavior's origin by name
//!
//! # Design Decisions
//! - First match wins, in declaration order, not specificity. This is a
//!   deliberate simplification versus the real platform's matching
//! - The path is compared without its querystring
//! - Each failure is a distinct error, fatal to the current request

use thiserror::Error;

use crate::config::{BehaviorConfig, DistributionConfig, OriginConfig};
use crate::routing::pattern::glob_match;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("'{0}' could not be matched to any configured distribution")]
    HostUnmatched(String),

    #[error("'{path}' could not be matched to any behavior in distribution '{distribution}'")]
    PathUnmatched { distribution: String, path: String },

    #[error("no origin named '{origin}' declared in distribution '{distribution}'")]
    OriginUnmatched {
        distribution: String,
        origin: String,
    },
}

/// The outcome of resolving one inbound request.
#[derive(Debug, Clone, Copy)]
pub struct Resolution<'a> {
    pub distribution: &'a DistributionConfig,
    pub behavior: &'a BehaviorConfig,
    pub origin: &'a OriginConfig,
}

/// Resolve an inbound `host` + `path` against the configured distributions.
pub fn resolve<'a>(
    distributions: &'a [DistributionConfig],
    host: &str,
    path: &str,
) -> Result<Resolution<'a>, SelectionError> {
    let path = path.split('?').next().unwrap_or("/");

    let distribution = distributions
        .iter()
        .find(|distribution| distribution.domains.iter().any(|domain| domain == host))
        .ok_or_else(|| SelectionError::HostUnmatched(host.to_string()))?;

    let behavior = distribution
        .behaviors
        .iter()
        .find(|behavior| glob_match(&behavior.pattern, path))
        .ok_or_else(|| SelectionError::PathUnmatched {
            distribution: distribution.id.clone(),
            path: path.to_string(),
        })?;

    let origin = distribution
        .origins
        .iter()
        .find(|origin| origin.name == behavior.origin)
        .ok_or_else(|| SelectionError::OriginUnmatched {
            distribution: distribution.id.clone(),
            origin: behavior.origin.clone(),
        })?;

    Ok(Resolution {
        distribution,
        behavior,
        origin,
    })
}
