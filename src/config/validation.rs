//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (behaviors reference declared origins)
//! - Detect duplicate domains across distributions
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: EmulatorConfig → Result<(), Vec<ValidationError>>
//! - Runs before the config is accepted into the system

use thiserror::Error;

use crate::config::schema::EmulatorConfig;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A host must match at most one distribution; a domain declared twice
    /// makes resolution ambiguous and is rejected up front.
    #[error("domain '{domain}' is declared by both distribution '{first}' and '{second}'")]
    DuplicateDomain {
        domain: String,
        first: String,
        second: String,
    },

    #[error("distribution '{0}' declares no domains")]
    NoDomains(String),

    #[error("behavior '{pattern}' in distribution '{distribution}' references unknown origin '{origin}'")]
    UnknownOrigin {
        distribution: String,
        pattern: String,
        origin: String,
    },

    #[error("origin '{origin}' in distribution '{distribution}' has unsupported protocol '{protocol}'")]
    UnsupportedProtocol {
        distribution: String,
        origin: String,
        protocol: String,
    },
}

/// Validate a deserialized configuration, collecting every error.
pub fn validate_config(config: &EmulatorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut seen_domains: Vec<(&str, &str)> = Vec::new();

    for distribution in &config.distributions {
        if distribution.domains.is_empty() {
            errors.push(ValidationError::NoDomains(distribution.id.clone()));
        }

        for domain in &distribution.domains {
            if let Some((_, first)) = seen_domains.iter().find(|(d, _)| *d == domain.as_str()) {
                errors.push(ValidationError::DuplicateDomain {
                    domain: domain.clone(),
                    first: first.to_string(),
                    second: distribution.id.clone(),
                });
            } else {
                seen_domains.push((domain.as_str(), distribution.id.as_str()));
            }
        }

        for origin in &distribution.origins {
            if origin.protocol != "http" && origin.protocol != "https" {
                errors.push(ValidationError::UnsupportedProtocol {
                    distribution: distribution.id.clone(),
                    origin: origin.name.clone(),
                    protocol: origin.protocol.clone(),
                });
            }
        }

        for behavior in &distribution.behaviors {
            let known = distribution
                .origins
                .iter()
                .any(|origin| origin.name == behavior.origin);
            if !known {
                errors.push(ValidationError::UnknownOrigin {
                    distribution: distribution.id.clone(),
                    pattern: behavior.pattern.clone(),
                    origin: behavior.origin.clone(),
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
