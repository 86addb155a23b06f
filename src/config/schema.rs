//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! emulator. All types derive Serde traits for deserialization from
//! config files.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Root configuration for the emulator.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct EmulatorConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Distribution definitions routing hosts and paths to origins.
    pub distributions: Vec<DistributionConfig>,

    /// Log subscriptions fanning log lines out to destination functions.
    pub subscriptions: Vec<SubscriptionConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8787").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8787".to_string(),
        }
    }
}

/// Pipeline checkpoints an edge function can be bound to.
///
/// `viewer-response` and `origin-response` are accepted by the config
/// shape but never invoked by the pipeline; they exist as an extension
/// point mirroring the real platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventType {
    ViewerRequest,
    OriginRequest,
    ViewerResponse,
    OriginResponse,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::ViewerRequest => "viewer-request",
            EventType::OriginRequest => "origin-request",
            EventType::ViewerResponse => "viewer-response",
            EventType::OriginResponse => "origin-response",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level routing unit keyed by one or more hostnames.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DistributionConfig {
    /// Distribution identifier, surfaced in events.
    pub id: String,

    /// Hostnames this distribution serves. The first one doubles as the
    /// `distributionDomainName` in events.
    pub domains: Vec<String>,

    /// Backend origins behaviors can forward to.
    #[serde(default)]
    pub origins: Vec<OriginConfig>,

    /// Ordered behaviors; first matching pattern wins.
    #[serde(default)]
    pub behaviors: Vec<BehaviorConfig>,
}

/// Backend HTTP(S) target a behavior forwards unhandled requests to.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OriginConfig {
    /// Unique origin name within the distribution.
    pub name: String,

    /// "http" or "https".
    #[serde(default = "default_protocol")]
    pub protocol: String,

    /// Origin hostname; also becomes the outbound `Host` header.
    pub domain: String,

    /// Origin port.
    pub port: u16,

    /// Path prefix prepended to the request path.
    #[serde(default)]
    pub path: String,

    /// Fixed custom headers merged over the request's headers.
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

fn default_protocol() -> String {
    "http".to_string()
}

/// Ordered rule mapping a path pattern to an origin and optional edge
/// functions.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BehaviorConfig {
    /// Glob-style path pattern: `*` matches within a segment, `**` may
    /// cross `/`.
    pub pattern: String,

    /// Name of the origin unhandled requests are forwarded to.
    pub origin: String,

    /// Edge function bound to each pipeline checkpoint.
    #[serde(default)]
    pub functions: HashMap<EventType, String>,
}

/// Filter + destination rule fanning log lines out to another function.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubscriptionConfig {
    /// Subscription name, surfaced in delivery envelopes.
    pub name: String,

    /// Source log group name.
    pub group: String,

    /// Optional filter pattern; an empty or absent pattern matches every
    /// line.
    pub pattern: Option<String>,

    /// Destination function name.
    pub destination: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_behavior_function_bindings_parse_from_toml() {
        let toml = r#"
            [[distributions]]
            id = "DIST1"
            domains = ["shop.example"]

            [[distributions.origins]]
            name = "store"
            domain = "127.0.0.1"
            port = 3000

            [[distributions.behaviors]]
            pattern = "/api/*"
            origin = "store"

            [distributions.behaviors.functions]
            viewer-request = "auth"
            origin-request = "rewrite"
        "#;

        let config: EmulatorConfig = toml::from_str(toml).unwrap();
        let behavior = &config.distributions[0].behaviors[0];
        assert_eq!(
            behavior.functions.get(&EventType::ViewerRequest),
            Some(&"auth".to_string())
        );
        assert_eq!(
            behavior.functions.get(&EventType::OriginRequest),
            Some(&"rewrite".to_string())
        );
        assert_eq!(config.distributions[0].origins[0].protocol, "http");
    }

    #[test]
    fn test_subscription_pattern_is_optional() {
        let toml = r#"
            [[subscriptions]]
            name = "errors"
            group = "/aws/lambda/us-east-1.auth"
            destination = "alerting"
        "#;

        let config: EmulatorConfig = toml::from_str(toml).unwrap();
        assert!(config.subscriptions[0].pattern.is_none());
    }
}
