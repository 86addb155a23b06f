//! Subscription dispatch: filter and fan out accumulated log lines.
//!
//! # Responsibilities
//! - Drain the log store once per cycle
//! - Filter each stream's lines against each subscription's pattern
//! - Deliver surviving lines to the destination function, gzip+base64
//!   wrapped in the platform's delivery envelope
//!
//! # Design Decisions
//! - Delivery is fire-and-forget: errors are swallowed, never retried,
//!   never surfaced. This is the intentional best-effort contract
//! - The drain happens before any delivery, so a second cycle with no new
//!   lines delivers nothing and no line is ever delivered twice

use std::io::Write as _;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use flate2::write::GzEncoder;
use flate2::Compression;
use rand::Rng as _;
use serde::Serialize;
use serde_json::json;

use crate::config::SubscriptionConfig;
use crate::constants::AWS_ACCOUNT_ID;
use crate::invoke::FunctionRegistry;
use crate::logs::store::{DrainedGroup, DrainedStream, LogStore};

/// Decompressed payload of one delivery envelope.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DeliveryData<'a> {
    owner: String,
    log_group: &'a str,
    log_stream: &'a str,
    subscription_filters: Vec<&'a str>,
    message_type: &'static str,
    log_events: Vec<LogEvent>,
}

#[derive(Debug, Serialize)]
struct LogEvent {
    id: String,
    timestamp: i64,
    message: String,
}

/// Fans accumulated log lines out to subscription destinations.
pub struct SubscriptionDispatcher {
    subscriptions: Vec<SubscriptionConfig>,
    store: Arc<LogStore>,
    registry: Arc<FunctionRegistry>,
}

impl SubscriptionDispatcher {
    pub fn new(
        subscriptions: Vec<SubscriptionConfig>,
        store: Arc<LogStore>,
        registry: Arc<FunctionRegistry>,
    ) -> Self {
        Self {
            subscriptions,
            store,
            registry,
        }
    }

    /// Run one dispatch cycle.
    pub async fn dispatch(&self) {
        let drained = self.store.drain();

        for subscription in &self.subscriptions {
            for group in drained.iter().filter(|group| group.name == subscription.group) {
                for stream in &group.streams {
                    self.deliver(subscription, group, stream).await;
                }
            }
        }
    }

    async fn deliver(
        &self,
        subscription: &SubscriptionConfig,
        group: &DrainedGroup,
        stream: &DrainedStream,
    ) {
        let surviving = filter_lines(&stream.lines, subscription.pattern.as_deref());
        if surviving.is_empty() {
            return;
        }

        let data = DeliveryData {
            owner: AWS_ACCOUNT_ID.to_string(),
            log_group: &group.name,
            log_stream: &stream.name,
            subscription_filters: vec![&subscription.name],
            message_type: "DATA_MESSAGE",
            log_events: surviving
                .into_iter()
                .map(|message| LogEvent {
                    id: rand::thread_rng().gen_range(0..1000).to_string(),
                    timestamp: chrono::Utc::now().timestamp_millis(),
                    message,
                })
                .collect(),
        };

        let event = match encode_envelope(&data) {
            Ok(event) => event,
            Err(error) => {
                tracing::debug!(
                    subscription = %subscription.name,
                    error = %error,
                    "Failed to encode log delivery envelope"
                );
                return;
            }
        };

        let request_id = uuid::Uuid::new_v4().simple().to_string();
        if let Err(error) = self
            .registry
            .invoke(&subscription.destination, &request_id, event)
            .await
        {
            // Best effort: a failed delivery is dropped, not retried.
            tracing::debug!(
                subscription = %subscription.name,
                destination = %subscription.destination,
                error = %error,
                "Log delivery failed"
            );
        }
    }
}

fn encode_envelope(data: &DeliveryData<'_>) -> Result<serde_json::Value, std::io::Error> {
    let serialized = serde_json::to_vec(data)?;
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&serialized)?;
    let compressed = encoder.finish()?;

    Ok(json!({
        "awslogs": {
            "data": BASE64.encode(compressed),
        }
    }))
}

/// Apply a subscription filter pattern.
///
/// A space is inserted before every hyphen, the pattern is split on
/// whitespace, and every token must hold: `-tok` excludes lines containing
/// `tok`, any other token must be present as a substring. An empty pattern
/// matches every line.
pub fn filter_lines(lines: &[String], pattern: Option<&str>) -> Vec<String> {
    let pattern = pattern.unwrap_or("").replace('-', " -");
    let tokens: Vec<&str> = pattern.split_whitespace().collect();
    if tokens.is_empty() {
        return lines.to_vec();
    }

    lines
        .iter()
        .filter(|line| {
            tokens.iter().all(|token| {
                if let Some(excluded) = token.strip_prefix('-') {
                    !line.contains(excluded)
                } else {
                    line.contains(token)
                }
            })
        })
        .cloned()
        .collect()
}
