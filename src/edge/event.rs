//! Wire event construction and result classification.
//!
//! # Responsibilities
//! - Build the event envelope passed to an invoked function
//! - Classify whatever the function returned as a Request or a Response
//!
//! # Design Decisions
//! - Classification is structural field-sniffing, exactly as the platform
//!   behaves: a non-empty `uri` makes a Request, else a truthy `status`
//!   makes a Response, anything else is an error. The sniffing lives only
//!   here, at the invoker boundary; the rest of the crate sees the
//!   explicit `EventResult` enum

use serde_json::{json, Value};
use thiserror::Error;

use crate::config::{DistributionConfig, EventType};
use crate::edge::request::{EdgeRequest, WireRequest};
use crate::edge::response::EdgeResponse;
use crate::http::body::EdgeBody;
use crate::http::headers::{Headers, WireHeaders};

/// The classified outcome of one function invocation.
#[derive(Debug, Clone)]
pub enum EventResult {
    Request(EdgeRequest),
    Response(EdgeResponse),
}

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("function returned a value that is neither a request nor a response")]
    Unclassifiable,

    #[error("function returned a malformed request: {0}")]
    MalformedRequest(String),

    #[error("function returned a malformed response: {0}")]
    MalformedResponse(String),
}

/// Build the wire event for one invocation.
pub fn construct_request_event(
    id: &str,
    event_type: EventType,
    distribution: &DistributionConfig,
    request: &EdgeRequest,
) -> Value {
    json!({
        "Records": [
            {
                "cf": {
                    "config": {
                        "distributionDomainName": distribution.domains.first().map(String::as_str).unwrap_or(""),
                        "distributionId": distribution.id,
                        "eventType": event_type.as_str(),
                        "requestId": id,
                    },
                    "request": request.to_wire(),
                }
            }
        ]
    })
}

/// Classify a function's return value.
pub fn classify(value: Value) -> Result<EventResult, ClassifyError> {
    if value
        .get("uri")
        .and_then(Value::as_str)
        .is_some_and(|uri| !uri.is_empty())
    {
        let wire: WireRequest = serde_json::from_value(value)
            .map_err(|e| ClassifyError::MalformedRequest(e.to_string()))?;
        let request = EdgeRequest::from_wire(wire)
            .map_err(|e| ClassifyError::MalformedRequest(e.to_string()))?;
        return Ok(EventResult::Request(request));
    }

    if is_truthy(value.get("status")) {
        return Ok(EventResult::Response(response_from_value(&value)?));
    }

    Err(ClassifyError::Unclassifiable)
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::Bool(b)) => *b,
        _ => false,
    }
}

/// Lenient translation of a response-shaped value. Functions return the
/// status as either a string or a number.
fn response_from_value(value: &Value) -> Result<EdgeResponse, ClassifyError> {
    let status = match value.get("status") {
        Some(Value::String(s)) => s
            .parse::<u16>()
            .map_err(|_| ClassifyError::MalformedResponse(format!("bad status '{s}'")))?,
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|n| u16::try_from(n).ok())
            .ok_or_else(|| ClassifyError::MalformedResponse("bad numeric status".to_string()))?,
        _ => return Err(ClassifyError::MalformedResponse("missing status".to_string())),
    };

    let status_description = value
        .get("statusDescription")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();

    let headers = match value.get("headers") {
        Some(headers_value) => {
            let wire: WireHeaders = serde_json::from_value(headers_value.clone())
                .map_err(|e| ClassifyError::MalformedResponse(e.to_string()))?;
            Headers::from_wire(&wire)
        }
        None => Headers::new(),
    };

    let body = match value.get("body").and_then(Value::as_str) {
        Some(data) => {
            let base64_encoded = value
                .get("bodyEncoding")
                .and_then(Value::as_str)
                .is_some_and(|encoding| encoding == "base64");
            let bytes = if base64_encoded {
                use base64::Engine as _;
                base64::engine::general_purpose::STANDARD
                    .decode(data)
                    .map_err(|e| ClassifyError::MalformedResponse(e.to_string()))?
            } else {
                data.as_bytes().to_vec()
            };
            EdgeBody::from_bytes(bytes)
        }
        None => None,
    };

    Ok(EdgeResponse {
        status,
        status_description,
        headers,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OriginConfig;
    use crate::edge::viewer::construct_viewer;
    use std::collections::HashMap;

    fn distribution() -> DistributionConfig {
        DistributionConfig {
            id: "DIST1".to_string(),
            domains: vec!["shop.example".to_string()],
            origins: vec![OriginConfig {
                name: "api".to_string(),
                protocol: "http".to_string(),
                domain: "127.0.0.1".to_string(),
                port: 3000,
                path: String::new(),
                headers: HashMap::new(),
            }],
            behaviors: Vec::new(),
        }
    }

    fn request() -> EdgeRequest {
        let viewer = construct_viewer(
            "192.0.2.7:40000".parse().unwrap(),
            false,
            "1.1",
            &Headers::new(),
        );
        crate::edge::request::construct_viewer_request(
            &viewer,
            "GET",
            "/api/users?a=1",
            Headers::new(),
            None,
        )
    }

    #[test]
    fn test_event_envelope_shape() {
        let event = construct_request_event("abc123", EventType::ViewerRequest, &distribution(), &request());
        let record = &event["Records"][0]["cf"];
        assert_eq!(record["config"]["distributionDomainName"], "shop.example");
        assert_eq!(record["config"]["distributionId"], "DIST1");
        assert_eq!(record["config"]["eventType"], "viewer-request");
        assert_eq!(record["config"]["requestId"], "abc123");
        assert_eq!(record["request"]["uri"], "/api/users");
        assert_eq!(record["request"]["querystring"], "a=1");
    }

    #[test]
    fn test_request_shaped_value_classifies_as_request() {
        let value = serde_json::to_value(request().to_wire()).unwrap();
        let result = classify(value).unwrap();
        assert!(matches!(result, EventResult::Request(_)));
    }

    #[test]
    fn test_response_shaped_value_classifies_as_response() {
        let value = json!({
            "status": "200",
            "statusDescription": "OK",
            "headers": {"x-foo": [{"key": "x-foo", "value": "bar"}]},
            "body": "aGVsbG8=",
            "bodyEncoding": "base64",
        });
        match classify(value).unwrap() {
            EventResult::Response(response) => {
                assert_eq!(response.status, 200);
                assert_eq!(response.headers.get("x-foo"), Some("bar"));
                assert_eq!(response.body.unwrap().as_bytes(), b"hello");
            }
            other => panic!("expected response, got {other:?}"),
        }
    }

    #[test]
    fn test_numeric_status_and_text_body() {
        let value = json!({"status": 204});
        match classify(value).unwrap() {
            EventResult::Response(response) => {
                assert_eq!(response.status, 204);
                assert!(response.body.is_none());
            }
            other => panic!("expected response, got {other:?}"),
        }

        let value = json!({"status": 200, "body": "plain text"});
        match classify(value).unwrap() {
            EventResult::Response(response) => {
                assert_eq!(response.body.unwrap().as_bytes(), b"plain text");
            }
            other => panic!("expected response, got {other:?}"),
        }
    }

    #[test]
    fn test_unclassifiable_values_are_errors() {
        assert!(matches!(
            classify(json!({"hello": "world"})),
            Err(ClassifyError::Unclassifiable)
        ));
        // An empty uri is not a request, and status 0 is not truthy.
        assert!(matches!(
            classify(json!({"uri": "", "status": 0})),
            Err(ClassifyError::Unclassifiable)
        ));
        assert!(matches!(
            classify(json!(null)),
            Err(ClassifyError::Unclassifiable)
        ));
    }
}
