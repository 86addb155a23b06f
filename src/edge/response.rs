//! Edge response model, synthetic error responses, and the client-facing
//! response writer.
//!
//! # Responsibilities
//! - Model the response value produced by a function or the origin fetch
//! - Convert any failure into the fixed-shape synthetic 500 response
//! - Inject the simulated edge headers and write the response out

use axum::body::Body;
use axum::http::{HeaderName, HeaderValue, Response, StatusCode};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::constants::EDGE_POP;
use crate::http::body::EdgeBody;
use crate::http::headers::{Headers, WireHeaders};

/// A response at the RESPOND stage of the pipeline.
#[derive(Debug, Clone)]
pub struct EdgeResponse {
    pub status: u16,
    pub status_description: String,
    pub headers: Headers,
    pub body: Option<EdgeBody>,
}

/// Response shape crossing the wire boundary, body base64-tagged.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_description: Option<String>,
    #[serde(default)]
    pub headers: WireHeaders,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_encoding: Option<String>,
}

impl EdgeResponse {
    pub fn to_wire(&self) -> WireResponse {
        WireResponse {
            status: self.status.to_string(),
            status_description: Some(self.status_description.clone()),
            headers: self.headers.to_wire(),
            body: self.body.as_ref().map(|body| BASE64.encode(body.as_bytes())),
            body_encoding: self.body.as_ref().map(|_| "base64".to_string()),
        }
    }
}

/// Convert any failure into the fixed-shape synthetic response: 500,
/// `text/html`, the formatted error embedded in the body. Always written
/// as a *generated* response.
pub fn generate_error_response(error: &dyn std::fmt::Display) -> EdgeResponse {
    let formatted = error.to_string();
    let formatted = if formatted.is_empty() {
        "Unknown error".to_string()
    } else {
        formatted
    };

    let body = format!("<h1>AWS Lambda@Edge Error</h1><pre><code>{formatted}</code></pre>");

    EdgeResponse {
        status: 500,
        status_description: "Server error".to_string(),
        headers: Headers::from([("content-type", "text/html")]),
        body: EdgeBody::from_bytes(body.into_bytes()),
    }
}

/// How the response writer should brand the response.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Correlation id of the connection.
    pub id: String,
    /// Inbound Host, echoed into `via`.
    pub host: String,
    /// True for function-generated responses, false for fetched ones.
    pub generated: bool,
}

/// Turn an EdgeResponse into the client-facing HTTP response, injecting
/// the simulated edge headers.
pub fn into_client_response(response: EdgeResponse, options: &WriteOptions) -> Response<Body> {
    let mut headers = response.headers;

    // The body was decoded and re-encoded along the way; forwarding these
    // back to the client would be lying.
    headers.remove("content-encoding");
    headers.remove("transfer-encoding");
    headers.remove("content-length");

    headers.set("x-amz-cf-id", &options.id);
    headers.set("x-amz-cf-pop", EDGE_POP);
    headers.set(
        "x-cache",
        if options.generated {
            "LambdaGeneratedResponse from cloudfront"
        } else {
            "Miss from cloudfront"
        },
    );
    headers.set("via", &format!("1.1 {} (CloudFront)", options.host));

    let status =
        StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let mut builder = Response::builder().status(status);
    if let Some(header_map) = builder.headers_mut() {
        for (name, value) in headers.entries() {
            let name = match HeaderName::from_bytes(name.as_bytes()) {
                Ok(name) => name,
                Err(_) => {
                    tracing::warn!(header = %name, "Dropping invalid response header name");
                    continue;
                }
            };
            let value = match HeaderValue::from_str(value) {
                Ok(value) => value,
                Err(_) => {
                    tracing::warn!(header = %name, "Dropping invalid response header value");
                    continue;
                }
            };
            header_map.append(name, value);
        }
    }

    let body = match response.body {
        Some(body) => Body::from(body.into_bytes()),
        None => Body::empty(),
    };

    // The builder only fails on invalid parts, which were sanitized above.
    builder
        .body(body)
        .unwrap_or_else(|_| Response::new(Body::empty()))
}
