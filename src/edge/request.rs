//! Edge request model and per-stage construction.
//!
//! # Responsibilities
//! - Model the request value threaded through the pipeline stages
//! - Build the initial viewer request from the raw inbound message
//! - Decorate the origin request with simulated viewer/geo headers and
//!   bind it to the selected origin
//!
//! # Design Decisions
//! - Each stage works on its own mutable copy; requests are never shared
//!   across concurrent connections

use serde::{Deserialize, Serialize};

use crate::config::OriginConfig;
use crate::edge::viewer::Viewer;
use crate::http::body::{EdgeBody, WireBody};
use crate::http::headers::{Headers, WireHeaders};

/// A request at some stage of the edge pipeline.
#[derive(Debug, Clone)]
pub struct EdgeRequest {
    pub client_ip: String,
    pub method: String,
    /// Path without the querystring.
    pub uri: String,
    /// Querystring without the leading `?`; empty when absent.
    pub querystring: String,
    pub headers: Headers,
    pub body: Option<EdgeBody>,
    /// Present once the request has been bound to an origin.
    pub origin: Option<CustomOrigin>,
}

/// The custom-origin envelope attached at the origin-request stage.
#[derive(Debug, Clone)]
pub struct CustomOrigin {
    pub custom_headers: Headers,
    pub domain_name: String,
    pub keepalive_timeout: u64,
    pub path: String,
    pub port: u16,
    pub protocol: String,
    pub read_timeout: u64,
    pub ssl_protocols: Vec<String>,
}

impl CustomOrigin {
    /// Build the origin envelope for a configured origin.
    pub fn from_config(origin: &OriginConfig) -> Self {
        let mut custom_headers = Headers::new();
        for (name, value) in &origin.headers {
            custom_headers.set(name, value);
        }

        Self {
            custom_headers,
            domain_name: origin.domain.clone(),
            keepalive_timeout: 5,
            path: origin.path.clone(),
            port: origin.port,
            protocol: origin.protocol.clone(),
            read_timeout: 30,
            ssl_protocols: Vec::new(),
        }
    }
}

/// Build the initial request of the VIEWER_REQUEST stage.
///
/// `raw_path` is the request target as received, path plus optional
/// querystring.
pub fn construct_viewer_request(
    viewer: &Viewer,
    method: &str,
    raw_path: &str,
    headers: Headers,
    body: Option<EdgeBody>,
) -> EdgeRequest {
    let (uri, querystring) = match raw_path.split_once('?') {
        Some((path, query)) => (path, query),
        None => (raw_path, ""),
    };
    let uri = if uri.is_empty() { "/" } else { uri };

    EdgeRequest {
        client_ip: viewer.ip.clone(),
        method: method.to_string(),
        uri: uri.to_string(),
        querystring: querystring.to_string(),
        headers,
        body,
        origin: None,
    }
}

/// Decorate a request for the ORIGIN_REQUEST stage: simulated viewer/geo
/// headers plus the selected origin. An origin a function already attached
/// is kept.
pub fn construct_origin_request(
    id: &str,
    request: EdgeRequest,
    viewer: &Viewer,
    origin: &OriginConfig,
) -> EdgeRequest {
    let mut headers = request.headers;

    headers.set("x-amz-cf-id", id);
    headers.set("cloudfront-viewer-address", &viewer.ip);
    headers.set("cloudfront-viewer-asn", &viewer.asn.to_string());
    headers.set("cloudfront-viewer-country", &viewer.country);
    headers.set("cloudfront-viewer-city", &viewer.city);
    headers.set("cloudfront-viewer-country-name", &viewer.country_name);
    headers.set("cloudfront-viewer-country-region", &viewer.country_region);
    headers.set(
        "cloudfront-viewer-country-region-name",
        &viewer.country_region_name,
    );
    headers.set("cloudfront-viewer-latitude", &viewer.latitude.to_string());
    headers.set("cloudfront-viewer-longitude", &viewer.longitude.to_string());
    headers.set("cloudfront-viewer-postal-code", &viewer.postal_code);
    headers.set("cloudfront-viewer-time-zone", &viewer.time_zone);
    headers.set("cloudfront-viewer-http-version", &viewer.http_version);
    headers.set("cloudfront-forwarded-proto", &viewer.http_protocol);

    let mut forwarded: Vec<&str> = viewer.forwarded_ips.iter().map(String::as_str).collect();
    forwarded.push(&viewer.ip);
    headers.set("x-forwarded-for", &forwarded.join(", "));

    EdgeRequest {
        client_ip: request.client_ip,
        method: request.method,
        uri: request.uri,
        querystring: request.querystring,
        headers,
        body: request.body,
        origin: request
            .origin
            .or_else(|| Some(CustomOrigin::from_config(origin))),
    }
}

/// Request shape crossing the wire boundary to the invoked function.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireRequest {
    pub client_ip: String,
    pub headers: WireHeaders,
    pub method: String,
    pub querystring: String,
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<WireBody>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<WireOrigin>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireOrigin {
    pub custom: WireCustomOrigin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireCustomOrigin {
    pub custom_headers: WireHeaders,
    pub domain_name: String,
    pub keepalive_timeout: u64,
    pub path: String,
    pub port: u16,
    pub protocol: String,
    pub read_timeout: u64,
    pub ssl_protocols: Vec<String>,
}

impl EdgeRequest {
    pub fn to_wire(&self) -> WireRequest {
        WireRequest {
            client_ip: self.client_ip.clone(),
            headers: self.headers.to_wire(),
            method: self.method.clone(),
            querystring: self.querystring.clone(),
            uri: self.uri.clone(),
            body: self.body.as_ref().map(EdgeBody::to_wire),
            origin: self.origin.as_ref().map(|origin| WireOrigin {
                custom: WireCustomOrigin {
                    custom_headers: origin.custom_headers.to_wire(),
                    domain_name: origin.domain_name.clone(),
                    keepalive_timeout: origin.keepalive_timeout,
                    path: origin.path.clone(),
                    port: origin.port,
                    protocol: origin.protocol.clone(),
                    read_timeout: origin.read_timeout,
                    ssl_protocols: origin.ssl_protocols.clone(),
                },
            }),
        }
    }

    pub fn from_wire(wire: WireRequest) -> Result<Self, base64::DecodeError> {
        let body = match &wire.body {
            Some(wire_body) => EdgeBody::from_wire(wire_body)?,
            None => None,
        };

        Ok(EdgeRequest {
            client_ip: wire.client_ip,
            method: wire.method,
            uri: wire.uri,
            querystring: wire.querystring,
            headers: Headers::from_wire(&wire.headers),
            body,
            origin: wire.origin.map(|origin| CustomOrigin {
                custom_headers: Headers::from_wire(&origin.custom.custom_headers),
                domain_name: origin.custom.domain_name,
                keepalive_timeout: origin.custom.keepalive_timeout,
                path: origin.custom.path,
                port: origin.custom.port,
                protocol: origin.custom.protocol,
                read_timeout: origin.custom.read_timeout,
                ssl_protocols: origin.custom.ssl_protocols,
            }),
        })
    }
}
