//! Outbound origin fetch.
//!
//! # Responsibilities
//! - Build the outbound URL from the origin envelope plus request path
//!   and querystring
//! - Merge request headers with the origin's fixed custom headers and
//!   force the `Host` header to the origin's domain
//! - Transparently decode the response body per `content-encoding`
//!
//! # Design Decisions
//! - Uses the low-level hyper client: a high-level client that owns the
//!   `Host` header cannot emulate the platform's behavior
//! - No retries and no timeouts; network failures propagate to the caller

use std::io::Read as _;

use http_body_util::{BodyExt as _, Full};
use hyper::body::Bytes;
use hyper::http::{HeaderName, HeaderValue, Method, Request, Uri};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use thiserror::Error;

use crate::edge::request::{CustomOrigin, EdgeRequest};
use crate::edge::response::EdgeResponse;
use crate::http::body::EdgeBody;
use crate::http::headers::Headers;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("cannot figure out what origin to forward request to")]
    MissingOrigin,

    #[error("invalid outbound request: {0}")]
    BadRequest(String),

    #[error("origin request failed: {0}")]
    Transport(#[from] hyper_util::client::legacy::Error),

    #[error("failed to read origin response body: {0}")]
    Body(String),

    #[error("unsupported content encoding '{0}'")]
    UnsupportedEncoding(String),

    #[error("failed to decode '{encoding}' response body: {message}")]
    Decode { encoding: String, message: String },
}

/// HTTP(S) client for the real outbound fetch.
pub struct OriginClient {
    client: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
}

impl Default for OriginClient {
    fn default() -> Self {
        Self::new()
    }
}

impl OriginClient {
    pub fn new() -> Self {
        let connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_http1()
            .build();

        Self {
            client: Client::builder(TokioExecutor::new()).build(connector),
        }
    }

    /// Forward a request bound to an origin and rebuild the response.
    pub async fn fetch(&self, request: &EdgeRequest) -> Result<EdgeResponse, FetchError> {
        let origin = request.origin.as_ref().ok_or(FetchError::MissingOrigin)?;

        let url = construct_request_url(request, origin);
        let uri: Uri = url
            .parse()
            .map_err(|e| FetchError::BadRequest(format!("'{url}': {e}")))?;
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|e| FetchError::BadRequest(e.to_string()))?;

        let headers = construct_outbound_headers(request, origin);

        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(header_map) = builder.headers_mut() {
            for (name, value) in &headers {
                let name = HeaderName::from_bytes(name.as_bytes())
                    .map_err(|e| FetchError::BadRequest(e.to_string()))?;
                let value = HeaderValue::from_str(value)
                    .map_err(|e| FetchError::BadRequest(e.to_string()))?;
                header_map.insert(name, value);
            }
        }

        let body = match &request.body {
            Some(body) => Full::new(Bytes::copy_from_slice(body.as_bytes())),
            None => Full::default(),
        };
        let outbound = builder
            .body(body)
            .map_err(|e| FetchError::BadRequest(e.to_string()))?;

        let response = self.client.request(outbound).await?;

        let status = response.status();
        let mut headers = Headers::new();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                headers.append(name.as_str(), value);
            }
        }

        let encoding = headers.get("content-encoding").unwrap_or("").to_string();

        let raw_body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| FetchError::Body(e.to_string()))?
            .to_bytes();

        let decoded = decode_body(raw_body.to_vec(), &encoding)?;

        // The body is decoded here and re-encoded by the response writer,
        // so these headers no longer describe it.
        headers.remove("content-encoding");
        headers.remove("transfer-encoding");
        headers.remove("content-length");

        Ok(EdgeResponse {
            status: status.as_u16(),
            status_description: status.canonical_reason().unwrap_or("").to_string(),
            headers,
            body: EdgeBody::from_bytes(decoded),
        })
    }
}

/// Outbound URL: origin protocol/domain/port/path-prefix + request path
/// and querystring.
pub(crate) fn construct_request_url(request: &EdgeRequest, origin: &CustomOrigin) -> String {
    let mut url = format!(
        "{}://{}:{}{}{}",
        origin.protocol, origin.domain_name, origin.port, origin.path, request.uri
    );
    if !request.querystring.is_empty() {
        url.push('?');
        url.push_str(&request.querystring);
    }
    url
}

/// Flat outbound headers: request headers merged with the origin's custom
/// headers (custom wins), `Host` forced to the origin's domain, compressed
/// encodings advertised.
pub(crate) fn construct_outbound_headers(
    request: &EdgeRequest,
    origin: &CustomOrigin,
) -> std::collections::HashMap<String, String> {
    let mut merged = request.headers.merge(&origin.custom_headers);
    merged.set("host", &origin.domain_name);
    merged.set("accept-encoding", "gzip, deflate, br");
    merged.to_flat_map()
}

fn decode_body(bytes: Vec<u8>, encoding: &str) -> Result<Vec<u8>, FetchError> {
    let decode_err = |message: String| FetchError::Decode {
        encoding: encoding.to_string(),
        message,
    };

    match encoding.to_ascii_lowercase().as_str() {
        "" | "identity" => Ok(bytes),
        "gzip" | "x-gzip" => {
            let mut decoded = Vec::new();
            flate2::read::GzDecoder::new(bytes.as_slice())
                .read_to_end(&mut decoded)
                .map_err(|e| decode_err(e.to_string()))?;
            Ok(decoded)
        }
        "deflate" => {
            let mut decoded = Vec::new();
            flate2::read::DeflateDecoder::new(bytes.as_slice())
                .read_to_end(&mut decoded)
                .map_err(|e| decode_err(e.to_string()))?;
            Ok(decoded)
        }
        "br" => {
            let mut decoded = Vec::new();
            brotli::Decompressor::new(bytes.as_slice(), 4096)
                .read_to_end(&mut decoded)
                .map_err(|e| decode_err(e.to_string()))?;
            Ok(decoded)
        }
        other => Err(FetchError::UnsupportedEncoding(other.to_string())),
    }
}
