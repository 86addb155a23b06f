//! Viewer synthesis.
//!
//! # Responsibilities
//! - Derive the connecting client's identity from the socket address and
//!   forwarding headers
//! - Attach simulated geo metadata (fixed constants; this emulator does
//!   no geo-IP resolution)
//!
//! # Design Decisions
//! - Pure function of the inbound connection and headers; no I/O and no
//!   failure modes

use std::net::SocketAddr;

use crate::http::headers::Headers;

/// Synthesized identity and geo metadata of the connecting client.
#[derive(Debug, Clone)]
pub struct Viewer {
    pub ip: String,
    pub forwarded_ips: Vec<String>,
    pub asn: u32,
    pub country: String,
    pub city: String,
    pub country_name: String,
    pub country_region: String,
    pub country_region_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub postal_code: String,
    pub time_zone: String,
    pub http_version: String,
    pub http_host: String,
    pub http_protocol: String,
}

/// Build a Viewer from the inbound connection.
///
/// Client IP precedence: first entry of the forwarded chain, then
/// `x-real-ip`, then `true-client-ip`, then the raw socket address.
/// Host and protocol prefer the `x-forwarded-*` headers over the
/// connection's own.
pub fn construct_viewer(
    remote_addr: SocketAddr,
    secure: bool,
    http_version: &str,
    headers: &Headers,
) -> Viewer {
    let socket_ip = remote_addr.ip().to_string();

    let forwarded_ips: Vec<String> = headers
        .get("x-forwarded-for")
        .unwrap_or("")
        .split(',')
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
        .collect();

    let ip = forwarded_ips
        .first()
        .map(String::as_str)
        .or_else(|| headers.get("x-real-ip"))
        .or_else(|| headers.get("true-client-ip"))
        .unwrap_or(&socket_ip)
        .to_string();

    let http_host = headers
        .get("x-forwarded-host")
        .or_else(|| headers.get("host"))
        .unwrap_or("127.0.0.1")
        .to_string();

    let http_protocol = headers
        .get("x-forwarded-proto")
        .unwrap_or(if secure { "https" } else { "http" })
        .to_string();

    Viewer {
        ip,
        forwarded_ips,
        asn: 8708,
        country: "RO".to_string(),
        city: "Cluj-Napoca".to_string(),
        country_name: "Romania".to_string(),
        country_region: "CJ".to_string(),
        country_region_name: "Cluj".to_string(),
        latitude: 46.783_481_8,
        longitude: 23.546_473_2,
        postal_code: "4000".to_string(),
        time_zone: "Europe/Bucharest".to_string(),
        http_version: http_version.to_string(),
        http_host,
        http_protocol,
    }
}
