//! Visitor enrichment
//!
//! Turns a raw address + user-agent into a [`NewVisitorRecord`]. Always
//! completes: geolocation failures are logged and replaced with the
//! `Unknown` sentinel, loopback addresses never reach the lookup service.

pub mod geo;
pub mod user_agent;

pub use geo::{GeoError, GeoLookup, IpApiClient};

use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, warn};
use vislog_common::models::{GeoLocation, NewVisitorRecord};

/// Loopback in any of its textual forms: `127.0.0.0/8`, `::1`, `::ffff:127.x.x.x`
pub fn is_local_address(ip: &str) -> bool {
    let ip = ip.trim();
    if ip.starts_with("::ffff:127.") {
        return true;
    }

    match ip.parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => v4.is_loopback(),
        Ok(IpAddr::V6(v6)) => {
            v6.is_loopback() || v6.to_ipv4_mapped().map_or(false, |v4| v4.is_loopback())
        }
        Err(_) => false,
    }
}

/// Enrichment service
#[derive(Clone)]
pub struct Enricher {
    geo: Arc<dyn GeoLookup>,
}

impl Enricher {
    pub fn new(geo: Arc<dyn GeoLookup>) -> Self {
        Self { geo }
    }

    /// Best-effort location for an address
    pub async fn locate(&self, ip: &str) -> GeoLocation {
        if is_local_address(ip) {
            debug!(%ip, "Loopback address, skipping geolocation");
            return GeoLocation::localhost();
        }

        // Dual-stack listeners report IPv4 peers as ::ffff:a.b.c.d
        let query = match ip.trim().parse::<IpAddr>() {
            Ok(IpAddr::V6(v6)) => match v6.to_ipv4_mapped() {
                Some(v4) => v4.to_string(),
                None => v6.to_string(),
            },
            Ok(IpAddr::V4(v4)) => v4.to_string(),
            Err(_) => {
                warn!(%ip, "Not an IP address, skipping geolocation");
                return GeoLocation::unknown();
            }
        };

        match self.geo.lookup(&query).await {
            Ok(location) => location,
            Err(e) => {
                warn!(%ip, "Geo lookup error: {}", e);
                GeoLocation::unknown()
            }
        }
    }

    /// Derive the full record for a hit
    pub async fn enrich(&self, ip: &str, user_agent: Option<&str>) -> NewVisitorRecord {
        let device = user_agent::parse(user_agent.unwrap_or_default());
        let location = self.locate(ip).await;
        NewVisitorRecord::from_parts(ip, device, location)
    }
}
