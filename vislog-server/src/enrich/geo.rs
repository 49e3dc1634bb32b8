//! Geolocation lookup
//!
//! Speaks the ip-api.com JSON protocol: `GET {base}/json/{ip}` answering
//! `{"status":"success","city":..,"regionName":..,"country":..}` or
//! `{"status":"fail","message":..}`.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use vislog_common::models::{GeoLocation, UNKNOWN};

const USER_AGENT: &str = concat!("vislog/", env!("CARGO_PKG_VERSION"));

/// Geolocation lookup errors
#[derive(Debug, Error)]
pub enum GeoError {
    /// Transport failure (connect, DNS, reset, ...)
    #[error("Network error: {0}")]
    Network(String),

    /// Service answered with a non-success HTTP status
    #[error("API error: HTTP {0}")]
    Api(u16),

    /// Service answered but reported the lookup as failed
    #[error("Lookup failed: {0}")]
    Lookup(String),

    /// Response body was not the expected JSON
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Address → location seam
#[async_trait]
pub trait GeoLookup: Send + Sync {
    async fn lookup(&self, ip: &str) -> Result<GeoLocation, GeoError>;
}

/// ip-api.com response body
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpApiResponse {
    pub status: String,
    pub message: Option<String>,
    pub city: Option<String>,
    pub region_name: Option<String>,
    pub country: Option<String>,
}

impl IpApiResponse {
    /// Convert into a location, or the service's failure reason
    pub fn into_location(self) -> Result<GeoLocation, GeoError> {
        if self.status != "success" {
            return Err(GeoError::Lookup(
                self.message.unwrap_or_else(|| format!("status {:?}", self.status)),
            ));
        }

        let field = |v: Option<String>| {
            v.filter(|s| !s.is_empty())
                .unwrap_or_else(|| UNKNOWN.to_string())
        };
        Ok(GeoLocation {
            city: field(self.city),
            region: field(self.region_name),
            country: field(self.country),
        })
    }
}

/// HTTP client for an ip-api.com compatible service
///
/// One request per lookup: no retry, no timeout beyond reqwest's default.
pub struct IpApiClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl IpApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, GeoError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| GeoError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl GeoLookup for IpApiClient {
    async fn lookup(&self, ip: &str) -> Result<GeoLocation, GeoError> {
        let url = format!("{}/json/{}", self.base_url, ip);
        tracing::debug!(%ip, "Querying geolocation service");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| GeoError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeoError::Api(status.as_u16()));
        }

        let body: IpApiResponse = response
            .json()
            .await
            .map_err(|e| GeoError::Parse(e.to_string()))?;

        body.into_location()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_response() {
        let body: IpApiResponse = serde_json::from_str(
            r#"{"status":"success","country":"France","countryCode":"FR","region":"IDF",
                "regionName":"Ile-de-France","city":"Paris","query":"203.0.113.5"}"#,
        )
        .unwrap();

        assert_eq!(
            body.into_location().unwrap(),
            GeoLocation::new("Paris", "Ile-de-France", "France")
        );
    }

    #[test]
    fn test_fail_response_carries_message() {
        let body: IpApiResponse = serde_json::from_str(
            r#"{"status":"fail","message":"private range","query":"10.0.0.1"}"#,
        )
        .unwrap();

        match body.into_location() {
            Err(GeoError::Lookup(msg)) => assert_eq!(msg, "private range"),
            other => panic!("expected lookup failure, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_fields_become_unknown() {
        let body: IpApiResponse =
            serde_json::from_str(r#"{"status":"success","country":"Iceland","city":""}"#).unwrap();

        assert_eq!(
            body.into_location().unwrap(),
            GeoLocation::new("Unknown", "Unknown", "Iceland")
        );
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = IpApiClient::new("http://ip-api.com/").unwrap();
        assert_eq!(client.base_url(), "http://ip-api.com");
    }
}
