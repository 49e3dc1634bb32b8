//! Visitor record models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel for a failed or skipped geolocation field
pub const UNKNOWN: &str = "Unknown";

/// Device label used when the user-agent carries no device signal
pub const DEFAULT_DEVICE: &str = "Desktop";

/// A stored visitor log entry
///
/// `id` and `timestamp` are assigned by the store; nothing else changes
/// after insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitorRecord {
    pub id: i64,
    pub ip: String,
    pub device: String,
    pub os: String,
    pub browser: String,
    pub city: String,
    pub region: String,
    pub country: String,
    pub timestamp: DateTime<Utc>,
}

/// A visitor record before the store assigns id and timestamp
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewVisitorRecord {
    pub ip: String,
    pub device: String,
    pub os: String,
    pub browser: String,
    pub city: String,
    pub region: String,
    pub country: String,
}

impl NewVisitorRecord {
    /// Merge parsed user-agent fields and a geolocation result
    pub fn from_parts(ip: impl Into<String>, device: DeviceInfo, geo: GeoLocation) -> Self {
        Self {
            ip: ip.into(),
            device: device.device,
            os: device.os,
            browser: device.browser,
            city: geo.city,
            region: geo.region,
            country: geo.country,
        }
    }

    /// Attach store-assigned fields
    pub fn into_stored(self, id: i64, timestamp: DateTime<Utc>) -> VisitorRecord {
        VisitorRecord {
            id,
            ip: self.ip,
            device: self.device,
            os: self.os,
            browser: self.browser,
            city: self.city,
            region: self.region,
            country: self.country,
            timestamp,
        }
    }
}

/// Device, OS and browser descriptors parsed from a user-agent string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub device: String,
    pub os: String,
    pub browser: String,
}

impl Default for DeviceInfo {
    fn default() -> Self {
        Self {
            device: DEFAULT_DEVICE.to_string(),
            os: String::new(),
            browser: String::new(),
        }
    }
}

/// City / region / country triple
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub city: String,
    pub region: String,
    pub country: String,
}

impl GeoLocation {
    pub fn new(
        city: impl Into<String>,
        region: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        Self {
            city: city.into(),
            region: region.into(),
            country: country.into(),
        }
    }

    /// Loopback bypass sentinel (no lookup performed)
    pub fn localhost() -> Self {
        Self::new("Localhost", "Local", "Local")
    }

    /// Lookup failure sentinel
    pub fn unknown() -> Self {
        Self::new(UNKNOWN, UNKNOWN, UNKNOWN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_record_json_shape() {
        let record = NewVisitorRecord::from_parts(
            "203.0.113.5",
            DeviceInfo {
                device: "Desktop".to_string(),
                os: "Windows 10".to_string(),
                browser: "Chrome 120.0.0.0".to_string(),
            },
            GeoLocation::new("Paris", "Ile-de-France", "France"),
        )
        .into_stored(7, Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap());

        let json = serde_json::to_value(&record).unwrap();
        let mut keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(
            keys,
            vec!["browser", "city", "country", "device", "id", "ip", "os", "region", "timestamp"]
        );
        assert_eq!(json["id"], 7);
        assert_eq!(json["city"], "Paris");
        assert!(json["timestamp"].as_str().unwrap().starts_with("2026-10-19T12:00:00"));
    }

    #[test]
    fn test_sentinels() {
        assert_eq!(GeoLocation::localhost(), GeoLocation::new("Localhost", "Local", "Local"));
        assert_eq!(GeoLocation::unknown(), GeoLocation::new("Unknown", "Unknown", "Unknown"));
    }

    #[test]
    fn test_default_device_info() {
        let info = DeviceInfo::default();
        assert_eq!(info.device, "Desktop");
        assert!(info.os.is_empty());
        assert!(info.browser.is_empty());
    }
}
