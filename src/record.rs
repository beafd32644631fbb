//! Lookup result type.

use serde::Serialize;
use std::fmt;
use std::net::IpAddr;

/// Geolocation attributes for one queried address
///
/// Built fresh for every query. Display strings have already been through
/// the territory overrides and translation tables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoRecord {
    /// The address that was queried
    pub ip: IpAddr,
    /// Two-letter country code
    pub country_code: String,
    /// Country display name
    pub country: String,
    /// Region display name
    pub region: String,
    /// City display name
    pub city: String,
    /// Latitude rounded to 6 fractional digits (schema 5 and up)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    /// Longitude rounded to 6 fractional digits (schema 5 and up)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl GeoRecord {
    /// `(latitude, longitude)` when both are present
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}

impl fmt::Display for GeoRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.ip, self.country_code, self.country, self.region, self.city
        )?;
        if let Some((lat, lon)) = self.coordinates() {
            write!(f, " {:.6},{:.6}", lat, lon)?;
        }
        Ok(())
    }
}
