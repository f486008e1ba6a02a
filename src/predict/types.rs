use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// Information about a single satellite from TLE
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SatelliteInfo {
    pub name: String,
    pub norad_id: u32,
    pub tle_source: String,
}

/// A predicted satellite pass
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Pass {
    pub satellite: String,
    pub norad_id: u32,
    pub aos: DateTime<Utc>,
    pub los: DateTime<Utc>,
    pub tca: DateTime<Utc>,
    pub max_elevation_deg: f64,
    pub aos_azimuth_deg: f64,
    pub los_azimuth_deg: f64,
    pub duration_seconds: i64,
}

/// Where the satellite is, seen from the station, at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct Observation {
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
    pub range_km: f64,
    pub range_rate_km_s: f64,
    /// Sub-satellite point.
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub footprint_radius_km: f64,
    /// Doppler shift a 100 MHz downlink would see, in Hz.
    pub doppler_100mhz_hz: f64,
}
