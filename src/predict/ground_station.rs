use serde::Deserialize;
use utoipa::ToSchema;

use crate::predict::error::PredictError;

pub const EARTH_ROTATION_RAD_S: f64 = 7.292_115e-5;
pub const WGS84_A_KM: f64 = 6378.137;
const WGS84_E2: f64 = 0.00669437999014;

/// Observer position. Configured either with explicit coordinates or with a
/// Maidenhead grid locator, which resolves to the centre of the square.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, ToSchema)]
pub struct GroundStation {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    #[serde(default)]
    pub altitude_m: f64,
}

impl GroundStation {
    pub fn new(latitude_deg: f64, longitude_deg: f64, altitude_m: f64) -> Self {
        Self {
            latitude_deg,
            longitude_deg,
            altitude_m,
        }
    }

    pub fn from_maidenhead(locator: &str, altitude_m: f64) -> Result<Self, PredictError> {
        let (lat, lon) = maidenhead_to_latlon(locator)?;
        Ok(Self::new(lat, lon, altitude_m))
    }

    pub fn maidenhead(&self, chars: usize) -> String {
        latlon_to_maidenhead(self.latitude_deg, self.longitude_deg, chars)
    }

    pub fn lat_rad(&self) -> f64 {
        self.latitude_deg.to_radians()
    }

    pub fn lon_rad(&self) -> f64 {
        self.longitude_deg.to_radians()
    }

    pub fn position_ecef_km(&self) -> [f64; 3] {
        let lat = self.lat_rad();
        let lon = self.lon_rad();
        let sin_lat = lat.sin();
        let cos_lat = lat.cos();
        let n = WGS84_A_KM / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
        let alt_km = self.altitude_m / 1000.0;
        [
            (n + alt_km) * cos_lat * lon.cos(),
            (n + alt_km) * cos_lat * lon.sin(),
            (n * (1.0 - WGS84_E2) + alt_km) * sin_lat,
        ]
    }

    pub fn velocity_ecef_km_s(&self) -> [f64; 3] {
        let pos = self.position_ecef_km();
        [
            -EARTH_ROTATION_RAD_S * pos[1],
            EARTH_ROTATION_RAD_S * pos[0],
            0.0,
        ]
    }
}

/// Encode to a locator of `chars` characters (rounded up to an even count).
/// Pairs alternate letters and digits: field, square, subsquare, extended square.
pub fn latlon_to_maidenhead(lat: f64, lon: f64, chars: usize) -> String {
    let lon = lon.clamp(-180.0, 179.999_999);
    let lat = lat.clamp(-90.0, 89.999_999);

    let mut out = String::with_capacity(chars.max(2));
    let field_lon = ((lon + 180.0) / 20.0).floor();
    let field_lat = ((lat + 90.0) / 10.0).floor();
    out.push((b'A' + field_lon as u8) as char);
    out.push((b'A' + field_lat as u8) as char);

    // Remainders are scaled so each pair sees units of its own cell.
    let mut rem_lon = (lon + 180.0 - field_lon * 20.0) / 2.0;
    let mut rem_lat = lat + 90.0 - field_lat * 10.0;
    let mut pair = 1;
    while 2 * pair < chars {
        pair += 1;
        let x = rem_lon.floor();
        let y = rem_lat.floor();
        if pair % 2 == 1 {
            out.push((b'A' + x as u8) as char);
            out.push((b'A' + y as u8) as char);
            rem_lon = 10.0 * (rem_lon - x);
            rem_lat = 10.0 * (rem_lat - y);
        } else {
            out.push((b'0' + x as u8) as char);
            out.push((b'0' + y as u8) as char);
            rem_lon = 24.0 * (rem_lon - x);
            rem_lat = 24.0 * (rem_lat - y);
        }
    }
    out
}

/// Decode a locator to the latitude and longitude of its centre.
pub fn maidenhead_to_latlon(locator: &str) -> Result<(f64, f64), PredictError> {
    let invalid = || PredictError::InvalidLocator(locator.to_string());
    let chars: Vec<char> = locator.trim().to_ascii_uppercase().chars().collect();
    if chars.is_empty() || chars.len() % 2 != 0 {
        return Err(invalid());
    }

    let mut lat = -90.0;
    let mut lon = -180.0;
    let mut lat_step = 10.0 * 24.0;
    for (i, pair) in chars.chunks(2).enumerate() {
        let (x, y, divisor, limit) = if i % 2 == 1 {
            let x = pair[0].to_digit(10).ok_or_else(invalid)?;
            let y = pair[1].to_digit(10).ok_or_else(invalid)?;
            (x, y, 10.0, 10)
        } else {
            let x = letter_index(pair[0]).ok_or_else(invalid)?;
            let y = letter_index(pair[1]).ok_or_else(invalid)?;
            let limit = if i == 0 { 18 } else { 24 };
            (x, y, 24.0, limit)
        };
        if x >= limit || y >= limit {
            return Err(invalid());
        }
        lat_step /= divisor;
        lon += x as f64 * lat_step * 2.0;
        lat += y as f64 * lat_step;
    }

    Ok((lat + lat_step / 2.0, lon + lat_step))
}

fn letter_index(c: char) -> Option<u32> {
    c.is_ascii_uppercase().then(|| c as u32 - 'A' as u32)
}
