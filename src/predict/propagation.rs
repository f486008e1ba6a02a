use chrono::{DateTime, Utc};
use sgp4::{Constants, Elements};

use crate::predict::error::PredictError;
use crate::predict::ground_station::{GroundStation, EARTH_ROTATION_RAD_S, WGS84_A_KM};
use crate::predict::types::Observation;
use crate::tracker::DOPPLER_REFERENCE_HZ;

pub const SPEED_OF_LIGHT_KM_S: f64 = 299_792.458;

/// Propagate the elements to `timestamp` and look at the result from `station`.
pub fn observe_at(
    station: &GroundStation,
    elements: &Elements,
    constants: &Constants,
    timestamp: DateTime<Utc>,
) -> Result<Observation, PredictError> {
    let minutes = elements
        .datetime_to_minutes_since_epoch(&timestamp.naive_utc())
        .map_err(|e| PredictError::Propagation(e.to_string()))?;

    let prediction = constants
        .propagate(minutes)
        .map_err(|e| PredictError::Propagation(e.to_string()))?;

    let sidereal =
        sgp4::iau_epoch_to_sidereal_time(sgp4::julian_years_since_j2000(&timestamp.naive_utc()));

    let sat_ecef = teme_to_ecef_position(prediction.position, sidereal);
    let sat_vel_ecef = teme_to_ecef_velocity(prediction.position, prediction.velocity, sidereal);

    let sta_ecef = station.position_ecef_km();
    let sta_vel = station.velocity_ecef_km_s();

    let dr = sub(sat_ecef, sta_ecef);
    let range_km = norm(dr);

    let enu = ecef_to_enu(dr, station.lat_rad(), station.lon_rad());
    let azimuth = enu.0.atan2(enu.1).to_degrees().rem_euclid(360.0);
    let elevation = if range_km > 0.0 {
        (enu.2 / range_km).asin().to_degrees()
    } else {
        0.0
    };

    let range_rate_km_s = if range_km > 0.0 {
        dot(sub(sat_vel_ecef, sta_vel), dr) / range_km
    } else {
        0.0
    };

    let (latitude_deg, longitude_deg) = sub_point(sat_ecef);

    Ok(Observation {
        azimuth_deg: azimuth,
        elevation_deg: elevation,
        range_km,
        range_rate_km_s,
        latitude_deg,
        longitude_deg,
        footprint_radius_km: footprint_radius_km(norm(sat_ecef)),
        doppler_100mhz_hz: -DOPPLER_REFERENCE_HZ * range_rate_km_s / SPEED_OF_LIGHT_KM_S,
    })
}

/// Geocentric latitude and longitude under the satellite.
fn sub_point(sat_ecef: [f64; 3]) -> (f64, f64) {
    let [x, y, z] = sat_ecef;
    let lat = z.atan2((x * x + y * y).sqrt()).to_degrees();
    let lon = y.atan2(x).to_degrees();
    (lat, lon)
}

/// Ground radius of the area from which the satellite is above the horizon.
fn footprint_radius_km(orbit_radius_km: f64) -> f64 {
    if orbit_radius_km <= WGS84_A_KM {
        return 0.0;
    }
    WGS84_A_KM * (WGS84_A_KM / orbit_radius_km).acos()
}

pub fn teme_to_ecef_position(pos_teme: [f64; 3], gmst: f64) -> [f64; 3] {
    let cos_gmst = gmst.cos();
    let sin_gmst = gmst.sin();
    [
        pos_teme[0] * cos_gmst + pos_teme[1] * sin_gmst,
        -pos_teme[0] * sin_gmst + pos_teme[1] * cos_gmst,
        pos_teme[2],
    ]
}

pub fn teme_to_ecef_velocity(pos_teme: [f64; 3], vel_teme: [f64; 3], gmst: f64) -> [f64; 3] {
    let pos = teme_to_ecef_position(pos_teme, gmst);
    let rotated = teme_to_ecef_position(vel_teme, gmst);
    let rotation = [
        -EARTH_ROTATION_RAD_S * pos[1],
        EARTH_ROTATION_RAD_S * pos[0],
        0.0,
    ];
    sub(rotated, rotation)
}

pub fn ecef_to_enu(dr: [f64; 3], lat_rad: f64, lon_rad: f64) -> (f64, f64, f64) {
    let sin_lat = lat_rad.sin();
    let cos_lat = lat_rad.cos();
    let sin_lon = lon_rad.sin();
    let cos_lon = lon_rad.cos();

    let east = -sin_lon * dr[0] + cos_lon * dr[1];
    let north = -sin_lat * cos_lon * dr[0] - sin_lat * sin_lon * dr[1] + cos_lat * dr[2];
    let up = cos_lat * cos_lon * dr[0] + cos_lat * sin_lon * dr[1] + sin_lat * dr[2];
    (east, north, up)
}

fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn norm(a: [f64; 3]) -> f64 {
    dot(a, a).sqrt()
}
