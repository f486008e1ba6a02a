use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::predict::error::PredictError;
use crate::predict::ground_station::GroundStation;
use crate::predict::propagation::observe_at;
use crate::predict::tle_loader::TleLoader;
use crate::predict::types::Observation;
use crate::tracker::SatelliteRef;

/// Anything that can tell where a satellite is and how fast it is moving
/// relative to the station.
pub trait DopplerSource {
    fn observe(&self, satellite: &SatelliteRef, at: DateTime<Utc>) -> Result<Observation, PredictError>;
}

pub struct Sgp4Source {
    tles: Arc<TleLoader>,
    station: GroundStation,
}

impl Sgp4Source {
    pub fn new(tles: Arc<TleLoader>, station: GroundStation) -> Self {
        Self { tles, station }
    }
}

impl DopplerSource for Sgp4Source {
    fn observe(&self, satellite: &SatelliteRef, at: DateTime<Utc>) -> Result<Observation, PredictError> {
        let entry = self
            .tles
            .get(satellite.norad_id)
            .ok_or(PredictError::UnknownSatellite(satellite.norad_id))?;
        observe_at(&self.station, &entry.elements, &entry.constants, at)
    }
}
