use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use super::catalog::TransponderCatalog;
use super::controller::Selection;
use super::error::TrackerError;
use super::types::SatelliteRef;
use crate::predict::{build_pass_track, next_pass, GroundStation, TleLoader};

pub const TRACK_STEP_SECONDS: i64 = 10;

/// Turns an operator's satellite query into a ready-to-track [`Selection`].
pub struct Selector {
    tles: Arc<TleLoader>,
    catalog: TransponderCatalog,
    station: GroundStation,
    track_step: Duration,
}

impl Selector {
    pub fn new(
        tles: Arc<TleLoader>,
        catalog: TransponderCatalog,
        station: GroundStation,
        track_step: Duration,
    ) -> Self {
        Self {
            tles,
            catalog,
            station,
            track_step,
        }
    }

    pub fn tles(&self) -> &TleLoader {
        &self.tles
    }

    pub fn catalog(&self) -> &TransponderCatalog {
        &self.catalog
    }

    /// Look the satellite up by NORAD id or name, load its transponders and
    /// build the track of its current or next pass.
    pub fn resolve(&self, query: &str, now: DateTime<Utc>) -> Result<Selection, TrackerError> {
        let entry = self
            .tles
            .find(query)
            .ok_or_else(|| TrackerError::UnknownSatellite(query.to_string()))?;
        let satellite = SatelliteRef::new(entry.info.name.clone(), entry.info.norad_id);

        let transponders = self.catalog.load(satellite.norad_id).map_err(|e| {
            log::warn!("Cannot select {}: {}", satellite.name, e);
            e
        })?;

        let pass = next_pass(&self.station, entry, now)?
            .ok_or_else(|| TrackerError::NoPass(satellite.name.clone()))?;
        let track = build_pass_track(&self.station, entry, &pass, self.track_step)?;

        Ok(Selection {
            satellite,
            transponders,
            pass,
            track,
        })
    }
}
