use chrono::{DateTime, Duration, Utc};
use sgp4::{Constants, Elements};

use crate::predict::error::PredictError;
use crate::predict::ground_station::GroundStation;
use crate::predict::propagation::observe_at;
use crate::predict::tle_loader::TleEntry;
use crate::predict::types::Pass;
use crate::tracker::{PassTrack, TrackPoint};

const COARSE_STEP_SECONDS: i64 = 60;
const FINE_STEP_SECONDS: i64 = 1;
const HORIZON_ELEVATION: f64 = 0.0;
const LOOKBACK_MINUTES: i64 = 30;
const LOOKAHEAD_HOURS: i64 = 48;

/// Find all passes for a satellite within a time range
pub fn predict_passes(
    station: &GroundStation,
    entry: &TleEntry,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    min_elevation: f64,
) -> Result<Vec<Pass>, PredictError> {
    let elements = &entry.elements;
    let constants = &entry.constants;
    let mut passes = Vec::new();
    let mut cursor = start;
    let coarse_step = Duration::seconds(COARSE_STEP_SECONDS);

    let mut prev_visible = false;
    let mut pass_start: Option<(DateTime<Utc>, f64)> = None;
    let mut max_el = 0.0;
    let mut max_el_time = cursor;

    while cursor <= end {
        let sample = observe_at(station, elements, constants, cursor)?;
        let visible = sample.elevation_deg >= HORIZON_ELEVATION;

        if visible && !prev_visible {
            let aos = if cursor == start {
                (cursor, sample.azimuth_deg)
            } else {
                refine_crossing(station, elements, constants, cursor - coarse_step, cursor, true)?
            };
            pass_start = Some(aos);
            max_el = sample.elevation_deg;
            max_el_time = cursor;
        } else if visible {
            if sample.elevation_deg > max_el {
                max_el = sample.elevation_deg;
                max_el_time = cursor;
            }
        } else if prev_visible {
            if let Some((aos, aos_az)) = pass_start.take() {
                let (los, los_az) =
                    refine_crossing(station, elements, constants, cursor - coarse_step, cursor, false)?;
                if max_el >= min_elevation {
                    passes.push(make_pass(entry, aos, aos_az, los, los_az, max_el_time, max_el));
                }
            }
            max_el = 0.0;
        }

        prev_visible = visible;
        cursor += coarse_step;
    }

    // Pass still in progress at the end of the window
    if let Some((aos, aos_az)) = pass_start {
        let sample = observe_at(station, elements, constants, end)?;
        if max_el >= min_elevation {
            passes.push(make_pass(entry, aos, aos_az, end, sample.azimuth_deg, max_el_time, max_el));
        }
    }

    Ok(passes)
}

/// The pass in progress at `now`, or failing that the next one to start.
pub fn next_pass(
    station: &GroundStation,
    entry: &TleEntry,
    now: DateTime<Utc>,
) -> Result<Option<Pass>, PredictError> {
    let passes = predict_passes(
        station,
        entry,
        now - Duration::minutes(LOOKBACK_MINUTES),
        now + Duration::hours(LOOKAHEAD_HOURS),
        HORIZON_ELEVATION,
    )?;
    Ok(passes.into_iter().find(|p| p.los > now))
}

/// Sample the pass every `step` from AOS to LOS, both ends included.
pub fn build_pass_track(
    station: &GroundStation,
    entry: &TleEntry,
    pass: &Pass,
    step: Duration,
) -> Result<PassTrack, PredictError> {
    let mut points = Vec::new();
    let mut cursor = pass.aos;

    loop {
        let at = cursor.min(pass.los);
        let obs = observe_at(station, &entry.elements, &entry.constants, at)?;
        points.push(TrackPoint {
            time: at,
            azimuth_deg: obs.azimuth_deg,
            elevation_deg: obs.elevation_deg,
        });
        if at >= pass.los || step <= Duration::zero() {
            break;
        }
        cursor += step;
    }

    Ok(PassTrack::new(points))
}

fn make_pass(
    entry: &TleEntry,
    aos: DateTime<Utc>,
    aos_az: f64,
    los: DateTime<Utc>,
    los_az: f64,
    tca: DateTime<Utc>,
    max_el: f64,
) -> Pass {
    Pass {
        satellite: entry.info.name.clone(),
        norad_id: entry.info.norad_id,
        aos,
        los,
        tca,
        max_elevation_deg: round2(max_el),
        aos_azimuth_deg: round2(aos_az),
        los_azimuth_deg: round2(los_az),
        duration_seconds: (los - aos).num_seconds(),
    }
}

/// Binary search to find exact horizon crossing time
fn refine_crossing(
    station: &GroundStation,
    elements: &Elements,
    constants: &Constants,
    before: DateTime<Utc>,
    after: DateTime<Utc>,
    rising: bool,
) -> Result<(DateTime<Utc>, f64), PredictError> {
    let mut low = before;
    let mut high = after;

    while (high - low).num_seconds() > FINE_STEP_SECONDS {
        let mid = low + (high - low) / 2;
        let above = observe_at(station, elements, constants, mid)?.elevation_deg >= HORIZON_ELEVATION;
        if above == rising {
            high = mid;
        } else {
            low = mid;
        }
    }

    let final_sample = observe_at(station, elements, constants, high)?;
    Ok((high, final_sample.azimuth_deg))
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
