use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct TrackPoint {
    pub time: DateTime<Utc>,
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
}

/// Where "now" sits relative to the selected pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EventPhase {
    Upcoming,
    InProgress,
    Elapsed,
}

/// Sky track of one pass from AOS to LOS, sorted by time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct PassTrack {
    pub points: Vec<TrackPoint>,
}

impl PassTrack {
    pub fn new(mut points: Vec<TrackPoint>) -> Self {
        points.sort_by_key(|p| p.time);
        Self { points }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&TrackPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&TrackPoint> {
        self.points.last()
    }

    pub fn phase(&self, now: DateTime<Utc>) -> EventPhase {
        match (self.first(), self.last()) {
            (Some(first), _) if now < first.time => EventPhase::Upcoming,
            (_, Some(last)) if now > last.time => EventPhase::Elapsed,
            (Some(_), Some(_)) => EventPhase::InProgress,
            _ => EventPhase::Elapsed,
        }
    }

    /// Samples still ahead of `now`. The elapsed prefix is dropped and, when
    /// `now` falls between two samples, a sample interpolated to `now` leads
    /// the result.
    pub fn remaining(&self, now: DateTime<Utc>) -> Vec<TrackPoint> {
        let idx = self.points.partition_point(|p| p.time < now);
        if idx == self.points.len() {
            return Vec::new();
        }

        let mut out = Vec::with_capacity(self.points.len() - idx + 1);
        if idx > 0 && self.points[idx].time > now {
            out.push(interpolate(&self.points[idx - 1], &self.points[idx], now));
        }
        out.extend_from_slice(&self.points[idx..]);
        out
    }
}

fn interpolate(a: &TrackPoint, b: &TrackPoint, at: DateTime<Utc>) -> TrackPoint {
    let span = (b.time - a.time).num_milliseconds() as f64;
    let frac = if span > 0.0 {
        (at - a.time).num_milliseconds() as f64 / span
    } else {
        0.0
    };

    // Shorter arc, so 359 -> 1 passes through 0 rather than 180.
    let mut daz = b.azimuth_deg - a.azimuth_deg;
    if daz > 180.0 {
        daz -= 360.0;
    } else if daz < -180.0 {
        daz += 360.0;
    }

    TrackPoint {
        time: at,
        azimuth_deg: (a.azimuth_deg + frac * daz).rem_euclid(360.0),
        elevation_deg: a.elevation_deg + frac * (b.elevation_deg - a.elevation_deg),
    }
}
