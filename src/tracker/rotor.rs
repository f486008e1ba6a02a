use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::pass_track::{EventPhase, PassTrack, TrackPoint};
use super::types::AzEl;

pub const ROTOR_THRESHOLD_DEG: f64 = 10.0;
pub const FLIP_THRESHOLD_DEG: f64 = 10.0;

// Clamp targets keeping the rotor on one side of its wrap boundary.
const CLAMP_BELOW_180: f64 = 178.0;
const CLAMP_ABOVE_180: f64 = 182.0;
const CLAMP_ABOVE_0: f64 = 2.0;
const CLAMP_BELOW_360: f64 = 358.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FlipState {
    #[default]
    Unflipped,
    Flipped,
}

/// Side of the wrap boundary the rotor is confined to for the rest of the
/// pass. While unflipped the boundary is 180°, while flipped it is 0°.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Restriction {
    #[default]
    None,
    Quadrants12,
    Quadrants34,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, ToSchema)]
pub struct RotorState {
    pub flip: FlipState,
    pub restriction: Restriction,
    pub last_commanded: Option<AzEl>,
    pub live: Option<AzEl>,
}

impl RotorState {
    pub fn flipped(&self) -> bool {
        self.flip == FlipState::Flipped
    }

    pub fn quadrants12_only(&self) -> bool {
        self.restriction == Restriction::Quadrants12
    }

    pub fn quadrants34_only(&self) -> bool {
        self.restriction == Restriction::Quadrants34
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotorPolicy {
    pub flip_threshold_deg: f64,
    pub rotor_threshold_deg: f64,
    /// Fixed-mount antennas that can never point past zenith.
    pub no_flip: bool,
}

impl Default for RotorPolicy {
    fn default() -> Self {
        Self {
            flip_threshold_deg: FLIP_THRESHOLD_DEG,
            rotor_threshold_deg: ROTOR_THRESHOLD_DEG,
            no_flip: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct RotorUpdate {
    pub target: AzEl,
    pub command: Option<AzEl>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quadrant {
    First,
    Second,
    Third,
    Fourth,
}

impl Quadrant {
    /// Q1 (0,90], Q2 (90,180], Q3 (180,270], Q4 (270,360]; 0 is 360.
    fn of(azimuth_deg: f64) -> Self {
        let az = normalize(azimuth_deg);
        if az <= 90.0 {
            Quadrant::First
        } else if az <= 180.0 {
            Quadrant::Second
        } else if az <= 270.0 {
            Quadrant::Third
        } else {
            Quadrant::Fourth
        }
    }

    fn index(self) -> usize {
        match self {
            Quadrant::First => 0,
            Quadrant::Second => 1,
            Quadrant::Third => 2,
            Quadrant::Fourth => 3,
        }
    }

    fn on_low_side(self) -> bool {
        matches!(self, Quadrant::First | Quadrant::Second)
    }
}

/// Azimuth in (0, 360].
fn normalize(azimuth_deg: f64) -> f64 {
    let az = azimuth_deg.rem_euclid(360.0);
    if az == 0.0 {
        360.0
    } else {
        az
    }
}

struct QuadrantSummary {
    counts: [usize; 4],
    min: [f64; 4],
    max: [f64; 4],
    leading: Quadrant,
}

impl QuadrantSummary {
    fn of(points: &[TrackPoint]) -> Option<Self> {
        let first = points.first()?;
        let mut summary = QuadrantSummary {
            counts: [0; 4],
            min: [f64::INFINITY; 4],
            max: [f64::NEG_INFINITY; 4],
            leading: Quadrant::of(first.azimuth_deg),
        };
        for p in points {
            let az = normalize(p.azimuth_deg);
            let i = Quadrant::of(az).index();
            summary.counts[i] += 1;
            summary.min[i] = summary.min[i].min(az);
            summary.max[i] = summary.max[i].max(az);
        }
        Some(summary)
    }

    fn count(&self, q: Quadrant) -> usize {
        self.counts[q.index()]
    }

    fn crosses_180(&self) -> bool {
        self.count(Quadrant::Second) > 0 && self.count(Quadrant::Third) > 0
    }

    fn crosses_0(&self) -> bool {
        self.count(Quadrant::First) > 0 && self.count(Quadrant::Fourth) > 0
    }

    fn far_across_180(&self, threshold: f64) -> bool {
        self.crosses_180()
            && self.max[Quadrant::Third.index()] > 180.0 + threshold
            && self.min[Quadrant::Second.index()] < 180.0 - threshold
    }

    fn far_across_0(&self, threshold: f64) -> bool {
        self.crosses_0()
            && self.max[Quadrant::First.index()] > threshold
            && self.min[Quadrant::Fourth.index()] < 360.0 - threshold
    }

    fn restriction_at_180(&self) -> Restriction {
        if !self.crosses_180() {
            return Restriction::None;
        }
        self.majority(Quadrant::Second, Quadrant::Third)
    }

    fn restriction_at_0(&self) -> Restriction {
        if !self.crosses_0() {
            return Restriction::None;
        }
        self.majority(Quadrant::First, Quadrant::Fourth)
    }

    fn majority(&self, low: Quadrant, high: Quadrant) -> Restriction {
        let (n_low, n_high) = (self.count(low), self.count(high));
        if n_low > n_high || (n_low == n_high && self.leading.on_low_side()) {
            Restriction::Quadrants12
        } else {
            Restriction::Quadrants34
        }
    }
}

/// Decides how the antenna is mounted for the pass and where to point it.
#[derive(Debug, Clone, Default)]
pub struct RotorPositioner {
    policy: RotorPolicy,
    state: RotorState,
}

impl RotorPositioner {
    pub fn new(policy: RotorPolicy) -> Self {
        Self {
            policy,
            state: RotorState::default(),
        }
    }

    pub fn state(&self) -> &RotorState {
        &self.state
    }

    /// Forget everything about the previous pass.
    pub fn reset(&mut self) {
        self.state = RotorState::default();
    }

    pub fn set_live(&mut self, live: Option<AzEl>) {
        self.state.live = live;
    }

    /// Re-decide flip and restriction from the part of the track still ahead.
    pub fn evaluate(&mut self, track: &PassTrack, now: DateTime<Utc>) {
        if let Some(live) = self.state.live {
            self.state.flip = if live.elevation_deg > 90.0 {
                FlipState::Flipped
            } else {
                FlipState::Unflipped
            };
        }

        let remaining = track.remaining(now);
        let Some(summary) = QuadrantSummary::of(&remaining) else {
            return;
        };

        let threshold = self.policy.flip_threshold_deg;
        let (flip, restriction) = if self.policy.no_flip {
            (FlipState::Unflipped, summary.restriction_at_180())
        } else {
            match self.state.flip {
                FlipState::Unflipped
                    if summary.far_across_180(threshold) && !summary.far_across_0(threshold) =>
                {
                    (FlipState::Flipped, summary.restriction_at_0())
                }
                FlipState::Unflipped => (FlipState::Unflipped, summary.restriction_at_180()),
                FlipState::Flipped
                    if summary.far_across_0(threshold) && !summary.far_across_180(threshold) =>
                {
                    (FlipState::Unflipped, summary.restriction_at_180())
                }
                FlipState::Flipped => (FlipState::Flipped, summary.restriction_at_0()),
            }
        };

        if flip != self.state.flip || restriction != self.state.restriction {
            log::info!(
                "Rotor policy: {:?}/{:?} -> {:?}/{:?} (quadrant counts {:?})",
                self.state.flip,
                self.state.restriction,
                flip,
                restriction,
                summary.counts
            );
        }
        self.state.flip = flip;
        self.state.restriction = restriction;
    }

    /// Rotor position for a requested satellite position, after parking,
    /// restriction clamping and flip remapping.
    pub fn next_target(&self, requested: AzEl, phase: EventPhase, track: &PassTrack) -> AzEl {
        let parked = match phase {
            EventPhase::Upcoming if requested.elevation_deg < 0.0 => track.first(),
            EventPhase::Elapsed if requested.elevation_deg < 0.0 => track.last(),
            _ => None,
        };
        let mut target = parked
            .map(|p| AzEl::new(p.azimuth_deg, 0.0))
            .unwrap_or(requested);

        target.azimuth_deg = self.clamp(target.azimuth_deg);

        if self.state.flipped() {
            target = AzEl::new(
                if target.azimuth_deg < 180.0 {
                    target.azimuth_deg + 180.0
                } else {
                    target.azimuth_deg - 180.0
                },
                180.0 - target.elevation_deg,
            );
        }
        target
    }

    fn clamp(&self, azimuth_deg: f64) -> f64 {
        let quadrant = Quadrant::of(azimuth_deg);
        match (self.state.flip, self.state.restriction, quadrant) {
            (FlipState::Unflipped, Restriction::Quadrants12, Quadrant::Third) => CLAMP_BELOW_180,
            (FlipState::Unflipped, Restriction::Quadrants34, Quadrant::Second) => CLAMP_ABOVE_180,
            (FlipState::Flipped, Restriction::Quadrants12, Quadrant::Fourth) => CLAMP_ABOVE_0,
            (FlipState::Flipped, Restriction::Quadrants34, Quadrant::First) => CLAMP_BELOW_360,
            _ => azimuth_deg,
        }
    }

    /// Compute the target and decide whether it differs enough from where the
    /// rotor was last sent to be worth a command.
    pub fn update(
        &mut self,
        requested: AzEl,
        phase: EventPhase,
        track: &PassTrack,
        writes_enabled: bool,
    ) -> RotorUpdate {
        let target = self.next_target(requested, phase, track);
        let threshold = self.policy.rotor_threshold_deg;

        let needed = match self.state.last_commanded.or(self.state.live) {
            Some(reference) => {
                (target.azimuth_deg - reference.azimuth_deg).abs() > threshold
                    || (target.elevation_deg - reference.elevation_deg).abs() > threshold
            }
            None => true,
        };

        let command = if needed && writes_enabled {
            log::debug!(
                "Rotor command az {:.1} el {:.1}",
                target.azimuth_deg,
                target.elevation_deg
            );
            self.state.last_commanded = Some(target);
            Some(target)
        } else {
            None
        };

        RotorUpdate { target, command }
    }
}

/// One row of a simulated pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimulatedStep {
    pub point: TrackPoint,
    pub target: AzEl,
    pub commanded: bool,
}

/// Run the positioner over every sample of a pass as if the rotor obeyed
/// each command exactly.
pub fn simulate_pass(policy: RotorPolicy, track: &PassTrack) -> Vec<SimulatedStep> {
    let mut positioner = RotorPositioner::new(policy);
    let Some(start) = track.first() else {
        return Vec::new();
    };
    positioner.evaluate(track, start.time);

    track
        .points
        .iter()
        .map(|point| {
            let requested = AzEl::new(point.azimuth_deg, point.elevation_deg);
            let update = positioner.update(requested, EventPhase::InProgress, track, true);
            SimulatedStep {
                point: *point,
                target: update.target,
                commanded: update.command.is_some(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn track(azimuths: &[f64]) -> PassTrack {
        let n = azimuths.len();
        PassTrack::new(
            azimuths
                .iter()
                .enumerate()
                .map(|(i, az)| TrackPoint {
                    time: t0() + Duration::seconds(10 * i as i64),
                    azimuth_deg: *az,
                    elevation_deg: 60.0 * (1.0 - ((2 * i) as f64 / (n - 1) as f64 - 1.0).abs()),
                })
                .collect(),
        )
    }

    fn evaluated(policy: RotorPolicy, t: &PassTrack) -> RotorPositioner {
        let mut positioner = RotorPositioner::new(policy);
        positioner.evaluate(t, t0());
        positioner
    }

    #[test]
    fn small_corrections_are_suppressed() {
        let mut positioner = RotorPositioner::default();
        positioner.state.last_commanded = Some(AzEl::new(100.0, 40.0));
        let t = track(&[90.0, 100.0, 110.0]);

        let update = positioner.update(AzEl::new(105.0, 42.0), EventPhase::InProgress, &t, true);
        assert_eq!(update.command, None);
        assert_eq!(update.target, AzEl::new(105.0, 42.0));

        let update = positioner.update(AzEl::new(115.0, 40.0), EventPhase::InProgress, &t, true);
        assert_eq!(update.command, Some(AzEl::new(115.0, 40.0)));
        assert_eq!(positioner.state().last_commanded, Some(AzEl::new(115.0, 40.0)));
    }

    #[test]
    fn disengaged_rotor_is_never_commanded() {
        let mut positioner = RotorPositioner::new(RotorPolicy::default());
        let t = track(&[90.0, 100.0]);
        let update = positioner.update(AzEl::new(95.0, 10.0), EventPhase::InProgress, &t, false);
        assert_eq!(update.command, None);
        assert_eq!(positioner.state().last_commanded, None);
    }

    #[test]
    fn first_command_uses_live_position_as_reference() {
        let mut positioner = RotorPositioner::new(RotorPolicy::default());
        positioner.set_live(Some(AzEl::new(96.0, 12.0)));
        let t = track(&[90.0, 100.0]);
        let update = positioner.update(AzEl::new(95.0, 10.0), EventPhase::InProgress, &t, true);
        assert_eq!(update.command, None);
    }

    #[test]
    fn east_only_track_never_flips() {
        let positioner = evaluated(RotorPolicy::default(), &track(&[20.0, 60.0, 100.0, 150.0, 175.0]));
        assert!(!positioner.state().flipped());
        assert_eq!(positioner.state().restriction, Restriction::None);
    }

    #[test]
    fn wide_crossing_of_south_flips() {
        let positioner = evaluated(RotorPolicy::default(), &track(&[120.0, 160.0, 180.0, 200.0, 240.0]));
        assert!(positioner.state().flipped());
        assert_eq!(positioner.state().restriction, Restriction::None);
    }

    #[test]
    fn crossing_from_160_to_200_flips() {
        let positioner = evaluated(RotorPolicy::default(), &track(&[160.0, 175.0, 200.0]));
        assert!(positioner.state().flipped());
    }

    #[test]
    fn grazing_south_restricts_instead_of_flipping() {
        let positioner = evaluated(RotorPolicy::default(), &track(&[150.0, 170.0, 175.0, 185.0]));
        assert!(!positioner.state().flipped());
        assert!(positioner.state().quadrants12_only());

        let positioner = evaluated(RotorPolicy::default(), &track(&[175.0, 185.0, 200.0, 230.0]));
        assert!(!positioner.state().flipped());
        assert!(positioner.state().quadrants34_only());
    }

    #[test]
    fn restricted_target_never_crosses_south() {
        let t = track(&[150.0, 170.0, 175.0, 185.0]);
        let positioner = evaluated(RotorPolicy::default(), &t);
        let target = positioner.next_target(AzEl::new(185.0, 30.0), EventPhase::InProgress, &t);
        assert_eq!(target, AzEl::new(178.0, 30.0));
        let target = positioner.next_target(AzEl::new(170.0, 30.0), EventPhase::InProgress, &t);
        assert_eq!(target, AzEl::new(170.0, 30.0));
    }

    #[test]
    fn tie_follows_the_leading_sample() {
        let positioner = evaluated(RotorPolicy::default(), &track(&[185.0, 175.0]));
        assert!(positioner.state().quadrants34_only());
    }

    #[test]
    fn no_flip_override_wins() {
        let policy = RotorPolicy {
            no_flip: true,
            ..RotorPolicy::default()
        };
        let positioner = evaluated(policy, &track(&[120.0, 160.0, 200.0, 210.0, 240.0]));
        assert!(!positioner.state().flipped());
        assert!(positioner.state().quadrants34_only());
    }

    #[test]
    fn live_elevation_over_zenith_means_flipped() {
        let t = track(&[340.0, 355.0, 5.0, 30.0, 60.0]);
        let mut positioner = RotorPositioner::new(RotorPolicy::default());
        positioner.set_live(Some(AzEl::new(170.0, 120.0)));
        positioner.evaluate(&t, t0());
        // Crossing north by more than the threshold while flipped: unflip.
        assert!(!positioner.state().flipped());

        let t = track(&[355.0, 358.0, 2.0, 5.0]);
        let mut positioner = RotorPositioner::new(RotorPolicy::default());
        positioner.set_live(Some(AzEl::new(178.0, 150.0)));
        positioner.evaluate(&t, t0());
        assert!(positioner.state().flipped());
        assert!(positioner.state().quadrants34_only());
    }

    #[test]
    fn flipped_target_is_mirrored() {
        let t = track(&[120.0, 160.0, 200.0, 240.0]);
        let positioner = evaluated(RotorPolicy::default(), &t);
        assert!(positioner.state().flipped());
        let target = positioner.next_target(AzEl::new(200.0, 30.0), EventPhase::InProgress, &t);
        assert_eq!(target, AzEl::new(20.0, 150.0));
        let target = positioner.next_target(AzEl::new(120.0, 10.0), EventPhase::InProgress, &t);
        assert_eq!(target, AzEl::new(300.0, 170.0));
    }

    #[test]
    fn flipped_restriction_clamps_near_north() {
        let t = track(&[355.0, 358.0, 3.0, 20.0, 50.0]);
        let mut positioner = RotorPositioner::new(RotorPolicy::default());
        positioner.set_live(Some(AzEl::new(175.0, 100.0)));
        positioner.evaluate(&t, t0());
        assert!(positioner.state().flipped());
        assert!(positioner.state().quadrants12_only());
        let target = positioner.next_target(AzEl::new(357.0, 20.0), EventPhase::InProgress, &t);
        assert_eq!(target, AzEl::new(182.0, 160.0));
    }

    #[test]
    fn upcoming_pass_parks_at_first_azimuth() {
        let t = track(&[30.0, 60.0, 90.0]);
        let positioner = evaluated(RotorPolicy::default(), &t);
        let target = positioner.next_target(AzEl::new(12.0, -20.0), EventPhase::Upcoming, &t);
        assert_eq!(target, AzEl::new(30.0, 0.0));
    }

    #[test]
    fn elapsed_pass_parks_at_last_azimuth() {
        let t = track(&[30.0, 60.0, 90.0]);
        let positioner = evaluated(RotorPolicy::default(), &t);
        let target = positioner.next_target(AzEl::new(120.0, -5.0), EventPhase::Elapsed, &t);
        assert_eq!(target, AzEl::new(90.0, 0.0));
    }

    #[test]
    fn in_progress_request_passes_through() {
        let t = track(&[30.0, 60.0, 90.0]);
        let positioner = evaluated(RotorPolicy::default(), &t);
        let target = positioner.next_target(AzEl::new(61.5, 42.25), EventPhase::InProgress, &t);
        assert_eq!(target, AzEl::new(61.5, 42.25));
    }

    #[test]
    fn evaluation_after_los_keeps_state() {
        let t = track(&[120.0, 160.0, 200.0, 240.0]);
        let mut positioner = evaluated(RotorPolicy::default(), &t);
        positioner.evaluate(&t, t0() + Duration::hours(1));
        assert!(positioner.state().flipped());
    }

    #[test]
    fn simulation_commands_sparse_moves() {
        let azimuths: Vec<f64> = (0..30).map(|i| 100.0 + i as f64 * 2.0).collect();
        let steps = simulate_pass(RotorPolicy::default(), &track(&azimuths));
        assert_eq!(steps.len(), 30);
        assert!(steps[0].commanded);
        let commands = steps.iter().filter(|s| s.commanded).count();
        assert!(commands > 1 && commands < 30);
    }
}
