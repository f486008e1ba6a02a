use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::catalog::SatelliteTransponders;
use super::countdown::Countdown;
use super::error::TrackerError;
use super::frequency::{
    compute_link_frequencies, doppler_shifts, downlink_from_dial, DopplerShifts, LinkFrequencies,
};
use super::pass_track::{EventPhase, PassTrack};
use super::rotor::{RotorPolicy, RotorPositioner, RotorState};
use super::transponder::Transponder;
use super::types::{AzEl, Command, Mode, RadioCommand, SatelliteRef, Vfo, VfoRoles};
use crate::predict::{Observation, Pass, PredictError};

/// RIT/XIT change per operator step.
pub const RIT_STEP_HZ: f64 = 100.0;
pub const RETUNE_TOLERANCE_HZ: f64 = 10.0;
pub const FLIP_RECHECK_SECONDS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RigModel {
    Ft991a,
    Ic9700,
    Sdr,
    Dummy,
}

impl RigModel {
    pub fn vfo_roles(&self) -> VfoRoles {
        match self {
            RigModel::Ft991a | RigModel::Dummy => VfoRoles {
                downlink: Vfo::A,
                uplink: Some(Vfo::B),
            },
            RigModel::Ic9700 => VfoRoles {
                downlink: Vfo::Main,
                uplink: Some(Vfo::Sub),
            },
            RigModel::Sdr => VfoRoles {
                downlink: Vfo::A,
                uplink: None,
            },
        }
    }

    /// Commands that put the rig into (or out of) full-duplex satellite operation.
    fn enable_commands(&self, on: bool) -> Vec<RadioCommand> {
        match self {
            RigModel::Ft991a => vec![RadioCommand::SplitMode { on }],
            RigModel::Ic9700 if on => vec![RadioCommand::SatelliteMode { on }],
            _ => Vec::new(),
        }
    }
}

/// Amateur band a frequency falls in, if any.
pub fn band_of(hz: f64) -> Option<&'static str> {
    let mhz = hz / 1e6;
    match mhz {
        m if (1.8..30.0).contains(&m) => Some("HF"),
        m if (50.0..54.0).contains(&m) => Some("6m"),
        m if (144.0..148.0).contains(&m) => Some("2m"),
        m if (219.0..225.0).contains(&m) => Some("1.25m"),
        m if (420.0..450.0).contains(&m) => Some("70cm"),
        m if (1240.0..1300.0).contains(&m) => Some("23cm"),
        m if (2300.0..2450.0).contains(&m) => Some("13cm"),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ControllerSettings {
    pub rig: RigModel,
    pub policy: RotorPolicy,
    pub flip_recheck: Duration,
    pub retune_tolerance_hz: f64,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            rig: RigModel::Dummy,
            policy: RotorPolicy::default(),
            flip_recheck: Duration::seconds(FLIP_RECHECK_SECONDS),
            retune_tolerance_hz: RETUNE_TOLERANCE_HZ,
        }
    }
}

/// Everything needed to start tracking a satellite.
#[derive(Debug, Clone)]
pub struct Selection {
    pub satellite: SatelliteRef,
    pub transponders: SatelliteTransponders,
    pub pass: Pass,
    pub track: PassTrack,
}

#[derive(Debug, Clone)]
struct TrackingSession {
    satellite: SatelliteRef,
    transponder: Transponder,
    fdown: f64,
    rit: f64,
    xit: f64,
    roles: VfoRoles,
    mode: Mode,
    engaged: bool,
    pass: Pass,
    track: PassTrack,
    needs_setup: bool,
    force_update: bool,
    /// Set once the rotor has received its first position for this pass.
    rotor_placed: bool,
    last_written_downlink: Option<f64>,
    doppler: DopplerShifts,
    link: Option<LinkFrequencies>,
    last_flip_check: Option<DateTime<Utc>>,
}

impl TrackingSession {
    fn setup_commands(&self, rig: RigModel, main_dial_hz: Option<f64>) -> Vec<RadioCommand> {
        let mut commands = rig.enable_commands(true);

        if rig == RigModel::Ic9700 {
            let main_band = main_dial_hz.and_then(band_of);
            let wanted = band_of(self.transponder.downlink_low);
            if let (Some(main_band), Some(wanted)) = (main_band, wanted) {
                if main_band != wanted {
                    log::info!("Main VFO is on {}, swapping to {}", main_band, wanted);
                    commands.push(RadioCommand::SwapVfos);
                }
            }
        }

        commands.extend(self.mode_commands());
        commands
    }

    fn mode_commands(&self) -> Vec<RadioCommand> {
        let mut commands = vec![RadioCommand::SetMode {
            vfo: self.roles.downlink,
            mode: self.mode,
            filter: self.mode.filter(),
        }];
        if let (Some(vfo), true) = (self.roles.uplink, self.transponder.has_uplink()) {
            let mode = self.transponder.uplink_mode(self.mode);
            commands.push(RadioCommand::SetMode {
                vfo,
                mode,
                filter: mode.filter(),
            });
        }
        commands
    }
}

/// Live values gathered by the scheduler before a tick.
#[derive(Debug)]
pub struct Readings {
    pub observation: Option<Result<Observation, PredictError>>,
    pub radio_active: bool,
    pub downlink_dial_hz: Option<f64>,
    pub rotor_position: Option<AzEl>,
}

/// What the scheduler has to read before the next tick.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadPlan {
    pub satellite: SatelliteRef,
    pub downlink_vfo: Vfo,
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct TrackerStatus {
    pub satellite: Option<SatelliteRef>,
    pub transponder: Option<Transponder>,
    pub engaged: bool,
    pub mode: Option<Mode>,
    pub rit_hz: f64,
    pub xit_hz: f64,
    pub frequencies: Option<LinkFrequencies>,
    pub doppler: DopplerShifts,
    pub observation: Option<Observation>,
    pub rotor: RotorState,
    pub rotor_target: Option<AzEl>,
    pub phase: Option<EventPhase>,
    pub aos: Option<DateTime<Utc>>,
    pub los: Option<DateTime<Utc>>,
    pub countdown: Option<String>,
    pub last_error: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Per-tick decision logic. Holds the session for the selected satellite and
/// the rotor state machine; turns readings into hardware commands.
pub struct TrackingController {
    settings: ControllerSettings,
    session: Option<TrackingSession>,
    rotor: RotorPositioner,
    pending: Vec<Command>,
    last_observation: Option<Observation>,
    rotor_target: Option<AzEl>,
    last_error: Option<String>,
    status: TrackerStatus,
}

impl TrackingController {
    pub fn new(settings: ControllerSettings) -> Self {
        Self {
            rotor: RotorPositioner::new(settings.policy),
            settings,
            session: None,
            pending: Vec::new(),
            last_observation: None,
            rotor_target: None,
            last_error: None,
            status: TrackerStatus::default(),
        }
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    /// Replace the current session. The rig starts disengaged on the new
    /// satellite, tuned to the middle of the main transponder.
    pub fn select(&mut self, selection: Selection) {
        let Selection {
            satellite,
            transponders,
            pass,
            track,
        } = selection;
        let transponder = transponders.main;

        log::info!(
            "Selected {} (NORAD {}) on {}, AOS {} LOS {}",
            satellite.name,
            satellite.norad_id,
            transponder.name,
            pass.aos,
            pass.los
        );

        self.rotor.reset();
        self.pending.clear();
        self.last_observation = None;
        self.rotor_target = None;
        self.last_error = None;
        self.session = Some(TrackingSession {
            satellite,
            fdown: transponder.passband_center(),
            mode: transponder.mode,
            rit: transponders.rit,
            xit: transponders.xit,
            roles: self.settings.rig.vfo_roles(),
            transponder,
            engaged: false,
            pass,
            track,
            needs_setup: true,
            force_update: false,
            rotor_placed: false,
            last_written_downlink: None,
            doppler: DopplerShifts::default(),
            link: None,
            last_flip_check: None,
        });
    }

    pub fn read_plan(&self) -> Option<ReadPlan> {
        self.session.as_ref().map(|s| ReadPlan {
            satellite: s.satellite.clone(),
            downlink_vfo: s.roles.downlink,
        })
    }

    pub fn tick(&mut self, now: DateTime<Utc>, readings: Readings) -> Vec<Command> {
        let mut commands = std::mem::take(&mut self.pending);
        self.rotor.set_live(readings.rotor_position);

        match readings.observation {
            Some(Ok(obs)) => {
                self.last_observation = Some(obs);
                self.last_error = None;
            }
            Some(Err(e)) => {
                log::warn!("Observation failed: {}", e);
                self.last_error = Some(e.to_string());
            }
            None => {}
        }

        if let (Some(session), Some(obs), None) =
            (self.session.as_mut(), self.last_observation, &self.last_error)
        {
            let rig = self.settings.rig;

            if session.needs_setup && readings.radio_active {
                commands.extend(
                    session
                        .setup_commands(rig, readings.downlink_dial_hz)
                        .into_iter()
                        .map(Command::Radio),
                );
                session.needs_setup = false;
                session.force_update = true;
            }

            let recheck_due = session
                .last_flip_check
                .map_or(true, |at| now - at >= self.settings.flip_recheck);
            if recheck_due {
                self.rotor.evaluate(&session.track, now);
                session.last_flip_check = Some(now);
            }

            let forced = session.force_update;
            let retuned = !forced
                && readings.radio_active
                && match (readings.downlink_dial_hz, session.last_written_downlink) {
                    (Some(dial), Some(written)) => {
                        (dial - written).abs() > self.settings.retune_tolerance_hz
                    }
                    _ => false,
                };

            if retuned {
                if let Some(dial) = readings.downlink_dial_hz {
                    session.fdown = downlink_from_dial(dial, session.rit, session.doppler.downlink_hz);
                    session.last_written_downlink = Some(dial);
                    log::info!("Manual retune to {:.0} Hz at the satellite", session.fdown);
                }
                // Operator commands wait for the next tick with the rest of the writes.
                self.pending = commands;
                commands = Vec::new();
            }

            let fup = session.transponder.uplink_for(session.fdown);
            session.doppler = doppler_shifts(obs.doppler_100mhz_hz, session.fdown, fup);
            let link = compute_link_frequencies(
                session.fdown,
                &session.transponder,
                session.doppler.downlink_hz,
                session.doppler.uplink_hz,
                session.rit,
                session.xit,
            );
            session.link = Some(link);

            let writes = !retuned && (session.engaged || forced);
            if writes && readings.radio_active {
                if let (Some(vfo), true) = (session.roles.uplink, session.transponder.has_uplink()) {
                    commands.push(Command::Radio(RadioCommand::SetFrequency {
                        vfo,
                        hz: link.uplink_tuned.round(),
                    }));
                }
                let downlink = link.downlink_tuned.round();
                commands.push(Command::Radio(RadioCommand::SetFrequency {
                    vfo: session.roles.downlink,
                    hz: downlink,
                }));
                session.last_written_downlink = Some(downlink);
            }

            let requested = AzEl::new(obs.azimuth_deg, obs.elevation_deg);
            let phase = session.track.phase(now);
            let rotor_writes = !retuned && (writes || !session.rotor_placed);
            let update = self.rotor.update(
                requested,
                phase,
                &session.track,
                rotor_writes && readings.rotor_position.is_some(),
            );
            if readings.rotor_position.is_some() && !retuned {
                session.rotor_placed = true;
            }
            self.rotor_target = Some(update.target);
            if let Some(target) = update.command {
                commands.push(Command::Rotor(target));
            }

            if !retuned {
                session.force_update = false;
            }
        }

        self.refresh_status(now);
        commands
    }

    /// Start or stop writing to the hardware. Engaging re-centers the
    /// downlink so the first write lands in the passband.
    pub fn engage(&mut self, on: bool) -> Result<(), TrackerError> {
        let rig = self.settings.rig;
        let session = self.session.as_mut().ok_or(TrackerError::NoSession)?;
        session.engaged = on;
        self.pending
            .extend(rig.enable_commands(on).into_iter().map(Command::Radio));
        log::info!("Rig {}", if on { "engaged" } else { "disengaged" });

        if on {
            self.recenter()?;
        }
        Ok(())
    }

    pub fn recenter(&mut self) -> Result<(), TrackerError> {
        let session = self.session.as_mut().ok_or(TrackerError::NoSession)?;
        session.fdown = session.transponder.passband_center();
        session.force_update = true;
        self.pending
            .extend(session.mode_commands().into_iter().map(Command::Radio));
        log::info!("Re-centered on {:.0} Hz", session.fdown);
        Ok(())
    }

    pub fn set_mode(&mut self, mode: Mode) -> Result<(), TrackerError> {
        let session = self.session.as_mut().ok_or(TrackerError::NoSession)?;
        session.mode = mode;
        self.pending
            .extend(session.mode_commands().into_iter().map(Command::Radio));
        log::info!("Mode set to {}", mode);
        Ok(())
    }

    /// Set RIT and/or XIT; `None` leaves that offset unchanged.
    pub fn set_offsets(&mut self, rit: Option<f64>, xit: Option<f64>) -> Result<(), TrackerError> {
        let session = self.session.as_mut().ok_or(TrackerError::NoSession)?;
        if let Some(rit) = rit {
            session.rit = rit;
        }
        if let Some(xit) = xit {
            session.xit = xit;
        }
        log::info!("Offsets RIT {:.0} Hz XIT {:.0} Hz", session.rit, session.xit);
        Ok(())
    }

    pub fn step_offsets(&mut self, rit_steps: i32, xit_steps: i32) -> Result<(), TrackerError> {
        let session = self.session.as_ref().ok_or(TrackerError::NoSession)?;
        let rit = session.rit + rit_steps as f64 * RIT_STEP_HZ;
        let xit = session.xit + xit_steps as f64 * RIT_STEP_HZ;
        self.set_offsets(Some(rit), Some(xit))
    }

    pub fn clear_offsets(&mut self) -> Result<(), TrackerError> {
        self.set_offsets(Some(0.0), Some(0.0))
    }

    pub fn status(&self) -> TrackerStatus {
        self.status.clone()
    }

    /// Rebuild the status snapshot served to clients.
    pub fn refresh_status(&mut self, now: DateTime<Utc>) {
        let session = self.session.as_ref();
        self.status = TrackerStatus {
            satellite: session.map(|s| s.satellite.clone()),
            transponder: session.map(|s| s.transponder.clone()),
            engaged: session.is_some_and(|s| s.engaged),
            mode: session.map(|s| s.mode),
            rit_hz: session.map_or(0.0, |s| s.rit),
            xit_hz: session.map_or(0.0, |s| s.xit),
            frequencies: session.and_then(|s| s.link),
            doppler: session.map_or_else(DopplerShifts::default, |s| s.doppler),
            observation: self.last_observation,
            rotor: *self.rotor.state(),
            rotor_target: self.rotor_target,
            phase: session.map(|s| s.track.phase(now)),
            aos: session.map(|s| s.pass.aos),
            los: session.map(|s| s.pass.los),
            countdown: session.map(|s| Countdown::at(s.pass.aos, s.pass.los, now).to_string()),
            last_error: self.last_error.clone(),
            updated_at: Some(now),
        };
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::tracker::catalog::parse_catalog;
    use crate::tracker::pass_track::TrackPoint;
    use chrono::TimeZone;

    pub fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 18, 0, 0).unwrap()
    }

    const LINEAR: &str = r#"
xit: -50
transponders:
  Linear transponder:
    down_low: 435000000
    down_high: 435040000
    up_low: 145900000
    up_high: 145940000
    mode: USB
    invert: true
"#;

    pub fn selection() -> Selection {
        let points = [(100.0, 0.0), (120.0, 30.0), (150.0, 60.0), (170.0, 20.0), (175.0, 0.0)]
            .iter()
            .enumerate()
            .map(|(i, (az, el))| TrackPoint {
                time: t0() + Duration::seconds(60 * i as i64),
                azimuth_deg: *az,
                elevation_deg: *el,
            })
            .collect();
        let track = PassTrack::new(points);
        Selection {
            satellite: SatelliteRef::new("TEST-1", 40000),
            transponders: parse_catalog(40000, LINEAR).unwrap(),
            pass: Pass {
                satellite: "TEST-1".into(),
                norad_id: 40000,
                aos: t0(),
                los: t0() + Duration::minutes(4),
                tca: t0() + Duration::minutes(2),
                max_elevation_deg: 60.0,
                aos_azimuth_deg: 100.0,
                los_azimuth_deg: 175.0,
                duration_seconds: 240,
            },
            track,
        }
    }

    pub fn observation(az: f64, el: f64, doppler: f64) -> Observation {
        Observation {
            azimuth_deg: az,
            elevation_deg: el,
            range_km: 1200.0,
            range_rate_km_s: 0.0,
            latitude_deg: 40.0,
            longitude_deg: 10.0,
            footprint_radius_km: 2500.0,
            doppler_100mhz_hz: doppler,
        }
    }

    pub fn readings(obs: Observation, dial: Option<f64>) -> Readings {
        Readings {
            observation: Some(Ok(obs)),
            radio_active: true,
            downlink_dial_hz: dial,
            rotor_position: Some(AzEl::new(0.0, 0.0)),
        }
    }

    fn controller(rig: RigModel) -> TrackingController {
        TrackingController::new(ControllerSettings {
            rig,
            ..ControllerSettings::default()
        })
    }

    fn frequency_writes(commands: &[Command]) -> Vec<(Vfo, f64)> {
        commands
            .iter()
            .filter_map(|c| match c {
                Command::Radio(RadioCommand::SetFrequency { vfo, hz }) => Some((*vfo, *hz)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn selection_tick_sets_up_rig_and_forces_one_write() {
        let mut ctl = controller(RigModel::Ft991a);
        ctl.select(selection());

        let commands = ctl.tick(t0() + Duration::seconds(30), readings(observation(110.0, 10.0, 0.0), None));
        assert_eq!(commands[0], Command::Radio(RadioCommand::SplitMode { on: true }));
        assert!(commands.contains(&Command::Radio(RadioCommand::SetMode {
            vfo: Vfo::A,
            mode: Mode::Usb,
            filter: None,
        })));
        assert!(commands.contains(&Command::Radio(RadioCommand::SetMode {
            vfo: Vfo::B,
            mode: Mode::Lsb,
            filter: None,
        })));
        assert_eq!(
            frequency_writes(&commands),
            vec![(Vfo::B, 145_919_950.0), (Vfo::A, 435_020_000.0)]
        );
        assert!(commands.iter().any(|c| matches!(c, Command::Rotor(_))));

        // Not engaged: later ticks only track.
        let commands = ctl.tick(t0() + Duration::seconds(31), readings(observation(110.0, 10.0, 0.0), Some(435_020_000.0)));
        assert!(commands.is_empty());
        let status = ctl.status();
        assert!(!status.engaged);
        assert_eq!(status.countdown.as_deref(), Some("LOS in 00:03:29"));
    }

    #[test]
    fn engaged_ticks_follow_doppler() {
        let mut ctl = controller(RigModel::Dummy);
        ctl.select(selection());
        ctl.tick(t0(), readings(observation(100.0, 1.0, 0.0), None));
        ctl.engage(true).unwrap();

        let commands = ctl.tick(t0() + Duration::seconds(1), readings(observation(100.0, 1.0, -2000.0), Some(435_020_000.0)));
        let writes = frequency_writes(&commands);
        // -2000 Hz at 100 MHz scales to -8700.4 Hz at 435.02 MHz.
        assert_eq!(writes.last(), Some(&(Vfo::A, (435_020_000.0_f64 - 8700.4).round())));
        let up = writes[0].1;
        assert!((up - (145_920_000.0 + 2000.0 * 145.92 / 100.0 - 50.0)).abs() < 1.0);
    }

    #[test]
    fn manual_retune_suppresses_writes_for_one_tick() {
        let mut ctl = controller(RigModel::Dummy);
        ctl.select(selection());
        ctl.tick(t0(), readings(observation(100.0, 1.0, 0.0), None));
        ctl.engage(true).unwrap();
        let commands = ctl.tick(t0() + Duration::seconds(1), readings(observation(100.0, 1.0, 0.0), None));
        assert_eq!(frequency_writes(&commands).last(), Some(&(Vfo::A, 435_020_000.0)));

        // Operator turned the dial 5 kHz up.
        let commands = ctl.tick(t0() + Duration::seconds(2), readings(observation(100.0, 1.0, 0.0), Some(435_025_000.0)));
        assert!(commands.is_empty());
        assert_eq!(ctl.status().frequencies.unwrap().downlink_center, 435_025_000.0);

        let commands = ctl.tick(t0() + Duration::seconds(3), readings(observation(100.0, 1.0, 0.0), Some(435_025_000.0)));
        let writes = frequency_writes(&commands);
        assert_eq!(writes.last(), Some(&(Vfo::A, 435_025_000.0)));
        // Inverting: 5 kHz up on the downlink is 5 kHz down on the uplink.
        assert_eq!(writes[0], (Vfo::B, 145_915_000.0 - 50.0));
    }

    #[test]
    fn small_dial_differences_are_not_a_retune() {
        let mut ctl = controller(RigModel::Dummy);
        ctl.select(selection());
        ctl.tick(t0(), readings(observation(100.0, 1.0, 0.0), None));
        ctl.engage(true).unwrap();
        ctl.tick(t0() + Duration::seconds(1), readings(observation(100.0, 1.0, 0.0), None));

        let commands = ctl.tick(t0() + Duration::seconds(2), readings(observation(100.0, 1.0, 0.0), Some(435_020_005.0)));
        assert!(!frequency_writes(&commands).is_empty());
    }

    #[test]
    fn ic9700_swaps_when_main_is_on_the_wrong_band() {
        let mut ctl = controller(RigModel::Ic9700);
        ctl.select(selection());
        let commands = ctl.tick(t0(), readings(observation(100.0, 1.0, 0.0), Some(145_900_000.0)));
        assert_eq!(commands[0], Command::Radio(RadioCommand::SatelliteMode { on: true }));
        assert_eq!(commands[1], Command::Radio(RadioCommand::SwapVfos));

        let mut ctl = controller(RigModel::Ic9700);
        ctl.select(selection());
        let commands = ctl.tick(t0(), readings(observation(100.0, 1.0, 0.0), Some(435_100_000.0)));
        assert!(!commands.contains(&Command::Radio(RadioCommand::SwapVfos)));
    }

    #[test]
    fn sdr_has_no_uplink_writes() {
        let mut ctl = controller(RigModel::Sdr);
        ctl.select(selection());
        let commands = ctl.tick(t0(), readings(observation(100.0, 1.0, 0.0), None));
        assert_eq!(frequency_writes(&commands), vec![(Vfo::A, 435_020_000.0)]);
        assert_eq!(
            commands
                .iter()
                .filter(|c| matches!(c, Command::Radio(RadioCommand::SetMode { .. })))
                .count(),
            1
        );
    }

    #[test]
    fn observe_failure_keeps_previous_values() {
        let mut ctl = controller(RigModel::Dummy);
        ctl.select(selection());
        ctl.tick(t0(), readings(observation(100.0, 1.0, 0.0), None));
        let before = ctl.status().frequencies;

        let commands = ctl.tick(
            t0() + Duration::seconds(1),
            Readings {
                observation: Some(Err(PredictError::UnknownSatellite(40000))),
                radio_active: true,
                downlink_dial_hz: None,
                rotor_position: None,
            },
        );
        assert!(commands.is_empty());
        let status = ctl.status();
        assert!(status.last_error.is_some());
        assert_eq!(status.frequencies, before);

        ctl.tick(t0() + Duration::seconds(2), readings(observation(100.0, 1.0, 0.0), None));
        assert!(ctl.status().last_error.is_none());
    }

    #[test]
    fn inactive_radio_defers_setup() {
        let mut ctl = controller(RigModel::Ft991a);
        ctl.select(selection());
        let mut offline = readings(observation(100.0, 1.0, 0.0), None);
        offline.radio_active = false;
        offline.rotor_position = None;
        assert!(ctl.tick(t0(), offline).is_empty());
        assert!(ctl.status().frequencies.is_some());

        let commands = ctl.tick(t0() + Duration::seconds(1), readings(observation(100.0, 1.0, 0.0), None));
        assert_eq!(commands[0], Command::Radio(RadioCommand::SplitMode { on: true }));
    }

    #[test]
    fn operator_controls_queue_commands() {
        let mut ctl = controller(RigModel::Ft991a);
        assert!(matches!(ctl.engage(true), Err(TrackerError::NoSession)));

        ctl.select(selection());
        ctl.tick(t0(), readings(observation(100.0, 1.0, 0.0), None));

        ctl.set_mode(Mode::Cw).unwrap();
        ctl.step_offsets(2, -1).unwrap();
        let commands = ctl.tick(t0() + Duration::seconds(1), readings(observation(100.0, 1.0, 0.0), None));
        assert_eq!(
            commands[..2],
            [
                Command::Radio(RadioCommand::SetMode {
                    vfo: Vfo::A,
                    mode: Mode::Cw,
                    filter: Some(crate::tracker::types::Filter::Wide),
                }),
                Command::Radio(RadioCommand::SetMode {
                    vfo: Vfo::B,
                    mode: Mode::CwReverse,
                    filter: Some(crate::tracker::types::Filter::Wide),
                }),
            ]
        );
        let status = ctl.status();
        assert_eq!(status.rit_hz, 200.0);
        assert_eq!(status.xit_hz, -150.0);

        ctl.clear_offsets().unwrap();
        ctl.engage(false).unwrap();
        let commands = ctl.tick(t0() + Duration::seconds(2), readings(observation(100.0, 1.0, 0.0), None));
        assert_eq!(commands, vec![Command::Radio(RadioCommand::SplitMode { on: false })]);
        assert_eq!(ctl.status().rit_hz, 0.0);
    }

    #[test]
    fn reselection_disengages_and_recenters() {
        let mut ctl = controller(RigModel::Dummy);
        ctl.select(selection());
        ctl.tick(t0(), readings(observation(100.0, 1.0, 0.0), None));
        ctl.engage(true).unwrap();
        ctl.tick(t0() + Duration::seconds(1), readings(observation(100.0, 1.0, 0.0), Some(435_030_000.0)));

        ctl.select(selection());
        ctl.tick(t0() + Duration::seconds(2), readings(observation(100.0, 1.0, 0.0), None));
        let status = ctl.status();
        assert!(!status.engaged);
        assert_eq!(status.frequencies.unwrap().downlink_center, 435_020_000.0);
    }

    #[test]
    fn dial_is_followed_while_disengaged() {
        let mut ctl = controller(RigModel::Dummy);
        ctl.select(selection());
        ctl.tick(t0(), readings(observation(100.0, 1.0, 0.0), None));

        let commands = ctl.tick(t0() + Duration::seconds(1), readings(observation(100.0, 1.0, 0.0), Some(435_025_000.0)));
        assert!(commands.is_empty());
        let link = ctl.status().frequencies.unwrap();
        assert_eq!(link.downlink_center, 435_025_000.0);
        assert_eq!(link.uplink_center, 145_915_000.0);

        let commands = ctl.tick(t0() + Duration::seconds(2), readings(observation(100.0, 1.0, 0.0), Some(435_025_000.0)));
        assert!(frequency_writes(&commands).is_empty());
        assert_eq!(ctl.status().frequencies.unwrap().downlink_center, 435_025_000.0);
    }

    #[test]
    fn rotor_is_positioned_on_selection_without_radio() {
        let mut ctl = controller(RigModel::Ft991a);
        ctl.select(selection());
        let mut offline = readings(observation(110.0, 10.0, 0.0), None);
        offline.radio_active = false;

        let commands = ctl.tick(t0() + Duration::seconds(30), offline);
        assert_eq!(commands, vec![Command::Rotor(AzEl::new(110.0, 10.0))]);

        let mut offline = readings(observation(130.0, 20.0, 0.0), None);
        offline.radio_active = false;
        offline.rotor_position = Some(AzEl::new(110.0, 10.0));
        assert!(ctl.tick(t0() + Duration::seconds(60), offline).is_empty());
    }

    #[test]
    fn band_lookup() {
        assert_eq!(band_of(145.9e6), Some("2m"));
        assert_eq!(band_of(435.0e6), Some("70cm"));
        assert_eq!(band_of(1268.0e6), Some("23cm"));
        assert_eq!(band_of(100.0e6), None);
    }
}
