use serde::Serialize;
use utoipa::ToSchema;

use super::transponder::Transponder;

/// Doppler factors from the source are expressed as the shift seen at this
/// carrier frequency.
pub const DOPPLER_REFERENCE_HZ: f64 = 100.0e6;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, ToSchema)]
pub struct DopplerShifts {
    pub downlink_hz: f64,
    pub uplink_hz: f64,
}

/// Scale the 100 MHz Doppler factor to both links. The uplink is
/// pre-corrected in the opposite direction so the satellite hears `fup`.
pub fn doppler_shifts(doppler_100mhz_hz: f64, fdown: f64, fup: f64) -> DopplerShifts {
    DopplerShifts {
        downlink_hz: doppler_100mhz_hz * fdown / DOPPLER_REFERENCE_HZ,
        uplink_hz: -doppler_100mhz_hz * fup / DOPPLER_REFERENCE_HZ,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct LinkFrequencies {
    /// Downlink frequency at the satellite.
    pub downlink_center: f64,
    /// Uplink frequency at the satellite.
    pub uplink_center: f64,
    /// What the receive VFO must be tuned to.
    pub downlink_tuned: f64,
    /// What the transmit VFO must be tuned to.
    pub uplink_tuned: f64,
}

pub fn compute_link_frequencies(
    fdown: f64,
    transponder: &Transponder,
    doppler_down: f64,
    doppler_up: f64,
    rit: f64,
    xit: f64,
) -> LinkFrequencies {
    let fup = transponder.uplink_for(fdown);
    LinkFrequencies {
        downlink_center: fdown,
        uplink_center: fup,
        downlink_tuned: fdown + doppler_down + rit,
        uplink_tuned: fup + doppler_up + xit,
    }
}

/// Recover the satellite-side downlink frequency from a dial reading.
pub fn downlink_from_dial(dial_hz: f64, rit: f64, doppler_down: f64) -> f64 {
    dial_hz - rit - doppler_down
}
