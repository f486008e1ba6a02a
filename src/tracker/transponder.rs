use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use super::types::Mode;

#[derive(Debug, Error, PartialEq)]
pub enum TransponderError {
    #[error("{name}: negative band edge")]
    NegativeFrequency { name: String },
    #[error("{name}: downlink band reversed ({low} > {high})")]
    DownlinkReversed { name: String, low: f64, high: f64 },
    #[error("{name}: uplink band reversed ({low} > {high})")]
    UplinkReversed { name: String, low: f64, high: f64 },
}

/// Linear or FM transponder: a downlink passband, the uplink passband it is
/// fed from, and whether the mapping between the two is reversed.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Transponder {
    pub name: String,
    pub downlink_low: f64,
    pub downlink_high: f64,
    pub uplink_low: f64,
    pub uplink_high: f64,
    pub mode: Mode,
    pub inverting: bool,
}

impl Transponder {
    pub fn new(
        name: impl Into<String>,
        downlink: (f64, f64),
        uplink: (f64, f64),
        mode: Mode,
        inverting: bool,
    ) -> Result<Self, TransponderError> {
        let name = name.into();
        let (downlink_low, downlink_high) = downlink;
        let (uplink_low, uplink_high) = uplink;

        if [downlink_low, downlink_high, uplink_low, uplink_high]
            .iter()
            .any(|f| *f < 0.0)
        {
            return Err(TransponderError::NegativeFrequency { name });
        }
        if downlink_low > downlink_high {
            return Err(TransponderError::DownlinkReversed {
                name,
                low: downlink_low,
                high: downlink_high,
            });
        }
        if uplink_low > uplink_high {
            return Err(TransponderError::UplinkReversed {
                name,
                low: uplink_low,
                high: uplink_high,
            });
        }

        Ok(Self {
            name,
            downlink_low,
            downlink_high,
            uplink_low,
            uplink_high,
            mode,
            inverting,
        })
    }

    pub fn passband_center(&self) -> f64 {
        0.5 * (self.downlink_low + self.downlink_high)
    }

    /// Receive-only satellites (beacons, telemetry) carry no uplink.
    pub fn has_uplink(&self) -> bool {
        self.uplink_low > 0.0
    }

    /// Uplink frequency that lands on `fdown` after passing through the
    /// transponder, ignoring Doppler.
    pub fn uplink_for(&self, fdown: f64) -> f64 {
        let offset = fdown - self.downlink_low;
        if self.inverting {
            self.uplink_high - offset
        } else {
            self.uplink_low + offset
        }
    }

    /// Mode for the uplink VFO given the operator's downlink mode.
    pub fn uplink_mode(&self, downlink: Mode) -> Mode {
        if !self.inverting {
            return downlink;
        }
        match downlink {
            Mode::Usb => Mode::Lsb,
            Mode::Lsb => Mode::Usb,
            Mode::Cw => Mode::CwReverse,
            Mode::CwReverse => Mode::Cw,
            Mode::Fm => Mode::Fm,
            Mode::Am => Mode::Am,
        }
    }
}
