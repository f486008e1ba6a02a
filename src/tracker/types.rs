use serde::{Deserialize, Serialize};
use strum_macros::{Display, IntoStaticStr};
use utoipa::ToSchema;

/// Operating mode of a VFO.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, IntoStaticStr, ToSchema,
)]
pub enum Mode {
    #[serde(rename = "USB", alias = "usb")]
    #[strum(serialize = "USB")]
    Usb,
    #[serde(rename = "LSB", alias = "lsb")]
    #[strum(serialize = "LSB")]
    Lsb,
    #[serde(rename = "CW", alias = "cw")]
    #[strum(serialize = "CW")]
    Cw,
    #[serde(rename = "CW-R", alias = "cw-r", alias = "CWR")]
    #[strum(serialize = "CW-R")]
    CwReverse,
    #[serde(rename = "FM", alias = "fm")]
    #[strum(serialize = "FM")]
    Fm,
    #[serde(rename = "AM", alias = "am")]
    #[strum(serialize = "AM")]
    Am,
}

impl Mode {
    pub fn is_cw(&self) -> bool {
        matches!(self, Mode::Cw | Mode::CwReverse)
    }

    /// Filter to request alongside this mode; CW modes use the wide filter.
    pub fn filter(&self) -> Option<Filter> {
        if self.is_cw() {
            Some(Filter::Wide)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    Narrow,
    Normal,
    Wide,
}

/// Logical VFO names as understood by the attached radio.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, IntoStaticStr, ToSchema,
)]
pub enum Vfo {
    #[strum(serialize = "VFOA")]
    A,
    #[strum(serialize = "VFOB")]
    B,
    #[strum(serialize = "Main")]
    Main,
    #[strum(serialize = "Sub")]
    Sub,
}

/// Which VFO carries the downlink and which (if any) the uplink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct VfoRoles {
    pub downlink: Vfo,
    pub uplink: Option<Vfo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AzEl {
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
}

impl AzEl {
    pub fn new(azimuth_deg: f64, elevation_deg: f64) -> Self {
        Self {
            azimuth_deg,
            elevation_deg,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SatelliteRef {
    pub name: String,
    pub norad_id: u32,
}

impl SatelliteRef {
    pub fn new(name: impl Into<String>, norad_id: u32) -> Self {
        Self {
            name: name.into(),
            norad_id,
        }
    }
}

/// Single write to the radio.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RadioCommand {
    SplitMode {
        on: bool,
    },
    SatelliteMode {
        on: bool,
    },
    SwapVfos,
    SetMode {
        vfo: Vfo,
        mode: Mode,
        filter: Option<Filter>,
    },
    SetFrequency {
        vfo: Vfo,
        hz: f64,
    },
}

/// Hardware writes produced by one controller tick, applied by the scheduler
/// in order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Radio(RadioCommand),
    Rotor(AzEl),
}
