mod dummy;
mod hamlib;

pub use dummy::{DummyRadio, DummyRotor};
pub use hamlib::{RigctldRadio, RotctldRotor};

use thiserror::Error;

use crate::tracker::{AzEl, Filter, Mode, RadioCommand, Vfo};

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("device i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("device unavailable: {0}")]
    Unavailable(String),
    #[error("command `{command}` rejected with code {code}")]
    Rejected { command: String, code: i32 },
    #[error("unexpected reply: {0}")]
    Parse(String),
}

/// Transceiver with one or two VFOs.
pub trait Radio: Send {
    /// Whether the radio can be talked to right now.
    fn is_active(&mut self) -> bool;
    fn frequency(&mut self, vfo: Vfo) -> Result<f64, DeviceError>;
    fn set_frequency(&mut self, vfo: Vfo, hz: f64) -> Result<(), DeviceError>;
    fn set_mode(&mut self, vfo: Vfo, mode: Mode, filter: Option<Filter>) -> Result<(), DeviceError>;
    fn set_split_mode(&mut self, on: bool) -> Result<(), DeviceError>;
    fn set_satellite_mode(&mut self, on: bool) -> Result<(), DeviceError>;
    fn swap_vfos(&mut self) -> Result<(), DeviceError>;
}

/// Azimuth/elevation antenna rotor.
pub trait Rotor: Send {
    fn is_active(&mut self) -> bool;
    fn position(&mut self) -> Result<AzEl, DeviceError>;
    fn set_position(&mut self, target: AzEl) -> Result<(), DeviceError>;
}

pub fn apply_radio(radio: &mut dyn Radio, command: &RadioCommand) -> Result<(), DeviceError> {
    match command {
        RadioCommand::SplitMode { on } => radio.set_split_mode(*on),
        RadioCommand::SatelliteMode { on } => radio.set_satellite_mode(*on),
        RadioCommand::SwapVfos => radio.swap_vfos(),
        RadioCommand::SetMode { vfo, mode, filter } => radio.set_mode(*vfo, *mode, *filter),
        RadioCommand::SetFrequency { vfo, hz } => radio.set_frequency(*vfo, *hz),
    }
}
