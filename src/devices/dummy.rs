use std::collections::HashMap;

use super::{DeviceError, Radio, Rotor};
use crate::tracker::{AzEl, Filter, Mode, Vfo};

/// Radio that remembers what it was told and reads it back.
#[derive(Debug, Default, Clone)]
pub struct DummyRadio {
    pub frequencies: HashMap<Vfo, f64>,
    pub modes: HashMap<Vfo, (Mode, Option<Filter>)>,
    pub split: bool,
    pub satellite_mode: bool,
}

impl DummyRadio {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Radio for DummyRadio {
    fn is_active(&mut self) -> bool {
        true
    }

    fn frequency(&mut self, vfo: Vfo) -> Result<f64, DeviceError> {
        Ok(self.frequencies.get(&vfo).copied().unwrap_or(0.0))
    }

    fn set_frequency(&mut self, vfo: Vfo, hz: f64) -> Result<(), DeviceError> {
        log::debug!("dummy radio {} -> {:.0} Hz", vfo, hz);
        self.frequencies.insert(vfo, hz);
        Ok(())
    }

    fn set_mode(&mut self, vfo: Vfo, mode: Mode, filter: Option<Filter>) -> Result<(), DeviceError> {
        self.modes.insert(vfo, (mode, filter));
        Ok(())
    }

    fn set_split_mode(&mut self, on: bool) -> Result<(), DeviceError> {
        self.split = on;
        Ok(())
    }

    fn set_satellite_mode(&mut self, on: bool) -> Result<(), DeviceError> {
        self.satellite_mode = on;
        Ok(())
    }

    fn swap_vfos(&mut self) -> Result<(), DeviceError> {
        for (a, b) in [(Vfo::A, Vfo::B), (Vfo::Main, Vfo::Sub)] {
            let fa = self.frequencies.remove(&a);
            let fb = self.frequencies.remove(&b);
            if let Some(f) = fa {
                self.frequencies.insert(b, f);
            }
            if let Some(f) = fb {
                self.frequencies.insert(a, f);
            }
        }
        Ok(())
    }
}

/// Rotor that arrives instantly wherever it is sent.
#[derive(Debug, Clone)]
pub struct DummyRotor {
    pub position: AzEl,
}

impl Default for DummyRotor {
    fn default() -> Self {
        Self {
            position: AzEl::new(0.0, 0.0),
        }
    }
}

impl Rotor for DummyRotor {
    fn is_active(&mut self) -> bool {
        true
    }

    fn position(&mut self) -> Result<AzEl, DeviceError> {
        Ok(self.position)
    }

    fn set_position(&mut self, target: AzEl) -> Result<(), DeviceError> {
        log::debug!(
            "dummy rotor -> az {:.1} el {:.1}",
            target.azimuth_deg,
            target.elevation_deg
        );
        self.position = target;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::apply_radio;
    use crate::tracker::RadioCommand;

    #[test]
    fn swap_exchanges_vfo_pairs() {
        let mut radio = DummyRadio::new();
        radio.set_frequency(Vfo::Main, 145.9e6).unwrap();
        radio.set_frequency(Vfo::Sub, 435.0e6).unwrap();
        apply_radio(&mut radio, &RadioCommand::SwapVfos).unwrap();
        assert_eq!(radio.frequency(Vfo::Main).unwrap(), 435.0e6);
        assert_eq!(radio.frequency(Vfo::Sub).unwrap(), 145.9e6);
    }

    #[test]
    fn commands_are_remembered() {
        let mut radio = DummyRadio::new();
        apply_radio(&mut radio, &RadioCommand::SplitMode { on: true }).unwrap();
        apply_radio(
            &mut radio,
            &RadioCommand::SetMode {
                vfo: Vfo::B,
                mode: Mode::CwReverse,
                filter: Some(Filter::Wide),
            },
        )
        .unwrap();
        assert!(radio.split);
        assert_eq!(radio.modes[&Vfo::B], (Mode::CwReverse, Some(Filter::Wide)));
    }
}
