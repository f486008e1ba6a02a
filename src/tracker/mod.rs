pub mod catalog;
pub mod controller;
mod countdown;
mod error;
pub mod frequency;
pub mod pass_track;
pub mod rotor;
mod selection;
pub mod transponder;
#[allow(clippy::module_inception)]
mod tracker;
mod types;

pub use catalog::{CatalogError, TransponderCatalog};
pub use controller::{ControllerSettings, RigModel, TrackerStatus, TrackingController};
pub use error::TrackerError;
pub use frequency::DOPPLER_REFERENCE_HZ;
pub use pass_track::{PassTrack, TrackPoint};
pub use rotor::{simulate_pass, RotorPolicy, RotorState};
pub use selection::{Selector, TRACK_STEP_SECONDS};
pub use tracker::{lock, Devices, SharedController, Tracker};
pub use transponder::Transponder;
pub use types::{AzEl, Filter, Mode, RadioCommand, SatelliteRef, Vfo};
