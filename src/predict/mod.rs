pub mod error;
pub mod ground_station;
pub mod pass_finder;
pub mod propagation;
pub mod source;
pub mod tle_loader;
pub mod types;

pub use error::PredictError;
pub use ground_station::GroundStation;
pub use pass_finder::{build_pass_track, next_pass, predict_passes};
pub use propagation::observe_at;
pub use source::{DopplerSource, Sgp4Source};
pub use tle_loader::{TleEntry, TleLoader};
pub use types::{Observation, Pass, SatelliteInfo};
