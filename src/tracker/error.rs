use thiserror::Error;

use crate::predict::PredictError;
use crate::tracker::catalog::CatalogError;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("tracker already running")]
    AlreadyRunning,
    #[error("unknown satellite: {0}")]
    UnknownSatellite(String),
    #[error("no satellite selected")]
    NoSession,
    #[error("no upcoming pass for {0}")]
    NoPass(String),
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("predict error: {0}")]
    Predict(#[from] PredictError),
}
