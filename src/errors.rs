// Tracker Errors
// Failure modes of everything around the propagator (the propagator itself never fails)

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Satellite already tracked: {0}")]
    DuplicateSatellite(String),

    #[error("Unknown satellite: {0}")]
    UnknownSatellite(String),

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidConfig { key: String, value: String },

    #[error("Unable to decode mock satellite data: {0}")]
    MockData(#[from] serde_json::Error),

    #[error("Simulation loop could not be started: {0}")]
    SimulationSpawn(#[from] std::io::Error),
}

impl PartialEq for TrackerError {
    fn eq(&self, other: &Self) -> bool {
        use TrackerError::*;
        match (self, other) {
            (DuplicateSatellite(a), DuplicateSatellite(b)) => a == b,
            (UnknownSatellite(a), UnknownSatellite(b)) => a == b,
            (
                InvalidConfig { key: ka, value: va },
                InvalidConfig { key: kb, value: vb },
            ) => ka == kb && va == vb,

            // Not comparable: equal when same variant
            (MockData(_), MockData(_)) => true,
            (SimulationSpawn(_), SimulationSpawn(_)) => true,

            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, TrackerError>;
