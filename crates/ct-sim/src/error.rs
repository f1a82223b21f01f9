use ct_core::CtError;
use ct_spatial::SpatialError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(String),

    /// The external simulation misbehaved: error status, broken connection,
    /// undecodable reply or impossible vehicle data.
    #[error("simulation error: {0}")]
    Simulation(String),

    #[error(transparent)]
    Spatial(#[from] SpatialError),

    #[error(transparent)]
    Core(#[from] CtError),

    /// The event sink rejected a batch.
    #[error("event sink error: {0}")]
    Sink(Box<dyn std::error::Error + Send + Sync>),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SimError {
    pub(crate) fn simulation(msg: impl Into<String>) -> Self {
        SimError::Simulation(msg.into())
    }
}

pub type SimResult<T> = Result<T, SimError>;
