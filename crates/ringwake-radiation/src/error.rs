//! Error types for ringwake-radiation.

use ringwake_beam::BeamError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RadiationError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Beam error: {0}")]
    Beam(#[from] BeamError),
}

pub type Result<T> = std::result::Result<T, RadiationError>;
