//! Error types for ringwake-beam.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BeamError {
    #[error("Coordinate array '{name}' has length {len}, expected {expected}")]
    LengthMismatch {
        name: &'static str,
        len: usize,
        expected: usize,
    },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Filling scheme has no occupied buckets")]
    EmptyFilling,

    #[error("{what} ({length}) is not an integer multiple of {step}")]
    NotCommensurate {
        what: &'static str,
        length: f64,
        step: f64,
    },
}

pub type Result<T> = std::result::Result<T, BeamError>;
