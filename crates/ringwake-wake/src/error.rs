//! Error types for ringwake-wake.

use ringwake_beam::BeamError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WakeError {
    #[error("Over-damped resonator: Q = {q} must exceed 0.5")]
    OverDamped { q: f64 },

    #[error("Slice spacing {slice_dz} m does not match wake kernel spacing {kernel_dz} m")]
    GridMismatch { kernel_dz: f64, slice_dz: f64 },

    #[error("{what} ({length}) is not an integer multiple of the slice width {dz}")]
    NotCommensurate {
        what: &'static str,
        length: f64,
        dz: f64,
    },

    #[error("Turn {got} pushed out of order, expected turn {expected}")]
    TurnOrder { expected: u64, got: u64 },

    #[error("Wake history holds {len} turns but only {max} are retained")]
    HistoryDepth { len: usize, max: usize },

    #[error("Wake history is stale: latest turn {latest:?}, requested turn {requested}")]
    StaleHistory { latest: Option<u64>, requested: u64 },

    #[error("Wake kernel has {len} samples, history span needs {expected}")]
    KernelLength { len: usize, expected: usize },

    #[error("Slice count changed from {expected} to {got}")]
    SliceCount { expected: usize, got: usize },

    #[error("Charge in gap slot {index}: |d| = {relative:.3e} of the peak exceeds the gap tolerance")]
    ChargeInGap { index: usize, relative: f64 },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Config parse error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Beam error: {0}")]
    Beam(#[from] BeamError),
}

pub type Result<T> = std::result::Result<T, WakeError>;
