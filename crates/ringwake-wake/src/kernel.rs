//! Sampled wake kernels.

use ringwake_beam::Particles;
use ringwake_math::C_LIGHT;
use tracing::warn;

use crate::function::WakeFunction;
use crate::series::{Series, TimeSorted};
use crate::{Result, WakeError};

/// Relative tolerance when comparing slice widths.
pub const GRID_TOL: f64 = 1e-9;

/// Momentum kick per unit source moment per unit wake: `-q² / (p0 β c)`.
pub fn kick_scale(charge: f64, p0: f64, beta: f64) -> f64 {
    -charge * charge / (p0 * beta * C_LIGHT)
}

/// [`kick_scale`] for a beam's reference particle.
pub fn kick_scale_for(beam: &Particles) -> f64 {
    kick_scale(beam.charge, beam.p0(), beam.beta())
}

/// A wake function sampled on the slice grid, with the kick scale folded in.
///
/// Sample `m` is the kick a unit source produces `m·dz` behind itself, so
/// the kernel is time-sorted and causal by construction.
#[derive(Debug, Clone)]
pub struct WakeKernel {
    samples: Series<TimeSorted>,
    dz: f64,
    truncation: f64,
}

impl WakeKernel {
    /// Sample `function` at `z = 0, -dz, …, -(n_wake-1)·dz`, multiplied by
    /// `scale`.
    pub fn sample(function: &dyn WakeFunction, dz: f64, n_wake: usize, scale: f64) -> Result<Self> {
        if !(dz > 0.0) {
            return Err(WakeError::InvalidParameter(format!(
                "kernel spacing must be positive, got {dz}"
            )));
        }
        if n_wake == 0 {
            return Err(WakeError::InvalidParameter("kernel needs at least one sample".into()));
        }

        let samples = (0..n_wake)
            .map(|m| scale * function.value(-(m as f64) * dz))
            .collect();

        let peak = function.envelope(0.0);
        let tail = function.envelope(-(n_wake as f64) * dz);
        let truncation = if peak > 0.0 { tail / peak } else { 0.0 };

        Ok(Self {
            samples: Series::new(samples),
            dz,
            truncation,
        })
    }

    /// Kernel from raw time-sorted samples (already scaled).
    pub fn from_samples(samples: Series<TimeSorted>, dz: f64) -> Self {
        Self {
            samples,
            dz,
            truncation: 0.0,
        }
    }

    pub fn samples(&self) -> &Series<TimeSorted> {
        &self.samples
    }

    pub fn dz(&self) -> f64 {
        self.dz
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Envelope at the end of the kernel relative to its peak. Anything the
    /// wake would still contribute past that point is dropped.
    pub fn truncation(&self) -> f64 {
        self.truncation
    }

    /// Returns `false` and logs a warning if the kernel was cut off while the
    /// wake was still above `tolerance` of its peak. Kicks are then biased
    /// low.
    pub fn check_depth(&self, tolerance: f64) -> bool {
        if self.truncation > tolerance {
            warn!(
                truncation = self.truncation,
                tolerance,
                n_wake = self.len(),
                "wake kernel truncated before the wake decayed"
            );
            false
        } else {
            true
        }
    }

    /// Slice spacing must match the kernel grid exactly; resampling is never
    /// attempted.
    pub fn check_grid(&self, slice_dz: f64) -> Result<()> {
        if (slice_dz - self.dz).abs() > GRID_TOL * self.dz {
            return Err(WakeError::GridMismatch {
                kernel_dz: self.dz,
                slice_dz,
            });
        }
        Ok(())
    }
}
