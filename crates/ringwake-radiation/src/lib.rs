//! Synchrotron radiation damping.
//!
//! Two independent per-turn maps acting directly on the macroparticle
//! arrays, each a linear damping term plus Gaussian quantum excitation:
//!
//! ```text
//!   p' = p·(1 - 2/τ) + 2σ·√(1/τ)·N(0, 1)
//! ```
//!
//! Damping times are in turns. The random source is passed in by the caller,
//! so a seeded `StdRng` makes a run reproducible.

pub mod error;
pub mod longitudinal;
pub mod transverse;

pub use error::{RadiationError, Result};
pub use longitudinal::{Dispersion, SynchrotronRadiationLongitudinal};
pub use transverse::SynchrotronRadiationTransverse;

use rand::Rng;
use rand_distr::StandardNormal;
use ringwake_math::DVec;

/// Damp `values` towards zero with time constant `tau` and add excitation
/// keeping the equilibrium spread at `sigma`.
pub(crate) fn damp_and_excite<R: Rng + ?Sized>(values: &mut DVec, tau: f64, sigma: f64, rng: &mut R) {
    let damping = 1.0 - 2.0 / tau;
    let excitation = 2.0 * sigma * (1.0 / tau).sqrt();
    for v in values.iter_mut() {
        let noise: f64 = rng.sample(StandardNormal);
        *v = *v * damping + excitation * noise;
    }
}

pub(crate) fn positive(name: &str, value: f64) -> Result<()> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(RadiationError::InvalidParameter(format!(
            "{name} must be positive, got {value}"
        )))
    }
}
