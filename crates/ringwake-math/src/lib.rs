//! Array aliases, physical constants and grid arithmetic shared by the
//! ringwake crates.
//!
//! All quantities are SI. Particle coordinate arrays are nalgebra dynamic
//! vectors so that whole-ensemble updates read as vector arithmetic.

use nalgebra as na;

/// Dynamic vector (one entry per macroparticle).
pub type DVec = na::DVector<f64>;

/// Speed of light in vacuum (m/s).
pub const C_LIGHT: f64 = 299_792_458.0;
/// Elementary charge (C).
pub const E_CHARGE: f64 = 1.602_176_634e-19;
/// Proton rest mass (kg).
pub const M_PROTON: f64 = 1.672_621_923_69e-27;
/// Electron rest mass (kg).
pub const M_ELECTRON: f64 = 9.109_383_701_5e-31;
/// Characteristic impedance of vacuum (Ω).
pub const Z0: f64 = 376.730_313_668;

/// Relative tolerance used when a ratio of lengths must be an integer.
pub const COMMENSURATE_TOL: f64 = 1e-6;

/// Greatest common divisor. `gcd(0, n) == n`.
pub fn gcd(mut a: usize, mut b: usize) -> usize {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// Returns `length / step` rounded to the nearest integer if the ratio is
/// integral within [`COMMENSURATE_TOL`], `None` otherwise.
pub fn commensurate(length: f64, step: f64) -> Option<usize> {
    if !(step > 0.0) || !(length >= 0.0) {
        return None;
    }
    let ratio = length / step;
    let rounded = ratio.round();
    if (ratio - rounded).abs() <= COMMENSURATE_TOL * rounded.max(1.0) {
        Some(rounded as usize)
    } else {
        None
    }
}

/// Relativistic β from γ.
#[inline]
pub fn beta_from_gamma(gamma: f64) -> f64 {
    (1.0 - 1.0 / (gamma * gamma)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_gcd() {
        assert_eq!(gcd(0, 7), 7);
        assert_eq!(gcd(12, 18), 6);
        assert_eq!(gcd(5, 20), 5);
        assert_eq!(gcd(9, 4), 1);
    }

    #[test]
    fn test_commensurate() {
        let bucket = 26658.883 / 35640.0;
        let dz = bucket / 100.0;
        assert_eq!(commensurate(20.0 * bucket, dz), Some(2000));
        assert_eq!(commensurate(1.0, 0.3), None);
        assert_eq!(commensurate(1.0, 0.0), None);
    }

    #[test]
    fn test_beta_from_gamma() {
        assert_relative_eq!(beta_from_gamma(1.0), 0.0);
        let gamma = 7000.0;
        assert_relative_eq!(beta_from_gamma(gamma), 1.0, epsilon = 1e-7);
    }
}
