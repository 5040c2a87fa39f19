//! Wake functions.
//!
//! A wake function gives the field a unit source leaves behind it at
//! longitudinal separation `z` (m). Only `z <= 0` (the witness trails the
//! source) carries a wake; every model here returns 0 for `z > 0`.
//!
//! Models:
//! - [`ResonatorWake`]: single resonant mode, transverse or longitudinal
//! - [`ResistiveWallWake`]: thick-wall circular pipe, transverse

use std::f64::consts::PI;
use std::fmt::Debug;
use std::sync::Arc;

use ringwake_math::{C_LIGHT, Z0};
use serde::{Deserialize, Serialize};

use crate::{Result, WakeError};

/// A causal wake model.
pub trait WakeFunction: Debug + Send + Sync {
    /// Wake at separation `z` (m). Zero for `z > 0`.
    fn value(&self, z: f64) -> f64;

    /// Upper bound on `|value(z')|` for all `z' <= z` (z <= 0). Used to judge
    /// whether a kernel of finite depth has decayed.
    fn envelope(&self, z: f64) -> f64;
}

/// Plane and multipole order a wake component acts in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KickKind {
    /// Source `N·⟨x⟩`, kicks `xp`.
    DipoleX,
    /// Source `N·⟨y⟩`, kicks `yp`.
    DipoleY,
    /// Source `N`, kicks `xp` proportionally to the particle's `x`.
    QuadrupoleX,
    /// Source `N`, kicks `yp` proportionally to the particle's `y`.
    QuadrupoleY,
    /// Source `N`, kicks `dp`.
    Longitudinal,
}

/// One wake function bound to the kick it produces.
#[derive(Debug, Clone)]
pub struct WakeComponent {
    pub kind: KickKind,
    pub function: Arc<dyn WakeFunction>,
}

impl WakeComponent {
    pub fn new(kind: KickKind, function: Arc<dyn WakeFunction>) -> Self {
        Self { kind, function }
    }
}

/// Geometry form factors scaling the round-pipe transverse wake.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Yokoya {
    pub dipole_x: f64,
    pub dipole_y: f64,
    pub quadrupole_x: f64,
    pub quadrupole_y: f64,
}

impl Yokoya {
    /// Round chamber.
    pub fn circular() -> Self {
        Self {
            dipole_x: 1.0,
            dipole_y: 1.0,
            quadrupole_x: 0.0,
            quadrupole_y: 0.0,
        }
    }

    /// Two infinite horizontal plates.
    pub fn flat() -> Self {
        Self {
            dipole_x: PI * PI / 24.0,
            dipole_y: PI * PI / 12.0,
            quadrupole_x: -PI * PI / 24.0,
            quadrupole_y: PI * PI / 24.0,
        }
    }

    fn factors(&self) -> [(KickKind, f64); 4] {
        [
            (KickKind::DipoleX, self.dipole_x),
            (KickKind::DipoleY, self.dipole_y),
            (KickKind::QuadrupoleX, self.quadrupole_x),
            (KickKind::QuadrupoleY, self.quadrupole_y),
        ]
    }
}

impl Default for Yokoya {
    fn default() -> Self {
        Self::circular()
    }
}

/// Physical parameters of a resonant mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResonatorParams {
    /// Shunt impedance R_s (Ω, or Ω/m transverse).
    pub r_shunt: f64,
    /// Resonant frequency f_r (Hz).
    pub frequency: f64,
    /// Quality factor.
    pub q: f64,
}

impl ResonatorParams {
    pub fn new(r_shunt: f64, frequency: f64, q: f64) -> Result<Self> {
        let params = Self {
            r_shunt,
            frequency,
            q,
        };
        params.validate()?;
        Ok(params)
    }

    /// Rejects over-damped modes (Q <= 0.5), where the oscillatory form does
    /// not exist, and non-positive frequencies.
    pub fn validate(&self) -> Result<()> {
        if !(self.q > 0.5) {
            return Err(WakeError::OverDamped { q: self.q });
        }
        if !(self.frequency > 0.0) {
            return Err(WakeError::InvalidParameter(format!(
                "resonator frequency must be positive, got {}",
                self.frequency
            )));
        }
        Ok(())
    }

    /// ω_r = 2π f_r.
    pub fn omega_r(&self) -> f64 {
        2.0 * PI * self.frequency
    }

    /// Damping rate α = ω_r / 2Q (1/s).
    pub fn alpha(&self) -> f64 {
        self.omega_r() / (2.0 * self.q)
    }

    /// Shifted frequency ω̄ = √(ω_r² − α²).
    pub fn omega_bar(&self) -> f64 {
        let (omega_r, alpha) = (self.omega_r(), self.alpha());
        (omega_r * omega_r - alpha * alpha).sqrt()
    }

    /// 1/e decay length of the wake envelope, c/α (m).
    pub fn decay_length(&self) -> f64 {
        C_LIGHT / self.alpha()
    }
}

/// Time-domain wake of one resonant mode.
#[derive(Debug, Clone)]
pub struct ResonatorWake {
    params: ResonatorParams,
    longitudinal: bool,
    factor: f64,
}

impl ResonatorWake {
    /// Transverse wake scaled by a Yokoya factor.
    pub fn transverse(params: ResonatorParams, factor: f64) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            longitudinal: false,
            factor,
        })
    }

    /// Longitudinal (monopole) wake.
    pub fn longitudinal(params: ResonatorParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            longitudinal: true,
            factor: 1.0,
        })
    }

    pub fn params(&self) -> &ResonatorParams {
        &self.params
    }
}

impl WakeFunction for ResonatorWake {
    fn value(&self, z: f64) -> f64 {
        if z > 0.0 {
            return 0.0;
        }
        let p = &self.params;
        let (omega_r, alpha, omega_bar) = (p.omega_r(), p.alpha(), p.omega_bar());
        let damping = (alpha * z / C_LIGHT).exp();
        let phase = omega_bar * z / C_LIGHT;

        if self.longitudinal {
            let w = 2.0 * alpha * p.r_shunt * damping * (phase.cos() + alpha / omega_bar * phase.sin());
            // Beam-loading theorem: a particle sees half its own wake.
            if z == 0.0 { 0.5 * w } else { w }
        } else {
            self.factor * p.r_shunt * omega_r * omega_r / (p.q * omega_bar) * damping * phase.sin()
        }
    }

    fn envelope(&self, z: f64) -> f64 {
        let p = &self.params;
        let (omega_r, alpha, omega_bar) = (p.omega_r(), p.alpha(), p.omega_bar());
        let damping = (-alpha * z.abs() / C_LIGHT).exp();
        let amplitude = if self.longitudinal {
            2.0 * alpha * p.r_shunt.abs() * (1.0 + alpha / omega_bar)
        } else {
            (self.factor * p.r_shunt).abs() * omega_r * omega_r / (p.q * omega_bar)
        };
        amplitude * damping
    }
}

/// Resonator wake source: a transverse mode with Yokoya factors, optionally
/// with its longitudinal counterpart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resonator {
    pub params: ResonatorParams,
    pub yokoya: Yokoya,
    pub longitudinal: bool,
}

impl Resonator {
    /// Round-chamber resonator, transverse dipole only.
    pub fn circular(r_shunt: f64, frequency: f64, q: f64) -> Result<Self> {
        Ok(Self {
            params: ResonatorParams::new(r_shunt, frequency, q)?,
            yokoya: Yokoya::circular(),
            longitudinal: false,
        })
    }

    /// Parallel-plates resonator.
    pub fn flat(r_shunt: f64, frequency: f64, q: f64) -> Result<Self> {
        Ok(Self {
            params: ResonatorParams::new(r_shunt, frequency, q)?,
            yokoya: Yokoya::flat(),
            longitudinal: false,
        })
    }

    /// Also produce the longitudinal wake.
    pub fn with_longitudinal(mut self) -> Self {
        self.longitudinal = true;
        self
    }

    /// Expand into wake components, skipping zero Yokoya factors.
    pub fn components(&self) -> Result<Vec<WakeComponent>> {
        let mut components = Vec::new();
        for (kind, factor) in self.yokoya.factors() {
            if factor != 0.0 {
                let wake = ResonatorWake::transverse(self.params, factor)?;
                components.push(WakeComponent::new(kind, Arc::new(wake)));
            }
        }
        if self.longitudinal {
            let wake = ResonatorWake::longitudinal(self.params)?;
            components.push(WakeComponent::new(KickKind::Longitudinal, Arc::new(wake)));
        }
        Ok(components)
    }
}

/// Transverse resistive-wall wake of a round pipe in the thick-wall limit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResistiveWallWake {
    /// Pipe radius b (m).
    pub pipe_radius: f64,
    /// Pipe length L (m).
    pub pipe_length: f64,
    /// Wall conductivity σ (S/m).
    pub conductivity: f64,
    /// Separations shorter than this are clipped to it (m); the 1/√|z|
    /// singularity is not integrable on a grid.
    pub z_min: f64,
}

impl ResistiveWallWake {
    pub fn new(pipe_radius: f64, pipe_length: f64, conductivity: f64, z_min: f64) -> Result<Self> {
        for (name, value) in [
            ("pipe_radius", pipe_radius),
            ("pipe_length", pipe_length),
            ("conductivity", conductivity),
            ("z_min", z_min),
        ] {
            if !(value > 0.0) {
                return Err(WakeError::InvalidParameter(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        Ok(Self {
            pipe_radius,
            pipe_length,
            conductivity,
            z_min,
        })
    }

    /// Round-pipe dipole components (x and y).
    pub fn components(&self) -> Vec<WakeComponent> {
        let wake: Arc<dyn WakeFunction> = Arc::new(*self);
        vec![
            WakeComponent::new(KickKind::DipoleX, wake.clone()),
            WakeComponent::new(KickKind::DipoleY, wake),
        ]
    }

    fn amplitude(&self) -> f64 {
        let skin = 1.0 / (Z0 * self.conductivity);
        C_LIGHT * Z0 * self.pipe_length / (PI * self.pipe_radius.powi(3)) * (skin / PI).sqrt()
    }
}

impl WakeFunction for ResistiveWallWake {
    fn value(&self, z: f64) -> f64 {
        if z >= 0.0 {
            return 0.0;
        }
        -self.amplitude() / z.abs().max(self.z_min).sqrt()
    }

    fn envelope(&self, z: f64) -> f64 {
        self.amplitude() / z.abs().max(self.z_min).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn params() -> ResonatorParams {
        ResonatorParams::new(135e6, 1.97e9 * 0.6, 310.0).unwrap()
    }

    #[test]
    fn test_overdamped_rejected() {
        assert!(matches!(
            ResonatorParams::new(1.0, 1e9, 0.5),
            Err(WakeError::OverDamped { .. })
        ));
        assert!(ResonatorParams::new(1.0, 1e9, 0.51).is_ok());
    }

    #[test]
    fn test_transverse_resonator_formula() {
        let p = params();
        let wake = ResonatorWake::transverse(p, 1.0).unwrap();
        let z = -0.05;
        let expected = p.r_shunt * p.omega_r().powi(2) / (p.q * p.omega_bar())
            * (p.alpha() * z / C_LIGHT).exp()
            * (p.omega_bar() * z / C_LIGHT).sin();
        assert_relative_eq!(wake.value(z), expected, max_relative = 1e-14);
        assert_eq!(wake.value(0.0), 0.0);
        assert_eq!(wake.value(0.01), 0.0);
        assert!(wake.value(z).abs() <= wake.envelope(z));
    }

    #[test]
    fn test_longitudinal_beam_loading() {
        let p = params();
        let wake = ResonatorWake::longitudinal(p).unwrap();
        assert_relative_eq!(wake.value(0.0), p.alpha() * p.r_shunt, max_relative = 1e-14);
        let just_behind = wake.value(-1e-12);
        assert_relative_eq!(just_behind, 2.0 * wake.value(0.0), max_relative = 1e-6);
    }

    #[test]
    fn test_envelope_decays() {
        let p = params();
        let wake = ResonatorWake::transverse(p, 1.0).unwrap();
        let ratio = wake.envelope(-p.decay_length()) / wake.envelope(0.0);
        assert_relative_eq!(ratio, (-1.0f64).exp(), max_relative = 1e-12);
    }

    #[test]
    fn test_component_expansion() {
        let circular = Resonator::circular(1e6, 1e9, 10.0).unwrap();
        let kinds: Vec<_> = circular.components().unwrap().iter().map(|c| c.kind).collect();
        assert_eq!(kinds, vec![KickKind::DipoleX, KickKind::DipoleY]);

        let flat = Resonator::flat(1e6, 1e9, 10.0).unwrap().with_longitudinal();
        assert_eq!(flat.components().unwrap().len(), 5);
    }

    #[test]
    fn test_resistive_wall_clipped() {
        let rw = ResistiveWallWake::new(13.2e-3, 1e5, 1.0 / 7.88e-10, 1e-4).unwrap();
        assert_eq!(rw.value(0.0), 0.0);
        assert_eq!(rw.value(-1e-6), rw.value(-1e-4));
        assert!(rw.value(-1.0) < 0.0);
        assert_relative_eq!(rw.value(-4.0) / rw.value(-1.0), 0.5, max_relative = 1e-12);
    }
}
