//! Wake field configuration.
//!
//! Loadable from JSON:
//!
//! ```json
//! {
//!   "wake": { "type": "resonator", "r_shunt": 135e6, "frequency": 1.182e9, "q": 310 },
//!   "n_turns_wake": 3,
//!   "slicer": { "n_slices": 1100, "z_cuts": [-10.5, 0.5], "circumference": 20.0, "h_bunch": 20 },
//!   "filling": { "buckets": [0, 5, 10] },
//!   "strategy": "compressed"
//! }
//! ```

use ringwake_beam::{FillingScheme, UniformBinSlicer};
use serde::{Deserialize, Serialize};

use crate::convolution::{DEFAULT_GAP_TOLERANCE, Strategy};
use crate::function::{Resonator, ResonatorParams, ResistiveWallWake, WakeComponent, Yokoya};
use crate::{Result, WakeError};

/// Default envelope ratio above which a truncated kernel is reported.
pub const DEFAULT_DEPTH_TOLERANCE: f64 = 1e-3;

/// Wake source model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WakeSourceConfig {
    Resonator {
        r_shunt: f64,
        frequency: f64,
        q: f64,
        #[serde(default)]
        yokoya: Yokoya,
        #[serde(default)]
        longitudinal: bool,
    },
    ResistiveWall {
        pipe_radius: f64,
        pipe_length: f64,
        conductivity: f64,
        z_min: f64,
    },
}

impl WakeSourceConfig {
    /// Round-chamber resonator, transverse only.
    pub fn circular_resonator(r_shunt: f64, frequency: f64, q: f64) -> Self {
        WakeSourceConfig::Resonator {
            r_shunt,
            frequency,
            q,
            yokoya: Yokoya::circular(),
            longitudinal: false,
        }
    }

    /// Expand into wake components.
    pub fn components(&self) -> Result<Vec<WakeComponent>> {
        match *self {
            WakeSourceConfig::Resonator {
                r_shunt,
                frequency,
                q,
                yokoya,
                longitudinal,
            } => Resonator {
                params: ResonatorParams::new(r_shunt, frequency, q)?,
                yokoya,
                longitudinal,
            }
            .components(),
            WakeSourceConfig::ResistiveWall {
                pipe_radius,
                pipe_length,
                conductivity,
                z_min,
            } => Ok(ResistiveWallWake::new(pipe_radius, pipe_length, conductivity, z_min)?
                .components()),
        }
    }
}

fn default_turns() -> usize {
    1
}

fn default_gap_tolerance() -> f64 {
    DEFAULT_GAP_TOLERANCE
}

fn default_depth_tolerance() -> f64 {
    DEFAULT_DEPTH_TOLERANCE
}

/// Everything a [`crate::WakeField`] needs besides the beam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WakeFieldConfig {
    pub wake: WakeSourceConfig,
    /// Turns of wake memory, including the current turn.
    #[serde(default = "default_turns")]
    pub n_turns_wake: usize,
    pub slicer: UniformBinSlicer,
    #[serde(default = "FillingScheme::single")]
    pub filling: FillingScheme,
    #[serde(default)]
    pub strategy: Strategy,
    /// Largest gap moment, relative to the peak, that windowed strategies
    /// silently drop.
    #[serde(default = "default_gap_tolerance")]
    pub gap_tolerance: f64,
    /// Kernel tail envelope, relative to the peak, above which truncation is
    /// reported.
    #[serde(default = "default_depth_tolerance")]
    pub depth_tolerance: f64,
}

impl WakeFieldConfig {
    /// Single-turn, single-bunch, full-FFT configuration.
    pub fn new(wake: WakeSourceConfig, slicer: UniformBinSlicer) -> Self {
        Self {
            wake,
            n_turns_wake: default_turns(),
            slicer,
            filling: FillingScheme::single(),
            strategy: Strategy::default(),
            gap_tolerance: DEFAULT_GAP_TOLERANCE,
            depth_tolerance: DEFAULT_DEPTH_TOLERANCE,
        }
    }

    pub fn with_turns(mut self, n_turns_wake: usize) -> Self {
        self.n_turns_wake = n_turns_wake;
        self
    }

    pub fn with_filling(mut self, filling: FillingScheme) -> Self {
        self.filling = filling;
        self
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_gap_tolerance(mut self, gap_tolerance: f64) -> Self {
        self.gap_tolerance = gap_tolerance;
        self
    }

    pub fn with_depth_tolerance(mut self, depth_tolerance: f64) -> Self {
        self.depth_tolerance = depth_tolerance;
        self
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_turns_wake == 0 {
            return Err(WakeError::InvalidParameter("n_turns_wake must be at least 1".into()));
        }
        if !(self.gap_tolerance >= 0.0) {
            return Err(WakeError::InvalidParameter(format!(
                "gap_tolerance must be non-negative, got {}",
                self.gap_tolerance
            )));
        }
        if !(self.depth_tolerance >= 0.0) {
            return Err(WakeError::InvalidParameter(format!(
                "depth_tolerance must be non-negative, got {}",
                self.depth_tolerance
            )));
        }
        self.slicer.validate()?;
        self.filling.validate()?;
        Ok(())
    }
}
