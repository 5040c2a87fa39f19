//! ringwake — collective wake effects and radiation damping for
//! multi-bunch beams in circular accelerators.
//!
//! This is the umbrella crate: it re-exports the sub-crates and provides the
//! [`Beamline`] trait, so a turn is a sequence of elements acting on one
//! [`Particles`] ensemble.
//!
//! # Example
//!
//! ```
//! use ringwake::{
//!     FillingScheme, Particles, RadiationDamping, Ring, Strategy, SynchrotronRadiationTransverse,
//!     UniformBinSlicer, WakeField, WakeFieldConfig, WakeSourceConfig,
//!     ringwake_math::{E_CHARGE, M_PROTON},
//! };
//!
//! let filling = FillingScheme::uniform(3, 5).unwrap();
//! let slicer = UniformBinSlicer::full_beam(20, &filling, 20.0, 20).unwrap();
//! let config = WakeFieldConfig::new(WakeSourceConfig::circular_resonator(1e6, 1e9, 50.0), slicer)
//!     .with_filling(filling)
//!     .with_turns(2)
//!     .with_strategy(Strategy::Compressed);
//!
//! let mut beam = Particles::new(300, E_CHARGE, M_PROTON, 27.7, 1e9, 20.0).unwrap();
//! let radiation = RadiationDamping::seeded(
//!     Some(SynchrotronRadiationTransverse::new(1e3, 1e3, 2e-6, 2e-6, 50.0, 50.0).unwrap()),
//!     None,
//!     1,
//! );
//!
//! let mut ring = Ring::new();
//! ring.push(WakeField::new(&config, &beam).unwrap());
//! ring.push(radiation);
//! ring.track(&mut beam, 10).unwrap();
//! assert_eq!(ring.turn(), 10);
//! ```

pub use ringwake_beam::{self, BeamError, FillingScheme, Particles, SliceSet, UniformBinSlicer};
pub use ringwake_math::{self, DVec};
pub use ringwake_radiation::{
    self, Dispersion, RadiationError, SynchrotronRadiationLongitudinal,
    SynchrotronRadiationTransverse,
};
pub use ringwake_wake::{
    self, KickKind, Strategy, WakeError, WakeField, WakeFieldConfig, WakeSourceConfig,
};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum TrackError {
    #[error("Wake error: {0}")]
    Wake(#[from] WakeError),

    #[error("Radiation error: {0}")]
    Radiation(#[from] RadiationError),
}

pub type Result<T> = std::result::Result<T, TrackError>;

/// An element acting on the beam once per turn.
pub trait Beamline {
    /// Apply the element to `beam` in place.
    fn track(&mut self, beam: &mut Particles) -> Result<()>;
}

impl Beamline for WakeField {
    fn track(&mut self, beam: &mut Particles) -> Result<()> {
        WakeField::track(self, beam)?;
        Ok(())
    }
}

/// Radiation damping element: optional transverse and longitudinal maps
/// sharing one random source.
#[derive(Debug, Clone)]
pub struct RadiationDamping<R = StdRng> {
    pub transverse: Option<SynchrotronRadiationTransverse>,
    pub longitudinal: Option<SynchrotronRadiationLongitudinal>,
    rng: R,
}

impl RadiationDamping<StdRng> {
    /// Reproducible element seeded with `seed`.
    pub fn seeded(
        transverse: Option<SynchrotronRadiationTransverse>,
        longitudinal: Option<SynchrotronRadiationLongitudinal>,
        seed: u64,
    ) -> Self {
        Self::new(transverse, longitudinal, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> RadiationDamping<R> {
    pub fn new(
        transverse: Option<SynchrotronRadiationTransverse>,
        longitudinal: Option<SynchrotronRadiationLongitudinal>,
        rng: R,
    ) -> Self {
        Self {
            transverse,
            longitudinal,
            rng,
        }
    }
}

impl<R: Rng> Beamline for RadiationDamping<R> {
    fn track(&mut self, beam: &mut Particles) -> Result<()> {
        if let Some(map) = &self.transverse {
            map.track(beam, &mut self.rng)?;
        }
        if let Some(map) = &self.longitudinal {
            map.track(beam, &mut self.rng)?;
        }
        Ok(())
    }
}

/// Ordered sequence of elements making up one turn.
#[derive(Default)]
pub struct Ring {
    elements: Vec<Box<dyn Beamline>>,
    turn: u64,
}

impl Ring {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an element; elements act in insertion order.
    pub fn push(&mut self, element: impl Beamline + 'static) {
        self.elements.push(Box::new(element));
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Turns completed.
    pub fn turn(&self) -> u64 {
        self.turn
    }

    /// One pass through every element.
    pub fn track_turn(&mut self, beam: &mut Particles) -> Result<()> {
        for element in &mut self.elements {
            element.track(beam)?;
        }
        self.turn += 1;
        Ok(())
    }

    /// `n_turns` passes.
    pub fn track(&mut self, beam: &mut Particles, n_turns: u64) -> Result<()> {
        for _ in 0..n_turns {
            self.track_turn(beam)?;
        }
        debug!(turn = self.turn, elements = self.elements.len(), "tracked");
        Ok(())
    }
}
