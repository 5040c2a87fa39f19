//! Beam-side collaborators of the wake engine.
//!
//! - [`Particles`]: macroparticle coordinate arrays plus the scalar beam
//!   properties (charge, mass, energy, intensity per macroparticle)
//! - [`FillingScheme`]: which RF buckets hold a bunch
//! - [`UniformBinSlicer`] / [`SliceSet`]: equally spaced longitudinal bins
//!   with per-slice population and centroids
//!
//! Longitudinal convention: the head of the beam has the largest `z`. Bucket
//! `b` is centred at `z = -b * bucket_length`.

pub mod error;
pub mod filling;
pub mod particles;
pub mod slicing;

pub use error::{BeamError, Result};
pub use filling::FillingScheme;
pub use particles::Particles;
pub use slicing::{SliceSet, UniformBinSlicer};
