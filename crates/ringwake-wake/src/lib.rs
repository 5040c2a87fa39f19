//! Multi-bunch, multi-turn wakefield convolution.
//!
//! Each turn the beam is sliced, per-slice source moments are pushed into a
//! rolling [`WakeHistory`], and the history is convolved with a sampled
//! [`WakeKernel`] to give a momentum kick per slice. Four interchangeable
//! [`Strategy`] variants produce the same kicks on every bunch slot:
//! - direct summation over the current turn
//! - full zero-padded FFT
//! - FFT with the kernel chopped to the bunch windows
//! - FFT on a compressed grid that drops the empty gaps between bunches
//!
//! # Ordering
//!
//! Slice sets are z-ascending ([`HeadTail`]); convolution runs on the
//! time-sorted reversal ([`TimeSorted`], index 0 = head). The two are
//! distinct types so a series can only cross the boundary through
//! [`Series::reversed`].
//!
//! # Example
//!
//! ```
//! use ringwake_beam::{FillingScheme, Particles, UniformBinSlicer};
//! use ringwake_math::{E_CHARGE, M_PROTON};
//! use ringwake_wake::{Strategy, WakeField, WakeFieldConfig, WakeSourceConfig};
//!
//! let filling = FillingScheme::uniform(3, 5).unwrap();
//! let slicer = UniformBinSlicer::full_beam(20, &filling, 20.0, 20).unwrap();
//! let config = WakeFieldConfig::new(
//!     WakeSourceConfig::circular_resonator(1e6, 1e9, 50.0),
//!     slicer,
//! )
//! .with_filling(filling)
//! .with_strategy(Strategy::Compressed);
//!
//! let mut beam = Particles::new(100, E_CHARGE, M_PROTON, 27.7, 1e9, 20.0).unwrap();
//! let mut wake = WakeField::new(&config, &beam).unwrap();
//! wake.track(&mut beam).unwrap();
//! assert_eq!(wake.turn(), 1);
//! ```

pub mod config;
pub mod convolution;
pub mod error;
pub mod field;
pub mod function;
pub mod history;
pub mod kernel;
pub mod moments;
pub mod series;
pub mod windows;

pub use config::{WakeFieldConfig, WakeSourceConfig};
pub use convolution::{ConvolutionEngine, Strategy, direct_convolution, fft_convolution};
pub use error::{Result, WakeError};
pub use field::WakeField;
pub use function::{
    KickKind, Resonator, ResonatorParams, ResonatorWake, ResistiveWallWake, WakeComponent,
    WakeFunction, Yokoya,
};
pub use history::{HistoryLayout, WakeHistory};
pub use kernel::{WakeKernel, kick_scale, kick_scale_for};
pub use moments::{SourceMoment, source_moments};
pub use series::{HeadTail, Order, Series, TimeSorted};
pub use windows::BunchWindows;
