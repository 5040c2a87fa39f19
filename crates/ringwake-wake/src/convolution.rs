//! Causal wake convolution.
//!
//! All strategies compute, on the time-sorted grid,
//!
//! ```text
//!   kick[k] = Σ_{m=0}^{min(k, n_wake-1)} W[m] · d[k - m]
//! ```
//!
//! i.e. every slice feels the wake of itself and of everything that passed
//! before it, never of what comes after.
//!
//! | strategy     | cost                         | notes                                   |
//! |--------------|------------------------------|-----------------------------------------|
//! | `Direct`     | O(n_slices · n_wake)         | reference, computes the current turn only |
//! | `FullFft`    | O(N log N), N = history span | dense                                   |
//! | `Chopped`    | O(N log N)                   | kernel zeroed outside bunch windows     |
//! | `Compressed` | O(n_bunches · L · log)       | only bunch windows are transformed      |
//!
//! The windowed strategies agree with the dense ones on bunch slots and
//! report zero kick elsewhere.

use std::ops::Range;

use rustfft::FftPlanner;
use rustfft::num_complex::Complex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::history::WakeHistory;
use crate::kernel::WakeKernel;
use crate::series::{HeadTail, Series, TimeSorted};
use crate::windows::BunchWindows;
use crate::{Result, WakeError};

/// Default relative tolerance for charge found between bunches.
pub const DEFAULT_GAP_TOLERANCE: f64 = 1e-10;

/// Convolution algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Sliding sum over the kernel.
    Direct,
    /// One FFT over the full multi-turn grid.
    #[default]
    FullFft,
    /// FFT over the full grid with the kernel zeroed between windows.
    Chopped,
    /// FFT over the concatenated bunch windows only.
    Compressed,
}

impl Strategy {
    /// Whether the strategy needs [`BunchWindows`].
    pub fn is_windowed(&self) -> bool {
        matches!(self, Strategy::Chopped | Strategy::Compressed)
    }
}

/// Causal linear convolution `d * w`, samples `block` only, by direct sum.
pub fn direct_convolution(d: &[f64], w: &[f64], block: Range<usize>) -> Vec<f64> {
    block
        .map(|k| {
            let depth = w.len().min(k + 1);
            (0..depth).map(|m| w[m] * d[k - m]).sum::<f64>()
        })
        .collect()
}

/// Causal linear convolution `d * w` via FFT; returns the first `keep`
/// samples of the full `len(d) + len(w) - 1` result.
pub fn fft_convolution(d: &[f64], w: &[f64], keep: usize) -> Vec<f64> {
    if d.is_empty() || w.is_empty() {
        return vec![0.0; keep];
    }
    let n = d.len() + w.len() - 1;

    let mut planner = FftPlanner::<f64>::new();
    let forward = planner.plan_fft_forward(n);
    let inverse = planner.plan_fft_inverse(n);

    let to_complex = |values: &[f64]| -> Vec<Complex<f64>> {
        let mut buffer: Vec<Complex<f64>> =
            values.iter().map(|&v| Complex::new(v, 0.0)).collect();
        buffer.resize(n, Complex::new(0.0, 0.0));
        buffer
    };

    let mut fd = to_complex(d);
    let mut fw = to_complex(w);
    forward.process(&mut fd);
    forward.process(&mut fw);
    for (a, b) in fd.iter_mut().zip(&fw) {
        *a *= *b;
    }
    inverse.process(&mut fd);

    // rustfft leaves the inverse unnormalised.
    let norm = 1.0 / n as f64;
    let mut out: Vec<f64> = fd.iter().take(keep).map(|c| c.re * norm).collect();
    out.resize(keep, 0.0);
    out
}

/// Stateless wake convolution with a fixed strategy.
#[derive(Debug, Clone)]
pub struct ConvolutionEngine {
    strategy: Strategy,
    windows: Option<BunchWindows>,
    gap_tolerance: f64,
}

impl ConvolutionEngine {
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            windows: None,
            gap_tolerance: DEFAULT_GAP_TOLERANCE,
        }
    }

    /// Bunch windows, required by the chopped and compressed strategies.
    pub fn with_windows(mut self, windows: BunchWindows) -> Self {
        self.windows = Some(windows);
        self
    }

    pub fn with_gap_tolerance(mut self, tolerance: f64) -> Self {
        self.gap_tolerance = tolerance;
        self
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn windows(&self) -> Option<&BunchWindows> {
        self.windows.as_ref()
    }

    /// Kick at every point of the time-sorted grid `moments`.
    pub fn convolve(
        &self,
        moments: &Series<TimeSorted>,
        kernel: &WakeKernel,
    ) -> Result<Series<TimeSorted>> {
        let values = self.convolve_block(moments.as_slice(), kernel, 0..moments.len())?;
        Ok(Series::new(values))
    }

    /// Kicks on the current turn of `history`, head-tail order.
    ///
    /// `turn` must be the turn most recently pushed: the engine never
    /// convolves a history that does not yet contain the turn being kicked.
    pub fn kicks(
        &self,
        history: &WakeHistory,
        turn: u64,
        kernel: &WakeKernel,
    ) -> Result<Series<HeadTail>> {
        let layout = history.layout();
        if history.latest_turn() != Some(turn) {
            return Err(WakeError::StaleHistory {
                latest: history.latest_turn(),
                requested: turn,
            });
        }
        if history.len() > layout.n_turns {
            return Err(WakeError::HistoryDepth {
                len: history.len(),
                max: layout.n_turns,
            });
        }
        if kernel.len() != layout.span() {
            return Err(WakeError::KernelLength {
                len: kernel.len(),
                expected: layout.span(),
            });
        }

        let moments = history.assemble()?;
        let current = self.convolve_block(moments.as_slice(), kernel, layout.current())?;
        Ok(Series::<TimeSorted>::new(current).reversed())
    }

    fn require_windows(&self) -> Result<&BunchWindows> {
        self.windows.as_ref().ok_or_else(|| {
            WakeError::InvalidParameter(format!("{:?} convolution needs bunch windows", self.strategy))
        })
    }

    fn convolve_block(&self, d: &[f64], kernel: &WakeKernel, block: Range<usize>) -> Result<Vec<f64>> {
        if block.end > d.len() {
            return Err(WakeError::InvalidParameter(format!(
                "requested kicks up to {} on a grid of {}",
                block.end,
                d.len()
            )));
        }
        let w = kernel.samples().as_slice();

        let full = match self.strategy {
            Strategy::Direct => return Ok(direct_convolution(d, w, block)),
            Strategy::FullFft => fft_convolution(d, w, d.len()),
            Strategy::Chopped => self.chopped(d, w)?,
            Strategy::Compressed => {
                let windows = self.require_windows()?;
                if windows.is_sparse() {
                    self.compressed(d, w, windows)?
                } else {
                    warn!(
                        width = windows.width,
                        period = ?windows.period,
                        "bunch windows overlap, compressed convolution falls back to chopped"
                    );
                    self.chopped(d, w)?
                }
            }
        };
        Ok(full[block].to_vec())
    }

    fn chopped(&self, d: &[f64], w: &[f64]) -> Result<Vec<f64>> {
        let windows = self.require_windows()?;
        let mut masked = d.to_vec();
        windows.mask_gaps(&mut masked, self.gap_tolerance)?;
        let chopped = windows.chop(w);
        let mut kicks = fft_convolution(&masked, &chopped, d.len());
        windows.mask_kicks(&mut kicks);
        Ok(kicks)
    }

    fn compressed(&self, d: &[f64], w: &[f64], windows: &BunchWindows) -> Result<Vec<f64>> {
        let mut masked = d.to_vec();
        windows.mask_gaps(&mut masked, self.gap_tolerance)?;
        let d_compressed = windows.gather(&windows.to_local(&masked));
        let w_compressed = windows.gather(w);
        let kicks = fft_convolution(&d_compressed, &w_compressed, d_compressed.len());
        Ok(windows.scatter(&kicks, d.len()))
    }
}
