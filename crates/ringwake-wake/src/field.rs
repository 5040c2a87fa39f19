//! Turn-by-turn wake field element.

use ringwake_beam::{Particles, SliceSet, UniformBinSlicer};
use tracing::debug;

use crate::config::WakeFieldConfig;
use crate::convolution::ConvolutionEngine;
use crate::function::{KickKind, WakeComponent};
use crate::history::{HistoryLayout, WakeHistory};
use crate::kernel::{WakeKernel, kick_scale_for};
use crate::moments::source_moments;
use crate::series::{HeadTail, Series};
use crate::windows::BunchWindows;
use crate::Result;

#[derive(Debug, Clone)]
struct ComponentState {
    kind: KickKind,
    kernel: WakeKernel,
    history: WakeHistory,
}

/// Slices the beam, records its moments and applies the resulting wake
/// kicks, once per call to [`WakeField::track`].
///
/// Kernels are sampled once at construction using the reference particle of
/// the beam passed to [`WakeField::new`].
#[derive(Debug, Clone)]
pub struct WakeField {
    slicer: UniformBinSlicer,
    layout: HistoryLayout,
    engine: ConvolutionEngine,
    components: Vec<ComponentState>,
    next_turn: u64,
    last_kicks: Vec<(KickKind, Series<HeadTail>)>,
}

impl WakeField {
    /// Build the wake source described by `config.wake`.
    pub fn new(config: &WakeFieldConfig, beam: &Particles) -> Result<Self> {
        let components = config.wake.components()?;
        Self::with_components(config, components, beam)
    }

    /// Use explicit components instead of `config.wake`.
    pub fn with_components(
        config: &WakeFieldConfig,
        components: Vec<WakeComponent>,
        beam: &Particles,
    ) -> Result<Self> {
        config.validate()?;
        beam.validate()?;

        let slicer = config.slicer.clone();
        let layout = HistoryLayout::for_slicer(&slicer, config.n_turns_wake)?;

        let mut engine =
            ConvolutionEngine::new(config.strategy).with_gap_tolerance(config.gap_tolerance);
        if config.strategy.is_windowed() {
            engine = engine.with_windows(BunchWindows::from_layout(
                &slicer,
                &config.filling,
                &layout,
            )?);
        }

        let dz = slicer.dz();
        let scale = kick_scale_for(beam);
        let components = components
            .into_iter()
            .map(|component| {
                let kernel =
                    WakeKernel::sample(component.function.as_ref(), dz, layout.span(), scale)?;
                kernel.check_depth(config.depth_tolerance);
                Ok(ComponentState {
                    kind: component.kind,
                    kernel,
                    history: WakeHistory::new(layout),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            n_components = components.len(),
            n_slices = layout.n_slices,
            n_wake = layout.span(),
            strategy = ?config.strategy,
            "wake field ready"
        );

        Ok(Self {
            slicer,
            layout,
            engine,
            components,
            next_turn: 0,
            last_kicks: Vec::new(),
        })
    }

    /// Apply one turn of wake kicks to `beam`.
    pub fn track(&mut self, beam: &mut Particles) -> Result<()> {
        let slices = self.slicer.slice(beam)?;
        for component in &self.components {
            component.kernel.check_grid(slices.dz)?;
        }

        let turn = self.next_turn;
        for component in &mut self.components {
            let moments = source_moments(&slices, component.kind.into());
            component.history.push(turn, moments)?;
        }
        self.next_turn = turn + 1;

        let kicks = self
            .components
            .iter()
            .map(|c| Ok((c.kind, self.engine.kicks(&c.history, turn, &c.kernel)?)))
            .collect::<Result<Vec<_>>>()?;

        for (kind, k) in &kicks {
            apply_kicks(*kind, k, &slices, beam);
        }

        debug!(
            turn,
            within_cuts = slices.particles_within_cuts(),
            strategy = ?self.engine.strategy(),
            "applied wake kicks"
        );
        self.last_kicks = kicks;
        Ok(())
    }

    /// Turns tracked so far.
    pub fn turn(&self) -> u64 {
        self.next_turn
    }

    /// Per-slice kicks of the last tracked turn, head-tail order.
    pub fn last_kicks(&self) -> &[(KickKind, Series<HeadTail>)] {
        &self.last_kicks
    }

    pub fn kernel(&self, kind: KickKind) -> Option<&WakeKernel> {
        self.components
            .iter()
            .find(|c| c.kind == kind)
            .map(|c| &c.kernel)
    }

    pub fn slicer(&self) -> &UniformBinSlicer {
        &self.slicer
    }

    pub fn layout(&self) -> &HistoryLayout {
        &self.layout
    }

    pub fn engine(&self) -> &ConvolutionEngine {
        &self.engine
    }
}

fn apply_kicks(kind: KickKind, kicks: &Series<HeadTail>, slices: &SliceSet, beam: &mut Particles) {
    for (p, slice) in slices.slice_index_of_particle.iter().enumerate() {
        let Some(s) = *slice else { continue };
        let k = kicks[s];
        match kind {
            KickKind::DipoleX => beam.xp[p] += k,
            KickKind::DipoleY => beam.yp[p] += k,
            KickKind::QuadrupoleX => beam.xp[p] += k * beam.x[p],
            KickKind::QuadrupoleY => beam.yp[p] += k * beam.y[p],
            KickKind::Longitudinal => beam.dp[p] += k,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WakeSourceConfig;
    use crate::convolution::Strategy;
    use crate::WakeError;
    use approx::assert_relative_eq;
    use ringwake_beam::FillingScheme;
    use ringwake_math::{DVec, E_CHARGE, M_PROTON};

    /// Two particles per bucket at the bucket centre, offset by 1 mm.
    fn beam(filling: &FillingScheme, bucket_length: f64) -> Particles {
        let z: Vec<f64> = filling
            .buckets
            .iter()
            .flat_map(|&b| [-(b as f64) * bucket_length; 2])
            .collect();
        let n = z.len();
        Particles::new(n, E_CHARGE, M_PROTON, 27.7, 1e10, 20.0)
            .unwrap()
            .with_coordinates(
                DVec::from_element(n, 1e-3),
                DVec::zeros(n),
                DVec::zeros(n),
                DVec::zeros(n),
                DVec::from_vec(z),
                DVec::zeros(n),
            )
            .unwrap()
    }

    fn config(filling: &FillingScheme, strategy: Strategy) -> WakeFieldConfig {
        let slicer = UniformBinSlicer::full_beam(10, filling, 20.0, 20).unwrap();
        WakeFieldConfig::new(WakeSourceConfig::circular_resonator(1e6, 1e9, 50.0), slicer)
            .with_filling(filling.clone())
            .with_strategy(strategy)
    }

    #[test]
    fn test_track_kicks_trailing_bunches_only() {
        let filling = FillingScheme::uniform(3, 2).unwrap();
        let mut b = beam(&filling, 1.0);
        let mut wake = WakeField::new(&config(&filling, Strategy::Direct), &b).unwrap();
        wake.track(&mut b).unwrap();
        assert_eq!(wake.turn(), 1);

        // Bunch at bucket 0 leads: nothing ahead of it, and its own slice is
        // hit only by the zero-separation sample, sin(0) = 0.
        assert_eq!(b.xp[0], 0.0);
        assert!(b.xp[2] != 0.0);
        assert!(b.xp[4] != 0.0);
        assert_eq!(b.yp.iter().filter(|v| **v != 0.0).count(), 0);
        assert_eq!(wake.last_kicks().len(), 2);
    }

    #[test]
    fn test_strategies_agree_on_beam() {
        let filling = FillingScheme::uniform(3, 2).unwrap();
        let mut reference = beam(&filling, 1.0);
        WakeField::new(&config(&filling, Strategy::Direct), &reference)
            .unwrap()
            .track(&mut reference)
            .unwrap();

        for strategy in [Strategy::FullFft, Strategy::Chopped, Strategy::Compressed] {
            let mut b = beam(&filling, 1.0);
            WakeField::new(&config(&filling, strategy), &b)
                .unwrap()
                .track(&mut b)
                .unwrap();
            let floor = 1e-12 * reference.xp.amax();
            for p in 0..b.macroparticle_number() {
                assert_relative_eq!(b.xp[p], reference.xp[p], epsilon = floor, max_relative = 1e-9);
            }
        }
    }

    #[test]
    fn test_multi_turn_needs_commensurate_ring() {
        let filling = FillingScheme::single();
        let b = beam(&filling, 1.0);
        let slicer = UniformBinSlicer::new(10, (-0.5, 0.5), 20.05, 20).unwrap();
        let config =
            WakeFieldConfig::new(WakeSourceConfig::circular_resonator(1e6, 1e9, 50.0), slicer)
                .with_turns(2);
        assert!(matches!(
            WakeField::new(&config, &b),
            Err(WakeError::NotCommensurate { .. })
        ));
    }

    #[test]
    fn test_kernel_sized_to_history() {
        let filling = FillingScheme::single();
        let b = beam(&filling, 1.0);
        let wake = WakeField::new(&config(&filling, Strategy::FullFft).with_turns(3), &b).unwrap();
        // 10 slices per bucket, 20 buckets per turn.
        assert_eq!(wake.layout().stride, 200);
        assert_eq!(wake.kernel(KickKind::DipoleX).unwrap().len(), 2 * 200 + 10);
        assert!(wake.kernel(KickKind::Longitudinal).is_none());
    }

    #[test]
    fn test_quadrupole_and_longitudinal_kicks() {
        let filling = FillingScheme::uniform(2, 1).unwrap();
        let mut b = beam(&filling, 1.0);
        let wake_config = config(&filling, Strategy::Direct);
        let components = WakeSourceConfig::Resonator {
            r_shunt: 1e6,
            frequency: 1e9,
            q: 50.0,
            yokoya: crate::function::Yokoya::flat(),
            longitudinal: true,
        }
        .components()
        .unwrap();
        let mut wake = WakeField::with_components(&wake_config, components, &b).unwrap();
        wake.track(&mut b).unwrap();

        let kinds: Vec<_> = wake.last_kicks().iter().map(|(k, _)| *k).collect();
        assert!(kinds.contains(&KickKind::QuadrupoleX));
        assert!(kinds.contains(&KickKind::Longitudinal));
        // Every particle feels its own bunch's longitudinal wake at z = 0.
        assert!(b.dp.iter().all(|v| *v != 0.0));
    }
}
