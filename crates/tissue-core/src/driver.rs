// ─────────────────────────────────────────────────────────────────────
// Tissue Scatter — Simulation Driver
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Convergence-driven transport loop with population replenishment.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tissue_math::variates::{SeededVariates, VariateSource};
use tissue_optics::coefficients::{LayerModel, TabulatedTissueModel};
use tissue_types::config::{ScatterConfig, SimulationSettings};
use tissue_types::error::TissueResult;
use tissue_types::state::{ScatterOutcome, ScatterResult, ScatteringCoefficients, Termination};

use crate::convergence::{ConvergenceGate, GateState, StopReason};
use crate::detection::{filter_in_bounds, score_detector, DetectorAccumulator};
use crate::layers::{assign_layers, Layer, LayerBoundaries};
use crate::photons::PhotonEnsemble;
use crate::transport::transport_subset;

/// Geometry and coefficients fixed for the whole run.
#[derive(Debug, Clone, Copy)]
struct RunGeometry {
    scattering: ScatteringCoefficients,
    muscle_absorption: f64,
    layers: LayerBoundaries,
    xy_bound: f64,
    z_bound: f64,
}

impl RunGeometry {
    fn layer_coefficients(&self, layer: Layer) -> (f64, f64) {
        match layer {
            Layer::Skin => (self.scattering.mu_skin, 0.0),
            Layer::Muscle => (self.scattering.mu_muscle, self.muscle_absorption),
            Layer::Bone => (self.scattering.mu_bone, 0.0),
        }
    }
}

/// One tissue configuration at one wavelength.
pub struct SimulationDriver<'a> {
    config: ScatterConfig,
    settings: SimulationSettings,
    model: &'a dyn LayerModel,
    cancel: Option<Arc<AtomicBool>>,
}

impl<'a> SimulationDriver<'a> {
    /// Validates both configurations; nothing is sampled yet.
    pub fn new(
        config: ScatterConfig,
        settings: SimulationSettings,
        model: &'a dyn LayerModel,
    ) -> TissueResult<Self> {
        config.validate()?;
        settings.validate()?;
        Ok(SimulationDriver {
            config,
            settings,
            model,
            cancel: None,
        })
    }

    /// Checked between iterations; setting it ends the run as `Cancelled`.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    fn geometry(&self) -> TissueResult<RunGeometry> {
        let wl = self.config.wavelength_nm;
        let scattering = self.model.scattering_coefficients(wl)?;
        let muscle_absorption = self.model.absorption_for(
            wl,
            self.config.concentration_blood,
            self.config.ratio_oxygen,
        )?;
        Ok(RunGeometry {
            scattering,
            muscle_absorption,
            layers: LayerBoundaries::from_config(&self.config, self.settings.depth_convention),
            xy_bound: self.settings.bound_factor * self.config.distance_to_detector_2,
            z_bound: LayerBoundaries::model_depth(&self.config),
        })
    }

    fn launch(
        &self,
        source: &mut dyn VariateSource,
        geometry: &RunGeometry,
    ) -> TissueResult<PhotonEnsemble> {
        PhotonEnsemble::seed(
            source,
            self.settings.batch_size,
            self.config.half_width,
            1.0 / geometry.scattering.mu_skin,
            self.settings.initial_weight,
        )
    }

    /// Run to a stopping condition.
    ///
    /// Algorithm:
    /// 1. Resolve coefficients (range errors surface here, before sampling)
    /// 2. Seed `batch_size` photons over the source aperture
    /// 3. Iterate until stopped or capped:
    ///    a. Compact the ensemble to the live indices
    ///    b. Classify by depth and transport skin, muscle, bone in that order
    ///    c. Drop photons outside the model volume
    ///    d. Score both detector rings
    ///    e. Evaluate the convergence gate
    ///    f. Replenish when the live count fell below the floor
    pub fn run(&self, source: &mut dyn VariateSource) -> TissueResult<ScatterOutcome> {
        let start = Instant::now();
        let cfg = &self.config;
        let settings = &self.settings;

        // 1. Coefficients and bounds
        let geometry = self.geometry()?;
        log::info!(
            "scatter start: {} nm, mu_skin={:.4}, mu_muscle={:.4}, mu_bone={:.4}, abs={:.6}",
            cfg.wavelength_nm,
            geometry.scattering.mu_skin,
            geometry.scattering.mu_muscle,
            geometry.scattering.mu_bone,
            geometry.muscle_absorption
        );

        // 2. Seeding
        let mut ensemble = self.launch(source, &geometry)?;
        let mut photons_launched = ensemble.len();
        let mut live = filter_in_bounds(
            &ensemble.x,
            &ensemble.y,
            &ensemble.z,
            geometry.xy_bound,
            geometry.z_bound,
        )?;

        let gate = ConvergenceGate::new(settings.convergence_threshold);
        let mut detector_1 = DetectorAccumulator::new();
        let mut detector_2 = DetectorAccumulator::new();
        let mut iterations = 0usize;
        let mut replenishments = 0usize;

        // 3. Iterating
        let termination = loop {
            if self.cancelled() {
                break Termination::Cancelled;
            }
            if iterations >= settings.max_iterations {
                break Termination::IterationCap;
            }
            if let Some(limit) = settings.max_wall_time_s {
                if start.elapsed().as_secs_f64() >= limit {
                    break Termination::WallClockCap;
                }
            }

            // 3a-b. Compact, classify, transport
            ensemble.compact(&live)?;
            let assignment = assign_layers(&ensemble.z, &geometry.layers);
            for layer in Layer::ORDER {
                let (mu, abs_coef) = geometry.layer_coefficients(layer);
                transport_subset(
                    &mut ensemble,
                    assignment.indices(layer),
                    mu,
                    abs_coef,
                    settings.displacement,
                    source,
                )?;
            }

            // 3c. Boundary pruning
            live = filter_in_bounds(
                &ensemble.x,
                &ensemble.y,
                &ensemble.z,
                geometry.xy_bound,
                geometry.z_bound,
            )?;

            // 3d. Scoring
            for (acc, distance) in [
                (&mut detector_1, cfg.distance_to_detector_1),
                (&mut detector_2, cfg.distance_to_detector_2),
            ] {
                acc.absorb(score_detector(
                    &ensemble.x,
                    &ensemble.y,
                    &ensemble.z,
                    &ensemble.path_length,
                    &ensemble.weight,
                    distance,
                    cfg.half_width,
                )?);
            }
            iterations += 1;

            log::debug!(
                "iteration {iterations}: live={}, d1={:.3}, d2={:.3}",
                live.len(),
                detector_1.total_weight,
                detector_2.total_weight
            );

            // 3e. Gate
            match gate.evaluate(detector_1.total_weight, detector_2.total_weight) {
                GateState::Stop(StopReason::Converged) => break Termination::Converged,
                GateState::Stop(StopReason::NoSignal) if settings.stop_on_no_signal => {
                    break Termination::NoSignal
                }
                _ => {}
            }

            // 3f. Replenishing
            if live.len() < settings.replenish_floor {
                ensemble.compact(&live)?;
                let fresh = self.launch(source, &geometry)?;
                photons_launched += fresh.len();
                ensemble.append(fresh);
                live = filter_in_bounds(
                    &ensemble.x,
                    &ensemble.y,
                    &ensemble.z,
                    geometry.xy_bound,
                    geometry.z_bound,
                )?;
                replenishments += 1;
                log::debug!("replenished to {} live photons", live.len());
            }
        };

        let result = ScatterResult {
            detected_weight_1: detector_1.total_weight,
            detected_weight_2: detector_2.total_weight,
            mean_path_length_1: detector_1.mean_path_length(),
            mean_path_length_2: detector_2.mean_path_length(),
            samples_1: detector_1.sample_count(),
            samples_2: detector_2.sample_count(),
        };
        if termination == Termination::Converged {
            log::info!(
                "scatter converged after {iterations} iterations in {:.2}s",
                start.elapsed().as_secs_f64()
            );
        } else {
            log::warn!(
                "scatter stopped without convergence ({termination}) after {iterations} iterations"
            );
        }

        Ok(ScatterOutcome {
            result,
            termination,
            iterations,
            photons_launched,
            replenishments,
        })
    }
}

/// Single run with the built-in tissue model and a source seeded from
/// `settings.seed` (OS entropy when absent).
pub fn scatter(
    config: &ScatterConfig,
    settings: &SimulationSettings,
) -> TissueResult<ScatterOutcome> {
    let model = TabulatedTissueModel::new();
    let driver = SimulationDriver::new(config.clone(), settings.clone(), &model)?;
    let mut source = SeededVariates::from_optional_seed(settings.seed);
    driver.run(&mut source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tissue_types::error::TissueError;

    fn small_settings(seed: u64) -> SimulationSettings {
        SimulationSettings {
            batch_size: 20_000,
            replenish_floor: 2_000,
            max_iterations: 40,
            seed: Some(seed),
            ..SimulationSettings::default()
        }
    }

    /// A threshold no finite run can reach.
    fn never_converging(seed: u64) -> SimulationSettings {
        SimulationSettings {
            batch_size: 2_000,
            convergence_threshold: 1e-9,
            ..small_settings(seed)
        }
    }

    #[test]
    fn test_fixed_seed_is_deterministic() {
        let cfg = ScatterConfig::reference();
        let a = scatter(&cfg, &small_settings(42)).unwrap();
        let b = scatter(&cfg, &small_settings(42)).unwrap();
        assert_eq!(a, b);
        assert!(a.iterations > 0);
        assert!(a.result.detected_weight_1 > 0.0, "detector 1 saw nothing");
    }

    #[test]
    fn test_reference_geometry_converges() {
        let outcome = scatter(&ScatterConfig::reference(), &small_settings(42)).unwrap();
        assert_eq!(outcome.termination, Termination::Converged);
        assert!(outcome.is_converged());
        assert!(outcome.iterations <= 10, "iterations={}", outcome.iterations);

        let r = outcome.clone().into_converged().unwrap();
        // Both totals clear the 1/threshold² = 1e4 gate.
        assert!(r.detected_weight_1 >= 1e4, "d1={}", r.detected_weight_1);
        assert!(r.detected_weight_2 >= 1e4, "d2={}", r.detected_weight_2);
        assert!(r.detected_weight_1 < 1e6, "d1={}", r.detected_weight_1);
        assert!(r.detected_weight_1 > r.detected_weight_2);

        let mean_1 = r.mean_path_length_1.unwrap();
        let mean_2 = r.mean_path_length_2.unwrap();
        assert!((0.05..0.2).contains(&mean_1), "mean_1={mean_1}");
        assert!((0.25..0.6).contains(&mean_2), "mean_2={mean_2}");
        assert!(r.samples_1 > 0 && r.samples_2 > 0);
    }

    #[test]
    fn test_different_seeds_differ() {
        let cfg = ScatterConfig::reference();
        let a = scatter(&cfg, &small_settings(1)).unwrap();
        let b = scatter(&cfg, &small_settings(2)).unwrap();
        assert_ne!(a.result.detected_weight_1, b.result.detected_weight_1);
    }

    #[test]
    fn test_iteration_cap_is_not_converged() {
        let settings = SimulationSettings {
            max_iterations: 5,
            ..never_converging(3)
        };
        let outcome = scatter(&ScatterConfig::reference(), &settings).unwrap();
        assert_eq!(outcome.termination, Termination::IterationCap);
        assert_eq!(outcome.iterations, 5);
        assert!(!outcome.is_converged());
        match outcome.into_converged() {
            Err(TissueError::ConvergenceNeverReached { iterations, .. }) => {
                assert_eq!(iterations, 5)
            }
            other => panic!("expected ConvergenceNeverReached, got {other:?}"),
        }
    }

    #[test]
    fn test_wall_clock_cap() {
        let settings = SimulationSettings {
            max_iterations: usize::MAX,
            max_wall_time_s: Some(1e-9),
            ..never_converging(4)
        };
        let outcome = scatter(&ScatterConfig::reference(), &settings).unwrap();
        assert_eq!(outcome.termination, Termination::WallClockCap);
    }

    #[test]
    fn test_cancellation_before_first_iteration() {
        let model = TabulatedTissueModel::new();
        let flag = Arc::new(AtomicBool::new(true));
        let driver = SimulationDriver::new(ScatterConfig::reference(), small_settings(5), &model)
            .unwrap()
            .with_cancel_flag(flag);
        let mut source = SeededVariates::from_seed(5);
        let outcome = driver.run(&mut source).unwrap();
        assert_eq!(outcome.termination, Termination::Cancelled);
        assert_eq!(outcome.iterations, 0);
        assert_eq!(outcome.result.detected_weight_1, 0.0);
        assert_eq!(outcome.result.mean_path_length_1, None);
        assert_eq!(outcome.result.samples_2, 0);
    }

    #[test]
    fn test_replenishment_every_iteration_below_floor() {
        let settings = SimulationSettings {
            max_iterations: 3,
            replenish_floor: 1_000_000,
            ..never_converging(6)
        };
        let outcome = scatter(&ScatterConfig::reference(), &settings).unwrap();
        assert_eq!(outcome.termination, Termination::IterationCap);
        assert_eq!(outcome.replenishments, 3);
        assert_eq!(outcome.photons_launched, 2_000 * 4);
    }

    #[test]
    fn test_no_replenishment_with_zero_floor() {
        let settings = SimulationSettings {
            max_iterations: 3,
            replenish_floor: 0,
            ..never_converging(7)
        };
        let outcome = scatter(&ScatterConfig::reference(), &settings).unwrap();
        assert_eq!(outcome.replenishments, 0);
        assert_eq!(outcome.photons_launched, 2_000);
    }

    #[test]
    fn test_no_signal_stops_when_enabled() {
        // Detector 2 at 2 cm cannot be reached in one free flight.
        let cfg = ScatterConfig {
            distance_to_detector_2: 2.0,
            ..ScatterConfig::reference()
        };
        let settings = SimulationSettings {
            stop_on_no_signal: true,
            ..never_converging(8)
        };
        let outcome = scatter(&cfg, &settings).unwrap();
        assert_eq!(outcome.termination, Termination::NoSignal);
        assert_eq!(outcome.iterations, 1);
        assert_eq!(outcome.result.detected_weight_2, 0.0);
        assert_eq!(outcome.result.mean_path_length_2, None);
    }

    #[test]
    fn test_out_of_range_wavelength_fails_before_transport() {
        let cfg = ScatterConfig {
            wavelength_nm: 300.0,
            ..ScatterConfig::reference()
        };
        let err = scatter(&cfg, &small_settings(9)).unwrap_err();
        assert!(err.is_range_error());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let model = TabulatedTissueModel::new();
        let cfg = ScatterConfig {
            distance_to_detector_2: 0.05,
            ..ScatterConfig::reference()
        };
        assert!(SimulationDriver::new(cfg, SimulationSettings::default(), &model).is_err());
        let settings = SimulationSettings {
            batch_size: 0,
            ..SimulationSettings::default()
        };
        assert!(SimulationDriver::new(ScatterConfig::reference(), settings, &model).is_err());
    }

    #[test]
    fn test_path_lengths_are_physical() {
        let outcome = scatter(&ScatterConfig::reference(), &small_settings(10)).unwrap();
        let r = &outcome.result;
        if let Some(mean) = r.mean_path_length_1 {
            assert!(mean > 0.0 && mean.is_finite(), "mean={mean}");
            assert!(r.samples_1 > 0);
        }
        assert!(r.detected_weight_1 >= 0.0 && r.detected_weight_2 >= 0.0);
    }
}
