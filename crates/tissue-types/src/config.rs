// ─────────────────────────────────────────────────────────────────────
// Tissue Scatter — Config
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BATCH_SIZE, DEFAULT_BOUND_FACTOR, DEFAULT_CONVERGENCE_THRESHOLD,
    DEFAULT_INITIAL_WEIGHT, DEFAULT_MAX_ITERATIONS, DEFAULT_REPLENISH_FLOOR,
};
use crate::error::{TissueError, TissueResult};

/// Top-level run configuration: tissue/geometry input plus engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub scatter: ScatterConfig,
    #[serde(default)]
    pub simulation: SimulationSettings,
}

/// One simulation input: a single wavelength and tissue configuration.
/// Lengths in cm, wavelength in nm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterConfig {
    #[serde(alias = "wavelength")]
    pub wavelength_nm: f64,
    #[serde(alias = "distanceTo1", alias = "distanceToDetector1")]
    pub distance_to_detector_1: f64,
    #[serde(alias = "distanceTo2", alias = "distanceToDetector2")]
    pub distance_to_detector_2: f64,
    /// Half-width of the source aperture and of both detector rings.
    #[serde(alias = "halfWidth")]
    pub half_width: f64,
    #[serde(alias = "thicknessSkin")]
    pub thickness_skin: f64,
    #[serde(alias = "thicknessMuscle")]
    pub thickness_muscle: f64,
    #[serde(alias = "thicknessBone")]
    pub thickness_bone: f64,
    /// Hemoglobin concentration, in the units the absorption model expects.
    #[serde(alias = "concentrationBlood")]
    pub concentration_blood: f64,
    /// Oxygenated fraction of hemoglobin (0-1).
    #[serde(alias = "ratioOxygen", alias = "ratio")]
    pub ratio_oxygen: f64,
}

impl ScatterConfig {
    /// Forearm-like reference geometry at 660 nm.
    pub fn reference() -> Self {
        ScatterConfig {
            wavelength_nm: 660.0,
            distance_to_detector_1: 0.1,
            distance_to_detector_2: 0.3,
            half_width: 0.05,
            thickness_skin: 0.05,
            thickness_muscle: 1.0,
            thickness_bone: 3.0,
            concentration_blood: 0.150,
            ratio_oxygen: 0.9,
        }
    }

    /// Reject inputs that would make the transport meaningless.
    pub fn validate(&self) -> TissueResult<()> {
        if !self.wavelength_nm.is_finite() || self.wavelength_nm <= 0.0 {
            return Err(TissueError::ConfigError(format!(
                "wavelength must be finite and > 0, got {}",
                self.wavelength_nm
            )));
        }
        for (name, value) in [
            ("distance_to_detector_1", self.distance_to_detector_1),
            ("distance_to_detector_2", self.distance_to_detector_2),
            ("half_width", self.half_width),
            ("thickness_skin", self.thickness_skin),
            ("thickness_muscle", self.thickness_muscle),
            ("thickness_bone", self.thickness_bone),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(TissueError::ParameterOutOfRange {
                    name,
                    value,
                    reason: "must be finite and > 0",
                });
            }
        }
        if self.distance_to_detector_2 <= self.distance_to_detector_1 {
            return Err(TissueError::ConfigError(format!(
                "detector 2 ({}) must be farther than detector 1 ({})",
                self.distance_to_detector_2, self.distance_to_detector_1
            )));
        }
        if !self.concentration_blood.is_finite() || self.concentration_blood < 0.0 {
            return Err(TissueError::ParameterOutOfRange {
                name: "concentration_blood",
                value: self.concentration_blood,
                reason: "must be finite and >= 0",
            });
        }
        if !(0.0..=1.0).contains(&self.ratio_oxygen) {
            return Err(TissueError::ParameterOutOfRange {
                name: "ratio_oxygen",
                value: self.ratio_oxygen,
                reason: "must lie in [0, 1]",
            });
        }
        Ok(())
    }
}

/// How the layer thickness fields map onto depth boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthConvention {
    /// Each field is a layer thickness; boundaries are running sums.
    #[default]
    Thickness,
    /// Muscle and bone fields are absolute depths of the layer bottoms.
    /// Leaves unclassified gaps for most geometries; kept for comparison runs.
    Cumulative,
}

/// Lateral decomposition of a free-flight step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplacementModel {
    /// dx = s·cosθ·cosφ, dy = s·cosθ·sinφ.
    #[default]
    Azimuthal,
    /// dy = dx = s·cosθ·cosφ. Walks stay on the x = y diagonal.
    #[serde(rename = "mirrored_xy")]
    MirroredXY,
}

/// Engine knobs independent of the tissue being simulated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSettings {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_replenish_floor")]
    pub replenish_floor: usize,
    #[serde(default = "default_initial_weight")]
    pub initial_weight: f64,
    #[serde(default = "default_convergence_threshold")]
    pub convergence_threshold: f64,
    #[serde(default = "default_bound_factor")]
    pub bound_factor: f64,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    /// Optional wall-clock budget in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_wall_time_s: Option<f64>,
    /// Seed for the variate stream; OS entropy when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(default)]
    pub depth_convention: DepthConvention,
    #[serde(default)]
    pub displacement: DisplacementModel,
    /// End the run as soon as either detector total is zero after an
    /// iteration. Off by default: a detector is normally dark for the first
    /// few iterations while photons diffuse out to its radius.
    #[serde(default)]
    pub stop_on_no_signal: bool,
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}
fn default_replenish_floor() -> usize {
    DEFAULT_REPLENISH_FLOOR
}
fn default_initial_weight() -> f64 {
    DEFAULT_INITIAL_WEIGHT
}
fn default_convergence_threshold() -> f64 {
    DEFAULT_CONVERGENCE_THRESHOLD
}
fn default_bound_factor() -> f64 {
    DEFAULT_BOUND_FACTOR
}
fn default_max_iterations() -> usize {
    DEFAULT_MAX_ITERATIONS
}

impl Default for SimulationSettings {
    fn default() -> Self {
        SimulationSettings {
            batch_size: default_batch_size(),
            replenish_floor: default_replenish_floor(),
            initial_weight: default_initial_weight(),
            convergence_threshold: default_convergence_threshold(),
            bound_factor: default_bound_factor(),
            max_iterations: default_max_iterations(),
            max_wall_time_s: None,
            seed: None,
            depth_convention: DepthConvention::default(),
            displacement: DisplacementModel::default(),
            stop_on_no_signal: false,
        }
    }
}

impl SimulationSettings {
    pub fn validate(&self) -> TissueResult<()> {
        if self.batch_size == 0 {
            return Err(TissueError::ConfigError(
                "batch_size must be > 0".to_string(),
            ));
        }
        if self.max_iterations == 0 {
            return Err(TissueError::ConfigError(
                "max_iterations must be > 0".to_string(),
            ));
        }
        for (name, value) in [
            ("initial_weight", self.initial_weight),
            ("convergence_threshold", self.convergence_threshold),
            ("bound_factor", self.bound_factor),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(TissueError::ParameterOutOfRange {
                    name,
                    value,
                    reason: "must be finite and > 0",
                });
            }
        }
        if let Some(limit) = self.max_wall_time_s {
            if !limit.is_finite() || limit <= 0.0 {
                return Err(TissueError::ParameterOutOfRange {
                    name: "max_wall_time_s",
                    value: limit,
                    reason: "must be finite and > 0",
                });
            }
        }
        Ok(())
    }
}

impl RunConfig {
    /// Load from a JSON file.
    pub fn from_file(path: &str) -> TissueResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        Ok(config)
    }

    pub fn validate(&self) -> TissueResult<()> {
        self.scatter.validate()?;
        self.simulation.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    /// CARGO_MANIFEST_DIR points to crates/tissue-types/, the workspace root
    /// is two levels up.
    fn project_root() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("..").join("..")
    }

    fn config_path(relative: &str) -> String {
        project_root().join(relative).to_string_lossy().to_string()
    }

    #[test]
    fn test_load_default_run_config() {
        let cfg = RunConfig::from_file(&config_path("configs/default_run.json")).unwrap();
        assert!((cfg.scatter.wavelength_nm - 660.0).abs() < 1e-12);
        assert!((cfg.scatter.distance_to_detector_2 - 0.3).abs() < 1e-12);
        assert_eq!(cfg.simulation.batch_size, 5_000_000);
        assert_eq!(cfg.simulation.replenish_floor, 100_000);
        assert_eq!(cfg.simulation.depth_convention, DepthConvention::Thickness);
        cfg.validate().unwrap();
    }

    #[test]
    fn test_request_field_aliases() {
        let body = r#"{
            "wavelength": 940,
            "distanceTo1": 0.1,
            "distanceTo2": 0.3,
            "halfWidth": 0.05,
            "thicknessSkin": 0.05,
            "thicknessMuscle": 1,
            "thicknessBone": 3,
            "concentrationBlood": 0.15,
            "ratio": 0.7
        }"#;
        let cfg: ScatterConfig = serde_json::from_str(body).unwrap();
        assert!((cfg.wavelength_nm - 940.0).abs() < 1e-12);
        assert!((cfg.ratio_oxygen - 0.7).abs() < 1e-12);
        cfg.validate().unwrap();
    }

    #[test]
    fn test_settings_defaults_when_missing() {
        let json = r#"{ "scatter": {
            "wavelength_nm": 660, "distance_to_detector_1": 0.1,
            "distance_to_detector_2": 0.3, "half_width": 0.05,
            "thickness_skin": 0.05, "thickness_muscle": 1.0, "thickness_bone": 3.0,
            "concentration_blood": 0.15, "ratio_oxygen": 0.9 } }"#;
        let cfg: RunConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.simulation, SimulationSettings::default());
        assert!(cfg.simulation.seed.is_none());
        assert_eq!(cfg.simulation.displacement, DisplacementModel::Azimuthal);
    }

    #[test]
    fn test_validate_rejects_bad_geometry() {
        let mut cfg = ScatterConfig::reference();
        cfg.distance_to_detector_2 = 0.05;
        assert!(cfg.validate().unwrap_err().is_configuration_error());

        let mut cfg = ScatterConfig::reference();
        cfg.half_width = -0.05;
        assert!(cfg.validate().unwrap_err().is_range_error());

        let mut cfg = ScatterConfig::reference();
        cfg.ratio_oxygen = 1.2;
        assert!(cfg.validate().is_err());

        let mut cfg = ScatterConfig::reference();
        cfg.wavelength_nm = f64::NAN;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_settings() {
        let mut s = SimulationSettings::default();
        s.validate().unwrap();
        s.batch_size = 0;
        assert!(s.validate().is_err());

        let mut s = SimulationSettings::default();
        s.convergence_threshold = 0.0;
        assert!(s.validate().is_err());

        let mut s = SimulationSettings::default();
        s.max_wall_time_s = Some(-1.0);
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_roundtrip_serialization() {
        let cfg = RunConfig {
            scatter: ScatterConfig::reference(),
            simulation: SimulationSettings {
                seed: Some(7),
                depth_convention: DepthConvention::Cumulative,
                displacement: DisplacementModel::MirroredXY,
                ..SimulationSettings::default()
            },
        };
        let json = serde_json::to_string_pretty(&cfg).unwrap();
        assert!(json.contains("\"cumulative\""));
        assert!(json.contains("\"mirrored_xy\""));
        let cfg2: RunConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg.scatter, cfg2.scatter);
        assert_eq!(cfg.simulation, cfg2.simulation);
    }

    #[test]
    fn test_displacement_model_names() {
        let parsed: DisplacementModel = serde_json::from_str("\"mirrored_xy\"").unwrap();
        assert_eq!(parsed, DisplacementModel::MirroredXY);
        let parsed: DisplacementModel = serde_json::from_str("\"azimuthal\"").unwrap();
        assert_eq!(parsed, DisplacementModel::Azimuthal);
        assert!(serde_json::from_str::<DisplacementModel>("\"mirrored_x_y\"").is_err());
    }

    #[test]
    fn test_threshold_survives_json_exactly() {
        let settings = SimulationSettings {
            convergence_threshold: 0.24865287565437313,
            ..SimulationSettings::default()
        };
        let json = serde_json::to_string(&settings).unwrap();
        let back: SimulationSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(
            back.convergence_threshold.to_bits(),
            settings.convergence_threshold.to_bits()
        );
    }
}
