// ─────────────────────────────────────────────────────────────────────
// Tissue Scatter — State
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use serde::{Deserialize, Serialize};

use crate::error::{TissueError, TissueResult};

/// Per-layer scattering coefficients [1/cm].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScatteringCoefficients {
    pub mu_skin: f64,
    pub mu_bone: f64,
    pub mu_muscle: f64,
}

/// Molar extinction of hemoglobin [1/(cm·M)] at one wavelength.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AbsorptionCoefficients {
    /// Deoxygenated hemoglobin.
    pub blood: f64,
    /// Oxygenated hemoglobin.
    pub oxygenated_blood: f64,
}

/// Detector totals of one simulation run.
///
/// A mean path length of `None` means no photon was scored at that detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterResult {
    pub detected_weight_1: f64,
    pub detected_weight_2: f64,
    pub mean_path_length_1: Option<f64>,
    pub mean_path_length_2: Option<f64>,
    pub samples_1: usize,
    pub samples_2: usize,
}

/// Why the driver loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// Both detectors reached the relative-noise target.
    Converged,
    /// A detector had zero accumulated weight when the gate was evaluated.
    NoSignal,
    IterationCap,
    WallClockCap,
    Cancelled,
}

impl Termination {
    pub fn as_str(&self) -> &'static str {
        match self {
            Termination::Converged => "converged",
            Termination::NoSignal => "no_signal",
            Termination::IterationCap => "iteration_cap",
            Termination::WallClockCap => "wall_clock_cap",
            Termination::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for Termination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Driver output: the (possibly partial) result plus run bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterOutcome {
    pub result: ScatterResult,
    pub termination: Termination,
    pub iterations: usize,
    pub photons_launched: usize,
    pub replenishments: usize,
}

impl ScatterOutcome {
    pub fn is_converged(&self) -> bool {
        self.termination == Termination::Converged
    }

    /// Unwrap the result, treating every non-converged ending as an error.
    pub fn into_converged(self) -> TissueResult<ScatterResult> {
        if self.is_converged() {
            Ok(self.result)
        } else {
            Err(TissueError::ConvergenceNeverReached {
                termination: self.termination.to_string(),
                iterations: self.iterations,
            })
        }
    }
}
