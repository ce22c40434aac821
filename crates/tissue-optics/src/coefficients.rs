// ─────────────────────────────────────────────────────────────────────
// Tissue Scatter — Optical Coefficients
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Scattering and absorption coefficients of skin, muscle and bone.
//!
//! Scattering follows the reduced-scattering power law
//! μ = a·(λ/500 nm)^b with per-tissue constants (Jacques, PMB 58 (2013) R37).
//! Absorption comes from tabulated molar extinction of oxy- and
//! deoxyhemoglobin, converted to 1/cm with the hemoglobin molar mass.

use tissue_math::interp::interp_linear;
use tissue_types::constants::{
    BONE_SCATTER_A, BONE_SCATTER_B, MG_PER_MOL_HEMOGLOBIN, MUSCLE_SCATTER_A, MUSCLE_SCATTER_B,
    REFERENCE_WAVELENGTH_NM, SKIN_SCATTER_A, SKIN_SCATTER_B,
};
use tissue_types::error::{TissueError, TissueResult};
use tissue_types::state::{AbsorptionCoefficients, ScatteringCoefficients};

/// Molar extinction of hemoglobin [1/(cm·M)]: (λ nm, HbO2, Hb).
const HEMOGLOBIN_EXTINCTION: [(f64, f64, f64); 29] = [
    (450.0, 68000.0, 58000.0),
    (470.0, 33200.0, 31000.0),
    (500.0, 20900.0, 20900.0),
    (520.0, 24200.0, 31600.0),
    (540.0, 53200.0, 46600.0),
    (560.0, 32600.0, 53800.0),
    (580.0, 50100.0, 37000.0),
    (590.0, 14400.0, 28300.0),
    (600.0, 3200.0, 14600.0),
    (620.0, 942.0, 6500.0),
    (640.0, 442.0, 4350.0),
    (660.0, 316.0, 3200.0),
    (680.0, 276.0, 2400.0),
    (700.0, 290.0, 1790.0),
    (720.0, 348.0, 1350.0),
    (740.0, 446.0, 1100.0),
    (760.0, 586.0, 1540.0),
    (780.0, 710.0, 1070.0),
    (800.0, 816.0, 762.0),
    (820.0, 902.0, 716.0),
    (840.0, 980.0, 692.0),
    (860.0, 1060.0, 688.0),
    (880.0, 1120.0, 688.0),
    (900.0, 1198.0, 761.0),
    (920.0, 1240.0, 786.0),
    (940.0, 1214.0, 802.0),
    (960.0, 1180.0, 740.0),
    (980.0, 1100.0, 500.0),
    (995.0, 1052.0, 372.0),
];

/// Tissue optical properties consumed by the transport engine.
pub trait LayerModel {
    fn scattering_coefficients(&self, wavelength_nm: f64) -> TissueResult<ScatteringCoefficients>;

    /// Molar extinction of deoxygenated and oxygenated hemoglobin.
    fn absorption_coefficients(&self, wavelength_nm: f64) -> TissueResult<AbsorptionCoefficients>;

    /// Blood absorption coefficient [1/cm] for a concentration and oxygen ratio.
    fn combined_absorption(
        &self,
        blood: f64,
        oxygenated_blood: f64,
        concentration: f64,
        ratio_oxygen: f64,
    ) -> f64 {
        combined_absorption(blood, oxygenated_blood, concentration, ratio_oxygen)
    }

    fn absorption_for(
        &self,
        wavelength_nm: f64,
        concentration: f64,
        ratio_oxygen: f64,
    ) -> TissueResult<f64> {
        let abs = self.absorption_coefficients(wavelength_nm)?;
        Ok(self.combined_absorption(
            abs.blood,
            abs.oxygenated_blood,
            concentration,
            ratio_oxygen,
        ))
    }
}

/// Power-law scattering for all three layers at `wavelength_nm`.
pub fn scattering_coefficients(wavelength_nm: f64) -> ScatteringCoefficients {
    let rel = wavelength_nm / REFERENCE_WAVELENGTH_NM;
    ScatteringCoefficients {
        mu_skin: SKIN_SCATTER_A * rel.powf(SKIN_SCATTER_B),
        mu_bone: BONE_SCATTER_A * rel.powf(BONE_SCATTER_B),
        mu_muscle: MUSCLE_SCATTER_A * rel.powf(MUSCLE_SCATTER_B),
    }
}

/// Beer-Lambert sum of oxy- and deoxyhemoglobin contributions [1/cm].
pub fn combined_absorption(
    blood: f64,
    oxygenated_blood: f64,
    concentration: f64,
    ratio_oxygen: f64,
) -> f64 {
    let c_oxy = concentration * ratio_oxygen;
    let c_deoxy = concentration * (1.0 - ratio_oxygen);
    c_oxy * oxygenated_blood / MG_PER_MOL_HEMOGLOBIN + c_deoxy * blood / MG_PER_MOL_HEMOGLOBIN
}

/// Built-in tabulated model.
#[derive(Debug, Clone)]
pub struct TabulatedTissueModel {
    wavelengths: Vec<f64>,
    oxygenated: Vec<f64>,
    deoxygenated: Vec<f64>,
}

impl Default for TabulatedTissueModel {
    fn default() -> Self {
        Self::new()
    }
}

impl TabulatedTissueModel {
    pub fn new() -> Self {
        TabulatedTissueModel {
            wavelengths: HEMOGLOBIN_EXTINCTION.iter().map(|r| r.0).collect(),
            oxygenated: HEMOGLOBIN_EXTINCTION.iter().map(|r| r.1).collect(),
            deoxygenated: HEMOGLOBIN_EXTINCTION.iter().map(|r| r.2).collect(),
        }
    }

    /// Custom table; wavelengths must be strictly increasing.
    pub fn from_table(
        wavelengths: Vec<f64>,
        oxygenated: Vec<f64>,
        deoxygenated: Vec<f64>,
    ) -> TissueResult<Self> {
        if wavelengths.is_empty() {
            return Err(TissueError::ConfigError(
                "absorption table must not be empty".to_string(),
            ));
        }
        for (name, col) in [("oxygenated", &oxygenated), ("deoxygenated", &deoxygenated)] {
            if col.len() != wavelengths.len() {
                return Err(TissueError::LengthMismatch {
                    name,
                    expected: wavelengths.len(),
                    found: col.len(),
                });
            }
        }
        if wavelengths.windows(2).any(|w| w[1] <= w[0]) {
            return Err(TissueError::ConfigError(
                "absorption table wavelengths must be strictly increasing".to_string(),
            ));
        }
        Ok(TabulatedTissueModel {
            wavelengths,
            oxygenated,
            deoxygenated,
        })
    }

    /// Tabulated span (min, max) in nm.
    pub fn span_nm(&self) -> (f64, f64) {
        (
            self.wavelengths[0],
            self.wavelengths[self.wavelengths.len() - 1],
        )
    }

    fn out_of_range(&self, wavelength_nm: f64) -> TissueError {
        let (min_nm, max_nm) = self.span_nm();
        TissueError::WavelengthOutOfRange {
            wavelength_nm,
            min_nm,
            max_nm,
        }
    }
}

impl LayerModel for TabulatedTissueModel {
    fn scattering_coefficients(&self, wavelength_nm: f64) -> TissueResult<ScatteringCoefficients> {
        if !wavelength_nm.is_finite() || wavelength_nm <= 0.0 {
            return Err(TissueError::ParameterOutOfRange {
                name: "wavelength_nm",
                value: wavelength_nm,
                reason: "must be finite and > 0",
            });
        }
        Ok(scattering_coefficients(wavelength_nm))
    }

    fn absorption_coefficients(&self, wavelength_nm: f64) -> TissueResult<AbsorptionCoefficients> {
        let oxygenated_blood = interp_linear(wavelength_nm, &self.wavelengths, &self.oxygenated)
            .ok_or_else(|| self.out_of_range(wavelength_nm))?;
        let blood = interp_linear(wavelength_nm, &self.wavelengths, &self.deoxygenated)
            .ok_or_else(|| self.out_of_range(wavelength_nm))?;
        Ok(AbsorptionCoefficients {
            blood,
            oxygenated_blood,
        })
    }
}
