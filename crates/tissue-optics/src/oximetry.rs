//! Three-wavelength oxygen-ratio estimate from detector ratios.
//!
//! Works on finished [`ScatterResult`]s; the transport engine itself is
//! single-wavelength.

use crate::coefficients::LayerModel;
use tissue_types::error::{TissueError, TissueResult};
use tissue_types::state::ScatterResult;

/// Near/far detected-weight ratio of one run.
pub fn detector_ratio(result: &ScatterResult) -> TissueResult<f64> {
    let positive = |w: f64| w.is_finite() && w > 0.0;
    if !positive(result.detected_weight_1) || !positive(result.detected_weight_2) {
        return Err(TissueError::ParameterOutOfRange {
            name: "detected_weight",
            value: result.detected_weight_1.min(result.detected_weight_2),
            reason: "both detectors need a positive signal",
        });
    }
    Ok(result.detected_weight_1 / result.detected_weight_2)
}

/// Attenuation differences (ln(R1/R2), ln(R1/R3)) between three wavelengths.
pub fn attenuation_differences(results: &[ScatterResult; 3]) -> TissueResult<(f64, f64)> {
    let r1 = detector_ratio(&results[0])?;
    let r2 = detector_ratio(&results[1])?;
    let r3 = detector_ratio(&results[2])?;
    Ok(((r1 / r2).ln(), (r1 / r3).ln()))
}

/// Oxygenated hemoglobin fraction from two attenuation differences.
pub fn estimate_oxygen_ratio<M: LayerModel + ?Sized>(
    alpha12: f64,
    alpha13: f64,
    wavelengths_nm: [f64; 3],
    model: &M,
) -> TissueResult<f64> {
    let a1 = model.absorption_coefficients(wavelengths_nm[0])?;
    let a2 = model.absorption_coefficients(wavelengths_nm[1])?;
    let a3 = model.absorption_coefficients(wavelengths_nm[2])?;

    let (d1, d2, d3) = (a1.blood, a2.blood, a3.blood);
    let (o1, o2, o3) = (
        a1.oxygenated_blood,
        a2.oxygenated_blood,
        a3.oxygenated_blood,
    );

    let top = alpha12 * (d3 + d1) - alpha13 * (d1 + d2);
    let bottom = alpha13 * (o1 - o2 + d1 - d2) - alpha12 * (o1 + o3 - d1 - d3);
    if bottom == 0.0 || !bottom.is_finite() {
        return Err(TissueError::ParameterOutOfRange {
            name: "ratio_denominator",
            value: bottom,
            reason: "wavelength triple is degenerate for these attenuations",
        });
    }

    let ratio = (top / bottom).abs();
    if !(0.0..=1.0).contains(&ratio) {
        return Err(TissueError::ParameterOutOfRange {
            name: "ratio_oxygen",
            value: ratio,
            reason: "estimate outside [0, 1]",
        });
    }
    Ok(ratio)
}

/// Oxygen ratio and hemoglobin concentration recovered from one
/// three-wavelength measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BloodEstimate {
    pub ratio_oxygen: f64,
    pub concentration_blood: f64,
}

/// Oxygen ratio plus the hemoglobin concentration implied by it and the
/// first attenuation difference.
///
/// The concentration is undefined at the end points of the ratio, so a ratio
/// of exactly 0 or 1 is rejected along with a zero `alpha12`.
pub fn estimate_blood_composition<M: LayerModel + ?Sized>(
    alpha12: f64,
    alpha13: f64,
    wavelengths_nm: [f64; 3],
    model: &M,
) -> TissueResult<BloodEstimate> {
    let ratio = estimate_oxygen_ratio(alpha12, alpha13, wavelengths_nm, model)?;
    if alpha12 == 0.0 {
        return Err(TissueError::ParameterOutOfRange {
            name: "alpha12",
            value: alpha12,
            reason: "concentration needs a non-zero attenuation difference",
        });
    }
    if ratio == 0.0 || ratio == 1.0 {
        return Err(TissueError::ParameterOutOfRange {
            name: "ratio_oxygen",
            value: ratio,
            reason: "concentration is undefined at a ratio of 0 or 1",
        });
    }

    let a1 = model.absorption_coefficients(wavelengths_nm[0])?;
    let a2 = model.absorption_coefficients(wavelengths_nm[1])?;
    let a3 = model.absorption_coefficients(wavelengths_nm[2])?;
    let concentration = (a2.oxygenated_blood / ratio + a1.blood / (1.0 - ratio)
        - a3.oxygenated_blood / ratio
        + a3.blood / (1.0 - ratio))
        / alpha12;
    Ok(BloodEstimate {
        ratio_oxygen: ratio,
        concentration_blood: concentration,
    })
}
