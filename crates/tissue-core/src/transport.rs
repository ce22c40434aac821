//! Free-flight transport step for one layer subset.
//!
//! Each selected photon jumps a distance s ~ Exp(1/mu) along a direction
//! with polar angle θ ~ U(-π/2, π/2) and azimuth φ ~ U(0, 2π). The
//! displacement is added to the previous position; path length grows by s
//! and weight decays as exp(-abs·s).

use std::f64::consts::{FRAC_PI_2, PI};

use rayon::prelude::*;
use tissue_math::variates::VariateSource;
use tissue_types::config::DisplacementModel;
use tissue_types::error::{TissueError, TissueResult};

use crate::photons::PhotonEnsemble;

/// Cartesian displacement of a step of length `step` along (θ, φ).
#[inline]
pub fn displacement(step: f64, theta: f64, phi: f64, model: DisplacementModel) -> [f64; 3] {
    let (sin_t, cos_t) = theta.sin_cos();
    let (sin_p, cos_p) = phi.sin_cos();
    let dx = step * cos_t * cos_p;
    let dy = match model {
        DisplacementModel::Azimuthal => step * cos_t * sin_p,
        DisplacementModel::MirroredXY => dx,
    };
    [dx, dy, step * sin_t]
}

fn check_coefficients(mu: f64, abs_coef: f64) -> TissueResult<()> {
    if !mu.is_finite() || mu <= 0.0 {
        return Err(TissueError::ConfigError(format!(
            "scattering coefficient must be finite and > 0, got {mu}"
        )));
    }
    if !abs_coef.is_finite() || abs_coef < 0.0 {
        return Err(TissueError::ConfigError(format!(
            "absorption coefficient must be finite and >= 0, got {abs_coef}"
        )));
    }
    Ok(())
}

/// Advance exactly the photons at `indices` by one scattering event.
///
/// Variates are drawn serially (steps, then θ, then φ) so a seeded source
/// gives reproducible results; the trigonometry runs on the rayon pool.
/// Photons not listed are left untouched.
pub fn transport_subset(
    ensemble: &mut PhotonEnsemble,
    indices: &[usize],
    mu: f64,
    abs_coef: f64,
    model: DisplacementModel,
    source: &mut dyn VariateSource,
) -> TissueResult<()> {
    check_coefficients(mu, abs_coef)?;
    let n = ensemble.len();
    if let Some(&bad) = indices.iter().find(|&&i| i >= n) {
        return Err(TissueError::ParameterOutOfRange {
            name: "photon_index",
            value: bad as f64,
            reason: "index beyond ensemble length",
        });
    }
    if indices.is_empty() {
        return Ok(());
    }

    let count = indices.len();
    let steps = source.exponential(1.0 / mu, count)?;
    let theta = source.uniform(-FRAC_PI_2, FRAC_PI_2, count)?;
    let phi = source.uniform(0.0, 2.0 * PI, count)?;

    let moves: Vec<([f64; 3], f64)> = steps
        .par_iter()
        .zip(theta.par_iter())
        .zip(phi.par_iter())
        .map(|((&s, &t), &p)| (displacement(s, t, p, model), (-abs_coef * s).exp()))
        .collect();

    for ((&i, &s), ([dx, dy, dz], attenuation)) in indices.iter().zip(&steps).zip(moves) {
        ensemble.x[i] += dx;
        ensemble.y[i] += dy;
        ensemble.z[i] += dz;
        ensemble.path_length[i] += s;
        ensemble.weight[i] *= attenuation;
    }
    Ok(())
}
