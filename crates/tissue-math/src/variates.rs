// ─────────────────────────────────────────────────────────────────────
// Tissue Scatter — Variate Sources
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Bulk random variate generation.
//!
//! The transport engine draws millions of step lengths and angles per
//! iteration, so the interface is vector-at-a-time. Sources are passed
//! explicitly; there is no process-wide generator.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Exp, Uniform};
use tissue_types::error::{TissueError, TissueResult};

/// Bulk sampler for the two distributions the engine needs.
pub trait VariateSource {
    /// `count` i.i.d. draws from Uniform[low, high).
    fn uniform(&mut self, low: f64, high: f64, count: usize) -> TissueResult<Vec<f64>>;

    /// `count` i.i.d. draws from an exponential distribution with mean `scale`.
    fn exponential(&mut self, scale: f64, count: usize) -> TissueResult<Vec<f64>>;
}

fn check_uniform_bounds(low: f64, high: f64) -> TissueResult<()> {
    if !low.is_finite() || !high.is_finite() {
        return Err(TissueError::ConfigError(format!(
            "uniform bounds must be finite, got [{low}, {high})"
        )));
    }
    if low >= high {
        return Err(TissueError::ConfigError(format!(
            "uniform bounds must satisfy low < high, got [{low}, {high})"
        )));
    }
    Ok(())
}

fn check_exponential_scale(scale: f64) -> TissueResult<()> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(TissueError::ConfigError(format!(
            "exponential scale must be finite and > 0, got {scale}"
        )));
    }
    Ok(())
}

/// `StdRng`-backed source. Reproducible when built from a seed.
#[derive(Debug, Clone)]
pub struct SeededVariates {
    rng: StdRng,
}

impl SeededVariates {
    pub fn from_seed(seed: u64) -> Self {
        SeededVariates {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Seeded from OS entropy; not reproducible.
    pub fn from_entropy() -> Self {
        SeededVariates {
            rng: StdRng::from_entropy(),
        }
    }

    /// Seeded when `seed` is given, entropy otherwise.
    pub fn from_optional_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(s) => Self::from_seed(s),
            None => Self::from_entropy(),
        }
    }
}

impl VariateSource for SeededVariates {
    fn uniform(&mut self, low: f64, high: f64, count: usize) -> TissueResult<Vec<f64>> {
        check_uniform_bounds(low, high)?;
        let dist = Uniform::new(low, high);
        Ok(dist.sample_iter(&mut self.rng).take(count).collect())
    }

    fn exponential(&mut self, scale: f64, count: usize) -> TissueResult<Vec<f64>> {
        check_exponential_scale(scale)?;
        let dist = Exp::new(1.0 / scale).map_err(|e| TissueError::ConfigError(e.to_string()))?;
        Ok(dist.sample_iter(&mut self.rng).take(count).collect())
    }
}
