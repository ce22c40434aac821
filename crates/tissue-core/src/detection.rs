// ─────────────────────────────────────────────────────────────────────
// Tissue Scatter — Boundary Filter and Detector Scoring
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Model-volume pruning and ring-detector scoring.
//!
//! Index selection runs on the rayon pool; `collect` keeps ascending index
//! order so sums and path-length sequences are taken in a fixed order.

use rayon::prelude::*;
use tissue_types::error::{TissueError, TissueResult};

fn check_lengths(reference: usize, columns: &[(&'static str, usize)]) -> TissueResult<()> {
    for &(name, len) in columns {
        if len != reference {
            return Err(TissueError::LengthMismatch {
                name,
                expected: reference,
                found: len,
            });
        }
    }
    Ok(())
}

/// Indices with |x| ≤ xy_bound, |y| ≤ xy_bound and 0 ≤ z ≤ z_bound, ascending.
pub fn filter_in_bounds(
    x: &[f64],
    y: &[f64],
    z: &[f64],
    xy_bound: f64,
    z_bound: f64,
) -> TissueResult<Vec<usize>> {
    check_lengths(x.len(), &[("y", y.len()), ("z", z.len())])?;
    Ok((0..x.len())
        .into_par_iter()
        .filter(|&i| {
            x[i].abs() <= xy_bound && y[i].abs() <= xy_bound && z[i] >= 0.0 && z[i] <= z_bound
        })
        .collect())
}

/// Photons scored at one detector in one iteration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectorScore {
    pub total_weight: f64,
    /// Path lengths of the scored photons, in index order.
    pub path_lengths: Vec<f64>,
}

/// Score photons above the surface (z < 0) whose radius lies in
/// (distance - width, distance + width]. The inputs are not modified.
pub fn score_detector(
    x: &[f64],
    y: &[f64],
    z: &[f64],
    path_length: &[f64],
    weight: &[f64],
    distance: f64,
    width: f64,
) -> TissueResult<DetectorScore> {
    check_lengths(
        x.len(),
        &[
            ("y", y.len()),
            ("z", z.len()),
            ("path_length", path_length.len()),
            ("weight", weight.len()),
        ],
    )?;
    if distance.is_nan() || distance < 0.0 {
        return Err(TissueError::ParameterOutOfRange {
            name: "detector_distance",
            value: distance,
            reason: "must be >= 0",
        });
    }
    if width.is_nan() || width < 0.0 {
        return Err(TissueError::ParameterOutOfRange {
            name: "detector_width",
            value: width,
            reason: "must be >= 0",
        });
    }

    let inner = distance - width;
    let outer = distance + width;
    let hits: Vec<usize> = (0..x.len())
        .into_par_iter()
        .filter(|&i| {
            let r = x[i].hypot(y[i]);
            z[i] < 0.0 && r > inner && r <= outer
        })
        .collect();

    let mut score = DetectorScore {
        total_weight: 0.0,
        path_lengths: Vec::with_capacity(hits.len()),
    };
    for i in hits {
        score.total_weight += weight[i];
        score.path_lengths.push(path_length[i]);
    }
    Ok(score)
}

/// Running totals for one detector across iterations. Never shrinks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectorAccumulator {
    pub total_weight: f64,
    pub sampled_path_lengths: Vec<f64>,
}

impl DetectorAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn absorb(&mut self, score: DetectorScore) {
        self.total_weight += score.total_weight;
        self.sampled_path_lengths.extend(score.path_lengths);
    }

    /// Mean of the sampled path lengths; `None` when nothing was scored.
    pub fn mean_path_length(&self) -> Option<f64> {
        if self.sampled_path_lengths.is_empty() {
            return None;
        }
        let sum: f64 = self.sampled_path_lengths.iter().sum();
        Some(sum / self.sampled_path_lengths.len() as f64)
    }

    pub fn sample_count(&self) -> usize {
        self.sampled_path_lengths.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_reference_case() {
        let x = [1.0, 0.1, 100.0, 1.5, 0.5, 0.3];
        let y = [1.5, 0.3, 1.1, 0.7, 10.0, 0.17];
        let z = [11.0, 0.7, 1.2, 1.7, 1.8, 0.2];
        let idx = filter_in_bounds(&x, &y, &z, 1.0, 1.0).unwrap();
        assert_eq!(idx, vec![1, 5]);
    }

    #[test]
    fn test_filter_bounds_inclusive() {
        let x = [1.0, -1.0, 0.0, 0.0];
        let y = [-1.0, 1.0, 0.0, 0.0];
        let z = [0.0, 2.0, -1e-12, 2.0 + 1e-12];
        let idx = filter_in_bounds(&x, &y, &z, 1.0, 2.0).unwrap();
        assert_eq!(idx, vec![0, 1]);
    }

    #[test]
    fn test_filter_length_mismatch() {
        let err = filter_in_bounds(&[0.0, 1.0], &[0.0], &[0.0, 1.0], 1.0, 1.0).unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_filter_idempotent() {
        let x = [0.1, -0.2, 0.3];
        let y = [0.0, 0.5, -0.5];
        let z = [0.1, 0.2, 0.9];
        let idx = filter_in_bounds(&x, &y, &z, 1.0, 1.0).unwrap();
        assert_eq!(idx, vec![0, 1, 2]);
    }

    #[test]
    fn test_score_reference_case() {
        let x = [1.0, 0.1, 100.0, 1.1, 0.5, 0.3];
        let y = [1.1, 0.3, 1.1, 0.7, 10.0, 0.17];
        let z = [-11.0, -0.7, 1.2, -1.7, 1.8, 0.2];
        let weight = [1.0, 1.1, 2.0, 0.7, 0.2, 1.8];
        let path = [2.0, 1.0, 2.3, 0.9, 0.1, 2.35];
        let score = score_detector(&x, &y, &z, &path, &weight, 1.0, 0.5).unwrap();
        assert!((score.total_weight - 1.7).abs() < 1e-12);
        assert_eq!(score.path_lengths, vec![2.0, 0.9]);
    }

    #[test]
    fn test_score_ring_edges() {
        // r = 0.5 is excluded, r = 1.5 is included.
        let x = [0.5, 1.5, 1.0];
        let y = [0.0, 0.0, 0.0];
        let z = [-1.0, -1.0, 0.0];
        let w = [1.0, 2.0, 4.0];
        let p = [0.1, 0.2, 0.3];
        let score = score_detector(&x, &y, &z, &p, &w, 1.0, 0.5).unwrap();
        assert_eq!(score.total_weight, 2.0);
        assert_eq!(score.path_lengths, vec![0.2]);
    }

    #[test]
    fn test_score_validation() {
        let v = [0.0; 3];
        let short = [0.0; 2];
        for (i, cols) in [
            [&short[..], &v[..], &v[..], &v[..], &v[..]],
            [&v[..], &short[..], &v[..], &v[..], &v[..]],
            [&v[..], &v[..], &short[..], &v[..], &v[..]],
            [&v[..], &v[..], &v[..], &short[..], &v[..]],
            [&v[..], &v[..], &v[..], &v[..], &short[..]],
        ]
        .iter()
        .enumerate()
        {
            let err = score_detector(cols[0], cols[1], cols[2], cols[3], cols[4], 1.0, 0.5)
                .unwrap_err();
            assert!(err.is_configuration_error(), "column {i}");
        }
        for (d, w) in [(-1.0, 0.5), (1.0, -0.5), (-1.0, -0.5)] {
            let err = score_detector(&v, &v, &v, &v, &v, d, w).unwrap_err();
            assert!(err.is_range_error(), "d={d}, w={w}");
        }
    }

    #[test]
    fn test_accumulator() {
        let mut acc = DetectorAccumulator::new();
        assert_eq!(acc.mean_path_length(), None);
        assert_eq!(acc.sample_count(), 0);
        acc.absorb(DetectorScore {
            total_weight: 3.0,
            path_lengths: vec![1.0, 2.0],
        });
        acc.absorb(DetectorScore::default());
        acc.absorb(DetectorScore {
            total_weight: 1.5,
            path_lengths: vec![3.0],
        });
        assert_eq!(acc.total_weight, 4.5);
        assert_eq!(acc.sample_count(), 3);
        assert!((acc.mean_path_length().unwrap() - 2.0).abs() < 1e-12);
    }
}
