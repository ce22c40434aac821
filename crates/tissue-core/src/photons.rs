//! Structure-of-arrays photon population.
//!
//! Membership is positional: index `i` is live iff it is present in the
//! ensemble. Removing photons means building a compacted ensemble from the
//! surviving indices.

use tissue_math::variates::VariateSource;
use tissue_types::error::{TissueError, TissueResult};

/// Live photon packets. All five columns always have the same length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhotonEnsemble {
    /// Lateral position [cm].
    pub x: Vec<f64>,
    /// Lateral position [cm].
    pub y: Vec<f64>,
    /// Depth [cm]; z < 0 is the half-space above the skin.
    pub z: Vec<f64>,
    /// Distance travelled since emission [cm].
    pub path_length: Vec<f64>,
    /// Surviving amplitude after absorption.
    pub weight: Vec<f64>,
}

impl PhotonEnsemble {
    /// Build from explicit columns, checking the equal-length invariant.
    pub fn from_columns(
        x: Vec<f64>,
        y: Vec<f64>,
        z: Vec<f64>,
        path_length: Vec<f64>,
        weight: Vec<f64>,
    ) -> TissueResult<Self> {
        let n = x.len();
        for (name, len) in [
            ("y", y.len()),
            ("z", z.len()),
            ("path_length", path_length.len()),
            ("weight", weight.len()),
        ] {
            if len != n {
                return Err(TissueError::LengthMismatch {
                    name,
                    expected: n,
                    found: len,
                });
            }
        }
        Ok(PhotonEnsemble {
            x,
            y,
            z,
            path_length,
            weight,
        })
    }

    /// Emit `count` photons over the square source aperture.
    ///
    /// x, y ~ U(-half_width, half_width), z ~ Exp(depth_scale),
    /// path length 0, weight `initial_weight`.
    pub fn seed(
        source: &mut dyn VariateSource,
        count: usize,
        half_width: f64,
        depth_scale: f64,
        initial_weight: f64,
    ) -> TissueResult<Self> {
        if !initial_weight.is_finite() || initial_weight <= 0.0 {
            return Err(TissueError::ParameterOutOfRange {
                name: "initial_weight",
                value: initial_weight,
                reason: "must be finite and > 0",
            });
        }
        let x = source.uniform(-half_width, half_width, count)?;
        let y = source.uniform(-half_width, half_width, count)?;
        let z = source.exponential(depth_scale, count)?;
        Ok(PhotonEnsemble {
            x,
            y,
            z,
            path_length: vec![0.0; count],
            weight: vec![initial_weight; count],
        })
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// New ensemble holding `indices` in the given order.
    ///
    /// Panics if an index is out of range; callers pass indices produced by
    /// a scan of this same ensemble.
    pub fn select(&self, indices: &[usize]) -> Self {
        let pick = |col: &[f64]| indices.iter().map(|&i| col[i]).collect::<Vec<f64>>();
        PhotonEnsemble {
            x: pick(&self.x),
            y: pick(&self.y),
            z: pick(&self.z),
            path_length: pick(&self.path_length),
            weight: pick(&self.weight),
        }
    }

    /// Replace `self` with the subset at `indices`, preserving relative order.
    pub fn compact(&mut self, indices: &[usize]) -> TissueResult<()> {
        let n = self.len();
        if let Some(&bad) = indices.iter().find(|&&i| i >= n) {
            return Err(TissueError::ParameterOutOfRange {
                name: "photon_index",
                value: bad as f64,
                reason: "index beyond ensemble length",
            });
        }
        if indices.len() == n && indices.iter().enumerate().all(|(k, &i)| k == i) {
            return Ok(());
        }
        *self = self.select(indices);
        Ok(())
    }

    /// Append another population after the current photons.
    pub fn append(&mut self, mut other: PhotonEnsemble) {
        self.x.append(&mut other.x);
        self.y.append(&mut other.y);
        self.z.append(&mut other.z);
        self.path_length.append(&mut other.path_length);
        self.weight.append(&mut other.weight);
    }

    pub fn total_weight(&self) -> f64 {
        self.weight.iter().sum()
    }

    pub(crate) fn columns_consistent(&self) -> bool {
        let n = self.x.len();
        self.y.len() == n
            && self.z.len() == n
            && self.path_length.len() == n
            && self.weight.len() == n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tissue_math::variates::SeededVariates;

    fn small() -> PhotonEnsemble {
        PhotonEnsemble::from_columns(
            vec![0.0, 1.0, 2.0, 3.0],
            vec![10.0, 11.0, 12.0, 13.0],
            vec![0.1, 0.2, 0.3, 0.4],
            vec![1.0, 2.0, 3.0, 4.0],
            vec![100.0, 90.0, 80.0, 70.0],
        )
        .unwrap()
    }

    #[test]
    fn test_seed_distribution() {
        let mut src = SeededVariates::from_seed(11);
        let e = PhotonEnsemble::seed(&mut src, 50_000, 0.05, 1.0 / 31.0, 100.0).unwrap();
        assert_eq!(e.len(), 50_000);
        assert!(e.columns_consistent());
        assert!(e.x.iter().chain(e.y.iter()).all(|v| v.abs() <= 0.05));
        assert!(e.z.iter().all(|&z| z >= 0.0));
        assert!(e.path_length.iter().all(|&p| p == 0.0));
        assert!(e.weight.iter().all(|&w| w == 100.0));
        let mean_z = e.z.iter().sum::<f64>() / e.len() as f64;
        assert!((mean_z - 1.0 / 31.0).abs() < 0.002, "mean_z = {mean_z}");
    }

    #[test]
    fn test_seed_rejects_bad_parameters() {
        let mut src = SeededVariates::from_seed(0);
        assert!(PhotonEnsemble::seed(&mut src, 10, 0.05, 0.0, 100.0).is_err());
        assert!(PhotonEnsemble::seed(&mut src, 10, 0.0, 0.1, 100.0).is_err());
        assert!(PhotonEnsemble::seed(&mut src, 10, 0.05, 0.1, -1.0).is_err());
    }

    #[test]
    fn test_from_columns_mismatch() {
        let err = PhotonEnsemble::from_columns(
            vec![0.0; 3],
            vec![0.0; 3],
            vec![0.0; 2],
            vec![0.0; 3],
            vec![0.0; 3],
        )
        .unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_select_preserves_order() {
        let e = small();
        let s = e.select(&[3, 1]);
        assert_eq!(s.x, vec![3.0, 1.0]);
        assert_eq!(s.y, vec![13.0, 11.0]);
        assert_eq!(s.weight, vec![70.0, 90.0]);
        assert!(s.columns_consistent());
    }

    #[test]
    fn test_compact() {
        let mut e = small();
        e.compact(&[0, 2]).unwrap();
        assert_eq!(e.len(), 2);
        assert_eq!(e.z, vec![0.1, 0.3]);
        assert_eq!(e.path_length, vec![1.0, 3.0]);

        let mut e = small();
        e.compact(&[]).unwrap();
        assert!(e.is_empty());

        let mut e = small();
        assert!(e.compact(&[0, 4]).is_err());
        assert_eq!(e.len(), 4);
    }

    #[test]
    fn test_compact_identity_is_noop() {
        let mut e = small();
        let before = e.clone();
        e.compact(&[0, 1, 2, 3]).unwrap();
        assert_eq!(e, before);
    }

    #[test]
    fn test_append() {
        let mut e = small();
        e.append(small());
        assert_eq!(e.len(), 8);
        assert!(e.columns_consistent());
        assert_eq!(e.x[4], 0.0);
        assert!((e.total_weight() - 2.0 * 340.0).abs() < 1e-12);
    }
}
