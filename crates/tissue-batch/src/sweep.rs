// ─────────────────────────────────────────────────────────────────────
// Tissue Scatter — Parameter Sweep
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Wavelength × concentration × oxygen-ratio grid scans.
//!
//! Every grid point is an independent simulation. Points run on the rayon
//! pool; with a configured seed, point `k` (row-major flat index) uses
//! `seed + k`, so a sweep is reproducible regardless of scheduling.

use std::fs::File;
use std::path::Path;

use ndarray::{Array1, Array4, ArrayView1, Ix1, Ix4, OwnedRepr};
use ndarray_npy::{NpzReader, NpzWriter};
use rayon::prelude::*;
use tissue_core::driver::SimulationDriver;
use tissue_math::interp::linspace;
use tissue_math::variates::SeededVariates;
use tissue_optics::coefficients::TabulatedTissueModel;
use tissue_types::config::{ScatterConfig, SimulationSettings};
use tissue_types::error::{TissueError, TissueResult};
use tissue_types::state::ScatterOutcome;

/// Number of values stored per grid point.
pub const SWEEP_COLUMNS: usize = 10;

pub const COL_WAVELENGTH: usize = 0;
pub const COL_CONCENTRATION: usize = 1;
pub const COL_RATIO: usize = 2;
pub const COL_WEIGHT_1: usize = 3;
pub const COL_WEIGHT_2: usize = 4;
/// NaN when detector 1 scored nothing; check `COL_SAMPLES_1`.
pub const COL_MEAN_PATH_1: usize = 5;
pub const COL_MEAN_PATH_2: usize = 6;
pub const COL_SAMPLES_1: usize = 7;
pub const COL_SAMPLES_2: usize = 8;
/// 1.0 when the run converged, 0.0 otherwise.
pub const COL_CONVERGED: usize = 9;

/// Axes of a sweep. Each axis needs at least one value.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepGrid {
    pub wavelengths_nm: Vec<f64>,
    pub concentrations: Vec<f64>,
    pub ratios: Vec<f64>,
}

impl SweepGrid {
    /// Evenly spaced axes, endpoints included.
    pub fn linear(
        wavelengths_nm: (f64, f64, usize),
        concentrations: (f64, f64, usize),
        ratios: (f64, f64, usize),
    ) -> Self {
        SweepGrid {
            wavelengths_nm: linspace(wavelengths_nm.0, wavelengths_nm.1, wavelengths_nm.2),
            concentrations: linspace(concentrations.0, concentrations.1, concentrations.2),
            ratios: linspace(ratios.0, ratios.1, ratios.2),
        }
    }

    /// Wavelength scan at fixed concentration and ratio.
    pub fn spectrum(
        start_nm: f64,
        end_nm: f64,
        steps: usize,
        concentration: f64,
        ratio: f64,
    ) -> Self {
        SweepGrid {
            wavelengths_nm: linspace(start_nm, end_nm, steps),
            concentrations: vec![concentration],
            ratios: vec![ratio],
        }
    }

    /// Oxygen-ratio scan at fixed wavelength and concentration.
    pub fn oxygen_ratio(
        start: f64,
        end: f64,
        steps: usize,
        wavelength_nm: f64,
        concentration: f64,
    ) -> Self {
        SweepGrid {
            wavelengths_nm: vec![wavelength_nm],
            concentrations: vec![concentration],
            ratios: linspace(start, end, steps),
        }
    }

    /// Blood-concentration scan at fixed wavelength and ratio.
    pub fn concentration(
        start: f64,
        end: f64,
        steps: usize,
        wavelength_nm: f64,
        ratio: f64,
    ) -> Self {
        SweepGrid {
            wavelengths_nm: vec![wavelength_nm],
            concentrations: linspace(start, end, steps),
            ratios: vec![ratio],
        }
    }

    pub fn shape(&self) -> (usize, usize, usize) {
        (
            self.wavelengths_nm.len(),
            self.concentrations.len(),
            self.ratios.len(),
        )
    }

    pub fn len(&self) -> usize {
        let (a, b, c) = self.shape();
        a * b * c
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// (wavelength, concentration, ratio) at a row-major flat index.
    pub fn point(&self, flat: usize) -> (f64, f64, f64) {
        let (_, nc, nr) = self.shape();
        let i = flat / (nc * nr);
        let j = (flat / nr) % nc;
        let k = flat % nr;
        (self.wavelengths_nm[i], self.concentrations[j], self.ratios[k])
    }

    fn validate(&self) -> TissueResult<()> {
        for (name, axis) in [
            ("wavelengths_nm", &self.wavelengths_nm),
            ("concentrations", &self.concentrations),
            ("ratios", &self.ratios),
        ] {
            if axis.is_empty() {
                return Err(TissueError::ConfigError(format!(
                    "sweep axis '{name}' has no values"
                )));
            }
        }
        Ok(())
    }
}

/// Sweep results laid out as `[wavelength, concentration, ratio, column]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepTable {
    pub data: Array4<f64>,
    pub wavelengths_nm: Array1<f64>,
    pub concentrations: Array1<f64>,
    pub ratios: Array1<f64>,
}

impl SweepTable {
    fn from_outcomes(grid: &SweepGrid, outcomes: &[ScatterOutcome]) -> Self {
        let (nw, nc, nr) = grid.shape();
        let mut data = Array4::<f64>::zeros((nw, nc, nr, SWEEP_COLUMNS));
        for (flat, outcome) in outcomes.iter().enumerate() {
            let (wl, conc, ratio) = grid.point(flat);
            let (i, j, k) = (flat / (nc * nr), (flat / nr) % nc, flat % nr);
            let r = &outcome.result;
            let row = [
                wl,
                conc,
                ratio,
                r.detected_weight_1,
                r.detected_weight_2,
                r.mean_path_length_1.unwrap_or(f64::NAN),
                r.mean_path_length_2.unwrap_or(f64::NAN),
                r.samples_1 as f64,
                r.samples_2 as f64,
                if outcome.is_converged() { 1.0 } else { 0.0 },
            ];
            for (c, v) in row.into_iter().enumerate() {
                data[[i, j, k, c]] = v;
            }
        }
        SweepTable {
            data,
            wavelengths_nm: Array1::from_vec(grid.wavelengths_nm.clone()),
            concentrations: Array1::from_vec(grid.concentrations.clone()),
            ratios: Array1::from_vec(grid.ratios.clone()),
        }
    }

    /// The ten stored values of one grid point.
    pub fn row(&self, i: usize, j: usize, k: usize) -> ArrayView1<'_, f64> {
        self.data.slice(ndarray::s![i, j, k, ..])
    }

    pub fn converged_points(&self) -> usize {
        self.data
            .index_axis(ndarray::Axis(3), COL_CONVERGED)
            .iter()
            .filter(|&&v| v == 1.0)
            .count()
    }

    /// Persist as `.npz` with arrays `data`, `wavelengths`, `concentrations`
    /// and `ratios`.
    pub fn write_npz(&self, path: &Path) -> TissueResult<()> {
        let file = File::create(path)?;
        let mut writer = NpzWriter::new(file);
        let npz_err = |e: ndarray_npy::WriteNpzError| {
            TissueError::Output(format!("failed to write '{}': {e}", path.display()))
        };
        writer.add_array("data.npy", &self.data).map_err(npz_err)?;
        writer
            .add_array("wavelengths.npy", &self.wavelengths_nm)
            .map_err(npz_err)?;
        writer
            .add_array("concentrations.npy", &self.concentrations)
            .map_err(npz_err)?;
        writer
            .add_array("ratios.npy", &self.ratios)
            .map_err(npz_err)?;
        writer.finish().map_err(npz_err)?;
        Ok(())
    }

    pub fn read_npz(path: &Path) -> TissueResult<Self> {
        let file = File::open(path)?;
        let mut npz = NpzReader::new(file).map_err(|e| {
            TissueError::Output(format!("failed to open '{}': {e}", path.display()))
        })?;
        let data = npz
            .by_name::<OwnedRepr<f64>, Ix4>("data.npy")
            .or_else(|_| npz.by_name::<OwnedRepr<f64>, Ix4>("data"))
            .map_err(|e| TissueError::Output(format!("failed to read 'data': {e}")))?;
        let mut axis = |key: &str| {
            npz.by_name::<OwnedRepr<f64>, Ix1>(&format!("{key}.npy"))
                .or_else(|_| npz.by_name::<OwnedRepr<f64>, Ix1>(key))
                .map_err(|e| TissueError::Output(format!("failed to read '{key}': {e}")))
        };
        let wavelengths_nm = axis("wavelengths")?;
        let concentrations = axis("concentrations")?;
        let ratios = axis("ratios")?;

        let expected = (
            wavelengths_nm.len(),
            concentrations.len(),
            ratios.len(),
            SWEEP_COLUMNS,
        );
        if data.dim() != expected {
            return Err(TissueError::Output(format!(
                "data shape {:?} does not match axes {:?}",
                data.dim(),
                expected
            )));
        }
        Ok(SweepTable {
            data,
            wavelengths_nm,
            concentrations,
            ratios,
        })
    }
}

/// Photons held live across all concurrently running grid points. Each
/// photon costs five `f64` columns plus three draw vectors per step.
pub const SWEEP_PHOTON_BUDGET: usize = 10_000_000;

/// Grid points run at once for a given batch size, at least one.
pub fn points_in_flight(batch_size: usize, total_points: usize) -> usize {
    (SWEEP_PHOTON_BUDGET / batch_size.max(1)).clamp(1, total_points.max(1))
}

/// Run one simulation per grid point of `grid`, varying wavelength,
/// concentration and ratio of `base`.
pub fn run_sweep(
    base: &ScatterConfig,
    settings: &SimulationSettings,
    grid: &SweepGrid,
) -> TissueResult<SweepTable> {
    grid.validate()?;
    let model = TabulatedTissueModel::new();
    log::info!(
        "sweep start: {} points ({} x {} x {})",
        grid.len(),
        grid.wavelengths_nm.len(),
        grid.concentrations.len(),
        grid.ratios.len()
    );

    let wave = points_in_flight(settings.batch_size, grid.len());
    log::debug!("sweep runs {wave} points at a time");
    let mut outcomes: Vec<ScatterOutcome> = Vec::with_capacity(grid.len());
    for start in (0..grid.len()).step_by(wave) {
        let end = (start + wave).min(grid.len());
        let batch = (start..end)
            .into_par_iter()
            .map(|flat| {
                let (wavelength_nm, concentration_blood, ratio_oxygen) = grid.point(flat);
                let config = ScatterConfig {
                    wavelength_nm,
                    concentration_blood,
                    ratio_oxygen,
                    ..base.clone()
                };
                let point_settings = SimulationSettings {
                    seed: settings.seed.map(|s| s.wrapping_add(flat as u64)),
                    ..settings.clone()
                };
                let mut source = SeededVariates::from_optional_seed(point_settings.seed);
                let outcome = SimulationDriver::new(config, point_settings, &model)?.run(&mut source)?;
                log::debug!(
                    "sweep point {flat}: {wavelength_nm} nm, c={concentration_blood}, r={ratio_oxygen} -> {}",
                    outcome.termination
                );
                Ok(outcome)
            })
            .collect::<TissueResult<Vec<ScatterOutcome>>>()?;
        outcomes.extend(batch);
    }

    let table = SweepTable::from_outcomes(grid, &outcomes);
    log::info!(
        "sweep done: {}/{} points converged",
        table.converged_points(),
        grid.len()
    );
    Ok(table)
}
