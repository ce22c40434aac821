// ─────────────────────────────────────────────────────────────────────
// Tissue Scatter — Constants
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
/// Molar mass of hemoglobin (mg/mol). Converts molar extinction to 1/cm.
pub const MG_PER_MOL_HEMOGLOBIN: f64 = 64500.0;

/// Reference wavelength of the scattering power law (nm).
pub const REFERENCE_WAVELENGTH_NM: f64 = 500.0;

/// Skin scattering prefactor a (1/cm) and exponent b.
pub const SKIN_SCATTER_A: f64 = 46.0;
pub const SKIN_SCATTER_B: f64 = -1.421;

/// Bone scattering prefactor a (1/cm) and exponent b.
pub const BONE_SCATTER_A: f64 = 22.9;
pub const BONE_SCATTER_B: f64 = -0.716;

/// Muscle scattering prefactor a (1/cm) and exponent b.
pub const MUSCLE_SCATTER_A: f64 = 13.0;
pub const MUSCLE_SCATTER_B: f64 = -1.470;

/// Photons per seeding/replenishment batch.
pub const DEFAULT_BATCH_SIZE: usize = 5_000_000;

/// Live population below which a fresh batch is injected.
pub const DEFAULT_REPLENISH_FLOOR: usize = 100_000;

/// Starting amplitude of every emitted photon.
pub const DEFAULT_INITIAL_WEIGHT: f64 = 100.0;

/// Relative shot-noise target sqrt(W)/W per detector (~1%).
pub const DEFAULT_CONVERGENCE_THRESHOLD: f64 = 0.01;

/// Lateral model bound as a multiple of the far detector distance.
pub const DEFAULT_BOUND_FACTOR: f64 = 5.0;

/// Driver iteration cap.
pub const DEFAULT_MAX_ITERATIONS: usize = 10_000;
