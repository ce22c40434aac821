// ─────────────────────────────────────────────────────────────────────
// Tissue Scatter — Tissue Optics
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Optical properties of layered tissue.
//!
//! Scattering power law, hemoglobin absorption table, and the
//! multi-wavelength oximetry step that consumes finished runs.

pub mod coefficients;
pub mod oximetry;
