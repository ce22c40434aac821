//! Parameter sweeps over the photon-transport engine.
//!
//! Wavelength, blood-concentration and oxygen-ratio scans with `.npz`
//! persistence; the `tissue-scatter` binary wraps these for the command line.

pub mod sweep;
