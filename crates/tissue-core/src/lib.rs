//! Monte-Carlo photon transport through skin, muscle and bone.
//!
//! The driver seeds a photon population under the source, advances it one
//! scattering event per iteration and scores photons leaving the surface at
//! two ring detectors until both reach the shot-noise target.

pub mod convergence;
pub mod detection;
pub mod driver;
pub mod layers;
pub mod photons;
pub mod transport;
