//! Numeric primitives for the tissue photon-transport engine.

pub mod interp;
pub mod variates;
