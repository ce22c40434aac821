//! Shot-noise stopping rule.
//!
//! The relative noise of an accumulated detector weight d is estimated as
//! √d / d. A detector is noisy while that estimate is strictly above the
//! threshold, so d = 10 000 at threshold 0.01 is the first converged total.

use tissue_types::constants::DEFAULT_CONVERGENCE_THRESHOLD;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// A detector total was exactly zero.
    NoSignal,
    /// Both detectors are at or below the noise threshold.
    Converged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Continue,
    Stop(StopReason),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvergenceGate {
    pub threshold: f64,
}

impl Default for ConvergenceGate {
    fn default() -> Self {
        ConvergenceGate {
            threshold: DEFAULT_CONVERGENCE_THRESHOLD,
        }
    }
}

impl ConvergenceGate {
    pub fn new(threshold: f64) -> Self {
        ConvergenceGate { threshold }
    }

    /// √total / total.
    pub fn relative_noise(total: f64) -> f64 {
        total.sqrt() / total
    }

    pub fn is_noisy(&self, total: f64) -> bool {
        Self::relative_noise(total) > self.threshold
    }

    pub fn evaluate(&self, detector_1: f64, detector_2: f64) -> GateState {
        if detector_1 == 0.0 || detector_2 == 0.0 {
            return GateState::Stop(StopReason::NoSignal);
        }
        if self.is_noisy(detector_1) || self.is_noisy(detector_2) {
            GateState::Continue
        } else {
            GateState::Stop(StopReason::Converged)
        }
    }
}
