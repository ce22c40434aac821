use thiserror::Error;

#[derive(Error, Debug)]
pub enum TissueError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Length mismatch for {name}: expected {expected}, found {found}")]
    LengthMismatch {
        name: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Parameter {name}={value} out of range: {reason}")]
    ParameterOutOfRange {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("Wavelength {wavelength_nm} nm outside tabulated range [{min_nm}, {max_nm}] nm")]
    WavelengthOutOfRange {
        wavelength_nm: f64,
        min_nm: f64,
        max_nm: f64,
    },

    #[error("Convergence never reached after {iterations} iterations ({termination})")]
    ConvergenceNeverReached {
        termination: String,
        iterations: usize,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Output error: {0}")]
    Output(String),
}

impl TissueError {
    /// Invalid input shapes or parameters, raised before any transport work.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            TissueError::ConfigError(_) | TissueError::LengthMismatch { .. }
        )
    }

    pub fn is_range_error(&self) -> bool {
        matches!(
            self,
            TissueError::ParameterOutOfRange { .. } | TissueError::WavelengthOutOfRange { .. }
        )
    }
}

pub type TissueResult<T> = Result<T, TissueError>;
