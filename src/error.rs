use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{what} has length {found}, expected {expected}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("{what} is not square ({rows} x {cols})")]
    NotSquare {
        what: &'static str,
        rows: usize,
        cols: usize,
    },
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    /// The dynamic stiffness `M + (h/2)C + (h/2)^2 K` is not symmetric positive definite.
    #[error("Dynamic stiffness is not positive definite for time step {time_step:e}")]
    Factorization { time_step: f64 },
    #[error("Frequency list is empty")]
    EmptyFrequencyList,
    #[error("Modal basis has no modes")]
    EmptyModalBasis,
    #[error("Config parse error")]
    Json {
        #[from]
        source: serde_json::Error,
    },
    #[error("File I/O Error")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("Failed to build thread pool")]
    ThreadPool {
        #[from]
        source: rayon::ThreadPoolBuildError,
    },
}

impl Error {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
