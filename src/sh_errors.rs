use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Requested maximum degree {requested} exceeds the available maximum degree {available}")]
    DegreeTooHigh { requested: usize, available: usize },

    #[error("Invalid evaluation geometry: {0}")]
    InvalidGrid(String),

    #[error("All spherical radii must be equal for this operation")]
    RadiusMismatch,

    #[error("Unsupported derivative combination: dr = {dr}, dlat = {dlat}, dlon = {dlon}")]
    UnsupportedDerivative { dr: u8, dlat: u8, dlon: u8 },

    #[error("Failed to allocate scratch memory on {failed_tasks} parallel task(s)")]
    ScratchAllocation { failed_tasks: usize },

    #[error("FFT failure: {0}")]
    FftPlan(String),

    #[error("Iterative algorithm did not converge: {0}")]
    NonConvergence(String),

    #[error("Unable to build the thread pool: {0}")]
    ThreadPool(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Error during the nom parsing: {0}")]
    NomParsingError(String),
}

impl From<rayon::ThreadPoolBuildError> for ShError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        ShError::ThreadPool(err.to_string())
    }
}

impl From<realfft::FftError> for ShError {
    fn from(err: realfft::FftError) -> Self {
        ShError::FftPlan(err.to_string())
    }
}

impl From<std::collections::TryReserveError> for ShError {
    fn from(_: std::collections::TryReserveError) -> Self {
        ShError::ScratchAllocation { failed_tasks: 1 }
    }
}

impl PartialEq for ShError {
    fn eq(&self, other: &Self) -> bool {
        use ShError::*;
        match (self, other) {
            (InvalidArgument(a), InvalidArgument(b)) => a == b,
            (
                DegreeTooHigh {
                    requested: a,
                    available: b,
                },
                DegreeTooHigh {
                    requested: c,
                    available: d,
                },
            ) => a == c && b == d,
            (InvalidGrid(a), InvalidGrid(b)) => a == b,
            (
                UnsupportedDerivative { dr, dlat, dlon },
                UnsupportedDerivative {
                    dr: r2,
                    dlat: t2,
                    dlon: l2,
                },
            ) => dr == r2 && dlat == t2 && dlon == l2,
            (ScratchAllocation { failed_tasks: a }, ScratchAllocation { failed_tasks: b }) => a == b,
            (FftPlan(a), FftPlan(b)) => a == b,
            (NonConvergence(a), NonConvergence(b)) => a == b,
            (ThreadPool(a), ThreadPool(b)) => a == b,
            (InvalidConfig(a), InvalidConfig(b)) => a == b,
            (NomParsingError(a), NomParsingError(b)) => a == b,

            // io errors are not comparable: same variant is enough
            (IoError(_), IoError(_)) => true,

            (RadiusMismatch, RadiusMismatch) => true,

            _ => false,
        }
    }
}
