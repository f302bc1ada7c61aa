//! Error handling for the batch-scheduler core.

use thiserror::Error;

use crate::backend::BackendKind;

/// Result type for scheduler operations.
pub type SchedResult<T> = Result<T, SchedError>;

/// Errors that can occur during scheduler operations.
#[derive(Error, Debug)]
pub enum SchedError {
    /// Malformed configuration value.
    #[error("Configuration error in `{key}`: {message}")]
    Config { key: String, message: String },

    /// An explicitly requested backend failed its availability probe.
    #[error("Backend `{backend}` is not available: {missing}")]
    Detect {
        backend: BackendKind,
        missing: String,
    },

    /// No backend in the priority list passed its availability probe.
    #[error("No usable batch scheduler found (probed: {probed})")]
    NoBackend { probed: String },

    /// The backend submission command failed or its output could not be parsed.
    #[error("Submission via `{command}` failed: {message}\n{output}")]
    Submit {
        command: String,
        message: String,
        output: String,
    },

    /// A job identifier could not be extracted from submission output.
    #[error("Could not extract a job identifier from `{command}` output: {output:?}")]
    IdExtract { command: String, output: String },

    /// A handle from one backend was passed to an operation of another.
    #[error("Job handle `{handle}` belongs to backend `{expected}`, not `{active}`")]
    HandleBackendMismatch {
        handle: String,
        expected: BackendKind,
        active: BackendKind,
    },

    /// An external command could not be spawned or executed.
    #[error("Command `{command}` failed: {message}")]
    Command { command: String, message: String },

    /// An external command did not finish within its deadline.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SchedError::Config {
            key: "stage_x_memory".to_string(),
            message: "stage index is not an integer".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Configuration error in `stage_x_memory`: stage index is not an integer"
        );

        let err = SchedError::Detect {
            backend: BackendKind::Sge,
            missing: "SGE_ROOT is not set".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Backend `sge` is not available: SGE_ROOT is not set"
        );

        let err = SchedError::HandleBackendMismatch {
            handle: "8675309".to_string(),
            expected: BackendKind::Slurm,
            active: BackendKind::Lsf,
        };
        assert_eq!(
            err.to_string(),
            "Job handle `8675309` belongs to backend `slurm`, not `lsf`"
        );
    }
}
