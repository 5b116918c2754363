use std::fmt::{self, Display};
use std::io;

/// Provides `EpiError` and maps to other errors to
/// convert to an `EpiError`
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum EpiError {
    /// An input was outside of its domain. Always raised before anything is constructed.
    ParameterError {
        parameter: &'static str,
        reason: String,
    },
    /// Internal consistency failure. Indicates a defect in the engine, so the run should be
    /// abandoned rather than continued with wrong statistics.
    InvariantViolation(String),
    /// An orchestrator operation was called in a run state that does not permit it.
    RunStateError(String),
    IoError(io::Error),
    JsonError(serde_json::Error),
}

impl EpiError {
    pub(crate) fn parameter(parameter: &'static str, reason: impl Into<String>) -> Self {
        EpiError::ParameterError {
            parameter,
            reason: reason.into(),
        }
    }

    /// Returns the name of the offending parameter for a `ParameterError`.
    pub fn parameter_name(&self) -> Option<&'static str> {
        match self {
            EpiError::ParameterError { parameter, .. } => Some(parameter),
            _ => None,
        }
    }
}

impl From<io::Error> for EpiError {
    fn from(error: io::Error) -> Self {
        EpiError::IoError(error)
    }
}

impl From<serde_json::Error> for EpiError {
    fn from(error: serde_json::Error) -> Self {
        EpiError::JsonError(error)
    }
}

impl std::error::Error for EpiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EpiError::IoError(e) => Some(e),
            EpiError::JsonError(e) => Some(e),
            _ => None,
        }
    }
}

impl Display for EpiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EpiError::ParameterError { parameter, reason } => {
                write!(f, "invalid parameter `{parameter}`: {reason}")
            }
            EpiError::InvariantViolation(message) => write!(f, "invariant violated: {message}"),
            EpiError::RunStateError(message) => write!(f, "invalid run state: {message}"),
            EpiError::IoError(e) => write!(f, "io error: {e}"),
            EpiError::JsonError(e) => write!(f, "json error: {e}"),
        }
    }
}
