//! Error types for Drizzle.

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias for Drizzle operations.
pub type Result<T> = std::result::Result<T, MeasureError>;

/// Main error type for the plugin boundary.
#[derive(Debug, Error, Diagnostic)]
pub enum MeasureError {
    /// The host passed a zero, stale or foreign handle.
    #[error("Measure handle {0:#x} is not registered")]
    #[diagnostic(code(drizzle::handle_not_found))]
    HandleNotFound(usize),

    /// Every slot of the handle table is live or retired.
    #[error("No measure handle is available ({0} slots in use)")]
    #[diagnostic(code(drizzle::handles_exhausted))]
    HandlesExhausted(usize),

    /// A host string could not be converted.
    #[error("Marshalling failed in '{context}': {reason}")]
    #[diagnostic(code(drizzle::marshal_failure))]
    MarshalFailure {
        context: &'static str,
        reason: String,
    },

    /// An option read from the skin has a value the measure does not understand.
    #[error("Invalid value of option '{option}': {value}")]
    #[diagnostic(code(drizzle::configuration_invalid))]
    ConfigurationInvalid { option: String, value: String },

    /// ExecuteBang or CustomFunc on a measure that does not implement it.
    #[error("The plugin does not support this action! ({0})")]
    #[diagnostic(code(drizzle::unsupported_operation))]
    UnsupportedOperation(&'static str),

    /// Measure construction failed during Initialize.
    #[error("Failed to initialize measure: {0}")]
    #[diagnostic(code(drizzle::initialization))]
    Initialization(String),

    /// Initialize was called without a usable host API context.
    #[error("No host API context was supplied")]
    #[diagnostic(code(drizzle::host_unavailable))]
    HostUnavailable,
}

impl MeasureError {
    /// Creates a marshalling error for the given call site.
    pub fn marshal(context: &'static str, reason: impl Into<String>) -> Self {
        MeasureError::MarshalFailure {
            context,
            reason: reason.into(),
        }
    }

    /// Creates a configuration error for an option value.
    pub fn invalid_option(option: impl Into<String>, value: impl Into<String>) -> Self {
        MeasureError::ConfigurationInvalid {
            option: option.into(),
            value: value.into(),
        }
    }

    /// Returns true for host contract violations.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, MeasureError::HandleNotFound(_))
    }
}
