use thiserror::Error;

/// Failures surfaced by ledger and override mutations.
///
/// Every variant leaves session state untouched. Aggregation never fails, so
/// this is the whole error surface of the gradebook core.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GradebookError {
    /// Bad grade value, unknown category or student, blank name or reason.
    #[error("{0}")]
    Validation(String),

    /// Enrollment of a name that is already on the roster.
    #[error("student already enrolled: {0}")]
    Duplicate(String),

    /// Unknown entry id or pending action token.
    #[error("{0}")]
    NotFound(String),
}

impl GradebookError {
    pub fn validation(message: impl Into<String>) -> Self {
        GradebookError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        GradebookError::NotFound(message.into())
    }

    /// Wire code used in the IPC error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            GradebookError::Validation(_) => "validation_failed",
            GradebookError::Duplicate(_) => "duplicate",
            GradebookError::NotFound(_) => "not_found",
        }
    }
}
