//! Result contract of the top-level operations

use serde::Serialize;

/// Outcome of one top-level operation.
///
/// Warnings never flip `success`; only errors do.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OperationReport {
    /// Operation name, e.g. "apply-content"
    pub operation: String,
    /// Whether the operation completed successfully
    pub success: bool,
    /// Actions taken during the operation
    pub actions: Vec<String>,
    /// Non-fatal conditions (skipped items, unreadable documents, ...)
    pub warnings: Vec<String>,
    /// Errors that failed the operation
    pub errors: Vec<String>,
}

impl OperationReport {
    /// Create a successful, empty report
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            success: true,
            ..Default::default()
        }
    }

    /// Record an action
    pub fn action(&mut self, action: impl Into<String>) {
        let action = action.into();
        tracing::debug!("{action}");
        self.actions.push(action);
    }

    /// Record a warning
    pub fn warn(&mut self, warning: impl Into<String>) {
        let warning = warning.into();
        tracing::warn!("{warning}");
        self.warnings.push(warning);
    }

    /// Record an error and mark the operation failed
    pub fn fail(&mut self, error: impl Into<String>) {
        let error = error.into();
        tracing::error!("{error}");
        self.errors.push(error);
        self.success = false;
    }

    /// Fold another report into this one.
    pub fn absorb(&mut self, other: OperationReport) {
        self.success &= other.success;
        self.actions.extend(other.actions);
        self.warnings.extend(other.warnings);
        self.errors.extend(other.errors);
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
