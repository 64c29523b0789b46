//! Error types for fan processing operations.

use thiserror::Error;

/// Result type for fan processing operations.
pub type FanResult<T> = Result<T, FanError>;

/// Errors that can occur while merging or orienting local triangulations.
///
/// There is deliberately no partial-success variant: on any error the
/// operation's output must be discarded wholesale. In-place passes may
/// have already committed flips for some vertices before a mid-run
/// cancellation; that state is valid on its own and is not rolled back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FanError {
    /// No partial triangulations (or no fan records at all) were supplied.
    #[error("no local triangulations to merge")]
    EmptyInput,

    /// A progress callback returned `false` and the operation stopped.
    #[error("operation cancelled by progress callback")]
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            format!("{}", FanError::EmptyInput),
            "no local triangulations to merge"
        );
        assert_eq!(
            format!("{}", FanError::Cancelled),
            "operation cancelled by progress callback"
        );
    }
}
