use thiserror::Error;

/// Errors raised by the simulation core.
///
/// Both variants are fatal to the run in progress.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// Invalid scenario parameters.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Array sizes disagree during an update or a merge.
    #[error("dimension mismatch in {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
}

pub fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<(), SimError> {
    if expected != actual {
        return Err(SimError::DimensionMismatch {
            what,
            expected,
            actual,
        });
    }
    Ok(())
}
