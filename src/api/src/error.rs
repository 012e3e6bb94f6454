//! Error types for the page extraction core.

use thiserror::Error;

/// Errors returned by the record builders.
///
/// Only structural anchors produce errors. A single optional field that is
/// missing or fails to parse degrades to a zero value or `None` instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// A required anchor (metadata block, payoff table, result table,
    /// pedigree table) is absent from the document.
    #[error("missing element: {anchor}")]
    MissingElement { anchor: &'static str },

    /// The anchor exists but its shape breaks a hard precondition.
    #[error("invalid structure in {anchor}: {detail} (found {actual})")]
    InvalidStructure {
        anchor: &'static str,
        detail: String,
        actual: usize,
    },
}

impl ExtractError {
    pub(crate) fn missing(anchor: &'static str) -> Self {
        Self::MissingElement { anchor }
    }

    pub(crate) fn invalid(anchor: &'static str, detail: impl Into<String>, actual: usize) -> Self {
        Self::InvalidStructure {
            anchor,
            detail: detail.into(),
            actual,
        }
    }
}

/// Result alias used by the builders.
pub type ExtractResult<T> = Result<T, ExtractError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_reports_count() {
        let err = ExtractError::invalid("table.blood_table", "expected exactly 32 rows", 31);
        assert_eq!(
            err.to_string(),
            "invalid structure in table.blood_table: expected exactly 32 rows (found 31)"
        );
    }

    #[test]
    fn test_display_missing() {
        let err = ExtractError::missing("dl.racedata");
        assert_eq!(err.to_string(), "missing element: dl.racedata");
    }
}
