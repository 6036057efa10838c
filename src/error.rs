//! Structured error handling and exit codes.

use serde::Serialize;

/// Exit codes for the dupmove application.
///
/// - 0: Success (completed normally, at least one file moved)
/// - 1: General error (bad preconditions or unexpected failure)
/// - 2: Nothing moved (completed normally, no duplicates found)
/// - 3: Partial success (completed with some non-fatal per-file errors)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: run completed and duplicates were moved.
    Success = 0,
    /// General error: a precondition failed or something unexpected broke.
    GeneralError = 1,
    /// Nothing moved: run completed but no duplicate was found.
    NothingMoved = 2,
    /// Partial success: run completed but some files were skipped on error.
    PartialSuccess = 3,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "DM000",
            Self::GeneralError => "DM001",
            Self::NothingMoved => "DM002",
            Self::PartialSuccess => "DM003",
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "DM001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{:#}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Success.as_i32(), 0);
        assert_eq!(ExitCode::GeneralError.as_i32(), 1);
        assert_eq!(ExitCode::NothingMoved.as_i32(), 2);
        assert_eq!(ExitCode::PartialSuccess.as_i32(), 3);
    }

    #[test]
    fn test_code_prefixes() {
        assert_eq!(ExitCode::Success.code_prefix(), "DM000");
        assert_eq!(ExitCode::PartialSuccess.code_prefix(), "DM003");
    }

    #[test]
    fn test_structured_error_serializes() {
        let err = anyhow::anyhow!("reference directory missing");
        let structured = StructuredError::new(&err, ExitCode::GeneralError);
        let json = serde_json::to_string(&structured).unwrap();
        assert!(json.contains("DM001"));
        assert!(json.contains("reference directory missing"));
    }
}
