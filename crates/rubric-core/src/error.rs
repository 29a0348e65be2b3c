//! Error types and exit codes for rubric.
//!
//! `RubricError` is the single error type surfaced to callers of the engine
//! and to the CLI. Subsystem errors (`PatchError`, the parser's `ParseError`,
//! the pattern DSL's `PatternError`) bridge into it with `From` impls.
//!
//! ## Exit Codes
//!
//! - `0`: No offenses
//! - `1`: Offenses reported (not an error; decided by the CLI)
//! - `2`: Invalid arguments or configuration
//! - `3`: Source could not be read or parsed
//! - `4`: Autocorrection could not be applied
//! - `10`: Internal errors (bugs, unexpected state)

use std::fmt;

use thiserror::Error;

use crate::patch::{PatchError, Span};

// ============================================================================
// Output Error Codes
// ============================================================================

/// Stable process exit codes for each error family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputErrorCode {
    /// Bad command line or configuration.
    InvalidArguments = 2,
    /// Unreadable or unparsable source.
    SourceError = 3,
    /// Rewrites could not be applied.
    ApplyError = 4,
    /// Bugs and unexpected state.
    InternalError = 10,
}

impl OutputErrorCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for OutputErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Unified error type for the engine and the CLI.
#[derive(Debug, Error)]
pub enum RubricError {
    /// A cop requires an option that the configuration does not supply.
    #[error("{cop}: missing required option '{option}'")]
    ConfigMissing { cop: String, option: String },

    /// A configured option value is not acceptable.
    #[error("{cop}: invalid value '{value}' for option '{option}' (expected {expected})")]
    InvalidConfig {
        cop: String,
        option: String,
        value: String,
        expected: String,
    },

    /// The configuration file itself could not be read or parsed.
    #[error("invalid configuration: {message}")]
    ConfigFile { message: String },

    /// Two rewrites of one inspection pass overlap.
    #[error("conflicting rewrites at {first} and {second}")]
    RewriteConflict { first: Span, second: Span },

    /// A source file could not be parsed.
    #[error("{path}:{line}:{column}: parse error: {message}")]
    Parse {
        path: String,
        line: u32,
        column: u32,
        message: String,
    },

    /// A built-in node pattern failed to compile.
    #[error("invalid node pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// Invalid arguments from the caller.
    #[error("invalid arguments: {message}")]
    InvalidArguments { message: String },

    /// File system failure.
    #[error("{path}: {message}")]
    Io { path: String, message: String },

    /// Internal error (bug or unexpected state).
    #[error("internal error: {message}")]
    InternalError { message: String },
}

// ============================================================================
// Error Code Mapping
// ============================================================================

impl From<&RubricError> for OutputErrorCode {
    fn from(err: &RubricError) -> Self {
        match err {
            RubricError::ConfigMissing { .. } => OutputErrorCode::InvalidArguments,
            RubricError::InvalidConfig { .. } => OutputErrorCode::InvalidArguments,
            RubricError::ConfigFile { .. } => OutputErrorCode::InvalidArguments,
            RubricError::InvalidArguments { .. } => OutputErrorCode::InvalidArguments,
            RubricError::Parse { .. } => OutputErrorCode::SourceError,
            RubricError::Io { .. } => OutputErrorCode::SourceError,
            RubricError::RewriteConflict { .. } => OutputErrorCode::ApplyError,
            RubricError::InvalidPattern { .. } => OutputErrorCode::InternalError,
            RubricError::InternalError { .. } => OutputErrorCode::InternalError,
        }
    }
}

// ============================================================================
// Bridge: PatchError -> RubricError
// ============================================================================

impl From<PatchError> for RubricError {
    fn from(err: PatchError) -> Self {
        match err {
            PatchError::Conflict { first, second } => RubricError::RewriteConflict { first, second },
            PatchError::OutOfBounds { span, source_len } => RubricError::InternalError {
                message: format!(
                    "rewrite span {} is out of bounds for source of length {}",
                    span, source_len
                ),
            },
        }
    }
}

// ============================================================================
// Convenience Constructors
// ============================================================================

impl RubricError {
    /// Create a missing-option error.
    pub fn config_missing(cop: impl Into<String>, option: impl Into<String>) -> Self {
        RubricError::ConfigMissing {
            cop: cop.into(),
            option: option.into(),
        }
    }

    /// Create an invalid arguments error.
    pub fn invalid_args(message: impl Into<String>) -> Self {
        RubricError::InvalidArguments {
            message: message.into(),
        }
    }

    /// Create an I/O error tagged with the path it concerns.
    pub fn io(path: impl Into<String>, err: &std::io::Error) -> Self {
        RubricError::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        RubricError::InternalError {
            message: message.into(),
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> OutputErrorCode {
        OutputErrorCode::from(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_map_to_invalid_arguments() {
        let err = RubricError::config_missing("Style/FormatString", "EnforcedStyle");
        assert_eq!(err.error_code(), OutputErrorCode::InvalidArguments);
        assert_eq!(err.error_code().code(), 2);
    }

    #[test]
    fn conflict_maps_to_apply_error() {
        let err = RubricError::from(PatchError::Conflict {
            first: Span::new(0, 4),
            second: Span::new(2, 6),
        });
        assert_eq!(err.error_code().code(), 4);
        assert_eq!(err.to_string(), "conflicting rewrites at [0, 4) and [2, 6)");
    }

    #[test]
    fn out_of_bounds_is_internal() {
        let err = RubricError::from(PatchError::OutOfBounds {
            span: Span::new(0, 9),
            source_len: 3,
        });
        assert_eq!(err.error_code(), OutputErrorCode::InternalError);
    }

    #[test]
    fn display_messages() {
        let err = RubricError::config_missing("Style/FormatString", "EnforcedStyle");
        assert_eq!(
            err.to_string(),
            "Style/FormatString: missing required option 'EnforcedStyle'"
        );

        let err = RubricError::Parse {
            path: "a.rb".to_string(),
            line: 3,
            column: 7,
            message: "unexpected 'end'".to_string(),
        };
        assert_eq!(err.to_string(), "a.rb:3:7: parse error: unexpected 'end'");
    }

    #[test]
    fn code_values() {
        assert_eq!(OutputErrorCode::InvalidArguments.code(), 2);
        assert_eq!(OutputErrorCode::SourceError.code(), 3);
        assert_eq!(OutputErrorCode::ApplyError.code(), 4);
        assert_eq!(OutputErrorCode::InternalError.code(), 10);
        assert_eq!(format!("{}", OutputErrorCode::InternalError), "10");
    }
}
