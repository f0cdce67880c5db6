//! Error types for sketch and routing-table operations

use std::fmt;

/// Errors that can occur while constructing or mutating a core
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SketchError {
    /// Invalid parameter provided to a constructor or operation
    InvalidParameter {
        /// Parameter name
        param: String,
        /// Invalid value provided
        value: String,
        /// Constraint that was violated
        constraint: String,
    },
}

impl fmt::Display for SketchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SketchError::InvalidParameter {
                param,
                value,
                constraint,
            } => {
                write!(
                    f,
                    "Invalid parameter '{}': value '{}' {}",
                    param, value, constraint
                )
            }
        }
    }
}

impl std::error::Error for SketchError {}

/// Result type alias for sketch and table operations
pub type Result<T> = std::result::Result<T, SketchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_invalid_parameter() {
        let err = SketchError::InvalidParameter {
            param: "decay".to_string(),
            value: "1.5".to_string(),
            constraint: "must be in (0, 1)".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid parameter 'decay': value '1.5' must be in (0, 1)"
        );
    }
}
