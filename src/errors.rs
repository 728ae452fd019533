/*!
This module contains the error types produced by keyorder.

There are only two kinds of failure. Invalid arguments are reported when a comparator is being
constructed from run-time input (e.g. column names typed by a user) and type mismatches are reported
when a type-erased comparator is handed values of a type it was not built for.
*/

use std::fmt;

/// Result type for fallible comparator operations.
pub type ComparatorResult<T> = Result<T, ComparatorError>;

/// Errors raised while building or evaluating comparators.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ComparatorError {
    /**
    Variant for arguments that cannot be used to construct a comparator.

    This is always raised at construction time and never deferred to comparison time.
    */
    InvalidArgument(String),

    /**
    Variant for operands whose runtime type does not match the type a comparator was built for.

    Only the type-erased bridge can produce this error.
    */
    TypeMismatch {
        /// The name of the type the comparator expected.
        expected: &'static str,
    },
}

impl std::error::Error for ComparatorError {}

impl fmt::Display for ComparatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComparatorError::InvalidArgument(reason) => write!(f, "Invalid argument: {}", reason),
            ComparatorError::TypeMismatch { expected } => write!(
                f,
                "Type mismatch: the comparator can only compare values of type `{}`",
                expected
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn errors_render_their_reason() {
        let invalid = ComparatorError::InvalidArgument("unknown sort column `age`".to_string());
        assert_eq!(
            invalid.to_string(),
            "Invalid argument: unknown sort column `age`"
        );

        let mismatch = ComparatorError::TypeMismatch { expected: "u32" };
        assert_eq!(
            mismatch.to_string(),
            "Type mismatch: the comparator can only compare values of type `u32`"
        );
    }
}
