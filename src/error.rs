//! Error types for the analysis engine.
//!
//! Every failure mode is typed so the caller can decide per test whether to
//! skip, retry with more data, or abort. Nothing is clamped into range and
//! no routine substitutes a default value for bad input.

use thiserror::Error;

/// Errors surfaced by the statistical routines.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// A parameter is outside its mathematical domain.
    ///
    /// Examples: `alpha` outside (0, 1), a proportion outside [0, 1], a
    /// zero effect size handed to the sample-size formula.
    #[error("invalid parameter `{name}`: got {value}, expected {expected}")]
    InvalidParameter {
        /// Name of the offending parameter.
        name: &'static str,
        /// The rejected value.
        value: f64,
        /// Description of the valid domain.
        expected: &'static str,
    },

    /// A sample is too small or too degenerate for the requested test.
    ///
    /// Examples: fewer than 2 observations, zero variance where a test
    /// needs dispersion, non-finite values in a group.
    #[error("insufficient data for {test}: {reason}")]
    InsufficientData {
        /// The routine that rejected the input.
        test: &'static str,
        /// Why the input was rejected.
        reason: String,
    },

    /// The computation is mathematically undefined for this input.
    ///
    /// Example: pooled variance of zero with unequal means, which would
    /// make the standardized effect size infinite.
    #[error("degenerate input in {context}: {reason}")]
    DegenerateInput {
        /// The routine that hit the degenerate case.
        context: &'static str,
        /// What made the input degenerate.
        reason: String,
    },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_context() {
        let err = AnalysisError::InvalidParameter {
            name: "alpha",
            value: 1.5,
            expected: "a value in (0, 1)",
        };
        let msg = err.to_string();
        assert!(msg.contains("alpha"));
        assert!(msg.contains("1.5"));
    }
}
