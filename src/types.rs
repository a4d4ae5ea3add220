//! Sample containers and shared enums.

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// Kind of outcome a metric records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricKind {
    /// Real-valued outcome (e.g. session duration in seconds).
    Continuous,
    /// 0/1 outcome (e.g. converted or not).
    Binary,
}

/// Two cleaned outcome sequences for one metric, control first.
///
/// The surrounding transport layer owns data cleaning and the operational
/// "at least 100 observations per group" floor. The routines here enforce
/// only the sizes they mathematically require, and reject non-finite
/// values rather than computing with them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricSample {
    /// Metric name, quoted in evidence lines and logs.
    pub name: String,
    /// Continuous or binary.
    pub kind: MetricKind,
    /// Control group observations.
    pub control: Vec<f64>,
    /// Variant group observations.
    pub variant: Vec<f64>,
}

impl MetricSample {
    /// Create a continuous metric sample.
    pub fn continuous(name: impl Into<String>, control: Vec<f64>, variant: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            kind: MetricKind::Continuous,
            control,
            variant,
        }
    }

    /// Create a binary metric sample. Every value must be exactly 0.0 or 1.0.
    pub fn binary(name: impl Into<String>, control: Vec<f64>, variant: Vec<f64>) -> Result<Self> {
        for (param, values) in [("control values", &control), ("variant values", &variant)] {
            if let Some(bad) = values.iter().find(|v| **v != 0.0 && **v != 1.0) {
                return Err(AnalysisError::InvalidParameter {
                    name: param,
                    value: *bad,
                    expected: "every observation to be 0.0 or 1.0",
                });
            }
        }
        Ok(Self {
            name: name.into(),
            kind: MetricKind::Binary,
            control,
            variant,
        })
    }

    /// Check both groups against a minimum size and for non-finite values.
    pub fn validate(&self, min_per_group: usize) -> Result<()> {
        for (label, values) in [("control", &self.control), ("variant", &self.variant)] {
            ensure_group("metric sample", label, values)?;
            if values.len() < min_per_group {
                return Err(AnalysisError::InsufficientData {
                    test: "metric sample",
                    reason: format!(
                        "{label} group has {} observation(s), need at least {min_per_group}",
                        values.len()
                    ),
                });
            }
        }
        Ok(())
    }

    /// `(successes, total)` per group. Only meaningful for binary metrics,
    /// where every observation is 0.0 or 1.0.
    pub fn counts(&self) -> ((u64, u64), (u64, u64)) {
        (group_counts(&self.control), group_counts(&self.variant))
    }
}

fn group_counts(values: &[f64]) -> (u64, u64) {
    let successes = values.iter().filter(|v| **v == 1.0).count() as u64;
    (successes, values.len() as u64)
}

/// Shared guard: a group needs at least 2 observations, all finite.
pub(crate) fn ensure_group(test: &'static str, label: &str, values: &[f64]) -> Result<()> {
    if values.len() < 2 {
        return Err(AnalysisError::InsufficientData {
            test,
            reason: format!(
                "{label} group has {} observation(s), need at least 2",
                values.len()
            ),
        });
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(AnalysisError::InsufficientData {
            test,
            reason: format!("{label} group contains non-finite values"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_rejects_non_binary_values() {
        let err = MetricSample::binary("conversion", vec![0.0, 1.0], vec![0.5, 1.0]);
        assert!(err.is_err());
    }

    #[test]
    fn binary_counts() {
        let sample =
            MetricSample::binary("conversion", vec![1.0, 0.0, 1.0], vec![0.0, 0.0, 1.0, 1.0])
                .unwrap();
        let ((cs, ct), (vs, vt)) = sample.counts();
        assert_eq!((cs, ct), (2, 3));
        assert_eq!((vs, vt), (2, 4));
    }

    #[test]
    fn validate_rejects_small_groups() {
        let sample = MetricSample::continuous("duration", vec![1.0, 2.0, 3.0], vec![4.0, 5.0]);
        assert!(sample.validate(2).is_ok());
        assert!(sample.validate(3).is_err());
    }

    #[test]
    fn validate_rejects_non_finite() {
        let sample = MetricSample::continuous("duration", vec![1.0, f64::NAN], vec![1.0, 2.0]);
        assert!(sample.validate(2).is_err());
    }
}
