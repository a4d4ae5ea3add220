//! Standardized effect sizes.
//!
//! Cohen's d for continuous outcomes and Cohen's h for proportions, both
//! oriented variant minus control. The interpretation bands are
//! informational only; no control flow in this crate depends on them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::stats::Moments;

/// Conventional magnitude bands for a standardized effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectMagnitude {
    /// |effect| < 0.2
    Negligible,
    /// 0.2 <= |effect| < 0.5
    Small,
    /// 0.5 <= |effect| < 0.8
    Medium,
    /// |effect| >= 0.8
    Large,
}

impl EffectMagnitude {
    /// Classify |effect| against the 0.2 / 0.5 / 0.8 bands.
    pub fn classify(effect: f64) -> Self {
        let magnitude = effect.abs();
        if magnitude < 0.2 {
            EffectMagnitude::Negligible
        } else if magnitude < 0.5 {
            EffectMagnitude::Small
        } else if magnitude < 0.8 {
            EffectMagnitude::Medium
        } else {
            EffectMagnitude::Large
        }
    }
}

impl fmt::Display for EffectMagnitude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EffectMagnitude::Negligible => write!(f, "negligible"),
            EffectMagnitude::Small => write!(f, "small"),
            EffectMagnitude::Medium => write!(f, "medium"),
            EffectMagnitude::Large => write!(f, "large"),
        }
    }
}

/// Cohen's d from group summary statistics, pooled-variance form:
///
/// d = (mean_v - mean_c) / sqrt(((n_c-1)s_c^2 + (n_v-1)s_v^2) / (n_c+n_v-2))
///
/// A pooled variance of zero with equal means is 0 by convention; with
/// unequal means the effect is undefined and reported as degenerate.
pub fn cohens_d(
    mean_control: f64,
    std_control: f64,
    n_control: u64,
    mean_variant: f64,
    std_variant: f64,
    n_variant: u64,
) -> Result<f64> {
    if n_control < 2 || n_variant < 2 {
        return Err(AnalysisError::InsufficientData {
            test: "Cohen's d",
            reason: format!(
                "need at least 2 observations per group, got {n_control} and {n_variant}"
            ),
        });
    }
    for (name, value) in [
        ("mean_control", mean_control),
        ("mean_variant", mean_variant),
    ] {
        if !value.is_finite() {
            return Err(AnalysisError::InvalidParameter {
                name,
                value,
                expected: "a finite mean",
            });
        }
    }
    for (name, value) in [("std_control", std_control), ("std_variant", std_variant)] {
        if !value.is_finite() || value < 0.0 {
            return Err(AnalysisError::InvalidParameter {
                name,
                value,
                expected: "a finite, non-negative standard deviation",
            });
        }
    }

    let nc = n_control as f64;
    let nv = n_variant as f64;
    let pooled_variance = ((nc - 1.0) * std_control * std_control
        + (nv - 1.0) * std_variant * std_variant)
        / (nc + nv - 2.0);

    if pooled_variance <= 0.0 {
        if mean_variant == mean_control {
            return Ok(0.0);
        }
        return Err(AnalysisError::DegenerateInput {
            context: "Cohen's d",
            reason: "pooled variance is zero but the means differ; the standardized effect is unbounded"
                .to_string(),
        });
    }

    Ok((mean_variant - mean_control) / pooled_variance.sqrt())
}

/// Cohen's d directly from two raw samples.
pub fn cohens_d_from_samples(control: &[f64], variant: &[f64]) -> Result<f64> {
    crate::types::ensure_group("Cohen's d", "control", control)?;
    crate::types::ensure_group("Cohen's d", "variant", variant)?;
    let c = Moments::of(control);
    let v = Moments::of(variant);
    cohens_d(
        c.mean,
        c.std(),
        c.n as u64,
        v.mean,
        v.std(),
        v.n as u64,
    )
}

/// Cohen's d for a planned experiment where both groups share the
/// baseline spread. With equal standard deviations the pooled form
/// reduces to a plain standardization.
pub fn cohens_d_design(baseline_mean: f64, target_mean: f64, baseline_std: f64) -> Result<f64> {
    if !baseline_std.is_finite() || baseline_std <= 0.0 {
        return Err(AnalysisError::InvalidParameter {
            name: "baseline_std",
            value: baseline_std,
            expected: "a finite, positive standard deviation",
        });
    }
    if !baseline_mean.is_finite() || !target_mean.is_finite() {
        return Err(AnalysisError::InvalidParameter {
            name: "baseline_mean",
            value: baseline_mean,
            expected: "finite means",
        });
    }
    Ok((target_mean - baseline_mean) / baseline_std)
}

/// Cohen's h for two proportions:
///
/// h = 2 asin(sqrt(p_v)) - 2 asin(sqrt(p_c))
pub fn cohens_h(p_control: f64, p_variant: f64) -> Result<f64> {
    for (name, value) in [("p_control", p_control), ("p_variant", p_variant)] {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(AnalysisError::InvalidParameter {
                name,
                value,
                expected: "a proportion in [0, 1]",
            });
        }
    }
    Ok(2.0 * p_variant.sqrt().asin() - 2.0 * p_control.sqrt().asin())
}
