//! Power analysis and sample-size planning.
//!
//! Standard two-sided two-sample normal-approximation formulas:
//!
//! - required n per group: n = 2 ((z_{1-a/2} + z_power) / d)^2
//! - achieved power:       1 - PHI(z_{1-a/2} - |d| sqrt(n / 2))
//!
//! `required_sample_size` is strictly decreasing in |effect| and
//! increasing in the power target; `achieved_power` is non-decreasing in
//! n and approaches 1 as n grows.

use statrs::distribution::{ContinuousCDF, Normal};

use crate::analysis::effect::{cohens_d_design, cohens_h};
use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::result::PowerAnalysisResult;
use crate::types::MetricKind;

fn std_normal() -> Normal {
    Normal::new(0.0, 1.0).expect("standard normal parameters are valid")
}

fn ensure_unit_interval(name: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 || value >= 1.0 {
        return Err(AnalysisError::InvalidParameter {
            name,
            value,
            expected: "a value in (0, 1)",
        });
    }
    Ok(())
}

/// Required observations per group for a two-sided two-sample test to
/// detect `effect_size` at significance `alpha` with probability `power`.
pub fn required_sample_size(effect_size: f64, alpha: f64, power: f64) -> Result<u64> {
    ensure_unit_interval("alpha", alpha)?;
    ensure_unit_interval("power", power)?;
    if !effect_size.is_finite() || effect_size == 0.0 {
        return Err(AnalysisError::InvalidParameter {
            name: "effect_size",
            value: effect_size,
            expected: "a non-zero finite standardized effect",
        });
    }

    let normal = std_normal();
    let z_alpha = normal.inverse_cdf(1.0 - alpha / 2.0);
    let z_power = normal.inverse_cdf(power);
    let n = 2.0 * ((z_alpha + z_power) / effect_size).powi(2);
    Ok(n.ceil() as u64)
}

/// Power achieved by a two-sided test with `n_per_group` observations in
/// each group.
pub fn achieved_power(effect_size: f64, n_per_group: u64, alpha: f64) -> Result<f64> {
    if n_per_group == 0 {
        return Err(AnalysisError::InvalidParameter {
            name: "n_per_group",
            value: 0.0,
            expected: "at least 1 observation per group",
        });
    }
    power_at(effect_size, n_per_group as f64, alpha)
}

/// Achieved power for unequal group sizes, using the harmonic-mean
/// effective size 2 n_c n_v / (n_c + n_v).
pub fn achieved_power_unequal(
    effect_size: f64,
    n_control: u64,
    n_variant: u64,
    alpha: f64,
) -> Result<f64> {
    if n_control == 0 || n_variant == 0 {
        return Err(AnalysisError::InvalidParameter {
            name: "n_control",
            value: n_control.min(n_variant) as f64,
            expected: "at least 1 observation per group",
        });
    }
    let nc = n_control as f64;
    let nv = n_variant as f64;
    power_at(effect_size, 2.0 * nc * nv / (nc + nv), alpha)
}

fn power_at(effect_size: f64, n: f64, alpha: f64) -> Result<f64> {
    ensure_unit_interval("alpha", alpha)?;
    if !effect_size.is_finite() {
        return Err(AnalysisError::InvalidParameter {
            name: "effect_size",
            value: effect_size,
            expected: "a finite standardized effect",
        });
    }
    let normal = std_normal();
    let z_alpha = normal.inverse_cdf(1.0 - alpha / 2.0);
    let noncentrality = effect_size.abs() * (n / 2.0).sqrt();
    Ok(1.0 - normal.cdf(z_alpha - noncentrality))
}

/// Design a continuous-metric experiment from baseline statistics.
///
/// The target mean is `baseline_mean * (1 + mde_pct / 100)`; Cohen's d is
/// taken against the baseline spread and fed into the sample-size formula
/// with the configured alpha and power target.
pub fn design_continuous(
    baseline_mean: f64,
    baseline_std: f64,
    min_detectable_effect_pct: f64,
    config: &AnalysisConfig,
) -> Result<PowerAnalysisResult> {
    if !min_detectable_effect_pct.is_finite() || min_detectable_effect_pct == 0.0 {
        return Err(AnalysisError::InvalidParameter {
            name: "min_detectable_effect_pct",
            value: min_detectable_effect_pct,
            expected: "a non-zero finite percentage",
        });
    }
    let target_mean = baseline_mean * (1.0 + min_detectable_effect_pct / 100.0);
    let effect_size = cohens_d_design(baseline_mean, target_mean, baseline_std)?;
    let required = required_sample_size(effect_size, config.alpha, config.power_target)?;
    Ok(PowerAnalysisResult {
        required_sample_size: required,
        achieved_power: None,
        effect_size,
        alpha: config.alpha,
        power_target: config.power_target,
        analysis_type: MetricKind::Continuous,
    })
}

/// Design a binary-metric experiment from a baseline rate.
///
/// The target rate is `baseline_rate * (1 + mde_pct / 100)` and must stay
/// inside [0, 1]; a lift that leaves the unit interval is rejected rather
/// than capped.
pub fn design_binary(
    baseline_rate: f64,
    min_detectable_effect_pct: f64,
    config: &AnalysisConfig,
) -> Result<PowerAnalysisResult> {
    ensure_unit_interval("baseline_rate", baseline_rate)?;
    if !min_detectable_effect_pct.is_finite() || min_detectable_effect_pct == 0.0 {
        return Err(AnalysisError::InvalidParameter {
            name: "min_detectable_effect_pct",
            value: min_detectable_effect_pct,
            expected: "a non-zero finite percentage",
        });
    }
    let target_rate = baseline_rate * (1.0 + min_detectable_effect_pct / 100.0);
    if !(0.0..=1.0).contains(&target_rate) {
        return Err(AnalysisError::InvalidParameter {
            name: "min_detectable_effect_pct",
            value: min_detectable_effect_pct,
            expected: "a lift keeping the target rate within [0, 1]",
        });
    }
    let effect_size = cohens_h(baseline_rate, target_rate)?;
    let required = required_sample_size(effect_size, config.alpha, config.power_target)?;
    Ok(PowerAnalysisResult {
        required_sample_size: required,
        achieved_power: None,
        effect_size,
        alpha: config.alpha,
        power_target: config.power_target,
        analysis_type: MetricKind::Binary,
    })
}
