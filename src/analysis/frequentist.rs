//! Frequentist significance tests and assumption diagnostics.
//!
//! Three two-sample tests oriented variant minus control:
//!
//! - Welch t-test (no equal-variance assumption) with a confidence
//!   interval on the mean difference at the Welch-Satterthwaite degrees
//!   of freedom
//! - chi-square test of independence on a 2x2 contingency table
//! - Mann-Whitney U, the rank-based alternative for non-normal data
//!
//! plus the diagnostics that steer test selection: Shapiro-Wilk for
//! normality and the median-centered Levene test (Brown-Forsythe) for
//! variance homogeneity. Diagnostics are informational; a failed check is
//! not an error.

use statrs::distribution::{ChiSquared, ContinuousCDF, FisherSnedecor, Normal, StudentsT};

use crate::analysis::effect::{cohens_d, cohens_h};
use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::result::{AssumptionCheck, HypothesisTestResult, TestKind};
use crate::stats::{average_ranks, median, shapiro_wilk, tie_correction, Moments};
use crate::types::ensure_group;

/// Direction of the alternative hypothesis, oriented variant vs control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alternative {
    /// The groups differ in either direction.
    TwoSided,
    /// The variant is smaller than the control.
    Less,
    /// The variant is larger than the control.
    Greater,
}

fn std_normal() -> Normal {
    Normal::new(0.0, 1.0).expect("standard normal parameters are valid")
}

fn verdict_text(is_significant: bool) -> String {
    if is_significant {
        "Reject H0: statistically significant difference between groups".to_string()
    } else {
        "Fail to reject H0: no statistically significant difference between groups".to_string()
    }
}

/// Welch's two-sample t-test.
///
/// The statistic is `(mean_variant - mean_control) / se` with
/// `se^2 = s_c^2/n_c + s_v^2/n_v`, referred to a Student's t distribution
/// at the Welch-Satterthwaite degrees of freedom. The confidence interval
/// on the mean difference uses the same degrees of freedom.
pub fn welch_ttest(
    control: &[f64],
    variant: &[f64],
    alternative: Alternative,
    config: &AnalysisConfig,
) -> Result<HypothesisTestResult> {
    ensure_group("Welch t-test", "control", control)?;
    ensure_group("Welch t-test", "variant", variant)?;

    let c = Moments::of(control);
    let v = Moments::of(variant);

    let sem_sq_c = c.variance / c.n as f64;
    let sem_sq_v = v.variance / v.n as f64;
    let se_sq = sem_sq_c + sem_sq_v;
    if se_sq <= 0.0 {
        return Err(AnalysisError::InsufficientData {
            test: "Welch t-test",
            reason: "both groups have zero variance".to_string(),
        });
    }
    let se = se_sq.sqrt();
    let diff = v.mean - c.mean;
    let statistic = diff / se;

    // Welch-Satterthwaite degrees of freedom.
    let df = se_sq * se_sq
        / (sem_sq_c * sem_sq_c / (c.n as f64 - 1.0) + sem_sq_v * sem_sq_v / (v.n as f64 - 1.0));
    let t_dist = StudentsT::new(0.0, 1.0, df).expect("Welch degrees of freedom are positive");

    let p_value = match alternative {
        Alternative::TwoSided => (2.0 * (1.0 - t_dist.cdf(statistic.abs()))).min(1.0),
        Alternative::Greater => 1.0 - t_dist.cdf(statistic),
        Alternative::Less => t_dist.cdf(statistic),
    };

    let t_critical = t_dist.inverse_cdf(1.0 - config.alpha / 2.0);
    let effect_size = cohens_d(c.mean, c.std(), c.n as u64, v.mean, v.std(), v.n as u64)?;

    let is_significant = p_value < config.alpha;
    Ok(HypothesisTestResult {
        test: TestKind::WelchT,
        statistic,
        p_value,
        effect_size,
        ci_lower: diff - t_critical * se,
        ci_upper: diff + t_critical * se,
        mean_control: c.mean,
        mean_variant: v.mean,
        alpha: config.alpha,
        is_significant,
        recommendation: verdict_text(is_significant),
    })
}

/// Chi-square test of independence for two binary groups.
///
/// Builds the 2x2 contingency table of successes and failures, with
/// Yates' continuity correction opt-in (`yates = false` by default in the
/// pipeline). The effect size is Cohen's h between the observed rates;
/// the test defines no confidence interval, so both CI fields are NaN.
pub fn chi_square_test(
    control_successes: u64,
    control_total: u64,
    variant_successes: u64,
    variant_total: u64,
    yates: bool,
    config: &AnalysisConfig,
) -> Result<HypothesisTestResult> {
    for (name, successes, total) in [
        ("control_successes", control_successes, control_total),
        ("variant_successes", variant_successes, variant_total),
    ] {
        if total < 2 {
            return Err(AnalysisError::InsufficientData {
                test: "chi-square test",
                reason: format!("group total {total} is below the 2-observation minimum"),
            });
        }
        if successes > total {
            return Err(AnalysisError::InvalidParameter {
                name,
                value: successes as f64,
                expected: "at most the group total",
            });
        }
    }

    let observed = [
        [control_successes as f64, (control_total - control_successes) as f64],
        [variant_successes as f64, (variant_total - variant_successes) as f64],
    ];
    let row_totals = [control_total as f64, variant_total as f64];
    let col_totals = [
        observed[0][0] + observed[1][0],
        observed[0][1] + observed[1][1],
    ];
    let grand_total = row_totals[0] + row_totals[1];

    if col_totals[0] == 0.0 || col_totals[1] == 0.0 {
        return Err(AnalysisError::DegenerateInput {
            context: "chi-square test",
            reason: "every observation fell in the same outcome column".to_string(),
        });
    }

    let correction = if yates { 0.5 } else { 0.0 };
    let mut statistic = 0.0;
    for (row, &row_total) in observed.iter().zip(row_totals.iter()) {
        for (cell, &col_total) in row.iter().zip(col_totals.iter()) {
            let expected = row_total * col_total / grand_total;
            let deviation = ((cell - expected).abs() - correction).max(0.0);
            statistic += deviation * deviation / expected;
        }
    }

    let chi2 = ChiSquared::new(1.0).expect("one degree of freedom is valid");
    let p_value = 1.0 - chi2.cdf(statistic);

    let rate_control = control_successes as f64 / control_total as f64;
    let rate_variant = variant_successes as f64 / variant_total as f64;
    let effect_size = cohens_h(rate_control, rate_variant)?;

    let is_significant = p_value < config.alpha;
    Ok(HypothesisTestResult {
        test: TestKind::ChiSquare,
        statistic,
        p_value,
        effect_size,
        ci_lower: f64::NAN,
        ci_upper: f64::NAN,
        mean_control: rate_control,
        mean_variant: rate_variant,
        alpha: config.alpha,
        is_significant,
        recommendation: verdict_text(is_significant),
    })
}

/// Mann-Whitney U test, the rank-based alternative to the t-test.
///
/// Uses average ranks with tie correction and the continuity-corrected
/// normal approximation. The reported statistic is the control group's U;
/// the effect size is the rank-biserial correlation
/// `r = 1 - 2 U_control / (n_c n_v)`, positive when the variant tends to
/// be larger.
pub fn mann_whitney_u(
    control: &[f64],
    variant: &[f64],
    alternative: Alternative,
    config: &AnalysisConfig,
) -> Result<HypothesisTestResult> {
    ensure_group("Mann-Whitney U test", "control", control)?;
    ensure_group("Mann-Whitney U test", "variant", variant)?;

    let nc = control.len() as f64;
    let nv = variant.len() as f64;
    let n = nc + nv;

    let mut combined: Vec<(f64, usize)> = Vec::with_capacity(control.len() + variant.len());
    combined.extend(control.iter().map(|&x| (x, 0)));
    combined.extend(variant.iter().map(|&x| (x, 1)));
    combined.sort_by(|a, b| a.0.total_cmp(&b.0));

    let ranks = average_ranks(&combined);
    let control_rank_sum: f64 = combined
        .iter()
        .zip(ranks.iter())
        .filter(|((_, group), _)| *group == 0)
        .map(|(_, &rank)| rank)
        .sum();
    let u_control = control_rank_sum - nc * (nc + 1.0) / 2.0;

    let ties = tie_correction(&combined);
    let mu = nc * nv / 2.0;
    let sigma_sq = nc * nv / 12.0 * ((n + 1.0) - ties / (n * (n - 1.0)));
    if sigma_sq <= 0.0 {
        return Err(AnalysisError::InsufficientData {
            test: "Mann-Whitney U test",
            reason: "all observations are tied".to_string(),
        });
    }
    let sigma = sigma_sq.sqrt();

    let normal = std_normal();
    // Continuity-corrected normal approximation. A small U for the
    // control group means the variant tends to rank higher.
    let p_value = match alternative {
        Alternative::TwoSided => {
            let z = ((u_control - mu).abs() - 0.5).max(0.0) / sigma;
            (2.0 * (1.0 - normal.cdf(z))).min(1.0)
        }
        Alternative::Greater => normal.cdf((u_control - mu + 0.5) / sigma),
        Alternative::Less => 1.0 - normal.cdf((u_control - mu - 0.5) / sigma),
    };

    let effect_size = 1.0 - 2.0 * u_control / (nc * nv);

    let is_significant = p_value < config.alpha;
    Ok(HypothesisTestResult {
        test: TestKind::MannWhitneyU,
        statistic: u_control,
        p_value,
        effect_size,
        ci_lower: f64::NAN,
        ci_upper: f64::NAN,
        mean_control: Moments::of(control).mean,
        mean_variant: Moments::of(variant).mean,
        alpha: config.alpha,
        is_significant,
        recommendation: verdict_text(is_significant),
    })
}

/// Shapiro-Wilk normality diagnostic.
///
/// Purely informational: `passed()` reads p >= 0.05 as "normality not
/// rejected". Needs at least 3 finite observations with non-zero spread.
pub fn check_normality(sample: &[f64]) -> Result<AssumptionCheck> {
    let (statistic, p_value) = shapiro_wilk(sample)?;
    Ok(AssumptionCheck { statistic, p_value })
}

/// Variance homogeneity diagnostic: median-centered Levene test
/// (Brown-Forsythe), an F test on the absolute deviations from each
/// group's median.
pub fn check_equal_variance(control: &[f64], variant: &[f64]) -> Result<AssumptionCheck> {
    ensure_group("Levene test", "control", control)?;
    ensure_group("Levene test", "variant", variant)?;

    let deviations = |values: &[f64]| -> Vec<f64> {
        let center = median(values);
        values.iter().map(|x| (x - center).abs()).collect()
    };
    let z_control = deviations(control);
    let z_variant = deviations(variant);

    let nc = z_control.len() as f64;
    let nv = z_variant.len() as f64;
    let n = nc + nv;

    let mean_c = Moments::of(&z_control).mean;
    let mean_v = Moments::of(&z_variant).mean;
    let grand_mean = (nc * mean_c + nv * mean_v) / n;

    let ss_between =
        nc * (mean_c - grand_mean).powi(2) + nv * (mean_v - grand_mean).powi(2);
    let ss_within: f64 = z_control.iter().map(|z| (z - mean_c).powi(2)).sum::<f64>()
        + z_variant.iter().map(|z| (z - mean_v).powi(2)).sum::<f64>();

    if ss_within <= 0.0 {
        if ss_between <= 0.0 {
            // Deviations are constant and identical across groups.
            return Ok(AssumptionCheck {
                statistic: 0.0,
                p_value: 1.0,
            });
        }
        return Err(AnalysisError::InsufficientData {
            test: "Levene test",
            reason: "within-group spread of deviations is zero".to_string(),
        });
    }

    let statistic = ss_between / (ss_within / (n - 2.0));
    let f_dist =
        FisherSnedecor::new(1.0, n - 2.0).expect("F distribution degrees of freedom are positive");
    let p_value = 1.0 - f_dist.cdf(statistic);

    Ok(AssumptionCheck { statistic, p_value })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AnalysisConfig {
        AnalysisConfig::default()
    }

    #[test]
    fn welch_identical_samples() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let result = welch_ttest(&data, &data, Alternative::TwoSided, &config()).unwrap();
        assert!((result.p_value - 1.0).abs() < 1e-12);
        assert!(!result.is_significant);
        assert!(result.effect_size.abs() < 1e-12);
        assert!(result.ci_lower < 0.0 && result.ci_upper > 0.0);
    }

    #[test]
    fn welch_detects_clear_shift() {
        let control: Vec<f64> = (0..40).map(|i| 10.0 + (i % 5) as f64).collect();
        let variant: Vec<f64> = (0..40).map(|i| 20.0 + (i % 5) as f64).collect();
        let result = welch_ttest(&control, &variant, Alternative::TwoSided, &config()).unwrap();
        assert!(result.is_significant);
        assert!(result.statistic > 0.0);
        assert!(result.favors_variant());
        assert!(result.ci_lower > 0.0);
    }

    #[test]
    fn welch_one_sided_direction() {
        let control = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let variant = vec![6.0, 7.0, 8.0, 9.0, 10.0];
        let greater = welch_ttest(&control, &variant, Alternative::Greater, &config()).unwrap();
        let less = welch_ttest(&control, &variant, Alternative::Less, &config()).unwrap();
        assert!(greater.p_value < 0.05);
        assert!(less.p_value > 0.95);
    }

    #[test]
    fn welch_rejects_zero_variance() {
        let flat = vec![5.0; 10];
        let err = welch_ttest(&flat, &flat, Alternative::TwoSided, &config()).unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData { .. }));
    }

    #[test]
    fn chi_square_known_table() {
        // 400/5000 vs 425/5000: expected cells 412.5 / 4587.5 give a
        // statistic of 0.825696.
        let result = chi_square_test(400, 5_000, 425, 5_000, false, &config()).unwrap();
        assert!((result.statistic - 0.825696).abs() < 1e-4);
        assert!(!result.is_significant);
        assert!(result.p_value > 0.3 && result.p_value < 0.45);
        assert!(result.ci_lower.is_nan() && result.ci_upper.is_nan());

        let expected_h = 2.0 * 0.085_f64.sqrt().asin() - 2.0 * 0.08_f64.sqrt().asin();
        assert!((result.effect_size - expected_h).abs() < 1e-6);
    }

    #[test]
    fn chi_square_yates_shrinks_statistic() {
        let plain = chi_square_test(400, 5_000, 425, 5_000, false, &config()).unwrap();
        let corrected = chi_square_test(400, 5_000, 425, 5_000, true, &config()).unwrap();
        assert!(corrected.statistic < plain.statistic);
    }

    #[test]
    fn chi_square_rejects_degenerate_table() {
        let err = chi_square_test(0, 100, 0, 100, false, &config()).unwrap_err();
        assert!(matches!(err, AnalysisError::DegenerateInput { .. }));
        assert!(chi_square_test(10, 5, 1, 100, false, &config()).is_err());
    }

    #[test]
    fn mann_whitney_separated_groups() {
        let control = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let variant = vec![6.0, 7.0, 8.0, 9.0, 10.0];
        let result = mann_whitney_u(&control, &variant, Alternative::TwoSided, &config()).unwrap();
        assert!(result.p_value < 0.05);
        // Complete separation: the control's U is 0 and r is 1.
        assert_eq!(result.statistic, 0.0);
        assert!((result.effect_size - 1.0).abs() < 1e-12);
    }

    #[test]
    fn mann_whitney_identical_groups() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let result = mann_whitney_u(&data, &data, Alternative::TwoSided, &config()).unwrap();
        assert!(result.p_value > 0.9);
        assert!(result.effect_size.abs() < 1e-12);
    }

    #[test]
    fn mann_whitney_all_tied_is_rejected() {
        let flat = vec![3.0; 8];
        let err = mann_whitney_u(&flat, &flat, Alternative::TwoSided, &config()).unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData { .. }));
    }

    #[test]
    fn levene_flags_unequal_spread() {
        let tight = vec![4.9, 5.0, 5.0, 5.1, 5.0, 4.95, 5.05, 5.0];
        let wide = vec![0.0, 3.0, 5.0, 7.0, 10.0, 1.0, 9.0, 5.0];
        let check = check_equal_variance(&tight, &wide).unwrap();
        assert!(!check.passed(), "p = {} should reject", check.p_value);
    }

    #[test]
    fn levene_accepts_equal_spread() {
        let a = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let b: Vec<f64> = a.iter().map(|x| x + 100.0).collect();
        let check = check_equal_variance(&a, &b).unwrap();
        assert!(check.passed());
    }

    #[test]
    fn normality_check_wraps_shapiro() {
        let skewed: Vec<f64> = (1..=60).map(|i| (i as f64).powi(3)).collect();
        let check = check_normality(&skewed).unwrap();
        assert!(!check.passed());
    }
}
