//! Result types produced by the analysis components.
//!
//! Every type here is an immutable value object: created once per call,
//! consumed by the synthesizer or the caller, never mutated. All of them
//! serialize with serde so the surrounding transport can render them in
//! its own format. Numeric fields are always finite, explicitly `None`,
//! or an explicit NaN where a test defines no value (chi-square has no
//! confidence interval) — a field is never silently omitted.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::MetricKind;

// ============================================================================
// Power analysis
// ============================================================================

/// Result of a power analysis / experiment design call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerAnalysisResult {
    /// Observations required per group to reach the power target.
    pub required_sample_size: u64,
    /// Power achieved at the observed sample size, when one was supplied.
    pub achieved_power: Option<f64>,
    /// Standardized effect the design detects (Cohen's d or Cohen's h).
    pub effect_size: f64,
    /// Significance level the design assumes.
    pub alpha: f64,
    /// Power target the design was solved for.
    pub power_target: f64,
    /// Continuous or binary design.
    pub analysis_type: MetricKind,
}

// ============================================================================
// Frequentist tests
// ============================================================================

/// Which significance test produced a [`HypothesisTestResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestKind {
    /// Two-sample t-test without the equal-variance assumption.
    WelchT,
    /// Chi-square test of independence on a 2x2 contingency table.
    ChiSquare,
    /// Rank-based non-parametric two-sample test.
    MannWhitneyU,
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestKind::WelchT => write!(f, "Welch t-test"),
            TestKind::ChiSquare => write!(f, "Chi-square test"),
            TestKind::MannWhitneyU => write!(f, "Mann-Whitney U test"),
        }
    }
}

/// Outcome of one frequentist significance test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HypothesisTestResult {
    /// The test that produced this result.
    pub test: TestKind,
    /// Test statistic (t, chi-square, or U depending on the test).
    pub statistic: f64,
    /// Two-sided (or requested one-sided) p-value.
    pub p_value: f64,
    /// Standardized effect size (Cohen's d, Cohen's h, or rank-biserial r).
    pub effect_size: f64,
    /// Lower bound of the confidence interval on the group difference.
    /// NaN for tests that define no interval (chi-square, Mann-Whitney).
    pub ci_lower: f64,
    /// Upper bound of the confidence interval; NaN like `ci_lower`.
    pub ci_upper: f64,
    /// Control-group location (mean for continuous data, rate for binary).
    pub mean_control: f64,
    /// Variant-group location.
    pub mean_variant: f64,
    /// Significance level the verdict was evaluated at.
    pub alpha: f64,
    /// `p_value < alpha`.
    pub is_significant: bool,
    /// Text derived from the numeric fields. Assert on the numbers, not
    /// on this string.
    pub recommendation: String,
}

impl HypothesisTestResult {
    /// True when the point estimate favors the variant.
    pub fn favors_variant(&self) -> bool {
        self.mean_variant > self.mean_control
    }
}

/// Diagnostic test outcome (normality, variance homogeneity).
///
/// Diagnostics are informational, not error conditions; a failed check
/// steers test selection rather than aborting the analysis.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AssumptionCheck {
    /// Test statistic (W for Shapiro-Wilk, F for Brown-Forsythe).
    pub statistic: f64,
    /// p-value of the diagnostic.
    pub p_value: f64,
}

impl AssumptionCheck {
    /// Conventional read: the assumption holds when p >= 0.05.
    pub fn passed(&self) -> bool {
        self.p_value >= 0.05
    }
}

// ============================================================================
// Bayesian comparison
// ============================================================================

/// Outcome of a Bayesian comparison of two groups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BayesianTestResult {
    /// Posterior probability that the variant's parameter exceeds the
    /// control's.
    pub prob_variant_better: f64,
    /// `1 - prob_variant_better` (two-sided, ignoring ties).
    pub prob_control_better: f64,
    /// Lower bound of the credible interval on the posterior difference.
    pub hdi_lower: f64,
    /// Upper bound of the credible interval.
    pub hdi_upper: f64,
    /// Probability mass the interval covers (e.g. 0.95).
    pub credible_mass: f64,
    /// Expected improvement forgone by keeping the control when the
    /// variant is actually better: E[max(theta_v - theta_c, 0)].
    pub expected_loss_control: f64,
    /// Expected regret of shipping the variant when the control is
    /// actually better: E[max(theta_c - theta_v, 0)].
    pub expected_loss_variant: f64,
    /// Posterior mean of the control group's parameter.
    pub posterior_mean_control: f64,
    /// Posterior mean of the variant group's parameter.
    pub posterior_mean_variant: f64,
    /// True when the closed-form conjugate path produced these numbers,
    /// either chosen directly or as the fallback after a sampler stall.
    pub used_approximation: bool,
    /// Text derived from `prob_variant_better`; assert on the numbers.
    pub recommendation: String,
}

// ============================================================================
// Decision synthesis
// ============================================================================

/// Final ship/no-ship call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    /// Strong combined evidence for the variant.
    Go,
    /// Mixed evidence; keep the experiment running or enlarge it.
    Caution,
    /// Insufficient evidence the variant helps.
    NoGo,
}

impl Decision {
    /// Map a confidence score onto the fixed decision bands.
    ///
    /// Boundaries are inclusive downward: 0.75 is GO and 0.60 is CAUTION.
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= 0.75 {
            Decision::Go
        } else if confidence >= 0.60 {
            Decision::Caution
        } else {
            Decision::NoGo
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Go => write!(f, "GO"),
            Decision::Caution => write!(f, "CAUTION"),
            Decision::NoGo => write!(f, "NO-GO"),
        }
    }
}

/// Synthesized recommendation across all analyzed metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    /// GO, CAUTION, or NO-GO.
    pub decision: Decision,
    /// Mean of all per-test evidence scores, in [0, 1].
    pub confidence_score: f64,
    /// One-line justification derived from the decision band.
    pub reasoning: String,
    /// One line per contributing test, stating direction and magnitude.
    pub evidence_summary: Vec<String>,
}
