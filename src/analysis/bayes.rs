//! Bayesian posterior inference for two-group comparisons.
//!
//! Two conjugate models, one per metric kind:
//!
//! - **Normal-Normal** for continuous metrics: each group mean gets a
//!   Normal likelihood with plug-in sample variance and a
//!   weakly-informative Normal prior, so the posterior is Normal in
//!   closed form.
//! - **Beta-Binomial** for binary metrics: each group rate gets a
//!   Beta(prior_alpha + successes, prior_beta + failures) posterior.
//!
//! A [`PosteriorSolver`] strategy turns the two group posteriors into a
//! difference summary: P(variant > control), a credible interval, and the
//! expected loss of each choice. The exact [`ConjugateSolver`] is always
//! available and is the default. The [`SamplingSolver`] estimates the
//! same quantities from seeded Monte-Carlo draws; when it stalls (budget
//! exhausted or split-half disagreement) the engine answers with the
//! conjugate closed form instead and flags the result, so the analysis
//! never fails because of the sampler. Both paths share the same
//! posterior, so they agree in the large-sample limit up to Monte-Carlo
//! noise.

use std::fmt;
use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand_distr::Distribution;
use rand_xoshiro::Xoshiro256PlusPlus;
use statrs::distribution::{Beta, Continuous, ContinuousCDF, Normal};
use tracing::warn;

use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::result::BayesianTestResult;
use crate::stats::Moments;
use crate::types::ensure_group;

/// How often the sampling loop re-checks the time budget.
const BUDGET_CHECK_INTERVAL: usize = 256;

/// Maximum split-half disagreement in P(variant > control) before the
/// sampler is declared unconverged.
const CONVERGENCE_TOLERANCE: f64 = 0.1;

/// Cells for the deterministic Beta-difference integration.
const INTEGRATION_CELLS: usize = 2_048;

/// How many posterior standard deviations around the means the Beta
/// integration window spans. Mass outside is below 1e-30.
const INTEGRATION_SPAN: f64 = 12.0;

// ============================================================================
// Priors and posteriors
// ============================================================================

/// Normal prior on a group mean. The default is effectively uninformative.
#[derive(Debug, Clone, Copy)]
pub struct GaussianPrior {
    /// Prior mean.
    pub mean: f64,
    /// Prior standard deviation.
    pub std: f64,
}

impl Default for GaussianPrior {
    fn default() -> Self {
        Self {
            mean: 0.0,
            std: 1e6,
        }
    }
}

/// Beta prior on a group rate. The default Beta(1, 1) is uniform.
#[derive(Debug, Clone, Copy)]
pub struct BetaPrior {
    /// Prior success pseudo-count.
    pub alpha: f64,
    /// Prior failure pseudo-count.
    pub beta: f64,
}

impl Default for BetaPrior {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            beta: 1.0,
        }
    }
}

/// Normal posterior on one group's mean.
#[derive(Debug, Clone, Copy)]
pub struct NormalPosterior {
    /// Posterior mean.
    pub mean: f64,
    /// Posterior variance (always positive).
    pub variance: f64,
}

/// Beta posterior on one group's rate.
#[derive(Debug, Clone, Copy)]
pub struct BetaPosterior {
    /// Posterior success pseudo-count.
    pub alpha: f64,
    /// Posterior failure pseudo-count.
    pub beta: f64,
}

impl BetaPosterior {
    fn mean(&self) -> f64 {
        self.alpha / (self.alpha + self.beta)
    }

    fn variance(&self) -> f64 {
        let total = self.alpha + self.beta;
        self.alpha * self.beta / (total * total * (total + 1.0))
    }
}

// ============================================================================
// Solver strategy
// ============================================================================

/// Posterior-difference summary produced by a solver.
#[derive(Debug, Clone, Copy)]
pub struct PosteriorSummary {
    /// P(variant parameter > control parameter).
    pub prob_variant_better: f64,
    /// Credible interval on the posterior difference (variant - control).
    pub interval: (f64, f64),
    /// E[max(variant - control, 0)]: improvement forgone by keeping control.
    pub expected_loss_control: f64,
    /// E[max(control - variant, 0)]: regret of shipping the variant.
    pub expected_loss_variant: f64,
    /// Posterior mean of the control parameter.
    pub posterior_mean_control: f64,
    /// Posterior mean of the variant parameter.
    pub posterior_mean_variant: f64,
}

/// Why the sampling solver declined to answer.
///
/// Recovered locally by the conjugate fallback and logged as a warning;
/// never surfaced to the caller as an error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SolverStall {
    /// Split-half probability estimates disagreed beyond tolerance.
    NotConverged {
        /// Absolute disagreement between the two half estimates.
        disagreement: f64,
    },
    /// The configured time budget ran out mid-draw.
    TimedOut {
        /// Time spent before giving up.
        elapsed: Duration,
    },
}

impl fmt::Display for SolverStall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverStall::NotConverged { disagreement } => {
                write!(f, "split-half disagreement {disagreement:.3} exceeds tolerance")
            }
            SolverStall::TimedOut { elapsed } => {
                write!(f, "time budget exhausted after {elapsed:?}")
            }
        }
    }
}

/// Strategy for turning two group posteriors into a difference summary.
pub trait PosteriorSolver: Send + Sync {
    /// Summarize the difference of two Normal group posteriors.
    fn continuous(
        &self,
        control: NormalPosterior,
        variant: NormalPosterior,
        config: &AnalysisConfig,
    ) -> std::result::Result<PosteriorSummary, SolverStall>;

    /// Summarize the difference of two Beta group posteriors.
    fn binary(
        &self,
        control: BetaPosterior,
        variant: BetaPosterior,
        config: &AnalysisConfig,
    ) -> std::result::Result<PosteriorSummary, SolverStall>;
}

// ============================================================================
// Conjugate solver (exact)
// ============================================================================

/// Exact closed-form solver. Always available; also serves as the
/// fallback when the sampling solver stalls.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConjugateSolver;

impl PosteriorSolver for ConjugateSolver {
    fn continuous(
        &self,
        control: NormalPosterior,
        variant: NormalPosterior,
        config: &AnalysisConfig,
    ) -> std::result::Result<PosteriorSummary, SolverStall> {
        // The difference of two Normal posteriors is Normal.
        let mu = variant.mean - control.mean;
        let sigma = (control.variance + variant.variance).sqrt();
        debug_assert!(sigma > 0.0, "posterior variances are positive");

        let normal = std_normal();
        let prob_variant_better = normal.cdf(mu / sigma);

        let z = normal.inverse_cdf(0.5 + config.credible_mass / 2.0);
        let interval = (mu - z * sigma, mu + z * sigma);

        // E[max(D, 0)] for D ~ N(mu, sigma^2), then the mirror identity
        // E[max(-D, 0)] = E[max(D, 0)] - mu.
        let gain = mu * normal.cdf(mu / sigma) + sigma * normal.pdf(mu / sigma);
        Ok(PosteriorSummary {
            prob_variant_better,
            interval,
            expected_loss_control: gain.max(0.0),
            expected_loss_variant: (gain - mu).max(0.0),
            posterior_mean_control: control.mean,
            posterior_mean_variant: variant.mean,
        })
    }

    fn binary(
        &self,
        control: BetaPosterior,
        variant: BetaPosterior,
        config: &AnalysisConfig,
    ) -> std::result::Result<PosteriorSummary, SolverStall> {
        let dist_control = Beta::new(control.alpha, control.beta)
            .expect("posterior shape parameters are positive");
        let dist_variant = Beta::new(variant.alpha, variant.beta)
            .expect("posterior shape parameters are positive");
        // CDF of Beta(alpha + 1, beta), for the partial-mean identity
        // E[p 1(p < c)] = mean * F_{alpha+1,beta}(c).
        let dist_variant_up = Beta::new(variant.alpha + 1.0, variant.beta)
            .expect("posterior shape parameters are positive");

        let mean_control = control.mean();
        let mean_variant = variant.mean();

        // Integrate over the window holding essentially all control mass;
        // the two tail terms account for the remainder of P(v > c). The
        // expected-loss contribution outside the window is below 1e-30.
        let spread = control.variance().sqrt().max(variant.variance().sqrt());
        let mut lo = (mean_control.min(mean_variant) - INTEGRATION_SPAN * spread).max(0.0);
        let mut hi = (mean_control.max(mean_variant) + INTEGRATION_SPAN * spread).min(1.0);
        if !(lo.is_finite() && hi.is_finite() && lo < hi) {
            lo = 0.0;
            hi = 1.0;
        }

        let cdf_lo = dist_control.cdf(lo);
        let cdf_hi = dist_control.cdf(hi);
        let mut prob = cdf_lo * (1.0 - dist_variant.cdf(lo))
            + (1.0 - cdf_hi) * (1.0 - dist_variant.cdf(hi));
        let mut loss_variant = 0.0;

        let step = (hi - lo) / INTEGRATION_CELLS as f64;
        let mut prev_cdf = cdf_lo;
        for i in 0..INTEGRATION_CELLS {
            let right = if i + 1 == INTEGRATION_CELLS {
                hi
            } else {
                lo + step * (i + 1) as f64
            };
            let mid = lo + step * (i as f64 + 0.5);
            let cdf_right = if i + 1 == INTEGRATION_CELLS {
                cdf_hi
            } else {
                dist_control.cdf(right)
            };
            let weight = (cdf_right - prev_cdf).max(0.0);
            prev_cdf = cdf_right;
            if weight == 0.0 {
                continue;
            }

            let cdf_v = dist_variant.cdf(mid);
            prob += weight * (1.0 - cdf_v);
            // E[max(c - p_v, 0)] = c F_v(c) - mean_v F_{alpha+1,beta}(c).
            loss_variant += weight * (mid * cdf_v - mean_variant * dist_variant_up.cdf(mid));
        }

        let loss_variant = loss_variant.max(0.0);
        // E[max(D, 0)] - E[max(-D, 0)] = E[D].
        let loss_control = (loss_variant + mean_variant - mean_control).max(0.0);

        // Large-sample Normal approximation of the posterior difference
        // for the interval; converges to the sampled HDI as n grows.
        let mu = mean_variant - mean_control;
        let sigma = (control.variance() + variant.variance()).sqrt();
        let z = std_normal().inverse_cdf(0.5 + config.credible_mass / 2.0);

        Ok(PosteriorSummary {
            prob_variant_better: prob.clamp(0.0, 1.0),
            interval: (mu - z * sigma, mu + z * sigma),
            expected_loss_control: loss_control,
            expected_loss_variant: loss_variant,
            posterior_mean_control: mean_control,
            posterior_mean_variant: mean_variant,
        })
    }
}

// ============================================================================
// Sampling solver (Monte-Carlo)
// ============================================================================

/// Seeded Monte-Carlo solver.
///
/// Draws paired posterior samples with a Xoshiro256++ generator seeded
/// from the configuration, so the same configuration always reproduces
/// the same estimates.
#[derive(Debug, Clone, Copy, Default)]
pub struct SamplingSolver;

impl PosteriorSolver for SamplingSolver {
    fn continuous(
        &self,
        control: NormalPosterior,
        variant: NormalPosterior,
        config: &AnalysisConfig,
    ) -> std::result::Result<PosteriorSummary, SolverStall> {
        let sampler_control = rand_distr::Normal::new(control.mean, control.variance.sqrt())
            .expect("posterior standard deviation is positive and finite");
        let sampler_variant = rand_distr::Normal::new(variant.mean, variant.variance.sqrt())
            .expect("posterior standard deviation is positive and finite");
        let diffs = draw_differences(config, |rng| {
            sampler_variant.sample(rng) - sampler_control.sample(rng)
        })?;
        summarize_draws(&diffs, control.mean, variant.mean, config)
    }

    fn binary(
        &self,
        control: BetaPosterior,
        variant: BetaPosterior,
        config: &AnalysisConfig,
    ) -> std::result::Result<PosteriorSummary, SolverStall> {
        let sampler_control = rand_distr::Beta::new(control.alpha, control.beta)
            .expect("posterior shape parameters are positive");
        let sampler_variant = rand_distr::Beta::new(variant.alpha, variant.beta)
            .expect("posterior shape parameters are positive");
        let diffs = draw_differences(config, |rng| {
            sampler_variant.sample(rng) - sampler_control.sample(rng)
        })?;
        summarize_draws(&diffs, control.mean(), variant.mean(), config)
    }
}

fn draw_differences(
    config: &AnalysisConfig,
    mut draw: impl FnMut(&mut Xoshiro256PlusPlus) -> f64,
) -> std::result::Result<Vec<f64>, SolverStall> {
    let started = Instant::now();
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(config.seed);
    let mut diffs = Vec::with_capacity(config.posterior_draws);
    for i in 0..config.posterior_draws {
        if i % BUDGET_CHECK_INTERVAL == 0 && started.elapsed() >= config.time_budget {
            return Err(SolverStall::TimedOut {
                elapsed: started.elapsed(),
            });
        }
        diffs.push(draw(&mut rng));
    }
    Ok(diffs)
}

fn summarize_draws(
    diffs: &[f64],
    posterior_mean_control: f64,
    posterior_mean_variant: f64,
    config: &AnalysisConfig,
) -> std::result::Result<PosteriorSummary, SolverStall> {
    let n = diffs.len();
    let half = n / 2;

    // Split-half agreement is the convergence diagnostic: with a healthy
    // chain both halves estimate the same exceedance probability.
    let first = exceedance(&diffs[..half]);
    let second = exceedance(&diffs[half..]);
    let disagreement = (first - second).abs();
    if disagreement > CONVERGENCE_TOLERANCE {
        return Err(SolverStall::NotConverged { disagreement });
    }

    let prob_variant_better = exceedance(diffs);

    let mut sorted = diffs.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let interval = shortest_interval(&sorted, config.credible_mass);

    let nf = n as f64;
    let loss_control = diffs.iter().map(|d| d.max(0.0)).sum::<f64>() / nf;
    let loss_variant = diffs.iter().map(|d| (-d).max(0.0)).sum::<f64>() / nf;

    Ok(PosteriorSummary {
        prob_variant_better,
        interval,
        expected_loss_control: loss_control,
        expected_loss_variant: loss_variant,
        posterior_mean_control,
        posterior_mean_variant,
    })
}

fn exceedance(diffs: &[f64]) -> f64 {
    if diffs.is_empty() {
        return 0.5;
    }
    diffs.iter().filter(|d| **d > 0.0).count() as f64 / diffs.len() as f64
}

/// Shortest contiguous window of sorted draws holding `mass` of them:
/// the sample HDI for a unimodal posterior.
fn shortest_interval(sorted: &[f64], mass: f64) -> (f64, f64) {
    let n = sorted.len();
    let k = ((mass * n as f64).ceil() as usize).clamp(1, n);
    if k == n {
        return (sorted[0], sorted[n - 1]);
    }
    let mut best_start = 0;
    let mut best_width = f64::INFINITY;
    for start in 0..=(n - k) {
        let width = sorted[start + k - 1] - sorted[start];
        if width < best_width {
            best_width = width;
            best_start = start;
        }
    }
    (sorted[best_start], sorted[best_start + k - 1])
}

fn std_normal() -> Normal {
    Normal::new(0.0, 1.0).expect("standard normal parameters are valid")
}

// ============================================================================
// Engine
// ============================================================================

/// Bayesian comparison engine with a pluggable posterior solver.
pub struct BayesianEngine {
    solver: Box<dyn PosteriorSolver>,
    exact: bool,
}

impl fmt::Debug for BayesianEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BayesianEngine")
            .field("solver", if self.exact { &"conjugate" } else { &"sampling" })
            .finish()
    }
}

impl Default for BayesianEngine {
    fn default() -> Self {
        Self::conjugate()
    }
}

impl BayesianEngine {
    /// Engine using the exact conjugate solver.
    pub fn conjugate() -> Self {
        Self {
            solver: Box::new(ConjugateSolver),
            exact: true,
        }
    }

    /// Engine using the seeded Monte-Carlo solver. The conjugate fallback
    /// is retained for stalls.
    pub fn sampling() -> Self {
        Self {
            solver: Box::new(SamplingSolver),
            exact: false,
        }
    }

    /// Compare two continuous samples under the Normal-Normal model.
    pub fn analyze_continuous_metric(
        &self,
        control: &[f64],
        variant: &[f64],
        prior: GaussianPrior,
        config: &AnalysisConfig,
    ) -> Result<BayesianTestResult> {
        ensure_group("Bayesian continuous analysis", "control", control)?;
        ensure_group("Bayesian continuous analysis", "variant", variant)?;
        validate_gaussian_prior(&prior)?;

        let moments_control = Moments::of(control);
        let moments_variant = Moments::of(variant);
        for (label, moments) in [("control", &moments_control), ("variant", &moments_variant)] {
            if moments.variance <= 0.0 {
                return Err(AnalysisError::InsufficientData {
                    test: "Bayesian continuous analysis",
                    reason: format!("{label} group has zero variance"),
                });
            }
        }

        let posterior_control = normal_posterior(&moments_control, prior);
        let posterior_variant = normal_posterior(&moments_variant, prior);

        let (summary, approximate) = match self
            .solver
            .continuous(posterior_control, posterior_variant, config)
        {
            Ok(summary) => (summary, self.exact),
            Err(stall) => {
                warn!(%stall, "posterior sampler stalled; answering with the conjugate closed form");
                let summary = ConjugateSolver
                    .continuous(posterior_control, posterior_variant, config)
                    .expect("the conjugate solver never stalls");
                (summary, true)
            }
        };
        Ok(finish(summary, approximate, config))
    }

    /// Compare two binary groups under the Beta-Binomial model.
    #[allow(clippy::too_many_arguments)]
    pub fn analyze_binary_metric(
        &self,
        control_successes: u64,
        control_total: u64,
        variant_successes: u64,
        variant_total: u64,
        prior: BetaPrior,
        config: &AnalysisConfig,
    ) -> Result<BayesianTestResult> {
        for (name, successes, total) in [
            ("control_successes", control_successes, control_total),
            ("variant_successes", variant_successes, variant_total),
        ] {
            if total < 2 {
                return Err(AnalysisError::InsufficientData {
                    test: "Bayesian binary analysis",
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
        validate_beta_prior(&prior)?;

        let posterior_control = BetaPosterior {
            alpha: prior.alpha + control_successes as f64,
            beta: prior.beta + (control_total - control_successes) as f64,
        };
        let posterior_variant = BetaPosterior {
            alpha: prior.alpha + variant_successes as f64,
            beta: prior.beta + (variant_total - variant_successes) as f64,
        };

        let (summary, approximate) = match self
            .solver
            .binary(posterior_control, posterior_variant, config)
        {
            Ok(summary) => (summary, self.exact),
            Err(stall) => {
                warn!(%stall, "posterior sampler stalled; answering with the conjugate closed form");
                let summary = ConjugateSolver
                    .binary(posterior_control, posterior_variant, config)
                    .expect("the conjugate solver never stalls");
                (summary, true)
            }
        };
        Ok(finish(summary, approximate, config))
    }
}

fn normal_posterior(moments: &Moments, prior: GaussianPrior) -> NormalPosterior {
    let n = moments.n as f64;
    let prior_precision = 1.0 / (prior.std * prior.std);
    let data_precision = n / moments.variance;
    let variance = 1.0 / (prior_precision + data_precision);
    let mean = variance * (prior.mean * prior_precision + moments.mean * data_precision);
    NormalPosterior { mean, variance }
}

fn validate_gaussian_prior(prior: &GaussianPrior) -> Result<()> {
    if !prior.mean.is_finite() {
        return Err(AnalysisError::InvalidParameter {
            name: "prior_mean",
            value: prior.mean,
            expected: "a finite prior mean",
        });
    }
    if !prior.std.is_finite() || prior.std <= 0.0 {
        return Err(AnalysisError::InvalidParameter {
            name: "prior_std",
            value: prior.std,
            expected: "a finite, positive prior standard deviation",
        });
    }
    Ok(())
}

fn validate_beta_prior(prior: &BetaPrior) -> Result<()> {
    for (name, value) in [("prior_alpha", prior.alpha), ("prior_beta", prior.beta)] {
        if !value.is_finite() || value <= 0.0 {
            return Err(AnalysisError::InvalidParameter {
                name,
                value,
                expected: "a finite, positive shape parameter",
            });
        }
    }
    Ok(())
}

fn finish(
    summary: PosteriorSummary,
    used_approximation: bool,
    config: &AnalysisConfig,
) -> BayesianTestResult {
    let prob = summary.prob_variant_better.clamp(0.0, 1.0);
    BayesianTestResult {
        prob_variant_better: prob,
        prob_control_better: 1.0 - prob,
        hdi_lower: summary.interval.0,
        hdi_upper: summary.interval.1,
        credible_mass: config.credible_mass,
        expected_loss_control: summary.expected_loss_control,
        expected_loss_variant: summary.expected_loss_variant,
        posterior_mean_control: summary.posterior_mean_control,
        posterior_mean_variant: summary.posterior_mean_variant,
        used_approximation,
        recommendation: recommendation_text(prob),
    }
}

fn recommendation_text(prob_variant_better: f64) -> String {
    if prob_variant_better > 0.95 {
        "Strong evidence that the variant outperforms the control".to_string()
    } else if prob_variant_better > 0.80 {
        "Moderate evidence that the variant outperforms the control".to_string()
    } else if prob_variant_better < 0.20 {
        "Strong evidence that the control outperforms the variant".to_string()
    } else {
        "Insufficient evidence to separate the groups; more data needed".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AnalysisConfig {
        AnalysisConfig::default()
    }

    fn shifted_samples(shift: f64) -> (Vec<f64>, Vec<f64>) {
        let control: Vec<f64> = (0..60).map(|i| 10.0 + (i % 5) as f64 * 0.1).collect();
        let variant: Vec<f64> = control.iter().map(|x| x + shift).collect();
        (control, variant)
    }

    #[test]
    fn conjugate_continuous_detects_shift() {
        let (control, variant) = shifted_samples(1.0);
        let engine = BayesianEngine::conjugate();
        let result = engine
            .analyze_continuous_metric(&control, &variant, GaussianPrior::default(), &config())
            .unwrap();
        assert!(result.prob_variant_better > 0.99);
        assert!(result.used_approximation);
        assert!(result.hdi_lower > 0.0, "interval should exclude zero");
        assert!(result.expected_loss_variant < result.expected_loss_control);
    }

    #[test]
    fn conjugate_continuous_symmetric_when_identical() {
        let (control, _) = shifted_samples(0.0);
        let engine = BayesianEngine::conjugate();
        let result = engine
            .analyze_continuous_metric(&control, &control, GaussianPrior::default(), &config())
            .unwrap();
        assert!((result.prob_variant_better - 0.5).abs() < 1e-9);
        assert!(
            (result.expected_loss_control - result.expected_loss_variant).abs() < 1e-12,
            "losses are symmetric for identical groups"
        );
    }

    #[test]
    fn expected_loss_identity_continuous() {
        let (control, variant) = shifted_samples(0.02);
        let engine = BayesianEngine::conjugate();
        let result = engine
            .analyze_continuous_metric(&control, &variant, GaussianPrior::default(), &config())
            .unwrap();
        let mean_diff = result.posterior_mean_variant - result.posterior_mean_control;
        assert!(
            (result.expected_loss_control - result.expected_loss_variant - mean_diff).abs() < 1e-9,
            "loss difference must equal the posterior mean difference"
        );
    }

    #[test]
    fn conjugate_binary_equal_counts_is_even() {
        let engine = BayesianEngine::conjugate();
        let result = engine
            .analyze_binary_metric(400, 5_000, 400, 5_000, BetaPrior::default(), &config())
            .unwrap();
        assert!(
            (result.prob_variant_better - 0.5).abs() < 5e-3,
            "got {}",
            result.prob_variant_better
        );
        assert!((result.expected_loss_control - result.expected_loss_variant).abs() < 1e-6);
    }

    #[test]
    fn conjugate_binary_detects_lift() {
        let engine = BayesianEngine::conjugate();
        let result = engine
            .analyze_binary_metric(400, 5_000, 520, 5_000, BetaPrior::default(), &config())
            .unwrap();
        assert!(result.prob_variant_better > 0.95);
        assert!(result.posterior_mean_variant > result.posterior_mean_control);
    }

    #[test]
    fn sampling_is_deterministic_for_a_seed() {
        let engine = BayesianEngine::sampling();
        let a = engine
            .analyze_binary_metric(400, 5_000, 430, 5_000, BetaPrior::default(), &config())
            .unwrap();
        let b = engine
            .analyze_binary_metric(400, 5_000, 430, 5_000, BetaPrior::default(), &config())
            .unwrap();
        assert_eq!(a.prob_variant_better, b.prob_variant_better);
        assert_eq!(a.hdi_lower, b.hdi_lower);
        assert_eq!(a.hdi_upper, b.hdi_upper);
    }

    #[test]
    fn sampling_agrees_with_conjugate() {
        let conjugate = BayesianEngine::conjugate()
            .analyze_binary_metric(400, 5_000, 430, 5_000, BetaPrior::default(), &config())
            .unwrap();
        let sampled = BayesianEngine::sampling()
            .analyze_binary_metric(400, 5_000, 430, 5_000, BetaPrior::default(), &config())
            .unwrap();
        assert!(
            (conjugate.prob_variant_better - sampled.prob_variant_better).abs() < 0.05,
            "conjugate {} vs sampled {}",
            conjugate.prob_variant_better,
            sampled.prob_variant_better
        );
        assert!(!sampled.used_approximation);
    }

    #[test]
    fn exhausted_budget_falls_back_to_conjugate() {
        let cfg = AnalysisConfig::default().time_budget(Duration::ZERO);
        let engine = BayesianEngine::sampling();
        let result = engine
            .analyze_binary_metric(400, 5_000, 430, 5_000, BetaPrior::default(), &cfg)
            .unwrap();
        assert!(result.used_approximation, "fallback must be flagged");
        assert!(result.prob_variant_better > 0.0 && result.prob_variant_better < 1.0);
    }

    #[test]
    fn zero_variance_is_rejected() {
        let flat = vec![5.0; 10];
        let engine = BayesianEngine::conjugate();
        let err = engine
            .analyze_continuous_metric(&flat, &flat, GaussianPrior::default(), &config())
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData { .. }));
    }

    #[test]
    fn invalid_priors_are_rejected() {
        let (control, variant) = shifted_samples(0.1);
        let engine = BayesianEngine::conjugate();
        let bad = GaussianPrior {
            mean: 0.0,
            std: 0.0,
        };
        assert!(engine
            .analyze_continuous_metric(&control, &variant, bad, &config())
            .is_err());
        assert!(engine
            .analyze_binary_metric(1, 10, 2, 10, BetaPrior { alpha: 0.0, beta: 1.0 }, &config())
            .is_err());
    }

    #[test]
    fn shortest_interval_covers_requested_mass() {
        let sorted: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let (lo, hi) = shortest_interval(&sorted, 0.95);
        assert!(hi - lo >= 94.0);
        assert!(hi - lo < 100.0);
    }

    #[test]
    fn recommendation_bands() {
        assert!(recommendation_text(0.99).contains("Strong"));
        assert!(recommendation_text(0.85).contains("Moderate"));
        assert!(recommendation_text(0.10).contains("control"));
        assert!(recommendation_text(0.5).contains("Insufficient"));
    }
}
