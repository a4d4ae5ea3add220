//! End-to-end experiment analysis.
//!
//! Runs the power planner, the frequentist tester, and the Bayesian
//! engine over every supplied metric and synthesizes one recommendation.
//! Metrics have no data dependency on each other, so they are analyzed in
//! parallel; within one metric the frequentist and Bayesian branches run
//! concurrently. Synthesis happens only after every branch has joined.
//!
//! Test selection for continuous metrics follows the diagnostics: Welch's
//! t-test when Shapiro-Wilk does not reject normality in either group,
//! Mann-Whitney U otherwise. Binary metrics use the chi-square test.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analysis::bayes::{BayesianEngine, BetaPrior, GaussianPrior};
use crate::analysis::decision::{synthesize, MetricEvidence};
use crate::analysis::frequentist::{self, Alternative};
use crate::analysis::power;
use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::result::{
    AssumptionCheck, BayesianTestResult, HypothesisTestResult, PowerAnalysisResult, Recommendation,
};
use crate::stats::Moments;
use crate::types::{MetricKind, MetricSample};

/// Full analysis bundle for one metric.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricReport {
    /// Metric name.
    pub metric: String,
    /// Design-time power analysis with the achieved power filled in at
    /// the observed sample sizes.
    pub power: PowerAnalysisResult,
    /// The selected significance test.
    pub frequentist: HypothesisTestResult,
    /// Bayesian comparison.
    pub bayesian: BayesianTestResult,
    /// Shapiro-Wilk checks for (control, variant). None for binary
    /// metrics, or when a group was too degenerate to assess.
    pub normality: Option<(AssumptionCheck, AssumptionCheck)>,
    /// Brown-Forsythe variance homogeneity check. None for binary
    /// metrics, or when the deviations were too degenerate to assess.
    pub variance_homogeneity: Option<AssumptionCheck>,
}

/// Joined report across all metrics, plus the final recommendation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentReport {
    /// Per-metric bundles, in input order.
    pub metrics: Vec<MetricReport>,
    /// The synthesized GO/CAUTION/NO-GO call.
    pub recommendation: Recommendation,
}

/// Orchestrates all analyses for one experiment.
#[derive(Debug)]
pub struct ExperimentAnalyzer {
    config: AnalysisConfig,
    engine: BayesianEngine,
    min_detectable_effect_pct: f64,
}

impl ExperimentAnalyzer {
    /// Analyzer with the conjugate Bayesian solver and a 5% minimum
    /// detectable effect for the power design.
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            engine: BayesianEngine::conjugate(),
            min_detectable_effect_pct: 5.0,
        }
    }

    /// Use the seeded Monte-Carlo posterior solver instead of the
    /// conjugate default.
    pub fn with_sampling_solver(mut self) -> Self {
        self.engine = BayesianEngine::sampling();
        self
    }

    /// Set the minimum detectable effect (percent change) the power
    /// design plans for.
    pub fn min_detectable_effect_pct(mut self, pct: f64) -> Self {
        assert!(
            pct.is_finite() && pct != 0.0,
            "min_detectable_effect_pct must be a non-zero finite percentage"
        );
        self.min_detectable_effect_pct = pct;
        self
    }

    /// Analyze every metric and synthesize one recommendation.
    pub fn analyze(&self, samples: &[MetricSample]) -> Result<ExperimentReport> {
        if samples.is_empty() {
            return Err(AnalysisError::InsufficientData {
                test: "experiment analysis",
                reason: "no metric samples were supplied".to_string(),
            });
        }
        self.config.validate()?;

        // Independent metrics fan out; collect() is the join barrier.
        let metrics = samples
            .par_iter()
            .map(|sample| self.analyze_metric(sample))
            .collect::<Result<Vec<_>>>()?;

        let evidence: Vec<MetricEvidence<'_>> = metrics
            .iter()
            .map(|report| MetricEvidence::new(&report.metric, &report.frequentist, &report.bayesian))
            .collect();
        let recommendation = synthesize(&evidence, &self.config)?;

        info!(
            decision = %recommendation.decision,
            confidence = recommendation.confidence_score,
            metrics = metrics.len(),
            "experiment analysis complete"
        );
        Ok(ExperimentReport {
            metrics,
            recommendation,
        })
    }

    fn analyze_metric(&self, sample: &MetricSample) -> Result<MetricReport> {
        sample.validate(2)?;
        info!(metric = %sample.name, kind = ?sample.kind, "analyzing metric");
        match sample.kind {
            MetricKind::Continuous => self.analyze_continuous(sample),
            MetricKind::Binary => self.analyze_binary(sample),
        }
    }

    fn analyze_continuous(&self, sample: &MetricSample) -> Result<MetricReport> {
        let control = &sample.control;
        let variant = &sample.variant;

        let (frequentist_branch, bayesian) = rayon::join(
            || self.frequentist_continuous(control, variant),
            || {
                self.engine.analyze_continuous_metric(
                    control,
                    variant,
                    GaussianPrior::default(),
                    &self.config,
                )
            },
        );
        let (test, normality, variance_homogeneity) = frequentist_branch?;
        let bayesian = bayesian?;

        let baseline = Moments::of(control);
        let mut power = power::design_continuous(
            baseline.mean,
            baseline.std(),
            self.min_detectable_effect_pct,
            &self.config,
        )?;
        power.achieved_power = Some(power::achieved_power_unequal(
            power.effect_size,
            control.len() as u64,
            variant.len() as u64,
            self.config.alpha,
        )?);

        Ok(MetricReport {
            metric: sample.name.clone(),
            power,
            frequentist: test,
            bayesian,
            normality,
            variance_homogeneity,
        })
    }

    // Diagnostics plus the diagnostic-driven choice between Welch's
    // t-test and Mann-Whitney U.
    #[allow(clippy::type_complexity)]
    fn frequentist_continuous(
        &self,
        control: &[f64],
        variant: &[f64],
    ) -> Result<(
        HypothesisTestResult,
        Option<(AssumptionCheck, AssumptionCheck)>,
        Option<AssumptionCheck>,
    )> {
        let normality = match (
            frequentist::check_normality(control),
            frequentist::check_normality(variant),
        ) {
            (Ok(control_check), Ok(variant_check)) => Some((control_check, variant_check)),
            _ => None,
        };
        let variance_homogeneity = frequentist::check_equal_variance(control, variant).ok();

        let assume_normal = normality
            .map(|(control_check, variant_check)| control_check.passed() && variant_check.passed())
            .unwrap_or(true);

        let test = if assume_normal {
            frequentist::welch_ttest(control, variant, Alternative::TwoSided, &self.config)?
        } else {
            frequentist::mann_whitney_u(control, variant, Alternative::TwoSided, &self.config)?
        };
        Ok((test, normality, variance_homogeneity))
    }

    fn analyze_binary(&self, sample: &MetricSample) -> Result<MetricReport> {
        let ((control_successes, control_total), (variant_successes, variant_total)) =
            sample.counts();

        let (frequentist_result, bayesian) = rayon::join(
            || {
                frequentist::chi_square_test(
                    control_successes,
                    control_total,
                    variant_successes,
                    variant_total,
                    false,
                    &self.config,
                )
            },
            || {
                self.engine.analyze_binary_metric(
                    control_successes,
                    control_total,
                    variant_successes,
                    variant_total,
                    BetaPrior::default(),
                    &self.config,
                )
            },
        );
        let frequentist_result = frequentist_result?;
        let bayesian = bayesian?;

        let baseline_rate = control_successes as f64 / control_total as f64;
        let mut power =
            power::design_binary(baseline_rate, self.min_detectable_effect_pct, &self.config)?;
        power.achieved_power = Some(power::achieved_power_unequal(
            power.effect_size,
            control_total,
            variant_total,
            self.config.alpha,
        )?);

        Ok(MetricReport {
            metric: sample.name.clone(),
            power,
            frequentist: frequentist_result,
            bayesian,
            normality: None,
            variance_homogeneity: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Cycle a few value levels so both groups keep variance without any
    // randomness.
    fn wiggle(base: f64, n: usize) -> Vec<f64> {
        (0..n).map(|i| base + (i % 7) as f64).collect()
    }

    #[test]
    fn analyzer_requires_samples() {
        let analyzer = ExperimentAnalyzer::new(AnalysisConfig::default());
        assert!(analyzer.analyze(&[]).is_err());
    }

    #[test]
    fn continuous_metric_end_to_end() {
        let analyzer = ExperimentAnalyzer::new(AnalysisConfig::default());
        let sample = MetricSample::continuous("duration", wiggle(450.0, 200), wiggle(460.0, 200));
        let report = analyzer.analyze(&[sample]).unwrap();
        assert_eq!(report.metrics.len(), 1);
        let metric = &report.metrics[0];
        assert!(metric.power.achieved_power.is_some());
        assert!(metric.frequentist.favors_variant());
        assert!(metric.bayesian.prob_variant_better > 0.95);
    }

    #[test]
    fn binary_metric_end_to_end() {
        let analyzer = ExperimentAnalyzer::new(AnalysisConfig::default());
        let mut control = vec![1.0; 400];
        control.extend(vec![0.0; 4_600]);
        let mut variant = vec![1.0; 520];
        variant.extend(vec![0.0; 4_480]);
        let sample = MetricSample::binary("conversion", control, variant).unwrap();
        let report = analyzer.analyze(&[sample]).unwrap();
        let metric = &report.metrics[0];
        assert!(metric.normality.is_none());
        assert!(metric.bayesian.prob_variant_better > 0.95);
        assert!(metric.power.achieved_power.is_some());
    }

    #[test]
    fn reports_preserve_metric_order() {
        let analyzer = ExperimentAnalyzer::new(AnalysisConfig::default());
        let samples = vec![
            MetricSample::continuous("a", wiggle(10.0, 50), wiggle(10.0, 50)),
            MetricSample::continuous("b", wiggle(20.0, 50), wiggle(20.0, 50)),
        ];
        let report = analyzer.analyze(&samples).unwrap();
        assert_eq!(report.metrics[0].metric, "a");
        assert_eq!(report.metrics[1].metric, "b");
    }
}
