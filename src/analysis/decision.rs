//! Evidence fusion into a single GO/CAUTION/NO-GO recommendation.
//!
//! The weighting is a fixed policy, not learned. Reports are regenerated
//! for audit, so identical inputs must always yield the identical
//! confidence score and decision: the scores below are constants, the
//! combination is an arithmetic mean, and nothing here consults a clock,
//! a generator, or global state.

use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::result::{BayesianTestResult, Decision, HypothesisTestResult, Recommendation};

// Per-test evidence scores.
const FREQUENTIST_FOR: f64 = 0.8;
const FREQUENTIST_INCONCLUSIVE: f64 = 0.5;
const FREQUENTIST_AGAINST: f64 = 0.2;
const BAYES_STRONG_FOR: f64 = 0.9;
const BAYES_MODERATE_FOR: f64 = 0.7;
const BAYES_INCONCLUSIVE: f64 = 0.5;
const BAYES_AGAINST: f64 = 0.1;

/// Evidence gathered for one metric.
#[derive(Debug, Clone, Copy)]
pub struct MetricEvidence<'a> {
    /// Metric name quoted in the evidence lines.
    pub metric: &'a str,
    /// Frequentist test outcome, when that branch ran.
    pub frequentist: Option<&'a HypothesisTestResult>,
    /// Bayesian outcome, when that branch ran.
    pub bayesian: Option<&'a BayesianTestResult>,
}

impl<'a> MetricEvidence<'a> {
    /// Evidence carrying both branches for one metric.
    pub fn new(
        metric: &'a str,
        frequentist: &'a HypothesisTestResult,
        bayesian: &'a BayesianTestResult,
    ) -> Self {
        Self {
            metric,
            frequentist: Some(frequentist),
            bayesian: Some(bayesian),
        }
    }
}

/// Combine all per-metric evidence into one recommendation.
///
/// Every supplied test contributes one score; the confidence is the
/// arithmetic mean of all of them, mapped onto the fixed decision bands
/// (0.75 and 0.60, both inclusive downward).
pub fn synthesize(
    evidence: &[MetricEvidence<'_>],
    config: &AnalysisConfig,
) -> Result<Recommendation> {
    let mut scores = Vec::new();
    let mut lines = Vec::new();

    for item in evidence {
        if let Some(test) = item.frequentist {
            let (score, line) = score_frequentist(item.metric, test);
            scores.push(score);
            lines.push(line);
        }
        if let Some(bayesian) = item.bayesian {
            let (score, line) = score_bayesian(item.metric, bayesian, config);
            scores.push(score);
            lines.push(line);
        }
    }

    if scores.is_empty() {
        return Err(AnalysisError::InsufficientData {
            test: "decision synthesis",
            reason: "no test results were supplied".to_string(),
        });
    }

    let confidence = scores.iter().sum::<f64>() / scores.len() as f64;
    let decision = Decision::from_confidence(confidence);
    let reasoning = match decision {
        Decision::Go => "Strong evidence that the variant outperforms the control",
        Decision::Caution => {
            "Mixed evidence; consider running the experiment longer or with a larger sample"
        }
        Decision::NoGo => "Insufficient evidence that the variant improves the metrics",
    }
    .to_string();

    Ok(Recommendation {
        decision,
        confidence_score: confidence,
        reasoning,
        evidence_summary: lines,
    })
}

fn score_frequentist(metric: &str, test: &HypothesisTestResult) -> (f64, String) {
    if test.is_significant {
        if test.favors_variant() {
            (
                FREQUENTIST_FOR,
                format!("✓ {} significant in favor of variant ({metric})", test.test),
            )
        } else {
            (
                FREQUENTIST_AGAINST,
                format!("✗ {} significant against variant ({metric})", test.test),
            )
        }
    } else {
        (
            FREQUENTIST_INCONCLUSIVE,
            format!("○ {} not significant ({metric})", test.test),
        )
    }
}

fn score_bayesian(
    metric: &str,
    bayesian: &BayesianTestResult,
    config: &AnalysisConfig,
) -> (f64, String) {
    let prob = bayesian.prob_variant_better;
    let score = if prob >= 0.95 {
        BAYES_STRONG_FOR
    } else if prob >= 0.80 {
        BAYES_MODERATE_FOR
    } else if prob <= 0.20 {
        BAYES_AGAINST
    } else {
        BAYES_INCONCLUSIVE
    };
    // The configured threshold only picks the marker shown in the line;
    // the score bands above are fixed.
    let marker = if prob >= config.threshold_go_nogo {
        '✓'
    } else if prob <= 1.0 - config.threshold_go_nogo {
        '✗'
    } else {
        '○'
    };
    let line = format!(
        "{marker} Bayesian: {:.1}% probability variant better ({metric})",
        prob * 100.0
    );
    (score, line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::TestKind;

    fn frequentist(p_value: f64, mean_control: f64, mean_variant: f64) -> HypothesisTestResult {
        HypothesisTestResult {
            test: TestKind::WelchT,
            statistic: 2.0,
            p_value,
            effect_size: 0.2,
            ci_lower: f64::NAN,
            ci_upper: f64::NAN,
            mean_control,
            mean_variant,
            alpha: 0.05,
            is_significant: p_value < 0.05,
            recommendation: String::new(),
        }
    }

    fn bayesian(prob: f64) -> BayesianTestResult {
        BayesianTestResult {
            prob_variant_better: prob,
            prob_control_better: 1.0 - prob,
            hdi_lower: -1.0,
            hdi_upper: 1.0,
            credible_mass: 0.95,
            expected_loss_control: 0.1,
            expected_loss_variant: 0.1,
            posterior_mean_control: 1.0,
            posterior_mean_variant: 1.1,
            used_approximation: true,
            recommendation: String::new(),
        }
    }

    #[test]
    fn go_boundary_is_inclusive() {
        // Significant in favor (0.8) plus moderate Bayesian (0.7): exactly 0.75.
        let test = frequentist(0.01, 1.0, 2.0);
        let bayes = bayesian(0.85);
        let evidence = [MetricEvidence::new("duration", &test, &bayes)];
        let rec = synthesize(&evidence, &AnalysisConfig::default()).unwrap();
        assert!((rec.confidence_score - 0.75).abs() < 1e-12);
        assert_eq!(rec.decision, Decision::Go);
        assert_eq!(rec.evidence_summary.len(), 2);
    }

    #[test]
    fn strong_evidence_goes() {
        let test = frequentist(0.001, 1.0, 2.0);
        let bayes = bayesian(0.99);
        let evidence = [MetricEvidence::new("conversion", &test, &bayes)];
        let rec = synthesize(&evidence, &AnalysisConfig::default()).unwrap();
        assert!((rec.confidence_score - 0.85).abs() < 1e-12);
        assert_eq!(rec.decision, Decision::Go);
    }

    #[test]
    fn evidence_against_blocks() {
        // Significant against (0.2) plus strong Bayesian against (0.1).
        let test = frequentist(0.001, 2.0, 1.0);
        let bayes = bayesian(0.05);
        let evidence = [MetricEvidence::new("duration", &test, &bayes)];
        let rec = synthesize(&evidence, &AnalysisConfig::default()).unwrap();
        assert!((rec.confidence_score - 0.15).abs() < 1e-12);
        assert_eq!(rec.decision, Decision::NoGo);
    }

    #[test]
    fn inconclusive_everything_is_no_go() {
        let test = frequentist(0.5, 1.0, 1.01);
        let bayes = bayesian(0.55);
        let evidence = [MetricEvidence::new("duration", &test, &bayes)];
        let rec = synthesize(&evidence, &AnalysisConfig::default()).unwrap();
        assert!((rec.confidence_score - 0.5).abs() < 1e-12);
        assert_eq!(rec.decision, Decision::NoGo);
    }

    #[test]
    fn synthesis_is_deterministic() {
        let test = frequentist(0.01, 1.0, 2.0);
        let bayes = bayesian(0.9);
        let evidence = [
            MetricEvidence::new("duration", &test, &bayes),
            MetricEvidence::new("conversion", &test, &bayes),
        ];
        let config = AnalysisConfig::default();
        let first = synthesize(&evidence, &config).unwrap();
        let second = synthesize(&evidence, &config).unwrap();
        assert_eq!(first.confidence_score, second.confidence_score);
        assert_eq!(first.decision, second.decision);
        assert_eq!(first.evidence_summary, second.evidence_summary);
    }

    #[test]
    fn empty_evidence_is_rejected() {
        let err = synthesize(&[], &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData { .. }));
    }

    #[test]
    fn mixed_metrics_average_across_all_scores() {
        // One metric strongly for (0.8 + 0.9), one inconclusive (0.5 + 0.5):
        // mean of [0.8, 0.9, 0.5, 0.5] = 0.675 -> CAUTION.
        let strong = frequentist(0.001, 1.0, 2.0);
        let strong_bayes = bayesian(0.99);
        let weak = frequentist(0.4, 1.0, 1.0);
        let weak_bayes = bayesian(0.6);
        let evidence = [
            MetricEvidence::new("duration", &strong, &strong_bayes),
            MetricEvidence::new("conversion", &weak, &weak_bayes),
        ];
        let rec = synthesize(&evidence, &AnalysisConfig::default()).unwrap();
        assert!((rec.confidence_score - 0.675).abs() < 1e-12);
        assert_eq!(rec.decision, Decision::Caution);
    }
}
