//! # uplift
//!
//! Statistical analysis engine for online controlled experiments.
//!
//! Given observed outcomes in a control and a variant group, this crate
//! answers: how large must the experiment have been, is the observed
//! difference statistically real, and should the organization act on it?
//! It outputs:
//! - required sample size and achieved power per metric
//! - frequentist significance (Welch t, chi-square, Mann-Whitney U) with
//!   standardized effect sizes
//! - Bayesian posterior probability that the variant is better, credible
//!   intervals, and expected loss
//! - one deterministic GO/CAUTION/NO-GO recommendation with a confidence
//!   score and an evidence trail
//!
//! ## Quick start
//!
//! ```
//! use uplift::{AnalysisConfig, ExperimentAnalyzer, MetricSample};
//!
//! let control: Vec<f64> = (0..200).map(|i| 440.0 + (i % 10) as f64).collect();
//! let variant: Vec<f64> = (0..200).map(|i| 452.0 + (i % 10) as f64).collect();
//!
//! let analyzer = ExperimentAnalyzer::new(AnalysisConfig::default());
//! let report = analyzer
//!     .analyze(&[MetricSample::continuous("session_duration", control, variant)])
//!     .unwrap();
//!
//! println!(
//!     "{} (confidence {:.0}%)",
//!     report.recommendation.decision,
//!     report.recommendation.confidence_score * 100.0
//! );
//! ```
//!
//! The engines are also callable individually; see [`analysis`]. Data
//! acquisition, transport, and report rendering live outside this crate:
//! callers hand in already-clean samples and serialize the result types
//! themselves.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
mod config;
mod error;
mod pipeline;
mod result;
mod types;

// Functional modules
pub mod analysis;
pub mod stats;

// Re-exports for the public API
pub use analysis::bayes::{
    BayesianEngine, BetaPrior, ConjugateSolver, GaussianPrior, PosteriorSolver, SamplingSolver,
};
pub use analysis::decision::MetricEvidence;
pub use analysis::effect::EffectMagnitude;
pub use analysis::frequentist::Alternative;
pub use config::AnalysisConfig;
pub use error::{AnalysisError, Result};
pub use pipeline::{ExperimentAnalyzer, ExperimentReport, MetricReport};
pub use result::{
    AssumptionCheck, BayesianTestResult, Decision, HypothesisTestResult, PowerAnalysisResult,
    Recommendation, TestKind,
};
pub use types::{MetricKind, MetricSample};
