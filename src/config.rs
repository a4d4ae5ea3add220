//! Analysis configuration.
//!
//! One explicit value replaces per-function defaults: every component call
//! takes a `&AnalysisConfig`, so the same inputs always see the same
//! settings and a regenerated report is identical to the original.

use std::time::Duration;

use crate::error::{AnalysisError, Result};

/// Configuration shared by every analysis component.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Significance level for frequentist tests. Default: 0.05.
    pub alpha: f64,

    /// Statistical power target for experiment design. Default: 0.80.
    pub power_target: f64,

    /// Probability mass of credible intervals. Default: 0.95.
    pub credible_mass: f64,

    /// Posterior draws taken by the sampling solver. Default: 2,000.
    pub posterior_draws: usize,

    /// Seed for the sampling solver's generator.
    ///
    /// Fixed by default so regenerating a report for audit reproduces it
    /// bit for bit. Default: 42.
    pub seed: u64,

    /// Time budget for posterior sampling.
    ///
    /// When the sampler exceeds this budget the conjugate closed form
    /// answers instead and the result is flagged as approximate.
    /// Default: 30 seconds.
    pub time_budget: Duration,

    /// Probability threshold quoted in evidence text.
    ///
    /// Purely presentational; the GO/CAUTION/NO-GO cutoffs are fixed at
    /// 0.75 and 0.60 and do not move with this value. Default: 0.80.
    pub threshold_go_nogo: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            power_target: 0.80,
            credible_mass: 0.95,
            posterior_draws: 2_000,
            seed: 42,
            time_budget: Duration::from_secs(30),
            threshold_go_nogo: 0.80,
        }
    }
}

impl AnalysisConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Preset for fast iteration: fewer posterior draws, short budget.
    pub fn quick() -> Self {
        Self {
            posterior_draws: 500,
            time_budget: Duration::from_secs(5),
            ..Default::default()
        }
    }

    /// Preset for thorough reporting: more posterior draws, long budget.
    pub fn thorough() -> Self {
        Self {
            posterior_draws: 10_000,
            time_budget: Duration::from_secs(120),
            ..Default::default()
        }
    }

    // =========================================================================
    // Builder methods
    // =========================================================================

    /// Set the significance level.
    pub fn alpha(mut self, alpha: f64) -> Self {
        assert!(alpha > 0.0 && alpha < 1.0, "alpha must be in (0, 1)");
        self.alpha = alpha;
        self
    }

    /// Set the power target.
    pub fn power_target(mut self, power: f64) -> Self {
        assert!(power > 0.0 && power < 1.0, "power_target must be in (0, 1)");
        self.power_target = power;
        self
    }

    /// Set the credible interval mass.
    pub fn credible_mass(mut self, mass: f64) -> Self {
        assert!(mass > 0.0 && mass < 1.0, "credible_mass must be in (0, 1)");
        self.credible_mass = mass;
        self
    }

    /// Set the number of posterior draws for the sampling solver.
    pub fn posterior_draws(mut self, draws: usize) -> Self {
        assert!(draws >= 100, "posterior_draws must be at least 100");
        self.posterior_draws = draws;
        self
    }

    /// Set a deterministic seed for the sampling solver.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the posterior sampling time budget.
    pub fn time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = budget;
        self
    }

    /// Set the probability threshold quoted in evidence text.
    pub fn threshold_go_nogo(mut self, threshold: f64) -> Self {
        assert!(
            threshold > 0.0 && threshold < 1.0,
            "threshold_go_nogo must be in (0, 1)"
        );
        self.threshold_go_nogo = threshold;
        self
    }

    /// Validate field domains, for configurations built field by field.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("alpha", self.alpha),
            ("power_target", self.power_target),
            ("credible_mass", self.credible_mass),
            ("threshold_go_nogo", self.threshold_go_nogo),
        ] {
            if !(value > 0.0 && value < 1.0) {
                return Err(AnalysisError::InvalidParameter {
                    name,
                    value,
                    expected: "a value in (0, 1)",
                });
            }
        }
        if self.posterior_draws < 100 {
            return Err(AnalysisError::InvalidParameter {
                name: "posterior_draws",
                value: self.posterior_draws as f64,
                expected: "at least 100 draws",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = AnalysisConfig::default();
        assert_eq!(config.alpha, 0.05);
        assert_eq!(config.power_target, 0.80);
        assert_eq!(config.credible_mass, 0.95);
        assert_eq!(config.posterior_draws, 2_000);
        assert_eq!(config.seed, 42);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn presets() {
        assert_eq!(AnalysisConfig::quick().posterior_draws, 500);
        assert_eq!(AnalysisConfig::thorough().posterior_draws, 10_000);
    }

    #[test]
    fn builder_methods() {
        let config = AnalysisConfig::new()
            .alpha(0.01)
            .power_target(0.90)
            .posterior_draws(5_000)
            .seed(7);
        assert_eq!(config.alpha, 0.01);
        assert_eq!(config.power_target, 0.90);
        assert_eq!(config.posterior_draws, 5_000);
        assert_eq!(config.seed, 7);
    }

    #[test]
    fn validate_rejects_out_of_range() {
        let mut config = AnalysisConfig::default();
        config.alpha = 1.0;
        assert!(config.validate().is_err());

        let mut config = AnalysisConfig::default();
        config.posterior_draws = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    #[should_panic]
    fn builder_rejects_bad_alpha() {
        let _ = AnalysisConfig::new().alpha(1.5);
    }
}
