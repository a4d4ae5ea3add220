//! Statistical analysis components.
//!
//! Independent engines over immutable inputs, combined by the decision
//! synthesizer:
//!
//! - [`effect`]: standardized effect sizes (Cohen's d, Cohen's h)
//! - [`power`]: sample-size planning and achieved power
//! - [`frequentist`]: significance tests and assumption diagnostics
//! - [`bayes`]: posterior inference behind a solver strategy
//! - [`decision`]: fixed-policy evidence fusion into GO/CAUTION/NO-GO

pub mod bayes;
pub mod decision;
pub mod effect;
pub mod frequentist;
pub mod power;
