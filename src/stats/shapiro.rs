//! Shapiro-Wilk normality statistic.
//!
//! Implements Royston's approximation (AS R94): Blom scores for the
//! expected normal order statistics, polynomial-corrected weights for the
//! two extreme coefficients, and a normalizing transformation of
//! ln(1 - W) for the p-value. The p-value transformation was calibrated
//! for n up to 5000; beyond that it extrapolates.

use statrs::distribution::{ContinuousCDF, Normal};

use crate::error::{AnalysisError, Result};

// Royston (1995) polynomial coefficients.
const POLY_A1: [f64; 6] = [0.0, 0.221157, -0.147981, -2.07119, 4.434685, -2.706056];
const POLY_A2: [f64; 6] = [0.0, 0.042981, -0.293762, -1.752461, 5.682633, -3.582633];
const POLY_MU_SMALL: [f64; 4] = [0.544, -0.39978, 0.025054, -6.714e-4];
const POLY_SIGMA_SMALL: [f64; 4] = [1.3822, -0.77857, 0.062767, -0.0020322];
const POLY_MU_LARGE: [f64; 4] = [-1.5861, -0.31082, -0.083751, 0.0038915];
const POLY_SIGMA_LARGE: [f64; 3] = [-0.4803, -0.082676, 0.0030302];
const POLY_GAMMA: [f64; 2] = [-2.273, 0.459];

/// Compute the Shapiro-Wilk statistic W and its p-value.
///
/// Requires at least 3 finite observations with non-zero spread.
pub fn shapiro_wilk(data: &[f64]) -> Result<(f64, f64)> {
    let n = data.len();
    if n < 3 {
        return Err(AnalysisError::InsufficientData {
            test: "Shapiro-Wilk test",
            reason: format!("sample has {n} observation(s), need at least 3"),
        });
    }
    if data.iter().any(|v| !v.is_finite()) {
        return Err(AnalysisError::InsufficientData {
            test: "Shapiro-Wilk test",
            reason: "sample contains non-finite values".to_string(),
        });
    }

    let mut x = data.to_vec();
    x.sort_by(|a, b| a.total_cmp(b));
    if x[n - 1] - x[0] < 1e-300 {
        return Err(AnalysisError::InsufficientData {
            test: "Shapiro-Wilk test",
            reason: "sample has zero spread".to_string(),
        });
    }

    if n == 3 {
        return Ok(exact_n3(&x));
    }

    let half = n / 2;
    let weights = royston_weights(n, half)?;

    let mut numerator = 0.0;
    for (i, w) in weights.iter().enumerate() {
        numerator += w * (x[n - 1 - i] - x[i]);
    }
    let mean = x.iter().sum::<f64>() / n as f64;
    let ss: f64 = x.iter().map(|v| (v - mean) * (v - mean)).sum();

    let w = ((numerator * numerator) / ss).min(1.0);
    let p = p_value(w, n).clamp(0.0, 1.0);
    Ok((w, p))
}

// Exact small-sample formula: W has a known distribution at n = 3.
fn exact_n3(x: &[f64]) -> (f64, f64) {
    let mean = (x[0] + x[1] + x[2]) / 3.0;
    let ss: f64 = x.iter().map(|v| (v - mean) * (v - mean)).sum();
    let numerator = std::f64::consts::FRAC_1_SQRT_2 * (x[2] - x[0]);
    let w = ((numerator * numerator) / ss).clamp(0.75, 1.0);
    let p = (6.0 / std::f64::consts::PI) * (w.sqrt().asin() - 0.75_f64.sqrt().asin());
    (w, p.clamp(0.0, 1.0))
}

// Weights for the lower half of the order statistics. The upper half is
// the mirror image, which `shapiro_wilk` exploits by pairing x[n-1-i]
// with x[i].
fn royston_weights(n: usize, half: usize) -> Result<Vec<f64>> {
    let normal = Normal::new(0.0, 1.0).expect("standard normal parameters are valid");

    // Blom scores for the lower-half expected order statistics.
    let mut m = vec![0.0; half];
    let mut m_norm_sq = 0.0;
    for (i, mi) in m.iter_mut().enumerate() {
        let p = (i as f64 + 1.0 - 0.375) / (n as f64 + 0.25);
        *mi = normal.inverse_cdf(p);
        m_norm_sq += *mi * *mi;
    }
    m_norm_sq *= 2.0;
    let m_norm = m_norm_sq.sqrt();
    let rsn = 1.0 / (n as f64).sqrt();

    let a1 = poly(&POLY_A1, rsn) - m[0] / m_norm;
    let mut weights = vec![0.0; half];

    if n <= 5 {
        // Only the extreme coefficient is corrected.
        let residual_m = m_norm_sq - 2.0 * m[0] * m[0];
        let residual_a = 1.0 - 2.0 * a1 * a1;
        let scale = safe_scale(residual_m, residual_a)?;
        weights[0] = a1;
        for i in 1..half {
            weights[i] = -m[i] / scale;
        }
    } else {
        // The two extreme coefficients are corrected.
        let a2 = poly(&POLY_A2, rsn) - m[1] / m_norm;
        let residual_m = m_norm_sq - 2.0 * m[0] * m[0] - 2.0 * m[1] * m[1];
        let residual_a = 1.0 - 2.0 * a1 * a1 - 2.0 * a2 * a2;
        let scale = safe_scale(residual_m, residual_a)?;
        weights[0] = a1;
        weights[1] = a2;
        for i in 2..half {
            weights[i] = -m[i] / scale;
        }
    }

    Ok(weights)
}

fn safe_scale(residual_m: f64, residual_a: f64) -> Result<f64> {
    if residual_m <= 0.0 || residual_a <= 0.0 {
        return Err(AnalysisError::DegenerateInput {
            context: "Shapiro-Wilk test",
            reason: "weight normalization is not positive".to_string(),
        });
    }
    Ok((residual_m / residual_a).sqrt())
}

// Royston's normalizing transformation of ln(1 - W).
fn p_value(w: f64, n: usize) -> f64 {
    let normal = Normal::new(0.0, 1.0).expect("standard normal parameters are valid");
    let nf = n as f64;
    let w1 = 1.0 - w;
    if w1 <= 0.0 {
        return 1.0;
    }
    let y = w1.ln();

    if n <= 11 {
        let gamma = poly(&POLY_GAMMA, nf);
        if y >= gamma {
            return 0.0;
        }
        let y2 = -(gamma - y).ln();
        let mu = poly(&POLY_MU_SMALL, nf);
        let sigma = poly(&POLY_SIGMA_SMALL, nf).exp();
        if sigma < 1e-300 {
            return 0.0;
        }
        1.0 - normal.cdf((y2 - mu) / sigma)
    } else {
        let log_n = nf.ln();
        let mu = poly(&POLY_MU_LARGE, log_n);
        let sigma = poly(&POLY_SIGMA_LARGE, log_n).exp();
        if sigma < 1e-300 {
            return 0.0;
        }
        1.0 - normal.cdf((y - mu) / sigma)
    }
}

// Horner evaluation: c[0] + c[1]*x + c[2]*x^2 + ...
fn poly(coefficients: &[f64], x: f64) -> f64 {
    let mut acc = coefficients[coefficients.len() - 1];
    for c in coefficients.iter().rev().skip(1) {
        acc = acc * x + c;
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;

    // Normal order statistics make a maximally normal-looking sample.
    fn normal_scores(n: usize) -> Vec<f64> {
        let normal = Normal::new(0.0, 1.0).unwrap();
        (1..=n)
            .map(|i| normal.inverse_cdf((i as f64 - 0.375) / (n as f64 + 0.25)))
            .collect()
    }

    #[test]
    fn accepts_normal_looking_data() {
        let (w, p) = shapiro_wilk(&normal_scores(50)).unwrap();
        assert!(w > 0.98, "W should be near 1 for normal scores, got {w}");
        assert!(p > 0.05, "normal scores should not be rejected, got p={p}");
    }

    #[test]
    fn rejects_heavily_skewed_data() {
        let skewed: Vec<f64> = (1..=60).map(|i| (i as f64).powi(3)).collect();
        let (w, p) = shapiro_wilk(&skewed).unwrap();
        assert!(w < 0.9, "W should be depressed for cubic growth, got {w}");
        assert!(p < 0.01, "cubic growth should be rejected, got p={p}");
    }

    #[test]
    fn small_sample_exact_path() {
        let (w, p) = shapiro_wilk(&[1.0, 2.0, 3.0]).unwrap();
        assert!((0.75..=1.0).contains(&w));
        assert!((0.0..=1.0).contains(&p));
    }

    #[test]
    fn rejects_degenerate_inputs() {
        assert!(shapiro_wilk(&[1.0, 2.0]).is_err());
        assert!(shapiro_wilk(&[5.0, 5.0, 5.0, 5.0]).is_err());
        assert!(shapiro_wilk(&[1.0, f64::NAN, 3.0]).is_err());
    }
}
