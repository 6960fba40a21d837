//! Two-sample location tests.
//!
//! Implements Welch's unequal-variance t-test with Welch–Satterthwaite
//! degrees of freedom.

use cp_core::{Error, Result};
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Result of a two-sample test.
#[derive(Debug, Clone, Serialize)]
pub struct TwoSampleTest {
    /// Test statistic (mean of first sample minus mean of second, over the
    /// unpooled standard error).
    pub t_stat: f64,
    /// Two-sided p-value.
    pub p_value: f64,
    /// Welch–Satterthwaite degrees of freedom.
    pub df: f64,
    /// Size of the first sample.
    pub n_a: usize,
    /// Size of the second sample.
    pub n_b: usize,
}

/// Standard Student's t(df) distribution. Panics on invalid df (should never
/// happen after validation).
#[inline]
fn t_dist(df: f64) -> StudentsT {
    StudentsT::new(0.0, 1.0, df).expect("valid df for t-distribution")
}

/// CDF of Student's t(df) at value x.
#[inline]
pub(crate) fn t_cdf(x: f64, df: f64) -> f64 {
    t_dist(df).cdf(x)
}

/// Inverse CDF (quantile) of Student's t(df) at probability p.
#[inline]
pub(crate) fn t_quantile(p: f64, df: f64) -> f64 {
    t_dist(df).inverse_cdf(p)
}

/// Mean and unbiased sample variance (two-pass).
fn mean_var(xs: &[f64]) -> (f64, f64) {
    let n = xs.len() as f64;
    let mean = xs.iter().sum::<f64>() / n;
    let var = xs.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / (n - 1.0);
    (mean, var)
}

/// Welch's two-sided, unequal-variance t-test for a difference in means.
///
/// Both samples need at least 2 observations; two samples with zero
/// combined variance have no defined test statistic and fail loudly
/// instead of producing an infinite ratio.
pub fn welch_t_test(a: &[f64], b: &[f64]) -> Result<TwoSampleTest> {
    if a.len() < 2 || b.len() < 2 {
        return Err(Error::InsufficientSample(format!(
            "two-sample test needs at least 2 observations per sample, got {} and {}",
            a.len(),
            b.len()
        )));
    }

    let (mean_a, var_a) = mean_var(a);
    let (mean_b, var_b) = mean_var(b);
    let na = a.len() as f64;
    let nb = b.len() as f64;

    let sq_a = var_a / na;
    let sq_b = var_b / nb;
    let se2 = sq_a + sq_b;
    if se2 <= 0.0 {
        return Err(Error::Computation(
            "both samples have zero variance; t-statistic is undefined".to_string(),
        ));
    }

    let df = se2 * se2 / (sq_a * sq_a / (na - 1.0) + sq_b * sq_b / (nb - 1.0));
    let t_stat = (mean_a - mean_b) / se2.sqrt();
    let p_value = 2.0 * (1.0 - t_cdf(t_stat.abs(), df));

    Ok(TwoSampleTest { t_stat, p_value, df, n_a: a.len(), n_b: b.len() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_welch_hand_computed() {
        // a: mean 4, var 2.5; b: mean 8, var 2.5 (n=5 each)
        // se² = 2.5/5 + 2.5/5 = 1.0, t = -4, df = 8
        let a = [2.0, 3.0, 4.0, 5.0, 6.0];
        let b = [6.0, 7.0, 8.0, 9.0, 10.0];
        let res = welch_t_test(&a, &b).unwrap();
        assert_relative_eq!(res.t_stat, -4.0, max_relative = 1e-12);
        assert_relative_eq!(res.df, 8.0, max_relative = 1e-12);
        assert!(res.p_value > 0.0 && res.p_value < 0.01, "p={}", res.p_value);
    }

    #[test]
    fn test_welch_symmetric_in_sign() {
        let a = [1.0, 2.0, 3.0];
        let b = [4.0, 6.0, 8.0];
        let ab = welch_t_test(&a, &b).unwrap();
        let ba = welch_t_test(&b, &a).unwrap();
        assert_relative_eq!(ab.t_stat, -ba.t_stat, max_relative = 1e-12);
        assert_relative_eq!(ab.p_value, ba.p_value, max_relative = 1e-12);
    }

    #[test]
    fn test_identical_samples_p_one() {
        let a = [1.0, 2.0, 3.0, 4.0];
        let res = welch_t_test(&a, &a).unwrap();
        assert_relative_eq!(res.t_stat, 0.0);
        assert_relative_eq!(res.p_value, 1.0, max_relative = 1e-12);
    }

    #[test]
    fn test_too_small_sample_rejected() {
        let err = welch_t_test(&[1.0], &[2.0, 3.0]).unwrap_err();
        assert!(matches!(err, Error::InsufficientSample(_)));
    }

    #[test]
    fn test_degenerate_zero_variance_rejected() {
        let err = welch_t_test(&[5.0, 5.0], &[7.0, 7.0]).unwrap_err();
        assert!(matches!(err, Error::Computation(_)));
    }
}
