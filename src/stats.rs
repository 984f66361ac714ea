//! Descriptive Statistics Module
//!
//! Moment helpers shared by the cleaner, profiler and comparator. All
//! functions operate on a plain slice of non-missing values and return NaN
//! when the statistic is undefined for the sample size (fewer than 2 values
//! for variance, zero variance for skewness/kurtosis), never an error.

// ===================== BASIC MOMENTS =====================

/// Arithmetic mean; NaN for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Median; NaN for an empty slice.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// Sample variance with Bessel's correction; NaN for fewer than 2 values.
pub fn sample_variance(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (n - 1) as f64
}

/// Sample standard deviation; NaN for fewer than 2 values.
pub fn sample_std(values: &[f64]) -> f64 {
    sample_variance(values).sqrt()
}

/// Population standard deviation (divisor n), used by the Z-score cleaner.
pub fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let m = mean(values);
    (values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64).sqrt()
}

// ===================== SHAPE MOMENTS =====================

/// Fisher-Pearson skewness: g1 = m3 / m2^(3/2).
///
/// NaN for fewer than 2 values or a zero-variance sample, where the
/// standardized third moment is undefined.
pub fn skewness(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let m2 = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / n as f64;
    if m2 == 0.0 {
        return f64::NAN;
    }
    let m3 = values.iter().map(|v| (v - m).powi(3)).sum::<f64>() / n as f64;
    m3 / m2.powf(1.5)
}

/// Excess kurtosis: g2 = m4 / m2² − 3 (0 for a normal distribution).
///
/// NaN under the same conditions as [`skewness`].
pub fn excess_kurtosis(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let m2 = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / n as f64;
    if m2 == 0.0 {
        return f64::NAN;
    }
    let m4 = values.iter().map(|v| (v - m).powi(4)).sum::<f64>() / n as f64;
    m4 / (m2 * m2) - 3.0
}

// ===================== CORRELATION =====================

/// Pearson correlation coefficient of two equal-length series.
///
/// NaN when either series has zero variance or fewer than 2 points.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n < 2 {
        return f64::NAN;
    }
    let mx = mean(&x[..n]);
    let my = mean(&y[..n]);
    let mut cov = 0.0;
    let mut vx = 0.0;
    let mut vy = 0.0;
    for i in 0..n {
        let dx = x[i] - mx;
        let dy = y[i] - my;
        cov += dx * dy;
        vx += dx * dx;
        vy += dy * dy;
    }
    if vx == 0.0 || vy == 0.0 {
        return f64::NAN;
    }
    cov / (vx.sqrt() * vy.sqrt())
}

// ===================== RANKS =====================

/// Midranks (1-based, ties get the average rank), for rank-based tests.
pub fn midranks(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap_or(std::cmp::Ordering::Equal));

    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && values[order[j + 1]] == values[order[i]] {
            j += 1;
        }
        // Average rank across the tie run [i, j]
        let avg = (i + j) as f64 / 2.0 + 1.0;
        for k in i..=j {
            ranks[order[k]] = avg;
        }
        i = j + 1;
    }
    ranks
}

// ===================== TESTS =====================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_values_symmetric_sample() {
        // GHI = [100, 200, 300]: mean 200, sample std 100, skewness 0
        let v = [100.0, 200.0, 300.0];
        assert!((mean(&v) - 200.0).abs() < 1e-12);
        assert!((median(&v) - 200.0).abs() < 1e-12);
        assert!((sample_std(&v) - 100.0).abs() < 1e-12);
        assert!(skewness(&v).abs() < 1e-12);
    }

    #[test]
    fn test_undefined_below_two_samples() {
        assert!(mean(&[]).is_nan());
        assert!(sample_std(&[5.0]).is_nan());
        assert!(skewness(&[5.0]).is_nan());
        assert!(excess_kurtosis(&[5.0]).is_nan());
    }

    #[test]
    fn test_constant_sample_shape_undefined() {
        let v = [7.0, 7.0, 7.0, 7.0];
        assert!(skewness(&v).is_nan());
        assert!(excess_kurtosis(&v).is_nan());
        assert_eq!(sample_std(&v), 0.0);
    }

    #[test]
    fn test_even_length_median() {
        assert!((median(&[1.0, 2.0, 3.0, 4.0]) - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_perfect_correlation() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [2.0, 4.0, 6.0, 8.0];
        assert!((pearson(&x, &y) - 1.0).abs() < 1e-12);

        let inv = [8.0, 6.0, 4.0, 2.0];
        assert!((pearson(&x, &inv) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_constant_series_is_nan() {
        assert!(pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]).is_nan());
    }

    #[test]
    fn test_midranks_with_ties() {
        // 10 and 10 share ranks 2 and 3 -> both 2.5
        let ranks = midranks(&[5.0, 10.0, 10.0, 20.0]);
        assert_eq!(ranks, vec![1.0, 2.5, 2.5, 4.0]);
    }
}
