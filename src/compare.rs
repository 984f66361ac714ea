//! Cross-Country Comparison Module
//!
//! Hypothesis testing for whether a metric differs between countries. The
//! test-selection rule is deterministic and applied uniformly:
//!
//! * every group passes a moment-based normality screen
//!   (n ≥ 8, |skewness| ≤ 0.5, |excess kurtosis| ≤ 1.0), AND
//! * sample variances are homogeneous (max/min ratio ≤ 4.0)
//!
//! → one-way ANOVA; otherwise Kruskal-Wallis with tie correction. p-values
//! come from the F and χ² distributions respectively.

use log::debug;
use serde::Serialize;
use statrs::distribution::{ChiSquared, ContinuousCDF, FisherSnedecor};

use crate::data::{Dataset, Metric};
use crate::error::{Error, Result};
use crate::stats;

/// Default significance level.
pub const DEFAULT_ALPHA: f64 = 0.05;

/// Minimum group size for the normality screen to accept ANOVA.
const NORMALITY_MIN_N: usize = 8;
/// Normality screen bounds on the shape moments.
const NORMALITY_MAX_SKEW: f64 = 0.5;
const NORMALITY_MAX_KURT: f64 = 1.0;
/// Largest acceptable max/min sample-variance ratio for ANOVA.
const VARIANCE_RATIO_LIMIT: f64 = 4.0;

// ===================== RESULTS =====================

/// Which test the selection rule picked, or why none could run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TestKind {
    Anova,
    KruskalWallis,
    /// Fewer than 2 populated groups for this metric: no test was run.
    Insufficient,
}

impl std::fmt::Display for TestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestKind::Anova => f.write_str("ANOVA"),
            TestKind::KruskalWallis => f.write_str("Kruskal-Wallis"),
            TestKind::Insufficient => f.write_str("Insufficient data"),
        }
    }
}

/// Outcome of one cross-country test. Created once, immutable thereafter.
#[derive(Debug, Clone, Serialize)]
pub struct TestResult {
    #[serde(serialize_with = "serialize_metric")]
    pub metric: Metric,
    pub test: TestKind,
    pub statistic: f64,
    pub p_value: f64,
    pub significant: bool,
}

fn serialize_metric<S: serde::Serializer>(m: &Metric, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(m.column())
}

// ===================== COMPARISON =====================

/// Compare one metric across the given countries.
///
/// Countries without any non-missing value for the metric are dropped from
/// the comparison; fewer than 2 populated groups is
/// [`Error::InsufficientGroups`].
pub fn compare(
    dataset: &Dataset,
    metric: Metric,
    countries: &[String],
    alpha: f64,
) -> Result<TestResult> {
    let groups: Vec<Vec<f64>> = countries
        .iter()
        .map(|c| dataset.country_values(c, metric))
        .filter(|g| !g.is_empty())
        .collect();

    if groups.len() < 2 {
        return Err(Error::InsufficientGroups { found: groups.len() });
    }

    let (test, statistic, p_value) = if anova_assumptions_hold(&groups) {
        let (f, p) = one_way_anova(&groups);
        (TestKind::Anova, f, p)
    } else {
        let (h, p) = kruskal_wallis(&groups);
        (TestKind::KruskalWallis, h, p)
    };
    debug!("{}: {} statistic {:.4}, p {:.4}", metric, test, statistic, p_value);

    Ok(TestResult { metric, test, statistic, p_value, significant: p_value < alpha })
}

/// Compare every listed metric. A metric with fewer than 2 populated groups
/// does not abort the rest: it is recorded as an explicit
/// [`TestKind::Insufficient`] entry (NaN statistic, not significant), so the
/// exported results always cover one row per requested metric.
pub fn compare_all(
    dataset: &Dataset,
    metrics: &[Metric],
    countries: &[String],
    alpha: f64,
) -> Result<Vec<TestResult>> {
    if countries.len() < 2 {
        return Err(Error::InsufficientGroups { found: countries.len() });
    }
    let mut results = Vec::new();
    for &metric in metrics {
        match compare(dataset, metric, countries, alpha) {
            Ok(r) => results.push(r),
            Err(Error::InsufficientGroups { found }) => {
                debug!("{}: only {} populated groups, no test run", metric, found);
                results.push(TestResult {
                    metric,
                    test: TestKind::Insufficient,
                    statistic: f64::NAN,
                    p_value: f64::NAN,
                    significant: false,
                });
            }
            Err(e) => return Err(e),
        }
    }
    Ok(results)
}

// ===================== TEST SELECTION =====================

/// The deterministic ANOVA gate: normality screen plus variance homogeneity.
fn anova_assumptions_hold(groups: &[Vec<f64>]) -> bool {
    let mut min_var = f64::INFINITY;
    let mut max_var = f64::NEG_INFINITY;

    for group in groups {
        if group.len() < NORMALITY_MIN_N {
            return false;
        }
        let skew = stats::skewness(group);
        let kurt = stats::excess_kurtosis(group);
        // NaN (constant group) fails the screen
        if !(skew.abs() <= NORMALITY_MAX_SKEW && kurt.abs() <= NORMALITY_MAX_KURT) {
            return false;
        }
        let var = stats::sample_variance(group);
        min_var = min_var.min(var);
        max_var = max_var.max(var);
    }

    min_var > 0.0 && max_var / min_var <= VARIANCE_RATIO_LIMIT
}

// ===================== TEST STATISTICS =====================

/// One-way ANOVA F statistic and p-value.
fn one_way_anova(groups: &[Vec<f64>]) -> (f64, f64) {
    let k = groups.len();
    let n: usize = groups.iter().map(|g| g.len()).sum();
    let grand_mean =
        groups.iter().flat_map(|g| g.iter()).sum::<f64>() / n as f64;

    let ss_between: f64 = groups
        .iter()
        .map(|g| g.len() as f64 * (stats::mean(g) - grand_mean).powi(2))
        .sum();
    let ss_within: f64 = groups
        .iter()
        .map(|g| {
            let m = stats::mean(g);
            g.iter().map(|v| (v - m).powi(2)).sum::<f64>()
        })
        .sum();

    let df_between = (k - 1) as f64;
    let df_within = (n - k) as f64;
    if df_within <= 0.0 || ss_within == 0.0 {
        // Degenerate: identical within-group values
        return (f64::INFINITY, 0.0);
    }

    let f = (ss_between / df_between) / (ss_within / df_within);
    let p = match FisherSnedecor::new(df_between, df_within) {
        Ok(dist) => 1.0 - dist.cdf(f),
        Err(_) => f64::NAN,
    };
    (f, p)
}

/// Kruskal-Wallis H statistic (tie-corrected) and χ² p-value.
fn kruskal_wallis(groups: &[Vec<f64>]) -> (f64, f64) {
    let n: usize = groups.iter().map(|g| g.len()).sum();
    let pooled: Vec<f64> = groups.iter().flat_map(|g| g.iter().copied()).collect();
    let ranks = stats::midranks(&pooled);

    // Sum of ranks per group, walking the pooled layout
    let mut h = 0.0;
    let mut offset = 0;
    for group in groups {
        let r_sum: f64 = ranks[offset..offset + group.len()].iter().sum();
        h += r_sum * r_sum / group.len() as f64;
        offset += group.len();
    }
    let nf = n as f64;
    h = 12.0 / (nf * (nf + 1.0)) * h - 3.0 * (nf + 1.0);

    // Tie correction: divide by 1 - Σ(t³ − t) / (N³ − N)
    let mut sorted = pooled.clone();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mut tie_term = 0.0;
    let mut i = 0;
    while i < sorted.len() {
        let mut j = i;
        while j + 1 < sorted.len() && sorted[j + 1] == sorted[i] {
            j += 1;
        }
        let t = (j - i + 1) as f64;
        tie_term += t * t * t - t;
        i = j + 1;
    }
    let correction = 1.0 - tie_term / (nf * nf * nf - nf);
    if correction <= 0.0 {
        // Every pooled value identical: no evidence of any difference
        return (0.0, 1.0);
    }
    h /= correction;

    let df = (groups.len() - 1) as f64;
    let p = match ChiSquared::new(df) {
        Ok(dist) => 1.0 - dist.cdf(h.max(0.0)),
        Err(_) => f64::NAN,
    };
    (h, p)
}

// ===================== TESTS =====================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Record;
    use chrono::NaiveDate;

    fn dataset(groups: &[(&str, &[f64])]) -> Dataset {
        let mut records = Vec::new();
        for (country, values) in groups {
            for (i, &v) in values.iter().enumerate() {
                records.push(Record {
                    timestamp: NaiveDate::from_ymd_opt(2023, 6, 1)
                        .unwrap()
                        .and_hms_opt(0, i as u32, 0)
                        .unwrap(),
                    country: country.to_string(),
                    ghi: Some(v),
                    dni: None,
                    dhi: None,
                    tamb: None,
                    rh: None,
                    ws: None,
                });
            }
        }
        Dataset::new(records)
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_single_country_is_insufficient() {
        let ds = dataset(&[("Benin", &[1.0, 2.0, 3.0])]);
        let result = compare(&ds, Metric::Ghi, &names(&["Benin"]), DEFAULT_ALPHA);
        assert!(matches!(result, Err(Error::InsufficientGroups { found: 1 })));
    }

    #[test]
    fn test_country_without_data_does_not_count_as_group() {
        // Togo is requested but has no GHI values at all
        let ds = dataset(&[("Benin", &[1.0, 2.0, 3.0]), ("Togo", &[])]);
        let result = compare(&ds, Metric::Ghi, &names(&["Benin", "Togo"]), DEFAULT_ALPHA);
        assert!(matches!(result, Err(Error::InsufficientGroups { found: 1 })));
    }

    #[test]
    fn test_clearly_separated_groups_are_significant() {
        let low: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let high: Vec<f64> = (0..20).map(|i| 500.0 + i as f64).collect();
        let ds = dataset(&[("Benin", &low), ("Togo", &high)]);

        let r = compare(&ds, Metric::Ghi, &names(&["Benin", "Togo"]), DEFAULT_ALPHA).unwrap();
        assert!(r.significant, "p = {}", r.p_value);
        assert!(r.p_value < 0.01);
    }

    /// Symmetric bell-shaped sample of 25 values centered on `center`
    /// (skewness 0, excess kurtosis ≈ −0.65: inside the normality screen).
    fn bell(center: f64) -> Vec<f64> {
        let counts = [1usize, 2, 3, 4, 5, 4, 3, 2, 1];
        let mut out = Vec::new();
        for (i, &c) in counts.iter().enumerate() {
            for _ in 0..c {
                out.push(center + i as f64 - 4.0);
            }
        }
        out
    }

    #[test]
    fn test_symmetric_homogeneous_groups_use_anova() {
        // Same shape and spread in both groups: passes the ANOVA gate
        let ds = dataset(&[("Benin", &bell(100.0)), ("Togo", &bell(110.0))]);

        let r = compare(&ds, Metric::Ghi, &names(&["Benin", "Togo"]), DEFAULT_ALPHA).unwrap();
        assert_eq!(r.test, TestKind::Anova);
        assert!(r.significant, "p = {}", r.p_value);
    }

    #[test]
    fn test_skewed_group_falls_back_to_kruskal_wallis() {
        // One heavily right-skewed group fails the normality screen
        let skewed: Vec<f64> =
            vec![1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 2.0, 2.0, 3.0, 50.0, 80.0, 120.0];
        let flat: Vec<f64> = (0..12).map(|i| 10.0 + i as f64).collect();
        let ds = dataset(&[("Benin", &skewed), ("Togo", &flat)]);

        let r = compare(&ds, Metric::Ghi, &names(&["Benin", "Togo"]), DEFAULT_ALPHA).unwrap();
        assert_eq!(r.test, TestKind::KruskalWallis);
    }

    #[test]
    fn test_small_groups_fall_back_to_kruskal_wallis() {
        let ds = dataset(&[("Benin", &[1.0, 2.0, 3.0]), ("Togo", &[4.0, 5.0, 6.0])]);
        let r = compare(&ds, Metric::Ghi, &names(&["Benin", "Togo"]), DEFAULT_ALPHA).unwrap();
        assert_eq!(r.test, TestKind::KruskalWallis);
    }

    #[test]
    fn test_identical_groups_not_significant() {
        let v = [5.0, 5.0, 5.0, 5.0];
        let ds = dataset(&[("Benin", &v), ("Togo", &v)]);
        let r = compare(&ds, Metric::Ghi, &names(&["Benin", "Togo"]), DEFAULT_ALPHA).unwrap();
        assert!(!r.significant);
        assert!((r.p_value - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_unpopulated_metric_recorded_as_insufficient() {
        // GHI has data for both countries, DNI for neither
        let ds = dataset(&[("Benin", &[1.0, 2.0, 3.0]), ("Togo", &[4.0, 5.0, 6.0])]);
        let results = compare_all(
            &ds,
            &[Metric::Ghi, Metric::Dni],
            &names(&["Benin", "Togo"]),
            DEFAULT_ALPHA,
        )
        .unwrap();

        // One row per requested metric, the unpopulated one marked explicitly
        assert_eq!(results.len(), 2);
        let dni = results.iter().find(|r| r.metric == Metric::Dni).unwrap();
        assert_eq!(dni.test, TestKind::Insufficient);
        assert!(dni.statistic.is_nan());
        assert!(dni.p_value.is_nan());
        assert!(!dni.significant);
    }

    #[test]
    fn test_compare_all_requires_two_countries() {
        let ds = dataset(&[("Benin", &[1.0, 2.0])]);
        let result = compare_all(&ds, &Metric::IRRADIANCE, &names(&["Benin"]), DEFAULT_ALPHA);
        assert!(matches!(result, Err(Error::InsufficientGroups { found: 1 })));
    }
}
