//! Outlier Cleaning Module
//!
//! Z-score based outlier imputation, per country and per column. The mean,
//! standard deviation and replacement median are all computed once from the
//! pre-cleaning values, so successive replacements never feed back into each
//! other and re-running the cleaner on its own output flags nothing new.

use std::collections::HashMap;

use log::{debug, info};

use crate::data::{Dataset, Metric};
use crate::stats;

/// Default |Z| threshold above which a value counts as an outlier.
pub const DEFAULT_Z_THRESHOLD: f64 = 3.0;

// ===================== REPORTS =====================

/// Replacement counts for one (country, metric) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanReport {
    pub country: String,
    pub metric: Metric,
    /// Values whose |Z| exceeded the threshold and were replaced.
    pub replaced: usize,
    /// Non-missing values inspected.
    pub inspected: usize,
    /// Median used for the replacements (pre-cleaning).
    pub imputed_with: f64,
}

// ===================== CLEANING =====================

/// Per-country column moments captured before any replacement happens.
struct ColumnProfile {
    mean: f64,
    std: f64,
    median: f64,
    inspected: usize,
}

/// Clean one metric column: replace per-country Z-score outliers with the
/// country's pre-cleaning median.
///
/// A constant column (standard deviation 0) defines every Z-score as 0, so
/// nothing is flagged and no division by zero occurs. Missing values are
/// left missing.
///
/// Returns the cleaned dataset and one report per country.
pub fn clean_metric(dataset: &Dataset, metric: Metric, threshold: f64) -> (Dataset, Vec<CleanReport>) {
    let countries = dataset.countries();

    // Freeze moments before touching any value
    let mut profiles: HashMap<String, ColumnProfile> = HashMap::new();
    for country in &countries {
        let values = dataset.country_values(country, metric);
        profiles.insert(
            country.clone(),
            ColumnProfile {
                mean: stats::mean(&values),
                std: stats::population_std(&values),
                median: stats::median(&values),
                inspected: values.len(),
            },
        );
    }

    let mut cleaned = dataset.clone();
    let mut replaced: HashMap<String, usize> = HashMap::new();
    for record in &mut cleaned.records {
        let profile = match profiles.get(&record.country) {
            Some(p) => p,
            None => continue,
        };
        if let Some(value) = record.value(metric) {
            let z = if profile.std > 0.0 { (value - profile.mean) / profile.std } else { 0.0 };
            if z.abs() > threshold {
                record.set_value(metric, Some(profile.median));
                *replaced.entry(record.country.clone()).or_default() += 1;
            }
        }
    }

    let reports: Vec<CleanReport> = countries
        .iter()
        .map(|country| {
            let profile = &profiles[country];
            let n = replaced.get(country).copied().unwrap_or(0);
            debug!("{} {}: {} of {} values replaced", country, metric, n, profile.inspected);
            CleanReport {
                country: country.clone(),
                metric,
                replaced: n,
                inspected: profile.inspected,
                imputed_with: profile.median,
            }
        })
        .collect();

    (cleaned, reports)
}

/// Clean every listed metric in sequence, accumulating all reports.
pub fn clean_all(dataset: &Dataset, metrics: &[Metric], threshold: f64) -> (Dataset, Vec<CleanReport>) {
    let mut current = dataset.clone();
    let mut reports = Vec::new();
    for &metric in metrics {
        let (next, mut r) = clean_metric(&current, metric, threshold);
        current = next;
        reports.append(&mut r);
    }
    let total: usize = reports.iter().map(|r| r.replaced).sum();
    info!("cleaning replaced {} outlier values across {} columns", total, metrics.len());
    (current, reports)
}

// ===================== TESTS =====================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Record;
    use chrono::NaiveDate;

    fn dataset(ghi: &[f64]) -> Dataset {
        let records = ghi
            .iter()
            .enumerate()
            .map(|(i, &v)| Record {
                timestamp: NaiveDate::from_ymd_opt(2023, 6, 1)
                    .unwrap()
                    .and_hms_opt(0, i as u32, 0)
                    .unwrap(),
                country: "Benin".to_string(),
                ghi: Some(v),
                dni: None,
                dhi: None,
                tamb: None,
                rh: None,
                ws: None,
            })
            .collect();
        Dataset::new(records)
    }

    #[test]
    fn test_outlier_replaced_with_pre_cleaning_median() {
        // 1000 is a gross outlier against the tight cluster around 100
        let mut ghi = vec![100.0; 30];
        ghi.extend([101.0, 99.0, 102.0, 98.0, 1000.0]);
        let ds = dataset(&ghi);

        let (cleaned, reports) = clean_metric(&ds, Metric::Ghi, DEFAULT_Z_THRESHOLD);

        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].replaced, 1);
        // Replacement value is the median of the ORIGINAL column
        let expected = crate::stats::median(&ghi);
        let last = cleaned.records.last().unwrap();
        assert_eq!(last.ghi, Some(expected));
    }

    #[test]
    fn test_constant_column_never_flagged() {
        let ds = dataset(&[42.0; 10]);
        for threshold in [0.5, 1.0, 3.0] {
            let (_, reports) = clean_metric(&ds, Metric::Ghi, threshold);
            assert_eq!(reports[0].replaced, 0, "threshold {}", threshold);
        }
    }

    #[test]
    fn test_cleaning_is_idempotent() {
        let mut ghi = vec![100.0; 30];
        ghi.extend([101.0, 99.0, 1000.0]);
        let ds = dataset(&ghi);

        let (once, first) = clean_metric(&ds, Metric::Ghi, DEFAULT_Z_THRESHOLD);
        assert_eq!(first[0].replaced, 1);

        let (twice, second) = clean_metric(&once, Metric::Ghi, DEFAULT_Z_THRESHOLD);
        assert_eq!(second[0].replaced, 0);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_missing_values_left_missing() {
        let mut ds = dataset(&[100.0, 101.0, 99.0]);
        ds.records[1].ghi = None;

        let (cleaned, _) = clean_metric(&ds, Metric::Ghi, DEFAULT_Z_THRESHOLD);
        assert_eq!(cleaned.records[1].ghi, None);
    }
}
