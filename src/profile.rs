//! Profiling Module
//!
//! Computes the per-(country, metric) summary statistics table: central
//! tendency, spread, distribution shape and missing-value counts. Summaries
//! are derived values, recomputed on demand and never mutated in place.

use serde::Serialize;

use crate::data::{Dataset, Metric};
use crate::stats;

// ===================== SUMMARY ROWS =====================

/// One row of the summary-statistics table.
///
/// Statistics that are undefined for the sample (fewer than 2 values, zero
/// variance) are NaN markers, written through to the CSV export as-is.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryRow {
    pub country: String,
    #[serde(serialize_with = "serialize_metric")]
    pub metric: Metric,
    pub count: usize,
    pub missing: usize,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub skewness: f64,
    pub kurtosis: f64,
}

fn serialize_metric<S: serde::Serializer>(m: &Metric, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(m.column())
}

// ===================== PROFILING =====================

/// Build the summary table for every (country, metric) pair.
///
/// Rows come out sorted by country then metric, matching the exported
/// `summary_statistics.csv` layout.
pub fn profile(dataset: &Dataset, metrics: &[Metric]) -> Vec<SummaryRow> {
    let mut rows = Vec::new();
    for country in dataset.countries() {
        for &metric in metrics {
            let values = dataset.country_values(&country, metric);
            rows.push(SummaryRow {
                country: country.clone(),
                metric,
                count: values.len(),
                missing: dataset.missing_count(&country, metric),
                mean: stats::mean(&values),
                median: stats::median(&values),
                std_dev: stats::sample_std(&values),
                min: if values.is_empty() {
                    f64::NAN
                } else {
                    values.iter().copied().fold(f64::INFINITY, f64::min)
                },
                max: if values.is_empty() {
                    f64::NAN
                } else {
                    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
                },
                skewness: stats::skewness(&values),
                kurtosis: stats::excess_kurtosis(&values),
            });
        }
    }
    rows
}

/// Mean of one metric for one country, straight from the summary table.
pub fn mean_of(rows: &[SummaryRow], country: &str, metric: Metric) -> Option<f64> {
    rows.iter().find(|r| r.country == country && r.metric == metric).map(|r| r.mean)
}

// ===================== TESTS =====================
