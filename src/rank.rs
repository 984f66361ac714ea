//! Country Ranking Module
//!
//! Aggregates per-country metric means into one composite solar-potential
//! score. Each metric is min-max normalized to [0, 1] across countries and
//! the composite is the weighted mean of the normalized values. The ordering
//! is a documented total order: descending composite score, ties broken by
//! highest raw GHI mean, then alphabetical country name.

use std::collections::HashMap;

use log::debug;
use serde::Serialize;

use crate::data::Metric;
use crate::profile::{mean_of, SummaryRow};

// ===================== RANKING RECORDS =====================

/// One country's normalized metric values, radar-chart ready.
#[derive(Debug, Clone, PartialEq)]
pub struct RadarRow {
    pub country: String,
    /// (metric, normalized value in [0, 1]) in input metric order.
    pub values: Vec<(Metric, f64)>,
}

/// One entry of the final ranking, ordered best-first.
#[derive(Debug, Clone, Serialize)]
pub struct RankEntry {
    pub rank: usize,
    pub country: String,
    pub score: f64,
    /// Raw GHI mean, the documented first tie-breaker.
    pub ghi_mean: f64,
}

/// Complete ranking plus the normalized table it was computed from.
#[derive(Debug, Clone)]
pub struct Ranking {
    pub entries: Vec<RankEntry>,
    pub radar: Vec<RadarRow>,
}

// ===================== NORMALIZATION =====================

/// Min-max normalize each metric's per-country mean across countries.
///
/// A metric whose means are identical for every country (max == min) carries
/// no discriminating signal: its normalized value is defined as 0 for every
/// country, which also avoids the division by zero.
pub fn prepare_radar_data(rows: &[SummaryRow], metrics: &[Metric]) -> Vec<RadarRow> {
    let countries: Vec<String> = {
        let mut seen = Vec::new();
        for r in rows {
            if !seen.contains(&r.country) {
                seen.push(r.country.clone());
            }
        }
        seen.sort();
        seen
    };

    // Per-metric extremes over the finite means
    let mut bounds: HashMap<Metric, (f64, f64)> = HashMap::new();
    for &metric in metrics {
        let means: Vec<f64> = countries
            .iter()
            .filter_map(|c| mean_of(rows, c, metric))
            .filter(|m| m.is_finite())
            .collect();
        if let (Some(min), Some(max)) = (
            means.iter().copied().reduce(f64::min),
            means.iter().copied().reduce(f64::max),
        ) {
            bounds.insert(metric, (min, max));
        }
    }

    countries
        .iter()
        .map(|country| {
            let values = metrics
                .iter()
                .map(|&metric| {
                    let norm = match (mean_of(rows, country, metric), bounds.get(&metric)) {
                        (Some(mean), Some(&(min, max))) if mean.is_finite() && max > min => {
                            (mean - min) / (max - min)
                        }
                        // Degenerate or missing metric contributes nothing
                        _ => 0.0,
                    };
                    (metric, norm)
                })
                .collect();
            RadarRow { country: country.clone(), values }
        })
        .collect()
}

// ===================== RANKING =====================

/// Rank countries by weighted composite score over normalized metric means.
///
/// `weights` pairs with `metrics` positionally; pass `None` for equal
/// weights. Weights are normalized to sum to 1 internally; a weight vector
/// that does not sum to a positive finite value carries no signal and falls
/// back to equal weights, so scores never divide by zero.
pub fn get_country_ranking(
    rows: &[SummaryRow],
    metrics: &[Metric],
    weights: Option<&[f64]>,
) -> Ranking {
    let radar = prepare_radar_data(rows, metrics);

    let weights: Vec<f64> = match weights {
        Some(w) if w.iter().sum::<f64>() > 0.0 && w.iter().sum::<f64>().is_finite() => w.to_vec(),
        _ => vec![1.0; metrics.len()],
    };
    let total: f64 = weights.iter().sum();

    let mut scored: Vec<RankEntry> = radar
        .iter()
        .map(|row| {
            let score: f64 = row
                .values
                .iter()
                .zip(&weights)
                .map(|((_, norm), w)| norm * w / total)
                .sum();
            let ghi_mean = mean_of(rows, &row.country, Metric::Ghi).unwrap_or(f64::NAN);
            RankEntry { rank: 0, country: row.country.clone(), score, ghi_mean }
        })
        .collect();

    // Total order: score desc, then raw GHI mean desc, then name asc
    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                b.ghi_mean.partial_cmp(&a.ghi_mean).unwrap_or(std::cmp::Ordering::Equal)
            })
            .then_with(|| a.country.cmp(&b.country))
    });
    for (i, entry) in scored.iter_mut().enumerate() {
        entry.rank = i + 1;
        debug!("rank {}: {} score {:.4}", entry.rank, entry.country, entry.score);
    }

    Ranking { entries: scored, radar }
}

// ===================== TESTS =====================
