//! Export Module
//!
//! Serializes the summary-statistics table, the hypothesis-test results and
//! the final ranking to flat CSV files in the output directory. Undefined
//! statistics stay NaN in the output rather than being silently dropped.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use serde::Serialize;

use crate::compare::TestResult;
use crate::error::Result;
use crate::profile::SummaryRow;
use crate::rank::RankEntry;

/// File name of the exported summary table.
pub const SUMMARY_FILE: &str = "summary_statistics.csv";
/// File name of the exported test results.
pub const TESTS_FILE: &str = "test_results.csv";
/// File name of the exported ranking.
pub const RANKING_FILE: &str = "ranking.csv";

fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    info!("wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

/// Write the country × metric summary table to `summary_statistics.csv`.
pub fn export_summary_table(rows: &[SummaryRow], out_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(out_dir)?;
    let path = out_dir.join(SUMMARY_FILE);
    write_rows(&path, rows)?;
    Ok(path)
}

/// Write the per-metric hypothesis-test results to `test_results.csv`.
pub fn export_test_results(results: &[TestResult], out_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(out_dir)?;
    let path = out_dir.join(TESTS_FILE);
    write_rows(&path, results)?;
    Ok(path)
}

/// Write the composite ranking to `ranking.csv`.
pub fn export_ranking(entries: &[RankEntry], out_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(out_dir)?;
    let path = out_dir.join(RANKING_FILE);
    write_rows(&path, entries)?;
    Ok(path)
}

// ===================== TESTS =====================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Metric;
    use tempfile::TempDir;

    #[test]
    fn test_summary_export_layout() {
        let rows = vec![SummaryRow {
            country: "Benin".to_string(),
            metric: Metric::Ghi,
            count: 3,
            missing: 1,
            mean: 200.0,
            median: 200.0,
            std_dev: 100.0,
            min: 100.0,
            max: 300.0,
            skewness: 0.0,
            kurtosis: -1.5,
        }];

        let tmp = TempDir::new().unwrap();
        let path = export_summary_table(&rows, tmp.path()).unwrap();
        let body = std::fs::read_to_string(path).unwrap();

        let mut lines = body.lines();
        assert_eq!(
            lines.next().unwrap(),
            "country,metric,count,missing,mean,median,std_dev,min,max,skewness,kurtosis"
        );
        let data = lines.next().unwrap();
        assert!(data.starts_with("Benin,GHI,3,1,200"));
    }

    #[test]
    fn test_ranking_export() {
        let entries = vec![
            RankEntry { rank: 1, country: "Benin".to_string(), score: 0.9, ghi_mean: 310.0 },
            RankEntry { rank: 2, country: "Togo".to_string(), score: 0.4, ghi_mean: 250.0 },
        ];

        let tmp = TempDir::new().unwrap();
        let path = export_ranking(&entries, tmp.path()).unwrap();
        let body = std::fs::read_to_string(path).unwrap();
        assert!(body.starts_with("rank,country,score,ghi_mean"));
        assert_eq!(body.lines().count(), 3);
    }
}
