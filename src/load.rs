//! Data Loading Module
//!
//! Reads one CSV per country from an input directory, validates the schema,
//! tags every row with its origin country and merges everything into one
//! unified [`Dataset`]. Loading is strict: a missing required column or an
//! unparseable cell aborts the run, because a silently-skipped malformed
//! dataset would produce misleading statistics downstream.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use log::{debug, info};

use crate::data::{Dataset, Metric, Record};
use crate::error::{Error, Result};

/// Accepted timestamp layouts, tried in order after RFC 3339.
const TIMESTAMP_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"];

// ===================== DIRECTORY LOADING =====================

/// Load every `*.csv` file in `dir` and merge them into one dataset.
///
/// The country label is derived from the file name (see [`country_from_path`]).
/// After the merge, rows are sorted by (timestamp, country) so the unified
/// row order is reproducible regardless of directory enumeration order.
///
/// # Errors
/// * [`Error::NoInputFiles`] if the directory holds no CSV files
/// * [`Error::Schema`] if a file lacks a required column
/// * [`Error::Timestamp`] / [`Error::Numeric`] on unparseable cells
pub fn load_dir(dir: &Path) -> Result<Dataset> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().map(|e| e.eq_ignore_ascii_case("csv")).unwrap_or(false))
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(Error::NoInputFiles { dir: dir.to_path_buf() });
    }

    let mut records = Vec::new();
    for file in &files {
        let country = country_from_path(file);
        let mut rows = load_file(file, &country)?;
        info!("loaded {} records for {} from {}", rows.len(), country, file.display());
        records.append(&mut rows);
    }

    // Deterministic unified order, independent of load order
    records.sort_by(|a, b| {
        a.timestamp.cmp(&b.timestamp).then_with(|| a.country.cmp(&b.country))
    });

    Ok(Dataset::new(records))
}

/// Derive a country label from a file name.
///
/// The stem is lowercased, a trailing `_clean` marker is stripped and each
/// underscore/hyphen separated word is title-cased:
/// `sierra_leone_clean.csv` → "Sierra Leone".
pub fn country_from_path(path: &Path) -> String {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("unknown").to_lowercase();
    let stem = stem.strip_suffix("_clean").unwrap_or(&stem);
    stem.split(['_', '-'])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ===================== FILE LOADING =====================

/// Read one country file into records, validating the required schema.
fn load_file(path: &Path, country: &str) -> Result<Vec<Record>> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;

    let headers = reader.headers()?.clone();
    let columns = index_columns(&headers);

    let ts_idx = *columns.get("timestamp").ok_or_else(|| Error::Schema {
        file: path.to_path_buf(),
        column: "Timestamp".to_string(),
    })?;
    for metric in Metric::REQUIRED {
        if !columns.contains_key(&metric.column().to_lowercase()) {
            return Err(Error::Schema {
                file: path.to_path_buf(),
                column: metric.column().to_string(),
            });
        }
    }

    let metric_idx: Vec<(Metric, Option<usize>)> = Metric::ALL
        .iter()
        .map(|&m| (m, columns.get(&m.column().to_lowercase()).copied()))
        .collect();

    let mut records = Vec::new();
    for (row_no, row) in reader.records().enumerate() {
        let row = row?;
        let line = row_no + 2; // 1-based, after the header line

        let raw_ts = row.get(ts_idx).unwrap_or("");
        let timestamp = parse_timestamp(raw_ts).ok_or_else(|| Error::Timestamp {
            file: path.to_path_buf(),
            line,
            value: raw_ts.to_string(),
        })?;

        let mut record = Record {
            timestamp,
            country: country.to_string(),
            ghi: None,
            dni: None,
            dhi: None,
            tamb: None,
            rh: None,
            ws: None,
        };
        for (metric, idx) in &metric_idx {
            if let Some(idx) = idx {
                let cell = row.get(*idx).unwrap_or("");
                record.set_value(*metric, parse_cell(cell, path, line, *metric)?);
            }
        }
        records.push(record);
    }

    debug!("{}: {} data rows", path.display(), records.len());
    Ok(records)
}

/// Map lowercased header names to their column index.
fn index_columns(headers: &csv::StringRecord) -> HashMap<String, usize> {
    headers.iter().enumerate().map(|(i, h)| (h.trim().to_lowercase(), i)).collect()
}

/// Parse a timestamp cell, trying RFC 3339 first and then the known layouts.
fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    TIMESTAMP_FORMATS.iter().find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

/// Parse a numeric cell; an empty cell is a missing value, not zero.
fn parse_cell(cell: &str, path: &Path, line: usize, metric: Metric) -> Result<Option<f64>> {
    if cell.is_empty() || cell.eq_ignore_ascii_case("nan") || cell.eq_ignore_ascii_case("na") {
        return Ok(None);
    }
    cell.parse::<f64>().map(Some).map_err(|_| Error::Numeric {
        file: path.to_path_buf(),
        line,
        column: metric.column().to_string(),
        value: cell.to_string(),
    })
}

// ===================== TESTS =====================
