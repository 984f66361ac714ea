//! Command-Line Interface Module
//!
//! Handles argument parsing and validation for the solarstats pipeline.

use std::path::PathBuf;

use clap::Parser;

use crate::data::Metric;

// ===================== CLI =====================

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Args {
    /// Directory containing one CSV file per country
    #[arg(long, default_value = "data", env = "SOLARSTATS_DATA_DIR")]
    pub data_dir: PathBuf,

    /// Directory for exported tables and charts
    #[arg(long, default_value = "output", env = "SOLARSTATS_OUT_DIR")]
    pub out_dir: PathBuf,

    /// Metrics to clean, profile, compare and rank (default: GHI DNI DHI)
    #[arg(long = "metric", value_parser = parse_metric)]
    pub metrics: Vec<Metric>,

    /// |Z| threshold above which a value is treated as an outlier
    #[arg(long, default_value_t = 3.0, value_parser = parse_threshold, env = "SOLARSTATS_Z_THRESHOLD")]
    pub z_threshold: f64,

    /// Significance level for the cross-country hypothesis tests
    #[arg(long, default_value_t = 0.05, value_parser = parse_alpha, env = "SOLARSTATS_ALPHA")]
    pub alpha: f64,

    /// Ranking weight per metric, in the same order as --metric
    /// (default: equal weights)
    #[arg(long = "weight", value_parser = parse_weight)]
    pub weights: Vec<f64>,

    /// Skip chart rendering, export tables only
    #[arg(long)]
    pub no_plots: bool,

    /// Profile and export the raw data without outlier cleaning
    #[arg(long)]
    pub no_clean: bool,
}

impl Args {
    /// Selected metrics, falling back to the irradiance trio.
    pub fn metric_list(&self) -> Vec<Metric> {
        if self.metrics.is_empty() {
            Metric::IRRADIANCE.to_vec()
        } else {
            self.metrics.clone()
        }
    }
}

// ===================== CLI VALUE PARSERS =====================

fn parse_metric(s: &str) -> Result<Metric, String> {
    Metric::from_column(s).ok_or_else(|| {
        let known: Vec<&str> = Metric::ALL.iter().map(|m| m.column()).collect();
        format!("Unknown metric '{}', expected one of: {}", s, known.join(", "))
    })
}

fn parse_threshold(s: &str) -> Result<f64, String> {
    let v: f64 = s.parse().map_err(|_| format!("Invalid number: {}", s))?;
    if v <= 0.0 {
        return Err(format!("Z threshold must be positive, got {}", v));
    }
    Ok(v)
}

fn parse_alpha(s: &str) -> Result<f64, String> {
    let v: f64 = s.parse().map_err(|_| format!("Invalid number: {}", s))?;
    if v <= 0.0 || v >= 1.0 {
        return Err(format!("Alpha must be in (0, 1), got {}", v));
    }
    Ok(v)
}

fn parse_weight(s: &str) -> Result<f64, String> {
    let v: f64 = s.parse().map_err(|_| format!("Invalid number: {}", s))?;
    if v < 0.0 {
        return Err(format!("Weight must be non-negative, got {}", v));
    }
    Ok(v)
}

// ===================== TESTS =====================
