//! solarstats — cross-country solar irradiance analysis
//!
//! A batch pipeline that loads per-country solar measurement CSVs, imputes
//! Z-score outliers, profiles each country's metrics, tests whether the
//! countries differ (ANOVA / Kruskal-Wallis), ranks them by a composite
//! solar-potential score and exports tables and charts.
//!
//! Stages pass owned, immutable values to each other:
//!
//! ```text
//! load -> clean -> profile -> compare / rank -> plot / export
//! ```

pub mod clean;
pub mod cli;
pub mod compare;
pub mod data;
pub mod error;
pub mod export;
pub mod load;
pub mod plot;
pub mod profile;
pub mod rank;
pub mod stats;

pub use data::{Dataset, Metric, Record};
pub use error::{Error, Result};
