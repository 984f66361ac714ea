//! Data Model Module
//!
//! Defines the measurement record, the unified multi-country dataset and the
//! metric vocabulary shared by every pipeline stage. All types are owned
//! values: each stage consumes its input and returns a fresh output, so no
//! stage ever observes another stage's mutations.

use chrono::NaiveDateTime;

// ===================== METRICS =====================

/// A measured solar/weather quantity, one CSV column each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Metric {
    /// Global Horizontal Irradiance (W/m²)
    Ghi,
    /// Direct Normal Irradiance (W/m²)
    Dni,
    /// Diffuse Horizontal Irradiance (W/m²)
    Dhi,
    /// Ambient temperature (°C)
    Tamb,
    /// Relative humidity (%)
    Rh,
    /// Wind speed (m/s)
    Ws,
}

impl Metric {
    /// All metrics, in canonical column order.
    pub const ALL: [Metric; 6] =
        [Metric::Ghi, Metric::Dni, Metric::Dhi, Metric::Tamb, Metric::Rh, Metric::Ws];

    /// Columns every input file must carry (besides `Timestamp`).
    pub const REQUIRED: [Metric; 3] = [Metric::Ghi, Metric::Dni, Metric::Dhi];

    /// The three irradiance metrics compared and ranked by default.
    pub const IRRADIANCE: [Metric; 3] = [Metric::Ghi, Metric::Dni, Metric::Dhi];

    /// CSV header name for this metric.
    pub fn column(&self) -> &'static str {
        match self {
            Metric::Ghi => "GHI",
            Metric::Dni => "DNI",
            Metric::Dhi => "DHI",
            Metric::Tamb => "Tamb",
            Metric::Rh => "RH",
            Metric::Ws => "WS",
        }
    }

    /// Parse a metric from its column name (case-insensitive).
    pub fn from_column(name: &str) -> Option<Metric> {
        Metric::ALL.iter().copied().find(|m| m.column().eq_ignore_ascii_case(name))
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.column())
    }
}

// ===================== RECORDS =====================

/// One timestamped observation, tagged with its origin country.
///
/// Numeric fields are `Option<f64>`: a missing cell is `None`, which is
/// distinct from a measured zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub timestamp: NaiveDateTime,
    pub country: String,
    pub ghi: Option<f64>,
    pub dni: Option<f64>,
    pub dhi: Option<f64>,
    pub tamb: Option<f64>,
    pub rh: Option<f64>,
    pub ws: Option<f64>,
}

impl Record {
    /// Value of the given metric, `None` when missing.
    pub fn value(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Ghi => self.ghi,
            Metric::Dni => self.dni,
            Metric::Dhi => self.dhi,
            Metric::Tamb => self.tamb,
            Metric::Rh => self.rh,
            Metric::Ws => self.ws,
        }
    }

    /// Overwrite the given metric's value.
    pub fn set_value(&mut self, metric: Metric, value: Option<f64>) {
        match metric {
            Metric::Ghi => self.ghi = value,
            Metric::Dni => self.dni = value,
            Metric::Dhi => self.dhi = value,
            Metric::Tamb => self.tamb = value,
            Metric::Rh => self.rh = value,
            Metric::Ws => self.ws = value,
        }
    }
}

// ===================== DATASET =====================

/// Unified dataset: every country's records merged into one ordered table.
///
/// Rows are kept sorted by (timestamp, country) after loading so downstream
/// statistics are deterministic regardless of file enumeration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub records: Vec<Record>,
}

impl Dataset {
    pub fn new(records: Vec<Record>) -> Self {
        Dataset { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct country labels, alphabetically sorted.
    pub fn countries(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for r in &self.records {
            if !out.iter().any(|c| c == &r.country) {
                out.push(r.country.clone());
            }
        }
        out.sort();
        out
    }

    /// New dataset containing only records from the given countries.
    pub fn filter_by_country(&self, countries: &[String]) -> Dataset {
        let records = self
            .records
            .iter()
            .filter(|r| countries.iter().any(|c| c == &r.country))
            .cloned()
            .collect();
        Dataset { records }
    }

    /// Non-missing values of `metric` for one country, in row order.
    pub fn country_values(&self, country: &str, metric: Metric) -> Vec<f64> {
        self.records
            .iter()
            .filter(|r| r.country == country)
            .filter_map(|r| r.value(metric))
            .collect()
    }

    /// Count of missing cells of `metric` for one country.
    pub fn missing_count(&self, country: &str, metric: Metric) -> usize {
        self.records
            .iter()
            .filter(|r| r.country == country && r.value(metric).is_none())
            .count()
    }
}

// ===================== TESTS =====================
