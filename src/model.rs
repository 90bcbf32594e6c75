/// Core data types for the water-quality monitoring service.
///
/// This module defines the shared domain model imported by all other modules:
/// metrics, the year-month axis, the observation table loaded from CSV, the
/// per-station series derived from it, and the load error taxonomy.
/// It contains no I/O.

use chrono::{Datelike, NaiveDate};
use serde::{Serialize, Serializer};
use std::fmt;

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// The two oxygen-demand measurements reported per station, in mg/L.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Metric {
    /// Biochemical oxygen demand.
    #[serde(rename = "BOD")]
    Bod,
    /// Chemical oxygen demand.
    #[serde(rename = "COD")]
    Cod,
}

impl Metric {
    pub const ALL: [Metric; 2] = [Metric::Bod, Metric::Cod];

    pub fn label(&self) -> &'static str {
        match self {
            Metric::Bod => "BOD",
            Metric::Cod => "COD",
        }
    }

    /// Parses a metric name case-insensitively. Returns `None` for anything
    /// other than BOD or COD.
    pub fn from_label(label: &str) -> Option<Metric> {
        match label.trim().to_ascii_uppercase().as_str() {
            "BOD" => Some(Metric::Bod),
            "COD" => Some(Metric::Cod),
            _ => None,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ---------------------------------------------------------------------------
// Month axis
// ---------------------------------------------------------------------------

/// A calendar month parsed from a `YYYY.MM` column label.
///
/// Stored as the first day of the month so ordering is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth(NaiveDate);

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<YearMonth> {
        NaiveDate::from_ymd_opt(year, month, 1).map(YearMonth)
    }

    /// Parses a column label of exactly the form `YYYY.MM` (month 01-12).
    ///
    /// Anything else (`2025.4`, `2025-04`, `구분(1)`, `2025.13`) is not a
    /// month column and returns `None`.
    pub fn parse_label(label: &str) -> Option<YearMonth> {
        let label = label.trim();
        let bytes = label.as_bytes();
        if bytes.len() != 7 || bytes[4] != b'.' {
            return None;
        }
        let (year, month) = (&label[..4], &label[5..]);
        if !year.bytes().chain(month.bytes()).all(|b| b.is_ascii_digit()) {
            return None;
        }
        YearMonth::new(year.parse().ok()?, month.parse().ok()?)
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// Formats back to the `YYYY.MM` column label.
    pub fn label(&self) -> String {
        self.0.format("%Y.%m").to_string()
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y.%m"))
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ---------------------------------------------------------------------------
// Observation table
// ---------------------------------------------------------------------------

/// One data row of the source CSV.
///
/// The source does not say which metric a row carries; see
/// `analysis::reshape` for the policies that assign rows to BOD or COD.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationRow {
    pub river: String,
    pub station: String,
    /// One cell per entry of `ObservationTable::months`; `None` = missing.
    pub values: Vec<Option<f64>>,
}

/// The wide table loaded from CSV: identifier columns reduced to canonical
/// `river` / `station`, and one value column per month.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObservationTable {
    pub months: Vec<YearMonth>,
    pub rows: Vec<ObservationRow>,
}

impl ObservationTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct river names in first-seen order.
    pub fn rivers(&self) -> Vec<&str> {
        let mut rivers: Vec<&str> = Vec::new();
        for row in &self.rows {
            if !rivers.contains(&row.river.as_str()) {
                rivers.push(&row.river);
            }
        }
        rivers
    }

    /// Distinct station names belonging to `river`, in first-seen order.
    pub fn stations_in_river(&self, river: &str) -> Vec<&str> {
        let mut stations: Vec<&str> = Vec::new();
        for row in self.rows.iter().filter(|r| r.river == river) {
            if !stations.contains(&row.station.as_str()) {
                stations.push(&row.station);
            }
        }
        stations
    }

    /// Column index of `month`, if the table has that month.
    pub fn month_index(&self, month: YearMonth) -> Option<usize> {
        self.months.iter().position(|m| *m == month)
    }
}

// ---------------------------------------------------------------------------
// Series types
// ---------------------------------------------------------------------------

/// A single (month, value) pair. `value` is `None` when the source cell was
/// blank or non-numeric, or when no station reported for an averaged month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub month: YearMonth,
    pub value: Option<f64>,
}

/// The transposed values of one observation row.
#[derive(Debug, Clone, PartialEq)]
pub struct StationSeries {
    pub river: String,
    pub station: String,
    pub points: Vec<SeriesPoint>,
}

/// A month-indexed series not tied to one station, e.g. a river average.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TimeSeries {
    pub points: Vec<SeriesPoint>,
}

impl TimeSeries {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn last(&self) -> Option<&SeriesPoint> {
        self.points.last()
    }

    pub fn values(&self) -> Vec<Option<f64>> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn value_at(&self, month: YearMonth) -> Option<f64> {
        self.points
            .iter()
            .find(|p| p.month == month)
            .and_then(|p| p.value)
    }
}

// ---------------------------------------------------------------------------
// Threshold types
// ---------------------------------------------------------------------------

/// Inclusive upper bounds of grades I-IV for one metric, in mg/L.
/// Anything above `poor_max` is grade V.
///
/// Bounds in ascending order:
///   very_good_max < good_max < fair_max < poor_max
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradeThresholds {
    pub very_good_max: f64,
    pub good_max: f64,
    pub fair_max: f64,
    pub poor_max: f64,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise when loading the observation table.
///
/// Every variant is fatal for the run: no chart or metric is produced from a
/// table that failed to load.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    /// The file is missing, the URL unreachable, or the server returned a
    /// non-2xx status.
    #[error("data unavailable at {resource}: {reason}")]
    ResourceUnavailable { resource: String, reason: String },

    /// The bytes did not decode in any of the attempted encodings.
    #[error("could not decode {resource} as any of [{}]", .attempted.join(", "))]
    EncodingFailure {
        resource: String,
        attempted: Vec<&'static str>,
    },

    /// An expected identifier column is absent from the header row.
    #[error("{resource} is missing expected column '{column}'")]
    SchemaMismatch { resource: String, column: String },

    /// The CSV structure itself is malformed.
    #[error("CSV error in {resource}: {source}")]
    Csv {
        resource: String,
        #[source]
        source: csv::Error,
    },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
