//! River selection and monthly averaging.
//!
//! Everything here is a pure function of the loaded table and the selected
//! river; a selection change simply recomputes the summary.

use crate::analysis::reshape::{self, SplitStrategy};
use crate::model::{ObservationTable, SeriesPoint, StationSeries, TimeSeries, YearMonth};
use serde::{Deserialize, Serialize};

/// What "latest value" reports when there is nothing to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LatestValuePolicy {
    /// Report the absence explicitly.
    #[default]
    NoData,
    /// Report 0.0, flagged as `Defaulted`.
    Zero,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum LatestValue {
    Measured(f64),
    /// A placeholder produced by `LatestValuePolicy::Zero`, not a reading.
    Defaulted(f64),
    NoData,
}

impl LatestValue {
    /// The number to display, if any.
    pub fn value(&self) -> Option<f64> {
        match self {
            LatestValue::Measured(v) | LatestValue::Defaulted(v) => Some(*v),
            LatestValue::NoData => None,
        }
    }
}

/// Everything derived for one selected river.
#[derive(Debug, Clone, PartialEq)]
pub struct RiverSummary {
    pub river: String,
    pub stations: Vec<String>,
    pub bod: TimeSeries,
    pub cod: TimeSeries,
    pub latest_bod: LatestValue,
    pub latest_cod: LatestValue,
}

impl RiverSummary {
    /// `false` for an empty selection: the river has no rows, or none of
    /// its months carry a value.
    pub fn has_data(&self) -> bool {
        self.bod
            .points
            .iter()
            .chain(self.cod.points.iter())
            .any(|p| p.value.is_some())
    }
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// River names for the selector, in first-seen order.
pub fn rivers(table: &ObservationTable) -> Vec<String> {
    table.rivers().into_iter().map(String::from).collect()
}

/// Station names of `river`, from the membership recorded in the table.
pub fn stations_in_river(table: &ObservationTable, river: &str) -> Vec<String> {
    table
        .stations_in_river(river)
        .into_iter()
        .map(String::from)
        .collect()
}

/// Series whose station is one of `stations`.
pub fn select_series<'a>(series: &'a [StationSeries], stations: &[String]) -> Vec<&'a StationSeries> {
    series
        .iter()
        .filter(|s| stations.iter().any(|name| *name == s.station))
        .collect()
}

// ---------------------------------------------------------------------------
// Averaging
// ---------------------------------------------------------------------------

/// Column-wise arithmetic mean across `series`, per month.
///
/// Missing values are skipped; a month where every value is missing becomes
/// a missing point. Months appear in first-seen order. No series in, empty
/// series out.
pub fn average_by_month(series: &[&StationSeries]) -> TimeSeries {
    let mut months: Vec<YearMonth> = Vec::new();
    let mut sums: Vec<(f64, usize)> = Vec::new();

    for s in series {
        for point in &s.points {
            let idx = match months.iter().position(|m| *m == point.month) {
                Some(idx) => idx,
                None => {
                    months.push(point.month);
                    sums.push((0.0, 0));
                    months.len() - 1
                }
            };
            if let Some(value) = point.value {
                sums[idx].0 += value;
                sums[idx].1 += 1;
            }
        }
    }

    TimeSeries {
        points: months
            .into_iter()
            .zip(sums)
            .map(|(month, (sum, count))| SeriesPoint {
                month,
                value: (count > 0).then(|| sum / count as f64),
            })
            .collect(),
    }
}

/// Value of the most recent point of `series`.
pub fn latest_value(series: &TimeSeries, policy: LatestValuePolicy) -> LatestValue {
    match (series.last().and_then(|p| p.value), policy) {
        (Some(value), _) => LatestValue::Measured(value),
        (None, LatestValuePolicy::NoData) => LatestValue::NoData,
        (None, LatestValuePolicy::Zero) => LatestValue::Defaulted(0.0),
    }
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Select `river`, split its rows into BOD/COD with `strategy`, average per
/// month, and take the latest values. Never fails: an unknown river gives
/// empty series and latest values per `policy`.
pub fn summarize_river(
    table: &ObservationTable,
    river: &str,
    strategy: SplitStrategy,
    policy: LatestValuePolicy,
) -> RiverSummary {
    let stations = stations_in_river(table, river);
    let split = reshape::split_river(table, river, strategy);

    let (bod, cod) = match strategy {
        SplitStrategy::Parity(_) => (
            average_by_month(&select_series(&split.bod, &stations)),
            average_by_month(&select_series(&split.cod, &stations)),
        ),
        // Already one river-level value per metric
        SplitStrategy::PositionalPair { .. } => (
            average_by_month(&split.bod.iter().collect::<Vec<_>>()),
            average_by_month(&split.cod.iter().collect::<Vec<_>>()),
        ),
    };

    RiverSummary {
        river: river.to_string(),
        stations,
        latest_bod: latest_value(&bod, policy),
        latest_cod: latest_value(&cod, policy),
        bod,
        cod,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
