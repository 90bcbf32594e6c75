//! Reshaping the wide observation table into metric series.
//!
//! The source CSV does not label which rows or months carry BOD and which
//! carry COD. Two assignment policies are supported; neither is derived from
//! the row content, so both are approximations chosen by configuration:
//!
//! - **Parity split**: after transposition the month positions form one
//!   interleaved sequence. Even positions go to one metric, odd positions to
//!   the other.
//! - **Positional pair**: for one month column, the first two numeric cells
//!   of a river's rows are BOD and COD, in that order.

use crate::logging::{self, DataSource};
use crate::model::{ObservationTable, SeriesPoint, StationSeries, YearMonth};
use serde::{Deserialize, Serialize};

/// Which parity of month positions holds BOD under the parity split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParityAssignment {
    /// Positions 0, 2, 4, … are BOD; 1, 3, 5, … are COD.
    #[default]
    BodOnEven,
    /// Positions 1, 3, 5, … are BOD; 0, 2, 4, … are COD.
    BodOnOdd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitStrategy {
    Parity(ParityAssignment),
    /// `month: None` selects the last month column of the table.
    PositionalPair { month: Option<YearMonth> },
}

impl Default for SplitStrategy {
    fn default() -> Self {
        SplitStrategy::Parity(ParityAssignment::default())
    }
}

/// Station series divided between the two metrics.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MetricSplit {
    pub bod: Vec<StationSeries>,
    pub cod: Vec<StationSeries>,
}

/// BOD and COD for a single month, taken positionally.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthlyPair {
    pub month: YearMonth,
    pub bod: Option<f64>,
    pub cod: Option<f64>,
}

// ---------------------------------------------------------------------------
// Transposition
// ---------------------------------------------------------------------------

/// One series per observation row, each with exactly one point per month
/// column, in column order.
pub fn transpose(table: &ObservationTable) -> Vec<StationSeries> {
    table
        .rows
        .iter()
        .map(|row| StationSeries {
            river: row.river.clone(),
            station: row.station.clone(),
            points: table
                .months
                .iter()
                .enumerate()
                .map(|(idx, &month)| SeriesPoint {
                    month,
                    value: row.values.get(idx).copied().flatten(),
                })
                .collect(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Parity split
// ---------------------------------------------------------------------------

/// Divide each series' points by position parity.
pub fn split_by_parity(series: &[StationSeries], assignment: ParityAssignment) -> MetricSplit {
    let bod_parity = match assignment {
        ParityAssignment::BodOnEven => 0,
        ParityAssignment::BodOnOdd => 1,
    };

    let take = |s: &StationSeries, parity: usize| StationSeries {
        river: s.river.clone(),
        station: s.station.clone(),
        points: s
            .points
            .iter()
            .enumerate()
            .filter(|(idx, _)| idx % 2 == parity)
            .map(|(_, point)| *point)
            .collect(),
    };

    MetricSplit {
        bod: series.iter().map(|s| take(s, bod_parity)).collect(),
        cod: series.iter().map(|s| take(s, 1 - bod_parity)).collect(),
    }
}

// ---------------------------------------------------------------------------
// Positional pair
// ---------------------------------------------------------------------------

/// Take BOD and COD as the first two numeric cells of `river`'s rows in one
/// month column.
///
/// Returns `None` if the month is not a column of the table (or, for
/// `month: None`, if the table has no month columns). A pair with missing
/// halves is returned when the river has fewer than two numeric cells.
pub fn positional_pair(
    table: &ObservationTable,
    river: &str,
    month: Option<YearMonth>,
) -> Option<MonthlyPair> {
    let (idx, month) = match month {
        Some(month) => (table.month_index(month)?, month),
        None => {
            let month = *table.months.last()?;
            (table.months.len() - 1, month)
        }
    };

    let mut numeric = table
        .rows
        .iter()
        .filter(|row| row.river == river)
        .filter_map(|row| row.values.get(idx).copied().flatten());

    Some(MonthlyPair {
        month,
        bod: numeric.next(),
        cod: numeric.next(),
    })
}

/// Split a river's rows with `strategy`.
///
/// The parity split always yields one series per row; the positional pair
/// yields a single one-point series per metric, labelled with the river name.
pub fn split_river(table: &ObservationTable, river: &str, strategy: SplitStrategy) -> MetricSplit {
    match strategy {
        SplitStrategy::Parity(assignment) => {
            logging::warn(
                DataSource::System,
                Some(river),
                &format!(
                    "assigning BOD/COD by month parity ({:?}); not verified against row content",
                    assignment
                ),
            );
            let rows: Vec<StationSeries> = transpose(table)
                .into_iter()
                .filter(|s| s.river == river)
                .collect();
            split_by_parity(&rows, assignment)
        }
        SplitStrategy::PositionalPair { month } => {
            let Some(pair) = positional_pair(table, river, month) else {
                return MetricSplit::default();
            };
            if table.rows.iter().all(|row| row.river != river) {
                return MetricSplit::default();
            }
            let one = |value: Option<f64>| StationSeries {
                river: river.to_string(),
                station: river.to_string(),
                points: vec![SeriesPoint {
                    month: pair.month,
                    value,
                }],
            };
            MetricSplit {
                bod: vec![one(pair.bod)],
                cod: vec![one(pair.cod)],
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
