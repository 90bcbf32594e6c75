//! River report
//!
//! Assembles what the dashboard shows for one selected river: the trend
//! chart rows, the station map, and the current BOD/COD metrics with their
//! grade and color. The report serializes to JSON for other front ends and
//! prints as plain text for the terminal.

use crate::analysis::aggregate::{LatestValue, RiverSummary};
use crate::model::{Metric, YearMonth};
use crate::quality::thresholds::{self, DisplayColor, Grade};
use crate::stations::{self, MapPoint};
use chrono::{DateTime, Utc};
use serde::Serialize;

// ============================================================================
// Report Structures
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct RiverReport {
    pub timestamp: String,
    pub river: String,
    pub stations: Vec<String>,
    pub has_data: bool,
    pub chart: Vec<ChartRow>,
    pub map: MapSection,
    pub metrics: Vec<MetricStatus>,
}

/// One x-axis position of the BOD/COD line chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartRow {
    pub month: YearMonth,
    pub bod: Option<f64>,
    pub cod: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "points", rename_all = "snake_case")]
pub enum MapSection {
    Available(Vec<MapPoint>),
    /// No coordinates for this river; render a placeholder.
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricStatus {
    pub metric: Metric,
    pub latest: LatestValue,
    pub grade: Grade,
    pub color: DisplayColor,
    pub status: String,
}

// ============================================================================
// Building
// ============================================================================

pub fn build_report(summary: &RiverSummary, now: DateTime<Utc>) -> RiverReport {
    RiverReport {
        timestamp: now.to_rfc3339(),
        river: summary.river.clone(),
        stations: summary.stations.clone(),
        has_data: summary.has_data(),
        chart: chart_rows(summary),
        map: match stations::map_points(&summary.river) {
            Some(points) => MapSection::Available(points),
            None => MapSection::Unavailable,
        },
        metrics: vec![
            metric_status(Metric::Bod, summary.latest_bod),
            metric_status(Metric::Cod, summary.latest_cod),
        ],
    }
}

/// Outer join of the BOD and COD series on month, in chronological order.
pub fn chart_rows(summary: &RiverSummary) -> Vec<ChartRow> {
    let mut months: Vec<YearMonth> = summary
        .bod
        .points
        .iter()
        .chain(summary.cod.points.iter())
        .map(|p| p.month)
        .collect();
    months.sort();
    months.dedup();

    months
        .into_iter()
        .map(|month| ChartRow {
            month,
            bod: summary.bod.value_at(month),
            cod: summary.cod.value_at(month),
        })
        .collect()
}

/// Grade a latest value. `NoData` grades as `Unknown`; a zero-fallback value
/// is graded like any other number.
pub fn metric_status(metric: Metric, latest: LatestValue) -> MetricStatus {
    let (grade, color) = match latest.value() {
        Some(value) => thresholds::classify(value, metric),
        None => (Grade::Unknown, Grade::Unknown.color()),
    };
    MetricStatus {
        metric,
        latest,
        grade,
        color,
        status: grade.label_ko().to_string(),
    }
}

// ============================================================================
// Printing
// ============================================================================

pub fn render_text(report: &RiverReport) -> String {
    let rule = "═".repeat(60);
    let mut out = String::new();

    out.push_str(&format!("{}\n", rule));
    out.push_str(&format!("💧 {} water quality\n", report.river));
    out.push_str(&format!("{}\n", rule));

    out.push_str("\n📊 Monthly trend (mg/L)\n");
    if report.has_data {
        out.push_str(&format!("  {:<8} {:>8} {:>8}\n", "month", "BOD", "COD"));
        for row in &report.chart {
            out.push_str(&format!(
                "  {:<8} {:>8} {:>8}\n",
                row.month.label(),
                format_value(row.bod),
                format_value(row.cod)
            ));
        }
    } else {
        out.push_str("  No data for this river.\n");
    }

    out.push_str("\n🗺️  Station locations\n");
    match &report.map {
        MapSection::Available(points) => {
            for p in points {
                out.push_str(&format!("  {:<10} {:>9.4}, {:>9.4}\n", p.name, p.lat, p.lon));
            }
        }
        MapSection::Unavailable => out.push_str("  No location data for this river.\n"),
    }

    out.push_str("\n⭐ Current values (average)\n");
    for m in &report.metrics {
        let value = match m.latest {
            LatestValue::Measured(v) => format!("{:.2}", v),
            LatestValue::Defaulted(v) => format!("{:.2} (default)", v),
            LatestValue::NoData => "no data".to_string(),
        };
        out.push_str(&format!(
            "  {} (mg/L): {:<16} {} [{}]\n",
            m.metric, value, m.status, m.color
        ));
    }
    out.push_str(&format!("{}\n", rule));
    out
}

pub fn print_report(report: &RiverReport) {
    print!("{}", render_text(report));
}

/// One-line grade for a single reading. A metric name other than BOD or COD
/// grades as unknown (gray) rather than failing.
pub fn classification_line(metric: &str, value: f64) -> String {
    let (grade, color) = thresholds::classify_label(value, metric);
    let name = Metric::from_label(metric)
        .map(|m| m.label().to_string())
        .unwrap_or_else(|| metric.trim().to_string());
    format!("{} {:.2} mg/L: {} [{}]", name, value, grade, color)
}

fn format_value(value: Option<f64>) -> String {
    value.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "-".to_string())
}

// ============================================================================
// Tests
// ============================================================================
