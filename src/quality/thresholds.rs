//! Water-quality grade thresholds.
//!
//! Bands follow the Ministry of Environment river living-environment
//! standard for BOD and COD. Upper bounds are inclusive: a reading exactly
//! on a boundary belongs to the better grade.

use crate::model::{GradeThresholds, Metric};
use serde::Serialize;
use std::fmt;

/// BOD bands, mg/L.
pub const BOD_THRESHOLDS: GradeThresholds = GradeThresholds {
    very_good_max: 1.0,
    good_max: 3.0,
    fair_max: 5.0,
    poor_max: 8.0,
};

/// COD bands, mg/L.
pub const COD_THRESHOLDS: GradeThresholds = GradeThresholds {
    very_good_max: 2.0,
    good_max: 4.0,
    fair_max: 7.0,
    poor_max: 9.0,
};

/// Water-quality grades, in descending order of quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Grade {
    VeryGood,
    Good,
    Fair,
    Poor,
    VeryPoor,
    Unknown,
}

impl Grade {
    /// Roman numeral band, or `"?"` for `Unknown`.
    pub fn roman(&self) -> &'static str {
        match self {
            Grade::VeryGood => "I",
            Grade::Good => "II",
            Grade::Fair => "III",
            Grade::Poor => "IV",
            Grade::VeryPoor => "V",
            Grade::Unknown => "?",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Grade::VeryGood => "very good",
            Grade::Good => "good",
            Grade::Fair => "fair",
            Grade::Poor => "poor",
            Grade::VeryPoor => "very poor",
            Grade::Unknown => "unknown",
        }
    }

    /// Label as shown on Korean-language dashboards.
    pub fn label_ko(&self) -> &'static str {
        match self {
            Grade::VeryGood => "매우 좋음 (I등급)",
            Grade::Good => "좋음 (II등급)",
            Grade::Fair => "보통 (III등급)",
            Grade::Poor => "나쁨 (IV등급)",
            Grade::VeryPoor => "매우 나쁨 (V등급)",
            Grade::Unknown => "알 수 없음",
        }
    }

    pub fn color(&self) -> DisplayColor {
        match self {
            Grade::VeryGood => DisplayColor::Blue,
            Grade::Good => DisplayColor::Green,
            Grade::Fair => DisplayColor::Orange,
            Grade::Poor => DisplayColor::Red,
            Grade::VeryPoor => DisplayColor::DarkRed,
            Grade::Unknown => DisplayColor::Gray,
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label(), self.roman())
    }
}

/// Display color attached to each grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayColor {
    Blue,
    Green,
    Orange,
    Red,
    DarkRed,
    Gray,
}

impl DisplayColor {
    /// CSS color name.
    pub fn css_name(&self) -> &'static str {
        match self {
            DisplayColor::Blue => "blue",
            DisplayColor::Green => "green",
            DisplayColor::Orange => "orange",
            DisplayColor::Red => "red",
            DisplayColor::DarkRed => "darkred",
            DisplayColor::Gray => "gray",
        }
    }
}

impl fmt::Display for DisplayColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.css_name())
    }
}

pub fn thresholds_for(metric: Metric) -> &'static GradeThresholds {
    match metric {
        Metric::Bod => &BOD_THRESHOLDS,
        Metric::Cod => &COD_THRESHOLDS,
    }
}

/// Classifies a reading against the bands for `metric`.
///
/// Negative readings and NaN are not physically meaningful concentrations
/// and return `Unknown`; everything above the grade IV bound (including
/// `+inf`) is grade V.
pub fn classify(value: f64, metric: Metric) -> (Grade, DisplayColor) {
    let grade = grade_for(value, thresholds_for(metric));
    (grade, grade.color())
}

/// Like `classify`, but with the metric given by name. Unrecognized metric
/// names return `(Unknown, Gray)`.
pub fn classify_label(value: f64, metric: &str) -> (Grade, DisplayColor) {
    match Metric::from_label(metric) {
        Some(metric) => classify(value, metric),
        None => (Grade::Unknown, Grade::Unknown.color()),
    }
}

fn grade_for(value: f64, t: &GradeThresholds) -> Grade {
    if value.is_nan() || value < 0.0 {
        Grade::Unknown
    } else if value <= t.very_good_max {
        Grade::VeryGood
    } else if value <= t.good_max {
        Grade::Good
    } else if value <= t.fair_max {
        Grade::Fair
    } else if value <= t.poor_max {
        Grade::Poor
    } else {
        Grade::VeryPoor
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn grade(value: f64, metric: Metric) -> Grade {
        classify(value, metric).0
    }

    // --- Boundaries ---------------------------------------------------------

    #[test]
    fn test_bod_boundaries_belong_to_the_better_grade() {
        assert_eq!(grade(1.0, Metric::Bod), Grade::VeryGood);
        assert_eq!(grade(1.01, Metric::Bod), Grade::Good);
        assert_eq!(grade(3.0, Metric::Bod), Grade::Good);
        assert_eq!(grade(3.01, Metric::Bod), Grade::Fair);
        assert_eq!(grade(5.0, Metric::Bod), Grade::Fair);
        assert_eq!(grade(5.01, Metric::Bod), Grade::Poor);
        assert_eq!(grade(8.0, Metric::Bod), Grade::Poor);
        assert_eq!(grade(8.01, Metric::Bod), Grade::VeryPoor);
    }

    #[test]
    fn test_cod_boundaries_belong_to_the_better_grade() {
        assert_eq!(grade(2.0, Metric::Cod), Grade::VeryGood);
        assert_eq!(grade(4.0, Metric::Cod), Grade::Good);
        assert_eq!(grade(7.0, Metric::Cod), Grade::Fair);
        assert_eq!(grade(9.0, Metric::Cod), Grade::Poor);
        assert_eq!(grade(9.01, Metric::Cod), Grade::VeryPoor);
    }

    #[test]
    fn test_same_value_grades_differently_per_metric() {
        // 1.5 mg/L is grade II for BOD but grade I for COD.
        assert_eq!(grade(1.5, Metric::Bod), Grade::Good);
        assert_eq!(grade(1.5, Metric::Cod), Grade::VeryGood);
    }

    #[test]
    fn test_bod_grade_never_improves_as_value_rises() {
        let mut previous = Grade::VeryGood;
        for step in 0..=200 {
            let value = step as f64 * 0.05;
            let current = grade(value, Metric::Bod);
            assert!(
                current >= previous,
                "grade improved from {:?} to {:?} at {}",
                previous,
                current,
                value
            );
            previous = current;
        }
        assert_eq!(previous, Grade::VeryPoor);
    }

    // --- Colors -------------------------------------------------------------

    #[test]
    fn test_each_grade_carries_its_color() {
        assert_eq!(classify(0.5, Metric::Bod), (Grade::VeryGood, DisplayColor::Blue));
        assert_eq!(classify(2.0, Metric::Bod), (Grade::Good, DisplayColor::Green));
        assert_eq!(classify(4.0, Metric::Bod), (Grade::Fair, DisplayColor::Orange));
        assert_eq!(classify(6.0, Metric::Bod), (Grade::Poor, DisplayColor::Red));
        assert_eq!(classify(20.0, Metric::Bod), (Grade::VeryPoor, DisplayColor::DarkRed));
        assert_eq!(DisplayColor::DarkRed.css_name(), "darkred");
    }

    // --- Invalid input ------------------------------------------------------

    #[test]
    fn test_unknown_metric_label_is_unknown_and_gray() {
        assert_eq!(classify_label(3.0, "TOC"), (Grade::Unknown, DisplayColor::Gray));
        assert_eq!(classify_label(3.0, "bod"), (Grade::Good, DisplayColor::Green));
    }

    #[test]
    fn test_negative_and_nan_values_are_unknown() {
        assert_eq!(grade(-0.1, Metric::Bod), Grade::Unknown);
        assert_eq!(grade(f64::NAN, Metric::Cod), Grade::Unknown);
        assert_eq!(grade(0.0, Metric::Bod), Grade::VeryGood);
        assert_eq!(grade(f64::INFINITY, Metric::Cod), Grade::VeryPoor);
    }

    // --- Threshold tables ---------------------------------------------------

    #[test]
    fn test_thresholds_are_ordered_ascending() {
        // Out-of-order bounds would make some grades unreachable.
        for metric in Metric::ALL {
            let t = thresholds_for(metric);
            assert!(t.very_good_max < t.good_max, "{} I/II bounds out of order", metric);
            assert!(t.good_max < t.fair_max, "{} II/III bounds out of order", metric);
            assert!(t.fair_max < t.poor_max, "{} III/IV bounds out of order", metric);
        }
    }

    #[test]
    fn test_labels() {
        assert_eq!(Grade::VeryPoor.to_string(), "very poor (V)");
        assert_eq!(Grade::Fair.label_ko(), "보통 (III등급)");
    }
}
