/// Water-quality grading.
///
/// Submodules:
/// - `thresholds` — grade bands for BOD and COD and the classification rule.

pub mod thresholds;
