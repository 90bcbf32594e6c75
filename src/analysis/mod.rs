/// Series shaping and aggregation for the water-quality monitoring service.
///
/// Submodules:
/// - `reshape`   — transposes the wide observation table into per-station
///                 series and assigns them to BOD / COD.
/// - `aggregate` — selects a river's stations, averages them per month, and
///                 exposes the latest value.

pub mod aggregate;
pub mod reshape;
