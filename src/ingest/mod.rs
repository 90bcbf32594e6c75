/// Data ingestion for the water-quality monitoring service.
///
/// Submodules:
/// - `csv_source` — fetches the observation CSV (file or HTTP), decodes it
///   with an encoding fallback, and parses it into an `ObservationTable`.

pub mod csv_source;
