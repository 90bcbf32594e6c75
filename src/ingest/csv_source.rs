/// Observation CSV loader
///
/// Reads the wide water-quality CSV published as a local file or over
/// HTTP(S), decodes it with an ordered encoding fallback, and reduces it to
/// an `ObservationTable`: two identifier columns renamed to canonical
/// `river` / `station`, plus one value column per `YYYY.MM` header.
///
/// Korean government exports are usually cp949; re-saved copies are often
/// UTF-8 (with or without BOM). Both are tried, in configured order.

use crate::logging::{self, DataSource};
use crate::model::{DataError, ObservationRow, ObservationTable, YearMonth};
use encoding_rs::{EUC_KR, UTF_8};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Header of the identifier column holding the river name.
pub const DEFAULT_RIVER_COLUMN: &str = "구분(1)";

/// Header of the identifier column holding the station name.
pub const DEFAULT_STATION_COLUMN: &str = "구분(4)";

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

// ============================================================================
// Source Location
// ============================================================================

/// Where the CSV comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CsvSource {
    Path(PathBuf),
    Url(String),
}

impl CsvSource {
    /// `http://` and `https://` locations are URLs; anything else is a path.
    pub fn parse(location: &str) -> CsvSource {
        let location = location.trim();
        let lower = location.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            CsvSource::Url(location.to_string())
        } else {
            CsvSource::Path(PathBuf::from(location))
        }
    }

    pub fn data_source(&self) -> DataSource {
        match self {
            CsvSource::Path(_) => DataSource::File,
            CsvSource::Url(_) => DataSource::Http,
        }
    }
}

impl fmt::Display for CsvSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CsvSource::Path(path) => write!(f, "{}", path.display()),
            CsvSource::Url(url) => write!(f, "{}", url),
        }
    }
}

// ============================================================================
// Encodings
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextEncoding {
    /// Windows code page 949, decoded as WHATWG EUC-KR (its superset).
    #[serde(rename = "cp949", alias = "euc-kr")]
    Cp949,
    #[serde(rename = "utf-8", alias = "utf8")]
    Utf8,
}

/// Primary legacy code page first, then UTF-8.
pub const DEFAULT_ENCODINGS: [TextEncoding; 2] = [TextEncoding::Cp949, TextEncoding::Utf8];

impl TextEncoding {
    pub fn name(&self) -> &'static str {
        match self {
            TextEncoding::Cp949 => "cp949",
            TextEncoding::Utf8 => "utf-8",
        }
    }

    /// Strict decode: returns `None` on any malformed or unmapped sequence
    /// instead of substituting replacement characters.
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Option<Cow<'a, str>> {
        match self {
            TextEncoding::Cp949 => EUC_KR.decode_without_bom_handling_and_without_replacement(bytes),
            TextEncoding::Utf8 => {
                let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
                UTF_8.decode_without_bom_handling_and_without_replacement(bytes)
            }
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ============================================================================
// Loader Options
// ============================================================================

/// Source headers that map to the canonical `river` and `station` columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMapping {
    pub river: String,
    pub station: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        ColumnMapping {
            river: DEFAULT_RIVER_COLUMN.to_string(),
            station: DEFAULT_STATION_COLUMN.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoaderOptions {
    /// Tried in order until one decodes to a table with the mapped columns.
    pub encodings: Vec<TextEncoding>,
    pub columns: ColumnMapping,
    /// Upper bound on the HTTP request; unused for local files.
    pub timeout: Duration,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        LoaderOptions {
            encodings: DEFAULT_ENCODINGS.to_vec(),
            columns: ColumnMapping::default(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// A parsed table plus the encoding that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedTable {
    pub table: ObservationTable,
    pub encoding: TextEncoding,
}

// ============================================================================
// Loading
// ============================================================================

/// Fetch, decode, and parse the observation table.
pub fn load_table(source: &CsvSource, options: &LoaderOptions) -> Result<LoadedTable, DataError> {
    let resource = source.to_string();

    let loaded = fetch_bytes(source, options.timeout)
        .and_then(|bytes| decode_table(&bytes, &resource, source.data_source(), options));

    match &loaded {
        Ok(loaded) => logging::log_load_summary(
            source.data_source(),
            &resource,
            loaded.table.rows.len(),
            loaded.table.months.len(),
            loaded.encoding.name(),
        ),
        Err(err) => logging::log_load_failure(source.data_source(), &resource, "load_table", err),
    }

    loaded
}

/// Read the raw bytes of the resource.
///
/// HTTP sources get a single GET bounded by `timeout`, with no retry.
pub fn fetch_bytes(source: &CsvSource, timeout: Duration) -> Result<Vec<u8>, DataError> {
    match source {
        CsvSource::Path(path) => {
            std::fs::read(path).map_err(|e| DataError::ResourceUnavailable {
                resource: source.to_string(),
                reason: e.to_string(),
            })
        }
        CsvSource::Url(url) => fetch_url(url, timeout),
    }
}

fn fetch_url(url: &str, timeout: Duration) -> Result<Vec<u8>, DataError> {
    let unavailable = |reason: String| DataError::ResourceUnavailable {
        resource: url.to_string(),
        reason,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| unavailable(format!("HTTP client error: {}", e)))?;

    let response = client
        .get(url)
        .header("Accept", "text/csv, */*")
        .send()
        .map_err(|e| unavailable(format!("Request failed: {}", e)))?;

    if !response.status().is_success() {
        return Err(unavailable(format!("HTTP error: {}", response.status())));
    }

    let body = response
        .bytes()
        .map_err(|e| unavailable(format!("Failed to read response: {}", e)))?;

    Ok(body.to_vec())
}

/// Decode `bytes` with each configured encoding in turn and parse the first
/// result that carries the mapped identifier columns.
///
/// A legacy code page can "successfully" decode UTF-8 bytes into mojibake,
/// so a schema mismatch after decoding also moves on to the next encoding.
/// If every attempt fails, a schema mismatch (some text decoded) wins over
/// an encoding failure (nothing decoded).
pub fn decode_table(
    bytes: &[u8],
    resource: &str,
    origin: DataSource,
    options: &LoaderOptions,
) -> Result<LoadedTable, DataError> {
    let mut schema_error = None;

    for &encoding in &options.encodings {
        let Some(text) = encoding.decode(bytes) else {
            logging::debug(
                origin,
                Some(resource),
                &format!("not decodable as {}, trying next encoding", encoding),
            );
            continue;
        };

        match parse_table(&text, &options.columns, resource, origin) {
            Ok(table) => return Ok(LoadedTable { table, encoding }),
            Err(err @ DataError::SchemaMismatch { .. }) => {
                logging::debug(
                    origin,
                    Some(resource),
                    &format!("decoded as {} but {}", encoding, err),
                );
                schema_error = Some(err);
            }
            Err(err) => return Err(err),
        }
    }

    Err(schema_error.unwrap_or_else(|| DataError::EncodingFailure {
        resource: resource.to_string(),
        attempted: options.encodings.iter().map(|e| e.name()).collect(),
    }))
}

/// Parse decoded CSV text into an `ObservationTable`.
///
/// The header row must contain both mapped identifier columns. Headers of
/// the form `YYYY.MM` become the month axis (duplicates after the first are
/// ignored); every other column is an identifier and is dropped.
pub fn parse_table(
    text: &str,
    columns: &ColumnMapping,
    resource: &str,
    origin: DataSource,
) -> Result<ObservationTable, DataError> {
    let csv_error = |source: csv::Error| DataError::Csv {
        resource: resource.to_string(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader.headers().map_err(csv_error)?.clone();

    let find_column = |name: &str| {
        headers
            .iter()
            .position(|h| h == name.trim())
            .ok_or_else(|| DataError::SchemaMismatch {
                resource: resource.to_string(),
                column: name.to_string(),
            })
    };
    let river_idx = find_column(&columns.river)?;
    let station_idx = find_column(&columns.station)?;

    let mut months: Vec<YearMonth> = Vec::new();
    let mut month_columns: Vec<usize> = Vec::new();
    for (idx, header) in headers.iter().enumerate() {
        match YearMonth::parse_label(header) {
            Some(month) if !months.contains(&month) => {
                months.push(month);
                month_columns.push(idx);
            }
            Some(month) => logging::warn(
                origin,
                Some(resource),
                &format!("duplicate month column {} ignored", month),
            ),
            None => {}
        }
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }

        rows.push(ObservationRow {
            river: record.get(river_idx).unwrap_or_default().to_string(),
            station: record.get(station_idx).unwrap_or_default().to_string(),
            values: month_columns
                .iter()
                .map(|&idx| record.get(idx).and_then(parse_cell))
                .collect(),
        });
    }

    Ok(ObservationTable { months, rows })
}

/// Parse one value cell. Blank, placeholder (`-`, `NA`), and non-finite
/// cells are missing. Thousands separators are accepted.
fn parse_cell(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }
    let value: f64 = if cell.contains(',') {
        cell.replace(',', "").parse().ok()?
    } else {
        cell.parse().ok()?
    };
    value.is_finite().then_some(value)
}

// ============================================================================
// Tests
// ============================================================================
