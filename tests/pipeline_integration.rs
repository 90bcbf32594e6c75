/// End-to-end tests for the load → reshape → aggregate → grade → report
/// pipeline, run against CSV files written to a temporary directory.
///
/// These tests need no network access; HTTP sources are served from a
/// loopback listener on 127.0.0.1.

use encoding_rs::EUC_KR;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

use wqmon_service::analysis::aggregate::{self, LatestValue, LatestValuePolicy};
use wqmon_service::analysis::reshape::{self, ParityAssignment, SplitStrategy};
use wqmon_service::config::parse_config;
use wqmon_service::ingest::csv_source::{self, CsvSource, LoaderOptions, TextEncoding};
use wqmon_service::model::{DataError, Metric};
use wqmon_service::quality::thresholds::{self, Grade};
use wqmon_service::report::{self, MapSection};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

const CITY_CSV: &str = "\
구분(1),구분(2),구분(3),구분(4),2025.03,2025.04
한강,서울,본류,한강대교,1.2,2.0
한강,서울,본류,잠실,6.0,9.5
공촌천,인천,지류,공촌천,0.9,1.8
";

fn write_file(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).expect("create temp CSV");
    file.write_all(bytes).expect("write temp CSV");
    path
}

/// Bind a loopback port and hand each accepted connection, with its request
/// already read, to `respond`. Returns the URL of the CSV on that port.
fn serve_once<F>(respond: F) -> String
where
    F: FnOnce(TcpStream) + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback port");
    let url = format!("http://{}/water.csv", listener.local_addr().unwrap());
    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }
            respond(stream);
        }
    });
    url
}

fn http_response(status: &str, body: &[u8]) -> Vec<u8> {
    let mut response = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/csv\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        body.len()
    )
    .into_bytes();
    response.extend_from_slice(body);
    response
}

fn load(path: PathBuf) -> csv_source::LoadedTable {
    csv_source::load_table(&CsvSource::Path(path), &LoaderOptions::default())
        .expect("fixture should load")
}

// ---------------------------------------------------------------------------
// Loader
// ---------------------------------------------------------------------------

#[test]
fn test_cp949_and_utf8_files_load_to_the_same_table() {
    let dir = TempDir::new().unwrap();
    let (cp949, _, had_errors) = EUC_KR.encode(CITY_CSV);
    assert!(!had_errors, "fixture must be representable in cp949");

    let legacy = load(write_file(&dir, "legacy.csv", &cp949));
    let modern = load(write_file(&dir, "modern.csv", CITY_CSV.as_bytes()));

    assert_eq!(legacy.encoding, TextEncoding::Cp949);
    assert_eq!(modern.encoding, TextEncoding::Utf8);
    assert_eq!(legacy.table, modern.table);
    assert_eq!(modern.table.rivers(), vec!["한강", "공촌천"]);
}

#[test]
fn test_file_without_station_column_fails_loudly() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        &dir,
        "renamed.csv",
        "구분(1),관측소,2025.03\n한강,잠실,1.0\n".as_bytes(),
    );

    let err = csv_source::load_table(&CsvSource::Path(path), &LoaderOptions::default())
        .expect_err("a missing identifier column must not load");
    assert!(matches!(err, DataError::SchemaMismatch { ref column, .. } if column == "구분(4)"));
}

#[test]
fn test_missing_file_is_resource_unavailable() {
    let dir = TempDir::new().unwrap();
    let source = CsvSource::Path(dir.path().join("absent.csv"));
    let err = csv_source::load_table(&source, &LoaderOptions::default()).unwrap_err();
    assert!(matches!(err, DataError::ResourceUnavailable { .. }));
}

// ---------------------------------------------------------------------------
// HTTP sources
// ---------------------------------------------------------------------------

#[test]
fn test_http_source_loads_cp949_body() {
    let (cp949, _, _) = EUC_KR.encode(CITY_CSV);
    let response = http_response("200 OK", &cp949);
    let url = serve_once(move |mut stream| {
        let _ = stream.write_all(&response);
    });

    let source = CsvSource::parse(&url);
    let loaded = csv_source::load_table(&source, &LoaderOptions::default())
        .expect("served CSV should load");
    assert_eq!(loaded.encoding, TextEncoding::Cp949);
    assert_eq!(loaded.table.rivers(), vec!["한강", "공촌천"]);
}

#[test]
fn test_http_error_status_is_resource_unavailable() {
    let response = http_response("404 Not Found", b"");
    let url = serve_once(move |mut stream| {
        let _ = stream.write_all(&response);
    });

    let err = csv_source::load_table(&CsvSource::parse(&url), &LoaderOptions::default())
        .expect_err("a 404 must not load");
    match err {
        DataError::ResourceUnavailable { resource, reason } => {
            assert_eq!(resource, url);
            assert!(reason.contains("404"), "reason was: {}", reason);
        }
        other => panic!("expected ResourceUnavailable, got {:?}", other),
    }
}

#[test]
fn test_stalled_server_is_bounded_by_timeout() {
    let url = serve_once(|stream| {
        // Hold the connection open without answering.
        thread::sleep(Duration::from_secs(5));
        drop(stream);
    });
    let options = LoaderOptions {
        timeout: Duration::from_millis(200),
        ..LoaderOptions::default()
    };

    let started = Instant::now();
    let err = csv_source::load_table(&CsvSource::parse(&url), &options)
        .expect_err("a silent server must not load");
    let elapsed = started.elapsed();

    assert!(matches!(err, DataError::ResourceUnavailable { .. }), "got {:?}", err);
    assert!(elapsed < Duration::from_secs(3), "request took {:?}", elapsed);
}

// ---------------------------------------------------------------------------
// Reshape + aggregate
// ---------------------------------------------------------------------------

#[test]
fn test_transpose_keeps_every_month_label() {
    let dir = TempDir::new().unwrap();
    let loaded = load(write_file(&dir, "city.csv", CITY_CSV.as_bytes()));

    let series = reshape::transpose(&loaded.table);
    assert_eq!(series.len(), 3);
    for s in &series {
        let labels: Vec<String> = s.points.iter().map(|p| p.month.label()).collect();
        assert_eq!(labels, vec!["2025.03", "2025.04"]);
    }
}

#[test]
fn test_han_river_end_to_end() {
    let dir = TempDir::new().unwrap();
    let loaded = load(write_file(&dir, "city.csv", CITY_CSV.as_bytes()));

    let summary = aggregate::summarize_river(
        &loaded.table,
        "한강",
        SplitStrategy::Parity(ParityAssignment::BodOnEven),
        LatestValuePolicy::NoData,
    );

    // Station average per month: BOD from 2025.03, COD from 2025.04
    assert_eq!(summary.bod.len(), 1);
    let bod = summary.bod.points[0].value.expect("BOD average");
    assert!((bod - 3.6).abs() < 1e-9, "BOD average was {}", bod);
    let cod = summary.latest_cod.value().expect("COD average");
    assert!((cod - 5.75).abs() < 1e-9, "COD average was {}", cod);

    assert_eq!(thresholds::classify(bod, Metric::Bod).0, Grade::Fair);
    assert_eq!(thresholds::classify(cod, Metric::Cod).0, Grade::Fair);
    // The worst single station reading is grade V on its own.
    assert_eq!(thresholds::classify(9.5, Metric::Cod).0, Grade::VeryPoor);

    let report = report::build_report(&summary, chrono::Utc::now());
    assert!(report.has_data);
    assert!(matches!(report.map, MapSection::Available(ref points) if points.len() == 3));
    assert_eq!(report.chart.len(), 2);
}

#[test]
fn test_unlisted_river_renders_placeholder() {
    let dir = TempDir::new().unwrap();
    let loaded = load(write_file(&dir, "city.csv", CITY_CSV.as_bytes()));

    let summary = aggregate::summarize_river(
        &loaded.table,
        "낙동강",
        SplitStrategy::default(),
        LatestValuePolicy::Zero,
    );
    assert!(summary.bod.is_empty());
    assert_eq!(summary.latest_bod, LatestValue::Defaulted(0.0));

    let report = report::build_report(&summary, chrono::Utc::now());
    assert!(!report.has_data);
    assert_eq!(report.map, MapSection::Unavailable);
}

// ---------------------------------------------------------------------------
// Configured pipeline
// ---------------------------------------------------------------------------

#[test]
fn test_config_driven_positional_pair() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "city.csv", CITY_CSV.as_bytes());
    let toml = format!(
        "[source]\nlocation = \"{}\"\n\n[reshape]\nstrategy = \"positional_pair\"\nmonth = \"2025.03\"\n",
        path.display().to_string().replace('\\', "\\\\")
    );
    let config = parse_config(&toml, "wqmon.toml").expect("config should parse");

    let loaded = csv_source::load_table(&config.csv_source(), &config.loader_options()).unwrap();
    let summary = aggregate::summarize_river(
        &loaded.table,
        "한강",
        config.split_strategy().unwrap(),
        config.display.latest_value,
    );

    // First two numeric cells of 한강 in 2025.03: 한강대교 then 잠실
    assert_eq!(summary.latest_bod, LatestValue::Measured(1.2));
    assert_eq!(summary.latest_cod, LatestValue::Measured(6.0));
}
