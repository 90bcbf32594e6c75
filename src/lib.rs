//! Water-quality monitoring service.
//!
//! Loads the city water-quality CSV (BOD/COD per river and station, one
//! column per month), reshapes it into per-river monthly series, grades the
//! latest values, and reports them with the station map.
//!
//! Modules:
//! - `model`     — shared types and the load error taxonomy
//! - `ingest`    — CSV fetch, encoding fallback, and parsing
//! - `analysis`  — reshaping and per-river aggregation
//! - `quality`   — BOD/COD grade thresholds
//! - `stations`  — compiled-in station coordinates
//! - `report`    — chart/map/metric report for one river
//! - `config`    — TOML configuration with env overrides
//! - `logging`   — structured logging setup and helpers

pub mod analysis;
pub mod config;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod quality;
pub mod report;
pub mod stations;
