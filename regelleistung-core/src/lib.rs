//! Regelleistung Core: German balancing-capacity tender data.
//!
//! This crate downloads the regelleistung.net tender reports and turns them
//! into polars tables:
//! - Domain types (product type, market, report, the four tender variants)
//! - Client configuration (base URL, timeout, DST policy) loadable from TOML
//! - Blocking HTTP transport behind a trait, so tests can swap in a mock
//! - xlsx parsing of the first worksheet into a DataFrame
//! - Range fetch that stacks days in order and fails on the first bad day
//! - Per-variant postprocessing that indexes rows by Europe/Berlin delivery hour

pub mod config;
pub mod data;
pub mod domain;

pub use config::{AmbiguousTimePolicy, ClientConfig};
pub use data::{DataError, MarketDataFetcher, Table};
pub use domain::{FetchRequest, FetcherConfig, Market, ProductType, QueryType, Variant};
