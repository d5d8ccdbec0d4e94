//! Download, parsing and normalization of tender reports

pub mod fetcher;
pub mod http;
pub mod postprocess;
pub mod provider;
pub mod table;
pub mod workbook;

pub use fetcher::{dates_between, fetch_single_day, fetch_single_day_as_of, MarketDataFetcher};
pub use http::ReqwestTransport;
pub use postprocess::{extract_hour, localize_berlin, Postprocess, DATE_FROM_COLUMN};
pub use provider::{DataError, HttpResponse, HttpTransport};
pub use table::{concat_tables, NormalizedTable, RawTable, Table, HOUR_COLUMN, INDEX_COLUMN};
pub use workbook::parse_xlsx;
