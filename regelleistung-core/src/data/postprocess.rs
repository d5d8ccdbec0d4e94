//! Per-variant postprocessing: hour extraction and Berlin-time indexing.
//!
//! Product names follow `<prefix>_<hour>_...` (e.g. `NEGPOS_04_08` or
//! `CAPACITY_4_FCR`). The second segment is the delivery hour; together with
//! the calendar date of `DATE_FROM` it gives the local wall-clock start of the
//! product, which is localized to Europe/Berlin.

use super::provider::DataError;
use super::table::{NormalizedTable, RawTable, HOUR_COLUMN, INDEX_COLUMN};
use crate::config::AmbiguousTimePolicy;
use crate::domain::{FetcherConfig, Market, ProductType, QueryType};
use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Europe::Berlin;
use chrono_tz::Tz;
use polars::prelude::*;

/// Column carrying the delivery day in both reports.
pub const DATE_FROM_COLUMN: &str = "DATE_FROM";

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Postprocessing strategy, chosen once per fetcher config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Postprocess {
    /// Split the hour out of `product_column` and index rows by Berlin time.
    HourFromColumn { product_column: &'static str },
    /// No transform defined for this report; always fails.
    Unimplemented,
}

impl Postprocess {
    /// Strategy table keyed by product, market and report.
    pub fn for_config(config: &FetcherConfig) -> Self {
        match (config.product_type, config.market, config.query_type) {
            (ProductType::Fcr, Market::Capacity, QueryType::AuctionResults) => {
                Postprocess::HourFromColumn {
                    product_column: "PRODUCTNAME",
                }
            }
            (ProductType::Fcr, Market::Capacity, QueryType::ListAnonymousBids) => {
                Postprocess::HourFromColumn {
                    product_column: "PRODUCT",
                }
            }
            _ => Postprocess::Unimplemented,
        }
    }

    pub fn is_implemented(&self) -> bool {
        !matches!(self, Postprocess::Unimplemented)
    }

    /// Run the transform. `config` only labels the `NotImplemented` error.
    pub fn apply(
        &self,
        raw: RawTable,
        config: &FetcherConfig,
        policy: AmbiguousTimePolicy,
    ) -> Result<NormalizedTable, DataError> {
        match self {
            Postprocess::HourFromColumn { product_column } => {
                index_by_berlin_hour(raw, product_column, policy)
            }
            Postprocess::Unimplemented => Err(DataError::NotImplemented {
                variant: config.to_string(),
            }),
        }
    }
}

/// Second `_`-separated segment of a product name.
pub fn extract_hour(product_name: &str) -> Option<&str> {
    product_name.split('_').nth(1)
}

/// Localize a wall-clock delivery start to Europe/Berlin.
pub fn localize_berlin(
    local: NaiveDateTime,
    policy: AmbiguousTimePolicy,
) -> Result<DateTime<Tz>, DataError> {
    match Berlin.from_local_datetime(&local) {
        LocalResult::Single(dt) => Ok(dt),
        LocalResult::Ambiguous(earliest, latest) => match policy {
            AmbiguousTimePolicy::Earliest => Ok(earliest),
            AmbiguousTimePolicy::Latest => Ok(latest),
            AmbiguousTimePolicy::Reject => Err(DataError::Parse(format!(
                "{local} is ambiguous in Europe/Berlin (DST ends)"
            ))),
        },
        LocalResult::None => Err(DataError::Parse(format!(
            "{local} does not exist in Europe/Berlin (DST starts)"
        ))),
    }
}

fn index_by_berlin_hour(
    mut frame: DataFrame,
    product_column: &str,
    policy: AmbiguousTimePolicy,
) -> Result<NormalizedTable, DataError> {
    let hours = hour_values(&frame, product_column)?;
    let dates = date_values(&frame, DATE_FROM_COLUMN)?;

    let mut millis = Vec::with_capacity(hours.len());
    for ((date, hour), row) in dates.iter().zip(&hours).zip(1usize..) {
        let local = wall_clock(*date, hour).ok_or_else(|| {
            DataError::Parse(format!(
                "column '{product_column}', row {row}: '{hour}' is not an hour of the day"
            ))
        })?;
        millis.push(localize_berlin(local, policy)?.timestamp_millis());
    }

    let index = Int64Chunked::from_vec(INDEX_COLUMN.into(), millis)
        .into_datetime(TimeUnit::Milliseconds, Some(Berlin.name().into()));

    frame.with_column(Column::new(HOUR_COLUMN.into(), hours))?;
    frame.with_column(index.into_column())?;

    let order: Vec<PlSmallStr> = std::iter::once(PlSmallStr::from(INDEX_COLUMN))
        .chain(
            frame
                .get_column_names()
                .into_iter()
                .filter(|name| name.as_str() != INDEX_COLUMN)
                .cloned(),
        )
        .collect();

    NormalizedTable::new(frame.select(order)?)
}

/// `{date} {hour}:00:00` as a naive timestamp.
fn wall_clock(date: NaiveDate, hour: &str) -> Option<NaiveDateTime> {
    let hour: u32 = hour.trim().parse().ok()?;
    date.and_hms_opt(hour, 0, 0)
}

fn missing_column(name: &str) -> DataError {
    DataError::Parse(format!("missing column '{name}'"))
}

// Row numbers in messages count data rows from 1, as in the sheet below its header.

fn hour_values(frame: &DataFrame, name: &str) -> Result<Vec<String>, DataError> {
    let column = frame
        .column(name)
        .map_err(|_| missing_column(name))?
        .cast(&DataType::String)?;

    column
        .str()?
        .into_iter()
        .zip(1usize..)
        .map(|(value, row)| {
            let value = value.ok_or_else(|| {
                DataError::Parse(format!("column '{name}', row {row}: empty product name"))
            })?;
            extract_hour(value).map(str::to_string).ok_or_else(|| {
                DataError::Parse(format!(
                    "column '{name}', row {row}: '{value}' has no '_'-separated hour"
                ))
            })
        })
        .collect()
}

/// Calendar dates of a date-like column (Date, Datetime or `YYYY-MM-DD...` text).
///
/// Zoned datetimes give the date in their own zone; naive ones are taken as
/// wall-clock values.
fn date_values(frame: &DataFrame, name: &str) -> Result<Vec<NaiveDate>, DataError> {
    let column = frame.column(name).map_err(|_| missing_column(name))?;
    let null_at = |row: usize| DataError::Parse(format!("column '{name}', row {row}: empty date"));

    match column.dtype() {
        DataType::Datetime(unit, zone) => {
            let unit = *unit;
            let zone: Option<Tz> = zone
                .as_ref()
                .map(|tz| {
                    tz.parse::<Tz>().map_err(|e| {
                        DataError::Parse(format!("column '{name}': time zone '{tz}': {e}"))
                    })
                })
                .transpose()?;
            let raw = column.cast(&DataType::Int64)?;
            raw.i64()?
                .into_iter()
                .zip(1usize..)
                .map(|(value, row)| {
                    let value = value.ok_or_else(|| null_at(row))?;
                    let utc = epoch_to_utc(value, unit).ok_or_else(|| {
                        DataError::Parse(format!(
                            "column '{name}', row {row}: timestamp {value} out of range"
                        ))
                    })?;
                    Ok(match zone {
                        Some(tz) => utc.with_timezone(&tz).date_naive(),
                        None => utc.date_naive(),
                    })
                })
                .collect()
        }
        DataType::Date => {
            let raw = column.cast(&DataType::Int32)?;
            raw.i32()?
                .into_iter()
                .zip(1usize..)
                .map(|(days, row)| {
                    let days = days.ok_or_else(|| null_at(row))?;
                    epoch_to_utc(days as i64 * MILLIS_PER_DAY, TimeUnit::Milliseconds)
                        .map(|dt| dt.date_naive())
                        .ok_or_else(|| {
                            DataError::Parse(format!(
                                "column '{name}', row {row}: day {days} out of range"
                            ))
                        })
                })
                .collect()
        }
        DataType::String => column
            .str()?
            .into_iter()
            .zip(1usize..)
            .map(|(value, row)| {
                let value = value.ok_or_else(|| null_at(row))?.trim();
                let day = value.get(..10).unwrap_or(value);
                NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|e| {
                    DataError::Parse(format!("column '{name}', row {row}: '{value}': {e}"))
                })
            })
            .collect(),
        DataType::Null if column.len() == 0 => Ok(Vec::new()),
        other => Err(DataError::Parse(format!(
            "column '{name}' has type {other}, expected a date"
        ))),
    }
}

fn epoch_to_utc(value: i64, unit: TimeUnit) -> Option<DateTime<Utc>> {
    match unit {
        TimeUnit::Milliseconds => DateTime::from_timestamp_millis(value),
        TimeUnit::Microseconds => DateTime::from_timestamp_micros(value),
        TimeUnit::Nanoseconds => Some(DateTime::from_timestamp_nanos(value)),
    }
}
