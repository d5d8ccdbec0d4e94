//! Table wrappers returned by the fetcher, and day-by-day concatenation.

use super::provider::DataError;
use polars::prelude::*;

/// Parsed spreadsheet of one or more days, untouched.
pub type RawTable = DataFrame;

/// Name of the localized timestamp column that indexes a normalized table.
pub const INDEX_COLUMN: &str = "datetime";

/// Name of the column holding the hour parsed from the product name.
pub const HOUR_COLUMN: &str = "hour";

/// Raw table plus `hour` and a Europe/Berlin `datetime` index column.
///
/// The index column is always the first column; all original columns follow
/// in their original order, followed by `hour`.
#[derive(Debug, Clone)]
pub struct NormalizedTable {
    frame: DataFrame,
}

impl NormalizedTable {
    /// Wrap a frame whose first column is the zoned `datetime` index.
    pub(crate) fn new(frame: DataFrame) -> Result<Self, DataError> {
        match frame.get_columns().first() {
            Some(first)
                if first.name().as_str() == INDEX_COLUMN
                    && matches!(first.dtype(), DataType::Datetime(_, Some(_))) =>
            {
                Ok(Self { frame })
            }
            _ => Err(DataError::Parse(format!(
                "first column must be the zoned '{INDEX_COLUMN}' index"
            ))),
        }
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn into_frame(self) -> DataFrame {
        self.frame
    }

    /// The `datetime` index column.
    pub fn index(&self) -> &Column {
        // Checked in `new`.
        &self.frame.get_columns()[0]
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }
}

/// Result of a range fetch: postprocessed or not.
#[derive(Debug, Clone)]
pub enum Table {
    Raw(RawTable),
    Normalized(NormalizedTable),
}

impl Table {
    pub fn frame(&self) -> &DataFrame {
        match self {
            Table::Raw(frame) => frame,
            Table::Normalized(table) => table.frame(),
        }
    }

    pub fn into_frame(self) -> DataFrame {
        match self {
            Table::Raw(frame) => frame,
            Table::Normalized(table) => table.into_frame(),
        }
    }

    pub fn height(&self) -> usize {
        self.frame().height()
    }

    pub fn is_normalized(&self) -> bool {
        matches!(self, Table::Normalized(_))
    }
}

/// Stack per-day tables in order.
///
/// Columns are matched by name. A column missing from some day is null for
/// that day's rows; columns whose type differs between days are widened to
/// a common supertype.
pub fn concat_tables(mut tables: Vec<DataFrame>) -> Result<DataFrame, DataError> {
    match tables.len() {
        0 => Err(DataError::EmptyDateRange),
        1 => Ok(tables.swap_remove(0)),
        _ => {
            let frames: Vec<LazyFrame> = tables.into_iter().map(|df| df.lazy()).collect();
            let args = UnionArgs {
                rechunk: true,
                to_supertypes: true,
                ..Default::default()
            };
            Ok(concat_lf_diagonal(frames, args)?.collect()?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(names: &[&str], dates: &[&str]) -> DataFrame {
        df!(
            "PRODUCTNAME" => names,
            "DATE_FROM" => dates,
        )
        .unwrap()
    }

    #[test]
    fn concat_preserves_day_order() {
        let a = day(&["NEGPOS_00_04", "NEGPOS_04_08"], &["2024-01-01", "2024-01-01"]);
        let b = day(&["NEGPOS_00_04"], &["2024-01-02"]);
        let out = concat_tables(vec![a, b]).unwrap();
        assert_eq!(out.height(), 3);
        let dates: Vec<Option<&str>> = out
            .column("DATE_FROM")
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(
            dates,
            vec![Some("2024-01-01"), Some("2024-01-01"), Some("2024-01-02")]
        );
    }

    #[test]
    fn concat_null_fills_missing_columns() {
        let a = day(&["NEGPOS_00_04"], &["2024-01-01"]);
        let b = df!(
            "PRODUCTNAME" => &["NEGPOS_00_04"],
            "DATE_FROM" => &["2024-01-02"],
            "NOTE" => &["late"],
        )
        .unwrap();
        let out = concat_tables(vec![a, b]).unwrap();
        assert_eq!(out.width(), 3);
        assert_eq!(out.column("NOTE").unwrap().null_count(), 1);
    }

    #[test]
    fn concat_widens_int_and_float() {
        let a = df!("PRICE" => &[1i64, 2]).unwrap();
        let b = df!("PRICE" => &[2.5f64]).unwrap();
        let out = concat_tables(vec![a, b]).unwrap();
        assert_eq!(out.column("PRICE").unwrap().dtype(), &DataType::Float64);
    }

    #[test]
    fn concat_of_nothing_is_an_error() {
        assert!(matches!(
            concat_tables(Vec::new()),
            Err(DataError::EmptyDateRange)
        ));
    }

    #[test]
    fn normalized_table_requires_zoned_index() {
        let frame = df!("datetime" => &[1i64]).unwrap();
        assert!(NormalizedTable::new(frame).is_err());
    }
}
