//! Typed access to the sales table.
//!
//! The table is a Polars [`DataFrame`]. Stages never index columns directly;
//! they go through the helpers here, which handle absent columns, lenient
//! numeric casts and the handful of date layouts spreadsheet exports produce.

use crate::error::Result;
use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;

/// Column names the pipeline knows about.
pub mod columns {
    pub const ORDER_ID: &str = "Order ID";
    pub const ORDER_DATE: &str = "Order Date";
    pub const SALES: &str = "Sales";
    pub const PROFIT: &str = "Profit";
    pub const DISCOUNT: &str = "Discount";
    pub const QUANTITY: &str = "Quantity";
    pub const REGION: &str = "Region";
    pub const CATEGORY: &str = "Category";
    pub const SUB_CATEGORY: &str = "Sub-Category";

    pub const YEAR: &str = "Year";
    pub const MONTH: &str = "Month";
    pub const QUARTER: &str = "Quarter";
    pub const DAY_OF_WEEK: &str = "Day of Week";
    pub const MONTH_NAME: &str = "Month Name";
    pub const PROFIT_MARGIN: &str = "Profit Margin";
    pub const DISCOUNT_BAND: &str = "Discount Band";
    pub const SALES_TIER: &str = "Sales Tier";
}

/// Days between 0001-01-01 (CE day 1) and the Unix epoch.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%m-%d-%Y", "%Y/%m/%d", "%d.%m.%Y"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
];

pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_index(name).is_some()
}

pub fn has_columns(df: &DataFrame, names: &[&str]) -> bool {
    names.iter().all(|name| has_column(df, name))
}

/// Numeric values of a column as `f64`. Cells that do not cast become `None`.
pub fn f64_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let series = df.column(name)?.as_materialized_series();
    let casted = series.cast(&DataType::Float64)?;
    Ok(casted.f64()?.into_iter().collect())
}

/// Values of a column rendered as strings, nulls preserved.
pub fn string_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let series = df.column(name)?.as_materialized_series();
    let casted = series.cast(&DataType::String)?;
    Ok(casted
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_owned))
        .collect())
}

pub fn is_date_column(df: &DataFrame, name: &str) -> bool {
    df.column(name)
        .is_ok_and(|c| matches!(c.dtype(), DataType::Date))
}

/// Per-row dates of a column.
///
/// `Date` and `Datetime` columns convert directly. String columns are parsed
/// with [`parse_date`]; the second element counts non-null cells that failed.
pub fn date_values(df: &DataFrame, name: &str) -> Result<(Vec<Option<NaiveDate>>, usize)> {
    let series = df.column(name)?.as_materialized_series();

    match series.dtype() {
        DataType::Date | DataType::Datetime(_, _) => {
            let days = series.cast(&DataType::Date)?.cast(&DataType::Int32)?;
            let dates = days
                .i32()?
                .into_iter()
                .map(|d| d.and_then(days_to_date))
                .collect();
            Ok((dates, 0))
        }
        _ => {
            let mut failures = 0;
            let dates = string_values(df, name)?
                .into_iter()
                .map(|cell| {
                    let raw = cell?;
                    let trimmed = raw.trim();
                    if trimmed.is_empty() {
                        return None;
                    }
                    let parsed = parse_date(trimmed);
                    if parsed.is_none() {
                        failures += 1;
                    }
                    parsed
                })
                .collect();
            Ok((dates, failures))
        }
    }
}

/// Parses a date in any of the supported layouts; time-of-day is dropped.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
}

fn days_to_date(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)?)
}

fn date_to_days(date: NaiveDate) -> i32 {
    chrono::Datelike::num_days_from_ce(&date) - UNIX_EPOCH_DAYS_FROM_CE
}

/// Builds a Polars `Date` series from chrono dates.
pub fn date_series(name: &str, dates: &[Option<NaiveDate>]) -> Result<Series> {
    let days: Vec<Option<i32>> = dates.iter().map(|d| d.map(date_to_days)).collect();
    Ok(Series::new(name.into(), days).cast(&DataType::Date)?)
}

/// Linear-interpolated percentile over the non-null values of a column.
pub fn percentile(df: &DataFrame, name: &str, q: f64) -> Result<Option<f64>> {
    let series = df.column(name)?.as_materialized_series();
    let casted = series.cast(&DataType::Float64)?;
    Ok(casted.f64()?.quantile(q, QuantileMethod::Linear)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_layouts() {
        let expected = NaiveDate::from_ymd_opt(2016, 11, 8);
        assert_eq!(parse_date("2016-11-08"), expected);
        assert_eq!(parse_date("11/8/2016"), expected);
        assert_eq!(parse_date("11/08/2016"), expected);
        assert_eq!(parse_date("2016-11-08 13:45:00"), expected);
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date("2016-13-40"), None);
    }

    #[test]
    fn test_date_series_round_trip() -> Result<()> {
        let dates = vec![NaiveDate::from_ymd_opt(2017, 1, 2), None];
        let series = date_series(columns::ORDER_DATE, &dates)?;
        let df = DataFrame::new(vec![Column::from(series)])?;

        assert!(is_date_column(&df, columns::ORDER_DATE));
        let (back, failures) = date_values(&df, columns::ORDER_DATE)?;
        assert_eq!(back, dates);
        assert_eq!(failures, 0);
        Ok(())
    }

    #[test]
    fn test_date_values_counts_failures() -> Result<()> {
        let df = df!(columns::ORDER_DATE => [Some("2016-11-08"), Some("bad"), None])?;
        let (dates, failures) = date_values(&df, columns::ORDER_DATE)?;
        assert_eq!(failures, 1);
        assert!(dates.first().is_some_and(Option::is_some));
        assert_eq!(dates.get(2), Some(&None));
        Ok(())
    }

    #[test]
    fn test_f64_values_lenient_cast() -> Result<()> {
        let df = df!("Sales" => ["10.5", "oops", "3"])?;
        assert_eq!(
            f64_values(&df, "Sales")?,
            vec![Some(10.5), None, Some(3.0)]
        );
        Ok(())
    }

    #[test]
    fn test_percentile_matches_linear_interpolation() -> Result<()> {
        let df = df!("Sales" => [1.0, 2.0, 3.0, 4.0])?;
        let p = percentile(&df, "Sales", 0.5)?.unwrap_or_default();
        assert!((p - 2.5).abs() < 1e-9);

        let q = percentile(&df, "Sales", 0.33)?.unwrap_or_default();
        assert!((q - 1.99).abs() < 1e-9);

        let empty = df!("Sales" => Vec::<Option<f64>>::new())?;
        assert_eq!(percentile(&empty, "Sales", 0.5)?, None);
        Ok(())
    }

    #[test]
    fn test_has_columns() -> Result<()> {
        let df = df!("Sales" => [1.0], "Profit" => [0.5])?;
        assert!(has_columns(&df, &["Sales", "Profit"]));
        assert!(!has_columns(&df, &["Sales", "Region"]));
        assert!(has_columns(&df, &[]));
        Ok(())
    }
}
