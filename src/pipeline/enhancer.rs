//! Derived columns: time parts, profit margin and categorical bins.
//!
//! Every enhancement writes one new column and never replaces an existing
//! one, so running the enhancer again is a no-op. The only in-place change
//! is converting `Order Date` text to a `Date` column.

use super::rules::{self, ColumnGated};
use crate::error::Result;
use crate::table::{self, columns};
use chrono::{Datelike as _, NaiveDate, Weekday};
use polars::prelude::*;
use serde::Serialize;
use std::fmt;

/// Fixed discount buckets: `[0, 0.15]`, `(0.15, 0.31]`, `(0.31, 0.5]`, `(0.5, 1.0]`.
///
/// Discounts are assumed to be fractions. Percentage-scaled input falls
/// outside every bucket and stays unbanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum DiscountBand {
    UpTo15,
    From16To31,
    From32To50,
    Over50,
}

impl DiscountBand {
    pub const ALL: [Self; 4] = [Self::UpTo15, Self::From16To31, Self::From32To50, Self::Over50];

    pub fn classify(discount: f64) -> Option<Self> {
        if !(0.0..=1.0).contains(&discount) {
            None
        } else if discount <= 0.15 {
            Some(Self::UpTo15)
        } else if discount <= 0.31 {
            Some(Self::From16To31)
        } else if discount <= 0.5 {
            Some(Self::From32To50)
        } else {
            Some(Self::Over50)
        }
    }

    /// Position in [`Self::ALL`], lowest discounts first.
    pub fn rank(self) -> u32 {
        self as u32
    }

    pub fn from_rank(rank: u32) -> Option<Self> {
        Self::ALL.get(rank as usize).copied()
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::UpTo15 => "0-15%",
            Self::From16To31 => "16-31%",
            Self::From32To50 => "32-50%",
            Self::Over50 => "50%+",
        }
    }
}

impl fmt::Display for DiscountBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum SalesTier {
    Low,
    Medium,
    High,
}

impl SalesTier {
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

/// Sales tier edges: `[0, p33]`, `(p33, p67]`, `(p67, max]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierBoundaries {
    pub low_max: f64,
    pub medium_max: f64,
    pub max: f64,
}

impl TierBoundaries {
    /// Computes the 33rd/67th percentiles and maximum of `Sales`.
    pub fn from_sales(df: &DataFrame) -> Result<Option<Self>> {
        let low_max = table::percentile(df, columns::SALES, 0.33)?;
        let medium_max = table::percentile(df, columns::SALES, 0.67)?;
        let max = table::percentile(df, columns::SALES, 1.0)?;

        Ok(match (low_max, medium_max, max) {
            (Some(low_max), Some(medium_max), Some(max)) => Some(Self {
                low_max,
                medium_max,
                max,
            }),
            _ => None,
        })
    }

    pub fn classify(&self, sales: f64) -> Option<SalesTier> {
        if sales < 0.0 || sales > self.max {
            None
        } else if sales <= self.low_max {
            Some(SalesTier::Low)
        } else if sales <= self.medium_max {
            Some(SalesTier::Medium)
        } else {
            Some(SalesTier::High)
        }
    }
}

/// Profit as a percentage of sales, rounded to 2 decimals.
///
/// Zero sales with non-zero profit yields 0 rather than infinity; 0/0 has
/// no margin at all.
pub fn profit_margin(sales: f64, profit: f64) -> Option<f64> {
    let margin = profit / sales * 100.0;
    if margin.is_nan() {
        None
    } else if margin.is_infinite() {
        Some(0.0)
    } else {
        Some((margin * 100.0).round() / 100.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EnhancementStatus {
    Added,
    /// An existing column was rewritten in place; no column was added.
    Converted,
    AlreadyPresent,
    SourceMissing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnhancementOutcome {
    pub name: String,
    pub status: EnhancementStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnhancementReport {
    pub outcomes: Vec<EnhancementOutcome>,
}

impl EnhancementReport {
    /// Names of the enhancements this run actually added.
    pub fn added(&self) -> Vec<&str> {
        self.with_status(EnhancementStatus::Added)
    }

    /// Existing columns whose type was changed in place.
    pub fn converted(&self) -> Vec<&str> {
        self.with_status(EnhancementStatus::Converted)
    }

    pub fn already_present(&self) -> Vec<&str> {
        self.with_status(EnhancementStatus::AlreadyPresent)
    }

    fn with_status(&self, status: EnhancementStatus) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| o.status == status)
            .map(|o| o.name.as_str())
            .collect()
    }

    fn push(&mut self, name: &str, status: EnhancementStatus) {
        self.outcomes.push(EnhancementOutcome {
            name: name.to_owned(),
            status,
        });
    }
}

type DeriveFn = fn(&DataFrame) -> Result<Series>;

struct EnhancementRule {
    name: &'static str,
    target: &'static str,
    required: &'static [&'static str],
    derive: DeriveFn,
}

impl ColumnGated for EnhancementRule {
    fn name(&self) -> &str {
        self.name
    }

    fn required_columns(&self) -> &[&'static str] {
        self.required
    }
}

const ORDER_DATE_PARSED: &str = "Order Date (parsed)";

const ENHANCEMENTS: [EnhancementRule; 8] = [
    EnhancementRule {
        name: columns::YEAR,
        target: columns::YEAR,
        required: &[columns::ORDER_DATE],
        derive: derive_year,
    },
    EnhancementRule {
        name: columns::MONTH,
        target: columns::MONTH,
        required: &[columns::ORDER_DATE],
        derive: derive_month,
    },
    EnhancementRule {
        name: columns::QUARTER,
        target: columns::QUARTER,
        required: &[columns::ORDER_DATE],
        derive: derive_quarter,
    },
    EnhancementRule {
        name: columns::DAY_OF_WEEK,
        target: columns::DAY_OF_WEEK,
        required: &[columns::ORDER_DATE],
        derive: derive_day_of_week,
    },
    EnhancementRule {
        name: columns::MONTH_NAME,
        target: columns::MONTH_NAME,
        required: &[columns::ORDER_DATE],
        derive: derive_month_name,
    },
    EnhancementRule {
        name: "Profit Margin (%)",
        target: columns::PROFIT_MARGIN,
        required: &[columns::SALES, columns::PROFIT],
        derive: derive_profit_margin,
    },
    EnhancementRule {
        name: columns::DISCOUNT_BAND,
        target: columns::DISCOUNT_BAND,
        required: &[columns::DISCOUNT],
        derive: derive_discount_band,
    },
    EnhancementRule {
        name: columns::SALES_TIER,
        target: columns::SALES_TIER,
        required: &[columns::SALES],
        derive: derive_sales_tier,
    },
];

/// Adds every missing derived column to `df`.
///
/// # Errors
///
/// Returns an error if a derived column cannot be built or attached.
pub fn enhance(df: &mut DataFrame) -> Result<EnhancementReport> {
    tracing::info!("Enhancing data with calculated fields");
    let mut report = EnhancementReport::default();

    if table::has_column(df, columns::ORDER_DATE) {
        if table::is_date_column(df, columns::ORDER_DATE) {
            report.push(ORDER_DATE_PARSED, EnhancementStatus::AlreadyPresent);
        } else {
            let (dates, failures) = table::date_values(df, columns::ORDER_DATE)?;
            if failures > 0 {
                tracing::warn!("{failures} order dates could not be parsed and are left empty");
            }
            df.with_column(table::date_series(columns::ORDER_DATE, &dates)?)?;
            tracing::info!("Converted {} to dates", columns::ORDER_DATE);
            report.push(ORDER_DATE_PARSED, EnhancementStatus::Converted);
        }
    }

    let applicable = rules::applicable(&ENHANCEMENTS, df);
    for rule in &ENHANCEMENTS {
        if !applicable.iter().any(|r| r.target == rule.target) {
            report.push(rule.name, EnhancementStatus::SourceMissing);
        } else if table::has_column(df, rule.target) {
            report.push(rule.name, EnhancementStatus::AlreadyPresent);
        } else {
            let series = (rule.derive)(df)?;
            df.with_column(series)?;
            report.push(rule.name, EnhancementStatus::Added);
        }
    }

    let added = report.added();
    if added.is_empty() {
        tracing::info!("All enhancements already present in data");
    } else {
        tracing::info!("Added {} enhancement(s)", added.len());
        for name in &added {
            tracing::info!("  • {name}");
        }
    }

    Ok(report)
}

fn order_dates(df: &DataFrame) -> Result<Vec<Option<NaiveDate>>> {
    Ok(table::date_values(df, columns::ORDER_DATE)?.0)
}

fn derive_year(df: &DataFrame) -> Result<Series> {
    let values: Vec<Option<i32>> = order_dates(df)?
        .into_iter()
        .map(|d| d.map(|d| d.year()))
        .collect();
    Ok(Series::new(columns::YEAR.into(), values))
}

fn derive_month(df: &DataFrame) -> Result<Series> {
    let values: Vec<Option<i32>> = order_dates(df)?
        .into_iter()
        .map(|d| d.and_then(|d| i32::try_from(d.month()).ok()))
        .collect();
    Ok(Series::new(columns::MONTH.into(), values))
}

fn derive_quarter(df: &DataFrame) -> Result<Series> {
    let values: Vec<Option<i32>> = order_dates(df)?
        .into_iter()
        .map(|d| d.and_then(|d| i32::try_from(d.month0() / 3 + 1).ok()))
        .collect();
    Ok(Series::new(columns::QUARTER.into(), values))
}

fn derive_day_of_week(df: &DataFrame) -> Result<Series> {
    let values: Vec<Option<&str>> = order_dates(df)?
        .into_iter()
        .map(|d| d.map(|d| weekday_name(d.weekday())))
        .collect();
    Ok(Series::new(columns::DAY_OF_WEEK.into(), values))
}

fn derive_month_name(df: &DataFrame) -> Result<Series> {
    let values: Vec<Option<&str>> = order_dates(df)?
        .into_iter()
        .map(|d| {
            d.and_then(|d| u8::try_from(d.month()).ok())
                .and_then(|m| chrono::Month::try_from(m).ok())
                .map(|m| m.name())
        })
        .collect();
    Ok(Series::new(columns::MONTH_NAME.into(), values))
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

fn derive_profit_margin(df: &DataFrame) -> Result<Series> {
    let sales = table::f64_values(df, columns::SALES)?;
    let profit = table::f64_values(df, columns::PROFIT)?;

    let values: Vec<Option<f64>> = sales
        .into_iter()
        .zip(profit)
        .map(|pair| match pair {
            (Some(s), Some(p)) => profit_margin(s, p),
            _ => None,
        })
        .collect();
    Ok(Series::new(columns::PROFIT_MARGIN.into(), values))
}

fn derive_discount_band(df: &DataFrame) -> Result<Series> {
    let values: Vec<Option<&str>> = table::f64_values(df, columns::DISCOUNT)?
        .into_iter()
        .map(|d| d.and_then(DiscountBand::classify).map(DiscountBand::label))
        .collect();
    Ok(Series::new(columns::DISCOUNT_BAND.into(), values))
}

fn derive_sales_tier(df: &DataFrame) -> Result<Series> {
    let boundaries = TierBoundaries::from_sales(df)?;
    if let Some(b) = &boundaries {
        tracing::debug!(
            low_max = b.low_max,
            medium_max = b.medium_max,
            max = b.max,
            "Sales tier boundaries"
        );
    }

    let values: Vec<Option<&str>> = table::f64_values(df, columns::SALES)?
        .into_iter()
        .map(|s| {
            let b = boundaries.as_ref()?;
            b.classify(s?).map(SalesTier::label)
        })
        .collect();
    Ok(Series::new(columns::SALES_TIER.into(), values))
}
