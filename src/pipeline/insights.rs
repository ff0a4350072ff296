//! Descriptive business aggregates over the enhanced table.

use super::enhancer::DiscountBand;
use super::rules::{self, ColumnGated};
use crate::error::Result;
use crate::table::{self, columns};
use crate::utils::{fmt_currency, fmt_opt};
use polars::prelude::*;
use serde::Serialize;

/// How many sub-categories the loss-maker list shows.
const TOP_LOSS_MAKERS: u32 = 3;

/// Scratch grouping key for [`margin_by_discount`].
const BAND_RANK: &str = "__discount_band_rank";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InsightGroup {
    LossMakers,
    MarginByDiscount,
    Regional,
    Category,
    HighVolumeLoss,
}

impl InsightGroup {
    pub fn heading(self) -> &'static str {
        match self {
            Self::LossMakers => "🔴 Top 3 Loss-Making Sub-Categories:",
            Self::MarginByDiscount => "📉 Average Profit Margin by Discount Level:",
            Self::Regional => "🌎 Regional Performance (ranked by profit):",
            Self::Category => "📦 Category Performance:",
            Self::HighVolumeLoss => "⚠️  High-Volume but Loss-Making Sub-Categories:",
        }
    }
}

/// One formatted insight under its group heading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsightLine {
    pub group: InsightGroup,
    pub text: String,
}

/// A heading and its lines, in the order they were computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsightSection {
    pub group: InsightGroup,
    pub lines: Vec<InsightLine>,
}

type InsightFn = fn(&DataFrame) -> Result<Vec<String>>;

struct InsightRule {
    group: InsightGroup,
    required: &'static [&'static str],
    run: InsightFn,
}

impl ColumnGated for InsightRule {
    fn name(&self) -> &str {
        self.group.heading()
    }

    fn required_columns(&self) -> &[&'static str] {
        self.required
    }
}

const INSIGHTS: [InsightRule; 5] = [
    InsightRule {
        group: InsightGroup::LossMakers,
        required: &[columns::SUB_CATEGORY, columns::PROFIT],
        run: loss_makers,
    },
    InsightRule {
        group: InsightGroup::MarginByDiscount,
        required: &[columns::DISCOUNT, columns::PROFIT_MARGIN],
        run: margin_by_discount,
    },
    InsightRule {
        group: InsightGroup::Regional,
        required: &[columns::REGION, columns::SALES, columns::PROFIT],
        run: regional_performance,
    },
    InsightRule {
        group: InsightGroup::Category,
        required: &[
            columns::CATEGORY,
            columns::SALES,
            columns::PROFIT,
            columns::PROFIT_MARGIN,
        ],
        run: category_performance,
    },
    InsightRule {
        group: InsightGroup::HighVolumeLoss,
        required: &[columns::SUB_CATEGORY, columns::QUANTITY, columns::PROFIT],
        run: high_volume_losses,
    },
];

/// Computes every applicable insight group. Groups with no lines are omitted.
///
/// # Errors
///
/// Returns an error if an aggregation fails.
pub fn generate_insights(df: &DataFrame) -> Result<Vec<InsightSection>> {
    tracing::info!("Generating automated business insights");

    let mut sections = Vec::new();
    for rule in rules::applicable(&INSIGHTS, df) {
        let texts = (rule.run)(df)?;
        if texts.is_empty() {
            continue;
        }

        tracing::info!("{}", rule.group.heading());
        let lines = texts
            .into_iter()
            .map(|text| {
                tracing::info!("   {text}");
                InsightLine {
                    group: rule.group,
                    text,
                }
            })
            .collect();
        sections.push(InsightSection {
            group: rule.group,
            lines,
        });
    }

    Ok(sections)
}

/// Groups by `key` (nulls dropped) and sums/averages the given columns as `f64`.
fn aggregate(df: &DataFrame, key: &str, sums: &[&str], means: &[&str]) -> LazyFrame {
    let aggs: Vec<Expr> = sums
        .iter()
        .map(|c| col(*c).cast(DataType::Float64).sum())
        .chain(means.iter().map(|c| col(*c).cast(DataType::Float64).mean()))
        .collect();

    df.clone()
        .lazy()
        .filter(col(key).is_not_null())
        .group_by([col(key).cast(DataType::String)])
        .agg(aggs)
}

/// Sorts by `value` then by `key` ascending, so ties are stable across runs.
fn sorted(lf: LazyFrame, value: &str, key: &str, descending: bool) -> LazyFrame {
    lf.sort_by_exprs(
        [col(value), col(key)],
        SortMultipleOptions::default().with_order_descending_multi([descending, false]),
    )
}

fn loss_makers(df: &DataFrame) -> Result<Vec<String>> {
    let key = columns::SUB_CATEGORY;
    let totals = sorted(
        aggregate(df, key, &[columns::PROFIT], &[]),
        columns::PROFIT,
        key,
        false,
    )
    .limit(TOP_LOSS_MAKERS)
    .collect()?;

    let names = table::string_values(&totals, key)?;
    let profits = table::f64_values(&totals, columns::PROFIT)?;

    Ok(names
        .into_iter()
        .zip(profits)
        .map(|(name, profit)| {
            format!(
                "• {}: {}",
                name.unwrap_or_default(),
                fmt_currency(profit.unwrap_or_default(), 2)
            )
        })
        .collect())
}

fn margin_by_discount(df: &DataFrame) -> Result<Vec<String>> {
    let ranks: Vec<Option<u32>> = table::f64_values(df, columns::DISCOUNT)?
        .into_iter()
        .map(|d| d.and_then(DiscountBand::classify).map(DiscountBand::rank))
        .collect();

    // bands with rows but no margins keep a null mean
    let mut frame = df.select([columns::PROFIT_MARGIN])?;
    frame.with_column(Series::new(BAND_RANK.into(), ranks))?;
    let means = frame
        .lazy()
        .filter(col(BAND_RANK).is_not_null())
        .group_by([col(BAND_RANK)])
        .agg([col(columns::PROFIT_MARGIN)
            .cast(DataType::Float64)
            .fill_nan(lit(NULL))
            .mean()])
        .sort_by_exprs([col(BAND_RANK)], SortMultipleOptions::default())
        .collect()?;

    let bands = means.column(BAND_RANK)?.as_materialized_series().u32()?;
    let margins = table::f64_values(&means, columns::PROFIT_MARGIN)?;

    Ok(bands
        .into_iter()
        .zip(margins)
        .filter_map(|(rank, mean)| {
            let band = rank.and_then(DiscountBand::from_rank)?;
            let marker = if mean.is_some_and(|m| m > 0.0) {
                "✅"
            } else {
                "❌"
            };
            Some(format!("{marker} {band}: {}%", fmt_opt(mean)))
        })
        .collect())
}

fn regional_performance(df: &DataFrame) -> Result<Vec<String>> {
    let key = columns::REGION;
    let totals = sorted(
        aggregate(df, key, &[columns::SALES, columns::PROFIT], &[]),
        columns::PROFIT,
        key,
        true,
    )
    .collect()?;

    let names = table::string_values(&totals, key)?;
    let sales = table::f64_values(&totals, columns::SALES)?;
    let profits = table::f64_values(&totals, columns::PROFIT)?;

    Ok(names
        .into_iter()
        .zip(sales.into_iter().zip(profits))
        .map(|(name, (sales, profit))| {
            format!(
                "• {}: Sales {} | Profit {}",
                name.unwrap_or_default(),
                fmt_currency(sales.unwrap_or_default(), 0),
                fmt_currency(profit.unwrap_or_default(), 0)
            )
        })
        .collect())
}

fn category_performance(df: &DataFrame) -> Result<Vec<String>> {
    let key = columns::CATEGORY;
    let totals = sorted(
        aggregate(
            df,
            key,
            &[columns::SALES, columns::PROFIT],
            &[columns::PROFIT_MARGIN],
        ),
        columns::PROFIT,
        key,
        true,
    )
    .collect()?;

    let names = table::string_values(&totals, key)?;
    let sales = table::f64_values(&totals, columns::SALES)?;
    let profits = table::f64_values(&totals, columns::PROFIT)?;
    let margins = table::f64_values(&totals, columns::PROFIT_MARGIN)?;

    Ok(names
        .into_iter()
        .zip(sales)
        .zip(profits.into_iter().zip(margins))
        .map(|((name, sales), (profit, margin))| {
            format!(
                "• {}: Sales {} | Profit {} | Avg Margin {}%",
                name.unwrap_or_default(),
                fmt_currency(sales.unwrap_or_default(), 0),
                fmt_currency(profit.unwrap_or_default(), 0),
                fmt_opt(margin)
            )
        })
        .collect())
}

/// Sub-categories selling more units than the median sub-category while losing money.
fn high_volume_losses(df: &DataFrame) -> Result<Vec<String>> {
    let key = columns::SUB_CATEGORY;
    let totals = aggregate(df, key, &[columns::QUANTITY, columns::PROFIT], &[])
        .sort_by_exprs([col(key)], SortMultipleOptions::default())
        .collect()?;

    let Some(median) = table::percentile(&totals, columns::QUANTITY, 0.5)? else {
        return Ok(Vec::new());
    };

    let names = table::string_values(&totals, key)?;
    let quantities = table::f64_values(&totals, columns::QUANTITY)?;
    let profits = table::f64_values(&totals, columns::PROFIT)?;

    Ok(names
        .into_iter()
        .zip(quantities)
        .zip(profits)
        .filter_map(|((name, quantity), profit)| {
            let (quantity, profit) = (quantity?, profit?);
            (quantity > median && profit < 0.0).then(|| {
                format!(
                    "• {}: {quantity:.0} units sold but {} loss",
                    name.unwrap_or_default(),
                    fmt_currency(profit, 2)
                )
            })
        })
        .collect())
}
