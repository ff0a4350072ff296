//! Data-quality checks over the loaded table.
//!
//! Six checks run in a fixed order. Each one contributes exactly one finding,
//! a pass or a warning, and is skipped silently when its columns are absent.
//! A check that cannot be evaluated is reported as a warning; validation
//! itself never fails the run.

use super::rules::{self, ColumnGated};
use crate::error::Result;
use crate::table::{self, columns};
use polars::prelude::*;
use serde::Serialize;
use std::fmt;

/// Loss beyond this multiple of sales is treated as a likely data error.
const EXTREME_LOSS_RATIO: f64 = -2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CheckKind {
    MissingValues,
    DuplicateRows,
    NegativeSales,
    DateConsistency,
    DiscountRange,
    ExtremeLoss,
}

impl CheckKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::MissingValues => "Missing values",
            Self::DuplicateRows => "Duplicate rows",
            Self::NegativeSales => "Negative sales",
            Self::DateConsistency => "Date consistency",
            Self::DiscountRange => "Discount range",
            Self::ExtremeLoss => "Extreme loss margin",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FindingStatus {
    Pass,
    Warning,
}

/// Outcome of one check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationFinding {
    pub kind: CheckKind,
    pub status: FindingStatus,
    pub message: String,
    /// Offending rows, for warnings that can be counted.
    pub count: Option<usize>,
}

impl ValidationFinding {
    pub fn pass(kind: CheckKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: FindingStatus::Pass,
            message: message.into(),
            count: None,
        }
    }

    pub fn warning(kind: CheckKind, message: impl Into<String>, count: Option<usize>) -> Self {
        Self {
            kind,
            status: FindingStatus::Warning,
            message: message.into(),
            count,
        }
    }

    pub fn is_warning(&self) -> bool {
        self.status == FindingStatus::Warning
    }
}

impl fmt::Display for ValidationFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            FindingStatus::Pass => write!(f, "✅ {}", self.message),
            FindingStatus::Warning => write!(f, "⚠️  {}", self.message),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationOutcome {
    pub findings: Vec<ValidationFinding>,
    pub all_passed: bool,
}

impl ValidationOutcome {
    pub fn warnings(&self) -> usize {
        self.findings.iter().filter(|f| f.is_warning()).count()
    }
}

/// Scale the discount column is expressed in, inferred from its maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscountScale {
    Fraction,
    Percentage,
}

impl DiscountScale {
    pub fn detect(max: f64) -> Self {
        if max > 1.0 {
            Self::Percentage
        } else {
            Self::Fraction
        }
    }

    pub fn upper_bound(self) -> f64 {
        match self {
            Self::Fraction => 1.0,
            Self::Percentage => 100.0,
        }
    }
}

impl fmt::Display for DiscountScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fraction => write!(f, "fraction scale 0-1"),
            Self::Percentage => write!(f, "percentage scale 0-100"),
        }
    }
}

type CheckFn = fn(&DataFrame) -> Result<ValidationFinding>;

struct CheckRule {
    kind: CheckKind,
    required: &'static [&'static str],
    run: CheckFn,
}

impl ColumnGated for CheckRule {
    fn name(&self) -> &str {
        self.kind.label()
    }

    fn required_columns(&self) -> &[&'static str] {
        self.required
    }
}

const CHECKS: [CheckRule; 6] = [
    CheckRule {
        kind: CheckKind::MissingValues,
        required: &[],
        run: check_missing_values,
    },
    CheckRule {
        kind: CheckKind::DuplicateRows,
        required: &[columns::ORDER_ID],
        run: check_duplicate_rows,
    },
    CheckRule {
        kind: CheckKind::NegativeSales,
        required: &[columns::SALES],
        run: check_negative_sales,
    },
    CheckRule {
        kind: CheckKind::DateConsistency,
        required: &[columns::ORDER_DATE],
        run: check_date_consistency,
    },
    CheckRule {
        kind: CheckKind::DiscountRange,
        required: &[columns::DISCOUNT],
        run: check_discount_range,
    },
    CheckRule {
        kind: CheckKind::ExtremeLoss,
        required: &[columns::SALES, columns::PROFIT],
        run: check_extreme_loss,
    },
];

/// Runs every applicable check in order.
pub fn validate(df: &DataFrame) -> ValidationOutcome {
    tracing::info!("Running data quality validation");

    let findings: Vec<ValidationFinding> = rules::applicable(&CHECKS, df)
        .into_iter()
        .map(|rule| {
            (rule.run)(df).unwrap_or_else(|e| {
                ValidationFinding::warning(
                    rule.kind,
                    format!("{} check could not be evaluated: {e}", rule.kind.label()),
                    None,
                )
            })
        })
        .collect();

    for finding in &findings {
        match finding.status {
            FindingStatus::Pass => tracing::info!(check = finding.kind.label(), "{finding}"),
            FindingStatus::Warning => tracing::warn!(
                check = finding.kind.label(),
                count = finding.count,
                "{finding}"
            ),
        }
    }

    let outcome = ValidationOutcome {
        all_passed: findings.iter().all(|f| !f.is_warning()),
        findings,
    };

    if outcome.all_passed {
        tracing::info!("All quality checks passed");
    } else {
        tracing::warn!(
            "Found {} potential issue(s), review recommended",
            outcome.warnings()
        );
    }

    outcome
}

fn check_missing_values(df: &DataFrame) -> Result<ValidationFinding> {
    let mut row_has_missing = vec![false; df.height()];
    let mut per_column = Vec::new();

    for column in df.get_columns() {
        let name = column.name().as_str();
        let missing: Vec<bool> = if column.dtype().is_string() {
            table::string_values(df, name)?
                .iter()
                .map(|v| v.as_deref().is_none_or(|s| s.trim().is_empty()))
                .collect()
        } else {
            column
                .as_materialized_series()
                .is_null()
                .into_iter()
                .map(|v| v.unwrap_or(true))
                .collect()
        };

        let count = missing.iter().filter(|m| **m).count();
        if count > 0 {
            per_column.push(format!("{name} ({count})"));
            for (flag, is_missing) in row_has_missing.iter_mut().zip(&missing) {
                *flag |= *is_missing;
            }
        }
    }

    if per_column.is_empty() {
        return Ok(ValidationFinding::pass(
            CheckKind::MissingValues,
            "No missing values",
        ));
    }

    let rows = row_has_missing.iter().filter(|m| **m).count();
    Ok(ValidationFinding::warning(
        CheckKind::MissingValues,
        format!(
            "Missing values detected in {rows} row(s): {}",
            per_column.join(", ")
        ),
        Some(rows),
    ))
}

/// Counts rows identical to an earlier row across every column.
///
/// One order legitimately spans several line items, so `Order ID` alone
/// is not a key.
fn check_duplicate_rows(df: &DataFrame) -> Result<ValidationFinding> {
    let distinct = df
        .clone()
        .lazy()
        .unique(None, UniqueKeepStrategy::First)
        .collect()?
        .height();
    let duplicates = df.height().saturating_sub(distinct);

    Ok(if duplicates == 0 {
        ValidationFinding::pass(CheckKind::DuplicateRows, "No duplicate rows")
    } else {
        ValidationFinding::warning(
            CheckKind::DuplicateRows,
            format!("Found {duplicates} completely duplicate rows"),
            Some(duplicates),
        )
    })
}

fn check_negative_sales(df: &DataFrame) -> Result<ValidationFinding> {
    let negative = table::f64_values(df, columns::SALES)?
        .into_iter()
        .flatten()
        .filter(|v| *v < 0.0)
        .count();

    Ok(if negative == 0 {
        ValidationFinding::pass(
            CheckKind::NegativeSales,
            "All sales values are non-negative",
        )
    } else {
        ValidationFinding::warning(
            CheckKind::NegativeSales,
            format!("{negative} rows with negative sales (possible data error)"),
            Some(negative),
        )
    })
}

fn check_date_consistency(df: &DataFrame) -> Result<ValidationFinding> {
    let (_, failures) = table::date_values(df, columns::ORDER_DATE)?;

    Ok(if failures == 0 {
        ValidationFinding::pass(CheckKind::DateConsistency, "Date format is consistent")
    } else {
        ValidationFinding::warning(
            CheckKind::DateConsistency,
            format!("Date format inconsistencies detected: {failures} unparseable order dates"),
            Some(failures),
        )
    })
}

fn check_discount_range(df: &DataFrame) -> Result<ValidationFinding> {
    let values: Vec<f64> = table::f64_values(df, columns::DISCOUNT)?
        .into_iter()
        .flatten()
        .collect();

    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let scale = DiscountScale::detect(max);
    let upper = scale.upper_bound();
    let invalid = values.iter().filter(|v| **v < 0.0 || **v > upper).count();

    Ok(if invalid == 0 {
        ValidationFinding::pass(
            CheckKind::DiscountRange,
            format!("All discount values are within valid range ({scale})"),
        )
    } else {
        ValidationFinding::warning(
            CheckKind::DiscountRange,
            format!("{invalid} rows with invalid discount values ({scale})"),
            Some(invalid),
        )
    })
}

fn check_extreme_loss(df: &DataFrame) -> Result<ValidationFinding> {
    let sales = table::f64_values(df, columns::SALES)?;
    let profit = table::f64_values(df, columns::PROFIT)?;

    let extreme = sales
        .iter()
        .zip(&profit)
        .filter(|(s, p)| match (s, p) {
            (Some(s), Some(p)) if *s != 0.0 => p / s < EXTREME_LOSS_RATIO,
            _ => false,
        })
        .count();

    Ok(if extreme == 0 {
        ValidationFinding::pass(
            CheckKind::ExtremeLoss,
            "No extreme loss margins (below -200%)",
        )
    } else {
        ValidationFinding::warning(
            CheckKind::ExtremeLoss,
            format!("{extreme} rows with extreme losses (>200% negative margin)"),
            Some(extreme),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean_frame() -> Result<DataFrame> {
        Ok(df!(
            "Order ID" => ["CA-1", "CA-1", "CA-2"],
            "Order Date" => ["11/8/2016", "11/8/2016", "2017-06-12"],
            "Sales" => [261.96, 731.94, 14.62],
            "Profit" => [41.91, 219.58, 6.87],
            "Discount" => [0.0, 0.2, 0.0],
            "Region" => ["South", "South", "West"]
        )?)
    }

    #[test]
    fn test_clean_table_passes_all_six() -> Result<()> {
        let outcome = validate(&clean_frame()?);

        assert!(outcome.all_passed);
        assert_eq!(outcome.findings.len(), 6);
        assert!(
            outcome
                .findings
                .iter()
                .all(|f| f.status == FindingStatus::Pass)
        );
        let kinds: Vec<CheckKind> = outcome.findings.iter().map(|f| f.kind).collect();
        assert_eq!(
            kinds,
            vec![
                CheckKind::MissingValues,
                CheckKind::DuplicateRows,
                CheckKind::NegativeSales,
                CheckKind::DateConsistency,
                CheckKind::DiscountRange,
                CheckKind::ExtremeLoss,
            ]
        );
        Ok(())
    }

    #[test]
    fn test_single_negative_sale_warns_once() -> Result<()> {
        let df = df!(
            "Order ID" => ["CA-1"],
            "Order Date" => ["2016-11-08"],
            "Sales" => [-5.0],
            "Profit" => [1.0],
            "Discount" => [0.1]
        )?;

        let outcome = validate(&df);
        assert!(!outcome.all_passed);

        let warnings: Vec<&ValidationFinding> =
            outcome.findings.iter().filter(|f| f.is_warning()).collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings.first().map(|w| w.kind), Some(CheckKind::NegativeSales));
        assert_eq!(warnings.first().and_then(|w| w.count), Some(1));
        Ok(())
    }

    #[test]
    fn test_missing_checks_are_skipped() -> Result<()> {
        let df = df!("Region" => ["East", "West"])?;
        let outcome = validate(&df);

        assert_eq!(outcome.findings.len(), 1);
        assert_eq!(
            outcome.findings.first().map(|f| f.kind),
            Some(CheckKind::MissingValues)
        );
        Ok(())
    }

    #[test]
    fn test_missing_values_counts_rows() -> Result<()> {
        let df = df!(
            "Region" => [Some("East"), Some("  "), None],
            "Sales" => [Some(1.0), None, None]
        )?;

        let finding = check_missing_values(&df)?;
        assert!(finding.is_warning());
        assert_eq!(finding.count, Some(2));
        assert!(finding.message.contains("Region (2)"));
        assert!(finding.message.contains("Sales (2)"));
        Ok(())
    }

    #[test]
    fn test_duplicate_rows_not_order_ids() -> Result<()> {
        let df = df!(
            "Order ID" => ["CA-1", "CA-1", "CA-1"],
            "Sales" => [10.0, 20.0, 10.0]
        )?;

        let finding = check_duplicate_rows(&df)?;
        assert_eq!(finding.count, Some(1));
        Ok(())
    }

    #[test]
    fn test_duplicate_rows_with_nulls_compare_equal() -> Result<()> {
        let df = df!(
            "Order ID" => [Some("CA-1"), Some("CA-1"), Some("CA-1"), Some("CA-2")],
            "Region" => [None, None, None, Some("West")],
            "Sales" => [Some(5.0), Some(5.0), Some(5.0), None]
        )?;

        let finding = check_duplicate_rows(&df)?;
        assert!(finding.is_warning());
        assert_eq!(finding.count, Some(2));
        assert_eq!(finding.message, "Found 2 completely duplicate rows");

        let distinct = check_duplicate_rows(&clean_frame()?)?;
        assert_eq!(distinct.status, FindingStatus::Pass);
        Ok(())
    }

    #[test]
    fn test_discount_scale_detection() -> Result<()> {
        let fraction = df!("Discount" => [0.0, 0.2, 0.8])?;
        let finding = check_discount_range(&fraction)?;
        assert!(!finding.is_warning());
        assert!(finding.message.contains("fraction"));

        let percent = df!("Discount" => [0.0, 20.0, 120.0, -1.0])?;
        let finding = check_discount_range(&percent)?;
        assert_eq!(finding.count, Some(2));
        assert!(finding.message.contains("percentage"));
        Ok(())
    }

    #[test]
    fn test_extreme_loss_ignores_zero_sales() -> Result<()> {
        let df = df!(
            "Sales" => [0.0, 10.0, 10.0],
            "Profit" => [-50.0, -25.0, -15.0]
        )?;

        let finding = check_extreme_loss(&df)?;
        assert_eq!(finding.count, Some(1));
        Ok(())
    }

    #[test]
    fn test_bad_dates_warn() -> Result<()> {
        let df = df!("Order Date" => ["2016-11-08", "13/45/2016", "tomorrow"])?;
        let finding = check_date_consistency(&df)?;
        assert_eq!(finding.count, Some(2));
        Ok(())
    }
}
