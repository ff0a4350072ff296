//! Column-gated rules.
//!
//! Every check, enhancement and insight depends on a fixed set of input
//! columns and is skipped when any of them is absent. Rules declare those
//! columns instead of testing for them inline.

use crate::table;
use polars::prelude::DataFrame;

/// A rule that only runs when its source columns are present.
pub trait ColumnGated {
    /// Name used in logs and reports.
    fn name(&self) -> &str;

    /// Columns that must exist for the rule to run.
    fn required_columns(&self) -> &[&'static str];

    fn missing_columns(&self, df: &DataFrame) -> Vec<&'static str> {
        self.required_columns()
            .iter()
            .copied()
            .filter(|c| !table::has_column(df, c))
            .collect()
    }
}

/// Returns the rules whose required columns are all present, logging the rest.
pub fn applicable<'a, R: ColumnGated>(rules: &'a [R], df: &DataFrame) -> Vec<&'a R> {
    rules
        .iter()
        .filter(|rule| {
            let missing = rule.missing_columns(df);
            if missing.is_empty() {
                true
            } else {
                tracing::debug!(rule = rule.name(), ?missing, "Skipping rule");
                false
            }
        })
        .collect()
}
