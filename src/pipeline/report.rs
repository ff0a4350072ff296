//! Plain-text run report.
//!
//! The driver owns one [`ReportBuilder`], feeds it the validation outcome
//! and insight sections, and renders it once at the end of the run.

use super::insights::InsightSection;
use super::validator::{ValidationFinding, ValidationOutcome};
use crate::utils::fmt_thousands;
use chrono::{DateTime, Local};
use std::path::Path;

const RULE_WIDTH: usize = 70;

pub const REPORT_TITLE: &str = "SUPERSTORE DATA VALIDATION & INSIGHTS REPORT";

const NEXT_STEPS: [&str; 3] = [
    "1. Review this validation report",
    "2. Import the final CSV into the SQLite database",
    "3. Refresh the dashboard",
];

/// Run details echoed in the report header.
#[derive(Debug, Clone)]
pub struct ReportContext<'a> {
    pub input: &'a Path,
    pub output: &'a Path,
    pub rows: usize,
    pub columns: usize,
    pub generated_at: DateTime<Local>,
}

#[derive(Debug, Clone, Default)]
pub struct ReportBuilder {
    findings: Vec<ValidationFinding>,
    insights: Vec<InsightSection>,
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_validation(&mut self, outcome: &ValidationOutcome) {
        self.findings.extend(outcome.findings.iter().cloned());
    }

    pub fn record_insights(&mut self, sections: impl IntoIterator<Item = InsightSection>) {
        self.insights.extend(sections);
    }

    pub fn findings(&self) -> &[ValidationFinding] {
        &self.findings
    }

    pub fn insights(&self) -> &[InsightSection] {
        &self.insights
    }

    pub fn render(&self, ctx: &ReportContext<'_>) -> String {
        let rule = "=".repeat(RULE_WIDTH);
        let mut out: Vec<String> = vec![
            rule.clone(),
            REPORT_TITLE.to_owned(),
            format!("Generated: {}", ctx.generated_at.format("%Y-%m-%d %H:%M:%S")),
            rule.clone(),
            String::new(),
            "INPUT FILE:".to_owned(),
            format!("  {}", ctx.input.display()),
            String::new(),
            "OUTPUT FILE:".to_owned(),
            format!("  {}", ctx.output.display()),
            String::new(),
            "DATA SUMMARY:".to_owned(),
            format!("  Total rows: {}", fmt_thousands(ctx.rows as f64, 0)),
            format!("  Total columns: {}", ctx.columns),
            String::new(),
            rule.clone(),
            "VALIDATION RESULTS".to_owned(),
            rule.clone(),
        ];

        if self.findings.is_empty() {
            out.push("No validation checks were applicable".to_owned());
        }
        out.extend(self.findings.iter().map(ToString::to_string));

        out.extend([
            String::new(),
            rule.clone(),
            "AUTOMATED BUSINESS INSIGHTS".to_owned(),
            rule.clone(),
        ]);
        for section in &self.insights {
            out.push(String::new());
            out.push(section.group.heading().to_owned());
            out.extend(section.lines.iter().map(|l| format!("   {}", l.text)));
        }

        out.extend([String::new(), rule.clone(), "NEXT STEPS:".to_owned(), rule.clone()]);
        out.extend(NEXT_STEPS.iter().map(|s| (*s).to_owned()));
        out.push(rule);

        let mut text = out.join("\n");
        text.push('\n');
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::insights::{InsightGroup, InsightLine};
    use crate::pipeline::validator::CheckKind;
    use chrono::TimeZone as _;

    fn context() -> ReportContext<'static> {
        ReportContext {
            input: Path::new("data/in.csv"),
            output: Path::new("data/out.csv"),
            rows: 9994,
            columns: 29,
            generated_at: Local
                .with_ymd_and_hms(2024, 3, 1, 9, 30, 0)
                .single()
                .expect("valid local time"),
        }
    }

    #[test]
    fn test_render_template_sections_in_order() {
        let mut builder = ReportBuilder::new();
        builder.record_validation(&ValidationOutcome {
            findings: vec![
                ValidationFinding::pass(CheckKind::MissingValues, "No missing values"),
                ValidationFinding::warning(
                    CheckKind::NegativeSales,
                    "1 rows with negative sales (possible data error)",
                    Some(1),
                ),
            ],
            all_passed: false,
        });
        builder.record_insights(vec![InsightSection {
            group: InsightGroup::Regional,
            lines: vec![InsightLine {
                group: InsightGroup::Regional,
                text: "• East: Sales $100 | Profit $20".to_owned(),
            }],
        }]);

        assert_eq!(builder.findings().len(), 2);
        assert_eq!(builder.insights().len(), 1);

        let text = builder.render(&context());

        assert!(text.starts_with(&"=".repeat(70)));
        assert!(text.contains("Generated: 2024-03-01 09:30:00"));
        assert!(text.contains("  Total rows: 9,994"));
        assert!(text.contains("✅ No missing values"));
        assert!(text.contains("⚠️  1 rows with negative sales"));
        assert!(text.contains("   • East: Sales $100 | Profit $20"));

        let order = [
            "INPUT FILE:",
            "OUTPUT FILE:",
            "DATA SUMMARY:",
            "VALIDATION RESULTS",
            "AUTOMATED BUSINESS INSIGHTS",
            "Regional Performance",
            "NEXT STEPS:",
            "Refresh the dashboard",
        ];
        let positions: Vec<usize> = order
            .iter()
            .map(|marker| text.find(marker).expect("section present"))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_render_without_findings() {
        let text = ReportBuilder::new().render(&context());
        assert!(text.contains("No validation checks were applicable"));
        assert!(text.ends_with(&format!("{}\n", "=".repeat(70))));
    }
}
