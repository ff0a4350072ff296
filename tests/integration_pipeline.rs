//! Integration tests for the full pipeline
//!
//! These tests run the stages against the fixture files in `testdata/`
//! and verify the end-to-end results on disk.

use std::path::{Path, PathBuf};
use storeaudit::config::PipelineConfig;
use storeaudit::pipeline::validator::CheckKind;
use storeaudit::pipeline::{
    LoadOptions, SourceEncoding, enhance, load_table, run_pipeline, validate,
};
use storeaudit::table::string_values;

const SAMPLE: &str = "testdata/superstore_sample.csv";
const LEGACY_SAMPLE: &str = "testdata/superstore_cp1252.csv";

fn config_for(input: &str, out_dir: &Path) -> PipelineConfig {
    PipelineConfig {
        input: PathBuf::from(input),
        output: out_dir.join("data").join("final.csv"),
        report: out_dir.join("data").join("validation_report.txt"),
        ..PipelineConfig::default()
    }
}

#[test]
fn test_run_clean_sample() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = config_for(SAMPLE, dir.path());

    let run = run_pipeline(&config).expect("pipeline should succeed on the clean sample");

    assert_eq!(run.rows, 12, "Should keep every input row");
    assert_eq!(run.columns, 11 + 8, "Should add eight derived columns");
    assert!(run.validation_passed, "Clean sample should pass every check");
    assert_eq!(run.warnings, 0);
    assert_eq!(run.export.rows, 12);
    assert!(run.export.bytes > 0);

    let report = std::fs::read_to_string(&config.report).expect("report written");
    let validation_section = report
        .split("VALIDATION RESULTS")
        .nth(1)
        .and_then(|rest| rest.split("AUTOMATED BUSINESS INSIGHTS").next())
        .expect("validation section");
    assert_eq!(
        validation_section.matches("✅").count(),
        6,
        "Six passing checks"
    );
    assert!(report.contains("  Total rows: 12"));
    assert!(report.contains("  Total columns: 19"));

    let west = report.find("• West:").expect("West listed");
    let central = report.find("• Central:").expect("Central listed");
    let east = report.find("• East:").expect("East listed");
    let south = report.find("• South:").expect("South listed");
    assert!(
        west < central && central < east && east < south,
        "Regions should be ranked by total profit"
    );

    let tables = report.find("• Tables: -$383.03").expect("Tables is the worst");
    let binders = report.find("• Binders: -$87.40").expect("Binders second");
    let labels = report.find("• Labels: $16.86").expect("Labels third");
    assert!(tables < binders && binders < labels);

    assert!(report.contains("• Binders: 14 units sold but -$87.40 loss"));
    assert!(!report.contains("• Phones: 12 units sold"));
}

#[test]
fn test_export_reload_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = config_for(SAMPLE, dir.path());
    let run = run_pipeline(&config).expect("pipeline");

    let reloaded = load_table(&config.output, &LoadOptions::default()).expect("reload export");

    assert_eq!(reloaded.frame.height(), run.rows);
    assert_eq!(reloaded.frame.width(), run.columns);
}

#[test]
fn test_enhancer_is_idempotent() {
    let mut once = load_table(Path::new(SAMPLE), &LoadOptions::default())
        .expect("load")
        .frame;
    let first = enhance(&mut once).expect("first enhance");
    assert_eq!(first.added().len(), 8, "Eight derived columns");
    assert_eq!(first.converted(), vec!["Order Date (parsed)"]);

    let mut twice = once.clone();
    let second = enhance(&mut twice).expect("second enhance");

    assert!(second.added().is_empty(), "Second pass must add nothing");
    assert!(twice.equals_missing(&once));
}

#[test]
fn test_reenhancing_exported_table_keeps_shape() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = config_for(SAMPLE, dir.path());
    run_pipeline(&config).expect("pipeline");

    let mut reloaded = load_table(&config.output, &LoadOptions::default())
        .expect("reload")
        .frame;
    let width = reloaded.width();
    let outcome = enhance(&mut reloaded).expect("enhance reloaded");

    assert_eq!(reloaded.width(), width, "Derived columns already exist");
    assert!(outcome.added().is_empty(), "Nothing is added on reload");
    assert_eq!(outcome.already_present().len(), 8);
}

#[test]
fn test_windows_1252_sample() {
    let loaded = load_table(Path::new(LEGACY_SAMPLE), &LoadOptions::default()).expect("load");

    assert_eq!(loaded.encoding, SourceEncoding::Windows1252);
    assert_eq!(loaded.frame.height(), 5);

    let names = string_values(&loaded.frame, "Customer Name").expect("string column");
    assert!(names.contains(&Some("José Müller".to_owned())));
    assert!(names.contains(&Some("François Lefèvre".to_owned())));

    let outcome = validate(&loaded.frame);
    assert!(!outcome.all_passed);

    let warned: Vec<CheckKind> = outcome
        .findings
        .iter()
        .filter(|f| f.is_warning())
        .map(|f| f.kind)
        .collect();
    assert_eq!(
        warned,
        vec![
            CheckKind::DuplicateRows,
            CheckKind::NegativeSales,
            CheckKind::DateConsistency,
            CheckKind::ExtremeLoss,
        ]
    );
    assert!(
        outcome
            .findings
            .iter()
            .filter(|f| f.is_warning())
            .all(|f| f.count == Some(1)),
        "Each problem occurs exactly once in the fixture"
    );
}

#[test]
fn test_legacy_sample_exports_utf8() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = config_for(LEGACY_SAMPLE, dir.path());

    let run = run_pipeline(&config).expect("pipeline");
    assert!(!run.validation_passed);

    let bytes = std::fs::read(&config.output).expect("export written");
    let text = String::from_utf8(bytes).expect("export is UTF-8");
    assert!(text.contains("José Müller"));

    let report = std::fs::read_to_string(&config.report).expect("report written");
    assert!(report.contains("Found 1 completely duplicate rows"));
    assert!(report.contains("1 rows with negative sales (possible data error)"));
}

#[test]
fn test_missing_input_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = config_for("testdata/does_not_exist.csv", dir.path());

    let err = run_pipeline(&config).expect_err("missing input must fail");

    assert!(err.is_fatal());
    assert!(err.to_string().contains("does_not_exist.csv"));
    assert!(!config.output.exists());
    assert!(!config.report.exists());
}
