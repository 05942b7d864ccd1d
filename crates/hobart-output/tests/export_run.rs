//! Writing a complete run to disk.

use hobart_analysis::{
    AnalysisError, JointOutcome, PipelineOutput, PortfolioOutcome, PortfolioRun,
};
use hobart_output::{ExportFormat, Report, RunTables, export_run};
use hobart_portfolio::{Formation, PortfolioId, PortfolioSet};
use hobart_stats::{Specification, StatsError};
use rstest::rstest;
use std::path::PathBuf;

fn failed_run() -> PipelineOutput {
    PipelineOutput {
        run: PortfolioRun {
            volatility_points: 0,
            formation: Formation::default(),
            portfolios: PortfolioSet::default(),
        },
        analyses: vec![PortfolioOutcome {
            portfolio: PortfolioId::LongShort,
            analysis: Err(AnalysisError::InsufficientData("LS: 4 months".into())),
        }],
        joint_tests: Specification::ALL
            .iter()
            .map(|&specification| JointOutcome {
                specification,
                result: Err(StatsError::InvalidConfiguration(
                    "GRS needs at least 2 portfolios, got 0".into(),
                )),
            })
            .collect(),
    }
}

fn scratch_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("hobart-export-{}-{name}", std::process::id()))
}

#[rstest]
#[case(ExportFormat::Csv, "csv")]
#[case(ExportFormat::PrettyJson, "json")]
fn test_export_run_writes_every_table(#[case] format: ExportFormat, #[case] extension: &str) {
    let dir = scratch_dir(extension);
    let tables = RunTables::from_output(&failed_run());
    let written = export_run(&tables, &dir, format).unwrap();

    assert_eq!(written.len(), 4);
    for path in &written {
        assert!(path.exists(), "{} missing", path.display());
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some(extension));
    }

    let analyses = std::fs::read_to_string(dir.join(format!("analyses.{extension}"))).unwrap();
    assert!(analyses.contains("LS: 4 months"));
    let joint = std::fs::read_to_string(dir.join(format!("joint_tests.{extension}"))).unwrap();
    assert!(joint.contains("n/a"));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_report_of_failed_run() {
    let report = Report::from_output(&failed_run());
    let text = report.to_ascii_table();
    assert!(text.contains("N/A (Insufficient data: LS: 4 months)"));
    assert!(text.contains("N/A (Invalid configuration: GRS needs at least 2 portfolios, got 0)"));
    assert_eq!(report.joint_tests.len(), 3);
}
