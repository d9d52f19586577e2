//! Property-based tests for the summary arithmetic, the log analyzer and the
//! analysis threshold.
//!
//! 汇总计算、日志分析器和分析阈值的基于属性的测试。

use chrono::Local;
use proptest::prelude::*;
use std::fs;
use verification_runner::core::analyzer::{FrameLogAnalyzer, LogAnalyzer};
use verification_runner::core::config::{PipelineConfig, ProjectLayout};
use verification_runner::models::{Details, RunSummary, StepAttempt, StepResult, StepStatus};
use verification_runner::pipeline::VerificationPipeline;

fn results_with(passed: usize, failed: usize, errors: usize, skipped: usize) -> Vec<StepResult> {
    let mut results = Vec::new();
    for (status, count) in [
        (StepStatus::Pass, passed),
        (StepStatus::Fail, failed),
        (StepStatus::Error, errors),
        (StepStatus::Skip, skipped),
    ] {
        for i in 0..count {
            results.push(
                StepAttempt::new(format!("{}_{i}", status.as_str()))
                    .start()
                    .finish(status, Details::new()),
            );
        }
    }
    results
}

/// Log lines drawn from the shapes simulators actually print, plus noise.
fn log_line() -> impl Strategy<Value = String> {
    prop_oneof![
        (0u32..500, prop::bool::ANY).prop_map(|(i, ok)| format!(
            "帧 {i}: {} SNR={}dB",
            if ok { "PASS" } else { "FAIL" },
            i % 60
        )),
        (0u32..500, prop::bool::ANY)
            .prop_map(|(i, ok)| format!("Frame {i} {}", if ok { "PASS" } else { "FAIL" })),
        (0.0f64..=100.0).prop_map(|r| format!("通过率: {r}%")),
        (0u64..10_000).prop_map(|n| format!("总测试帧数: {n}")),
        (-10.0f64..80.0).prop_map(|s| format!("平均SNR: {s} dB")),
        (-10.0f64..80.0).prop_map(|s| format!("Min SNR: {s}dB")),
        "[a-z ]{0,20}".prop_map(|s| format!("ERROR: {s}")),
        "[a-z ]{0,20}".prop_map(|s| format!("Warning: {s}")),
        "\\PC{0,40}",
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn pass_rate_follows_counts(
        passed in 0usize..30,
        failed in 0usize..30,
        errors in 0usize..30,
        skipped in 0usize..30,
    ) {
        let results = results_with(passed, failed, errors, skipped);
        let now = Local::now();
        let summary = RunSummary::from_results(&results, now, now);

        let total = passed + failed + errors + skipped;
        prop_assert_eq!(summary.total_tests, total);
        prop_assert_eq!(summary.passed, passed);
        prop_assert_eq!(summary.failed, failed);
        prop_assert_eq!(summary.errors, errors);
        prop_assert_eq!(summary.skipped, skipped);
        if total == 0 {
            prop_assert_eq!(summary.pass_rate, 0.0);
        } else {
            prop_assert_eq!(summary.pass_rate, passed as f64 / total as f64 * 100.0);
        }
        prop_assert_eq!(summary.is_success(), failed == 0 && errors == 0);

        for result in &results {
            prop_assert!(matches!(
                result.status,
                StepStatus::Pass | StepStatus::Fail | StepStatus::Error | StepStatus::Skip
            ));
            prop_assert!(result.duration.as_secs_f64() >= 0.0);
        }
    }

    #[test]
    fn analysis_is_idempotent(lines in prop::collection::vec(log_line(), 0..40)) {
        let text = lines.join("\n");
        let analyzer = FrameLogAnalyzer::new();
        let first = analyzer.analyze(&text);
        let second = analyzer.analyze(&text);
        prop_assert_eq!(&first, &second);
        prop_assert!((0.0..=100.0).contains(&first.pass_rate));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn analysis_passes_iff_rate_meets_threshold(rate in 0.0f64..=100.0) {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig::default();
        let layout = ProjectLayout::resolve(&config, dir.path());
        fs::create_dir_all(&layout.results_dir).unwrap();
        fs::write(
            layout.result_file(&config.verification.log_file),
            format!("=== STDOUT ===\n通过率: {rate}%\n=== STDERR ===\n"),
        )
        .unwrap();

        let result = VerificationPipeline::new(config, layout)
            .with_locale("en")
            .analyze_results();

        let expected = if rate >= 95.0 { StepStatus::Pass } else { StepStatus::Fail };
        prop_assert_eq!(result.status, expected);
        prop_assert_eq!(result.details["pass_rate"].as_f64(), Some(rate));
    }
}
