//! Plain-text rendering of a [`RunReport`].
//! [`RunReport`] 的纯文本渲染。

use std::fmt::Write;

use crate::core::models::{StepResult, StepStatus};
use crate::infra::t;
use crate::reporting::RunReport;

const RULE_WIDTH: usize = 60;

/// Renders the human-readable report: header, one block per result and the
/// overall verdict.
pub fn render_text(report: &RunReport) -> String {
    let locale = report.locale.as_str();
    let summary = &report.summary;
    let mut out = String::new();

    let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH));
    let _ = writeln!(out, "{}", report.kind.title(locale));
    let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH));
    let _ = writeln!(
        out,
        "{}",
        t!(
            "report.generated_at",
            locale = locale,
            time = report.generated_at.format("%Y-%m-%d %H:%M:%S").to_string()
        )
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "{}", t!("report.results_header", locale = locale));
    let _ = writeln!(out, "{}", "-".repeat(40));
    for result in &report.results {
        write_result(&mut out, result, locale);
    }

    let _ = writeln!(
        out,
        "{}",
        t!(
            "report.overall_status",
            locale = locale,
            status = report.overall_status.as_str()
        )
    );
    let _ = writeln!(
        out,
        "{}",
        t!(
            "report.summary_line",
            locale = locale,
            passed = summary.passed,
            total = summary.total_tests,
            failed = summary.failed,
            errors = summary.errors,
            skipped = summary.skipped
        )
    );
    let _ = writeln!(
        out,
        "{}",
        t!(
            "report.pass_rate_line",
            locale = locale,
            rate = format!("{:.1}", summary.pass_rate),
            duration = format!("{:.2}", summary.duration)
        )
    );
    let _ = writeln!(out);

    let verdict = if report.overall_status == StepStatus::Pass {
        t!("report.verdict_pass", locale = locale)
    } else {
        t!("report.verdict_fail", locale = locale)
    };
    let _ = writeln!(out, "{verdict}");
    out
}

fn write_result(out: &mut String, result: &StepResult, locale: &str) {
    let icon = match result.status {
        StepStatus::Pass => "[+]",
        StepStatus::Skip => "[-]",
        _ => "[x]",
    };
    let _ = writeln!(
        out,
        "{} {}: {} ({:.2}s)",
        icon,
        result.name,
        result.status,
        result.duration.as_secs_f64()
    );

    if result.status.is_failure() {
        let failure = result.failure_text();
        if !failure.is_empty() {
            let _ = writeln!(out, "   {}", t!("report.details", locale = locale));
            for line in failure.lines().take(20) {
                let _ = writeln!(out, "   {line}");
            }
        }
    } else if let Some(reason) = result.detail_str("reason") {
        let _ = writeln!(out, "   {reason}");
    }
    let _ = writeln!(out);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::PipelineConfig;
    use crate::core::models::{Details, RunSummary, StepAttempt};
    use crate::reporting::ReportKind;
    use chrono::Local;

    #[test]
    fn failed_results_show_their_error() {
        let mut details = Details::new();
        details.insert("error".into(), "Compilation failed".into());
        let results = vec![
            StepAttempt::new("compile_rtl")
                .start()
                .finish(StepStatus::Error, details),
        ];
        let now = Local::now();
        let summary = RunSummary::from_results(&results, now, now);
        let report =
            RunReport::new(ReportKind::Verification, results, summary, &PipelineConfig::default())
                .with_locale("en");

        let text = render_text(&report);
        assert!(text.contains("[x] compile_rtl: ERROR"));
        assert!(text.contains("Compilation failed"));
        assert!(text.contains("ERROR"));
    }
}
