//! # Console Reporting Module / 控制台报告模块
//!
//! This module prints the coloured run summary shown after every `regress`
//! and `verify` invocation, followed by the details of each failed unit.
//!
//! 此模块打印每次 `regress` 和 `verify` 调用后显示的彩色运行摘要，
//! 随后是每个失败单元的详细信息。

use colored::*;

use crate::core::models::{RunSummary, StepResult, StepStatus};
use crate::infra::command::format_compiler_errors;
use crate::infra::t;

/// Prints a formatted summary of results to the console.
/// Displays one line per result with its status, name and duration, then
/// the aggregated counts.
///
/// 在控制台打印格式化的结果摘要。每个结果一行，显示状态、名称和持续时间，随后是汇总计数。
///
/// # Output Format / 输出格式
/// ```text
/// --- Summary ---
///   - PASS     | test_dsp_multiply                        |      1.23s
///   - ERROR    | test_memory_controller                   |      0.45s
///   - SKIP     | coverage_analysis                        |      0.00s
/// ```
pub fn print_summary(results: &[StepResult], summary: &RunSummary, locale: &str) {
    println!("\n{}", t!("summary.banner", locale = locale).bold());

    for result in results {
        let label = result.status.label(locale);
        let status_colored = match result.status {
            StepStatus::Pass => label.green(),
            StepStatus::Fail => label.red(),
            StepStatus::Error => label.red().bold(),
            _ => label.dimmed(),
        };
        println!(
            "  - {:<10} | {:<40} | {:>10}",
            status_colored,
            result.name,
            format!("{:.2}s", result.duration.as_secs_f64())
        );
    }

    println!(
        "\n{}",
        t!(
            "summary.counts",
            locale = locale,
            total = summary.total_tests,
            passed = summary.passed,
            failed = summary.failed,
            errors = summary.errors,
            skipped = summary.skipped
        )
    );
    println!(
        "{}",
        t!(
            "summary.rate",
            locale = locale,
            rate = format!("{:.1}", summary.pass_rate),
            duration = format!("{:.2}", summary.duration)
        )
    );
}

/// Prints the captured output of every FAIL or ERROR result. Compiler
/// output is reduced to its error lines.
///
/// 打印每个 FAIL 或 ERROR 结果的捕获输出。编译器输出会被精简为其错误行。
pub fn print_failure_details(results: &[StepResult], locale: &str) {
    let failures: Vec<&StepResult> = results.iter().filter(|r| r.status.is_failure()).collect();
    if failures.is_empty() {
        return;
    }

    println!("\n{}", t!("summary.failure_banner", locale = locale).red().bold());
    println!("{}", "-".repeat(80));

    for (i, result) in failures.iter().enumerate() {
        println!(
            "[{}/{}] {} '{}' ({})",
            i + 1,
            failures.len(),
            t!("summary.failure_header", locale = locale).red(),
            result.name.cyan(),
            result.status
        );

        let text = if result.detail_str("error") == Some("Compilation failed") {
            let stderr = result.detail_str("stderr").unwrap_or_default();
            format!("Compilation failed\n{}", format_compiler_errors(stderr))
        } else {
            result.failure_text()
        };
        for line in text.lines().take(40) {
            println!("    {line}");
        }
        println!("{}", "-".repeat(80));
    }
}
