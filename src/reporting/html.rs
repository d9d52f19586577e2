//! # HTML Reporting Module / HTML 报告模块
//!
//! This module renders a [`RunReport`] as a self-contained HTML page: a
//! summary block with the run statistics and a table with one row per
//! result. Failure output is collapsed under each failed row.
//!
//! 此模块将 [`RunReport`] 渲染为独立的 HTML 页面：包含运行统计的摘要块，
//! 以及每个结果一行的表格。失败输出折叠在每个失败行之下。

use maud::{DOCTYPE, Markup, PreEscaped, html};

use crate::core::models::StepResult;
use crate::infra::t;
use crate::reporting::RunReport;

/// Embedded CSS styles for HTML reports / HTML 报告的嵌入式 CSS 样式
const HTML_STYLE: &str = r#"
body { font-family: Arial, sans-serif; margin: 20px; color: #222; }
.summary {
    background: #f5f5f5; padding: 15px; border-radius: 5px;
    display: flex; gap: 24px; flex-wrap: wrap;
}
.summary-item { display: flex; flex-direction: column; }
.summary-item .count { font-size: 1.6em; font-weight: bold; }
table { border-collapse: collapse; width: 100%; margin-top: 20px; }
th, td { border: 1px solid #ddd; padding: 8px; text-align: left; vertical-align: top; }
th { background-color: #f2f2f2; }
.status-pass { color: green; font-weight: bold; }
.status-fail { color: red; font-weight: bold; }
.status-error { color: orange; font-weight: bold; }
.status-skip, .status-pending { color: #888; }
pre.output-content { white-space: pre-wrap; margin: 0; font-size: 0.85em; }
"#;

/// Renders the HTML page of a report.
///
/// 渲染报告的 HTML 页面。
///
/// # Arguments / 参数
/// * `report` - The report to render
///              要渲染的报告
pub fn render_html(report: &RunReport) -> String {
    let locale = report.locale.as_str();
    let title = report.kind.title(locale);
    let summary = &report.summary;
    let items = [
        (
            t!("html_report.summary.total", locale = locale),
            summary.total_tests.to_string(),
            "",
        ),
        (
            t!("html_report.summary.passed", locale = locale),
            summary.passed.to_string(),
            "status-pass",
        ),
        (
            t!("html_report.summary.failed", locale = locale),
            summary.failed.to_string(),
            "status-fail",
        ),
        (
            t!("html_report.summary.errors", locale = locale),
            summary.errors.to_string(),
            "status-error",
        ),
        (
            t!("html_report.summary.skipped", locale = locale),
            summary.skipped.to_string(),
            "status-skip",
        ),
        (
            t!("html_report.summary.pass_rate", locale = locale),
            format!("{:.1}%", summary.pass_rate),
            "",
        ),
        (
            t!("html_report.summary.duration", locale = locale),
            format!("{:.1}s", summary.duration),
            "",
        ),
        (
            t!("html_report.summary.overall", locale = locale),
            report.overall_status.to_string(),
            report.overall_status.css_class(),
        ),
    ];

    let page = html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { (title) }
                style { (PreEscaped(HTML_STYLE)) }
            }
            body {
                h1 { (title) }
                p {
                    (t!("report.generated_at", locale = locale,
                        time = report.generated_at.format("%Y-%m-%d %H:%M:%S").to_string()))
                }
                div class="summary" {
                    @for (label, value, class) in &items {
                        (summary_item(label, value, class))
                    }
                }
                h2 { (t!("html_report.results_header", locale = locale)) }
                table {
                    thead {
                        tr {
                            th { (t!("html_report.table.name", locale = locale)) }
                            th { (t!("html_report.table.status", locale = locale)) }
                            th { (t!("html_report.table.duration", locale = locale)) }
                            th { (t!("html_report.table.timestamp", locale = locale)) }
                        }
                    }
                    tbody {
                        @for result in &report.results {
                            (result_row(result, locale))
                        }
                    }
                }
            }
        }
    };

    page.into_string()
}

fn summary_item(label: &str, value: &str, class: &str) -> Markup {
    html! {
        div class="summary-item" {
            span class={ "count " (class) } { (value) }
            span class="label" { (label) }
        }
    }
}

fn result_row(result: &StepResult, locale: &str) -> Markup {
    let failure = if result.status.is_failure() {
        result.failure_text()
    } else {
        String::new()
    };

    html! {
        tr {
            td { (result.name) }
            td class=(result.status.css_class()) { (result.status.label(locale)) }
            td { (format!("{:.2}", result.duration.as_secs_f64())) }
            td { (result.timestamp.format("%Y-%m-%d %H:%M:%S").to_string()) }
        }
        @if !failure.is_empty() {
            tr {
                td colspan="4" {
                    details {
                        summary { (t!("html_report.toggle_output", locale = locale)) }
                        pre class="output-content" { (failure) }
                    }
                }
            }
        }
    }
}
