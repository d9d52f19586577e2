//! # Reporting Module / 报告模块
//!
//! This module turns the results of one run into report artifacts. A
//! [`RunReport`] is the structured form; the JSON, plain-text and HTML
//! renderings are all derived from it, and the console module prints the
//! coloured summary shown after each run.
//!
//! 此模块将一次运行的结果转换为报告产物。[`RunReport`] 是结构化形式；
//! JSON、纯文本和 HTML 渲染都由它派生，控制台模块负责打印每次运行后显示的彩色摘要。

pub mod console;
pub mod html;
pub mod text;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::core::config::PipelineConfig;
use crate::core::error::VerifyError;
use crate::core::models::{RunSummary, StepResult, StepStatus, overall_status};
use crate::infra::{fs as infra_fs, t};

pub use console::{print_failure_details, print_summary};

/// Which kind of run a report describes.
/// 报告所描述的运行类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Verification,
    Regression,
}

impl ReportKind {
    /// File name prefix of the report artifacts.
    pub fn prefix(self) -> &'static str {
        match self {
            ReportKind::Verification => "verification_report",
            ReportKind::Regression => "regression_report",
        }
    }

    /// Localized report title.
    pub fn title(self, locale: &str) -> String {
        match self {
            ReportKind::Verification => t!("report.title.verification", locale = locale),
            ReportKind::Regression => t!("report.title.regression", locale = locale),
        }
        .to_string()
    }
}

/// The structured report of one run.
/// 一次运行的结构化报告。
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub kind: ReportKind,
    pub generated_at: DateTime<Local>,
    pub overall_status: StepStatus,
    pub summary: RunSummary,
    pub results: Vec<StepResult>,
    /// The configuration the run used.
    pub configuration: Value,
    /// Language of the text and HTML renderings.
    #[serde(skip)]
    pub locale: String,
}

impl RunReport {
    pub fn new(
        kind: ReportKind,
        results: Vec<StepResult>,
        summary: RunSummary,
        config: &PipelineConfig,
    ) -> Self {
        let configuration = serde_json::to_value(config).unwrap_or_else(|e| {
            log::debug!("configuration not serializable: {e}");
            Value::Null
        });
        Self {
            kind,
            generated_at: Local::now(),
            overall_status: overall_status(&results),
            summary,
            results,
            configuration,
            locale: config.language.clone(),
        }
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }
}

/// The three renderings of a [`RunReport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedReports {
    pub structured: String,
    pub text: String,
    pub html: String,
}

/// Paths of the written report files.
/// 已写入的报告文件路径。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportArtifacts {
    pub json: PathBuf,
    pub text: PathBuf,
    pub html: PathBuf,
}

/// Renders a report in every format.
/// 以所有格式渲染报告。
pub fn render(report: &RunReport) -> Result<RenderedReports, VerifyError> {
    let structured =
        serde_json::to_string_pretty(report).map_err(|e| VerifyError::Report(e.to_string()))?;
    Ok(RenderedReports {
        structured,
        text: text::render_text(report),
        html: html::render_html(report),
    })
}

/// Renders `report` and writes `<prefix>_<timestamp>.{json,txt,html}` into
/// `dir`, creating it if needed.
///
/// 渲染 `report` 并将 `<prefix>_<timestamp>.{json,txt,html}` 写入 `dir`（必要时创建该目录）。
pub fn write_reports(report: &RunReport, dir: &Path) -> Result<ReportArtifacts, VerifyError> {
    let rendered = render(report)?;
    let to_report_error = |e: anyhow::Error| VerifyError::Report(format!("{e:#}"));

    infra_fs::ensure_dir(dir).map_err(to_report_error)?;

    let path_for = |ext: &str| {
        dir.join(infra_fs::timestamped_name(
            report.kind.prefix(),
            &report.generated_at,
            ext,
        ))
    };
    let artifacts = ReportArtifacts {
        json: path_for("json"),
        text: path_for("txt"),
        html: path_for("html"),
    };

    infra_fs::write_artifact(&artifacts.json, &rendered.structured).map_err(to_report_error)?;
    infra_fs::write_artifact(&artifacts.text, &rendered.text).map_err(to_report_error)?;
    infra_fs::write_artifact(&artifacts.html, &rendered.html).map_err(to_report_error)?;

    log::debug!("reports written: {}", artifacts.json.display());
    Ok(artifacts)
}
