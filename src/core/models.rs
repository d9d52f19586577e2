//! # Data Models Module / 数据模型模块
//!
//! This module defines the core data structures used throughout the runner:
//! the status of a unit of work, the record of its outcome and the summary
//! aggregated over a run.
//!
//! 此模块定义了整个运行器中使用的核心数据结构：
//! 工作单元的状态、其结果记录以及在一次运行中汇总的摘要。

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::time::{Duration, Instant};

use crate::infra::t;

/// Structured, open-ended details attached to a [`StepResult`].
/// 附加到 [`StepResult`] 的结构化开放详情。
pub type Details = Map<String, Value>;

/// Lifecycle status of a unit of work (a pipeline stage or a suite test).
/// 工作单元（流水线阶段或套件测试）的生命周期状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepStatus {
    Pending,
    Running,
    Pass,
    Fail,
    Error,
    Skip,
}

impl StepStatus {
    /// `true` for PASS, FAIL, ERROR and SKIP.
    pub fn is_terminal(self) -> bool {
        !matches!(self, StepStatus::Pending | StepStatus::Running)
    }

    /// `true` for outcomes that make a run unsuccessful.
    pub fn is_failure(self) -> bool {
        matches!(self, StepStatus::Fail | StepStatus::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StepStatus::Pending => "PENDING",
            StepStatus::Running => "RUNNING",
            StepStatus::Pass => "PASS",
            StepStatus::Fail => "FAIL",
            StepStatus::Error => "ERROR",
            StepStatus::Skip => "SKIP",
        }
    }

    /// Gets the appropriate CSS class for the status.
    pub fn css_class(self) -> &'static str {
        match self {
            StepStatus::Pass => "status-pass",
            StepStatus::Fail => "status-fail",
            StepStatus::Error => "status-error",
            StepStatus::Skip => "status-skip",
            StepStatus::Pending | StepStatus::Running => "status-pending",
        }
    }

    /// Localized label for console output.
    /// 用于控制台输出的本地化标签。
    pub fn label(self, locale: &str) -> String {
        match self {
            StepStatus::Pending => t!("status.pending", locale = locale),
            StepStatus::Running => t!("status.running", locale = locale),
            StepStatus::Pass => t!("status.pass", locale = locale),
            StepStatus::Fail => t!("status.fail", locale = locale),
            StepStatus::Error => t!("status.error", locale = locale),
            StepStatus::Skip => t!("status.skip", locale = locale),
        }
        .to_string()
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The outcome of one executed unit of work.
///
/// A `StepResult` is only ever built by [`StepAttempt::finish`] (or the
/// status helpers below), so its status is always terminal.
///
/// 一个已执行工作单元的结果。
/// `StepResult` 只能由 [`StepAttempt::finish`]（或下面的状态辅助函数）构建，
/// 因此其状态始终是终态。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    /// Unique name within a run / 运行内唯一的名称
    pub name: String,
    pub status: StepStatus,
    /// Wall-clock time spent, serialized as fractional seconds.
    /// 所花费的时间，序列化为秒（小数）。
    #[serde(with = "duration_secs")]
    pub duration: Duration,
    /// When the unit of work was created / 工作单元的创建时间
    pub timestamp: DateTime<Local>,
    #[serde(default)]
    pub details: Details,
}

impl StepResult {
    /// Builds a result whose work never started, e.g. a test cancelled
    /// before it ran.
    pub fn skipped(name: impl Into<String>, details: Details) -> Self {
        Self {
            name: name.into(),
            status: StepStatus::Skip,
            duration: Duration::ZERO,
            timestamp: Local::now(),
            details,
        }
    }

    /// Reads a string-valued detail.
    pub fn detail_str(&self, key: &str) -> Option<&str> {
        self.details.get(key).and_then(Value::as_str)
    }

    /// The text shown as the failure explanation in reports: the `error`
    /// detail, then captured stderr, then stdout.
    ///
    /// 报告中作为失败说明显示的文本：先取 `error` 详情，其次是 stderr，最后是 stdout。
    pub fn failure_text(&self) -> String {
        let mut parts = Vec::new();
        for key in ["error", "stderr", "stdout"] {
            if let Some(text) = self.detail_str(key).filter(|s| !s.trim().is_empty()) {
                parts.push(text.trim_end().to_string());
            }
        }
        if let Some(missing) = self.details.get("missing_files") {
            parts.push(format!("missing_files: {missing}"));
        }
        parts.join("\n")
    }
}

/// A unit of work in flight. Moves PENDING → RUNNING → terminal and is
/// consumed by [`StepAttempt::finish`], which produces the immutable
/// [`StepResult`].
///
/// 一个进行中的工作单元。状态从 PENDING → RUNNING → 终态，
/// 并由 [`StepAttempt::finish`] 消耗，生成不可变的 [`StepResult`]。
#[derive(Debug)]
pub struct StepAttempt {
    name: String,
    status: StepStatus,
    timestamp: DateTime<Local>,
    started: Option<Instant>,
}

impl StepAttempt {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: StepStatus::Pending,
            timestamp: Local::now(),
            started: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> StepStatus {
        self.status
    }

    /// Marks the attempt as running and starts its clock.
    pub fn start(mut self) -> Self {
        self.status = StepStatus::Running;
        self.started = Some(Instant::now());
        self
    }

    /// Seconds elapsed since [`StepAttempt::start`].
    pub fn elapsed(&self) -> Duration {
        self.started.map(|s| s.elapsed()).unwrap_or_default()
    }

    /// Closes the attempt. A non-terminal `status` is a programming error and
    /// is recorded as ERROR.
    pub fn finish(self, status: StepStatus, details: Details) -> StepResult {
        debug_assert!(status.is_terminal(), "finish() needs a terminal status");
        let status = if status.is_terminal() {
            status
        } else {
            StepStatus::Error
        };
        let duration = self.elapsed();
        StepResult {
            name: self.name,
            status,
            duration,
            timestamp: self.timestamp,
            details,
        }
    }
}

/// Aggregate over the results of one invocation. Always recomputed from the
/// full result slice via [`RunSummary::from_results`].
///
/// 一次调用结果的汇总。始终通过 [`RunSummary::from_results`] 从完整结果切片重新计算。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_tests: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub skipped: usize,
    pub pass_rate: f64,
    pub start_time: DateTime<Local>,
    pub end_time: DateTime<Local>,
    /// `end_time - start_time` in seconds / 以秒为单位
    pub duration: f64,
}

impl RunSummary {
    pub fn from_results(
        results: &[StepResult],
        start_time: DateTime<Local>,
        end_time: DateTime<Local>,
    ) -> Self {
        let count = |status: StepStatus| results.iter().filter(|r| r.status == status).count();
        let total_tests = results.len();
        let passed = count(StepStatus::Pass);
        let duration = (end_time - start_time)
            .to_std()
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);

        Self {
            total_tests,
            passed,
            failed: count(StepStatus::Fail),
            errors: count(StepStatus::Error),
            skipped: count(StepStatus::Skip),
            pass_rate: pass_rate(passed, total_tests),
            start_time,
            end_time,
            duration,
        }
    }

    /// `true` when no attempted unit ended in FAIL or ERROR.
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.errors == 0
    }
}

/// `passed / total * 100`, or 0 when `total` is 0. Always computed from the
/// integer counts.
pub fn pass_rate(passed: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        passed as f64 / total as f64 * 100.0
    }
}

/// Overall status of a collection: ERROR if any unit errored, else FAIL if
/// any failed, else PASS.
///
/// 一个集合的总体状态：任一单元出错则为 ERROR，否则任一失败则为 FAIL，否则为 PASS。
pub fn overall_status(results: &[StepResult]) -> StepStatus {
    if results.iter().any(|r| r.status == StepStatus::Error) {
        StepStatus::Error
    } else if results.iter().any(|r| r.status == StepStatus::Fail) {
        StepStatus::Fail
    } else {
        StepStatus::Pass
    }
}

/// Serde adapter storing a [`Duration`] as fractional seconds.
pub mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Duration::try_from_secs_f64(secs.max(0.0)).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attempt_moves_from_pending_to_terminal() {
        let attempt = StepAttempt::new("compile_rtl");
        assert_eq!(attempt.name(), "compile_rtl");
        assert_eq!(attempt.status(), StepStatus::Pending);

        let attempt = attempt.start();
        assert_eq!(attempt.status(), StepStatus::Running);

        let result = attempt.finish(StepStatus::Fail, Details::new());
        assert_eq!(result.name, "compile_rtl");
        assert_eq!(result.status, StepStatus::Fail);
    }

    #[test]
    fn empty_run_has_zero_rate_and_passes() {
        let now = Local::now();
        let summary = RunSummary::from_results(&[], now, now);
        assert_eq!(summary.total_tests, 0);
        assert_eq!(summary.pass_rate, 0.0);
        assert!(summary.is_success());
        assert_eq!(overall_status(&[]), StepStatus::Pass);
    }
}
