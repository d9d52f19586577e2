//! # Log Analysis Module / 日志分析模块
//!
//! Turns free-form simulation log text into pass/fail and quality statistics.
//! The line-pattern heuristics live behind the [`LogAnalyzer`] trait so that a
//! different matching strategy (for instance a structured log format) can be
//! plugged into the pipeline without touching its callers.
//!
//! 将自由格式的仿真日志文本转换为通过/失败和质量统计数据。
//! 行模式启发式规则位于 [`LogAnalyzer`] trait 之后，
//! 因此可以在不修改调用方的情况下替换为其他匹配策略（例如结构化日志格式）。

use serde::{Deserialize, Serialize};

use crate::core::error::VerifyError;
use crate::core::models::pass_rate;

/// Statistics derived from one simulation log.
/// 从一个仿真日志中得出的统计数据。
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LogAnalysis {
    pub total_frames: u64,
    pub passed_frames: u64,
    pub failed_frames: u64,
    /// Percentage in `[0, 100]`.
    pub pass_rate: f64,
    /// Average signal-to-noise ratio in dB.
    pub avg_snr: f64,
    /// Minimum signal-to-noise ratio in dB.
    pub min_snr: f64,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl LogAnalysis {
    /// `true` when the frame pass rate reaches `threshold` percent.
    pub fn meets(&self, threshold: f64) -> bool {
        self.pass_rate >= threshold
    }

    /// Grades the log by its error and warning counts.
    pub fn quality(&self, policy: &QualityPolicy) -> QualityAssessment {
        policy.assess(self.errors.len(), self.warnings.len())
    }
}

/// Parses simulation logs into a [`LogAnalysis`].
pub trait LogAnalyzer: Send + Sync {
    fn analyze(&self, log_text: &str) -> LogAnalysis;
}

/// Marker strings recognised by [`FrameLogAnalyzer`].
///
/// The defaults understand both the localized (Chinese) and the English
/// spelling of every marker.
#[derive(Debug, Clone)]
pub struct LogMarkers {
    pub pass: String,
    pub fail: String,
    /// Matched case-insensitively.
    pub frame: Vec<String>,
    pub error: String,
    pub warning: Vec<String>,
    pub total_frames: Vec<String>,
    pub pass_rate: Vec<String>,
    pub avg_snr: Vec<String>,
    pub min_snr: Vec<String>,
}

impl Default for LogMarkers {
    fn default() -> Self {
        let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Self {
            pass: "PASS".to_string(),
            fail: "FAIL".to_string(),
            frame: owned(&["帧", "frame"]),
            error: "ERROR".to_string(),
            warning: owned(&["WARNING", "Warning"]),
            total_frames: owned(&["总测试帧数", "Total frames"]),
            pass_rate: owned(&["通过率", "Pass rate"]),
            avg_snr: owned(&["平均SNR", "Average SNR"]),
            min_snr: owned(&["最小SNR", "Min SNR"]),
        }
    }
}

/// The line-pattern analyzer used for simulator logs.
///
/// Each line is tested against the rules in order and the first match wins:
///
/// 1. PASS marker + frame marker: one passed frame
/// 2. FAIL marker + frame marker: one failed frame
/// 3. `ERROR`: the trimmed line is collected as an error
/// 4. `WARNING` / `Warning`: the trimmed line is collected as a warning
/// 5. `<label>: <value>` summary lines for total frames, pass rate and SNR
///
/// A summary value that does not parse leaves its field untouched.
///
/// 每一行按顺序与规则匹配，首个匹配的规则生效。无法解析的摘要值不会改变对应字段。
#[derive(Debug, Clone, Default)]
pub struct FrameLogAnalyzer {
    markers: LogMarkers,
}

impl FrameLogAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_markers(markers: LogMarkers) -> Self {
        Self { markers }
    }

    fn has_frame_marker(&self, line: &str) -> bool {
        let lowered = line.to_lowercase();
        self.markers
            .frame
            .iter()
            .any(|marker| lowered.contains(&marker.to_lowercase()))
    }
}

#[derive(Default)]
struct SummaryFields {
    total_frames: Option<u64>,
    pass_rate: Option<f64>,
    avg_snr: Option<f64>,
    min_snr: Option<f64>,
}

impl LogAnalyzer for FrameLogAnalyzer {
    fn analyze(&self, log_text: &str) -> LogAnalysis {
        let m = &self.markers;
        let mut analysis = LogAnalysis::default();
        let mut summary = SummaryFields::default();

        for line in log_text.lines() {
            if line.contains(&m.pass) && self.has_frame_marker(line) {
                analysis.passed_frames += 1;
            } else if line.contains(&m.fail) && self.has_frame_marker(line) {
                analysis.failed_frames += 1;
            } else if line.contains(&m.error) {
                analysis.errors.push(line.trim().to_string());
            } else if m.warning.iter().any(|w| line.contains(w.as_str())) {
                analysis.warnings.push(line.trim().to_string());
            } else if let Some(raw) = labelled_value(line, &m.total_frames) {
                update(&mut summary.total_frames, parse_count(raw), "total_frames", line);
            } else if let Some(raw) = labelled_value(line, &m.pass_rate) {
                update(&mut summary.pass_rate, parse_measure(raw), "pass_rate", line);
            } else if let Some(raw) = labelled_value(line, &m.avg_snr) {
                update(&mut summary.avg_snr, parse_measure(raw), "avg_snr", line);
            } else if let Some(raw) = labelled_value(line, &m.min_snr) {
                update(&mut summary.min_snr, parse_measure(raw), "min_snr", line);
            }
        }

        let counted = analysis.passed_frames + analysis.failed_frames;
        analysis.total_frames = summary.total_frames.unwrap_or(counted);
        analysis.pass_rate = summary.pass_rate.unwrap_or(0.0);

        // A derived total always overrides the reported rate; an explicit
        // total only fills in a missing one.
        let recompute = summary.total_frames.is_none() || summary.pass_rate.is_none();
        if recompute && analysis.total_frames > 0 {
            analysis.pass_rate = pass_rate(
                analysis.passed_frames as usize,
                analysis.total_frames as usize,
            );
        }
        analysis.pass_rate = analysis.pass_rate.clamp(0.0, 100.0);

        analysis.avg_snr = summary.avg_snr.unwrap_or(0.0);
        analysis.min_snr = summary.min_snr.unwrap_or(analysis.avg_snr);
        analysis
    }
}

/// Returns the text after `<label>:` (ASCII or full-width colon) for the
/// first label found in `line`, up to the next colon.
fn labelled_value<'a>(line: &'a str, labels: &[String]) -> Option<&'a str> {
    labels.iter().find_map(|label| {
        let start = line.find(label.as_str())? + label.len();
        let rest = line[start..].trim_start();
        let rest = rest
            .strip_prefix(':')
            .or_else(|| rest.strip_prefix('：'))?;
        Some(rest.split([':', '：']).next().unwrap_or(rest))
    })
}

fn update<T>(field: &mut Option<T>, parsed: Option<T>, label: &str, line: &str) {
    match parsed {
        Some(value) => *field = Some(value),
        None => log::debug!(
            "{}",
            VerifyError::LogParse {
                label: label.to_string(),
                line: line.trim().to_string(),
            }
        ),
    }
}

fn parse_count(raw: &str) -> Option<u64> {
    raw.trim().parse().ok()
}

/// Parses `97.5%`, `45.2 dB` and plain numbers. Non-finite values are rejected.
fn parse_measure(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_suffix('%').unwrap_or(trimmed);
    let lowered = trimmed.to_ascii_lowercase();
    let number = match lowered.strip_suffix("db") {
        Some(_) => &trimmed[..trimmed.len() - 2],
        None => trimmed,
    };
    number
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Letter grade of a log's quality score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualityGrade {
    #[serde(rename = "A+")]
    APlus,
    A,
    B,
    C,
}

impl QualityGrade {
    pub fn as_str(self) -> &'static str {
        match self {
            QualityGrade::APlus => "A+",
            QualityGrade::A => "A",
            QualityGrade::B => "B",
            QualityGrade::C => "C",
        }
    }
}

/// Score and grade of one log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityAssessment {
    /// `0..=100`
    pub score: u32,
    pub grade: QualityGrade,
}

/// Penalty weights and grade bands. The defaults are the historical
/// project rules: 20 points per error, 5 per warning, A+ from 90, A from 80,
/// B from 70.
///
/// 扣分权重和等级区间。默认值为项目的历史规则。
#[derive(Debug, Clone, PartialEq)]
pub struct QualityPolicy {
    pub error_penalty: u32,
    pub warning_penalty: u32,
    pub grade_a_plus: u32,
    pub grade_a: u32,
    pub grade_b: u32,
}

pub const ERROR_PENALTY: u32 = 20;
pub const WARNING_PENALTY: u32 = 5;

impl Default for QualityPolicy {
    fn default() -> Self {
        Self {
            error_penalty: ERROR_PENALTY,
            warning_penalty: WARNING_PENALTY,
            grade_a_plus: 90,
            grade_a: 80,
            grade_b: 70,
        }
    }
}

impl QualityPolicy {
    pub fn assess(&self, errors: usize, warnings: usize) -> QualityAssessment {
        let penalty = (errors as u64) * u64::from(self.error_penalty)
            + (warnings as u64) * u64::from(self.warning_penalty);
        let score = 100u64.saturating_sub(penalty) as u32;
        let grade = if score >= self.grade_a_plus {
            QualityGrade::APlus
        } else if score >= self.grade_a {
            QualityGrade::A
        } else if score >= self.grade_b {
            QualityGrade::B
        } else {
            QualityGrade::C
        };
        QualityAssessment { score, grade }
    }
}
