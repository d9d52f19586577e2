//! # Error Taxonomy / 错误分类
//!
//! Failures that can occur while verifying a design. Only [`VerifyError::Config`]
//! aborts a run; every other variant is captured as structured detail on the
//! `StepResult` of the unit of work it happened in.
//!
//! 验证设计时可能发生的失败。只有 [`VerifyError::Config`] 会中止运行；
//! 其他所有变体都会作为结构化详情记录在其所属工作单元的 `StepResult` 上。

use std::path::PathBuf;
use thiserror::Error;

use crate::core::models::StepStatus;

#[derive(Debug, Error)]
pub enum VerifyError {
    /// Malformed or unreadable configuration. Fatal before any stage runs.
    #[error("configuration error: {0}")]
    Config(String),

    /// A required file or previous-stage output is absent.
    #[error("missing artifact(s): {}", display_paths(.paths))]
    MissingArtifact { paths: Vec<PathBuf> },

    /// The design compiler exited with a non-zero status.
    #[error("compilation failed (exit code {})", display_code(.exit_code))]
    Compile { exit_code: Option<i32>, stderr: String },

    /// A child process exceeded its timeout and was killed.
    #[error("{tool} timed out after {seconds}s")]
    SimulationTimeout { tool: String, seconds: u64 },

    /// A child process could not be launched or exited abnormally.
    #[error("{tool} failed: {message}")]
    Simulation { tool: String, message: String },

    /// A summary line in a log could not be parsed.
    #[error("cannot parse '{label}' value from line: {line}")]
    LogParse { label: String, line: String },

    /// A report artifact could not be written.
    #[error("report generation failed: {0}")]
    Report(String),
}

impl VerifyError {
    /// The step status a unit of work receives when it ends with this error.
    /// Missing prerequisites are test failures; everything else is an error.
    pub fn status(&self) -> StepStatus {
        match self {
            VerifyError::MissingArtifact { .. } => StepStatus::Fail,
            _ => StepStatus::Error,
        }
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn display_code(code: &Option<i32>) -> String {
    code.map(|c| c.to_string()).unwrap_or_else(|| "none".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_artifact_is_a_failure() {
        let err = VerifyError::MissingArtifact {
            paths: vec![PathBuf::from("rtl/a.v"), PathBuf::from("rtl/b.v")],
        };
        assert_eq!(err.status(), StepStatus::Fail);
        assert_eq!(err.to_string(), "missing artifact(s): rtl/a.v, rtl/b.v");
    }

    #[test]
    fn compile_error_is_an_error() {
        let err = VerifyError::Compile {
            exit_code: Some(1),
            stderr: String::new(),
        };
        assert_eq!(err.status(), StepStatus::Error);
        assert_eq!(err.to_string(), "compilation failed (exit code 1)");
    }
}
