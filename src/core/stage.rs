//! Stage identifiers of the sequential verification pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::error::VerifyError;

/// One named step of the verification pipeline, in execution order.
/// 验证流水线中的一个命名步骤，按执行顺序排列。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    GenerateTestVectors,
    CompileRtl,
    RunSimulation,
    AnalyzeResults,
    GenerateReport,
}

impl Stage {
    /// Every stage, in the fixed pipeline order.
    pub const ALL: [Stage; 5] = [
        Stage::GenerateTestVectors,
        Stage::CompileRtl,
        Stage::RunSimulation,
        Stage::AnalyzeResults,
        Stage::GenerateReport,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Stage::GenerateTestVectors => "generate_test_vectors",
            Stage::CompileRtl => "compile_rtl",
            Stage::RunSimulation => "run_simulation",
            Stage::AnalyzeResults => "analyze_results",
            Stage::GenerateReport => "generate_report",
        }
    }

    /// 1-based position in the pipeline, used in progress banners.
    pub fn ordinal(self) -> usize {
        self as usize + 1
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Stage {
    type Err = VerifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stage::ALL
            .into_iter()
            .find(|stage| stage.name() == s.trim())
            .ok_or_else(|| {
                VerifyError::Config(format!(
                    "unknown verification stage '{}' (expected one of: {})",
                    s,
                    Stage::ALL.map(Stage::name).join(", ")
                ))
            })
    }
}

/// Parses a caller-supplied stage list. Every name must be known; the
/// returned stages are deduplicated and put back in pipeline order.
///
/// 解析调用方提供的阶段列表。所有名称都必须是已知的；
/// 返回的阶段会去重并恢复为流水线顺序。
pub fn parse_stage_selection<S: AsRef<str>>(names: &[S]) -> Result<Vec<Stage>, VerifyError> {
    let mut selected = names
        .iter()
        .map(|name| name.as_ref().parse::<Stage>())
        .collect::<Result<Vec<_>, _>>()?;
    selected.sort();
    selected.dedup();
    Ok(selected)
}
