//! # Core Module / 核心模块
//!
//! This module contains the core functionality of the verification runner:
//! data models, configuration, log analysis, the regression suite runner and
//! the sequential verification pipeline.
//!
//! 此模块包含验证运行器的核心功能：
//! 数据模型、配置、日志分析、回归套件运行器和顺序验证流水线。

pub mod analyzer;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod planner;
pub mod stage;
pub mod suite;

// Re-exports
pub use analyzer::{FrameLogAnalyzer, LogAnalysis, LogAnalyzer};
pub use config::{PipelineConfig, ProjectLayout};
pub use error::VerifyError;
pub use models::{RunSummary, StepResult, StepStatus};
pub use pipeline::{PipelineRun, VerificationPipeline};
pub use stage::Stage;
pub use suite::{RegressionRunner, SuiteRun};
