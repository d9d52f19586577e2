//! # Configuration Module / 配置模块
//!
//! Run configuration loaded once from an optional TOML file. Every field has
//! a built-in default so an absent file, or a file naming only a few keys,
//! yields a complete configuration.
//!
//! 从可选的 TOML 文件中加载一次的运行配置。每个字段都有内置默认值，
//! 因此缺少文件或文件只指定少数键时，也会得到完整的配置。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::core::analyzer::QualityPolicy;
use crate::core::error::VerifyError;

/// Name of the configuration file looked up in the project root.
pub const DEFAULT_CONFIG_FILE: &str = "verification.toml";

/// Minimum frame pass rate, in percent, for `analyze_results` to pass.
pub const DEFAULT_PASS_RATE_THRESHOLD: f64 = 95.0;

/// A named group of regression tests.
/// 一组命名的回归测试。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SuiteKind {
    #[serde(rename = "unit", alias = "unit_tests")]
    Unit,
    #[serde(rename = "module", alias = "module_tests")]
    Module,
    #[serde(rename = "system", alias = "system_tests")]
    System,
    #[serde(rename = "performance", alias = "performance_tests")]
    Performance,
}

impl SuiteKind {
    pub const ALL: [SuiteKind; 4] = [
        SuiteKind::Unit,
        SuiteKind::Module,
        SuiteKind::System,
        SuiteKind::Performance,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SuiteKind::Unit => "unit",
            SuiteKind::Module => "module",
            SuiteKind::System => "system",
            SuiteKind::Performance => "performance",
        }
    }
}

impl fmt::Display for SuiteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SuiteKind {
    type Err = VerifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        let name = name.strip_suffix("_tests").unwrap_or(&name);
        SuiteKind::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| VerifyError::Config(format!("unknown test suite '{s}'")))
    }
}

/// The complete run configuration.
/// 完整的运行配置。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// The language for the runner's output messages (e.g., "en", "zh-CN").
    /// 运行器输出消息的语言（例如 "en", "zh-CN"）。
    pub language: String,
    /// Ordered set of suites the regression runs.
    pub test_suites: Vec<SuiteKind>,
    /// Simulation timeout in seconds.
    pub timeout: u64,
    /// Upper bound on concurrently running regression tests.
    pub parallel_jobs: usize,
    pub coverage_enabled: bool,
    pub waveform_enabled: bool,
    pub paths: PathsConfig,
    pub tools: ToolsConfig,
    pub verification: VerificationConfig,
    pub thresholds: ThresholdsConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            test_suites: SuiteKind::ALL.to_vec(),
            timeout: 3600,
            parallel_jobs: 4,
            coverage_enabled: true,
            waveform_enabled: false,
            paths: PathsConfig::default(),
            tools: ToolsConfig::default(),
            verification: VerificationConfig::default(),
            thresholds: ThresholdsConfig::default(),
        }
    }
}

/// Project layout, relative to the project root unless absolute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    pub rtl_dir: PathBuf,
    pub testbench_dir: PathBuf,
    pub results_dir: PathBuf,
    /// Passed to the compiler as `-I<dir>`.
    pub include_dirs: Vec<PathBuf>,
    /// Design source extensions discovered under `rtl_dir`.
    pub source_extensions: Vec<String>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            rtl_dir: PathBuf::from("rtl"),
            testbench_dir: PathBuf::from("sim/testbench"),
            results_dir: PathBuf::from("sim/results"),
            include_dirs: vec![
                PathBuf::from("rtl/common"),
                PathBuf::from("rtl/lc3plus"),
                PathBuf::from("sim/testbench"),
            ],
            source_extensions: vec!["v".to_string(), "sv".to_string()],
        }
    }
}

/// External tools and their time limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolsConfig {
    pub compiler: String,
    pub compiler_flags: Vec<String>,
    /// Program used to run compiled artifacts (e.g. `vvp`). When unset the
    /// artifact is executed directly.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub simulator_runner: Option<String>,
    /// Command line of the test vector generator.
    pub vector_generator: String,
    /// Command line of the coverage tool, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coverage: Option<String>,
    pub compile_timeout: u64,
    pub vector_timeout: u64,
    /// String a passing simulation prints on stdout.
    pub success_marker: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            compiler: "iverilog".to_string(),
            compiler_flags: vec!["-g2012".to_string(), "-Wall".to_string()],
            simulator_runner: None,
            vector_generator: "python3 sim/scripts/generate_test_vectors.py".to_string(),
            coverage: None,
            compile_timeout: 300,
            vector_timeout: 600,
            success_marker: "TEST_PASS".to_string(),
        }
    }
}

/// Inputs and artifacts of the sequential verification pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VerificationConfig {
    pub harness: PathBuf,
    /// Design sources that must exist before `compile_rtl` runs.
    pub required_sources: Vec<PathBuf>,
    /// Compiled simulation artifact, inside the results directory.
    pub artifact: String,
    /// Simulation log, inside the results directory.
    pub log_file: String,
    /// Waveform dump, inside the results directory.
    pub waveform_file: String,
    /// Environment variable naming the waveform dump path.
    pub waveform_env: String,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            harness: PathBuf::from("sim/testbench/tb_lc3plus_encoder_top.sv"),
            required_sources: [
                "rtl/processing/mdct_transform.v",
                "rtl/processing/spectral_analysis.v",
                "rtl/processing/quantization_control.v",
                "rtl/processing/entropy_coding.v",
                "rtl/processing/bitstream_packing.v",
                "rtl/lc3plus_encoder_top.v",
            ]
            .into_iter()
            .map(PathBuf::from)
            .collect(),
            artifact: "simulation".to_string(),
            log_file: "simulation.log".to_string(),
            waveform_file: "simulation.vcd".to_string(),
            waveform_env: "VCD_FILE".to_string(),
        }
    }
}

/// Business rules for pass/fail and quality grading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThresholdsConfig {
    /// Minimum frame pass rate (percent) for `analyze_results`.
    pub pass_rate: f64,
    pub error_penalty: u32,
    pub warning_penalty: u32,
    pub grade_a_plus: u32,
    pub grade_a: u32,
    pub grade_b: u32,
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        let policy = QualityPolicy::default();
        Self {
            pass_rate: DEFAULT_PASS_RATE_THRESHOLD,
            error_penalty: policy.error_penalty,
            warning_penalty: policy.warning_penalty,
            grade_a_plus: policy.grade_a_plus,
            grade_a: policy.grade_a,
            grade_b: policy.grade_b,
        }
    }
}

impl ThresholdsConfig {
    /// The quality grading rules named by this section.
    pub fn quality_policy(&self) -> QualityPolicy {
        QualityPolicy {
            error_penalty: self.error_penalty,
            warning_penalty: self.warning_penalty,
            grade_a_plus: self.grade_a_plus,
            grade_a: self.grade_a,
            grade_b: self.grade_b,
        }
    }
}

impl PipelineConfig {
    /// Checks the invariants serde cannot express and removes duplicate suite
    /// names while keeping their first position.
    ///
    /// 检查 serde 无法表达的不变量，并在保留首次出现位置的前提下去除重复的套件名称。
    pub fn validate(mut self) -> Result<Self, VerifyError> {
        if self.parallel_jobs == 0 {
            return Err(VerifyError::Config(
                "parallel_jobs must be a positive integer".to_string(),
            ));
        }
        if self.timeout == 0 {
            return Err(VerifyError::Config("timeout must be positive".to_string()));
        }
        if self.tools.compile_timeout == 0 {
            return Err(VerifyError::Config(
                "tools.compile_timeout must be positive".to_string(),
            ));
        }
        if self.tools.vector_timeout == 0 {
            return Err(VerifyError::Config(
                "tools.vector_timeout must be positive".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&self.thresholds.pass_rate) {
            return Err(VerifyError::Config(format!(
                "thresholds.pass_rate must be within [0, 100], got {}",
                self.thresholds.pass_rate
            )));
        }
        if self.tools.compiler.trim().is_empty() {
            return Err(VerifyError::Config("tools.compiler must not be empty".to_string()));
        }

        let mut seen = Vec::with_capacity(self.test_suites.len());
        self.test_suites.retain(|suite| {
            if seen.contains(suite) {
                false
            } else {
                seen.push(*suite);
                true
            }
        });
        Ok(self)
    }

    /// Parses a configuration from TOML text and validates it.
    pub fn from_toml_str(content: &str) -> Result<Self, VerifyError> {
        toml::from_str::<PipelineConfig>(content)
            .map_err(|e| VerifyError::Config(e.to_string()))?
            .validate()
    }
}

/// Loads the run configuration.
///
/// * An explicit `path` must exist and parse.
/// * Without a path, `verification.toml` in `project_root` is used when
///   present, otherwise the built-in defaults.
///
/// 加载运行配置。显式给出的 `path` 必须存在且可解析；未给出路径时，
/// 若 `project_root` 中存在 `verification.toml` 则使用它，否则使用内置默认值。
pub fn load_config(
    path: Option<&Path>,
    project_root: &Path,
) -> Result<PipelineConfig, VerifyError> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let candidate = project_root.join(DEFAULT_CONFIG_FILE);
            if !candidate.exists() {
                log::debug!("no {} found, using defaults", candidate.display());
                return PipelineConfig::default().validate();
            }
            candidate
        }
    };

    let content = fs::read_to_string(&path)
        .map_err(|e| VerifyError::Config(format!("cannot read {}: {}", path.display(), e)))?;
    PipelineConfig::from_toml_str(&content)
        .map_err(|e| VerifyError::Config(format!("{}: {}", path.display(), e)))
}

/// Absolute project paths derived from a [`PipelineConfig`] and a project root.
///
/// 由 [`PipelineConfig`] 和项目根目录派生的绝对项目路径。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    pub root: PathBuf,
    pub rtl_dir: PathBuf,
    pub testbench_dir: PathBuf,
    pub results_dir: PathBuf,
    pub include_dirs: Vec<PathBuf>,
}

impl ProjectLayout {
    pub fn resolve(config: &PipelineConfig, root: &Path) -> Self {
        let join = |p: &Path| root.join(p);
        Self {
            root: root.to_path_buf(),
            rtl_dir: join(&config.paths.rtl_dir),
            testbench_dir: join(&config.paths.testbench_dir),
            results_dir: join(&config.paths.results_dir),
            include_dirs: config.paths.include_dirs.iter().map(|p| join(p)).collect(),
        }
    }

    /// Resolves a project-relative path.
    pub fn path(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }

    /// Resolves a file name inside the results directory.
    pub fn result_file(&self, name: &str) -> PathBuf {
        self.results_dir.join(name)
    }
}
