//! # Test Execution Planner Module / 测试执行计划模块
//!
//! This module turns the configured suite names into the ordered list of
//! regression tests to run. The order of the plan is the declaration order:
//! suites as configured, then each suite's tests as catalogued.
//!
//! 此模块将配置的套件名称转换为要运行的有序回归测试列表。
//! 计划的顺序即声明顺序：先按配置的套件顺序，再按每个套件目录中测试的顺序。

use crate::core::config::{PipelineConfig, SuiteKind};

/// A regression test: its name and the testbench (harness) file it compiles.
/// 一个回归测试：名称及其编译的测试平台（harness）文件。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestSpec {
    pub name: &'static str,
    pub testbench: &'static str,
}

const fn spec(name: &'static str, testbench: &'static str) -> TestSpec {
    TestSpec { name, testbench }
}

const UNIT_TESTS: &[TestSpec] = &[
    spec("test_dsp_multiply", "tb_dsp_multiply.sv"),
    spec("test_memory_controller", "tb_memory_ctrl.sv"),
    spec("test_axi_interface", "tb_axi_if.sv"),
    spec("test_register_bank", "tb_reg_bank.sv"),
];

const MODULE_TESTS: &[TestSpec] = &[
    spec("test_mdct_engine", "tb_mdct.sv"),
    spec("test_quantizer", "tb_quantizer.sv"),
    spec("test_huffman_codec", "tb_huffman.sv"),
    spec("test_bitstream_parser", "tb_bitstream.sv"),
];

const SYSTEM_TESTS: &[TestSpec] = &[
    spec("test_lc3plus_encoder", "tb_lc3plus_encoder.sv"),
    spec("test_lc3plus_decoder", "tb_lc3plus_decoder.sv"),
    spec("test_full_codec", "tb_full_codec.sv"),
    spec("test_multi_channel", "tb_multi_channel.sv"),
];

const PERFORMANCE_TESTS: &[TestSpec] = &[
    spec("test_latency", "tb_latency_measurement.sv"),
    spec("test_throughput", "tb_throughput_measurement.sv"),
    spec("test_power", "tb_power_estimation.sv"),
];

impl SuiteKind {
    /// The fixed test catalogue of this suite.
    pub fn tests(self) -> &'static [TestSpec] {
        match self {
            SuiteKind::Unit => UNIT_TESTS,
            SuiteKind::Module => MODULE_TESTS,
            SuiteKind::System => SYSTEM_TESTS,
            SuiteKind::Performance => PERFORMANCE_TESTS,
        }
    }
}

/// A test scheduled for execution, tagged with its suite and its position
/// in the declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedTest {
    pub index: usize,
    pub suite: SuiteKind,
    pub spec: TestSpec,
}

/// Represents a complete execution plan for a regression run.
/// 表示一次回归运行的完整执行计划。
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    /// Suites to run, in configured order / 按配置顺序要运行的套件
    pub suites: Vec<SuiteKind>,
    /// Tests to run, in declaration order / 按声明顺序要运行的测试
    pub tests: Vec<PlannedTest>,
    pub coverage_enabled: bool,
}

impl ExecutionPlan {
    pub fn tests_in(&self, suite: SuiteKind) -> impl Iterator<Item = &PlannedTest> {
        self.tests.iter().filter(move |t| t.suite == suite)
    }

    /// Schedules the coverage step even for a single-suite run.
    pub fn with_coverage(mut self) -> Self {
        self.coverage_enabled = true;
        self
    }
}

/// Creates an execution plan from the configuration. `only` narrows the run
/// to a single suite (`--suite`), whether or not it is configured, and
/// leaves out the coverage step unless [`ExecutionPlan::with_coverage`]
/// asks for it.
///
/// 根据配置创建执行计划。`only` 将运行缩小到单个套件（`--suite`），
/// 无论其是否已配置，并且除非调用 [`ExecutionPlan::with_coverage`]，否则省略覆盖率步骤。
pub fn plan_execution(config: &PipelineConfig, only: Option<SuiteKind>) -> ExecutionPlan {
    let suites: Vec<SuiteKind> = match only {
        Some(suite) => vec![suite],
        None => config.test_suites.clone(),
    };

    let tests = suites
        .iter()
        .flat_map(|&suite| suite.tests().iter().map(move |&spec| (suite, spec)))
        .enumerate()
        .map(|(index, (suite, spec))| PlannedTest { index, suite, spec })
        .collect();

    ExecutionPlan {
        suites,
        tests,
        coverage_enabled: only.is_none() && config.coverage_enabled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_follows_configured_suite_order() {
        let config = PipelineConfig {
            test_suites: vec![SuiteKind::Performance, SuiteKind::Unit],
            ..PipelineConfig::default()
        };
        let plan = plan_execution(&config, None);
        assert_eq!(plan.tests.len(), 7);
        assert_eq!(plan.tests[0].spec.name, "test_latency");
        assert_eq!(plan.tests[3].spec.name, "test_dsp_multiply");
        assert!(plan.tests.iter().enumerate().all(|(i, t)| t.index == i));
    }

    #[test]
    fn single_suite_overrides_configuration() {
        let config = PipelineConfig {
            test_suites: vec![SuiteKind::Unit],
            ..PipelineConfig::default()
        };
        let plan = plan_execution(&config, Some(SuiteKind::System));
        assert_eq!(plan.suites, vec![SuiteKind::System]);
        assert_eq!(plan.tests.len(), 4);
        assert!(!plan.coverage_enabled);
        assert!(plan_execution(&config, None).coverage_enabled);
    }

    #[test]
    fn explicit_coverage_survives_suite_filter() {
        let config = PipelineConfig {
            coverage_enabled: false,
            ..PipelineConfig::default()
        };
        let plan = plan_execution(&config, Some(SuiteKind::Unit)).with_coverage();
        assert!(plan.coverage_enabled);
        assert_eq!(plan.tests.len(), 4);
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<_> = SuiteKind::ALL
            .iter()
            .flat_map(|s| s.tests().iter().map(|t| t.name))
            .collect();
        let before = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), before);
    }
}
