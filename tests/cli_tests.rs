#![cfg(unix)]
//! End-to-end tests of the `verification-runner` binary.
//!
//! `verification-runner` 可执行文件的端到端测试。

mod common;

use assert_cmd::prelude::*;
use common::{FakeProject, create_invalid_toml};
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use verification_runner::config::{DEFAULT_CONFIG_FILE, PipelineConfig};

fn runner() -> Command {
    Command::cargo_bin("verification-runner").unwrap()
}

/// Writes the fake-tool configuration where the runner looks for it.
fn install_config(project: &FakeProject, config: &PipelineConfig) {
    project.write(DEFAULT_CONFIG_FILE, &toml::to_string_pretty(config).unwrap());
}

#[test]
fn test_help_lists_commands() {
    runner()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("regress"))
        .stdout(predicate::str::contains("verify"))
        .stdout(predicate::str::contains("init"));
}

/// A passing unit suite exits 0 and leaves a regression report behind.
/// 通过的单元套件以 0 退出，并留下回归报告。
#[test]
fn test_regress_unit_suite_succeeds() {
    let project = FakeProject::new();
    for tb in ["tb_dsp_multiply.sv", "tb_memory_ctrl.sv", "tb_axi_if.sv", "tb_reg_bank.sv"] {
        project.testbench(tb, "echo TEST_PASS");
    }
    install_config(&project, &project.config());

    runner()
        .args(["--lang", "en", "regress", "--suite", "unit", "--project-dir"])
        .arg(project.root())
        .assert()
        .success()
        .stdout(predicate::str::contains("test_register_bank"));

    assert_eq!(project.reports("regression_report_").len(), 3);
}

/// `--coverage` keeps the coverage step in a single-suite run.
/// 在单套件运行中，`--coverage` 会保留覆盖率步骤。
#[test]
fn test_regress_suite_with_explicit_coverage() {
    let project = FakeProject::new();
    for tb in ["tb_dsp_multiply.sv", "tb_memory_ctrl.sv", "tb_axi_if.sv", "tb_reg_bank.sv"] {
        project.testbench(tb, "echo TEST_PASS");
    }
    install_config(&project, &project.config());

    runner()
        .args(["--lang", "en", "regress", "--suite", "unit", "--coverage", "--project-dir"])
        .arg(project.root())
        .assert()
        .success();

    let json = project
        .reports("regression_report_")
        .into_iter()
        .find(|p| p.extension().is_some_and(|e| e == "json"))
        .unwrap();
    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(json).unwrap()).unwrap();
    let names: Vec<&str> = report["results"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|r| r["name"].as_str())
        .collect();
    assert_eq!(names.len(), 5);
    assert_eq!(names.last(), Some(&"coverage_analysis"));
}

/// A failing test makes the process exit non-zero.
/// 失败的测试会使进程以非零状态退出。
#[test]
fn test_regress_failure_exits_nonzero() {
    let project = FakeProject::new();
    for tb in ["tb_dsp_multiply.sv", "tb_memory_ctrl.sv", "tb_axi_if.sv"] {
        project.testbench(tb, "echo TEST_PASS");
    }
    project.testbench("tb_reg_bank.sv", "exit 1");
    install_config(&project, &project.config());

    runner()
        .args(["--lang", "en", "regress", "--suite", "unit", "--jobs", "1", "--project-dir"])
        .arg(project.root())
        .assert()
        .code(1);
}

/// A compile error halts `verify` with exit code 1.
/// 编译错误会使 `verify` 中止并以退出码 1 退出。
#[test]
fn test_verify_compile_error_exits_nonzero() {
    let project = FakeProject::new();
    project.pipeline_inputs("# COMPILE_ERROR");
    install_config(&project, &project.config());

    runner()
        .args(["--lang", "en", "verify", "--project-dir"])
        .arg(project.root())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("compile_rtl"));

    assert_eq!(project.reports("verification_report_").len(), 3);
}

#[test]
fn test_verify_selected_steps_succeed() {
    let project = FakeProject::new();
    project.pipeline_inputs("echo '通过率: 99.0%'");
    install_config(&project, &project.config());

    runner()
        .args(["--lang", "en", "verify", "--steps"])
        .args(["compile_rtl", "run_simulation", "analyze_results"])
        .arg("--project-dir")
        .arg(project.root())
        .assert()
        .success();

    assert!(project.reports("verification_report_").is_empty());
}

/// Unknown stage names are rejected before anything runs.
/// 未知的阶段名称会在任何阶段运行之前被拒绝。
#[test]
fn test_unknown_stage_is_rejected() {
    let project = FakeProject::new();

    runner()
        .args(["--lang", "en", "verify", "--steps", "synthesize", "--project-dir"])
        .arg(project.root())
        .assert()
        .failure()
        .stderr(predicate::str::contains("synthesize"));

    assert!(fs::read_dir(project.root().join("sim/results")).unwrap().next().is_none());
}

#[test]
fn test_invalid_config_is_fatal() {
    let project = FakeProject::new();
    let config = create_invalid_toml(project.root());

    runner()
        .args(["--lang", "en", "regress", "--config"])
        .arg(&config)
        .arg("--project-dir")
        .arg(project.root())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_missing_config_file_is_fatal() {
    let project = FakeProject::new();

    runner()
        .args(["--lang", "en", "verify", "--config", "does-not-exist.toml", "--project-dir"])
        .arg(project.root())
        .assert()
        .failure();
}

#[test]
fn test_init_non_interactive_writes_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("nested/verification.toml");

    runner()
        .args(["--lang", "zh-CN", "init", "--non-interactive", "--output"])
        .arg(&output)
        .assert()
        .success();

    let written = PipelineConfig::from_toml_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(written.language, "zh-CN");
    assert_eq!(written.parallel_jobs, PipelineConfig::default().parallel_jobs);
}
