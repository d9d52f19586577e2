//! # Regression Suite Runner Module / 回归套件运行模块
//!
//! Runs the catalogued regression tests of an [`ExecutionPlan`] on a bounded
//! worker pool. Each test is compiled with the configured compiler and then
//! simulated; its outcome is classified into a [`StepResult`]. Failures of
//! one test never affect the others, and the results are returned in
//! declaration order whatever the completion order was.
//!
//! 在有界工作池上运行 [`ExecutionPlan`] 中的回归测试。每个测试先用配置的编译器编译，
//! 然后进行仿真；其结果被分类为 [`StepResult`]。一个测试的失败不会影响其他测试，
//! 并且无论完成顺序如何，结果都按声明顺序返回。

use chrono::Local;
use colored::*;
use futures::{StreamExt, stream};
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::core::config::{PipelineConfig, ProjectLayout};
use crate::core::models::{Details, RunSummary, StepAttempt, StepResult, StepStatus};
use crate::core::planner::{ExecutionPlan, PlannedTest};
use crate::infra::command::{self, CommandOutput, CommandSpec};
use crate::infra::{fs as infra_fs, t};

/// Name of the coverage pseudo-step appended to full regression runs.
pub const COVERAGE_STEP: &str = "coverage_analysis";

/// Metrics read from the coverage tool's output.
pub const COVERAGE_METRICS: [&str; 4] = [
    "line_coverage",
    "branch_coverage",
    "toggle_coverage",
    "functional_coverage",
];

/// The outcome of one regression invocation.
/// 一次回归调用的结果。
#[derive(Debug, Clone)]
pub struct SuiteRun {
    /// Test results in declaration order, then the coverage step if any.
    pub results: Vec<StepResult>,
    pub summary: RunSummary,
}

/// Everything a single test needs, shared read-only between workers.
/// 单个测试所需的全部内容，在工作任务之间只读共享。
#[derive(Debug)]
struct TestContext {
    config: PipelineConfig,
    layout: ProjectLayout,
    /// Design sources, discovered once per run.
    sources: Vec<PathBuf>,
    locale: String,
}

/// Drives regression suites for one project.
/// 为一个项目驱动回归套件。
pub struct RegressionRunner {
    config: PipelineConfig,
    layout: ProjectLayout,
    locale: String,
}

impl RegressionRunner {
    pub fn new(config: PipelineConfig, layout: ProjectLayout) -> Self {
        let locale = config.language.clone();
        Self {
            config,
            layout,
            locale,
        }
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    /// Runs every test of `plan`, at most `parallel_jobs` at a time, then the
    /// coverage step when the plan asks for it. Cancelling `stop_token` turns
    /// every test that has not finished yet into SKIP.
    ///
    /// 运行 `plan` 中的每个测试，同时最多运行 `parallel_jobs` 个，
    /// 如果计划需要，随后运行覆盖率步骤。取消 `stop_token` 会将所有尚未完成的测试变为 SKIP。
    pub async fn run(&self, plan: &ExecutionPlan, stop_token: CancellationToken) -> SuiteRun {
        let start_time = Local::now();

        if let Err(e) = infra_fs::ensure_dir(&self.layout.results_dir) {
            log::warn!("{e:#}");
        }

        let sources =
            infra_fs::discover_sources(&self.layout.rtl_dir, &self.config.paths.source_extensions);
        log::debug!(
            "{} design sources under {}",
            sources.len(),
            self.layout.rtl_dir.display()
        );

        let ctx = Arc::new(TestContext {
            config: self.config.clone(),
            layout: self.layout.clone(),
            sources,
            locale: self.locale.clone(),
        });

        for suite in &plan.suites {
            println!(
                "{}",
                t!(
                    "suite.running",
                    locale = &self.locale,
                    suite = suite.name(),
                    count = plan.tests_in(*suite).count()
                )
                .bold()
            );
        }

        let mut results = run_tests(
            plan.tests.clone(),
            self.config.parallel_jobs,
            ctx,
            stop_token.clone(),
        )
        .await;

        if plan.coverage_enabled {
            let coverage = if stop_token.is_cancelled() {
                StepResult::skipped(COVERAGE_STEP, reason("cancelled"))
            } else {
                self.run_coverage().await
            };
            results.push(coverage);
        }

        let summary = RunSummary::from_results(&results, start_time, Local::now());
        SuiteRun { results, summary }
    }

    /// Runs the configured coverage tool and reads its percentages.
    /// 运行配置的覆盖率工具并读取其百分比。
    pub async fn run_coverage(&self) -> StepResult {
        let attempt = StepAttempt::new(COVERAGE_STEP).start();

        let Some(command_line) = self.config.tools.coverage.as_deref() else {
            return attempt.finish(StepStatus::Skip, reason("no coverage tool configured"));
        };

        println!("{}", t!("suite.coverage_running", locale = &self.locale).blue());

        let spec = match CommandSpec::parse(command_line) {
            Ok(spec) => spec,
            Err(e) => return attempt.finish(StepStatus::Error, error_details(format!("{e:#}"))),
        };

        let output = command::execute(
            &spec,
            &self.layout.root,
            Duration::from_secs(self.config.timeout),
        )
        .await;

        if !output.success {
            let mut details = error_details(if output.timed_out {
                "Coverage timeout".to_string()
            } else {
                "Coverage analysis failed".to_string()
            });
            details.insert("stderr".into(), output.stderr.into());
            return attempt.finish(StepStatus::Error, details);
        }

        let mut details = Details::new();
        details.insert("coverage".into(), Value::Object(parse_coverage(&output.stdout)));
        attempt.finish(StepStatus::Pass, details)
    }
}

/// Runs the tests on a pool of `jobs` workers and returns their results in
/// declaration order.
async fn run_tests(
    tests: Vec<PlannedTest>,
    jobs: usize,
    ctx: Arc<TestContext>,
    stop_token: CancellationToken,
) -> Vec<StepResult> {
    let finished = stream::iter(tests.into_iter().map(|test| {
        let ctx = Arc::clone(&ctx);
        let stop_token = stop_token.clone();
        let name = test.spec.name;

        let worker = tokio::spawn(async move {
            if stop_token.is_cancelled() {
                return StepResult::skipped(name, reason("cancelled"));
            }

            let mut handle = tokio::spawn(run_test(test, ctx));

            tokio::select! {
                biased;
                _ = stop_token.cancelled() => {
                    // Dropping the task drops its child process, which is killed.
                    handle.abort();
                    StepResult::skipped(name, reason("cancelled"))
                }
                joined = &mut handle => match joined {
                    Ok(result) => result,
                    Err(e) => crashed(name, &e),
                },
            }
        });

        async move {
            let result = match worker.await {
                Ok(result) => result,
                Err(e) => crashed(name, &e),
            };
            (test.index, result)
        }
    }))
    .buffer_unordered(jobs.max(1))
    .collect::<Vec<(usize, StepResult)>>()
    .await;

    into_declaration_order(finished)
}

/// Restores declaration order from `(index, result)` pairs collected in
/// completion order.
/// 从按完成顺序收集的 `(index, result)` 对中恢复声明顺序。
pub fn into_declaration_order(mut finished: Vec<(usize, StepResult)>) -> Vec<StepResult> {
    finished.sort_by_key(|(index, _)| *index);
    finished.into_iter().map(|(_, result)| result).collect()
}

/// Compiles and simulates one test.
async fn run_test(test: PlannedTest, ctx: Arc<TestContext>) -> StepResult {
    let name = test.spec.name;
    let attempt = StepAttempt::new(name).start();
    let tools = &ctx.config.tools;
    let artifact = ctx.layout.result_file(name);

    println!("{}", t!("suite.test_started", locale = &ctx.locale, name = name).blue());

    // Build
    let compile = CommandSpec::new(tools.compiler.as_str())
        .args(tools.compiler_flags.iter().cloned())
        .args(ctx.layout.include_dirs.iter().map(|d| format!("-I{}", d.display())))
        .arg("-o")
        .arg(artifact.display().to_string())
        .arg(ctx.layout.testbench_dir.join(test.spec.testbench).display().to_string())
        .args(ctx.sources.iter().map(|p| p.display().to_string()));

    let compiled = command::execute(
        &compile,
        &ctx.layout.root,
        Duration::from_secs(tools.compile_timeout),
    )
    .await;

    if !compiled.success {
        write_test_log(&ctx, name, &compiled);
        let result = attempt.finish(StepStatus::Error, compile_failure(&compiled));
        report_test(&ctx.locale, &result);
        return result;
    }

    // Run
    let run = match tools.simulator_runner.as_deref() {
        Some(runner) => match CommandSpec::parse(runner) {
            Ok(spec) => spec.arg(artifact.display().to_string()),
            Err(e) => {
                let result = attempt.finish(StepStatus::Error, error_details(format!("{e:#}")));
                report_test(&ctx.locale, &result);
                return result;
            }
        },
        None => CommandSpec::new(artifact.display().to_string()),
    };

    let simulated = command::execute(
        &run,
        &ctx.layout.root,
        Duration::from_secs(ctx.config.timeout),
    )
    .await;
    write_test_log(&ctx, name, &simulated);

    let (status, details) = classify_simulation(&simulated, &tools.success_marker);
    let result = attempt.finish(status, details);
    report_test(&ctx.locale, &result);
    result
}

/// Classifies a compile step that did not succeed.
fn compile_failure(output: &CommandOutput) -> Details {
    if output.timed_out {
        return error_details("Test timeout".to_string());
    }
    let mut details = error_details("Compilation failed".to_string());
    details.insert("stderr".into(), output.stderr.clone().into());
    if let Some(code) = output.exit_code {
        details.insert("returncode".into(), code.into());
    }
    details
}

/// Classifies the simulation step of a regression test.
///
/// * timeout → ERROR {error: "Test timeout"}
/// * launch failure → ERROR {error}
/// * exit 0 with `marker` on stdout → PASS {stdout}
/// * anything else → FAIL {stdout, stderr, returncode}
///
/// 对回归测试的仿真步骤进行分类。
pub fn classify_simulation(output: &CommandOutput, marker: &str) -> (StepStatus, Details) {
    let mut details = Details::new();

    if output.timed_out {
        details.insert("error".into(), "Test timeout".into());
        return (StepStatus::Error, details);
    }

    if !output.launched {
        details.insert("error".into(), output.stderr.clone().into());
        return (StepStatus::Error, details);
    }

    details.insert("stdout".into(), output.stdout.clone().into());
    if output.success && output.stdout.contains(marker) {
        return (StepStatus::Pass, details);
    }

    details.insert("stderr".into(), output.stderr.clone().into());
    details.insert(
        "returncode".into(),
        output.exit_code.map(Value::from).unwrap_or(Value::Null),
    );
    (StepStatus::Fail, details)
}

/// Extracts the coverage percentages from a coverage tool's stdout.
/// Lines look like `line_coverage: 87.5` or `Line coverage = 87.5%`;
/// metrics that are absent or unreadable are left out.
///
/// 从覆盖率工具的 stdout 中提取覆盖率百分比。
pub fn parse_coverage(stdout: &str) -> Details {
    let mut coverage = Details::new();

    for line in stdout.lines() {
        let Some((label, value)) = line.split_once([':', '=']) else {
            continue;
        };
        let key = label.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        if !COVERAGE_METRICS.contains(&key.as_str()) {
            continue;
        }
        match value.trim().trim_end_matches('%').trim().parse::<f64>() {
            Ok(v) if v.is_finite() => {
                coverage.insert(key, json!(v.clamp(0.0, 100.0)));
            }
            _ => log::debug!("unreadable coverage value in line: {}", line.trim()),
        }
    }

    coverage
}

fn write_test_log(ctx: &TestContext, name: &str, output: &CommandOutput) {
    let path = ctx.layout.result_file(&format!("{}.log", infra_fs::sanitize_name(name)));
    if let Err(e) = infra_fs::write_artifact(&path, output.combined()) {
        log::warn!("{e:#}");
    }
}

fn report_test(locale: &str, result: &StepResult) {
    let label = result.status.label(locale);
    let label = match result.status {
        StepStatus::Pass => label.green(),
        StepStatus::Fail => label.red(),
        StepStatus::Error => label.red().bold(),
        _ => label.dimmed(),
    };
    println!(
        "{}",
        t!(
            "suite.test_finished",
            locale = locale,
            name = result.name.as_str(),
            status = label,
            duration = format!("{:.2?}", result.duration)
        )
    );
}

fn crashed(name: &str, e: &tokio::task::JoinError) -> StepResult {
    StepAttempt::new(name)
        .start()
        .finish(StepStatus::Error, error_details(format!("test task failed: {e}")))
}

fn error_details(message: String) -> Details {
    let mut details = Details::new();
    details.insert("error".into(), message.into());
    details
}

fn reason(text: &str) -> Details {
    let mut details = Details::new();
    details.insert("reason".into(), text.into());
    details
}
