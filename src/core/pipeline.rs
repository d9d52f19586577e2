//! # Verification Pipeline Module / 验证流水线模块
//!
//! The sequential verification flow of the top-level design: generate test
//! vectors, compile the RTL with its harness, run the simulation, analyze the
//! simulation log and write the reports. Stages are dispatched through a
//! static table indexed by [`Stage`]; the first work stage that does not pass
//! stops the flow.
//!
//! 顶层设计的顺序验证流程：生成测试向量、将 RTL 与其测试平台一起编译、运行仿真、
//! 分析仿真日志并写入报告。阶段通过以 [`Stage`] 为索引的静态表进行分派；
//! 第一个未通过的工作阶段会停止流程。

use chrono::Local;
use colored::*;
use futures::future::BoxFuture;
use serde_json::Value;
use std::fs;
use std::time::Duration;

use crate::core::analyzer::{FrameLogAnalyzer, LogAnalyzer};
use crate::core::config::{PipelineConfig, ProjectLayout};
use crate::core::error::VerifyError;
use crate::core::models::{
    Details, RunSummary, StepAttempt, StepResult, StepStatus, overall_status,
};
use crate::core::stage::Stage;
use crate::infra::command::{self, CommandOutput, CommandSpec};
use crate::infra::{fs as infra_fs, t};
use crate::reporting::{self, ReportKind, RunReport};

/// A stage implementation. It receives the results of the stages attempted
/// before it in the same run.
type StageHandler =
    for<'a> fn(&'a VerificationPipeline, &'a [StepResult]) -> BoxFuture<'a, StepResult>;

/// Dispatch table, in pipeline order.
static STAGE_TABLE: [(Stage, StageHandler); 5] = [
    (Stage::GenerateTestVectors, generate_test_vectors),
    (Stage::CompileRtl, compile_rtl),
    (Stage::RunSimulation, run_simulation),
    (Stage::AnalyzeResults, analyze_results),
    (Stage::GenerateReport, generate_report),
];

fn handler_for(stage: Stage) -> StageHandler {
    STAGE_TABLE[stage as usize].1
}

fn generate_test_vectors<'a>(
    p: &'a VerificationPipeline,
    _: &'a [StepResult],
) -> BoxFuture<'a, StepResult> {
    Box::pin(p.generate_test_vectors())
}

fn compile_rtl<'a>(
    p: &'a VerificationPipeline,
    _: &'a [StepResult],
) -> BoxFuture<'a, StepResult> {
    Box::pin(p.compile_rtl())
}

fn run_simulation<'a>(
    p: &'a VerificationPipeline,
    _: &'a [StepResult],
) -> BoxFuture<'a, StepResult> {
    Box::pin(p.run_simulation())
}

fn analyze_results<'a>(
    p: &'a VerificationPipeline,
    _: &'a [StepResult],
) -> BoxFuture<'a, StepResult> {
    Box::pin(async move { p.analyze_results() })
}

fn generate_report<'a>(
    p: &'a VerificationPipeline,
    prior: &'a [StepResult],
) -> BoxFuture<'a, StepResult> {
    Box::pin(async move { p.generate_report(prior) })
}

/// The outcome of one pipeline invocation.
/// 一次流水线调用的结果。
#[derive(Debug, Clone)]
pub struct PipelineRun {
    /// Attempted stages, in pipeline order.
    pub results: Vec<StepResult>,
    pub overall: StepStatus,
    pub summary: RunSummary,
}

impl PipelineRun {
    pub fn is_success(&self) -> bool {
        self.overall == StepStatus::Pass
    }
}

/// Runs the verification stages of one project.
/// 运行一个项目的验证阶段。
pub struct VerificationPipeline {
    config: PipelineConfig,
    layout: ProjectLayout,
    analyzer: Box<dyn LogAnalyzer>,
    locale: String,
}

impl VerificationPipeline {
    pub fn new(config: PipelineConfig, layout: ProjectLayout) -> Self {
        let locale = config.language.clone();
        Self {
            config,
            layout,
            analyzer: Box::new(FrameLogAnalyzer::new()),
            locale,
        }
    }

    /// Replaces the log analyzer used by `analyze_results`.
    pub fn with_analyzer(mut self, analyzer: Box<dyn LogAnalyzer>) -> Self {
        self.analyzer = analyzer;
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs the selected stages (all of them when `selection` is `None`) in
    /// pipeline order. The first work stage that is not PASS halts the run;
    /// `generate_report`, when selected, still runs last and reports on the
    /// stages attempted before it.
    ///
    /// 按流水线顺序运行所选阶段（`selection` 为 `None` 时运行全部阶段）。
    /// 第一个非 PASS 的工作阶段会中止运行；若选择了 `generate_report`，
    /// 它仍会最后运行，并报告之前已尝试的阶段。
    pub async fn run(&self, selection: Option<&[Stage]>) -> PipelineRun {
        let start_time = Local::now();
        let mut stages: Vec<Stage> =
            selection.map_or_else(|| Stage::ALL.to_vec(), <[Stage]>::to_vec);
        stages.sort();
        stages.dedup();

        let names: Vec<&str> = stages.iter().map(|s| s.name()).collect();
        println!(
            "{}",
            t!("pipeline.starting", locale = &self.locale, stages = names.join(", ")).bold()
        );

        let mut results = Vec::with_capacity(stages.len());
        for &stage in stages.iter().filter(|s| **s != Stage::GenerateReport) {
            let result = self.run_stage(stage, &results).await;
            let halted = result.status != StepStatus::Pass;
            results.push(result);
            if halted {
                println!(
                    "{}",
                    t!("pipeline.halted", locale = &self.locale, stage = stage.name()).red()
                );
                break;
            }
        }

        if stages.contains(&Stage::GenerateReport) {
            let report = self.run_stage(Stage::GenerateReport, &results).await;
            results.push(report);
        }

        let summary = RunSummary::from_results(&results, start_time, Local::now());
        PipelineRun {
            overall: overall_status(&results),
            results,
            summary,
        }
    }

    async fn run_stage(&self, stage: Stage, prior: &[StepResult]) -> StepResult {
        println!(
            "{}",
            t!(
                "pipeline.stage_banner",
                locale = &self.locale,
                index = stage.ordinal(),
                name = stage.name()
            )
            .blue()
        );
        let result = handler_for(stage)(self, prior).await;
        let label = result.status.label(&self.locale);
        let label = if result.status == StepStatus::Pass {
            label.green()
        } else {
            label.red()
        };
        println!(
            "{}",
            t!(
                "pipeline.stage_finished",
                locale = &self.locale,
                name = stage.name(),
                status = label,
                duration = format!("{:.2}", result.duration.as_secs_f64())
            )
        );
        result
    }

    /// Runs the test vector generator.
    pub async fn generate_test_vectors(&self) -> StepResult {
        let attempt = StepAttempt::new(Stage::GenerateTestVectors.name()).start();
        let tools = &self.config.tools;

        let spec = match CommandSpec::parse(&tools.vector_generator) {
            Ok(spec) => spec,
            Err(e) => return attempt.finish(StepStatus::Error, error_details(format!("{e:#}"))),
        };
        let output = command::execute(
            &spec,
            &self.layout.root,
            Duration::from_secs(tools.vector_timeout),
        )
        .await;

        if output.success {
            let mut details = Details::new();
            details.insert("stdout".into(), output.stdout.into());
            return attempt.finish(StepStatus::Pass, details);
        }
        if let Some(err) = abnormal_exit(&spec.program, &output, tools.vector_timeout) {
            return attempt.finish(err.status(), error_output(&err, &output));
        }

        let mut details = Details::new();
        details.insert("returncode".into(), returncode(&output));
        details.insert("stderr".into(), output.stderr.into());
        attempt.finish(StepStatus::Fail, details)
    }

    /// Compiles the required design sources together with the harness.
    pub async fn compile_rtl(&self) -> StepResult {
        let attempt = StepAttempt::new(Stage::CompileRtl.name()).start();
        let tools = &self.config.tools;
        let verification = &self.config.verification;

        let sources: Vec<_> = verification
            .required_sources
            .iter()
            .map(|p| self.layout.path(p))
            .collect();
        let harness = self.layout.path(&verification.harness);

        let missing = infra_fs::missing_files(sources.iter().chain(std::iter::once(&harness)));
        if !missing.is_empty() {
            let err = VerifyError::MissingArtifact { paths: missing };
            return attempt.finish(err.status(), missing_details(&err));
        }

        if let Err(e) = infra_fs::ensure_dir(&self.layout.results_dir) {
            return attempt.finish(StepStatus::Error, error_details(format!("{e:#}")));
        }

        let artifact = self.layout.result_file(&verification.artifact);
        let spec = CommandSpec::new(tools.compiler.as_str())
            .args(tools.compiler_flags.iter().cloned())
            .args(self.layout.include_dirs.iter().map(|d| format!("-I{}", d.display())))
            .arg("-o")
            .arg(artifact.display().to_string())
            .arg(harness.display().to_string())
            .args(sources.iter().map(|p| p.display().to_string()));

        let output = command::execute(
            &spec,
            &self.layout.root,
            Duration::from_secs(tools.compile_timeout),
        )
        .await;

        if output.success {
            let mut details = Details::new();
            details.insert("artifact".into(), artifact.display().to_string().into());
            return attempt.finish(StepStatus::Pass, details);
        }

        let err = abnormal_exit(&spec.program, &output, tools.compile_timeout).unwrap_or(
            VerifyError::Compile {
                exit_code: output.exit_code,
                stderr: output.stderr.clone(),
            },
        );
        attempt.finish(err.status(), error_output(&err, &output))
    }

    /// Runs the compiled simulation and saves its output to the log file.
    pub async fn run_simulation(&self) -> StepResult {
        let attempt = StepAttempt::new(Stage::RunSimulation.name()).start();
        let verification = &self.config.verification;
        let artifact = self.layout.result_file(&verification.artifact);

        if !artifact.exists() {
            let err = VerifyError::MissingArtifact {
                paths: vec![artifact],
            };
            return attempt.finish(err.status(), missing_details(&err));
        }

        let mut spec = match self.config.tools.simulator_runner.as_deref() {
            Some(runner) => match CommandSpec::parse(runner) {
                Ok(spec) => spec.arg(artifact.display().to_string()),
                Err(e) => {
                    return attempt.finish(StepStatus::Error, error_details(format!("{e:#}")));
                }
            },
            None => CommandSpec::new(artifact.display().to_string()),
        };
        spec = spec.current_dir(&self.layout.results_dir);
        if self.config.waveform_enabled {
            let vcd = self.layout.result_file(&verification.waveform_file);
            spec = spec.env(verification.waveform_env.as_str(), vcd.display().to_string());
        }

        let output = command::execute(
            &spec,
            &self.layout.root,
            Duration::from_secs(self.config.timeout),
        )
        .await;

        let log_path = self.layout.result_file(&verification.log_file);
        let log = format!(
            "=== STDOUT ===\n{}\n=== STDERR ===\n{}",
            output.stdout, output.stderr
        );
        if let Err(e) = infra_fs::write_artifact(&log_path, log) {
            log::warn!("{e:#}");
        }

        let mut details = Details::new();
        details.insert("runtime".into(), output.duration.as_secs_f64().into());

        if output.success {
            return attempt.finish(StepStatus::Pass, details);
        }

        let err = abnormal_exit(&spec.program, &output, self.config.timeout).unwrap_or_else(|| {
            VerifyError::Simulation {
                tool: spec.program.clone(),
                message: format!("exit code {}", returncode(&output)),
            }
        });
        details.extend(error_output(&err, &output));
        attempt.finish(err.status(), details)
    }

    /// Parses the simulation log and checks the frame pass rate.
    pub fn analyze_results(&self) -> StepResult {
        let attempt = StepAttempt::new(Stage::AnalyzeResults.name()).start();
        let log_path = self.layout.result_file(&self.config.verification.log_file);

        if !log_path.exists() {
            let err = VerifyError::MissingArtifact {
                paths: vec![log_path],
            };
            return attempt.finish(err.status(), missing_details(&err));
        }

        let text = match fs::read(&log_path) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                return attempt.finish(
                    StepStatus::Error,
                    error_details(format!("cannot read {}: {}", log_path.display(), e)),
                );
            }
        };

        let analysis = self.analyzer.analyze(&text);
        let threshold = self.config.thresholds.pass_rate;
        let quality = analysis.quality(&self.config.thresholds.quality_policy());
        let passed = analysis.meets(threshold);

        let rate = format!("{:.1}", analysis.pass_rate);
        let threshold_text = format!("{:.1}", threshold);
        let message = if passed {
            t!(
                "pipeline.analysis_passed",
                locale = &self.locale,
                rate = rate,
                threshold = threshold_text,
                grade = quality.grade.as_str()
            )
            .green()
        } else {
            t!(
                "pipeline.analysis_failed",
                locale = &self.locale,
                rate = rate,
                threshold = threshold_text,
                grade = quality.grade.as_str()
            )
            .red()
        };
        println!("{message}");

        let mut details = match serde_json::to_value(&analysis) {
            Ok(Value::Object(map)) => map,
            _ => Details::new(),
        };
        details.insert("threshold".into(), threshold.into());
        details.insert(
            "quality".into(),
            serde_json::to_value(quality).unwrap_or(Value::Null),
        );

        let status = if passed {
            StepStatus::Pass
        } else {
            StepStatus::Fail
        };
        attempt.finish(status, details)
    }

    /// Writes the structured, text and HTML reports for `prior`.
    pub fn generate_report(&self, prior: &[StepResult]) -> StepResult {
        let attempt = StepAttempt::new(Stage::GenerateReport.name()).start();
        let start_time = prior.first().map_or_else(Local::now, |r| r.timestamp);
        let summary = RunSummary::from_results(prior, start_time, Local::now());
        let report = RunReport::new(ReportKind::Verification, prior.to_vec(), summary, &self.config)
            .with_locale(self.locale.as_str());

        match reporting::write_reports(&report, &self.layout.results_dir) {
            Ok(artifacts) => {
                println!(
                    "{}",
                    t!(
                        "report.written",
                        locale = &self.locale,
                        path = artifacts.json.display()
                    )
                );
                let details = match serde_json::to_value(&artifacts) {
                    Ok(Value::Object(map)) => map,
                    _ => Details::new(),
                };
                attempt.finish(StepStatus::Pass, details)
            }
            Err(e) => attempt.finish(e.status(), error_details(e.to_string())),
        }
    }
}

/// Maps a timeout or a launch failure to its error; `None` for an ordinary
/// non-zero exit.
fn abnormal_exit(tool: &str, output: &CommandOutput, seconds: u64) -> Option<VerifyError> {
    if output.timed_out {
        Some(VerifyError::SimulationTimeout {
            tool: tool.to_string(),
            seconds,
        })
    } else if !output.launched {
        Some(VerifyError::Simulation {
            tool: tool.to_string(),
            message: output.stderr.clone(),
        })
    } else {
        None
    }
}

fn error_output(err: &VerifyError, output: &CommandOutput) -> Details {
    let mut details = error_details(err.to_string());
    details.insert("stderr".into(), output.stderr.clone().into());
    if let Some(code) = output.exit_code {
        details.insert("returncode".into(), code.into());
    }
    details
}

fn missing_details(err: &VerifyError) -> Details {
    let mut details = error_details(err.to_string());
    if let VerifyError::MissingArtifact { paths } = err {
        details.insert(
            "missing_files".into(),
            paths.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().into(),
        );
    }
    details
}

fn error_details(message: String) -> Details {
    let mut details = Details::new();
    details.insert("error".into(), message.into());
    details
}

fn returncode(output: &CommandOutput) -> Value {
    output.exit_code.map(Value::from).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_in_pipeline_order() {
        for (i, (stage, _)) in STAGE_TABLE.iter().enumerate() {
            assert_eq!(*stage, Stage::ALL[i]);
        }
    }

    #[test]
    fn timeout_maps_to_error() {
        let output = CommandOutput {
            success: false,
            exit_code: None,
            stdout: String::new(),
            stderr: command::TIMEOUT_MARKER.to_string(),
            timed_out: true,
            launched: true,
            duration: Duration::from_secs(5),
        };
        let err = abnormal_exit("sim", &output, 5).unwrap();
        assert_eq!(err.status(), StepStatus::Error);
        let details = error_output(&err, &output);
        assert_eq!(details["stderr"], "Timeout");
    }

    #[test]
    fn missing_files_are_listed() {
        let err = VerifyError::MissingArtifact {
            paths: vec!["rtl/top.v".into()],
        };
        let details = missing_details(&err);
        assert_eq!(details["missing_files"][0], "rtl/top.v");
    }
}
