//! # Verify Command Module / 验证命令模块
//!
//! This module implements the `verify` command, which runs the sequential
//! verification pipeline, or a subset of its stages.
//!
//! 此模块实现 `verify` 命令，运行顺序验证流水线或其部分阶段。

use anyhow::Result;
use colored::*;
use std::path::PathBuf;

use crate::cli::commands::load_project;
use crate::core::config::ProjectLayout;
use crate::core::pipeline::VerificationPipeline;
use crate::core::stage::parse_stage_selection;
use crate::infra::t;
use crate::reporting::{print_failure_details, print_summary};

/// Arguments of `verify`.
#[derive(Debug, Clone)]
pub struct VerifyArgs {
    pub config: Option<PathBuf>,
    pub project_dir: PathBuf,
    /// Stage names; all stages when absent.
    pub steps: Option<Vec<String>>,
    /// Overrides the simulation timeout, in seconds.
    pub timeout: Option<u64>,
    /// Forces waveform capture on.
    pub waveform: bool,
}

/// Executes the verify command with the provided arguments.
///
/// Unknown stage names are rejected before any stage runs.
///
/// 使用提供的参数执行 verify 命令。未知的阶段名称会在任何阶段运行之前被拒绝。
pub async fn execute(args: VerifyArgs, explicit_lang: Option<&str>) -> Result<bool> {
    let selection = args
        .steps
        .as_deref()
        .map(parse_stage_selection)
        .transpose()?;

    let (project_root, mut config, locale) =
        load_project(args.config.as_deref(), &args.project_dir, explicit_lang)?;

    if let Some(timeout) = args.timeout {
        config.timeout = timeout;
    }
    if args.waveform {
        config.waveform_enabled = true;
    }

    let layout = ProjectLayout::resolve(&config, &project_root);
    let pipeline = VerificationPipeline::new(config, layout).with_locale(locale.as_str());
    let run = pipeline.run(selection.as_deref()).await;

    print_summary(&run.results, &run.summary, &locale);
    print_failure_details(&run.results, &locale);

    println!(
        "\n{}",
        t!(
            "pipeline.overall",
            locale = &locale,
            status = run.overall.as_str(),
            passed = run.summary.passed,
            total = run.summary.total_tests
        )
        .bold()
    );
    if run.is_success() {
        println!("{}", t!("pipeline.success", locale = &locale).green().bold());
    } else {
        println!("{}", t!("pipeline.failure", locale = &locale).red().bold());
    }

    Ok(run.is_success())
}
