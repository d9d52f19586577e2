//! # Regress Command Module / 回归命令模块
//!
//! This module implements the `regress` command, which runs the configured
//! regression suites and writes the regression report.
//!
//! 此模块实现 `regress` 命令，运行已配置的回归套件并写入回归报告。

use anyhow::Result;
use colored::*;
use std::path::PathBuf;

use crate::cli::commands::{load_project, setup_signal_handler};
use crate::core::config::{ProjectLayout, SuiteKind};
use crate::core::planner;
use crate::core::suite::RegressionRunner;
use crate::infra::t;
use crate::reporting::{self, ReportKind, RunReport, print_failure_details, print_summary};

/// Arguments of `regress`.
#[derive(Debug, Clone)]
pub struct RegressArgs {
    pub config: Option<PathBuf>,
    pub project_dir: PathBuf,
    /// A suite name or `all`.
    pub suite: String,
    pub jobs: Option<usize>,
    /// Forces the coverage step on.
    pub coverage: bool,
}

/// Executes the regress command with the provided arguments.
///
/// # Returns
/// `Ok(true)` when no test ended in FAIL or ERROR.
///
/// 使用提供的参数执行 regress 命令。没有测试以 FAIL 或 ERROR 结束时返回 `Ok(true)`。
pub async fn execute(args: RegressArgs, explicit_lang: Option<&str>) -> Result<bool> {
    let (project_root, mut config, locale) =
        load_project(args.config.as_deref(), &args.project_dir, explicit_lang)?;

    let only = match args.suite.as_str() {
        "all" => None,
        name => Some(name.parse::<SuiteKind>()?),
    };
    if let Some(jobs) = args.jobs {
        config.parallel_jobs = jobs;
    }
    if args.coverage {
        config.coverage_enabled = true;
    }

    let layout = ProjectLayout::resolve(&config, &project_root);
    let mut plan = planner::plan_execution(&config, only);
    if args.coverage {
        plan = plan.with_coverage();
    }

    if plan.tests.is_empty() {
        println!("{}", t!("suite.no_tests", locale = &locale).yellow());
        return Ok(true);
    }

    println!(
        "{}",
        t!(
            "suite.starting",
            locale = &locale,
            count = plan.tests.len(),
            jobs = config.parallel_jobs
        )
        .bold()
    );

    let stop_token = setup_signal_handler(&locale);
    let run = RegressionRunner::new(config.clone(), layout.clone())
        .with_locale(locale.as_str())
        .run(&plan, stop_token)
        .await;

    print_summary(&run.results, &run.summary, &locale);
    print_failure_details(&run.results, &locale);

    let report = RunReport::new(
        ReportKind::Regression,
        run.results.clone(),
        run.summary.clone(),
        &config,
    )
    .with_locale(locale.as_str());
    // A report that cannot be written does not change the outcome.
    match reporting::write_reports(&report, &layout.results_dir) {
        Ok(artifacts) => println!(
            "{}",
            t!("report.written", locale = &locale, path = artifacts.json.display())
        ),
        Err(e) => eprintln!("{} {}", t!("report.write_failed", locale = &locale).red(), e),
    }

    let success = run.summary.is_success();
    if success {
        println!("\n{}", t!("suite.all_passed", locale = &locale).green().bold());
    } else {
        println!("\n{}", t!("suite.some_failed", locale = &locale).red().bold());
    }
    Ok(success)
}
