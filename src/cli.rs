//! # Command-Line Interface / 命令行接口
//!
//! Builds the `clap` command tree with localized help text and dispatches to
//! the `regress`, `verify` and `init` commands.
//!
//! 使用本地化的帮助文本构建 `clap` 命令树，并分派到 `regress`、`verify` 和 `init` 命令。

pub mod commands;

use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::{env, path::PathBuf};

use crate::infra::t;

/// Suite names accepted by `regress --suite`.
pub const SUITE_CHOICES: [&str; 5] = ["unit", "module", "system", "performance", "all"];

/// Pre-parses the command line arguments to find the language setting.
/// This allows i18n to be initialized before the full CLI is built.
/// It looks for a `--lang <VALUE>` or `--lang=<VALUE>` argument.
///
/// 预解析命令行参数以查找语言设置，以便在构建完整 CLI 之前初始化 i18n。
pub fn pre_parse_language() -> Option<String> {
    let args: Vec<String> = env::args().collect();
    if let Some(pos) = args.iter().position(|arg| arg == "--lang") {
        return args.get(pos + 1).cloned();
    }
    args.iter()
        .find_map(|arg| arg.strip_prefix("--lang="))
        .map(str::to_string)
}

/// `true` when `--verbose` (or `-v`) appears on the command line, so that
/// logging can be set up before argument parsing.
pub fn pre_parse_verbose() -> bool {
    env::args().skip(1).any(|arg| arg == "--verbose" || arg == "-v")
}

fn config_arg(locale: &str) -> Arg {
    Arg::new("config")
        .short('c')
        .long("config")
        .help(t!("cli.arg_config", locale = locale).to_string())
        .value_name("CONFIG")
        .value_parser(clap::value_parser!(PathBuf))
        .action(ArgAction::Set)
}

fn project_dir_arg(locale: &str) -> Arg {
    Arg::new("project-dir")
        .long("project-dir")
        .help(t!("cli.arg_project_dir", locale = locale).to_string())
        .value_name("PROJECT_DIR")
        .default_value(".")
        .value_parser(clap::value_parser!(PathBuf))
        .action(ArgAction::Set)
}

pub fn build_cli(locale: &str) -> Command {
    Command::new("verification-runner")
        .version(env!("CARGO_PKG_VERSION"))
        .about(t!("cli.about", locale = locale).to_string())
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("lang")
                .long("lang")
                .help(t!("cli.arg_lang", locale = locale).to_string())
                .value_name("LANGUAGE")
                .global(true)
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help(t!("cli.arg_verbose", locale = locale).to_string())
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("regress")
                .about(t!("cli.cmd_regress_about", locale = locale).to_string())
                .arg(config_arg(locale))
                .arg(project_dir_arg(locale))
                .arg(
                    Arg::new("suite")
                        .short('s')
                        .long("suite")
                        .help(t!("cli.arg_suite", locale = locale).to_string())
                        .value_name("SUITE")
                        .default_value("all")
                        .value_parser(SUITE_CHOICES)
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("jobs")
                        .short('j')
                        .long("jobs")
                        .help(t!("cli.arg_jobs", locale = locale).to_string())
                        .value_name("JOBS")
                        .value_parser(clap::value_parser!(u32).range(1..))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("coverage")
                        .long("coverage")
                        .help(t!("cli.arg_coverage", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("verify")
                .about(t!("cli.cmd_verify_about", locale = locale).to_string())
                .arg(config_arg(locale))
                .arg(project_dir_arg(locale))
                .arg(
                    Arg::new("steps")
                        .long("steps")
                        .help(t!("cli.arg_steps", locale = locale).to_string())
                        .value_name("STEP")
                        .num_args(1..)
                        .action(ArgAction::Append),
                )
                .arg(
                    Arg::new("timeout")
                        .long("timeout")
                        .help(t!("cli.arg_timeout", locale = locale).to_string())
                        .value_name("SECONDS")
                        .value_parser(clap::value_parser!(u64).range(1..))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("waveform")
                        .long("waveform")
                        .help(t!("cli.arg_waveform", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("init")
                .about(t!("cli.cmd_init_about", locale = locale).to_string())
                .arg(
                    Arg::new("non-interactive")
                        .long("non-interactive")
                        .help(t!("cli.arg_non_interactive", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .help(t!("cli.arg_output", locale = locale).to_string())
                        .value_name("PATH")
                        .default_value(crate::core::config::DEFAULT_CONFIG_FILE)
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                ),
        )
}

/// Parses the command line and runs the selected command.
///
/// # Returns
/// `Ok(true)` when every attempted unit of work passed, `Ok(false)` when
/// any of them failed, `Err` for configuration and usage errors.
///
/// 解析命令行并运行所选命令。所有已尝试的工作单元都通过时返回 `Ok(true)`，
/// 任一失败时返回 `Ok(false)`，配置和用法错误返回 `Err`。
pub async fn run() -> Result<bool> {
    // Pre-parse language and initialize i18n first.
    let explicit_lang = pre_parse_language();
    let language = explicit_lang.clone().unwrap_or_else(crate::detect_locale);
    rust_i18n::set_locale(&language);

    let matches = build_cli(&language).get_matches();

    match matches.subcommand() {
        Some(("regress", sub)) => {
            commands::regress::execute(regress_args(sub), explicit_lang.as_deref()).await
        }
        Some(("verify", sub)) => {
            commands::verify::execute(verify_args(sub), explicit_lang.as_deref()).await
        }
        Some(("init", sub)) => {
            let non_interactive = sub.get_flag("non-interactive");
            let output = sub
                .get_one::<PathBuf>("output")
                .cloned()
                .unwrap_or_else(|| PathBuf::from(crate::core::config::DEFAULT_CONFIG_FILE));

            if explicit_lang.is_none() {
                println!(
                    "{}",
                    t!("cli.system_language_detected", locale = &language, lang = &language)
                );
            }
            commands::init::run_init_wizard(&language, &output, non_interactive)?;
            Ok(true)
        }
        // `subcommand_required` makes clap print help and exit before this.
        _ => Ok(true),
    }
}

fn project_dir(sub: &ArgMatches) -> PathBuf {
    sub.get_one::<PathBuf>("project-dir")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("."))
}

fn regress_args(sub: &ArgMatches) -> commands::regress::RegressArgs {
    commands::regress::RegressArgs {
        config: sub.get_one::<PathBuf>("config").cloned(),
        project_dir: project_dir(sub),
        suite: sub
            .get_one::<String>("suite")
            .cloned()
            .unwrap_or_else(|| "all".to_string()),
        jobs: sub.get_one::<u32>("jobs").map(|j| *j as usize),
        coverage: sub.get_flag("coverage"),
    }
}

fn verify_args(sub: &ArgMatches) -> commands::verify::VerifyArgs {
    commands::verify::VerifyArgs {
        config: sub.get_one::<PathBuf>("config").cloned(),
        project_dir: project_dir(sub),
        steps: sub
            .get_many::<String>("steps")
            .map(|steps| steps.cloned().collect()),
        timeout: sub.get_one::<u64>("timeout").copied(),
        waveform: sub.get_flag("waveform"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        build_cli("en").debug_assert();
    }

    #[test]
    fn verify_collects_steps() {
        let matches = build_cli("en")
            .try_get_matches_from([
                "verification-runner",
                "verify",
                "--steps",
                "compile_rtl",
                "run_simulation",
                "--timeout",
                "5",
            ])
            .unwrap();
        let (_, sub) = matches.subcommand().unwrap();
        let args = verify_args(sub);
        assert_eq!(
            args.steps,
            Some(vec!["compile_rtl".to_string(), "run_simulation".to_string()])
        );
        assert_eq!(args.timeout, Some(5));
        assert!(!args.waveform);
    }

    #[test]
    fn unknown_suite_is_rejected_by_the_parser() {
        let result = build_cli("en").try_get_matches_from([
            "verification-runner",
            "regress",
            "--suite",
            "smoke",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn zero_jobs_is_rejected() {
        let result = build_cli("en").try_get_matches_from([
            "verification-runner",
            "regress",
            "--jobs",
            "0",
        ]);
        assert!(result.is_err());
    }
}
