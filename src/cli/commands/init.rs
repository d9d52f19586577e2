//! # Configuration Initialization Module / 配置初始化模块
//!
//! This module provides the `init` command: an interactive command-line
//! wizard that writes a `verification.toml` for the current project, or the
//! built-in defaults when run non-interactively.
//!
//! 此模块提供 `init` 命令：一个为当前项目写入 `verification.toml` 的交互式命令行向导，
//! 非交互运行时则写入内置默认值。
//!
//! ## Features / 功能特性
//!
//! - **Interactive Wizard**: Step-by-step guidance for configuration setup
//! - **Suite Selection**: Pick the regression suites to run
//! - **Overwrite Protection**: Confirmation prompts before overwriting existing configurations
//!
//! - **交互式向导**: 配置设置的逐步指导
//! - **套件选择**: 选择要运行的回归套件
//! - **覆盖保护**: 覆盖现有配置前的确认提示

use anyhow::{Context, Result};
use colored::*;
use dialoguer::{Confirm, Input, MultiSelect, Select, theme::ColorfulTheme};
use std::fs;
use std::path::Path;

use crate::core::config::{PipelineConfig, SuiteKind};
use crate::infra::t;

const LANGUAGES: [&str; 2] = ["en", "zh-CN"];

/// Runs the interactive wizard to generate the configuration file at `output`.
///
/// 运行交互式向导，在 `output` 处生成配置文件。
pub fn run_init_wizard(language: &str, output: &Path, non_interactive: bool) -> Result<()> {
    let theme = ColorfulTheme::default();

    if non_interactive {
        let config = PipelineConfig {
            language: language_or_default(language),
            ..PipelineConfig::default()
        };
        return write_config(output, &config, language);
    }

    println!("\n{}", t!("init.welcome", locale = language).cyan().bold());
    println!("{}", t!("init.description", locale = language));

    if output.exists() {
        let confirmation = Confirm::with_theme(&theme)
            .with_prompt(t!("init.overwrite_prompt", locale = language, path = output.display()))
            .default(false)
            .interact()
            .context(t!("init.user_confirmation_failed", locale = language).to_string())?;
        if !confirmation {
            println!("{}", t!("init.aborted", locale = language));
            return Ok(());
        }
    }

    let mut config = PipelineConfig::default();

    let default_lang = LANGUAGES.iter().position(|l| *l == language).unwrap_or(0);
    let lang_index = Select::with_theme(&theme)
        .with_prompt(t!("init.language_prompt", locale = language))
        .items(&LANGUAGES)
        .default(default_lang)
        .interact()
        .context(t!("init.user_confirmation_failed", locale = language).to_string())?;
    config.language = LANGUAGES[lang_index].to_string();

    let suite_names: Vec<&str> = SuiteKind::ALL.iter().map(|s| s.name()).collect();
    let selections = MultiSelect::with_theme(&theme)
        .with_prompt(t!("init.suite_selection_prompt", locale = language))
        .items(&suite_names)
        .defaults(&[true; 4])
        .interact()
        .context(t!("init.user_confirmation_failed", locale = language).to_string())?;
    if selections.is_empty() {
        println!("{}", t!("init.no_suites_selected", locale = language).yellow());
    } else {
        config.test_suites = selections.into_iter().map(|i| SuiteKind::ALL[i]).collect();
    }

    config.parallel_jobs = Input::with_theme(&theme)
        .with_prompt(t!("init.jobs_prompt", locale = language))
        .default(num_cpus::get().max(1))
        .validate_with(|jobs: &usize| {
            if *jobs > 0 {
                Ok(())
            } else {
                Err(t!("init.jobs_invalid", locale = language).to_string())
            }
        })
        .interact_text()
        .context(t!("init.user_confirmation_failed", locale = language).to_string())?;

    config.timeout = Input::with_theme(&theme)
        .with_prompt(t!("init.timeout_prompt", locale = language))
        .default(config.timeout)
        .interact_text()
        .context(t!("init.user_confirmation_failed", locale = language).to_string())?;

    let runner: String = Input::with_theme(&theme)
        .with_prompt(t!("init.simulator_prompt", locale = language))
        .allow_empty(true)
        .interact_text()
        .context(t!("init.user_confirmation_failed", locale = language).to_string())?;
    config.tools.simulator_runner = Some(runner.trim().to_string()).filter(|r| !r.is_empty());

    config.coverage_enabled = Confirm::with_theme(&theme)
        .with_prompt(t!("init.coverage_prompt", locale = language))
        .default(config.coverage_enabled)
        .interact()
        .context(t!("init.user_confirmation_failed", locale = language).to_string())?;

    config.waveform_enabled = Confirm::with_theme(&theme)
        .with_prompt(t!("init.waveform_prompt", locale = language))
        .default(config.waveform_enabled)
        .interact()
        .context(t!("init.user_confirmation_failed", locale = language).to_string())?;

    write_config(output, &config, language)
}

fn language_or_default(language: &str) -> String {
    if LANGUAGES.contains(&language) {
        language.to_string()
    } else {
        "en".to_string()
    }
}

/// Serializes `config` as TOML and writes it to `path`.
pub fn write_config(path: &Path, config: &PipelineConfig, language: &str) -> Result<()> {
    let toml_string = toml::to_string_pretty(config)
        .context(t!("init.serialize_failed", locale = language).to_string())?;

    let write_failed =
        || t!("init.write_failed", locale = language, path = path.display()).to_string();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(write_failed)?;
    }
    fs::write(path, toml_string).with_context(write_failed)?;

    println!(
        "\n{} {}",
        "✔".green(),
        t!("init.success_created", locale = language, path = path.display()).bold()
    );
    println!("{}", t!("init.usage_hint", locale = language));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn written_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("verification.toml");
        let config = PipelineConfig {
            parallel_jobs: 2,
            test_suites: vec![SuiteKind::System],
            ..PipelineConfig::default()
        };
        write_config(&path, &config, "en").unwrap();

        let loaded = PipelineConfig::from_toml_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn unknown_language_falls_back_to_english() {
        assert_eq!(language_or_default("fr"), "en");
        assert_eq!(language_or_default("zh-CN"), "zh-CN");
    }
}
