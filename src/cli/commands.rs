//! # CLI Commands / CLI 命令
//!
//! One module per subcommand.
//! 每个子命令一个模块。

pub mod init;
pub mod regress;
pub mod verify;

use anyhow::{Context, Result};
use colored::*;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::signal;
use tokio_util::sync::CancellationToken;

use crate::core::config::{self, PipelineConfig};
use crate::infra::t;

/// Resolves the project root and loads its configuration. An explicit
/// `--lang` wins over the configured language.
///
/// 解析项目根目录并加载其配置。显式的 `--lang` 优先于配置中的语言。
pub(crate) fn load_project(
    config_path: Option<&Path>,
    project_dir: &Path,
    explicit_lang: Option<&str>,
) -> Result<(PathBuf, PipelineConfig, String)> {
    let bootstrap = explicit_lang.map_or_else(crate::detect_locale, str::to_string);

    let project_root = fs::canonicalize(project_dir).with_context(|| {
        t!(
            "cli.project_dir_not_found",
            locale = &bootstrap,
            path = project_dir.display()
        )
        .to_string()
    })?;

    let config = config::load_config(config_path, &project_root)
        .with_context(|| t!("cli.config_load_failed", locale = &bootstrap).to_string())?;

    let locale = explicit_lang
        .map(str::to_string)
        .unwrap_or_else(|| config.language.clone());
    rust_i18n::set_locale(&locale);

    println!(
        "{}",
        t!("cli.project_root", locale = &locale, path = project_root.display())
    );
    Ok((project_root, config, locale))
}

/// Sets up a signal handler for graceful shutdown.
/// 设置用于优雅关闭的信号处理器。
pub(crate) fn setup_signal_handler(locale: &str) -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();
    let locale = locale.to_string();

    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                println!("\n{}", t!("cli.shutdown_signal", locale = &locale).yellow());
                token_clone.cancel();
            }
            Err(e) => log::warn!("cannot listen for Ctrl-C: {e}"),
        }
    });

    token
}
