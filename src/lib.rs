//! # Verification Runner Library / 验证运行器库
//!
//! This library provides the core functionality of the verification runner,
//! a configuration-driven orchestrator for RTL verification. It drives the
//! external compiler and simulator through regression suites and a staged
//! verification pipeline, analyzes simulation logs and writes reports.
//!
//! 此库提供验证运行器的核心功能，这是一个配置驱动的 RTL 验证编排器。
//! 它通过回归套件和分阶段的验证流水线驱动外部编译器和仿真器，分析仿真日志并写入报告。
//!
//! ## Modules / 模块
//!
//! - `core` - Data models, configuration, log analysis, suite runner and pipeline
//! - `infra` - Infrastructure services like process execution and file system operations
//! - `reporting` - Structured, text, HTML and console reports
//! - `cli` - Command-line interface and commands
//!
//! - `core` - 数据模型、配置、日志分析、套件运行器和流水线
//! - `infra` - 基础设施服务，如进程执行和文件系统操作
//! - `reporting` - 结构化、文本、HTML 和控制台报告
//! - `cli` - 命令行接口和命令

pub mod core;
pub mod infra;
pub mod reporting;
pub mod cli;

// Re-export commonly used items
pub use core::models;
pub use core::config;
pub use core::pipeline;
pub use core::suite;

/// Detects the language to use from the system locale.
///
/// It attempts to match the full locale (e.g., "zh-CN"), then just the
/// language code (e.g., "en"), and finally falls back to "en".
///
/// 根据系统区域设置检测要使用的语言。先尝试匹配完整区域（如 "zh-CN"），
/// 再尝试仅匹配语言代码（如 "en"），最后回退到 "en"。
pub fn detect_locale() -> String {
    let locale = sys_locale::get_locale().unwrap_or_else(|| "en".to_string());
    let available_locales = rust_i18n::available_locales!();

    if available_locales.contains(&locale.as_str()) {
        return locale;
    }
    locale
        .split(['-', '_'])
        .next()
        .and_then(|lang_code| {
            available_locales
                .iter()
                .find(|available| available.split('-').next() == Some(lang_code))
        })
        .map_or_else(|| "en".to_string(), |lang| lang.to_string())
}

// Initialize i18n
rust_i18n::i18n!("locales", fallback = "en");
