//! # File System Operations Module / 文件系统操作模块
//!
//! This module provides utilities for file system operations: discovering
//! design sources, naming per-run artifacts and checking prerequisites.
//!
//! 此模块提供文件系统操作的实用功能：发现设计源文件、为每次运行的产物命名以及检查前置条件。

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Recursively collects every file under `root` whose extension is one of
/// `extensions`, sorted so that compiler invocations are reproducible.
/// A missing root yields an empty list.
///
/// # Arguments
/// * `root` - The design root to walk
/// * `extensions` - Extensions without the leading dot, e.g. `["v", "sv"]`
pub fn discover_sources(root: &Path, extensions: &[String]) -> Vec<PathBuf> {
    let mut sources: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| extensions.iter().any(|wanted| wanted == ext))
        })
        .collect();
    sources.sort();
    sources
}

/// Returns the subset of `paths` that does not exist, preserving order.
pub fn missing_files<'a>(paths: impl IntoIterator<Item = &'a PathBuf>) -> Vec<PathBuf> {
    paths
        .into_iter()
        .filter(|path| !path.exists())
        .cloned()
        .collect()
}

/// Creates `dir` (and its parents) if needed.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))
}

/// Replaces every non-alphanumeric character with `_`, for use in file names.
///
/// 将所有非字母数字字符替换为 `_`，用于文件名。
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

/// Builds a file name of the form `<prefix>_<YYYYmmdd_HHMMSS_mmm>.<ext>`.
/// The millisecond suffix keeps two reports written in the same second apart.
///
/// 构建形如 `<prefix>_<YYYYmmdd_HHMMSS_mmm>.<ext>` 的文件名。
pub fn timestamped_name(prefix: &str, at: &DateTime<Local>, ext: &str) -> String {
    format!("{}_{}.{}", prefix, at.format("%Y%m%d_%H%M%S_%3f"), ext)
}

/// Writes `contents` to `path`, attaching the path to any error.
pub fn write_artifact(path: &Path, contents: impl AsRef<[u8]>) -> Result<()> {
    fs::write(path, contents)
        .with_context(|| format!("Failed to write artifact: {}", path.display()))
}
