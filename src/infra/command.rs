//! # Process Executor Module / 进程执行模块
//!
//! Runs one external tool with a bounded wait time and captures its standard
//! output, standard error and exit status. Every failure mode (launch error,
//! I/O error, timeout) is folded into a [`CommandOutput`] so that callers can
//! classify outcomes uniformly.
//!
//! 以有限的等待时间运行一个外部工具，并捕获其标准输出、标准错误和退出状态。
//! 所有失败模式（启动错误、I/O 错误、超时）都会被转换为 [`CommandOutput`]，
//! 以便调用者统一分类结果。

use anyhow::{Context, Result, anyhow};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Text put in place of stderr when a command exceeded its timeout.
/// 命令超时时替代 stderr 的文本。
pub const TIMEOUT_MARKER: &str = "Timeout";

/// How long the output readers may keep draining after the child was killed.
const READER_GRACE: Duration = Duration::from_millis(200);

/// An executable invocation: program, arguments, optional working directory
/// and extra environment variables.
///
/// 一次可执行程序调用：程序、参数、可选的工作目录以及额外的环境变量。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub current_dir: Option<PathBuf>,
    pub envs: Vec<(String, String)>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            envs: Vec::new(),
        }
    }

    /// Parses a configured command line such as `python3 ~/gen.py --fast`.
    /// Environment variables and `~` are expanded before the line is split
    /// with shell quoting rules.
    ///
    /// 解析配置中的命令行，例如 `python3 ~/gen.py --fast`。
    /// 在按照 shell 引号规则拆分之前，会先展开环境变量和 `~`。
    pub fn parse(command_line: &str) -> Result<Self> {
        let expanded = shellexpand::full(command_line)
            .with_context(|| format!("Failed to expand command: {command_line}"))?
            .to_string();

        let mut parts = shlex::split(&expanded)
            .ok_or_else(|| anyhow!("Failed to parse command: {}", expanded))?
            .into_iter();

        let program = parts
            .next()
            .ok_or_else(|| anyhow!("Empty command after parsing."))?;

        Ok(Self::new(program).args(parts))
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Renders the invocation as a single shell-quoted line for logs.
    pub fn display_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(|part| {
                shlex::try_quote(part)
                    .map(|q| q.into_owned())
                    .unwrap_or_else(|_| part.to_string())
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// The captured outcome of one child process.
/// 一个子进程的捕获结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// `true` only when the process exited with status zero.
    pub success: bool,
    /// Exit code, absent for launch failures, timeouts and signal deaths.
    pub exit_code: Option<i32>,
    pub stdout: String,
    /// Captured stderr, the error text of a launch failure, or [`TIMEOUT_MARKER`].
    pub stderr: String,
    pub timed_out: bool,
    /// `false` when the process could not be started at all.
    pub launched: bool,
    pub duration: Duration,
}

impl CommandOutput {
    fn launch_failure(message: String, duration: Duration) -> Self {
        Self {
            success: false,
            exit_code: None,
            stdout: String::new(),
            stderr: message,
            timed_out: false,
            launched: false,
            duration,
        }
    }

    /// Stdout followed by stderr, the form written to per-test logs.
    pub fn combined(&self) -> String {
        let mut combined = self.stdout.clone();
        if !self.stderr.is_empty() {
            if !combined.is_empty() && !combined.ends_with('\n') {
                combined.push('\n');
            }
            combined.push_str(&self.stderr);
        }
        combined
    }
}

/// Spawns `spec` and waits for it to exit or for `timeout` to elapse.
/// A timed-out child is killed. This function never fails: launch and I/O
/// errors are reported through [`CommandOutput::stderr`].
///
/// # Arguments
/// * `spec` - The invocation to run.
/// * `default_dir` - Working directory used when `spec` does not name one.
/// * `timeout` - Upper bound on the wait for process exit.
///
/// 派生 `spec` 并等待其退出或 `timeout` 到期。超时的子进程会被终止。
/// 此函数从不失败：启动和 I/O 错误通过 [`CommandOutput::stderr`] 报告。
pub async fn execute(spec: &CommandSpec, default_dir: &Path, timeout: Duration) -> CommandOutput {
    let started = Instant::now();
    let cwd = spec.current_dir.as_deref().unwrap_or(default_dir);
    log::debug!("exec [{}] {}", cwd.display(), spec.display_line());

    let mut cmd = tokio::process::Command::new(&spec.program);
    cmd.args(&spec.args)
        .current_dir(cwd)
        .envs(spec.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            log::debug!("spawn of '{}' failed: {}", spec.program, e);
            return CommandOutput::launch_failure(e.to_string(), started.elapsed());
        }
    };

    // Output is accumulated in shared buffers so that whatever was read
    // before a kill is still available afterwards.
    // 输出累积在共享缓冲区中，这样在终止之前读取到的内容之后仍然可用。
    let stdout_buf = Arc::new(Mutex::new(Vec::new()));
    let stderr_buf = Arc::new(Mutex::new(Vec::new()));
    let mut readers = Vec::with_capacity(2);
    if let Some(stdout) = child.stdout.take() {
        readers.push(spawn_reader(stdout, Arc::clone(&stdout_buf)));
    }
    if let Some(stderr) = child.stderr.take() {
        readers.push(spawn_reader(stderr, Arc::clone(&stderr_buf)));
    }

    let wait_result = tokio::time::timeout(timeout, child.wait()).await;

    let (status, timed_out) = match wait_result {
        Ok(status) => (status, false),
        Err(_) => {
            if let Err(e) = child.start_kill() {
                log::debug!("failed to kill '{}': {}", spec.program, e);
            }
            (child.wait().await, true)
        }
    };

    for mut reader in readers {
        // A grandchild may still hold the pipe open after a kill, so the
        // readers only get a short grace period.
        if tokio::time::timeout(READER_GRACE, &mut reader).await.is_err() {
            reader.abort();
        }
    }

    let stdout = String::from_utf8_lossy(&stdout_buf.lock().await).into_owned();
    let captured_stderr = String::from_utf8_lossy(&stderr_buf.lock().await).into_owned();
    let duration = started.elapsed();

    if timed_out {
        log::debug!("'{}' timed out after {:.2?}", spec.program, duration);
        return CommandOutput {
            success: false,
            exit_code: None,
            stdout,
            stderr: TIMEOUT_MARKER.to_string(),
            timed_out: true,
            launched: true,
            duration,
        };
    }

    match status {
        Ok(status) => {
            log::debug!("'{}' exited with {}", spec.program, status);
            CommandOutput {
                success: status.success(),
                exit_code: status.code(),
                stdout,
                stderr: captured_stderr,
                timed_out: false,
                launched: true,
                duration,
            }
        }
        Err(e) => CommandOutput {
            stdout,
            launched: true,
            ..CommandOutput::launch_failure(e.to_string(), duration)
        },
    }
}

fn spawn_reader<R>(mut source: R, sink: Arc<Mutex<Vec<u8>>>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut chunk = [0u8; 8192];
        loop {
            match source.read(&mut chunk).await {
                Ok(0) | Err(_) => break,
                Ok(n) => sink.lock().await.extend_from_slice(&chunk[..n]),
            }
        }
    })
}

/// Extracts the error diagnostics from compiler stderr.
/// Lines mentioning `error` (any case) are kept; when none can be found a
/// snippet of the first 50 lines of the raw output is returned instead.
///
/// 从编译器 stderr 中提取错误诊断。
/// 保留提及 `error`（不区分大小写）的行；如果找不到，则返回原始输出前 50 行的摘要。
pub fn format_compiler_errors(raw_output: &str) -> String {
    let error_lines: Vec<&str> = raw_output
        .lines()
        .filter(|line| line.to_ascii_lowercase().contains("error"))
        .collect();

    if error_lines.is_empty() {
        let snippet = raw_output.lines().take(50).collect::<Vec<_>>().join("\n");
        format!("{}\n\n{}", rust_i18n::t!("command.compiler_errors_unparsed"), snippet)
    } else {
        error_lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_quoted_arguments() {
        let spec = CommandSpec::parse(r#"python3 "my script.py" --count 3"#).unwrap();
        assert_eq!(spec.program, "python3");
        assert_eq!(spec.args, vec!["my script.py", "--count", "3"]);
    }

    #[test]
    fn parse_rejects_empty_line() {
        assert!(CommandSpec::parse("   ").is_err());
    }

    #[test]
    fn display_line_quotes_spaces() {
        let spec = CommandSpec::new("iverilog").arg("-o").arg("out dir/sim");
        let line = spec.display_line();
        assert!(line.starts_with("iverilog -o "));
        assert_ne!(line, "iverilog -o out dir/sim");
        assert_eq!(shlex::split(&line).unwrap(), vec!["iverilog", "-o", "out dir/sim"]);
    }

    #[test]
    fn compiler_errors_are_filtered() {
        let stderr = "tb.sv:3: warning: implicit\nrtl/a.v:10: syntax error\nI give up.\n";
        assert_eq!(format_compiler_errors(stderr), "rtl/a.v:10: syntax error");
    }

    #[test]
    fn compiler_errors_fall_back_to_snippet() {
        let stderr = (0..60).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
        let formatted = format_compiler_errors(&stderr);
        assert!(formatted.contains("line 49"));
        assert!(!formatted.contains("line 50"));
    }
}
