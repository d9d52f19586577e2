// Shared test helpers for integration tests
#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::{TempDir, tempdir};

use verification_runner::core::config::{PipelineConfig, ProjectLayout};

/// A stand-in for the HDL compiler. It "compiles" by copying the testbench
/// (the first positional argument) to the `-o` output and making it
/// executable, so testbenches in these tests are shell scripts. A testbench
/// containing `COMPILE_ERROR` is rejected with exit code 1.
const FAKE_COMPILER: &str = r#"#!/bin/sh
out=""
tb=""
while [ $# -gt 0 ]; do
  case "$1" in
    -o) out="$2"; shift 2; continue ;;
    -*) ;;
    *) if [ -z "$tb" ]; then tb="$1"; fi ;;
  esac
  shift
done
if grep -q COMPILE_ERROR "$tb"; then
  echo "$tb:3: syntax error" >&2
  echo "I give up." >&2
  exit 1
fi
cp "$tb" "$out" && chmod +x "$out"
"#;

/// A throwaway project tree with the default layout and fake tools.
pub struct FakeProject {
    dir: TempDir,
}

impl FakeProject {
    pub fn new() -> Self {
        let dir = tempdir().expect("Failed to create temporary directory");
        for sub in ["rtl", "sim/testbench", "sim/results", "tools"] {
            fs::create_dir_all(dir.path().join(sub)).expect("Failed to create project directory");
        }
        let project = Self { dir };
        project.script("tools/fake_compiler.sh", FAKE_COMPILER);
        project.script("tools/gen_vectors.sh", "#!/bin/sh\necho 'generated 100 vectors'\n");
        project
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Writes a plain file, creating parent directories.
    pub fn write(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&path, contents).expect("Failed to write file");
        path
    }

    /// Writes an executable shell script.
    pub fn script(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.write(relative, contents);
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
            .expect("Failed to make script executable");
        path
    }

    /// Writes a testbench that the fake compiler turns into a runnable test.
    pub fn testbench(&self, file_name: &str, body: &str) -> PathBuf {
        self.write(
            &format!("sim/testbench/{file_name}"),
            &format!("#!/bin/sh\n{body}\n"),
        )
    }

    /// A configuration wired to the fake tools of this project.
    pub fn config(&self) -> PipelineConfig {
        let mut config = PipelineConfig {
            language: "en".to_string(),
            timeout: 30,
            parallel_jobs: 2,
            ..PipelineConfig::default()
        };
        config.paths.include_dirs = vec![PathBuf::from("rtl")];
        let tool = |name: &str| self.root().join("tools").join(name).display().to_string();
        config.tools.compiler = tool("fake_compiler.sh");
        config.tools.compiler_flags = Vec::new();
        config.tools.vector_generator = tool("gen_vectors.sh");
        config.tools.compile_timeout = 30;
        config.tools.vector_timeout = 30;
        config.verification.required_sources = vec![PathBuf::from("rtl/top.v")];
        config.verification.harness = PathBuf::from("sim/testbench/tb_top.sv");
        config
    }

    pub fn layout(&self, config: &PipelineConfig) -> ProjectLayout {
        ProjectLayout::resolve(config, self.root())
    }

    /// Writes the design source and a harness whose simulation runs `body`.
    pub fn pipeline_inputs(&self, body: &str) {
        self.write("rtl/top.v", "module top; endmodule\n");
        self.testbench("tb_top.sv", body);
    }

    /// Lists the files in the results directory whose names start with `prefix`.
    pub fn reports(&self, prefix: &str) -> Vec<PathBuf> {
        let mut found: Vec<PathBuf> = fs::read_dir(self.root().join("sim/results"))
            .expect("Failed to read results directory")
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(prefix))
            })
            .collect();
        found.sort();
        found
    }
}

/// Helper function to create an invalid TOML configuration
pub fn create_invalid_toml(dir: &Path) -> PathBuf {
    let path = dir.join("invalid.toml");
    let content = r#"
language = "en"
# Invalid TOML - missing closing bracket
[paths
rtl_dir = "rtl"
"#;
    fs::write(&path, content).unwrap();
    path
}
