//! # Config Module Unit Tests / Config 模块单元测试
//!
//! Tests for loading, validating and serializing the run configuration.
//!
//! 运行配置的加载、校验和序列化测试。

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;
use verification_runner::config::{DEFAULT_CONFIG_FILE, PipelineConfig, SuiteKind, load_config};
use verification_runner::core::error::VerifyError;

#[cfg(test)]
mod load_tests {
    use super::*;

    #[test]
    fn test_absent_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let config = load_config(None, dir.path()).unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn test_project_file_is_picked_up() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(DEFAULT_CONFIG_FILE),
            "parallel_jobs = 8\ntest_suites = [\"unit\", \"system\"]\n",
        )
        .unwrap();

        let config = load_config(None, dir.path()).unwrap();
        assert_eq!(config.parallel_jobs, 8);
        assert_eq!(config.test_suites, vec![SuiteKind::Unit, SuiteKind::System]);
        assert_eq!(config.timeout, 3600);
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let dir = tempdir().unwrap();
        let err = load_config(Some(&dir.path().join("nope.toml")), dir.path()).unwrap_err();
        assert!(matches!(err, VerifyError::Config(_)));
        assert!(err.to_string().contains("nope.toml"));
    }

    #[test]
    fn test_malformed_toml_is_a_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "[paths\nrtl_dir = \"rtl\"\n").unwrap();
        assert!(matches!(
            load_config(Some(&path), dir.path()),
            Err(VerifyError::Config(_))
        ));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let err = PipelineConfig::from_toml_str("paralel_jobs = 2\n").unwrap_err();
        assert!(err.to_string().contains("paralel_jobs"));
    }

    #[test]
    fn test_unknown_suite_is_rejected() {
        assert!(PipelineConfig::from_toml_str("test_suites = [\"smoke\"]\n").is_err());
    }
}

#[cfg(test)]
mod validation_tests {
    use super::*;

    #[test]
    fn test_zero_jobs_is_invalid() {
        assert!(PipelineConfig::from_toml_str("parallel_jobs = 0\n").is_err());
    }

    #[test]
    fn test_zero_timeout_is_invalid() {
        assert!(PipelineConfig::from_toml_str("timeout = 0\n").is_err());
    }

    #[test]
    fn test_zero_tool_timeouts_are_invalid() {
        let err = PipelineConfig::from_toml_str("[tools]\ncompile_timeout = 0\n").unwrap_err();
        assert!(err.to_string().contains("compile_timeout"));
        let err = PipelineConfig::from_toml_str("[tools]\nvector_timeout = 0\n").unwrap_err();
        assert!(err.to_string().contains("vector_timeout"));
    }

    #[test]
    fn test_misspelled_threshold_key_is_rejected() {
        let err = PipelineConfig::from_toml_str("[thresholds]\npass_rat = 10.0\n").unwrap_err();
        assert!(matches!(err, VerifyError::Config(_)));
        assert!(err.to_string().contains("pass_rat"));
    }

    #[test]
    fn test_threshold_out_of_range_is_invalid() {
        assert!(PipelineConfig::from_toml_str("[thresholds]\npass_rate = 120.0\n").is_err());
    }

    #[test]
    fn test_nested_sections_override_defaults() {
        let config = PipelineConfig::from_toml_str(
            r#"
[tools]
compiler = "verilator"
simulator_runner = "vvp"
coverage = "covered report"

[verification]
artifact = "sim.out"

[thresholds]
pass_rate = 90.0
error_penalty = 5
"#,
        )
        .unwrap();
        assert_eq!(config.tools.compiler, "verilator");
        assert_eq!(config.tools.simulator_runner.as_deref(), Some("vvp"));
        assert_eq!(config.tools.coverage.as_deref(), Some("covered report"));
        assert_eq!(config.tools.success_marker, "TEST_PASS");
        assert_eq!(config.verification.artifact, "sim.out");
        assert_eq!(config.verification.log_file, "simulation.log");
        assert_eq!(config.thresholds.pass_rate, 90.0);
        assert_eq!(config.thresholds.quality_policy().error_penalty, 5);
        assert_eq!(config.paths.rtl_dir, PathBuf::from("rtl"));
    }
}

#[cfg(test)]
mod serialization_tests {
    use super::*;

    #[test]
    fn test_defaults_survive_a_toml_round_trip() {
        let text = toml::to_string_pretty(&PipelineConfig::default()).unwrap();
        assert!(!text.contains("simulator_runner"));
        let parsed = PipelineConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed, PipelineConfig::default());
    }

    #[test]
    fn test_suite_names_serialize_short() {
        let config = PipelineConfig {
            test_suites: vec![SuiteKind::Performance],
            ..PipelineConfig::default()
        };
        let text = toml::to_string(&config).unwrap();
        assert!(text.contains("test_suites = [\"performance\"]"));
        assert_eq!(Path::new(DEFAULT_CONFIG_FILE), Path::new("verification.toml"));
    }
}
