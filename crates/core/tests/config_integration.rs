//! joran.toml 통합 설정 테스트
//!
//! - joran.toml.example 파싱 테스트
//! - 부분 설정 로딩 테스트
//! - 환경변수 우선순위 테스트
//! - 파일 로딩 / 잘못된 형식 에러 테스트

use std::io::Write;

use joran_core::config::{DEFAULT_MAX_DEPTH, DEFAULT_MAX_DOCUMENT_BYTES, JoranConfig};
use joran_core::error::{ConfigError, JoranError};

// =============================================================================
// joran.toml.example 파싱 테스트
// =============================================================================

#[test]
fn example_config_parses_successfully() {
    let content = include_str!("../../../joran.toml.example");
    let config = JoranConfig::parse(content).expect("example config should parse");

    assert_eq!(config.general.log_level, "info");
    assert_eq!(config.general.log_format, "pretty");
    assert_eq!(
        config.substitution.get("log_dir").map(String::as_str),
        Some("/var/log/joran")
    );
}

#[test]
fn example_config_passes_validation() {
    let content = include_str!("../../../joran.toml.example");
    let config = JoranConfig::parse(content).expect("should parse");
    config
        .validate()
        .expect("example config should pass validation");
}

#[test]
fn example_config_matches_code_defaults() {
    let content = include_str!("../../../joran.toml.example");
    let config = JoranConfig::parse(content).expect("should parse");
    let defaults = JoranConfig::default();

    assert_eq!(config.general.log_level, defaults.general.log_level);
    assert_eq!(config.general.log_format, defaults.general.log_format);
    assert_eq!(config.interpreter.namespaces, defaults.interpreter.namespaces);
    assert_eq!(
        config.interpreter.implicit_nesting,
        defaults.interpreter.implicit_nesting
    );
    assert_eq!(config.interpreter.max_document_bytes, DEFAULT_MAX_DOCUMENT_BYTES);
    assert_eq!(config.interpreter.max_depth, DEFAULT_MAX_DEPTH);
    assert_eq!(
        config.interpreter.fail_on_error,
        defaults.interpreter.fail_on_error
    );
}

// =============================================================================
// 부분 설정 테스트
// =============================================================================

#[test]
fn partial_config_general_only() {
    let toml = r#"
[general]
log_level = "debug"
log_format = "json"
"#;
    let config = JoranConfig::parse(toml).expect("should parse");
    config.validate().expect("should validate");

    assert_eq!(config.general.log_level, "debug");
    assert_eq!(config.general.log_format, "json");
    assert!(config.interpreter.implicit_nesting);
}

#[test]
fn partial_config_interpreter_only() {
    let toml = r#"
[interpreter]
namespaces = ["http://jakarta.apache.org/log4j/"]
implicit_nesting = false
"#;
    let config = JoranConfig::parse(toml).expect("should parse");
    config.validate().expect("should validate");

    assert_eq!(config.general.log_level, "info");
    assert_eq!(config.interpreter.namespaces.len(), 1);
    assert!(!config.interpreter.implicit_nesting);
    assert_eq!(config.interpreter.max_depth, DEFAULT_MAX_DEPTH);
}

// =============================================================================
// 환경변수 우선순위 테스트
// =============================================================================

#[test]
#[serial_test::serial]
fn env_override_takes_precedence_over_toml() {
    let toml = r#"
[general]
log_level = "info"
"#;

    let original = std::env::var("JORAN_GENERAL_LOG_LEVEL").ok();
    // SAFETY: serial 테스트로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var("JORAN_GENERAL_LOG_LEVEL", "error");
    }

    let mut config = JoranConfig::parse(toml).expect("should parse");
    config.apply_env_overrides();
    let result = config.general.log_level.clone();

    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var("JORAN_GENERAL_LOG_LEVEL", val),
            None => std::env::remove_var("JORAN_GENERAL_LOG_LEVEL"),
        }
    }

    assert_eq!(result, "error");
}

#[test]
#[serial_test::serial]
fn env_override_csv_for_namespaces() {
    let original = std::env::var("JORAN_INTERPRETER_NAMESPACES").ok();
    // SAFETY: serial 테스트로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var("JORAN_INTERPRETER_NAMESPACES", "urn:a, urn:b");
    }

    let mut config = JoranConfig::parse("").expect("should parse");
    config.apply_env_overrides();
    let result = config.interpreter.namespaces.clone();

    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var("JORAN_INTERPRETER_NAMESPACES", val),
            None => std::env::remove_var("JORAN_INTERPRETER_NAMESPACES"),
        }
    }

    assert_eq!(result, vec!["urn:a", "urn:b"]);
}

#[test]
#[serial_test::serial]
fn env_override_invalid_number_keeps_toml_value() {
    let toml = r#"
[interpreter]
max_document_bytes = 4096
"#;

    let original = std::env::var("JORAN_INTERPRETER_MAX_DOCUMENT_BYTES").ok();
    // SAFETY: serial 테스트로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var("JORAN_INTERPRETER_MAX_DOCUMENT_BYTES", "lots");
    }

    let mut config = JoranConfig::parse(toml).expect("should parse");
    config.apply_env_overrides();
    let result = config.interpreter.max_document_bytes;

    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var("JORAN_INTERPRETER_MAX_DOCUMENT_BYTES", val),
            None => std::env::remove_var("JORAN_INTERPRETER_MAX_DOCUMENT_BYTES"),
        }
    }

    assert_eq!(result, 4096);
}

// =============================================================================
// 파일 로딩 / 잘못된 형식 에러 테스트
// =============================================================================

#[tokio::test]
#[serial_test::serial]
async fn load_from_file_applies_validation() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "[general]\nlog_format = \"json\"").expect("write");

    let config = JoranConfig::load(file.path()).await.expect("should load");
    assert_eq!(config.general.log_format, "json");
}

#[tokio::test]
async fn from_file_with_invalid_value_fails_validation() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "[interpreter]\nmax_depth = 0").expect("write");

    let err = JoranConfig::from_file(file.path()).await.unwrap_err();
    assert!(matches!(
        err,
        JoranError::Config(ConfigError::InvalidValue { .. })
    ));
}

#[test]
fn comments_only_parses_with_defaults() {
    let toml = r#"
# 주석만 있는 파일
# 모든 값은 기본값
"#;
    let config = JoranConfig::parse(toml).expect("comments-only should parse");
    config.validate().expect("should validate");
    assert_eq!(config.general.log_level, "info");
}

#[test]
fn invalid_type_returns_parse_error() {
    let toml = r#"
[interpreter]
implicit_nesting = "yes"
"#;
    let err = JoranConfig::parse(toml).unwrap_err();
    assert!(matches!(
        err,
        JoranError::Config(ConfigError::ParseFailed { .. })
    ));
}
