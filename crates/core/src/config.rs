//! 설정 관리 -- joran.toml 파싱 및 런타임 설정
//!
//! [`JoranConfig`]는 인터프리터와 CLI 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`JORAN_INTERPRETER_MAX_DEPTH=64` 형식)
//! 3. 설정 파일 (`joran.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), joran_core::error::JoranError> {
//! use joran_core::config::JoranConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = JoranConfig::load("joran.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = JoranConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, JoranError};

/// 문서 크기 기본 상한 (10 MiB)
pub const DEFAULT_MAX_DOCUMENT_BYTES: usize = 10 * 1024 * 1024;

/// 요소 중첩 깊이 기본 상한
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Joran 통합 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JoranConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 인터프리터 설정
    #[serde(default)]
    pub interpreter: InterpreterConfig,
    /// 초기 치환 속성 (`${name}` 참조에 사용)
    #[serde(default)]
    pub substitution: BTreeMap<String, String>,
}

impl JoranConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, JoranError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, JoranError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                JoranError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                JoranError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, JoranError> {
        toml::from_str(toml_str).map_err(|e| {
            JoranError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `JORAN_{SECTION}_{FIELD}`
    pub fn apply_env_overrides(&mut self) {
        override_string(&mut self.general.log_level, "JORAN_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "JORAN_GENERAL_LOG_FORMAT");

        override_csv(
            &mut self.interpreter.namespaces,
            "JORAN_INTERPRETER_NAMESPACES",
        );
        override_bool(
            &mut self.interpreter.implicit_nesting,
            "JORAN_INTERPRETER_IMPLICIT_NESTING",
        );
        override_usize(
            &mut self.interpreter.max_document_bytes,
            "JORAN_INTERPRETER_MAX_DOCUMENT_BYTES",
        );
        override_usize(&mut self.interpreter.max_depth, "JORAN_INTERPRETER_MAX_DEPTH");
        override_bool(
            &mut self.interpreter.fail_on_error,
            "JORAN_INTERPRETER_FAIL_ON_ERROR",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), JoranError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        if self.interpreter.max_document_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "interpreter.max_document_bytes".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        if self.interpreter.max_depth == 0 {
            return Err(ConfigError::InvalidValue {
                field: "interpreter.max_depth".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        if let Some(ns) = self.interpreter.namespaces.iter().find(|ns| ns.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "interpreter.namespaces".to_owned(),
                reason: format!("namespace uri must not be blank: '{ns}'"),
            }
            .into());
        }

        if let Some(key) = self.substitution.keys().find(|k| k.is_empty() || k.contains('}')) {
            return Err(ConfigError::InvalidValue {
                field: "substitution".to_owned(),
                reason: format!("invalid property name: '{key}'"),
            }
            .into());
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 인터프리터 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterConfig {
    /// 추가로 허용할 네임스페이스 URI
    ///
    /// 네임스페이스가 없는 요소와 log4j 네임스페이스 요소는 항상 기록됩니다.
    /// 그 밖의 네임스페이스 요소는 이 목록에 있을 때만 기록됩니다.
    pub namespaces: Vec<String>,
    /// 중첩 컴포넌트 암시적 액션 등록 여부
    pub implicit_nesting: bool,
    /// 문서 최대 크기 (바이트)
    pub max_document_bytes: usize,
    /// 요소 최대 중첩 깊이
    pub max_depth: usize,
    /// 복구 가능한 에러가 있으면 CLI를 실패로 종료
    pub fail_on_error: bool,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            namespaces: Vec::new(),
            implicit_nesting: true,
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
            max_depth: DEFAULT_MAX_DEPTH,
            fail_on_error: true,
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn default_config_has_sane_values() {
        let config = JoranConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.log_format, "pretty");
        assert!(config.interpreter.implicit_nesting);
        assert!(config.interpreter.fail_on_error);
        assert_eq!(config.interpreter.max_depth, DEFAULT_MAX_DEPTH);
        assert!(config.substitution.is_empty());
    }

    #[test]
    fn default_config_passes_validation() {
        JoranConfig::default().validate().unwrap();
    }

    #[test]
    fn parse_empty_toml_uses_defaults() {
        let config = JoranConfig::parse("").unwrap();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(
            config.interpreter.max_document_bytes,
            DEFAULT_MAX_DOCUMENT_BYTES
        );
    }

    #[test]
    fn parse_partial_toml_merges_with_defaults() {
        let toml = r#"
[interpreter]
max_depth = 32

[substitution]
log_dir = "/var/log/app"
"#;
        let config = JoranConfig::parse(toml).unwrap();
        assert_eq!(config.interpreter.max_depth, 32);
        assert!(config.interpreter.implicit_nesting);
        assert_eq!(
            config.substitution.get("log_dir").map(String::as_str),
            Some("/var/log/app")
        );
    }

    #[test]
    fn parse_invalid_toml_returns_error() {
        let err = JoranConfig::parse("invalid = [[[toml").unwrap_err();
        assert!(matches!(
            err,
            JoranError::Config(ConfigError::ParseFailed { .. })
        ));
    }

    #[test]
    fn validate_rejects_invalid_log_level() {
        let mut config = JoranConfig::default();
        config.general.log_level = "verbose".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_level"));
    }

    #[test]
    fn validate_rejects_invalid_log_format() {
        let mut config = JoranConfig::default();
        config.general.log_format = "xml".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_format"));
    }

    #[test]
    fn validate_rejects_zero_limits() {
        let mut config = JoranConfig::default();
        config.interpreter.max_depth = 0;
        assert!(config.validate().unwrap_err().to_string().contains("max_depth"));

        let mut config = JoranConfig::default();
        config.interpreter.max_document_bytes = 0;
        assert!(
            config
                .validate()
                .unwrap_err()
                .to_string()
                .contains("max_document_bytes")
        );
    }

    #[test]
    fn validate_rejects_blank_namespace() {
        let mut config = JoranConfig::default();
        config.interpreter.namespaces = vec!["  ".to_owned()];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("namespaces"));
    }

    #[test]
    fn validate_rejects_bad_substitution_key() {
        let mut config = JoranConfig::default();
        config
            .substitution
            .insert("bad}".to_owned(), "x".to_owned());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("substitution"));
    }

    #[test]
    #[serial]
    fn env_override_string() {
        let mut val = "original".to_owned();
        // SAFETY: serial 테스트이므로 다른 스레드가 환경변수를 동시에 읽지 않습니다.
        unsafe { std::env::set_var("TEST_JORAN_STR", "overridden") };
        override_string(&mut val, "TEST_JORAN_STR");
        assert_eq!(val, "overridden");
        unsafe { std::env::remove_var("TEST_JORAN_STR") };
    }

    #[test]
    #[serial]
    fn env_override_bool_invalid_keeps_original() {
        let mut val = true;
        // SAFETY: serial 테스트이므로 다른 스레드가 환경변수를 동시에 읽지 않습니다.
        unsafe { std::env::set_var("TEST_JORAN_BOOL_BAD", "not-a-bool") };
        override_bool(&mut val, "TEST_JORAN_BOOL_BAD");
        assert!(val);
        unsafe { std::env::remove_var("TEST_JORAN_BOOL_BAD") };
    }

    #[test]
    #[serial]
    fn env_override_csv_drops_blank_entries() {
        let mut val = Vec::new();
        // SAFETY: serial 테스트이므로 다른 스레드가 환경변수를 동시에 읽지 않습니다.
        unsafe { std::env::set_var("TEST_JORAN_CSV", "urn:a, ,urn:b") };
        override_csv(&mut val, "TEST_JORAN_CSV");
        assert_eq!(val, vec!["urn:a", "urn:b"]);
        unsafe { std::env::remove_var("TEST_JORAN_CSV") };
    }

    #[test]
    #[serial]
    fn apply_env_overrides_updates_interpreter_section() {
        let mut config = JoranConfig::default();
        // SAFETY: serial 테스트이므로 다른 스레드가 환경변수를 동시에 읽지 않습니다.
        unsafe {
            std::env::set_var("JORAN_INTERPRETER_MAX_DEPTH", "12");
            std::env::set_var("JORAN_INTERPRETER_FAIL_ON_ERROR", "false");
        }
        config.apply_env_overrides();
        unsafe {
            std::env::remove_var("JORAN_INTERPRETER_MAX_DEPTH");
            std::env::remove_var("JORAN_INTERPRETER_FAIL_ON_ERROR");
        }
        assert_eq!(config.interpreter.max_depth, 12);
        assert!(!config.interpreter.fail_on_error);
    }

    #[test]
    fn env_override_missing_var_keeps_original() {
        let mut val = 7usize;
        override_usize(&mut val, "TEST_JORAN_NONEXISTENT_12345");
        assert_eq!(val, 7);
    }

    #[test]
    fn config_serialize_roundtrip() {
        let mut config = JoranConfig::default();
        config
            .substitution
            .insert("app".to_owned(), "billing".to_owned());
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed = JoranConfig::parse(&toml_str).unwrap();
        assert_eq!(parsed.general.log_format, config.general.log_format);
        assert_eq!(parsed.substitution, config.substitution);
    }

    #[tokio::test]
    async fn from_file_not_found() {
        let err = JoranConfig::from_file("/nonexistent/path/joran.toml")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            JoranError::Config(ConfigError::FileNotFound { .. })
        ));
    }
}
