//! 에러 타입 -- 도메인별 에러 정의
//!
//! 인터프리터 실행 중 발생하는 복구 가능한 에러는 여기 정의된 타입으로
//! 전파되지 않고 [`ErrorItem`](crate::types::ErrorItem)으로 누적됩니다.
//! 이 모듈의 에러는 실행 자체를 중단시키는 치명적 실패만 표현합니다.

/// Joran 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum JoranError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// XML 문서 파싱 에러
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 문서 파싱 에러
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// XML 형식 오류 (well-formedness 위반)
    #[error("malformed xml at line {line}, column {column}: {reason}")]
    Xml {
        line: usize,
        column: usize,
        reason: String,
    },

    /// 입력 데이터 초과
    #[error("input too large: {size} bytes (max: {max})")]
    TooLarge { size: usize, max: usize },

    /// 요소 중첩 깊이 초과
    #[error("element nesting too deep at line {line}: depth {depth} (max: {max})")]
    TooDeep {
        line: usize,
        depth: usize,
        max: usize,
    },

    /// UTF-8이 아닌 입력
    #[error("unsupported encoding: {0}")]
    UnsupportedEncoding(String),
}
