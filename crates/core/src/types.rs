//! 도메인 타입 -- 인터프리터 전역에서 사용되는 공통 타입
//!
//! XML 이벤트의 위치 정보([`Locator`]), 요소 속성([`Attributes`]),
//! 누적 에러 레코드([`ErrorItem`]), 로그 레벨([`Level`])을 정의합니다.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// 문서 내 위치 (1부터 시작하는 줄/열)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locator {
    /// 줄 번호
    pub line: usize,
    /// 열 번호
    pub column: usize,
}

impl Locator {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {} column {}", self.line, self.column)
    }
}

/// 요소 속성 목록
///
/// 문서에 나타난 순서를 보존합니다. 같은 이름이 중복되면 처음 값이 조회됩니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes {
    entries: Vec<(String, String)>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// 속성을 추가합니다.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// 빌더 형태로 속성을 추가합니다.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(name, value);
        self
    }

    /// 이름으로 속성 값을 조회합니다.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// 누적 에러 레코드
///
/// 복구 가능한 에러는 예외처럼 전파되지 않고 실행 컨텍스트의 에러 목록에
/// 순서대로 쌓입니다. 한 번 추가된 레코드는 제거되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorItem {
    /// 에러 메시지
    pub message: String,
    /// 원인 에러 (있을 경우)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
    /// 에러 발생 시점의 줄 번호 (locator가 없으면 None)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// 에러 발생 시점의 열 번호
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
}

impl ErrorItem {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
            line: None,
            column: None,
        }
    }

    /// 원인 에러를 첨부합니다.
    pub fn with_cause(mut self, cause: impl fmt::Display) -> Self {
        self.cause = Some(cause.to_string());
        self
    }

    /// 위치 정보를 첨부합니다.
    pub fn at(mut self, locator: Locator) -> Self {
        self.line = Some(locator.line);
        self.column = Some(locator.column);
        self
    }
}

impl fmt::Display for ErrorItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let (Some(line), Some(column)) = (self.line, self.column) {
            write!(f, " (line {line}, column {column})")?;
        }
        if let Some(ref cause) = self.cause {
            write!(f, ": {cause}")?;
        }
        Ok(())
    }
}

/// 로그 레벨
///
/// `Ord` 구현으로 레벨 비교가 가능합니다 (`All < Trace < ... < Fatal < Off`).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    All,
    Trace,
    #[default]
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
    Off,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "ALL",
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Fatal => "FATAL",
            Self::Off => "OFF",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 알 수 없는 레벨 이름
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown level: {0}")]
pub struct UnknownLevel(pub String);

impl FromStr for Level {
    type Err = UnknownLevel;

    /// 대소문자를 구분하지 않습니다.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ALL" => Ok(Self::All),
            "TRACE" => Ok(Self::Trace),
            "DEBUG" => Ok(Self::Debug),
            "INFO" => Ok(Self::Info),
            "WARN" => Ok(Self::Warn),
            "ERROR" => Ok(Self::Error),
            "FATAL" => Ok(Self::Fatal),
            "OFF" => Ok(Self::Off),
            _ => Err(UnknownLevel(s.to_owned())),
        }
    }
}
