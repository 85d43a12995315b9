//! 인터프리터 에러 타입
//!
//! [`InterpreterError`]는 해석 전체를 중단시키는 치명적 실패(XML 형식 오류,
//! I/O)만 표현합니다. 개별 액션의 실패는 [`ActionError`]로 반환되며,
//! 인터프리터가 이를 실행 컨텍스트의 에러 목록에 기록하고 계속 진행합니다.

use joran_core::component::PropertyError;
use joran_core::error::{JoranError, ParseError};

/// 인터프리터 치명적 에러
#[derive(Debug, thiserror::Error)]
pub enum InterpreterError {
    /// XML 파싱 실패
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// I/O 에러 (설정 파일 읽기)
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<InterpreterError> for JoranError {
    fn from(err: InterpreterError) -> Self {
        match err {
            InterpreterError::Parse(e) => JoranError::Parse(e),
            InterpreterError::Io(e) => JoranError::Io(e),
        }
    }
}

/// 액션 실패 후 건너뛸 범위
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Skip {
    /// 건너뛰지 않음
    #[default]
    None,
    /// 실패한 요소의 하위 요소 전체
    Children,
    /// 실패한 요소 이후의 형제 요소 (부모의 나머지 하위 트리)
    Siblings,
}

/// 복구 가능한 액션 에러
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    /// 필수 속성 누락 또는 빈 값
    #[error("no '{attribute}' attribute in <{tag}>")]
    MissingAttribute { tag: String, attribute: String },

    /// 객체 스택이 비어 있음
    #[error("object stack is empty while handling <{tag}>")]
    EmptyStack { tag: String },

    /// 스택 최상단 객체 종류 불일치
    #[error("expected {expected} on top of the object stack, found {found}")]
    UnexpectedObject { expected: String, found: String },

    /// 등록되지 않은 컴포넌트 클래스
    #[error("could not create component of class [{class}]")]
    UnknownClass { class: String },

    /// 참조한 어펜더가 없음
    #[error("could not find an appender named [{name}]")]
    UnknownAppender { name: String },

    /// 알 수 없는 레벨 이름
    #[error("invalid level [{value}]")]
    InvalidLevel { value: String },

    /// 속성 설정 실패
    #[error(transparent)]
    Property(#[from] PropertyError),

    /// 유효하지 않은 규칙 패턴
    #[error("invalid rule pattern [{pattern}]")]
    InvalidPattern { pattern: String },

    /// 명시적 스킵 지시가 붙은 에러
    #[error("{source}")]
    Skip {
        skip: Skip,
        #[source]
        source: Box<ActionError>,
    },
}

impl ActionError {
    /// 에러에 스킵 지시를 붙입니다.
    pub fn skipping(self, skip: Skip) -> Self {
        match self {
            Self::Skip { source, .. } => Self::Skip { skip, source },
            other => Self::Skip {
                skip,
                source: Box::new(other),
            },
        }
    }

    /// 이 에러가 요구하는 스킵 범위
    ///
    /// 컴포넌트 생성 실패는 기본적으로 하위 요소를 건너뜁니다.
    pub fn skip(&self) -> Skip {
        match self {
            Self::Skip { skip, .. } => *skip,
            Self::UnknownClass { .. } => Skip::Children,
            _ => Skip::None,
        }
    }

    /// 스킵 래퍼를 벗긴 원래 에러
    pub fn root(&self) -> &ActionError {
        match self {
            Self::Skip { source, .. } => source.root(),
            other => other,
        }
    }
}
