#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`pattern`]: 요소 경로와 꼬리 매칭
//! - [`rule_store`]: 패턴 -> 액션 목록 (정확 매칭 우선, 와일드카드 최장 꼬리 매칭)
//! - [`context`]: 실행 컨텍스트와 라이브 객체 (`LiveObject`)
//! - [`interpreter`]: 요소 이벤트를 액션 호출로 바꾸는 상태 머신
//! - [`action`]: 액션 계약과 기본 액션 라이브러리
//! - [`registry`]: 클래스명 -> 컴포넌트 선언
//! - [`xml`]: quick-xml 기반 SAX 스타일 이벤트 드라이버
//! - [`document`]: 이벤트 기록 및 재생, 네임스페이스 필터
//! - [`configurator`]: 기본 규칙으로 문서를 해석하는 설정기
//! - [`subst`]: `${name}` 변수 치환
//! - [`error`]: 치명적 에러와 액션 에러

pub mod action;
pub mod configurator;
pub mod context;
pub mod document;
pub mod error;
pub mod interpreter;
pub mod pattern;
pub mod registry;
pub mod rule_store;
pub mod subst;
pub mod xml;

// --- 주요 타입 re-export ---

// 인터프리터
pub use interpreter::{Interpreter, InterpreterState};
pub use pattern::Pattern;
pub use rule_store::RuleStore;

// 컨텍스트
pub use context::{ExecutionContext, LiveObject, appender_key};

// 액션
pub use action::{Action, ActionFactory, Handler, ImplicitAction};

// 설정기
pub use configurator::{ConfigurationReport, JoranConfigurator};
pub use document::JoranDocument;
pub use registry::ComponentRegistry;

// XML
pub use xml::{ContentHandler, ElementName, XmlDriver};

// 에러
pub use error::{ActionError, InterpreterError, Skip};
