//! 액션 계약과 기본 액션 라이브러리
//!
//! # 계약
//! - [`Action`]: 패턴에 등록되는 명시적 액션. 요소 시작에 `begin`, 끝에 `end`.
//! - [`ImplicitAction`]: 규칙이 없는 요소마다 `is_applicable`로 스스로 적용
//!   여부를 판단하는 암시적 액션. `is_applicable`(결정) → `begin`(실행) →
//!   `end`(연결)의 세 단계가 같은 요소에 대해 순서대로 호출됩니다.
//!
//! 액션 인스턴스는 등록 시 한 번 만들어져 모든 매칭 요소에 재사용되므로
//! 메서드는 `&self`를 받습니다. `begin`이 `Err`를 반환하면 인터프리터가
//! 에러를 기록하고 그 활성화에 대해서는 `end`를 호출하지 않습니다.
//! 에러 상태는 활성화마다 따로 관리되어 다음 요소로 새지 않습니다.
//!
//! # 기본 액션
//! - [`configuration`]: `<configuration>` 루트 속성
//! - [`property`]: 치환 속성, 저장소 속성
//! - [`logger`]: 로거, 루트 로거, 레벨, 어펜더 참조
//! - [`appender`]: 어펜더, 레이아웃
//! - [`conversion_rule`]: 패턴 레이아웃 변환 규칙
//! - [`plugin`]: 플러그인, 로거 팩토리
//! - [`param`]: `*/param` 속성 설정
//! - [`nest_component`]: 중첩 컴포넌트 암시적 액션
//! - [`new_rule`]: 해석 도중 규칙 추가, [`ActionFactory`]

pub mod appender;
pub mod configuration;
pub mod conversion_rule;
pub mod logger;
pub mod nest_component;
pub mod new_rule;
pub mod param;
pub mod plugin;
pub mod property;

pub use appender::{AppenderAction, LayoutAction};
pub use configuration::ConfigurationAction;
pub use conversion_rule::ConversionRuleAction;
pub use logger::{AppenderRefAction, LevelAction, LoggerAction, RootLoggerAction};
pub use nest_component::NestComponentIA;
pub use new_rule::{ActionFactory, NewRuleAction};
pub use param::ParamAction;
pub use plugin::{LoggerFactoryAction, PluginAction};
pub use property::{RepositoryPropertyAction, SubstitutionPropertyAction};

use std::rc::Rc;

use joran_core::repository::RepositoryRef;
use joran_core::types::Attributes;

use crate::context::{ExecutionContext, LiveObject};
use crate::error::ActionError;

/// 명시적 액션
pub trait Action {
    /// 요소 시작 시 호출됩니다.
    fn begin(
        &self,
        ctx: &mut ExecutionContext,
        name: &str,
        attributes: &Attributes,
    ) -> Result<(), ActionError>;

    /// 요소 끝에서 호출됩니다. 같은 활성화의 `begin`이 실패했다면 호출되지 않습니다.
    fn end(&self, ctx: &mut ExecutionContext, name: &str) -> Result<(), ActionError>;

    /// 로그와 규칙 목록에 표시되는 이름
    fn name(&self) -> &str {
        short_type_name(std::any::type_name::<Self>())
    }
}

/// 암시적 액션
pub trait ImplicitAction {
    /// 이 요소에 적용 가능한지 판단합니다.
    ///
    /// `true`를 반환했다면 바로 이어지는 `begin`/`end`가 같은 요소에 대해
    /// 호출됩니다. 그 사이에 쓸 결정 상태를 보관해도 됩니다.
    fn is_applicable(&self, ctx: &ExecutionContext, name: &str) -> bool;

    fn begin(
        &self,
        ctx: &mut ExecutionContext,
        name: &str,
        attributes: &Attributes,
    ) -> Result<(), ActionError>;

    fn end(&self, ctx: &mut ExecutionContext, name: &str) -> Result<(), ActionError>;

    fn name(&self) -> &str {
        short_type_name(std::any::type_name::<Self>())
    }
}

/// 요소 하나에 대해 선택된 핸들러
#[derive(Clone)]
pub enum Handler {
    Explicit(Rc<dyn Action>),
    Implicit(Rc<dyn ImplicitAction>),
}

impl Handler {
    pub fn begin(
        &self,
        ctx: &mut ExecutionContext,
        name: &str,
        attributes: &Attributes,
    ) -> Result<(), ActionError> {
        match self {
            Self::Explicit(a) => a.begin(ctx, name, attributes),
            Self::Implicit(a) => a.begin(ctx, name, attributes),
        }
    }

    pub fn end(&self, ctx: &mut ExecutionContext, name: &str) -> Result<(), ActionError> {
        match self {
            Self::Explicit(a) => a.end(ctx, name),
            Self::Implicit(a) => a.end(ctx, name),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Explicit(a) => a.name(),
            Self::Implicit(a) => a.name(),
        }
    }
}

fn short_type_name(full: &str) -> &str {
    full.rsplit("::").next().unwrap_or(full)
}

// --- 액션 공통 헬퍼 ---

/// 치환을 거친 비어 있지 않은 속성 값
pub(crate) fn optional_attribute(
    ctx: &ExecutionContext,
    attributes: &Attributes,
    attribute: &str,
) -> Option<String> {
    attributes
        .get(attribute)
        .map(|raw| ctx.subst(raw))
        .filter(|v| !v.trim().is_empty())
}

/// 필수 속성 값. 없거나 비어 있으면 `MissingAttribute`.
pub(crate) fn required_attribute(
    ctx: &ExecutionContext,
    tag: &str,
    attributes: &Attributes,
    attribute: &str,
) -> Result<String, ActionError> {
    optional_attribute(ctx, attributes, attribute).ok_or_else(|| ActionError::MissingAttribute {
        tag: tag.to_owned(),
        attribute: attribute.to_owned(),
    })
}

/// 스택 최상단 객체. 비어 있으면 `EmptyStack`.
pub(crate) fn top_object<'a>(
    ctx: &'a ExecutionContext,
    tag: &str,
) -> Result<&'a LiveObject, ActionError> {
    ctx.try_peek_object().ok_or_else(|| ActionError::EmptyStack {
        tag: tag.to_owned(),
    })
}

/// 스택 바닥의 로거 저장소
pub(crate) fn bottom_repository(
    ctx: &ExecutionContext,
    tag: &str,
) -> Result<RepositoryRef, ActionError> {
    let bottom = ctx.object_at(0).ok_or_else(|| ActionError::EmptyStack {
        tag: tag.to_owned(),
    })?;
    bottom
        .as_repository()
        .cloned()
        .ok_or_else(|| unexpected("repository", bottom))
}

pub(crate) fn unexpected(expected: &str, found: &LiveObject) -> ActionError {
    ActionError::UnexpectedObject {
        expected: expected.to_owned(),
        found: found.kind(),
    }
}

/// `end`에서 `begin`이 넣은 객체를 꺼내고 같은 객체인지 확인합니다.
pub(crate) fn pop_expected(
    ctx: &mut ExecutionContext,
    tag: &str,
    expected: &str,
    is_expected: impl FnOnce(&LiveObject) -> bool,
) -> Result<LiveObject, ActionError> {
    if ctx.is_object_stack_empty() {
        return Err(ActionError::EmptyStack {
            tag: tag.to_owned(),
        });
    }
    let popped = ctx.pop_object();
    if is_expected(&popped) {
        Ok(popped)
    } else {
        let err = unexpected(expected, &popped);
        ctx.push_object(popped);
        Err(err)
    }
}
