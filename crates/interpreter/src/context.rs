//! 실행 컨텍스트 -- 해석 실행 하나의 공유 가변 상태
//!
//! 액션들은 [`ExecutionContext`]를 통해서만 서로 통신합니다.
//!
//! - 객체 스택: 설정 중인 라이브 객체 (LIFO)
//! - 객체 맵: 이름 기반 스크래치 레지스트리 (예: 어펜더 참조 해석)
//! - 에러 목록: 누적만 되고 제거되지 않는 [`ErrorItem`]
//! - 치환 속성: `${name}` 변수 치환 테이블
//! - 대기 규칙: 해석 도중 추가되어 다음 요소부터 적용될 규칙

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use joran_core::component::{ComponentKind, ComponentRef, PropertySetter};
use joran_core::config::DEFAULT_MAX_DOCUMENT_BYTES;
use joran_core::repository::{LoggerRef, RepositoryRef};
use joran_core::types::{ErrorItem, Locator};
use tracing::warn;

use crate::action::Action;
use crate::pattern::Pattern;
use crate::subst;

/// 객체 맵에서 어펜더를 등록하는 키 접두어
const APPENDER_KEY_PREFIX: &str = "appender:";

/// 어펜더 이름에 대응하는 객체 맵 키
pub fn appender_key(name: &str) -> String {
    format!("{APPENDER_KEY_PREFIX}{name}")
}

/// 객체 스택과 객체 맵에 들어가는 라이브 객체
#[derive(Clone)]
pub enum LiveObject {
    Repository(RepositoryRef),
    Logger(LoggerRef),
    Component(ComponentRef),
    Text(String),
    Custom(Rc<dyn Any>),
}

impl LiveObject {
    /// 에러 메시지용 종류 이름
    pub fn kind(&self) -> String {
        match self {
            Self::Repository(_) => "repository".to_owned(),
            Self::Logger(_) => "logger".to_owned(),
            Self::Component(c) => c.borrow().kind().to_string(),
            Self::Text(_) => "text".to_owned(),
            Self::Custom(_) => "custom object".to_owned(),
        }
    }

    pub fn as_repository(&self) -> Option<&RepositoryRef> {
        match self {
            Self::Repository(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_logger(&self) -> Option<&LoggerRef> {
        match self {
            Self::Logger(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_component(&self) -> Option<&ComponentRef> {
        match self {
            Self::Component(c) => Some(c),
            _ => None,
        }
    }

    /// 주어진 종류의 컴포넌트일 때만 반환합니다.
    pub fn as_component_of(&self, kind: ComponentKind) -> Option<&ComponentRef> {
        self.as_component().filter(|c| c.borrow().kind() == kind)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_custom(&self) -> Option<&Rc<dyn Any>> {
        match self {
            Self::Custom(c) => Some(c),
            _ => None,
        }
    }

    /// `PropertySetter` capability가 있으면 클로저를 실행합니다.
    ///
    /// 텍스트와 커스텀 객체에는 capability가 없으므로 `None`을 반환합니다.
    pub fn with_property_setter<R>(
        &self,
        f: impl FnOnce(&mut dyn PropertySetter) -> R,
    ) -> Option<R> {
        match self {
            Self::Repository(r) => Some(f(&mut *r.borrow_mut())),
            Self::Logger(l) => Some(f(&mut *l.borrow_mut())),
            Self::Component(c) => Some(f(&mut *c.borrow_mut())),
            Self::Text(_) | Self::Custom(_) => None,
        }
    }

    /// 같은 인스턴스를 가리키는지 여부
    pub fn same(&self, other: &LiveObject) -> bool {
        match (self, other) {
            (Self::Repository(a), Self::Repository(b)) => Rc::ptr_eq(a, b),
            (Self::Logger(a), Self::Logger(b)) => Rc::ptr_eq(a, b),
            (Self::Component(a), Self::Component(b)) => Rc::ptr_eq(a, b),
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Custom(a), Self::Custom(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for LiveObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Repository(_) => f.write_str("Repository"),
            Self::Logger(l) => f.debug_tuple("Logger").field(&l.borrow().name()).finish(),
            Self::Component(c) => {
                let c = c.borrow();
                f.debug_struct("Component")
                    .field("class", &c.class())
                    .field("name", &c.name())
                    .finish()
            }
            Self::Text(t) => f.debug_tuple("Text").field(t).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// 실행 컨텍스트
///
/// 해석 실행 하나마다 하나씩 생성되며, 인터프리터가 단독으로 소유합니다.
pub struct ExecutionContext {
    object_stack: Vec<LiveObject>,
    object_map: HashMap<String, LiveObject>,
    errors: Vec<ErrorItem>,
    properties: HashMap<String, String>,
    /// 치환 결과 하나의 최대 크기
    max_expanded_bytes: usize,
    locator: Option<Locator>,
    pending_rules: Vec<(Pattern, Rc<dyn Action>)>,
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self {
            object_stack: Vec::new(),
            object_map: HashMap::new(),
            errors: Vec::new(),
            properties: HashMap::new(),
            max_expanded_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
            locator: None,
            pending_rules: Vec::new(),
        }
    }

    // --- 객체 스택 ---

    pub fn push_object(&mut self, object: LiveObject) {
        self.object_stack.push(object);
    }

    /// 최상단 객체를 꺼냅니다.
    ///
    /// # Panics
    /// 스택이 비어 있으면 패닉합니다. push/pop 짝이 깨진 액션 버그입니다.
    pub fn pop_object(&mut self) -> LiveObject {
        match self.object_stack.pop() {
            Some(object) => object,
            None => panic!("pop_object called on an empty object stack"),
        }
    }

    /// 최상단 객체를 조회합니다.
    ///
    /// # Panics
    /// 스택이 비어 있으면 패닉합니다.
    pub fn peek_object(&self) -> &LiveObject {
        match self.object_stack.last() {
            Some(object) => object,
            None => panic!("peek_object called on an empty object stack"),
        }
    }

    /// 패닉하지 않는 최상단 조회 (액션의 capability 검사용)
    pub fn try_peek_object(&self) -> Option<&LiveObject> {
        self.object_stack.last()
    }

    /// 바닥부터 0으로 시작하는 위치의 객체
    pub fn object_at(&self, index: usize) -> Option<&LiveObject> {
        self.object_stack.get(index)
    }

    pub fn object_stack_len(&self) -> usize {
        self.object_stack.len()
    }

    pub fn is_object_stack_empty(&self) -> bool {
        self.object_stack.is_empty()
    }

    // --- 객체 맵 ---

    pub fn put_object(&mut self, key: impl Into<String>, object: LiveObject) {
        self.object_map.insert(key.into(), object);
    }

    pub fn object(&self, key: &str) -> Option<&LiveObject> {
        self.object_map.get(key)
    }

    pub fn remove_object(&mut self, key: &str) -> Option<LiveObject> {
        self.object_map.remove(key)
    }

    pub fn object_map(&self) -> &HashMap<String, LiveObject> {
        &self.object_map
    }

    pub fn object_map_mut(&mut self) -> &mut HashMap<String, LiveObject> {
        &mut self.object_map
    }

    // --- 에러 목록 ---

    /// 에러를 기록합니다. 현재 위치 정보가 있으면 함께 기록됩니다.
    pub fn add_error(&mut self, message: impl Into<String>) {
        self.push_error(ErrorItem::new(message));
    }

    /// 원인과 함께 에러를 기록합니다.
    pub fn add_error_with_cause(&mut self, message: impl Into<String>, cause: impl fmt::Display) {
        self.push_error(ErrorItem::new(message).with_cause(cause));
    }

    fn push_error(&mut self, item: ErrorItem) {
        let item = match self.locator {
            Some(locator) => item.at(locator),
            None => item,
        };
        metrics::counter!(joran_core::metrics::ERRORS_TOTAL).increment(1);
        self.errors.push(item);
    }

    /// 기록 순서대로의 에러 목록
    pub fn errors(&self) -> &[ErrorItem] {
        &self.errors
    }

    /// 실행이 끝난 컨텍스트에서 에러 목록을 꺼냅니다.
    ///
    /// 설정기가 보고서를 만들 때만 사용합니다. 실행 중에는 에러가 제거되지 않습니다.
    pub(crate) fn take_errors(&mut self) -> Vec<ErrorItem> {
        std::mem::take(&mut self.errors)
    }

    // --- 위치 정보 ---

    pub fn set_locator(&mut self, locator: Locator) {
        self.locator = Some(locator);
    }

    pub fn clear_locator(&mut self) {
        self.locator = None;
    }

    pub fn locator(&self) -> Option<Locator> {
        self.locator
    }

    // --- 치환 ---

    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(name.into(), value.into());
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    /// 치환 결과 하나가 가질 수 있는 최대 바이트 수를 설정합니다.
    pub fn set_max_expanded_bytes(&mut self, max: usize) {
        self.max_expanded_bytes = max;
    }

    pub fn max_expanded_bytes(&self) -> usize {
        self.max_expanded_bytes
    }

    /// `${name}` 변수를 치환합니다.
    ///
    /// 치환 속성, 환경변수 순으로 찾고 둘 다 없으면 빈 문자열입니다.
    /// 형식이 잘못된 참조나 최대 크기를 넘는 결과는 경고를 남기고 원래
    /// 문자열을 그대로 반환합니다.
    pub fn subst(&self, value: &str) -> String {
        if !value.contains("${") {
            return value.to_owned();
        }
        let lookup = |key: &str| {
            self.properties
                .get(key)
                .cloned()
                .or_else(|| std::env::var(key).ok())
        };
        match subst::substitute(value, &lookup, self.max_expanded_bytes) {
            Ok(substituted) => substituted,
            Err(e) => {
                warn!(value, error = %e, "variable substitution failed, using value as is");
                value.to_owned()
            }
        }
    }

    // --- 동적 규칙 ---

    /// 해석 도중 추가할 규칙을 대기열에 넣습니다.
    ///
    /// 인터프리터는 현재 콜백이 끝난 직후 대기 규칙을 규칙 저장소에 반영합니다.
    pub fn queue_rule(&mut self, pattern: Pattern, action: Rc<dyn Action>) {
        self.pending_rules.push((pattern, action));
    }

    pub(crate) fn take_pending_rules(&mut self) -> Vec<(Pattern, Rc<dyn Action>)> {
        std::mem::take(&mut self.pending_rules)
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("object_stack", &self.object_stack)
            .field("object_map", &self.object_map.keys().collect::<Vec<_>>())
            .field("errors", &self.errors.len())
            .field("locator", &self.locator)
            .field("pending_rules", &self.pending_rules.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use joran_core::component::{Component, ComponentDescriptor};
    use joran_core::repository::LoggerRepository;

    #[test]
    fn object_stack_is_lifo() {
        let mut ctx = ExecutionContext::new();
        ctx.push_object(LiveObject::Text("a".to_owned()));
        ctx.push_object(LiveObject::Text("b".to_owned()));
        assert_eq!(ctx.object_stack_len(), 2);
        assert_eq!(ctx.peek_object().as_text(), Some("b"));
        assert_eq!(ctx.pop_object().as_text(), Some("b"));
        assert_eq!(ctx.object_at(0).and_then(LiveObject::as_text), Some("a"));
        assert_eq!(ctx.pop_object().as_text(), Some("a"));
        assert!(ctx.try_peek_object().is_none());
    }

    #[test]
    #[should_panic(expected = "empty object stack")]
    fn pop_on_empty_stack_panics() {
        let mut ctx = ExecutionContext::new();
        ctx.pop_object();
    }

    #[test]
    #[should_panic(expected = "empty object stack")]
    fn peek_on_empty_stack_panics() {
        let ctx = ExecutionContext::new();
        ctx.peek_object();
    }

    #[test]
    fn errors_capture_locator_when_set() {
        let mut ctx = ExecutionContext::new();
        ctx.add_error("before locator");
        ctx.set_locator(Locator::new(7, 3));
        ctx.add_error_with_cause("with locator", "boom");

        let errors = ctx.errors();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].line, None);
        assert_eq!(errors[1].line, Some(7));
        assert_eq!(errors[1].column, Some(3));
        assert_eq!(errors[1].cause.as_deref(), Some("boom"));
    }

    #[test]
    fn object_map_round_trip() {
        let mut ctx = ExecutionContext::new();
        ctx.put_object("x", LiveObject::Text("value".to_owned()));
        assert_eq!(ctx.object("x").and_then(LiveObject::as_text), Some("value"));
        assert!(ctx.remove_object("x").is_some());
        assert!(ctx.object("x").is_none());
    }

    #[test]
    fn subst_uses_properties() {
        let mut ctx = ExecutionContext::new();
        ctx.set_property("dir", "/var/log");
        assert_eq!(ctx.subst("${dir}/app.log"), "/var/log/app.log");
        assert_eq!(ctx.subst("plain"), "plain");
        assert_eq!(ctx.subst("${joran_surely_undefined_var}x"), "x");
    }

    #[test]
    fn subst_malformed_returns_original() {
        let ctx = ExecutionContext::new();
        assert_eq!(ctx.subst("${unterminated"), "${unterminated");
    }

    #[test]
    fn subst_over_limit_returns_original() {
        let mut ctx = ExecutionContext::new();
        ctx.set_max_expanded_bytes(64);
        ctx.set_property("p0", "x".repeat(40));
        ctx.set_property("p1", "${p0}${p0}");
        assert_eq!(ctx.subst("${p0}").len(), 40);
        assert_eq!(ctx.subst("${p1}"), "${p1}");
    }

    #[test]
    fn live_object_kind_and_identity() {
        let repo = LoggerRepository::new_ref();
        let a = LiveObject::Repository(Rc::clone(&repo));
        let b = LiveObject::Repository(repo);
        assert!(a.same(&b));
        assert_eq!(a.kind(), "repository");

        let d = Rc::new(ComponentDescriptor::new("PatternLayout", ComponentKind::Layout));
        let layout = LiveObject::Component(Component::new_ref(d));
        assert_eq!(layout.kind(), "layout");
        assert!(layout.as_component_of(ComponentKind::Layout).is_some());
        assert!(layout.as_component_of(ComponentKind::Appender).is_none());
        assert!(!layout.same(&a));
    }

    #[test]
    fn property_setter_capability() {
        let text = LiveObject::Text("t".to_owned());
        assert!(text.with_property_setter(|_| ()).is_none());

        let repo = LoggerRepository::new_ref();
        let obj = LiveObject::Repository(Rc::clone(&repo));
        let result = obj.with_property_setter(|s| s.set_property("app", "billing"));
        assert!(matches!(result, Some(Ok(()))));
        assert_eq!(repo.borrow().property("app"), Some("billing"));
    }

    #[test]
    fn appender_key_is_namespaced() {
        assert_eq!(appender_key("A"), "appender:A");
        assert_ne!(appender_key("A"), "A");
    }
}
