//! 설정 대상 컴포넌트 -- 어펜더, 레이아웃, 필터 등
//!
//! 리플렉션 대신 클래스별 [`ComponentDescriptor`] 테이블로 속성 이름과
//! 중첩 컴포넌트 포함 방식을 선언합니다. 액션은 [`PropertySetter`]
//! capability만 사용하므로 구체 타입을 알 필요가 없습니다.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde::Serialize;

/// 공유 컴포넌트 핸들
///
/// 하나의 컴포넌트가 객체 스택, 객체 맵, 로거의 어펜더 목록에 동시에
/// 존재할 수 있으므로 공유 소유권을 사용합니다. 인터프리터 실행은
/// 단일 스레드이므로 `Rc<RefCell<_>>`로 충분합니다.
pub type ComponentRef = Rc<RefCell<Component>>;

/// 컴포넌트 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Appender,
    Layout,
    Filter,
    RollingPolicy,
    TriggeringPolicy,
    ErrorHandler,
    /// 저장소에 붙어 독립적으로 동작하는 플러그인 (리시버 등)
    Plugin,
    LoggerFactory,
    Other,
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Appender => "appender",
            Self::Layout => "layout",
            Self::Filter => "filter",
            Self::RollingPolicy => "rolling policy",
            Self::TriggeringPolicy => "triggering policy",
            Self::ErrorHandler => "error handler",
            Self::Plugin => "plugin",
            Self::LoggerFactory => "logger factory",
            Self::Other => "component",
        };
        f.write_str(s)
    }
}

/// 중첩 컴포넌트의 포함 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Containment {
    /// 단일 속성으로 설정 (같은 태그가 다시 오면 교체)
    AsProperty,
    /// 컬렉션에 추가 (반복 가능)
    AsCollection,
}

/// 속성 설정 에러
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PropertyError {
    /// 선언되지 않은 속성
    #[error("no property '{name}' in {class}")]
    Unknown { name: String, class: String },

    /// 값 변환 실패
    #[error("invalid value '{value}' for property '{name}': {reason}")]
    InvalidValue {
        name: String,
        value: String,
        reason: String,
    },

    /// 필수 속성 누락 (활성화 시점에 검사)
    #[error("{class} requires property '{name}'")]
    Missing { class: String, name: String },
}

/// 속성 설정 capability
///
/// 문자열 값을 이름으로 설정하고, 중첩 태그를 어떻게 포함할지 알려줍니다.
pub trait PropertySetter {
    /// 속성을 설정합니다.
    fn set_property(&mut self, name: &str, value: &str) -> Result<(), PropertyError>;

    /// 중첩 태그의 포함 방식을 반환합니다. 포함할 수 없으면 `None`.
    fn containment(&self, _tag: &str) -> Option<Containment> {
        None
    }
}

/// 허용 속성 스키마
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertySchema {
    /// 어떤 이름이든 허용
    Any,
    /// 선언된 이름만 허용 (대소문자 무시)
    Only(Vec<String>),
}

/// 중첩 가능한 컴포넌트 선언
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedSpec {
    /// 중첩 태그명
    pub tag: String,
    /// 포함 방식
    pub containment: Containment,
}

/// 클래스별 컴포넌트 선언
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentDescriptor {
    /// 클래스명 (설정 문서의 `class` 속성 값)
    pub class: String,
    /// 종류
    pub kind: ComponentKind,
    /// 허용 속성
    pub properties: PropertySchema,
    /// 활성화 시 필수 속성
    pub required: Vec<String>,
    /// 중첩 컴포넌트
    pub nested: Vec<NestedSpec>,
}

impl ComponentDescriptor {
    pub fn new(class: impl Into<String>, kind: ComponentKind) -> Self {
        Self {
            class: class.into(),
            kind,
            properties: PropertySchema::Any,
            required: Vec::new(),
            nested: Vec::new(),
        }
    }

    /// 허용 속성을 제한합니다.
    pub fn with_properties(mut self, names: &[&str]) -> Self {
        self.properties = PropertySchema::Only(names.iter().map(|n| (*n).to_owned()).collect());
        self
    }

    /// 필수 속성을 지정합니다.
    pub fn with_required(mut self, names: &[&str]) -> Self {
        self.required = names.iter().map(|n| (*n).to_owned()).collect();
        self
    }

    /// 중첩 컴포넌트를 선언합니다.
    pub fn with_nested(mut self, tag: &str, containment: Containment) -> Self {
        self.nested.push(NestedSpec {
            tag: tag.to_owned(),
            containment,
        });
        self
    }

    /// 스키마에 맞는 정규화된 속성 이름을 반환합니다.
    fn canonical_property(&self, name: &str) -> Option<String> {
        match &self.properties {
            PropertySchema::Any => Some(name.to_owned()),
            PropertySchema::Only(names) => names
                .iter()
                .find(|n| n.eq_ignore_ascii_case(name))
                .cloned(),
        }
    }
}

/// 설정 중인 컴포넌트 인스턴스
#[derive(Debug, Clone)]
pub struct Component {
    descriptor: Rc<ComponentDescriptor>,
    name: Option<String>,
    properties: BTreeMap<String, String>,
    children: Vec<(String, ComponentRef)>,
    appender_refs: Vec<ComponentRef>,
    conversion_rules: BTreeMap<String, String>,
    active: bool,
}

impl Component {
    pub fn new(descriptor: Rc<ComponentDescriptor>) -> Self {
        Self {
            descriptor,
            name: None,
            properties: BTreeMap::new(),
            children: Vec::new(),
            appender_refs: Vec::new(),
            conversion_rules: BTreeMap::new(),
            active: false,
        }
    }

    /// 공유 핸들로 감싸 생성합니다.
    pub fn new_ref(descriptor: Rc<ComponentDescriptor>) -> ComponentRef {
        Rc::new(RefCell::new(Self::new(descriptor)))
    }

    pub fn kind(&self) -> ComponentKind {
        self.descriptor.kind
    }

    pub fn class(&self) -> &str {
        &self.descriptor.class
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    /// 속성 값을 조회합니다 (대소문자 무시).
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    /// 중첩 컴포넌트를 포함 방식에 따라 연결합니다.
    pub fn attach(&mut self, tag: &str, child: ComponentRef, containment: Containment) {
        if containment == Containment::AsProperty {
            self.children.retain(|(t, _)| t != tag);
        }
        self.children.push((tag.to_owned(), child));
    }

    /// 태그로 중첩 컴포넌트를 조회합니다 (처음 것).
    pub fn child(&self, tag: &str) -> Option<ComponentRef> {
        self.children
            .iter()
            .find(|(t, _)| t == tag)
            .map(|(_, c)| Rc::clone(c))
    }

    /// 태그로 중첩 컴포넌트 목록을 조회합니다.
    pub fn children_of(&self, tag: &str) -> Vec<ComponentRef> {
        self.children
            .iter()
            .filter(|(t, _)| t == tag)
            .map(|(_, c)| Rc::clone(c))
            .collect()
    }

    pub fn children(&self) -> &[(String, ComponentRef)] {
        &self.children
    }

    /// 다른 어펜더를 참조로 추가합니다 (AsyncAppender 등).
    ///
    /// 같은 인스턴스는 한 번만 추가됩니다.
    pub fn add_appender_ref(&mut self, appender: ComponentRef) {
        if !self.appender_refs.iter().any(|a| Rc::ptr_eq(a, &appender)) {
            self.appender_refs.push(appender);
        }
    }

    pub fn appender_refs(&self) -> &[ComponentRef] {
        &self.appender_refs
    }

    /// 설정이 끝난 컴포넌트를 활성화합니다.
    ///
    /// 필수 속성이 빠져 있으면 에러를 반환하고 비활성 상태로 남습니다.
    pub fn activate(&mut self) -> Result<(), PropertyError> {
        for required in &self.descriptor.required {
            if self.property(required).is_none() {
                return Err(PropertyError::Missing {
                    class: self.descriptor.class.clone(),
                    name: required.clone(),
                });
            }
        }
        self.active = true;
        Ok(())
    }

    /// 동작 중인 컴포넌트를 멈춥니다 (교체된 플러그인 등).
    pub fn deactivate(&mut self) {
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// 변환 단어와 변환기 클래스를 등록합니다 (패턴 레이아웃).
    pub fn add_conversion_rule(&mut self, word: impl Into<String>, converter: impl Into<String>) {
        self.conversion_rules.insert(word.into(), converter.into());
    }

    pub fn conversion_rules(&self) -> &BTreeMap<String, String> {
        &self.conversion_rules
    }
}

impl PropertySetter for Component {
    fn set_property(&mut self, name: &str, value: &str) -> Result<(), PropertyError> {
        let Some(canonical) = self.descriptor.canonical_property(name) else {
            return Err(PropertyError::Unknown {
                name: name.to_owned(),
                class: self.descriptor.class.clone(),
            });
        };
        self.properties.insert(canonical, value.to_owned());
        Ok(())
    }

    fn containment(&self, tag: &str) -> Option<Containment> {
        self.descriptor
            .nested
            .iter()
            .find(|n| n.tag == tag)
            .map(|n| n.containment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_appender() -> Rc<ComponentDescriptor> {
        Rc::new(
            ComponentDescriptor::new("FileAppender", ComponentKind::Appender)
                .with_properties(&["File", "Append"])
                .with_required(&["File"])
                .with_nested("layout", Containment::AsProperty)
                .with_nested("filter", Containment::AsCollection),
        )
    }

    #[test]
    fn set_property_normalizes_declared_name() {
        let mut c = Component::new(file_appender());
        c.set_property("file", "/tmp/app.log").unwrap();
        assert_eq!(c.properties().get("File").map(String::as_str), Some("/tmp/app.log"));
        assert_eq!(c.property("FILE"), Some("/tmp/app.log"));
    }

    #[test]
    fn set_unknown_property_fails() {
        let mut c = Component::new(file_appender());
        let err = c.set_property("Target", "System.out").unwrap_err();
        assert!(matches!(err, PropertyError::Unknown { .. }));
        assert!(err.to_string().contains("FileAppender"));
    }

    #[test]
    fn any_schema_accepts_everything() {
        let d = Rc::new(ComponentDescriptor::new("Custom", ComponentKind::Other));
        let mut c = Component::new(d);
        c.set_property("whatever", "1").unwrap();
        assert_eq!(c.property("whatever"), Some("1"));
    }

    #[test]
    fn containment_lookup() {
        let c = Component::new(file_appender());
        assert_eq!(c.containment("layout"), Some(Containment::AsProperty));
        assert_eq!(c.containment("filter"), Some(Containment::AsCollection));
        assert_eq!(c.containment("param"), None);
    }

    #[test]
    fn attach_as_property_replaces_previous_child() {
        let layout = Rc::new(ComponentDescriptor::new("PatternLayout", ComponentKind::Layout));
        let mut c = Component::new(file_appender());
        c.attach("layout", Component::new_ref(Rc::clone(&layout)), Containment::AsProperty);
        c.attach("layout", Component::new_ref(layout), Containment::AsProperty);
        assert_eq!(c.children_of("layout").len(), 1);
    }

    #[test]
    fn attach_as_collection_appends() {
        let filter = Rc::new(ComponentDescriptor::new("DenyAllFilter", ComponentKind::Filter));
        let mut c = Component::new(file_appender());
        c.attach("filter", Component::new_ref(Rc::clone(&filter)), Containment::AsCollection);
        c.attach("filter", Component::new_ref(filter), Containment::AsCollection);
        assert_eq!(c.children_of("filter").len(), 2);
    }

    #[test]
    fn activate_requires_declared_properties() {
        let mut c = Component::new(file_appender());
        let err = c.activate().unwrap_err();
        assert!(matches!(err, PropertyError::Missing { .. }));
        assert!(!c.is_active());

        c.set_property("File", "/var/log/app.log").unwrap();
        c.activate().unwrap();
        assert!(c.is_active());
    }

    #[test]
    fn deactivate_stops_component() {
        let d = Rc::new(ComponentDescriptor::new("SocketReceiver", ComponentKind::Plugin));
        let mut c = Component::new(d);
        c.activate().unwrap();
        c.deactivate();
        assert!(!c.is_active());
        assert_eq!(c.kind().to_string(), "plugin");
    }

    #[test]
    fn conversion_rules_replace_same_word() {
        let d = Rc::new(ComponentDescriptor::new("PatternLayout", ComponentKind::Layout));
        let mut c = Component::new(d);
        c.add_conversion_rule("ip", "com.example.IpConverter");
        c.add_conversion_rule("ip", "com.example.Ipv6Converter");
        assert_eq!(
            c.conversion_rules().get("ip").map(String::as_str),
            Some("com.example.Ipv6Converter")
        );
    }

    #[test]
    fn appender_refs_are_deduplicated() {
        let d = Rc::new(ComponentDescriptor::new("ConsoleAppender", ComponentKind::Appender));
        let target = Component::new_ref(Rc::clone(&d));
        let mut c = Component::new(d);
        c.add_appender_ref(Rc::clone(&target));
        c.add_appender_ref(target);
        assert_eq!(c.appender_refs().len(), 1);
    }
}
