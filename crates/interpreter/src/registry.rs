//! 컴포넌트 레지스트리 -- 클래스명에서 컴포넌트 선언으로의 매핑
//!
//! 설정 문서의 `class` 속성 값을 [`ComponentDescriptor`]로 해석합니다.
//! 전체 클래스명(`org.apache.log4j.ConsoleAppender`)과 단순 이름
//! (`ConsoleAppender`) 모두로 조회할 수 있습니다.

use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use joran_core::component::{Component, ComponentDescriptor, ComponentKind, ComponentRef, Containment};

use crate::error::ActionError;

/// 컴포넌트 레지스트리
#[derive(Debug, Clone, Default)]
pub struct ComponentRegistry {
    /// 전체 클래스명 -> 선언
    descriptors: BTreeMap<String, Rc<ComponentDescriptor>>,
    /// 단순 이름 -> 전체 클래스명
    aliases: HashMap<String, String>,
}

impl ComponentRegistry {
    /// 빈 레지스트리를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 기본 어펜더, 레이아웃, 필터, 롤링 정책, 플러그인이 등록된 레지스트리
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for descriptor in builtin_descriptors() {
            registry.register(descriptor);
        }
        registry
    }

    /// 선언을 등록합니다. 같은 클래스명이 있으면 교체됩니다.
    pub fn register(&mut self, descriptor: ComponentDescriptor) {
        let class = descriptor.class.clone();
        let simple = simple_name(&class).to_owned();
        if simple != class {
            self.aliases.insert(simple, class.clone());
        }
        self.descriptors.insert(class, Rc::new(descriptor));
    }

    /// 클래스명으로 선언을 조회합니다.
    pub fn descriptor(&self, class: &str) -> Option<Rc<ComponentDescriptor>> {
        let class = class.trim();
        self.descriptors
            .get(class)
            .or_else(|| {
                self.aliases
                    .get(simple_name(class))
                    .and_then(|full| self.descriptors.get(full))
            })
            .map(Rc::clone)
    }

    /// 클래스명으로 새 컴포넌트를 만듭니다.
    pub fn instantiate(&self, class: &str) -> Result<ComponentRef, ActionError> {
        self.descriptor(class)
            .map(Component::new_ref)
            .ok_or_else(|| ActionError::UnknownClass {
                class: class.to_owned(),
            })
    }

    /// 등록된 클래스명 (정렬됨)
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.descriptors.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

fn simple_name(class: &str) -> &str {
    class.rsplit('.').next().unwrap_or(class)
}

fn appender(class: &str, properties: &[&str]) -> ComponentDescriptor {
    ComponentDescriptor::new(class, ComponentKind::Appender)
        .with_properties(properties)
        .with_nested("layout", Containment::AsProperty)
        .with_nested("filter", Containment::AsCollection)
        .with_nested("errorHandler", Containment::AsProperty)
}

fn builtin_descriptors() -> Vec<ComponentDescriptor> {
    vec![
        // 어펜더
        appender(
            "org.apache.log4j.ConsoleAppender",
            &["Name", "Target", "Follow", "Threshold", "ImmediateFlush", "Encoding"],
        ),
        appender(
            "org.apache.log4j.FileAppender",
            &["Name", "File", "Append", "BufferedIO", "BufferSize", "Threshold", "ImmediateFlush", "Encoding"],
        )
        .with_required(&["File"]),
        appender(
            "org.apache.log4j.rolling.RollingFileAppender",
            &["Name", "File", "Append", "BufferedIO", "BufferSize", "Threshold", "ImmediateFlush", "Encoding"],
        )
        .with_nested("rollingPolicy", Containment::AsProperty)
        .with_nested("triggeringPolicy", Containment::AsProperty),
        appender("org.apache.log4j.varia.ListAppender", &["Name", "Threshold"]),
        appender(
            "org.apache.log4j.AsyncAppender",
            &["Name", "BufferSize", "Blocking", "LocationInfo", "Threshold"],
        ),
        // 레이아웃
        ComponentDescriptor::new("org.apache.log4j.PatternLayout", ComponentKind::Layout)
            .with_properties(&["ConversionPattern"]),
        ComponentDescriptor::new("org.apache.log4j.SimpleLayout", ComponentKind::Layout)
            .with_properties(&[]),
        ComponentDescriptor::new("org.apache.log4j.xml.XMLLayout", ComponentKind::Layout)
            .with_properties(&["LocationInfo", "Properties"]),
        // 필터
        ComponentDescriptor::new("org.apache.log4j.varia.LevelRangeFilter", ComponentKind::Filter)
            .with_properties(&["LevelMin", "LevelMax", "AcceptOnMatch"]),
        ComponentDescriptor::new("org.apache.log4j.varia.StringMatchFilter", ComponentKind::Filter)
            .with_properties(&["StringToMatch", "AcceptOnMatch"])
            .with_required(&["StringToMatch"]),
        ComponentDescriptor::new("org.apache.log4j.varia.DenyAllFilter", ComponentKind::Filter)
            .with_properties(&[]),
        // 롤링
        ComponentDescriptor::new(
            "org.apache.log4j.rolling.TimeBasedRollingPolicy",
            ComponentKind::RollingPolicy,
        )
        .with_properties(&["FileNamePattern", "ActiveFileName"])
        .with_required(&["FileNamePattern"]),
        ComponentDescriptor::new(
            "org.apache.log4j.rolling.FixedWindowRollingPolicy",
            ComponentKind::RollingPolicy,
        )
        .with_properties(&["FileNamePattern", "ActiveFileName", "MinIndex", "MaxIndex"])
        .with_required(&["FileNamePattern"]),
        ComponentDescriptor::new(
            "org.apache.log4j.rolling.SizeBasedTriggeringPolicy",
            ComponentKind::TriggeringPolicy,
        )
        .with_properties(&["MaxFileSize"]),
        // 에러 핸들러
        ComponentDescriptor::new(
            "org.apache.log4j.varia.FallbackErrorHandler",
            ComponentKind::ErrorHandler,
        )
        .with_properties(&[]),
        // 플러그인
        ComponentDescriptor::new("org.apache.log4j.net.SocketReceiver", ComponentKind::Plugin)
            .with_properties(&["Port", "Threshold", "Paused"])
            .with_required(&["Port"]),
        ComponentDescriptor::new("org.apache.log4j.net.UDPReceiver", ComponentKind::Plugin)
            .with_properties(&["Port", "Encoding", "Decoder", "Threshold", "Paused"])
            .with_required(&["Port"]),
        ComponentDescriptor::new("org.apache.log4j.net.SocketHubReceiver", ComponentKind::Plugin)
            .with_properties(&["Host", "Port", "ReconnectionDelay", "Threshold"])
            .with_required(&["Host", "Port"]),
        // 로거 팩토리
        ComponentDescriptor::new(
            "org.apache.log4j.DefaultCategoryFactory",
            ComponentKind::LoggerFactory,
        )
        .with_properties(&[]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use joran_core::component::PropertySetter;

    #[test]
    fn builtins_resolve_by_full_and_simple_name() {
        let registry = ComponentRegistry::with_builtins();
        let full = registry.descriptor("org.apache.log4j.ConsoleAppender").unwrap();
        let simple = registry.descriptor("ConsoleAppender").unwrap();
        assert!(Rc::ptr_eq(&full, &simple));
        assert_eq!(full.kind, ComponentKind::Appender);
    }

    #[test]
    fn unknown_class_is_reported() {
        let registry = ComponentRegistry::with_builtins();
        let err = registry.instantiate("com.example.NoSuchAppender").unwrap_err();
        assert!(matches!(err, ActionError::UnknownClass { .. }));
        assert!(err.to_string().contains("com.example.NoSuchAppender"));
    }

    #[test]
    fn instantiated_components_are_independent() {
        let registry = ComponentRegistry::with_builtins();
        let a = registry.instantiate("PatternLayout").unwrap();
        let b = registry.instantiate("PatternLayout").unwrap();
        a.borrow_mut()
            .set_property("ConversionPattern", "%m%n")
            .unwrap();
        assert!(b.borrow().property("ConversionPattern").is_none());
    }

    #[test]
    fn rolling_file_appender_nests_policies() {
        let registry = ComponentRegistry::with_builtins();
        let appender = registry.instantiate("RollingFileAppender").unwrap();
        let appender = appender.borrow();
        assert_eq!(appender.containment("rollingPolicy"), Some(Containment::AsProperty));
        assert_eq!(appender.containment("filter"), Some(Containment::AsCollection));
        assert_eq!(appender.containment("param"), None);
    }

    #[test]
    fn custom_descriptor_can_be_registered() {
        let mut registry = ComponentRegistry::new();
        assert!(registry.is_empty());
        registry.register(ComponentDescriptor::new("com.example.Sink", ComponentKind::Other));
        assert_eq!(registry.len(), 1);
        assert!(registry.instantiate("Sink").is_ok());
        assert_eq!(registry.classes().collect::<Vec<_>>(), vec!["com.example.Sink"]);
    }
}
