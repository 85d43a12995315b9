//! 저장소에 붙는 컴포넌트 액션
//!
//! - [`PluginAction`]: `<plugin name= class=>` 플러그인을 설정해 저장소에서 시작
//! - [`LoggerFactoryAction`]: `<loggerFactory class=>`, `<categoryFactory class=>`
//!
//! 둘 다 `param` 하위 요소로 속성을 받은 뒤 요소 끝에서 활성화되어 스택
//! 바닥의 로거 저장소에 등록됩니다.

use std::rc::Rc;

use joran_core::component::{ComponentKind, ComponentRef};
use joran_core::types::Attributes;
use tracing::info;

use super::appender::instantiate;
use super::{Action, bottom_repository, optional_attribute, pop_expected, unexpected};
use crate::context::{ExecutionContext, LiveObject};
use crate::error::{ActionError, Skip};
use crate::registry::ComponentRegistry;

/// 활성화된 컴포넌트를 꺼냅니다.
fn pop_activated(
    ctx: &mut ExecutionContext,
    tag: &str,
    kind: ComponentKind,
) -> Result<ComponentRef, ActionError> {
    let popped = pop_expected(ctx, tag, &kind.to_string(), |o| {
        o.as_component_of(kind).is_some()
    })?;
    let component = match popped {
        LiveObject::Component(component) => component,
        other => return Err(unexpected(&kind.to_string(), &other)),
    };
    component.borrow_mut().activate()?;
    Ok(component)
}

/// 플러그인을 설정합니다.
///
/// `name`이 없으면 클래스명이 이름이 됩니다. 같은 이름의 플러그인이 이미
/// 있으면 이전 것은 멈추고 교체됩니다.
#[derive(Debug)]
pub struct PluginAction {
    registry: Rc<ComponentRegistry>,
}

impl PluginAction {
    pub fn new(registry: Rc<ComponentRegistry>) -> Self {
        Self { registry }
    }
}

impl Action for PluginAction {
    fn begin(
        &self,
        ctx: &mut ExecutionContext,
        name: &str,
        attributes: &Attributes,
    ) -> Result<(), ActionError> {
        let plugin = instantiate(
            &self.registry,
            ctx,
            name,
            attributes,
            Some(ComponentKind::Plugin),
        )
        .map_err(|e| e.skipping(Skip::Children))?;

        let plugin_name = optional_attribute(ctx, attributes, "name")
            .unwrap_or_else(|| plugin.borrow().class().to_owned());
        plugin.borrow_mut().set_name(plugin_name);
        ctx.push_object(LiveObject::Component(plugin));
        Ok(())
    }

    fn end(&self, ctx: &mut ExecutionContext, name: &str) -> Result<(), ActionError> {
        let plugin = pop_activated(ctx, name, ComponentKind::Plugin)?;
        let repository = bottom_repository(ctx, name)?;

        let plugin_name = plugin.borrow().name().unwrap_or_default().to_owned();
        info!(plugin = %plugin_name, class = plugin.borrow().class(), "starting plugin");
        if let Some(replaced) = repository
            .borrow_mut()
            .start_plugin(&plugin_name, plugin)
        {
            info!(plugin = %plugin_name, class = replaced.borrow().class(), "previous plugin stopped");
        }
        Ok(())
    }
}

/// 저장소가 로거를 만들 때 쓸 팩토리를 지정합니다.
#[derive(Debug)]
pub struct LoggerFactoryAction {
    registry: Rc<ComponentRegistry>,
}

impl LoggerFactoryAction {
    pub fn new(registry: Rc<ComponentRegistry>) -> Self {
        Self { registry }
    }
}

impl Action for LoggerFactoryAction {
    fn begin(
        &self,
        ctx: &mut ExecutionContext,
        name: &str,
        attributes: &Attributes,
    ) -> Result<(), ActionError> {
        let factory = instantiate(
            &self.registry,
            ctx,
            name,
            attributes,
            Some(ComponentKind::LoggerFactory),
        )
        .map_err(|e| e.skipping(Skip::Children))?;
        ctx.push_object(LiveObject::Component(factory));
        Ok(())
    }

    fn end(&self, ctx: &mut ExecutionContext, name: &str) -> Result<(), ActionError> {
        let factory = pop_activated(ctx, name, ComponentKind::LoggerFactory)?;
        let repository = bottom_repository(ctx, name)?;
        info!(class = factory.borrow().class(), "logger factory set");
        repository.borrow_mut().set_logger_factory(factory);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use joran_core::component::{PropertyError, PropertySetter};
    use joran_core::repository::{LoggerRepository, RepositoryRef};

    fn setup() -> (Rc<ComponentRegistry>, RepositoryRef, ExecutionContext) {
        let repository = LoggerRepository::new_ref();
        let mut ctx = ExecutionContext::new();
        ctx.push_object(LiveObject::Repository(Rc::clone(&repository)));
        (Rc::new(ComponentRegistry::with_builtins()), repository, ctx)
    }

    fn set_param(ctx: &ExecutionContext, name: &str, value: &str) {
        ctx.peek_object()
            .with_property_setter(|s| s.set_property(name, value))
            .unwrap()
            .unwrap();
    }

    #[test]
    fn plugin_is_started_on_repository() {
        let (registry, repository, mut ctx) = setup();
        let action = PluginAction::new(registry);
        let attrs = Attributes::new()
            .with("name", "remote")
            .with("class", "org.apache.log4j.net.SocketReceiver");

        action.begin(&mut ctx, "plugin", &attrs).unwrap();
        set_param(&ctx, "Port", "4560");
        action.end(&mut ctx, "plugin").unwrap();

        assert_eq!(ctx.object_stack_len(), 1);
        let plugin = repository.borrow().plugin("remote").unwrap();
        assert!(plugin.borrow().is_active());
        assert_eq!(plugin.borrow().property("Port"), Some("4560"));
    }

    #[test]
    fn plugin_without_name_uses_class() {
        let (registry, repository, mut ctx) = setup();
        let action = PluginAction::new(registry);
        let attrs = Attributes::new().with("class", "UDPReceiver");

        action.begin(&mut ctx, "plugin", &attrs).unwrap();
        set_param(&ctx, "Port", "9991");
        action.end(&mut ctx, "plugin").unwrap();

        assert!(
            repository
                .borrow()
                .plugin("org.apache.log4j.net.UDPReceiver")
                .is_some()
        );
    }

    #[test]
    fn plugin_missing_required_property_is_not_started() {
        let (registry, repository, mut ctx) = setup();
        let action = PluginAction::new(registry);
        let attrs = Attributes::new()
            .with("name", "hub")
            .with("class", "SocketHubReceiver");

        action.begin(&mut ctx, "plugin", &attrs).unwrap();
        let err = action.end(&mut ctx, "plugin").unwrap_err();
        assert!(matches!(
            err,
            ActionError::Property(PropertyError::Missing { .. })
        ));
        assert_eq!(ctx.object_stack_len(), 1);
        assert!(repository.borrow().plugin("hub").is_none());
    }

    #[test]
    fn plugin_class_must_be_a_plugin() {
        let (registry, _repository, mut ctx) = setup();
        let action = PluginAction::new(registry);
        let attrs = Attributes::new().with("class", "ConsoleAppender");

        let err = action.begin(&mut ctx, "plugin", &attrs).unwrap_err();
        assert_eq!(err.skip(), Skip::Children);
        assert!(matches!(err.root(), ActionError::UnexpectedObject { .. }));
        assert_eq!(ctx.object_stack_len(), 1);
    }

    #[test]
    fn logger_factory_is_set_on_repository() {
        let (registry, repository, mut ctx) = setup();
        let action = LoggerFactoryAction::new(registry);
        let attrs = Attributes::new().with("class", "org.apache.log4j.DefaultCategoryFactory");

        action.begin(&mut ctx, "categoryFactory", &attrs).unwrap();
        action.end(&mut ctx, "categoryFactory").unwrap();

        let factory = repository.borrow().logger_factory().unwrap();
        assert_eq!(factory.borrow().kind(), ComponentKind::LoggerFactory);
        assert!(factory.borrow().is_active());
    }

    #[test]
    fn unknown_logger_factory_skips_children() {
        let (registry, repository, mut ctx) = setup();
        let action = LoggerFactoryAction::new(registry);
        let attrs = Attributes::new().with("class", "com.example.NoSuchFactory");

        let err = action.begin(&mut ctx, "loggerFactory", &attrs).unwrap_err();
        assert_eq!(err.skip(), Skip::Children);
        assert!(repository.borrow().logger_factory().is_none());
    }
}
