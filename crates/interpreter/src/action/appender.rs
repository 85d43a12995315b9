//! 어펜더와 레이아웃 액션
//!
//! `class` 속성을 [`ComponentRegistry`]로 해석해 컴포넌트를 만들고 스택에
//! push합니다. 요소 끝에서 pop하고 활성화합니다. 생성 실패 시 하위 요소
//! (`param`, `layout`, `filter` 등)는 건너뜁니다.

use std::rc::Rc;

use joran_core::component::{ComponentKind, ComponentRef, Containment};
use joran_core::types::Attributes;
use tracing::{debug, info};

use super::{Action, pop_expected, required_attribute, top_object, unexpected};
use crate::context::{ExecutionContext, LiveObject, appender_key};
use crate::error::{ActionError, Skip};
use crate::registry::ComponentRegistry;

/// `class` 속성으로 기대한 종류의 컴포넌트를 생성합니다.
pub(crate) fn instantiate(
    registry: &ComponentRegistry,
    ctx: &ExecutionContext,
    tag: &str,
    attributes: &Attributes,
    expected: Option<ComponentKind>,
) -> Result<ComponentRef, ActionError> {
    let class = required_attribute(ctx, tag, attributes, "class")?;
    let component = registry.instantiate(&class)?;
    if let Some(expected) = expected {
        let kind = component.borrow().kind();
        if kind != expected {
            return Err(ActionError::UnexpectedObject {
                expected: expected.to_string(),
                found: format!("{kind} [{class}]"),
            });
        }
    }
    debug!(class = %class, element = tag, "component created");
    Ok(component)
}

/// `<appender name= class=>`
///
/// 시작 시점에 객체 맵에 이름으로 등록되므로 뒤따르는 `appender-ref`가
/// 찾을 수 있습니다.
#[derive(Debug)]
pub struct AppenderAction {
    registry: Rc<ComponentRegistry>,
}

impl AppenderAction {
    pub fn new(registry: Rc<ComponentRegistry>) -> Self {
        Self { registry }
    }

    fn create(
        &self,
        ctx: &ExecutionContext,
        tag: &str,
        attributes: &Attributes,
    ) -> Result<(String, ComponentRef), ActionError> {
        let appender_name = required_attribute(ctx, tag, attributes, "name")?;
        let appender = instantiate(
            &self.registry,
            ctx,
            tag,
            attributes,
            Some(ComponentKind::Appender),
        )?;
        appender.borrow_mut().set_name(appender_name.clone());
        Ok((appender_name, appender))
    }
}

impl Action for AppenderAction {
    fn begin(
        &self,
        ctx: &mut ExecutionContext,
        name: &str,
        attributes: &Attributes,
    ) -> Result<(), ActionError> {
        let (appender_name, appender) = self
            .create(ctx, name, attributes)
            .map_err(|e| e.skipping(Skip::Children))?;

        info!(appender = %appender_name, class = appender.borrow().class(), "configuring appender");
        ctx.put_object(
            appender_key(&appender_name),
            LiveObject::Component(Rc::clone(&appender)),
        );
        ctx.push_object(LiveObject::Component(appender));
        Ok(())
    }

    fn end(&self, ctx: &mut ExecutionContext, name: &str) -> Result<(), ActionError> {
        let popped = pop_expected(ctx, name, "appender", |o| {
            o.as_component_of(ComponentKind::Appender).is_some()
        })?;
        if let LiveObject::Component(appender) = popped {
            appender.borrow_mut().activate()?;
        }
        Ok(())
    }
}

/// `<layout class=>` 최상단 어펜더에 레이아웃을 연결합니다.
#[derive(Debug)]
pub struct LayoutAction {
    registry: Rc<ComponentRegistry>,
}

impl LayoutAction {
    pub fn new(registry: Rc<ComponentRegistry>) -> Self {
        Self { registry }
    }

    fn create(
        &self,
        ctx: &ExecutionContext,
        tag: &str,
        attributes: &Attributes,
    ) -> Result<ComponentRef, ActionError> {
        let top = top_object(ctx, tag)?;
        if top.as_component_of(ComponentKind::Appender).is_none() {
            return Err(unexpected("appender", top));
        }
        instantiate(&self.registry, ctx, tag, attributes, Some(ComponentKind::Layout))
    }
}

impl Action for LayoutAction {
    fn begin(
        &self,
        ctx: &mut ExecutionContext,
        name: &str,
        attributes: &Attributes,
    ) -> Result<(), ActionError> {
        let layout = self
            .create(ctx, name, attributes)
            .map_err(|e| e.skipping(Skip::Children))?;
        ctx.push_object(LiveObject::Component(layout));
        Ok(())
    }

    fn end(&self, ctx: &mut ExecutionContext, name: &str) -> Result<(), ActionError> {
        let popped = pop_expected(ctx, name, "layout", |o| {
            o.as_component_of(ComponentKind::Layout).is_some()
        })?;
        let LiveObject::Component(layout) = popped else {
            return Ok(());
        };
        layout.borrow_mut().activate()?;

        let parent = top_object(ctx, name)?;
        let appender = parent
            .as_component_of(ComponentKind::Appender)
            .ok_or_else(|| unexpected("appender", parent))?;
        appender
            .borrow_mut()
            .attach(name, layout, Containment::AsProperty);
        Ok(())
    }
}
