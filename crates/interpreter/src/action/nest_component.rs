//! 중첩 컴포넌트 암시적 액션
//!
//! 규칙이 없는 요소가 최상단 컴포넌트의 선언된 중첩 태그(`filter`,
//! `rollingPolicy`, `errorHandler` 등)이면 `class` 속성으로 컴포넌트를 만들어
//! 부모에 연결합니다.
//!
//! # 3단계 핸드셰이크
//! 1. `is_applicable`: 부모의 포함 방식(`AsProperty`/`AsCollection`)을 결정해 보관
//! 2. `begin`: 보관한 결정을 꺼내 컴포넌트를 생성하고 스택에 push
//! 3. `end`: pop, 활성화 후 결정된 포함 방식으로 부모에 연결
//!
//! 같은 태그의 요소가 중첩될 수 있으므로 결정과 진행 중인 컴포넌트를
//! 스택으로 보관합니다.

use std::cell::RefCell;
use std::rc::Rc;

use joran_core::component::{ComponentRef, Containment, PropertySetter};
use joran_core::types::Attributes;
use tracing::debug;

use super::ImplicitAction;
use super::appender::instantiate;
use super::{pop_expected, top_object, unexpected};
use crate::context::{ExecutionContext, LiveObject};
use crate::error::{ActionError, Skip};
use crate::registry::ComponentRegistry;

/// 진행 중인 중첩 컴포넌트
#[derive(Debug)]
struct Nesting {
    component: ComponentRef,
    containment: Containment,
}

/// 중첩 컴포넌트 암시적 액션
#[derive(Debug)]
pub struct NestComponentIA {
    registry: Rc<ComponentRegistry>,
    /// `is_applicable`에서 내린 결정 (다음 `begin`이 소비)
    decisions: RefCell<Vec<Containment>>,
    active: RefCell<Vec<Nesting>>,
}

impl NestComponentIA {
    pub fn new(registry: Rc<ComponentRegistry>) -> Self {
        Self {
            registry,
            decisions: RefCell::new(Vec::new()),
            active: RefCell::new(Vec::new()),
        }
    }
}

impl ImplicitAction for NestComponentIA {
    fn is_applicable(&self, ctx: &ExecutionContext, name: &str) -> bool {
        let containment = ctx
            .try_peek_object()
            .and_then(LiveObject::as_component)
            .and_then(|parent| parent.borrow().containment(name));
        match containment {
            Some(containment) => {
                self.decisions.borrow_mut().push(containment);
                true
            }
            None => false,
        }
    }

    fn begin(
        &self,
        ctx: &mut ExecutionContext,
        name: &str,
        attributes: &Attributes,
    ) -> Result<(), ActionError> {
        let containment = self
            .decisions
            .borrow_mut()
            .pop()
            .ok_or_else(|| ActionError::UnexpectedObject {
                expected: format!("nesting decision for <{name}>"),
                found: "none".to_owned(),
            })?;

        let component = instantiate(&self.registry, ctx, name, attributes, None)
            .map_err(|e| e.skipping(Skip::Children))?;
        debug!(element = name, ?containment, "nested component");
        ctx.push_object(LiveObject::Component(Rc::clone(&component)));
        self.active.borrow_mut().push(Nesting {
            component,
            containment,
        });
        Ok(())
    }

    fn end(&self, ctx: &mut ExecutionContext, name: &str) -> Result<(), ActionError> {
        let Some(nesting) = self.active.borrow_mut().pop() else {
            return Err(ActionError::EmptyStack {
                tag: name.to_owned(),
            });
        };
        pop_expected(ctx, name, "nested component", |o| {
            o.as_component()
                .is_some_and(|c| Rc::ptr_eq(c, &nesting.component))
        })?;
        nesting.component.borrow_mut().activate()?;

        let parent = top_object(ctx, name)?;
        let parent = parent
            .as_component()
            .ok_or_else(|| unexpected("component", parent))?;
        parent
            .borrow_mut()
            .attach(name, nesting.component, nesting.containment);
        Ok(())
    }
}
