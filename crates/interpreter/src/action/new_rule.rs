//! 해석 도중 규칙 추가
//!
//! `<newRule pattern="configuration/x" actionClass="ParamAction"/>`는
//! [`ActionFactory`]에서 액션을 만들어 규칙을 대기열에 넣습니다. 인터프리터가
//! 현재 콜백 직후 규칙 저장소에 반영하므로 문서의 나머지 부분에 적용됩니다.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use joran_core::types::Attributes;
use tracing::info;

use super::{
    Action, AppenderAction, AppenderRefAction, ConfigurationAction, ConversionRuleAction,
    LayoutAction, LevelAction, LoggerAction, LoggerFactoryAction, ParamAction, PluginAction,
    RepositoryPropertyAction, RootLoggerAction, SubstitutionPropertyAction, required_attribute,
};
use crate::context::ExecutionContext;
use crate::error::ActionError;
use crate::pattern::Pattern;
use crate::registry::ComponentRegistry;

type Constructor = Rc<dyn Fn() -> Rc<dyn Action>>;

/// 액션 이름 -> 생성자 테이블
///
/// 이름은 전체 이름(`org.apache.log4j.joran.action.ParamAction`)이나 마지막
/// 구성 요소(`ParamAction`)로 조회합니다.
#[derive(Clone, Default)]
pub struct ActionFactory {
    constructors: BTreeMap<String, Constructor>,
}

impl ActionFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// 기본 액션이 등록된 팩토리
    pub fn with_builtins(registry: Rc<ComponentRegistry>) -> Self {
        let mut factory = Self::new();
        factory.register("ConfigurationAction", || ConfigurationAction);
        factory.register("SubstitutionPropertyAction", || SubstitutionPropertyAction);
        factory.register("RepositoryPropertyAction", || RepositoryPropertyAction);
        factory.register("LoggerAction", || LoggerAction);
        factory.register("RootLoggerAction", || RootLoggerAction);
        factory.register("LevelAction", || LevelAction);
        factory.register("PriorityAction", || LevelAction);
        factory.register("AppenderRefAction", || AppenderRefAction);
        factory.register("ParamAction", || ParamAction);
        factory.register("ConversionRuleAction", || ConversionRuleAction);

        let appenders = Rc::clone(&registry);
        factory.register("AppenderAction", move || {
            AppenderAction::new(Rc::clone(&appenders))
        });
        let plugins = Rc::clone(&registry);
        factory.register("PluginAction", move || PluginAction::new(Rc::clone(&plugins)));
        let factories = Rc::clone(&registry);
        factory.register("LoggerFactoryAction", move || {
            LoggerFactoryAction::new(Rc::clone(&factories))
        });
        factory.register("LayoutAction", move || LayoutAction::new(Rc::clone(&registry)));
        factory
    }

    /// 생성자를 등록합니다. 같은 이름은 교체됩니다.
    pub fn register<A, F>(&mut self, name: &str, constructor: F)
    where
        A: Action + 'static,
        F: Fn() -> A + 'static,
    {
        let constructor: Constructor = Rc::new(move || Rc::new(constructor()) as Rc<dyn Action>);
        self.constructors
            .insert(simple_name(name).to_owned(), constructor);
    }

    /// 이름으로 새 액션을 만듭니다.
    pub fn create(&self, name: &str) -> Result<Rc<dyn Action>, ActionError> {
        self.constructors
            .get(simple_name(name.trim()))
            .map(|constructor| constructor())
            .ok_or_else(|| ActionError::UnknownClass {
                class: name.to_owned(),
            })
    }

    /// 등록된 이름 (정렬됨)
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }
}

impl fmt::Debug for ActionFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.constructors.keys()).finish()
    }
}

fn simple_name(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

/// `<newRule pattern= actionClass=>`
#[derive(Debug)]
pub struct NewRuleAction {
    factory: Rc<ActionFactory>,
}

impl NewRuleAction {
    pub fn new(factory: Rc<ActionFactory>) -> Self {
        Self { factory }
    }
}

impl Action for NewRuleAction {
    fn begin(
        &self,
        ctx: &mut ExecutionContext,
        name: &str,
        attributes: &Attributes,
    ) -> Result<(), ActionError> {
        let literal = required_attribute(ctx, name, attributes, "pattern")?;
        let class = required_attribute(ctx, name, attributes, "actionClass")?;

        let pattern = Pattern::parse(&literal);
        if pattern.is_empty() {
            return Err(ActionError::InvalidPattern { pattern: literal });
        }
        let action = self.factory.create(&class)?;
        info!(pattern = %pattern, action = %class, "new rule requested");
        ctx.queue_rule(pattern, action);
        Ok(())
    }

    fn end(&self, _ctx: &mut ExecutionContext, _name: &str) -> Result<(), ActionError> {
        Ok(())
    }
}
