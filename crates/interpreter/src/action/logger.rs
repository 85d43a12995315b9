//! 로거 관련 액션
//!
//! - [`LoggerAction`]: `<logger name= additivity=>` 로거를 스택에 push
//! - [`RootLoggerAction`]: `<root>` 루트 로거를 스택에 push
//! - [`LevelAction`]: `<level value=>`, `<priority value=>` 최상단 로거의 레벨 설정
//! - [`AppenderRefAction`]: `<appender-ref ref=>` 이름으로 어펜더를 찾아 연결

use std::rc::Rc;

use joran_core::component::{ComponentKind, PropertySetter};
use joran_core::repository::LoggerRef;
use joran_core::types::{Attributes, Level};
use tracing::debug;

use super::{
    Action, bottom_repository, optional_attribute, pop_expected, required_attribute, top_object,
    unexpected,
};
use crate::context::{ExecutionContext, LiveObject, appender_key};
use crate::error::{ActionError, Skip};

/// 이름 있는 로거를 설정합니다.
///
/// 실패하면 하위 요소(레벨, 어펜더 참조)를 건너뜁니다.
#[derive(Debug, Default)]
pub struct LoggerAction;

impl Action for LoggerAction {
    fn begin(
        &self,
        ctx: &mut ExecutionContext,
        name: &str,
        attributes: &Attributes,
    ) -> Result<(), ActionError> {
        let logger =
            resolve_logger(ctx, name, attributes).map_err(|e| e.skipping(Skip::Children))?;
        ctx.push_object(LiveObject::Logger(logger));
        Ok(())
    }

    fn end(&self, ctx: &mut ExecutionContext, name: &str) -> Result<(), ActionError> {
        pop_expected(ctx, name, "logger", |o| o.as_logger().is_some())?;
        Ok(())
    }
}

fn resolve_logger(
    ctx: &ExecutionContext,
    name: &str,
    attributes: &Attributes,
) -> Result<LoggerRef, ActionError> {
    let repository = bottom_repository(ctx, name)?;
    let logger_name = required_attribute(ctx, name, attributes, "name")?;
    let additivity = optional_attribute(ctx, attributes, "additivity");

    let logger = repository.borrow_mut().get_logger(&logger_name);
    if let Some(additivity) = additivity {
        logger.borrow_mut().set_property("additivity", &additivity)?;
    }
    debug!(logger = %logger_name, "configuring logger");
    Ok(logger)
}

/// 루트 로거를 설정합니다.
#[derive(Debug, Default)]
pub struct RootLoggerAction;

impl Action for RootLoggerAction {
    fn begin(
        &self,
        ctx: &mut ExecutionContext,
        name: &str,
        _attributes: &Attributes,
    ) -> Result<(), ActionError> {
        let repository = bottom_repository(ctx, name).map_err(|e| e.skipping(Skip::Children))?;
        let root = repository.borrow().root();
        debug!("configuring root logger");
        ctx.push_object(LiveObject::Logger(root));
        Ok(())
    }

    fn end(&self, ctx: &mut ExecutionContext, name: &str) -> Result<(), ActionError> {
        pop_expected(ctx, name, "logger", |o| o.as_logger().is_some())?;
        Ok(())
    }
}

/// 최상단 로거의 레벨을 설정합니다.
///
/// `inherited`/`null`은 부모 레벨 상속을 뜻하며 루트 로거에는 쓸 수 없습니다.
#[derive(Debug, Default)]
pub struct LevelAction;

impl Action for LevelAction {
    fn begin(
        &self,
        ctx: &mut ExecutionContext,
        name: &str,
        attributes: &Attributes,
    ) -> Result<(), ActionError> {
        let value = required_attribute(ctx, name, attributes, "value")?;
        let top = top_object(ctx, name)?;
        let logger = top
            .as_logger()
            .cloned()
            .ok_or_else(|| unexpected("logger", top))?;

        let trimmed = value.trim();
        let level = if trimmed.eq_ignore_ascii_case("inherited") || trimmed.eq_ignore_ascii_case("null")
        {
            let is_root = bottom_repository(ctx, name)
                .map(|r| Rc::ptr_eq(&r.borrow().root(), &logger))
                .unwrap_or(false);
            if is_root {
                return Err(ActionError::InvalidLevel { value });
            }
            None
        } else {
            Some(
                trimmed
                    .parse::<Level>()
                    .map_err(|_| ActionError::InvalidLevel {
                        value: value.clone(),
                    })?,
            )
        };

        let mut logger = logger.borrow_mut();
        debug!(logger = logger.name(), level = ?level, "level set");
        logger.set_level(level);
        Ok(())
    }

    fn end(&self, _ctx: &mut ExecutionContext, _name: &str) -> Result<(), ActionError> {
        Ok(())
    }
}

/// 이름으로 등록된 어펜더를 최상단 로거 또는 어펜더에 연결합니다.
#[derive(Debug, Default)]
pub struct AppenderRefAction;

impl Action for AppenderRefAction {
    fn begin(
        &self,
        ctx: &mut ExecutionContext,
        name: &str,
        attributes: &Attributes,
    ) -> Result<(), ActionError> {
        let appender_name = required_attribute(ctx, name, attributes, "ref")?;
        let appender = ctx
            .object(&appender_key(&appender_name))
            .and_then(|o| o.as_component_of(ComponentKind::Appender))
            .cloned()
            .ok_or_else(|| ActionError::UnknownAppender {
                name: appender_name.clone(),
            })?;

        match top_object(ctx, name)? {
            LiveObject::Logger(logger) => {
                debug!(logger = logger.borrow().name(), appender = %appender_name, "attaching appender");
                logger.borrow_mut().add_appender(appender);
            }
            LiveObject::Component(target) if target.borrow().kind() == ComponentKind::Appender => {
                if Rc::ptr_eq(target, &appender) {
                    return Err(ActionError::UnexpectedObject {
                        expected: "another appender".to_owned(),
                        found: format!("appender [{appender_name}] itself"),
                    });
                }
                debug!(appender = %appender_name, "attaching appender reference");
                target.borrow_mut().add_appender_ref(appender);
            }
            other => return Err(unexpected("logger or appender", other)),
        }
        Ok(())
    }

    fn end(&self, _ctx: &mut ExecutionContext, _name: &str) -> Result<(), ActionError> {
        Ok(())
    }
}
