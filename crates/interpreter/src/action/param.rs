//! `*/param` 액션

use joran_core::types::Attributes;
use tracing::debug;

use super::{Action, required_attribute, top_object, unexpected};
use crate::context::ExecutionContext;
use crate::error::ActionError;

/// `<param name= value=>` 최상단 객체에 속성을 설정합니다.
///
/// 최상단 객체에 `PropertySetter` capability가 없으면 에러입니다.
#[derive(Debug, Default)]
pub struct ParamAction;

impl Action for ParamAction {
    fn begin(
        &self,
        ctx: &mut ExecutionContext,
        name: &str,
        attributes: &Attributes,
    ) -> Result<(), ActionError> {
        let key = required_attribute(ctx, name, attributes, "name")?;
        // 값은 빈 문자열도 허용
        let value = attributes
            .get("value")
            .map(|raw| ctx.subst(raw))
            .ok_or_else(|| ActionError::MissingAttribute {
                tag: name.to_owned(),
                attribute: "value".to_owned(),
            })?;

        let top = top_object(ctx, name)?;
        match top.with_property_setter(|setter| setter.set_property(&key, &value)) {
            Some(result) => {
                result?;
                debug!(target_kind = %top.kind(), property = %key, value = %value, "property set");
                Ok(())
            }
            None => Err(unexpected("object with properties", top)),
        }
    }

    fn end(&self, _ctx: &mut ExecutionContext, _name: &str) -> Result<(), ActionError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::LiveObject;
    use crate::registry::ComponentRegistry;
    use joran_core::component::PropertyError;
    use joran_core::repository::LoggerRepository;
    use std::rc::Rc;

    #[test]
    fn sets_component_property_with_substitution() {
        let registry = ComponentRegistry::with_builtins();
        let appender = registry.instantiate("FileAppender").unwrap();
        let mut ctx = ExecutionContext::new();
        ctx.set_property("dir", "/tmp/logs");
        ctx.push_object(LiveObject::Component(Rc::clone(&appender)));

        let attrs = Attributes::new()
            .with("name", "file")
            .with("value", "${dir}/app.log");
        ParamAction.begin(&mut ctx, "param", &attrs).unwrap();
        assert_eq!(appender.borrow().property("File"), Some("/tmp/logs/app.log"));
    }

    #[test]
    fn unknown_property_is_reported() {
        let registry = ComponentRegistry::with_builtins();
        let layout = registry.instantiate("SimpleLayout").unwrap();
        let mut ctx = ExecutionContext::new();
        ctx.push_object(LiveObject::Component(layout));

        let attrs = Attributes::new().with("name", "Colour").with("value", "red");
        let err = ParamAction.begin(&mut ctx, "param", &attrs).unwrap_err();
        assert!(matches!(
            err,
            ActionError::Property(PropertyError::Unknown { .. })
        ));
    }

    #[test]
    fn works_on_repository_and_rejects_text() {
        let repo = LoggerRepository::new_ref();
        let mut ctx = ExecutionContext::new();
        ctx.push_object(LiveObject::Repository(Rc::clone(&repo)));
        let attrs = Attributes::new().with("name", "owner").with("value", "ops");
        ParamAction.begin(&mut ctx, "param", &attrs).unwrap();
        assert_eq!(repo.borrow().property("owner"), Some("ops"));

        ctx.push_object(LiveObject::Text("t".to_owned()));
        let err = ParamAction.begin(&mut ctx, "param", &attrs).unwrap_err();
        assert!(matches!(err, ActionError::UnexpectedObject { .. }));
    }

    #[test]
    fn empty_value_is_allowed() {
        let repo = LoggerRepository::new_ref();
        let mut ctx = ExecutionContext::new();
        ctx.push_object(LiveObject::Repository(Rc::clone(&repo)));
        let attrs = Attributes::new().with("name", "note").with("value", "");
        ParamAction.begin(&mut ctx, "param", &attrs).unwrap();
        assert_eq!(repo.borrow().property("note"), Some(""));
    }
}
