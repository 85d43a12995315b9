//! 속성 정의 액션
//!
//! - [`SubstitutionPropertyAction`]: `<substitutionProperty name= value=>` 치환 테이블에 추가
//! - [`RepositoryPropertyAction`]: `<repositoryProperty name= value=>` 로거 저장소 속성 설정

use joran_core::component::PropertySetter;
use joran_core::types::Attributes;
use tracing::debug;

use super::{Action, bottom_repository, required_attribute};
use crate::context::ExecutionContext;
use crate::error::ActionError;

/// 이후 요소의 `${name}` 치환에 쓰일 속성을 정의합니다.
#[derive(Debug, Default)]
pub struct SubstitutionPropertyAction;

impl Action for SubstitutionPropertyAction {
    fn begin(
        &self,
        ctx: &mut ExecutionContext,
        name: &str,
        attributes: &Attributes,
    ) -> Result<(), ActionError> {
        let key = required_attribute(ctx, name, attributes, "name")?;
        let value = required_attribute(ctx, name, attributes, "value")?;
        debug!(key = %key, value = %value, "substitution property defined");
        ctx.set_property(key, value);
        Ok(())
    }

    fn end(&self, _ctx: &mut ExecutionContext, _name: &str) -> Result<(), ActionError> {
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct RepositoryPropertyAction;

impl Action for RepositoryPropertyAction {
    fn begin(
        &self,
        ctx: &mut ExecutionContext,
        name: &str,
        attributes: &Attributes,
    ) -> Result<(), ActionError> {
        let key = required_attribute(ctx, name, attributes, "name")?;
        let value = required_attribute(ctx, name, attributes, "value")?;
        let repository = bottom_repository(ctx, name)?;
        repository.borrow_mut().set_property(&key, &value)?;
        debug!(key = %key, value = %value, "repository property set");
        Ok(())
    }

    fn end(&self, _ctx: &mut ExecutionContext, _name: &str) -> Result<(), ActionError> {
        Ok(())
    }
}
