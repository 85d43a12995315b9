//! `<conversionRule conversionWord= converterClass=>`
//!
//! 패턴 레이아웃 안에서는 그 레이아웃에만, `<configuration>` 바로 아래에서는
//! 저장소 전체에 변환 규칙을 등록합니다. 변환기 클래스는 이름으로만 기록됩니다.

use joran_core::component::ComponentKind;
use joran_core::types::Attributes;
use tracing::debug;

use super::{Action, required_attribute, top_object, unexpected};
use crate::context::{ExecutionContext, LiveObject};
use crate::error::ActionError;

/// 단순 클래스명이 이것으로 끝나는 레이아웃만 변환 규칙을 받습니다.
const PATTERN_LAYOUT: &str = "PatternLayout";

#[derive(Debug, Default)]
pub struct ConversionRuleAction;

impl Action for ConversionRuleAction {
    fn begin(
        &self,
        ctx: &mut ExecutionContext,
        name: &str,
        attributes: &Attributes,
    ) -> Result<(), ActionError> {
        let word = required_attribute(ctx, name, attributes, "conversionWord")?;
        let converter = required_attribute(ctx, name, attributes, "converterClass")?;

        match top_object(ctx, name)? {
            LiveObject::Component(layout)
                if layout.borrow().kind() == ComponentKind::Layout
                    && layout.borrow().class().ends_with(PATTERN_LAYOUT) =>
            {
                debug!(word = %word, converter = %converter, "conversion rule added to layout");
                layout.borrow_mut().add_conversion_rule(word, converter);
            }
            LiveObject::Repository(repository) => {
                debug!(word = %word, converter = %converter, "conversion rule added to repository");
                repository.borrow_mut().add_conversion_rule(word, converter);
            }
            other => return Err(unexpected("pattern layout or repository", other)),
        }
        Ok(())
    }

    fn end(&self, _ctx: &mut ExecutionContext, _name: &str) -> Result<(), ActionError> {
        Ok(())
    }
}
