//! `<configuration>` 루트 요소

use joran_core::types::{Attributes, Level};
use tracing::{debug, info};

use super::{Action, optional_attribute, top_object, unexpected};
use crate::context::ExecutionContext;
use crate::error::ActionError;

/// 루트 요소의 `debug`, `reset`, `threshold` 속성을 저장소에 적용합니다.
///
/// 스택 최상단이 로거 저장소여야 합니다.
#[derive(Debug, Default)]
pub struct ConfigurationAction;

impl Action for ConfigurationAction {
    fn begin(
        &self,
        ctx: &mut ExecutionContext,
        name: &str,
        attributes: &Attributes,
    ) -> Result<(), ActionError> {
        let top = top_object(ctx, name)?;
        let repository = top
            .as_repository()
            .cloned()
            .ok_or_else(|| unexpected("repository", top))?;

        let debug_flag = optional_attribute(ctx, attributes, "debug");
        let reset = optional_attribute(ctx, attributes, "reset");
        let threshold = optional_attribute(ctx, attributes, "threshold")
            .map(|value| {
                value
                    .parse::<Level>()
                    .map_err(|_| ActionError::InvalidLevel { value })
            })
            .transpose()?;

        let mut repository = repository.borrow_mut();
        if let Some(flag) = debug_flag {
            let enabled = flag.trim().eq_ignore_ascii_case("true");
            repository.set_debug(enabled);
            debug!(enabled, "internal debug flag set");
        }
        if reset.is_some_and(|r| r.trim().eq_ignore_ascii_case("true")) {
            info!("resetting repository configuration");
            repository.reset_configuration();
        }
        if let Some(threshold) = threshold {
            repository.set_threshold(threshold);
            debug!(%threshold, "repository threshold set");
        }
        Ok(())
    }

    fn end(&self, _ctx: &mut ExecutionContext, _name: &str) -> Result<(), ActionError> {
        debug!("end of configuration");
        Ok(())
    }
}
