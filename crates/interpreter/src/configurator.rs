//! 설정기 -- 기본 규칙으로 문서를 해석해 로거 저장소를 설정합니다.
//!
//! # 처리 순서
//! 1. 크기 제한 검사
//! 2. [`JoranDocument`]로 이벤트 기록 (형식 오류면 어떤 액션도 실행하지 않고 `Err`)
//! 3. 새 인터프리터에 저장소를 스택 바닥으로 넣고 기록을 재생
//! 4. 에러 목록과 카운터를 [`ConfigurationReport`]로 반환
//!
//! # 사용 예시
//! ```ignore
//! let configurator = JoranConfigurator::from_config(&config);
//! let repository = LoggerRepository::new_ref();
//! let report = configurator.configure_file("log4j.xml", &repository).await?;
//! for error in &report.errors {
//!     eprintln!("{error}");
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::rc::Rc;
use std::time::Instant;

use joran_core::config::{DEFAULT_MAX_DEPTH, DEFAULT_MAX_DOCUMENT_BYTES, JoranConfig};
use joran_core::error::{JoranError, ParseError};
use joran_core::metrics as m;
use joran_core::repository::RepositoryRef;
use joran_core::types::ErrorItem;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::action::{
    Action, ActionFactory, AppenderAction, AppenderRefAction, ConfigurationAction,
    ConversionRuleAction, ImplicitAction, LayoutAction, LevelAction, LoggerAction,
    LoggerFactoryAction, NestComponentIA, NewRuleAction, ParamAction, PluginAction,
    RepositoryPropertyAction, RootLoggerAction, SubstitutionPropertyAction,
};
use crate::context::{ExecutionContext, LiveObject};
use crate::document::JoranDocument;
use crate::interpreter::Interpreter;
use crate::registry::ComponentRegistry;
use crate::rule_store::RuleStore;
use crate::xml::XmlDriver;

/// 설정 실행 결과
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfigurationReport {
    /// 복구 가능한 에러 (기록 순서)
    pub errors: Vec<ErrorItem>,
    /// 파서 경고
    pub warnings: Vec<ErrorItem>,
    /// 처리된 요소 수
    pub elements: u64,
    /// 스킵된 요소 수
    pub skipped: u64,
    /// 네임스페이스 필터로 버려진 이벤트 수
    pub dropped: usize,
}

impl ConfigurationReport {
    /// 에러가 하나도 없는지 여부 (경고는 무시)
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// 설정기
#[derive(Debug, Clone)]
pub struct JoranConfigurator {
    registry: Rc<ComponentRegistry>,
    namespaces: Vec<String>,
    implicit_nesting: bool,
    max_depth: usize,
    max_document_bytes: usize,
    substitution: BTreeMap<String, String>,
}

impl Default for JoranConfigurator {
    fn default() -> Self {
        Self::new()
    }
}

impl JoranConfigurator {
    /// 기본 컴포넌트 레지스트리와 기본 제한으로 생성합니다.
    pub fn new() -> Self {
        Self {
            registry: Rc::new(ComponentRegistry::with_builtins()),
            namespaces: Vec::new(),
            implicit_nesting: true,
            max_depth: DEFAULT_MAX_DEPTH,
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
            substitution: BTreeMap::new(),
        }
    }

    /// `[interpreter]`, `[substitution]` 설정으로 생성합니다.
    pub fn from_config(config: &JoranConfig) -> Self {
        Self {
            namespaces: config.interpreter.namespaces.clone(),
            implicit_nesting: config.interpreter.implicit_nesting,
            max_depth: config.interpreter.max_depth,
            max_document_bytes: config.interpreter.max_document_bytes,
            substitution: config.substitution.clone(),
            ..Self::new()
        }
    }

    /// 컴포넌트 레지스트리를 교체합니다.
    pub fn with_registry(mut self, registry: ComponentRegistry) -> Self {
        self.registry = Rc::new(registry);
        self
    }

    /// 초기 치환 속성을 추가합니다.
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.substitution.insert(name.into(), value.into());
        self
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// `newRule`이 참조할 수 있는 액션 팩토리
    pub fn action_factory(&self) -> ActionFactory {
        ActionFactory::with_builtins(Rc::clone(&self.registry))
    }

    /// 기본 규칙 테이블
    pub fn default_rule_store(&self) -> RuleStore {
        let factory = Rc::new(self.action_factory());
        let appender_ref: Rc<dyn Action> = Rc::new(AppenderRefAction);
        let level: Rc<dyn Action> = Rc::new(LevelAction);
        let conversion_rule: Rc<dyn Action> = Rc::new(ConversionRuleAction);
        let logger_factory: Rc<dyn Action> =
            Rc::new(LoggerFactoryAction::new(Rc::clone(&self.registry)));

        let mut store = RuleStore::new();
        store.add_rule_str("configuration", Rc::new(ConfigurationAction));
        store.add_rule_str(
            "configuration/substitutionProperty",
            Rc::new(SubstitutionPropertyAction),
        );
        store.add_rule_str(
            "configuration/repositoryProperty",
            Rc::new(RepositoryPropertyAction),
        );
        store.add_rule_str("configuration/newRule", Rc::new(NewRuleAction::new(factory)));
        store.add_rule_str("configuration/conversionRule", Rc::clone(&conversion_rule));
        store.add_rule_str(
            "configuration/plugin",
            Rc::new(PluginAction::new(Rc::clone(&self.registry))),
        );

        store.add_rule_str("configuration/logger", Rc::new(LoggerAction));
        store.add_rule_str("configuration/categoryFactory", Rc::clone(&logger_factory));
        store.add_rule_str("configuration/loggerFactory", logger_factory);
        store.add_rule_str("configuration/logger/level", Rc::clone(&level));
        store.add_rule_str("configuration/logger/priority", Rc::clone(&level));
        store.add_rule_str("configuration/root", Rc::new(RootLoggerAction));
        store.add_rule_str("configuration/root/level", Rc::clone(&level));
        store.add_rule_str("configuration/root/priority", level);

        store.add_rule_str("configuration/logger/appender-ref", Rc::clone(&appender_ref));
        store.add_rule_str("configuration/root/appender-ref", Rc::clone(&appender_ref));
        store.add_rule_str("configuration/appender/appender-ref", appender_ref);

        store.add_rule_str(
            "configuration/appender",
            Rc::new(AppenderAction::new(Rc::clone(&self.registry))),
        );
        store.add_rule_str(
            "configuration/appender/layout",
            Rc::new(LayoutAction::new(Rc::clone(&self.registry))),
        );
        store.add_rule_str("configuration/appender/layout/conversionRule", conversion_rule);
        store.add_rule_str("*/param", Rc::new(ParamAction));
        store
    }

    /// 등록 순서대로의 암시적 액션
    pub fn implicit_actions(&self) -> Vec<Rc<dyn ImplicitAction>> {
        let mut actions: Vec<Rc<dyn ImplicitAction>> = Vec::new();
        if self.implicit_nesting {
            actions.push(Rc::new(NestComponentIA::new(Rc::clone(&self.registry))));
        }
        actions
    }

    /// 문자열로 주어진 문서로 저장소를 설정합니다.
    ///
    /// 형식 오류, 크기/깊이 제한 위반은 `Err`이며 저장소는 변경되지 않습니다.
    /// 개별 요소의 실패는 보고서의 `errors`에 담깁니다.
    pub fn configure_str(
        &self,
        xml: &str,
        repository: &RepositoryRef,
    ) -> Result<ConfigurationReport, JoranError> {
        let started = Instant::now();
        let result = self.run(xml, repository);

        let outcome = match &result {
            Ok(report) if report.is_clean() => "clean",
            Ok(_) => "errors",
            Err(_) => "fatal",
        };
        metrics::counter!(m::CONFIGURATIONS_TOTAL, m::LABEL_RESULT => outcome).increment(1);
        metrics::histogram!(m::CONFIGURE_DURATION_SECONDS)
            .record(started.elapsed().as_secs_f64());
        result
    }

    /// 파일에서 문서를 읽어 저장소를 설정합니다.
    pub async fn configure_file(
        &self,
        path: impl AsRef<Path>,
        repository: &RepositoryRef,
    ) -> Result<ConfigurationReport, JoranError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        if bytes.len() > self.max_document_bytes {
            return Err(ParseError::TooLarge {
                size: bytes.len(),
                max: self.max_document_bytes,
            }
            .into());
        }
        let xml = String::from_utf8(bytes)
            .map_err(|e| ParseError::UnsupportedEncoding(e.to_string()))?;
        info!(path = %path.display(), bytes = xml.len(), "configuring from file");
        self.configure_str(&xml, repository)
    }

    fn run(
        &self,
        xml: &str,
        repository: &RepositoryRef,
    ) -> Result<ConfigurationReport, JoranError> {
        if xml.len() > self.max_document_bytes {
            return Err(ParseError::TooLarge {
                size: xml.len(),
                max: self.max_document_bytes,
            }
            .into());
        }

        let mut document = JoranDocument::new(self.namespaces.clone());
        XmlDriver::new()
            .with_max_depth(self.max_depth)
            .drive(xml, &mut document)?;
        debug!(
            events = document.events().len(),
            dropped = document.dropped(),
            "document recorded"
        );

        let mut context = ExecutionContext::new();
        context.set_max_expanded_bytes(self.max_document_bytes);
        for (name, value) in &self.substitution {
            context.set_property(name.clone(), value.clone());
        }
        context.push_object(LiveObject::Repository(Rc::clone(repository)));

        let mut interpreter = Interpreter::with_context(self.default_rule_store(), context);
        for action in self.implicit_actions() {
            interpreter.add_implicit_action(action);
        }
        document.replay(&mut interpreter)?;

        let elements = interpreter.elements();
        let skipped = interpreter.skipped();
        let mut context = interpreter.into_context();

        let repository_object = LiveObject::Repository(Rc::clone(repository));
        if context.object_stack_len() != 1
            || !context
                .try_peek_object()
                .is_some_and(|top| top.same(&repository_object))
        {
            warn!(
                depth = context.object_stack_len(),
                "object stack is unbalanced after interpretation"
            );
        }

        let report = ConfigurationReport {
            errors: context.take_errors(),
            warnings: document.warnings().to_vec(),
            elements,
            skipped,
            dropped: document.dropped(),
        };
        info!(
            elements = report.elements,
            errors = report.errors.len(),
            warnings = report.warnings.len(),
            skipped = report.skipped,
            "configuration finished"
        );
        Ok(report)
    }
}
