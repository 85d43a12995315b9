//! 로거 저장소 -- 설정 문서가 최종적으로 구성하는 객체 그래프
//!
//! [`LoggerRepository`]는 루트 로거와 이름 있는 로거들, 저장소 속성,
//! 임계 레벨, 플러그인, 로거 팩토리, 변환 규칙을 보관합니다. 설정 실행 하나는 단일 스레드에서 진행되므로
//! 공유 핸들은 `Rc<RefCell<_>>`입니다. 같은 저장소에 대한 재설정은
//! 호출자가 직렬화해야 합니다.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::component::{ComponentRef, PropertyError, PropertySetter};
use crate::types::Level;

/// 공유 로거 핸들
pub type LoggerRef = Rc<RefCell<Logger>>;

/// 공유 저장소 핸들
pub type RepositoryRef = Rc<RefCell<LoggerRepository>>;

/// 루트 로거 이름
pub const ROOT_LOGGER_NAME: &str = "root";

/// 로거
#[derive(Debug, Clone)]
pub struct Logger {
    name: String,
    level: Option<Level>,
    additivity: bool,
    appenders: Vec<ComponentRef>,
}

impl Logger {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            level: None,
            additivity: true,
            appenders: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 명시적으로 설정된 레벨 (상속 전)
    pub fn level(&self) -> Option<Level> {
        self.level
    }

    /// `None`이면 부모 레벨을 상속합니다.
    pub fn set_level(&mut self, level: Option<Level>) {
        self.level = level;
    }

    pub fn additivity(&self) -> bool {
        self.additivity
    }

    pub fn set_additivity(&mut self, additivity: bool) {
        self.additivity = additivity;
    }

    /// 어펜더를 붙입니다. 같은 인스턴스는 한 번만 붙습니다.
    pub fn add_appender(&mut self, appender: ComponentRef) {
        if !self.appenders.iter().any(|a| Rc::ptr_eq(a, &appender)) {
            self.appenders.push(appender);
        }
    }

    /// 모든 어펜더를 제거합니다.
    pub fn remove_all_appenders(&mut self) {
        self.appenders.clear();
    }

    pub fn appenders(&self) -> &[ComponentRef] {
        &self.appenders
    }

    /// 붙어 있는 어펜더 이름 (이름 없는 어펜더는 클래스명)
    pub fn appender_names(&self) -> Vec<String> {
        self.appenders
            .iter()
            .map(|a| {
                let a = a.borrow();
                a.name().unwrap_or(a.class()).to_owned()
            })
            .collect()
    }
}

impl PropertySetter for Logger {
    fn set_property(&mut self, name: &str, value: &str) -> Result<(), PropertyError> {
        if name.eq_ignore_ascii_case("additivity") {
            let parsed = value.trim().parse::<bool>().map_err(|e| {
                PropertyError::InvalidValue {
                    name: name.to_owned(),
                    value: value.to_owned(),
                    reason: e.to_string(),
                }
            })?;
            self.additivity = parsed;
            Ok(())
        } else if name.eq_ignore_ascii_case("level") {
            self.level = parse_level_value(name, value)?;
            Ok(())
        } else {
            Err(PropertyError::Unknown {
                name: name.to_owned(),
                class: "Logger".to_owned(),
            })
        }
    }
}

/// 로거 저장소
#[derive(Debug)]
pub struct LoggerRepository {
    root: LoggerRef,
    loggers: BTreeMap<String, LoggerRef>,
    properties: BTreeMap<String, String>,
    threshold: Level,
    debug: bool,
    /// 이름 -> 동작 중인 플러그인
    plugins: BTreeMap<String, ComponentRef>,
    logger_factory: Option<ComponentRef>,
    /// 변환 단어 -> 변환기 클래스 (모든 패턴 레이아웃에 적용)
    conversion_rules: BTreeMap<String, String>,
}

impl Default for LoggerRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl LoggerRepository {
    /// 루트 로거(레벨 DEBUG)만 있는 저장소를 생성합니다.
    pub fn new() -> Self {
        let mut root = Logger::new(ROOT_LOGGER_NAME);
        root.set_level(Some(Level::Debug));
        Self {
            root: Rc::new(RefCell::new(root)),
            loggers: BTreeMap::new(),
            properties: BTreeMap::new(),
            threshold: Level::All,
            debug: false,
            plugins: BTreeMap::new(),
            logger_factory: None,
            conversion_rules: BTreeMap::new(),
        }
    }

    /// 공유 핸들로 감싸 생성합니다.
    pub fn new_ref() -> RepositoryRef {
        Rc::new(RefCell::new(Self::new()))
    }

    pub fn root(&self) -> LoggerRef {
        Rc::clone(&self.root)
    }

    /// 이름으로 로거를 조회하고, 없으면 생성합니다.
    pub fn get_logger(&mut self, name: &str) -> LoggerRef {
        Rc::clone(
            self.loggers
                .entry(name.to_owned())
                .or_insert_with(|| Rc::new(RefCell::new(Logger::new(name)))),
        )
    }

    /// 이미 존재하는 로거만 조회합니다.
    pub fn exists(&self, name: &str) -> Option<LoggerRef> {
        self.loggers.get(name).map(Rc::clone)
    }

    /// 이름 순으로 정렬된 로거 목록 (루트 제외)
    pub fn loggers(&self) -> impl Iterator<Item = &LoggerRef> {
        self.loggers.values()
    }

    /// 로거의 유효 레벨을 계산합니다.
    ///
    /// 점(`.`)으로 구분된 이름 계층을 따라 올라가며 처음 만나는 명시적
    /// 레벨을 반환합니다. 끝까지 없으면 루트 레벨입니다.
    pub fn effective_level(&self, name: &str) -> Level {
        let mut current = name;
        loop {
            if let Some(level) = self.loggers.get(current).and_then(|l| l.borrow().level()) {
                return level;
            }
            match current.rfind('.') {
                Some(idx) => current = &current[..idx],
                None => break,
            }
        }
        self.root.borrow().level().unwrap_or_default()
    }

    pub fn threshold(&self) -> Level {
        self.threshold
    }

    pub fn set_threshold(&mut self, threshold: Level) {
        self.threshold = threshold;
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    /// 활성화된 플러그인을 이름으로 등록합니다.
    ///
    /// 같은 이름의 다른 플러그인이 있으면 멈추고 교체한 뒤 그것을 반환합니다.
    /// 이미 등록된 인스턴스를 다시 넣으면 아무것도 바뀌지 않습니다.
    pub fn start_plugin(&mut self, name: &str, plugin: ComponentRef) -> Option<ComponentRef> {
        if self
            .plugins
            .get(name)
            .is_some_and(|existing| Rc::ptr_eq(existing, &plugin))
        {
            return None;
        }
        let replaced = self.plugins.insert(name.to_owned(), plugin);
        if let Some(ref old) = replaced {
            old.borrow_mut().deactivate();
        }
        replaced
    }

    pub fn plugin(&self, name: &str) -> Option<ComponentRef> {
        self.plugins.get(name).map(Rc::clone)
    }

    /// 이름 순으로 정렬된 플러그인 목록
    pub fn plugins(&self) -> impl Iterator<Item = (&str, &ComponentRef)> {
        self.plugins.iter().map(|(name, plugin)| (name.as_str(), plugin))
    }

    pub fn logger_factory(&self) -> Option<ComponentRef> {
        self.logger_factory.as_ref().map(Rc::clone)
    }

    pub fn set_logger_factory(&mut self, factory: ComponentRef) {
        self.logger_factory = Some(factory);
    }

    /// 저장소 전역 변환 규칙을 등록합니다.
    pub fn add_conversion_rule(&mut self, word: impl Into<String>, converter: impl Into<String>) {
        self.conversion_rules.insert(word.into(), converter.into());
    }

    pub fn conversion_rules(&self) -> &BTreeMap<String, String> {
        &self.conversion_rules
    }

    /// 모든 로거의 레벨과 어펜더를 초기화하고 플러그인을 멈춥니다 (재설정 전 호출).
    pub fn reset_configuration(&mut self) {
        {
            let mut root = self.root.borrow_mut();
            root.remove_all_appenders();
            root.set_level(Some(Level::Debug));
        }
        for logger in self.loggers.values() {
            let mut logger = logger.borrow_mut();
            logger.remove_all_appenders();
            logger.set_level(None);
            logger.set_additivity(true);
        }
        self.threshold = Level::All;
        for plugin in self.plugins.values() {
            plugin.borrow_mut().deactivate();
        }
        self.plugins.clear();
    }
}

impl PropertySetter for LoggerRepository {
    fn set_property(&mut self, name: &str, value: &str) -> Result<(), PropertyError> {
        if name.eq_ignore_ascii_case("threshold") {
            self.threshold = parse_level_value(name, value)?.unwrap_or(Level::All);
        } else {
            self.properties.insert(name.to_owned(), value.to_owned());
        }
        Ok(())
    }
}

/// 레벨 값 파싱
///
/// `inherited`/`null`은 `None` (부모 레벨 상속)을 뜻합니다.
fn parse_level_value(name: &str, value: &str) -> Result<Option<Level>, PropertyError> {
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("inherited") || trimmed.eq_ignore_ascii_case("null") {
        return Ok(None);
    }
    trimmed
        .parse::<Level>()
        .map(Some)
        .map_err(|e| PropertyError::InvalidValue {
            name: name.to_owned(),
            value: value.to_owned(),
            reason: e.to_string(),
        })
}
