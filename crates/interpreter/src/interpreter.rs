//! 인터프리터 -- 요소 이벤트를 액션 호출로 바꾸는 상태 머신
//!
//! # 상태
//! `Idle` → (`start_document`) → `Descending`/`Ascending` 반복 → (`end_document`) → `Done`
//!
//! # 요소 시작
//! 1. 태그 이름을 패턴에 push
//! 2. 규칙 저장소 조회 (정확 매칭 → 와일드카드), 없으면 암시적 액션을
//!    등록 순서대로 물어 처음 적용 가능하다고 답한 하나만 선택
//! 3. 선택된 목록(없으면 빈 목록)을 액션 목록 스택에 push
//! 4. 목록 순서대로 `begin` 호출. 한 액션의 실패가 같은 목록의 다음 액션을 막지 않음
//!
//! # 요소 끝
//! 1. 액션 목록 스택 pop
//! 2. `begin`과 같은 순서(역순 아님)로 `end` 호출. `begin`이 실패한 활성화는 제외
//! 3. 패턴 pop
//!
//! 액션 목록 스택의 깊이는 항상 패턴 길이와 같습니다.

use std::rc::Rc;

use joran_core::error::ParseError;
use joran_core::metrics as m;
use joran_core::types::{Attributes, Locator};
use tracing::{debug, info, warn};

use crate::action::{Action, Handler, ImplicitAction};
use crate::context::ExecutionContext;
use crate::error::{ActionError, InterpreterError, Skip};
use crate::pattern::Pattern;
use crate::rule_store::RuleStore;
use crate::xml::{self, ContentHandler, ElementName};

/// 인터프리터 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpreterState {
    /// 문서 시작 전
    Idle,
    /// 요소 시작 처리 중
    Descending,
    /// 요소 끝 처리 중
    Ascending,
    /// 문서 끝
    Done,
}

/// 요소 하나에 대한 핸들러 활성화
///
/// 에러 상태는 활성화마다 따로 두어 같은 액션 인스턴스가 다음 요소를
/// 깨끗한 상태로 처리합니다.
#[derive(Clone)]
struct Activation {
    handler: Handler,
    in_error: bool,
}

/// 인터프리터
pub struct Interpreter {
    rule_store: RuleStore,
    implicit_actions: Vec<Rc<dyn ImplicitAction>>,
    context: ExecutionContext,
    pattern: Pattern,
    action_lists: Vec<Vec<Activation>>,
    skip: Option<Pattern>,
    state: InterpreterState,
    elements: u64,
    skipped: u64,
}

impl Interpreter {
    /// 규칙 저장소를 넘겨받아 인터프리터를 생성합니다.
    pub fn new(rule_store: RuleStore) -> Self {
        Self::with_context(rule_store, ExecutionContext::new())
    }

    /// 미리 준비한 실행 컨텍스트로 인터프리터를 생성합니다.
    pub fn with_context(rule_store: RuleStore, context: ExecutionContext) -> Self {
        Self {
            rule_store,
            implicit_actions: Vec::new(),
            context,
            pattern: Pattern::new(),
            action_lists: Vec::new(),
            skip: None,
            state: InterpreterState::Idle,
            elements: 0,
            skipped: 0,
        }
    }

    /// 암시적 액션을 등록합니다. 등록 순서가 적용 우선순위입니다.
    pub fn add_implicit_action(&mut self, action: Rc<dyn ImplicitAction>) {
        self.implicit_actions.push(action);
    }

    /// 규칙을 추가합니다.
    pub fn add_rule(&mut self, pattern: Pattern, action: Rc<dyn Action>) {
        self.rule_store.add_rule(pattern, action);
    }

    /// XML 문서를 스트리밍으로 해석합니다.
    ///
    /// 형식 오류는 `Err`로 반환되며, 그 전까지 처리된 요소의 액션은 이미
    /// 실행된 상태입니다. 기록 후 재생이 필요하면 `JoranDocument`를 쓰세요.
    pub fn interpret(&mut self, source: &str) -> Result<(), InterpreterError> {
        xml::drive(source, self)
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut ExecutionContext {
        &mut self.context
    }

    /// 인터프리터를 소비하고 실행 컨텍스트를 반환합니다.
    pub fn into_context(self) -> ExecutionContext {
        self.context
    }

    /// 현재 요소 경로
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// 액션 목록 스택 깊이 (항상 패턴 길이와 같음)
    pub fn action_list_depth(&self) -> usize {
        self.action_lists.len()
    }

    pub fn rule_store(&self) -> &RuleStore {
        &self.rule_store
    }

    pub fn state(&self) -> InterpreterState {
        self.state
    }

    /// 지금까지 처리한 요소 수
    pub fn elements(&self) -> u64 {
        self.elements
    }

    /// 스킵 때문에 액션 없이 지나간 요소 수
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    fn resolve(&self, tag: &str) -> Vec<Activation> {
        if let Some(actions) = self.rule_store.match_actions(&self.pattern) {
            return actions
                .iter()
                .map(|a| Activation {
                    handler: Handler::Explicit(Rc::clone(a)),
                    in_error: false,
                })
                .collect();
        }

        match self
            .implicit_actions
            .iter()
            .find(|ia| ia.is_applicable(&self.context, tag))
        {
            Some(ia) => vec![Activation {
                handler: Handler::Implicit(Rc::clone(ia)),
                in_error: false,
            }],
            None => {
                debug!(pattern = %self.pattern, "no applicable action");
                Vec::new()
            }
        }
    }

    fn record(&mut self, tag: &str, handler: &str, phase: &str, err: &ActionError) {
        warn!(
            element = tag,
            action = handler,
            phase,
            pattern = %self.pattern,
            error = %err,
            "action failed"
        );
        match std::error::Error::source(err.root()) {
            Some(cause) => self.context.add_error_with_cause(err.to_string(), cause),
            None => self.context.add_error(err.to_string()),
        }
    }

    fn start_skipping(&mut self, skip: Skip) {
        if self.skip.is_some() {
            return;
        }
        let root = match skip {
            Skip::None => return,
            Skip::Children => self.pattern.clone(),
            Skip::Siblings => self.pattern.parent(),
        };
        info!(pattern = %root, ?skip, "skipping nested elements");
        self.skip = Some(root);
    }

    fn apply_pending_rules(&mut self) {
        for (pattern, action) in self.context.take_pending_rules() {
            info!(pattern = %pattern, action = action.name(), "adding rule");
            self.rule_store.add_rule(pattern, action);
        }
    }
}

impl ContentHandler for Interpreter {
    fn set_document_locator(&mut self, locator: Locator) {
        self.context.set_locator(locator);
    }

    fn start_document(&mut self) {
        self.state = InterpreterState::Descending;
        self.skip = None;
    }

    fn start_element(&mut self, name: &ElementName, attributes: &Attributes) {
        self.state = InterpreterState::Descending;
        let tag = name.tag();
        self.pattern.push(tag);
        self.elements += 1;
        metrics::counter!(m::ELEMENTS_TOTAL).increment(1);

        if self.skip.is_some() {
            self.skipped += 1;
            metrics::counter!(m::SKIPPED_ELEMENTS_TOTAL).increment(1);
            self.action_lists.push(Vec::new());
            return;
        }

        let mut activations = self.resolve(tag);
        for activation in &mut activations {
            if let Err(err) = activation.handler.begin(&mut self.context, tag, attributes) {
                self.record(tag, activation.handler.name(), "begin", &err);
                activation.in_error = true;
                self.start_skipping(err.skip());
            }
        }
        self.action_lists.push(activations);
        self.apply_pending_rules();
    }

    fn end_element(&mut self, name: &ElementName) {
        self.state = InterpreterState::Ascending;
        let tag = name.tag();
        let activations = self.action_lists.pop().unwrap_or_default();

        for activation in activations.iter().filter(|a| !a.in_error) {
            if let Err(err) = activation.handler.end(&mut self.context, tag) {
                self.record(tag, activation.handler.name(), "end", &err);
                if err.skip() == Skip::Siblings {
                    self.start_skipping(Skip::Siblings);
                }
            }
        }
        self.apply_pending_rules();

        if self.skip.as_ref() == Some(&self.pattern) {
            info!(pattern = %self.pattern, "skip finished");
            self.skip = None;
        }
        self.pattern.pop();
    }

    fn end_document(&mut self) {
        self.state = InterpreterState::Done;
        self.context.clear_locator();
        // 루트 요소에서 시작된 형제 스킵은 end_element에서 풀리지 않음
        self.skip = None;
        debug!(
            elements = self.elements,
            skipped = self.skipped,
            errors = self.context.errors().len(),
            "document interpreted"
        );
    }

    fn warning(&mut self, message: &str) {
        warn!(message, "parser warning");
    }

    fn fatal_error(&mut self, error: &ParseError) {
        warn!(error = %error, pattern = %self.pattern, "interpretation aborted");
    }
}

impl std::fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interpreter")
            .field("state", &self.state)
            .field("pattern", &self.pattern.to_string())
            .field("rules", &self.rule_store.len())
            .field(
                "implicit_actions",
                &self
                    .implicit_actions
                    .iter()
                    .map(|a| a.name())
                    .collect::<Vec<_>>(),
            )
            .field("skip", &self.skip.as_ref().map(Pattern::to_string))
            .finish()
    }
}
