//! 규칙 저장소 -- 패턴에서 액션 목록으로의 매핑
//!
//! # 조회 규칙
//! 1. 정확히 같은 패턴이 있으면 그 액션 목록
//! 2. 없으면 첫 세그먼트가 `*`이고 길이가 2 이상인 와일드카드 패턴 중
//!    꼬리 매칭 점수가 가장 높은 것 (점수는 0보다 커야 함)
//! 3. 점수가 같으면 먼저 등록된 패턴이 선택됩니다
//!
//! 와일드카드 점수는 `*` 세그먼트를 포함한 저장 패턴과 질의 패턴의 꼬리
//! 매칭으로 계산합니다. `*`는 실제 태그와 같아질 수 없으므로 마커를 뺀
//! 점수와 순위가 같습니다.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::action::Action;
use crate::pattern::Pattern;

/// 패턴 하나에 등록된 액션 목록
struct Rule {
    pattern: Pattern,
    actions: Vec<Rc<dyn Action>>,
}

/// 규칙 저장소
///
/// 패턴 등록 순서를 보존합니다. 와일드카드 동점 처리가 이 순서를 따릅니다.
#[derive(Default)]
pub struct RuleStore {
    /// 패턴 -> `rules` 인덱스
    index: HashMap<Pattern, usize>,
    rules: Vec<Rule>,
}

impl RuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 패턴에 액션을 추가합니다. 같은 패턴의 액션은 추가 순서대로 호출됩니다.
    pub fn add_rule(&mut self, pattern: Pattern, action: Rc<dyn Action>) {
        match self.index.get(&pattern) {
            Some(&i) => self.rules[i].actions.push(action),
            None => {
                self.index.insert(pattern.clone(), self.rules.len());
                self.rules.push(Rule {
                    pattern,
                    actions: vec![action],
                });
            }
        }
    }

    /// 패턴 리터럴로 규칙을 추가합니다.
    pub fn add_rule_str(&mut self, pattern: &str, action: Rc<dyn Action>) {
        self.add_rule(Pattern::parse(pattern), action);
    }

    /// 패턴에 적용할 액션 목록을 찾습니다. 부수효과가 없는 순수 조회입니다.
    pub fn match_actions(&self, pattern: &Pattern) -> Option<&[Rc<dyn Action>]> {
        if let Some(&i) = self.index.get(pattern) {
            return Some(&self.rules[i].actions);
        }

        let mut best: Option<(usize, &Rule)> = None;
        for rule in self
            .rules
            .iter()
            .filter(|r| r.pattern.len() > 1 && r.pattern.is_wildcard())
        {
            let score = rule.pattern.tail_match(pattern);
            if score > best.map_or(0, |(s, _)| s) {
                best = Some((score, rule));
            }
        }
        best.map(|(_, rule)| rule.actions.as_slice())
    }

    /// 등록 순서대로의 (패턴, 액션 목록)
    pub fn rules(&self) -> impl Iterator<Item = (&Pattern, &[Rc<dyn Action>])> {
        self.rules
            .iter()
            .map(|r| (&r.pattern, r.actions.as_slice()))
    }

    /// 등록된 패턴 수
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl fmt::Debug for RuleStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.rules.iter().map(|r| {
                (
                    r.pattern.to_string(),
                    r.actions.iter().map(|a| a.name()).collect::<Vec<_>>(),
                )
            }))
            .finish()
    }
}
