#![no_main]

use std::rc::Rc;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use joran_interpreter::action::ParamAction;
use joran_interpreter::{Pattern, RuleStore};

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    /// 등록할 규칙 패턴 (최대 16개로 제한)
    rules: Vec<FuzzPattern>,
    query: FuzzPattern,
}

#[derive(Arbitrary, Debug)]
struct FuzzPattern {
    wildcard: bool,
    /// 작은 태그 집합에서 고른 세그먼트 인덱스
    segments: Vec<u8>,
}

const TAGS: [&str; 6] = ["configuration", "appender", "layout", "param", "logger", "root"];

impl FuzzPattern {
    fn to_pattern(&self) -> Pattern {
        let mut pattern = Pattern::new();
        if self.wildcard {
            pattern.push("*");
        }
        for index in self.segments.iter().take(8) {
            pattern.push(TAGS[usize::from(*index) % TAGS.len()]);
        }
        pattern
    }
}

fuzz_target!(|input: FuzzInput| {
    let mut store = RuleStore::new();
    for rule in input.rules.iter().take(16) {
        let pattern = rule.to_pattern();
        if !pattern.is_empty() {
            store.add_rule(pattern, Rc::new(ParamAction));
        }
    }

    let mut query = input.query.to_pattern();
    // 질의 경로에는 와일드카드 마커가 나타나지 않음
    if query.is_wildcard() {
        return;
    }

    let exact = input
        .rules
        .iter()
        .take(16)
        .any(|r| !r.wildcard && r.to_pattern() == query && !query.is_empty());
    let found = store.match_actions(&query).is_some();
    if exact {
        assert!(found, "exact rule must always match");
    }

    while query.pop().is_some() {
        let _ = store.match_actions(&query);
    }
});
