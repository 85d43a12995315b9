//! 요소 경로 패턴
//!
//! [`Pattern`]은 문서 루트부터 현재 요소까지의 태그 이름 시퀀스이며,
//! 규칙 저장소의 디스패치 키로 사용됩니다. 인터프리터는 요소 시작마다
//! `push`, 요소 끝마다 `pop`을 호출합니다.
//!
//! # 리터럴 문법
//! `/`로 구분된 경로입니다. 빈 세그먼트(선행/중복 슬래시)는 버려집니다.
//! 첫 세그먼트가 `*`이면 와일드카드(꼬리 매칭) 규칙입니다.
//!
//! ```
//! use joran_interpreter::pattern::Pattern;
//!
//! let p = Pattern::parse("//configuration/appender/");
//! assert_eq!(p.len(), 2);
//! assert_eq!(p.to_string(), "configuration/appender");
//! ```

use std::fmt;

/// 와일드카드 마커 세그먼트
pub const WILDCARD: &str = "*";

/// 요소 경로 패턴
///
/// 동등성과 해시는 구조적입니다 (길이와 모든 세그먼트가 같으면 동일,
/// 대소문자 구분).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pattern {
    segments: Vec<String>,
}

impl Pattern {
    /// 빈 패턴을 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// `/` 구분 리터럴에서 패턴을 만듭니다. 빈 세그먼트는 무시합니다.
    pub fn parse(literal: &str) -> Self {
        Self {
            segments: literal
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
                .collect(),
        }
    }

    /// 세그먼트를 뒤에 추가합니다.
    pub fn push(&mut self, segment: impl Into<String>) {
        self.segments.push(segment.into());
    }

    /// 마지막 세그먼트를 제거합니다. 비어 있으면 아무 일도 하지 않습니다.
    pub fn pop(&mut self) -> Option<String> {
        self.segments.pop()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// 루트 기준 0부터 시작하는 위치의 세그먼트
    pub fn get(&self, index: usize) -> Option<&str> {
        self.segments.get(index).map(String::as_str)
    }

    pub fn peek_last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// 마지막 세그먼트를 제외한 부모 패턴
    pub fn parent(&self) -> Pattern {
        let end = self.segments.len().saturating_sub(1);
        Self {
            segments: self.segments[..end].to_vec(),
        }
    }

    /// 첫 세그먼트가 와일드카드 마커인지 여부
    pub fn is_wildcard(&self) -> bool {
        self.segments.first().is_some_and(|s| s == WILDCARD)
    }

    /// 꼬리 매칭 점수
    ///
    /// 양쪽 끝에서부터 비교해 처음 불일치가 나오거나 짧은 쪽이 끝날 때까지
    /// 연속으로 같은 세그먼트 수를 셉니다. 어느 한쪽이 비어 있으면 0.
    /// O(min(l, r))이며 어느 패턴도 변경하지 않습니다.
    pub fn tail_match(&self, other: &Pattern) -> usize {
        self.segments
            .iter()
            .rev()
            .zip(other.segments.iter().rev())
            .take_while(|(l, r)| l == r)
            .count()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

impl From<&str> for Pattern {
    fn from(literal: &str) -> Self {
        Self::parse(literal)
    }
}

impl<S: Into<String>> FromIterator<S> for Pattern {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().map(Into::into).collect(),
        }
    }
}
