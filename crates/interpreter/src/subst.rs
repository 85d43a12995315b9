//! `${name}` 변수 치환

/// 치환된 값 안의 참조를 다시 치환하는 최대 깊이
pub const MAX_DEPTH: usize = 16;

/// 치환 실패
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubstError {
    /// `${` 뒤에 닫는 `}`가 없음
    #[error("unterminated variable reference at offset {offset}")]
    Unterminated { offset: usize },

    /// 재귀 치환 깊이 초과 (순환 참조 등)
    #[error("variable substitution nested deeper than {max} levels")]
    TooDeep { max: usize },

    /// 치환 결과가 허용 크기를 넘음
    #[error("substituted value exceeds {max} bytes")]
    TooLarge { max: usize },
}

/// 문자열 안의 `${name}` 참조를 `lookup` 결과로 바꿉니다.
///
/// 찾지 못한 이름은 빈 문자열로 치환됩니다. 치환된 값 자체도 다시
/// 치환됩니다 (최대 [`MAX_DEPTH`] 단계). 결과는 `max_bytes`를 넘을 수 없습니다.
pub fn substitute(
    value: &str,
    lookup: &dyn Fn(&str) -> Option<String>,
    max_bytes: usize,
) -> Result<String, SubstError> {
    let expansion = Expansion { lookup, max_bytes };
    expansion.run(value, 0, max_bytes)
}

struct Expansion<'a> {
    lookup: &'a dyn Fn(&str) -> Option<String>,
    max_bytes: usize,
}

impl Expansion<'_> {
    /// `remaining`: 이 단계의 결과가 쓸 수 있는 남은 바이트 수
    fn run(&self, value: &str, depth: usize, remaining: usize) -> Result<String, SubstError> {
        if depth > MAX_DEPTH {
            return Err(SubstError::TooDeep { max: MAX_DEPTH });
        }

        let mut out = String::with_capacity(value.len().min(remaining));
        let mut rest = value;
        let mut offset = 0;

        while let Some(start) = rest.find("${") {
            self.append(&mut out, &rest[..start], remaining)?;
            let after = &rest[start + 2..];
            let Some(end) = after.find('}') else {
                return Err(SubstError::Unterminated {
                    offset: offset + start,
                });
            };
            let key = &after[..end];
            if let Some(replacement) = (self.lookup)(key) {
                let expanded = self.run(&replacement, depth + 1, remaining - out.len())?;
                self.append(&mut out, &expanded, remaining)?;
            }
            let consumed = start + 2 + end + 1;
            offset += consumed;
            rest = &rest[consumed..];
        }

        self.append(&mut out, rest, remaining)?;
        Ok(out)
    }

    fn append(&self, out: &mut String, part: &str, remaining: usize) -> Result<(), SubstError> {
        if out.len() + part.len() > remaining {
            return Err(SubstError::TooLarge {
                max: self.max_bytes,
            });
        }
        out.push_str(part);
        Ok(())
    }
}
