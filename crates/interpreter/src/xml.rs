//! XML 이벤트 드라이버
//!
//! `quick-xml` 풀 파서의 이벤트를 SAX 스타일 [`ContentHandler`] 콜백으로
//! 밀어 넣습니다. 인터프리터는 문서 전체를 버퍼링하지 않고 이벤트마다
//! 바로 반응합니다.
//!
//! - 자기 닫힘 요소(`<a/>`)는 start와 end 이벤트를 모두 만듭니다.
//! - 콜백 직전마다 위치 정보(1부터 시작하는 줄/열)가 갱신됩니다.
//! - 속성 값은 엔티티가 해제된 상태로 전달됩니다.
//! - 태그 불일치 등 형식 오류는 치명적이며 줄/열과 함께 보고됩니다.

use std::fmt;

use joran_core::config::DEFAULT_MAX_DEPTH;
use joran_core::error::ParseError;
use joran_core::types::{Attributes, Locator};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::InterpreterError;

/// `xml:` 접두어에 고정된 네임스페이스
const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// 요소 이름
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementName {
    /// 해석된 네임스페이스 URI (없으면 `None`)
    pub namespace: Option<String>,
    /// 접두어를 뺀 로컬 이름
    pub local: String,
    /// 접두어를 포함한 이름
    pub qualified: String,
}

impl ElementName {
    /// 네임스페이스 없는 이름
    pub fn new(name: impl Into<String>) -> Self {
        let qualified = name.into();
        let local = qualified
            .rsplit_once(':')
            .map_or(qualified.as_str(), |(_, l)| l)
            .to_owned();
        Self {
            namespace: None,
            local,
            qualified,
        }
    }

    /// 디스패치에 쓰는 태그 이름
    ///
    /// 로컬 이름을 우선하고, 비어 있으면 전체 이름을 사용합니다.
    pub fn tag(&self) -> &str {
        if self.local.is_empty() {
            &self.qualified
        } else {
            &self.local
        }
    }
}

impl fmt::Display for ElementName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified)
    }
}

/// SAX 스타일 이벤트 수신자
pub trait ContentHandler {
    /// 다음 콜백의 위치 정보
    fn set_document_locator(&mut self, _locator: Locator) {}

    fn start_document(&mut self) {}

    fn start_element(&mut self, name: &ElementName, attributes: &Attributes);

    fn end_element(&mut self, name: &ElementName);

    fn end_document(&mut self) {}

    /// 해석을 멈추지 않는 파서 경고
    fn warning(&mut self, _message: &str) {}

    /// 치명적 파싱 에러. 이 콜백 뒤에는 어떤 이벤트도 오지 않습니다.
    fn fatal_error(&mut self, _error: &ParseError) {}
}

/// XML 드라이버
#[derive(Debug, Clone)]
pub struct XmlDriver {
    max_depth: usize,
}

impl Default for XmlDriver {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl XmlDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// 요소 최대 중첩 깊이를 설정합니다.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// 문서를 읽으며 이벤트를 `handler`로 전달합니다.
    pub fn drive<H>(&self, source: &str, handler: &mut H) -> Result<(), InterpreterError>
    where
        H: ContentHandler + ?Sized,
    {
        let result = self.run(source, handler);
        if let Err(ref e) = result {
            tracing::error!(error = %e, "xml document is not well-formed");
            handler.fatal_error(e);
        }
        result.map_err(InterpreterError::from)
    }

    fn run<H>(&self, source: &str, handler: &mut H) -> Result<(), ParseError>
    where
        H: ContentHandler + ?Sized,
    {
        let index = LineIndex::new(source);
        let mut reader = Reader::from_str(source);
        reader.config_mut().trim_text(true);

        let mut scopes = NamespaceScopes::default();
        let mut open: Vec<ElementName> = Vec::new();

        handler.start_document();
        loop {
            // trim_text가 건너뛰는 공백 다음, 태그가 시작되는 위치
            let start = skip_whitespace(source, reader.buffer_position() as usize);
            let event = reader
                .read_event()
                .map_err(|e| index.error(reader.buffer_position() as usize, e))?;
            let offset = reader.buffer_position() as usize;
            let locator = index.locate(start);

            match event {
                Event::Start(e) => {
                    let (name, attributes) = open_element(&e, &mut scopes, &index, start)?;
                    self.check_depth(open.len() + 1, locator)?;
                    handler.set_document_locator(locator);
                    handler.start_element(&name, &attributes);
                    open.push(name);
                }
                Event::Empty(e) => {
                    let (name, attributes) = open_element(&e, &mut scopes, &index, start)?;
                    self.check_depth(open.len() + 1, locator)?;
                    handler.set_document_locator(locator);
                    handler.start_element(&name, &attributes);
                    handler.set_document_locator(locator);
                    handler.end_element(&name);
                    scopes.pop();
                }
                Event::End(_) => {
                    let Some(name) = open.pop() else {
                        return Err(index.error(offset, "end tag without a matching start tag"));
                    };
                    handler.set_document_locator(locator);
                    handler.end_element(&name);
                    scopes.pop();
                }
                Event::Decl(decl) => {
                    if let Some(Ok(encoding)) = decl.encoding() {
                        let encoding = String::from_utf8_lossy(&encoding).to_ascii_lowercase();
                        if !matches!(encoding.as_str(), "utf-8" | "utf8" | "us-ascii" | "ascii") {
                            handler.set_document_locator(locator);
                            handler.warning(&format!(
                                "declared encoding '{encoding}' is read as utf-8"
                            ));
                        }
                    }
                }
                Event::DocType(_) => {
                    handler.set_document_locator(locator);
                    handler.warning("document type declaration ignored");
                }
                Event::Eof => {
                    if let Some(name) = open.last() {
                        return Err(index.error(offset, format!("unclosed element <{name}>")));
                    }
                    break;
                }
                _ => {}
            }
        }
        handler.end_document();
        Ok(())
    }

    fn check_depth(&self, depth: usize, locator: Locator) -> Result<(), ParseError> {
        if depth > self.max_depth {
            return Err(ParseError::TooDeep {
                line: locator.line,
                depth,
                max: self.max_depth,
            });
        }
        Ok(())
    }
}

/// 기본 드라이버로 문서를 읽습니다.
pub fn drive<H>(source: &str, handler: &mut H) -> Result<(), InterpreterError>
where
    H: ContentHandler + ?Sized,
{
    XmlDriver::default().drive(source, handler)
}

fn open_element(
    e: &BytesStart<'_>,
    scopes: &mut NamespaceScopes,
    index: &LineIndex<'_>,
    offset: usize,
) -> Result<(ElementName, Attributes), ParseError> {
    let qualified = utf8(e.name().as_ref())?.to_owned();
    let local = utf8(e.local_name().as_ref())?.to_owned();

    let mut attributes = Attributes::new();
    let mut bindings = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| index.error(offset, err))?;
        let key = utf8(attr.key.as_ref())?.to_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| index.error(offset, err))?
            .into_owned();
        if key == "xmlns" {
            bindings.push((String::new(), value));
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            bindings.push((prefix.to_owned(), value));
        } else {
            attributes.push(key, value);
        }
    }
    scopes.push(bindings);

    let prefix = qualified.split_once(':').map_or("", |(p, _)| p);
    let namespace = scopes
        .resolve(prefix)
        .filter(|uri| !uri.is_empty())
        .map(str::to_owned);

    Ok((
        ElementName {
            namespace,
            local,
            qualified,
        },
        attributes,
    ))
}

fn skip_whitespace(source: &str, offset: usize) -> usize {
    source
        .get(offset..)
        .map_or(offset, |rest| offset + (rest.len() - rest.trim_start().len()))
}

fn utf8(bytes: &[u8]) -> Result<&str, ParseError> {
    std::str::from_utf8(bytes).map_err(|e| ParseError::UnsupportedEncoding(e.to_string()))
}

/// 열린 요소별 네임스페이스 바인딩
#[derive(Debug, Default)]
struct NamespaceScopes {
    frames: Vec<Vec<(String, String)>>,
}

impl NamespaceScopes {
    fn push(&mut self, bindings: Vec<(String, String)>) {
        self.frames.push(bindings);
    }

    fn pop(&mut self) {
        self.frames.pop();
    }

    fn resolve(&self, prefix: &str) -> Option<&str> {
        if prefix == "xml" {
            return Some(XML_NAMESPACE);
        }
        self.frames
            .iter()
            .rev()
            .flat_map(|frame| frame.iter().rev())
            .find(|(p, _)| p == prefix)
            .map(|(_, uri)| uri.as_str())
    }
}

/// 바이트 오프셋 -> 줄/열 변환 테이블
///
/// 열은 바이트가 아니라 문자 단위로 셉니다.
#[derive(Debug)]
struct LineIndex<'a> {
    source: &'a str,
    /// 각 줄의 시작 오프셋
    starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    fn new(source: &'a str) -> Self {
        let mut starts = vec![0];
        starts.extend(
            source
                .bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self { source, starts }
    }

    fn locate(&self, offset: usize) -> Locator {
        let line = self.starts.partition_point(|&start| start <= offset).max(1);
        let line_start = self.starts[line - 1];
        let column = self
            .source
            .get(line_start..offset)
            .map_or(offset.saturating_sub(line_start), |s| s.chars().count())
            + 1;
        Locator::new(line, column)
    }

    fn error(&self, offset: usize, reason: impl fmt::Display) -> ParseError {
        let locator = self.locate(offset);
        ParseError::Xml {
            line: locator.line,
            column: locator.column,
            reason: reason.to_string(),
        }
    }
}
