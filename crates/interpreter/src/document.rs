//! 이벤트 기록 및 재생
//!
//! [`JoranDocument`]는 파싱 이벤트를 먼저 모두 기록해 두었다가, 문서가
//! 끝까지 올바른 경우에만 인터프리터로 재생합니다. 형식이 잘못된 문서는
//! 어떤 액션도 실행되기 전에 거부되므로 설정이 절반만 적용되지 않습니다.

use joran_core::error::ParseError;
use joran_core::types::{Attributes, ErrorItem, Locator};
use tracing::debug;

use crate::xml::{ContentHandler, ElementName};

/// log4j 설정 네임스페이스
pub const LOG4J_NAMESPACE: &str = "http://jakarta.apache.org/log4j/";

/// logging.apache.org 네임스페이스
pub const LOGGING_NAMESPACE: &str = "http://logging.apache.org/";

/// 기록된 요소 이벤트
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedEvent {
    Start {
        name: ElementName,
        attributes: Attributes,
        locator: Locator,
    },
    End {
        name: ElementName,
        locator: Locator,
    },
}

/// 이벤트 기록기
#[derive(Debug, Clone)]
pub struct JoranDocument {
    accepted: Vec<String>,
    events: Vec<RecordedEvent>,
    warnings: Vec<ErrorItem>,
    locator: Locator,
    fatal: Option<ParseError>,
    dropped: usize,
}

impl Default for JoranDocument {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl JoranDocument {
    /// 기본 네임스페이스에 `extra`를 더해 허용하는 기록기를 만듭니다.
    pub fn new(extra: Vec<String>) -> Self {
        let mut accepted = vec![LOG4J_NAMESPACE.to_owned(), LOGGING_NAMESPACE.to_owned()];
        accepted.extend(extra);
        Self {
            accepted,
            events: Vec::new(),
            warnings: Vec::new(),
            locator: Locator::default(),
            fatal: None,
            dropped: 0,
        }
    }

    fn accepts(&self, name: &ElementName) -> bool {
        match name.namespace.as_deref() {
            None | Some("") => true,
            Some(ns) => self.accepted.iter().any(|a| a == ns),
        }
    }

    pub fn events(&self) -> &[RecordedEvent] {
        &self.events
    }

    /// 파서 경고 (위치 정보 포함)
    pub fn warnings(&self) -> &[ErrorItem] {
        &self.warnings
    }

    /// 처음 기록된 치명적 에러
    pub fn fatal_error(&self) -> Option<&ParseError> {
        self.fatal.as_ref()
    }

    /// 네임스페이스 필터로 버려진 이벤트 수
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// 기록된 이벤트를 `handler`로 재생합니다.
    ///
    /// 치명적 에러가 기록되어 있으면 아무것도 재생하지 않고 그 에러를 반환합니다.
    pub fn replay<H>(&self, handler: &mut H) -> Result<(), ParseError>
    where
        H: ContentHandler + ?Sized,
    {
        if let Some(ref fatal) = self.fatal {
            return Err(fatal.clone());
        }
        handler.start_document();
        for event in &self.events {
            match event {
                RecordedEvent::Start {
                    name,
                    attributes,
                    locator,
                } => {
                    handler.set_document_locator(*locator);
                    handler.start_element(name, attributes);
                }
                RecordedEvent::End { name, locator } => {
                    handler.set_document_locator(*locator);
                    handler.end_element(name);
                }
            }
        }
        handler.end_document();
        Ok(())
    }
}

impl ContentHandler for JoranDocument {
    fn set_document_locator(&mut self, locator: Locator) {
        self.locator = locator;
    }

    fn start_element(&mut self, name: &ElementName, attributes: &Attributes) {
        if self.accepts(name) {
            self.events.push(RecordedEvent::Start {
                name: name.clone(),
                attributes: attributes.clone(),
                locator: self.locator,
            });
        } else {
            debug!(element = %name, namespace = ?name.namespace, "dropping element in foreign namespace");
            self.dropped += 1;
        }
    }

    fn end_element(&mut self, name: &ElementName) {
        if self.accepts(name) {
            self.events.push(RecordedEvent::End {
                name: name.clone(),
                locator: self.locator,
            });
        } else {
            self.dropped += 1;
        }
    }

    fn warning(&mut self, message: &str) {
        self.warnings
            .push(ErrorItem::new(format!("parsing warning: {message}")).at(self.locator));
    }

    fn fatal_error(&mut self, error: &ParseError) {
        if self.fatal.is_none() {
            self.fatal = Some(error.clone());
        }
    }
}
