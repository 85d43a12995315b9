#![doc = include_str!("../README.md")]

pub mod component;
pub mod config;
pub mod error;
pub mod metrics;
pub mod repository;
pub mod types;

// --- 주요 타입 re-export ---
// 각 모듈의 핵심 타입을 크레이트 루트에서 바로 사용할 수 있도록 합니다.

// 에러
pub use error::{ConfigError, JoranError, ParseError};

// 설정
pub use config::JoranConfig;

// 객체 모델
pub use component::{
    Component, ComponentDescriptor, ComponentKind, ComponentRef, Containment, PropertyError,
    PropertySetter,
};
pub use repository::{Logger, LoggerRef, LoggerRepository, RepositoryRef};

// 도메인 타입
pub use types::{Attributes, ErrorItem, Level, Locator};
