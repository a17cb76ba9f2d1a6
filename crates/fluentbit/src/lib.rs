#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`component`]: 섹션 하나를 표현하는 렌더링 단위
//! - [`modular`]: 변수와 컴포넌트 전체를 파일 맵으로 직렬화
//! - [`parser`]: 내장/사용자 파서 카탈로그 및 중복 제거
//! - [`tag`]: 라우팅 태그와 OUTPUT 매칭 정규식
//! - [`inputs`], [`filters`], [`outputs`], [`service`]: 플러그인 섹션 빌더
//! - [`error`]: 도메인 에러 타입
//!
//! # 흐름
//!
//! ```text
//! emitter -> Vec<Component> -> ParserRegistry::deduplicate -> ModularConfig::generate -> files
//! ```

pub mod component;
pub mod error;
pub mod modular;
pub mod parser;
pub mod tag;

pub mod filters;
pub mod inputs;
pub mod outputs;
pub mod service;

// --- 주요 타입 re-export ---

// 컴포넌트
pub use component::{Component, Kind};

// 직렬화
pub use modular::{MAIN_CONFIG_FILE_NAME, ModularConfig, PARSER_CONFIG_FILE_NAME};

// 파서
pub use parser::{ParserDefinition, ParserFormat, ParserRegistry};

// 태그
pub use tag::{PipelineTag, match_alternation};

// 에러
pub use error::FluentBitError;
