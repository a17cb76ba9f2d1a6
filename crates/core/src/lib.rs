#![doc = include_str!("../README.md")]

pub mod config;
pub mod error;
pub mod metrics;
pub mod platform;
pub mod types;

// --- 주요 타입 re-export ---
// 각 모듈의 핵심 타입을 크레이트 루트에서 바로 사용할 수 있도록 합니다.

// 에러
pub use error::{CompileError, ConfigError, OpsforgeError};

// 설정
pub use config::OpsforgeConfig;

// 플랫폼
pub use platform::{OsKind, PlatformFacts};

// 도메인 타입
pub use types::{Backend, ComponentRole, RESERVED_PREFIX, Subagent, is_reserved};
