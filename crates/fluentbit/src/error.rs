//! 로그 백엔드 에러 타입
//!
//! [`FluentBitError`]는 섹션 직렬화와 파서 등록 과정의 에러를 표현합니다.
//! `From<FluentBitError> for CompileError` 변환이 구현되어 있어
//! 컴파일러에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use opsforge_core::error::CompileError;
use opsforge_core::types::Backend;

/// 로그 백엔드 도메인 에러
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FluentBitError {
    /// 인식할 수 없는 섹션 종류 (emitter 버그)
    #[error("unknown section kinds: [{}]", .kinds.join(", "))]
    UnknownSections {
        /// 발견된 모든 미인식 종류 (정렬, 중복 제거)
        kinds: Vec<String>,
    },

    /// 사용자 파서 이름이 내장 파서 또는 다른 사용자 파서와 충돌
    #[error("parser name {name:?} collides with an already registered parser")]
    ParserCollision {
        /// 충돌한 파서 이름
        name: String,
    },

    /// 이름 없는 PARSER 섹션
    #[error("parser section has no Name")]
    EmptyParserName,

    /// 같은 출력 파일에 서로 다른 내용이 기록됨
    #[error("output file {filename:?} was emitted twice with different contents")]
    ConflictingOutputFile {
        /// 충돌한 파일 이름
        filename: String,
    },
}

impl From<FluentBitError> for CompileError {
    fn from(err: FluentBitError) -> Self {
        CompileError::Backend {
            backend: Backend::FluentBit,
            reason: err.to_string(),
        }
    }
}
