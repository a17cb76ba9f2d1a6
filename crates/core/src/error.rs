//! 에러 타입 -- 도메인별 에러 정의
//!
//! 컴파일 에러는 모두 사람이 읽을 수 있는 문장으로 렌더링되며,
//! 문제가 된 파이프라인/리시버/프로세서/익스포터 ID와 위반한 규칙을 포함합니다.

use crate::types::{Backend, ComponentRole, Subagent};

/// Opsforge 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum OpsforgeError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 구성 컴파일 에러
    #[error("compile error: {0}")]
    Compile(#[from] CompileError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 구성 컴파일 에러
///
/// 모든 위반은 컴파일 도중 즉시 전파되며 부분 출력은 존재하지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    /// 파이프라인이 정의되지 않은 ID를 참조
    #[error("{subagent} {role} {id:?} from pipeline {pipeline:?} is not defined.")]
    UndefinedReference {
        subagent: Subagent,
        role: ComponentRole,
        id: String,
        pipeline: String,
    },

    /// 사용자 정의 ID가 예약 접두어를 사용
    #[error(
        "{subagent} {role} id {id:?} is not allowed because prefix 'lib:' is reserved for pre-defined {}.",
        .role.plural()
    )]
    ReservedId {
        subagent: Subagent,
        role: ComponentRole,
        id: String,
    },

    /// 백엔드별 개수 제약 위반
    #[error("{rule} (found {found}).")]
    Cardinality {
        subagent: Subagent,
        rule: String,
        found: usize,
    },

    /// 백엔드가 요구하는 기능을 컴포넌트가 제공하지 않음
    #[error(
        "{subagent} {role} {id:?} in pipeline {pipeline:?} is missing the required capability {capability:?}."
    )]
    MissingCapability {
        subagent: Subagent,
        role: ComponentRole,
        id: String,
        pipeline: String,
        capability: String,
    },

    /// 지원하지 않는 컴포넌트 타입
    #[error(
        "{subagent} {role} {id:?} with type {type_name:?} is not supported. Supported {subagent} {role} types: [{}].",
        .supported.join(", ")
    )]
    UnsupportedType {
        subagent: Subagent,
        role: ComponentRole,
        id: String,
        type_name: String,
        supported: Vec<String>,
    },

    /// 유효하지 않은 파라미터 값
    #[error("parameter {parameter:?} in {subagent} {role} {id:?} is invalid: {reason}")]
    InvalidParameter {
        subagent: Subagent,
        role: ComponentRole,
        id: String,
        parameter: String,
        reason: String,
    },

    /// 두 리시버가 같은 포트를 사용
    #[error("port {port} is used by both receiver {first:?} and receiver {second:?}.")]
    PortConflict {
        port: u16,
        first: String,
        second: String,
    },

    /// 서로 다른 로그 파이프라인 인스턴스가 같은 기본 태그를 만듦
    #[error(
        "logging pipeline {first_pipeline:?} with receiver {first_receiver:?} and pipeline {second_pipeline:?} with receiver {second_receiver:?} both map to tag {tag:?}; rename one of them."
    )]
    TagCollision {
        tag: String,
        first_pipeline: String,
        first_receiver: String,
        second_pipeline: String,
        second_receiver: String,
    },

    /// 백엔드 직렬화 단계의 내부 에러 (emitter 버그)
    #[error("{backend} backend error: {reason}")]
    Backend { backend: Backend, reason: String },
}

impl CompileError {
    /// 에러가 사용자 입력이 아닌 emitter 내부 문제에서 발생했는지 여부
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Backend { .. })
    }
}
