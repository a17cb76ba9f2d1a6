//! 백엔드 emitter -- 해석된 파이프라인 인스턴스를 백엔드 파일 맵으로 변환
//!
//! - [`fluentbit`]: 로그 파이프라인 엔진 (주 파일 + 파서 파일)
//! - [`otel`]: 메트릭/트레이스 컬렉터 (YAML 한 장)
//! - [`collectd`]: 레거시 메트릭 엔진

pub mod collectd;
pub mod fluentbit;
pub mod otel;

use opsforge_core::error::CompileError;
use opsforge_core::types::{ComponentRole, Subagent};

/// 필요한 역량이 없는 컴포넌트에 대한 에러
pub(crate) fn missing_capability(
    subagent: Subagent,
    role: ComponentRole,
    id: &str,
    pipeline: &str,
    capability: &str,
) -> CompileError {
    CompileError::MissingCapability {
        subagent,
        role,
        id: id.to_owned(),
        pipeline: pipeline.to_owned(),
        capability: capability.to_owned(),
    }
}
