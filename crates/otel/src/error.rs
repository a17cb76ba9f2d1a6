//! 컬렉터 백엔드 에러 타입

use opsforge_core::error::CompileError;
use opsforge_core::types::Backend;

/// 컬렉터 백엔드 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum OtelError {
    /// YAML 직렬화 실패
    #[error("failed to marshal collector config: {0}")]
    Marshal(#[from] serde_yaml::Error),

    /// 파이프라인이 요구하는 익스포터가 등록되지 않음
    #[error("no exporter registered for exporter type {exporter_type:?} (pipeline {pipeline:?})")]
    MissingExporter {
        exporter_type: String,
        pipeline: String,
    },

    /// 파이프라인이 존재하지 않는 리시버 파이프라인을 참조
    #[error("pipeline {pipeline:?} references unknown receiver pipeline {receiver_pipeline:?}")]
    UnknownReceiverPipeline {
        pipeline: String,
        receiver_pipeline: String,
    },
}

impl From<OtelError> for CompileError {
    fn from(err: OtelError) -> Self {
        CompileError::Backend {
            backend: Backend::Otel,
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_exporter_names_pipeline() {
        let err = OtelError::MissingExporter {
            exporter_type: "logging".to_owned(),
            pipeline: "logs/p1".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("logs/p1"));
        assert!(msg.contains("logging"));
    }

    #[test]
    fn converts_to_internal_compile_error() {
        let err: CompileError = OtelError::UnknownReceiverPipeline {
            pipeline: "p1".to_owned(),
            receiver_pipeline: "p1_r1".to_owned(),
        }
        .into();
        assert!(err.is_internal());
        assert!(err.to_string().contains("p1_r1"));
    }
}
