#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`model`]: 통합 설정 YAML 모델과 구조 검증
//! - [`capability`]: 리시버/프로세서 역량 trait
//! - [`logging`], [`metrics`], [`exporters`]: 구체 컴포넌트
//! - [`resolver`]: 파이프라인 ID 바인딩과 참조 무결성
//! - [`simplifier`]: 매크로 확장과 프로세서 병합
//! - [`emit`]: 백엔드별 파일 생성
//! - [`catalog`]: 등록된 컴포넌트 타입과 역량 목록

pub mod capability;
pub mod catalog;
pub mod emit;
pub mod exporters;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod resolver;
pub mod simplifier;

use std::collections::BTreeMap;
use std::time::Instant;

use tracing::{info, warn};

use opsforge_core::error::CompileError;
use opsforge_core::metrics as m;
use opsforge_core::platform::PlatformFacts;
use opsforge_core::types::Backend;

// --- 주요 타입 re-export ---

// 모델
pub use model::{LoggingBackend, UnifiedConfig};

// 해석/단순화
pub use resolver::{LoggingInstance, MetricsInstance, resolve_logging, resolve_metrics};
pub use simplifier::{expand, simplify};

// 카탈로그
pub use catalog::{ComponentInfo, components};

/// 생성된 파일 맵 (파일 이름 → 내용, 이름순)
pub type OutputFiles = BTreeMap<String, String>;

/// 컴파일 옵션
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// 에이전트 자체 로그 수집 파이프라인을 추가할지 여부 (로그 백엔드 전용)
    pub self_logs: bool,
    /// 설정에 `log_level`이 없을 때 백엔드에 쓰는 로그 레벨
    pub default_log_level: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            self_logs: false,
            default_log_level: "info".to_owned(),
        }
    }
}

/// 통합 설정을 한 백엔드의 파일 맵으로 컴파일합니다.
///
/// 실패하면 부분 출력 없이 첫 번째 위반을 반환합니다.
/// 같은 입력과 같은 플랫폼 정보는 항상 바이트 단위로 같은 출력을 만듭니다.
pub fn generate(
    config: &UnifiedConfig,
    backend: Backend,
    platform: &PlatformFacts,
    options: &CompileOptions,
) -> Result<OutputFiles, CompileError> {
    let started = Instant::now();
    let label = backend.to_string();
    ::metrics::counter!(m::COMPILE_RUNS_TOTAL, m::LABEL_BACKEND => label.clone()).increment(1);

    let result = match backend {
        Backend::FluentBit => emit::fluentbit::emit(config, platform, options),
        Backend::Otel => emit::otel::emit(config, platform, options),
        Backend::Collectd => emit::collectd::emit(config, platform),
    };

    ::metrics::histogram!(m::COMPILE_DURATION_SECONDS, m::LABEL_BACKEND => label.clone())
        .record(started.elapsed().as_secs_f64());

    match &result {
        Ok(files) => info!(%backend, files = files.len(), "compiled configuration"),
        Err(err) => {
            ::metrics::counter!(m::COMPILE_FAILURES_TOTAL, m::LABEL_BACKEND => label).increment(1);
            warn!(%backend, error = %err, "compilation failed");
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_backend_compiles_an_empty_config() {
        let config = UnifiedConfig::default();
        let platform = PlatformFacts::for_tests();
        for backend in Backend::ALL {
            let files = generate(&config, backend, &platform, &CompileOptions::default()).unwrap();
            assert!(
                files.contains_key(backend.main_file_name()),
                "{backend} is missing {}",
                backend.main_file_name()
            );
        }
    }

    #[test]
    fn failure_produces_no_files() {
        let config = UnifiedConfig::parse(
            r#"
logging:
  service:
    pipelines:
      p1:
        receivers: [missing]
"#,
        )
        .unwrap();
        let err = generate(
            &config,
            Backend::FluentBit,
            &PlatformFacts::for_tests(),
            &CompileOptions::default(),
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "logging receiver \"missing\" from pipeline \"p1\" is not defined."
        );
    }
}
