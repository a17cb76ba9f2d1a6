//! 도메인 타입 -- 서브에이전트, 컴포넌트 역할, 백엔드 식별자

use std::fmt;

use serde::{Deserialize, Serialize};

/// 내장 컴포넌트 전용 예약 접두어
///
/// 사용자가 정의한 리시버/프로세서/익스포터/파이프라인 ID는 이 접두어로 시작할 수 없습니다.
pub const RESERVED_PREFIX: &str = "lib:";

/// ID가 예약 접두어로 시작하는지 확인합니다.
pub fn is_reserved(id: &str) -> bool {
    id.starts_with(RESERVED_PREFIX)
}

/// 텔레메트리 도메인
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subagent {
    /// 로그 수집
    Logging,
    /// 메트릭 수집
    Metrics,
}

impl fmt::Display for Subagent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Logging => write!(f, "logging"),
            Self::Metrics => write!(f, "metrics"),
        }
    }
}

/// 파이프라인 내 컴포넌트의 역할
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentRole {
    Receiver,
    Processor,
    Exporter,
    Pipeline,
    /// 도메인의 `service` 섹션 자체
    Service,
}

impl ComponentRole {
    /// 복수형 이름 (에러 메시지용)
    pub fn plural(&self) -> &'static str {
        match self {
            Self::Receiver => "receivers",
            Self::Processor => "processors",
            Self::Exporter => "exporters",
            Self::Pipeline => "pipelines",
            Self::Service => "services",
        }
    }
}

impl fmt::Display for ComponentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Receiver => write!(f, "receiver"),
            Self::Processor => write!(f, "processor"),
            Self::Exporter => write!(f, "exporter"),
            Self::Pipeline => write!(f, "pipeline"),
            Self::Service => write!(f, "service"),
        }
    }
}

/// 컴파일 대상 백엔드
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// 로그 파이프라인 엔진 (섹션 기반 설정)
    #[serde(alias = "fluent-bit", alias = "fluentbit")]
    FluentBit,
    /// 메트릭/트레이스 컬렉터 (YAML 설정)
    Otel,
    /// 레거시 메트릭 엔진
    Collectd,
}

impl Backend {
    /// 모든 백엔드 (결정적 순서)
    pub const ALL: [Backend; 3] = [Backend::FluentBit, Backend::Otel, Backend::Collectd];

    /// 백엔드가 생성하는 주 설정 파일 이름
    pub fn main_file_name(&self) -> &'static str {
        match self {
            Self::FluentBit => "fluent_bit_main.conf",
            Self::Otel => "otel.yaml",
            Self::Collectd => "collectd.conf",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FluentBit => write!(f, "fluent-bit"),
            Self::Otel => write!(f, "otel"),
            Self::Collectd => write!(f, "collectd"),
        }
    }
}

impl std::str::FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fluentbit" | "fluent-bit" | "fluent_bit" => Ok(Self::FluentBit),
            "otel" => Ok(Self::Otel),
            "collectd" => Ok(Self::Collectd),
            other => Err(format!("unknown backend: {other}")),
        }
    }
}
