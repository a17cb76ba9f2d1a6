//! 메트릭 도메인 컴포넌트 -- hostmetrics, nginx, otlp 리시버와 exclude_metrics 프로세서
//!
//! 모든 메트릭 리시버는 하나 이상의 리시버 파이프라인으로 분해됩니다.
//! `hostmetrics`는 호스트 메트릭과 에이전트 자체 프로세스 메트릭 두 개로 나뉩니다.

use serde::Deserialize;
use serde_json::json;

use opsforge_core::error::CompileError;
use opsforge_core::types::ComponentRole;
use opsforge_otel::component::{add_prefix, metrics_filter};
use opsforge_otel::{self as otel, ReceiverPipeline, ResourceDetectionMode, Signal};

use crate::capability::{MetricsProcessor, MetricsReceiver};
use crate::model::{invalid_metrics, validate_collection_interval};

/// 기본 수집 주기
pub const DEFAULT_COLLECTION_INTERVAL: &str = "60s";

/// 시스템 메트릭 도메인
pub const AGENT_METRICS_PREFIX: &str = "agent.googleapis.com";

/// 애플리케이션 메트릭 도메인
pub const WORKLOAD_METRICS_PREFIX: &str = "workload.googleapis.com";

const DEFAULT_STUB_STATUS_URL: &str = "http://127.0.0.1/status";
const DEFAULT_OTLP_GRPC_ENDPOINT: &str = "0.0.0.0:4317";

/// 에이전트 자체 프로세스 이름
const AGENT_PROCESS_NAMES: [&str; 3] = ["opsforge", "fluent-bit", "otelopscol"];

const HOST_SCRAPERS: [&str; 8] = [
    "cpu",
    "load",
    "memory",
    "disk",
    "filesystem",
    "network",
    "paging",
    "processes",
];

const HOST_EXCLUDED_METRICS: [&str; 6] = [
    "system.cpu.time",
    "system.network.dropped",
    "system.filesystem.inodes.usage",
    "system.paging.faults",
    "system.disk.operation_time",
    "system.processes.count",
];

const HOST_RENAMES: [(&str, &str); 12] = [
    ("system.cpu.utilization", "cpu/utilization"),
    ("system.cpu.load_average.1m", "cpu/load_1m"),
    ("system.cpu.load_average.5m", "cpu/load_5m"),
    ("system.cpu.load_average.15m", "cpu/load_15m"),
    ("system.disk.io_time", "disk/io_time"),
    ("system.disk.operations", "disk/operation_count"),
    ("system.filesystem.usage", "disk/bytes_used"),
    ("system.filesystem.utilization", "disk/percent_used"),
    ("system.memory.usage", "memory/bytes_used"),
    ("system.memory.utilization", "memory/percent_used"),
    ("system.network.io", "interface/traffic"),
    ("system.paging.usage", "swap/bytes_used"),
];

const PROCESS_RENAMES: [(&str, &str); 3] = [
    ("process.cpu.time", "agent/cpu_time"),
    ("process.memory.physical_usage", "agent/memory_usage"),
    ("process.memory.virtual_usage", "agent/vm_usage"),
];

/// 메트릭 이름을 바꾸는 metricstransform 프로세서
pub fn rename_metrics(renames: &[(&str, &str)]) -> otel::Component {
    let transforms: Vec<serde_json::Value> = renames
        .iter()
        .map(|(from, to)| {
            json!({
                "include": from,
                "action": "update",
                "new_name": to,
            })
        })
        .collect();
    otel::Component::new("metricstransform", json!({ "transforms": transforms }))
}

fn interval_or_default(interval: &Option<String>) -> &str {
    interval.as_deref().unwrap_or(DEFAULT_COLLECTION_INTERVAL)
}

// ─── hostmetrics ────────────────────────────────────────────────────

/// `hostmetrics` 리시버
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HostmetricsReceiver {
    #[serde(default)]
    pub collection_interval: Option<String>,
}

impl HostmetricsReceiver {
    pub fn validate(&self, id: &str) -> Result<(), CompileError> {
        validate_collection_interval(id, self.collection_interval.as_deref()).map(|_| ())
    }
}

impl MetricsReceiver for HostmetricsReceiver {
    fn type_name(&self) -> &'static str {
        "hostmetrics"
    }

    fn receiver_pipelines(&self) -> Vec<ReceiverPipeline> {
        let interval = interval_or_default(&self.collection_interval);
        let scrapers: serde_json::Map<String, serde_json::Value> = HOST_SCRAPERS
            .iter()
            .map(|s| ((*s).to_owned(), json!({})))
            .collect();
        let host = ReceiverPipeline::new(
            otel::Component::new(
                "hostmetrics",
                json!({ "collection_interval": interval, "scrapers": scrapers }),
            ),
            Signal::Metrics,
            vec![
                otel::Component::new(
                    "agentmetrics",
                    json!({ "blank_label_metrics": ["system.cpu.utilization"] }),
                ),
                metrics_filter(
                    "exclude",
                    "strict",
                    &HOST_EXCLUDED_METRICS.map(str::to_owned),
                ),
                rename_metrics(&HOST_RENAMES),
                add_prefix(AGENT_METRICS_PREFIX),
            ],
        );

        // 에이전트 자체 프로세스 메트릭
        let agent_process = ReceiverPipeline::new(
            otel::Component::new(
                "hostmetrics",
                json!({
                    "collection_interval": interval,
                    "scrapers": {
                        "process": {
                            "include": {
                                "match_type": "strict",
                                "names": AGENT_PROCESS_NAMES,
                            },
                            "mute_process_name_error": true,
                        }
                    }
                }),
            ),
            Signal::Metrics,
            vec![
                metrics_filter(
                    "include",
                    "strict",
                    &PROCESS_RENAMES.map(|(from, _)| from.to_owned()),
                ),
                rename_metrics(&PROCESS_RENAMES),
                add_prefix(AGENT_METRICS_PREFIX),
            ],
        );
        vec![host, agent_process]
    }
}

// ─── nginx ──────────────────────────────────────────────────────────

/// `nginx` 메트릭 리시버 (stub_status 모듈)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NginxReceiver {
    #[serde(default)]
    pub collection_interval: Option<String>,
    #[serde(default)]
    pub stub_status_url: Option<String>,
}

impl NginxReceiver {
    pub fn validate(&self, id: &str) -> Result<(), CompileError> {
        validate_collection_interval(id, self.collection_interval.as_deref())?;
        if let Some(url) = &self.stub_status_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(invalid_metrics(
                    ComponentRole::Receiver,
                    id,
                    "stub_status_url",
                    &format!("{url:?} is not an http(s) URL"),
                ));
            }
        }
        Ok(())
    }
}

impl MetricsReceiver for NginxReceiver {
    fn type_name(&self) -> &'static str {
        "nginx"
    }

    fn receiver_pipelines(&self) -> Vec<ReceiverPipeline> {
        vec![ReceiverPipeline::new(
            otel::Component::new(
                "nginx",
                json!({
                    "collection_interval": interval_or_default(&self.collection_interval),
                    "endpoint": self.stub_status_url.as_deref().unwrap_or(DEFAULT_STUB_STATUS_URL),
                }),
            ),
            Signal::Metrics,
            vec![
                otel::Component::new("normalizesums", json!({})),
                add_prefix(WORKLOAD_METRICS_PREFIX),
            ],
        )]
    }
}

// ─── otlp ───────────────────────────────────────────────────────────

/// `otlp` 리시버 (gRPC)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OtlpReceiver {
    #[serde(default)]
    pub grpc_endpoint: Option<String>,
}

impl OtlpReceiver {
    pub fn validate(&self, id: &str) -> Result<(), CompileError> {
        if let Some(endpoint) = &self.grpc_endpoint {
            let port = endpoint.rsplit_once(':').map(|(_, p)| p.parse::<u16>());
            if !matches!(port, Some(Ok(_))) {
                return Err(invalid_metrics(
                    ComponentRole::Receiver,
                    id,
                    "grpc_endpoint",
                    &format!("{endpoint:?} is not a host:port address"),
                ));
            }
        }
        Ok(())
    }
}

impl MetricsReceiver for OtlpReceiver {
    fn type_name(&self) -> &'static str {
        "otlp"
    }

    fn receiver_pipelines(&self) -> Vec<ReceiverPipeline> {
        let endpoint = self
            .grpc_endpoint
            .as_deref()
            .unwrap_or(DEFAULT_OTLP_GRPC_ENDPOINT);
        // 클라이언트가 보낸 리소스 속성을 우선
        vec![
            ReceiverPipeline::new(
                otel::Component::new(
                    "otlp",
                    json!({ "protocols": { "grpc": { "endpoint": endpoint } } }),
                ),
                Signal::Metrics,
                Vec::new(),
            )
            .with_resource_detection(Signal::Metrics, ResourceDetectionMode::SetIfMissing),
        ]
    }
}

// ─── exclude_metrics ────────────────────────────────────────────────

/// `exclude_metrics` 프로세서 -- 이름 패턴(`*` 와일드카드)에 맞는 메트릭을 버림
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExcludeMetrics {
    pub metrics_pattern: Vec<String>,
}

impl ExcludeMetrics {
    pub fn validate(&self, id: &str) -> Result<(), CompileError> {
        if self.metrics_pattern.is_empty() {
            return Err(invalid_metrics(
                ComponentRole::Processor,
                id,
                "metrics_pattern",
                "at least one pattern is required",
            ));
        }
        for pattern in &self.metrics_pattern {
            if !pattern.contains('/') {
                return Err(invalid_metrics(
                    ComponentRole::Processor,
                    id,
                    "metrics_pattern",
                    &format!("{pattern:?} must start with a metric domain like \"agent.googleapis.com/\""),
                ));
            }
        }
        Ok(())
    }

    /// 와일드카드 패턴을 고정된 정규식으로 변환합니다.
    pub fn regexes(&self) -> Vec<String> {
        self.metrics_pattern
            .iter()
            .map(|p| format!("^{}$", regex::escape(p).replace(r"\*", ".*")))
            .collect()
    }
}

impl MetricsProcessor for ExcludeMetrics {
    fn type_name(&self) -> &'static str {
        "exclude_metrics"
    }

    fn processors(&self) -> Vec<otel::Component> {
        vec![metrics_filter("exclude", "regexp", &self.regexes())]
    }
}
