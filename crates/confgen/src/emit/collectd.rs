//! 레거시 메트릭 엔진 emitter
//!
//! 호스트 메트릭 리시버 하나, 익스포터 하나, 파이프라인 하나만 표현할 수 있습니다.
//! 메트릭 도메인이 비어 있으면 기본 주기와 고정 프리앰블만 생성합니다.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use tracing::debug;

use opsforge_core::error::CompileError;
use opsforge_core::platform::PlatformFacts;
use opsforge_core::types::{ComponentRole, Subagent};

use crate::OutputFiles;
use crate::model::{
    Metrics, MetricsReceiverConfig, UnifiedConfig, check_reserved_ids,
    validate_collection_interval,
};

/// 생성 파일 이름
pub const CONFIG_FILE_NAME: &str = "collectd.conf";

/// 유일하게 허용되는 익스포터 타입
const SUPPORTED_EXPORTER: &str = "google_cloud_monitoring";

const DEFAULT_INTERVAL_SECS: f64 = 60.0;

const FIXED_PREAMBLE: &str = r#"
# Explicitly set hostname to "" to indicate the default resource.
Hostname ""

# The Stackdriver agent does not use fully qualified domain names.
FQDNLookup false

# Collectd processes its config in order, so this must be loaded first in order
# to catch messages from other plugins during configuration.
LoadPlugin syslog
<Plugin "syslog">
  LogLevel "info"
</Plugin>

LoadPlugin logfile
<Plugin "logfile">
  LogLevel "info"
  File "{logs_dir}/metrics-module.log"
  Timestamp true
</Plugin>

LoadPlugin stackdriver_agent
LoadPlugin write_gcm
<Plugin "write_gcm">
  PrettyPrintJSON false
</Plugin>
"#;

/// 호스트 메트릭 그룹별 플러그인 블록 (출력 순서 고정)
const HOST_METRIC_GROUPS: [(&str, &str); 5] = [
    (
        "cpu",
        r#"
LoadPlugin load
LoadPlugin cpu
<Plugin "cpu">
  ValuesPercentage true
  ReportByCpu true
  ReportByState true
</Plugin>
"#,
    ),
    (
        "disk",
        r#"
LoadPlugin disk
<Plugin "disk">
</Plugin>

LoadPlugin df
<Plugin "df">
  FSType "devfs"
  IgnoreSelected true
  ReportByDevice true
  ValuesPercentage true
</Plugin>
"#,
    ),
    (
        "memory",
        r#"
LoadPlugin memory
<Plugin "memory">
  ValuesPercentage true
</Plugin>
"#,
    ),
    (
        "network",
        r#"
LoadPlugin interface
<Plugin "interface">
</Plugin>

LoadPlugin tcpconns
<Plugin "tcpconns">
  AllPortsSummary true
</Plugin>
"#,
    ),
    (
        "swap",
        r#"
LoadPlugin swap
<Plugin "swap">
  ValuesPercentage true
</Plugin>
"#,
    ),
];

const PROCESSES_CHAIN: &str = r#"
LoadPlugin processes
LoadPlugin match_regex
<Plugin "processes">
  ProcessMatch "all" ".*"
  Detail "ps_cputime"
  Detail "ps_disk_octets"
  Detail "ps_rss"
  Detail "ps_vm"
</Plugin>

PostCacheChain "PostCache"
<Chain "PostCache">
  # Send all expected process metrics to the output plugin.
  <Rule "processes">
    <Match "regex">
      Plugin "^processes$"
      Type "^(ps_cputime|disk_octets|ps_rss|ps_vm|fork_rate|ps_state)$"
    </Match>
    <Target "jump">
      Chain "WriteAndStop"
    </Target>
  </Rule>
  # Stop processing on (do not write) all unexpected process metrics.
  <Rule "processes_exclude">
    <Match "regex">
      Plugin "^processes$"
    </Match>
    Target "stop"
  </Rule>
  # Send all other metrics to the output plugin.
  <Target "jump">
    Chain "WriteAndStop"
  </Target>
</Chain>

<Chain "WriteAndStop">
  <Rule "write">
    <Target "write">
      Plugin "write_gcm"
    </Target>
  </Rule>
  Target "stop"
</Chain>
"#;

/// 검증을 통과한 레거시 엔진 설정
#[derive(Debug, Clone, PartialEq)]
struct LegacySettings {
    interval_secs: f64,
    host_metrics: bool,
}

impl Default for LegacySettings {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_INTERVAL_SECS,
            host_metrics: false,
        }
    }
}

fn cardinality(rule: &str, found: usize) -> CompileError {
    CompileError::Cardinality {
        subagent: Subagent::Metrics,
        rule: rule.to_owned(),
        found,
    }
}

fn undefined(role: ComponentRole, id: &str, pipeline: &str) -> CompileError {
    CompileError::UndefinedReference {
        subagent: Subagent::Metrics,
        role,
        id: id.to_owned(),
        pipeline: pipeline.to_owned(),
    }
}

fn validate(metrics: Option<&Metrics>) -> Result<LegacySettings, CompileError> {
    let mut settings = LegacySettings::default();
    let Some(metrics) = metrics else {
        return Ok(settings);
    };
    if metrics.receivers.is_empty()
        && metrics.exporters.is_empty()
        && metrics.service.pipelines.is_empty()
    {
        return Ok(settings);
    }
    let subagent = Subagent::Metrics;

    if metrics.receivers.len() > 1 {
        return Err(cardinality(
            "at most one metrics receiver with type \"hostmetrics\" is allowed",
            metrics.receivers.len(),
        ));
    }
    check_reserved_ids(subagent, ComponentRole::Receiver, metrics.receivers.keys())?;
    for (id, receiver) in &metrics.receivers {
        let MetricsReceiverConfig::Hostmetrics(host) = receiver else {
            return Err(CompileError::UnsupportedType {
                subagent,
                role: ComponentRole::Receiver,
                id: id.clone(),
                type_name: receiver.type_name().to_owned(),
                supported: vec!["hostmetrics".to_owned()],
            });
        };
        settings.interval_secs =
            validate_collection_interval(id, host.collection_interval.as_deref())?.as_secs_f64();
        settings.host_metrics = true;
    }

    // 레거시 엔진에는 메트릭 프로세서 개념이 없음
    check_reserved_ids(subagent, ComponentRole::Processor, metrics.processors.keys())?;
    if let Some((id, processor)) = metrics.processors.iter().next() {
        return Err(CompileError::UnsupportedType {
            subagent,
            role: ComponentRole::Processor,
            id: id.clone(),
            type_name: processor.type_name().to_owned(),
            supported: Vec::new(),
        });
    }

    if metrics.exporters.len() != 1 {
        return Err(cardinality(
            "exactly one metrics exporter with type 'google_cloud_monitoring' is required",
            metrics.exporters.len(),
        ));
    }
    check_reserved_ids(subagent, ComponentRole::Exporter, metrics.exporters.keys())?;
    for (id, exporter) in &metrics.exporters {
        if exporter.type_name() != SUPPORTED_EXPORTER {
            return Err(CompileError::UnsupportedType {
                subagent,
                role: ComponentRole::Exporter,
                id: id.clone(),
                type_name: exporter.type_name().to_owned(),
                supported: vec![SUPPORTED_EXPORTER.to_owned()],
            });
        }
    }

    let pipelines = &metrics.service.pipelines;
    if pipelines.len() != 1 {
        return Err(cardinality(
            "exactly one metrics service pipeline is required",
            pipelines.len(),
        ));
    }
    check_reserved_ids(subagent, ComponentRole::Pipeline, pipelines.keys())?;
    for (pipeline_id, pipeline) in pipelines {
        if pipeline.receivers.len() != 1 {
            return Err(cardinality(
                "exactly one receiver id is required in the metrics service pipeline receiver id list",
                pipeline.receivers.len(),
            ));
        }
        if let Some(id) = pipeline
            .receivers
            .iter()
            .find(|id| !metrics.receivers.contains_key(*id))
        {
            return Err(undefined(ComponentRole::Receiver, id, pipeline_id));
        }
        if pipeline.exporters.len() != 1 {
            return Err(cardinality(
                "exactly one exporter id is required in the metrics service pipeline exporter id list",
                pipeline.exporters.len(),
            ));
        }
        if let Some(id) = pipeline
            .exporters
            .iter()
            .find(|id| !metrics.exporters.contains_key(*id))
        {
            return Err(undefined(ComponentRole::Exporter, id, pipeline_id));
        }
    }
    Ok(settings)
}

fn render(settings: &LegacySettings, logs_dir: &str) -> String {
    let mut out = String::new();
    // String에 대한 write!는 실패하지 않음
    let _ = writeln!(out, "Interval {}", settings.interval_secs);
    out.push_str(&FIXED_PREAMBLE.replace("{logs_dir}", logs_dir));
    if settings.host_metrics {
        for (group, block) in HOST_METRIC_GROUPS {
            debug!(group, "emitted host metric group");
            out.push_str(block);
        }
        out.push_str(PROCESSES_CHAIN);
    }
    out
}

/// 레거시 메트릭 엔진 설정 파일 맵을 생성합니다.
///
/// 로그 도메인은 이 백엔드와 무관하므로 무시합니다.
pub fn emit(
    config: &UnifiedConfig,
    platform: &PlatformFacts,
) -> Result<OutputFiles, CompileError> {
    let settings = validate(config.metrics.as_ref())?;
    debug!(
        interval_secs = settings.interval_secs,
        host_metrics = settings.host_metrics,
        "validated legacy metrics config"
    );
    Ok(BTreeMap::from([(
        CONFIG_FILE_NAME.to_owned(),
        render(&settings, &platform.logs_dir),
    )]))
}
