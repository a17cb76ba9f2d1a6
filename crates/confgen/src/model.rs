//! 통합 설정 모델 -- 사용자가 작성한 YAML 한 장
//!
//! 로그(`logging`)와 메트릭(`metrics`) 두 도메인이 각각 리시버/프로세서/익스포터 맵과
//! 서비스 파이프라인 맵을 가집니다. 모든 맵은 `BTreeMap`이므로 순회 순서는 항상
//! 사전순이며, 같은 입력은 같은 출력으로 컴파일됩니다.
//!
//! ```yaml
//! logging:
//!   receivers:
//!     syslog:
//!       type: files
//!       include_paths: [/var/log/syslog]
//!   service:
//!     pipelines:
//!       default:
//!         receivers: [syslog]
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use opsforge_core::error::{CompileError, ConfigError, OpsforgeError};
use opsforge_core::types::{ComponentRole, Subagent, is_reserved};

use crate::capability::{MetricsProcessor, MetricsReceiver, ProcessorRef, ReceiverRef};
use crate::exporters::{LoggingExporterConfig, MetricsExporterConfig, NoParameters};
use crate::logging::{
    AppLog, AppProcessor, AppReceiver, ExcludeLogs, FilesReceiver, ForwardReceiver, ModifyFields,
    ParseJson, ParseMultiline, ParseRegex, SyslogReceiver, TcpReceiver, WinlogReceiver,
};
use crate::metrics::{ExcludeMetrics, HostmetricsReceiver, NginxReceiver, OtlpReceiver};

/// 메트릭 수집 주기 하한
pub const MIN_COLLECTION_INTERVAL: Duration = Duration::from_secs(10);

const DEFAULT_COLLECTION_INTERVAL: Duration = Duration::from_secs(60);

/// `logging.service.log_level`에 쓸 수 있는 값
pub const LOGGING_LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// `metrics.service.log_level`에 쓸 수 있는 값 (컬렉터에는 `trace`가 없음)
pub const METRICS_LOG_LEVELS: [&str; 4] = ["error", "warn", "info", "debug"];

// ─── 에러 헬퍼 ──────────────────────────────────────────────────────

pub(crate) fn invalid_logging(
    role: ComponentRole,
    id: &str,
    parameter: &str,
    reason: &str,
) -> CompileError {
    CompileError::InvalidParameter {
        subagent: Subagent::Logging,
        role,
        id: id.to_owned(),
        parameter: parameter.to_owned(),
        reason: reason.to_owned(),
    }
}

pub(crate) fn invalid_metrics(
    role: ComponentRole,
    id: &str,
    parameter: &str,
    reason: &str,
) -> CompileError {
    CompileError::InvalidParameter {
        subagent: Subagent::Metrics,
        role,
        id: id.to_owned(),
        parameter: parameter.to_owned(),
        reason: reason.to_owned(),
    }
}

/// 사용자 정의 ID 중 예약 접두어로 시작하는 첫 번째 ID를 거부합니다.
pub fn check_reserved_ids<'a>(
    subagent: Subagent,
    role: ComponentRole,
    ids: impl IntoIterator<Item = &'a String>,
) -> Result<(), CompileError> {
    match ids.into_iter().find(|id| is_reserved(id)) {
        Some(id) => Err(CompileError::ReservedId {
            subagent,
            role,
            id: id.clone(),
        }),
        None => Ok(()),
    }
}

/// 서비스 섹션의 `log_level`이 허용 목록에 있는지 검사합니다.
fn check_log_level(
    subagent: Subagent,
    level: Option<&str>,
    allowed: &[&str],
) -> Result<(), CompileError> {
    match level {
        Some(level) if !allowed.contains(&level) => Err(CompileError::InvalidParameter {
            subagent,
            role: ComponentRole::Service,
            id: "service".to_owned(),
            parameter: "log_level".to_owned(),
            reason: format!("{level:?} must be one of [{}]", allowed.join(", ")),
        }),
        _ => Ok(()),
    }
}

// ─── 주기 파싱 ──────────────────────────────────────────────────────

/// `"60s"`, `"1m30s"`, `"1.5s"`, `"500ms"` 형식의 주기를 파싱합니다.
///
/// 단위는 `ms`, `s`, `m`, `h`이며 단위 없는 숫자는 거부합니다.
pub fn parse_interval(input: &str) -> Option<Duration> {
    let mut rest = input.trim();
    if rest.is_empty() {
        return None;
    }
    let mut total = 0f64;
    while !rest.is_empty() {
        let number_end = rest.find(|c: char| !(c.is_ascii_digit() || c == '.'))?;
        if number_end == 0 {
            return None;
        }
        let value: f64 = rest[..number_end].parse().ok()?;
        rest = &rest[number_end..];

        let unit_end = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let scale = match &rest[..unit_end] {
            "ms" => 0.001,
            "s" => 1.0,
            "m" => 60.0,
            "h" => 3600.0,
            _ => return None,
        };
        total += value * scale;
        rest = &rest[unit_end..];
    }
    Some(Duration::from_secs_f64(total))
}

/// 메트릭 리시버의 `collection_interval`을 검증하고 파싱된 값을 반환합니다 (기본 60s).
pub(crate) fn validate_collection_interval(
    id: &str,
    interval: Option<&str>,
) -> Result<Duration, CompileError> {
    let Some(raw) = interval else {
        return Ok(DEFAULT_COLLECTION_INTERVAL);
    };
    let parsed = parse_interval(raw).ok_or_else(|| {
        invalid_metrics(
            ComponentRole::Receiver,
            id,
            "collection_interval",
            &format!("{raw:?} is not an interval (e.g. \"60s\")"),
        )
    })?;
    if parsed < MIN_COLLECTION_INTERVAL {
        return Err(invalid_metrics(
            ComponentRole::Receiver,
            id,
            "collection_interval",
            &format!("{raw:?} is below the minimum threshold of \"10s\""),
        ));
    }
    Ok(parsed)
}

// ─── 루트 ───────────────────────────────────────────────────────────

/// 통합 설정 (컴파일 한 번 동안 불변)
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UnifiedConfig {
    #[serde(default)]
    pub logging: Option<Logging>,
    #[serde(default)]
    pub metrics: Option<Metrics>,
}

impl UnifiedConfig {
    /// YAML 문서를 파싱하고 검증합니다. 빈 문서는 빈 설정입니다.
    pub fn parse(yaml: &str) -> Result<Self, OpsforgeError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseFailed {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// 파이프라인 참조와 무관하게 검사할 수 있는 모든 규칙을 검증합니다.
    pub fn validate(&self) -> Result<(), CompileError> {
        if let Some(logging) = &self.logging {
            logging.validate()?;
        }
        if let Some(metrics) = &self.metrics {
            metrics.validate()?;
        }
        Ok(())
    }
}

// ─── logging ────────────────────────────────────────────────────────

/// 로그 도메인
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Logging {
    #[serde(default)]
    pub receivers: BTreeMap<String, LoggingReceiverConfig>,
    #[serde(default)]
    pub processors: BTreeMap<String, LoggingProcessorConfig>,
    #[serde(default)]
    pub exporters: BTreeMap<String, LoggingExporterConfig>,
    #[serde(default)]
    pub service: LoggingService,
}

impl Logging {
    fn validate(&self) -> Result<(), CompileError> {
        let subagent = Subagent::Logging;
        check_reserved_ids(subagent, ComponentRole::Receiver, self.receivers.keys())?;
        check_reserved_ids(subagent, ComponentRole::Processor, self.processors.keys())?;
        check_reserved_ids(subagent, ComponentRole::Exporter, self.exporters.keys())?;
        check_reserved_ids(
            subagent,
            ComponentRole::Pipeline,
            self.service.pipelines.keys(),
        )?;
        check_log_level(
            subagent,
            self.service.log_level.as_deref(),
            &LOGGING_LOG_LEVELS,
        )?;

        for (id, receiver) in &self.receivers {
            receiver.validate(id)?;
        }
        for (id, processor) in &self.processors {
            processor.validate(id)?;
        }
        self.check_port_conflicts()
    }

    /// 같은 포트를 듣는 네트워크 리시버 두 개를 거부합니다.
    fn check_port_conflicts(&self) -> Result<(), CompileError> {
        let mut owners: BTreeMap<u16, &String> = BTreeMap::new();
        for (id, receiver) in &self.receivers {
            let Some(port) = receiver.instantiate().listen_port() else {
                continue;
            };
            if let Some(first) = owners.insert(port, id) {
                return Err(CompileError::PortConflict {
                    port,
                    first: first.clone(),
                    second: id.clone(),
                });
            }
        }
        Ok(())
    }
}

/// 로그 서비스 섹션
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingService {
    /// 백엔드 자체 로그 레벨 (없으면 컴파일 옵션의 기본값)
    #[serde(default)]
    pub log_level: Option<String>,
    #[serde(default)]
    pub pipelines: BTreeMap<String, LoggingPipeline>,
}

impl UnifiedConfig {
    /// 백엔드 자체 로그 레벨. 설정에 없으면 `fallback`을 씁니다.
    pub fn backend_log_level<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.logging
            .as_ref()
            .and_then(|l| l.service.log_level.as_deref())
            .unwrap_or(fallback)
    }

    /// 컬렉터 자체 로그 레벨. 메트릭 서비스 설정이 우선하고, 없으면 로그 서비스 설정을 따릅니다.
    pub fn collector_log_level<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.metrics
            .as_ref()
            .and_then(|m| m.service.log_level.as_deref())
            .unwrap_or_else(|| self.backend_log_level(fallback))
    }
}

/// 로그 파이프라인이 향하는 백엔드
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoggingBackend {
    #[default]
    #[serde(alias = "fluent-bit", alias = "fluent_bit")]
    Fluentbit,
    Otel,
}

/// 로그 서비스 파이프라인
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingPipeline {
    #[serde(default)]
    pub receivers: Vec<String>,
    #[serde(default)]
    pub processors: Vec<String>,
    #[serde(default)]
    pub exporters: Vec<String>,
    #[serde(default)]
    pub backend: LoggingBackend,
}

/// 로그 리시버 설정 (`type`으로 구분)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LoggingReceiverConfig {
    Files(FilesReceiver),
    Syslog(SyslogReceiver),
    Tcp(TcpReceiver),
    FluentForward(ForwardReceiver),
    WindowsEventLog(WinlogReceiver),
    NginxAccess(FilesReceiver),
    NginxError(FilesReceiver),
    ApacheAccess(FilesReceiver),
    ApacheError(FilesReceiver),
}

impl LoggingReceiverConfig {
    /// 사용자가 쓸 수 있는 리시버 타입
    pub const TYPES: [&'static str; 9] = [
        "files",
        "syslog",
        "tcp",
        "fluent_forward",
        "windows_event_log",
        "nginx_access",
        "nginx_error",
        "apache_access",
        "apache_error",
    ];

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Files(_) => "files",
            Self::Syslog(_) => "syslog",
            Self::Tcp(_) => "tcp",
            Self::FluentForward(_) => "fluent_forward",
            Self::WindowsEventLog(_) => "windows_event_log",
            Self::NginxAccess(_) => AppLog::NginxAccess.type_name(),
            Self::NginxError(_) => AppLog::NginxError.type_name(),
            Self::ApacheAccess(_) => AppLog::ApacheAccess.type_name(),
            Self::ApacheError(_) => AppLog::ApacheError.type_name(),
        }
    }

    pub fn validate(&self, id: &str) -> Result<(), CompileError> {
        match self {
            Self::Files(files) => files.validate(id, true),
            Self::Syslog(syslog) => syslog.validate(id),
            Self::Tcp(tcp) => tcp.validate(id),
            Self::FluentForward(_) => Ok(()),
            Self::WindowsEventLog(winlog) => winlog.validate(id),
            Self::NginxAccess(files)
            | Self::NginxError(files)
            | Self::ApacheAccess(files)
            | Self::ApacheError(files) => files.validate(id, false),
        }
    }

    /// 역량 trait 객체로 변환합니다.
    pub fn instantiate(&self) -> ReceiverRef {
        match self {
            Self::Files(files) => Arc::new(files.clone()),
            Self::Syslog(syslog) => Arc::new(syslog.clone()),
            Self::Tcp(tcp) => Arc::new(tcp.clone()),
            Self::FluentForward(forward) => Arc::new(forward.clone()),
            Self::WindowsEventLog(winlog) => Arc::new(winlog.clone()),
            Self::NginxAccess(files) => app_receiver(AppLog::NginxAccess, files),
            Self::NginxError(files) => app_receiver(AppLog::NginxError, files),
            Self::ApacheAccess(files) => app_receiver(AppLog::ApacheAccess, files),
            Self::ApacheError(files) => app_receiver(AppLog::ApacheError, files),
        }
    }
}

fn app_receiver(app: AppLog, files: &FilesReceiver) -> ReceiverRef {
    Arc::new(AppReceiver {
        app,
        files: files.clone(),
    })
}

/// 로그 프로세서 설정 (`type`으로 구분)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LoggingProcessorConfig {
    ParseJson(ParseJson),
    ParseRegex(ParseRegex),
    ParseMultiline(ParseMultiline),
    ExcludeLogs(ExcludeLogs),
    ModifyFields(ModifyFields),
    NginxAccess(NoParameters),
    NginxError(NoParameters),
    ApacheAccess(NoParameters),
    ApacheError(NoParameters),
}

impl LoggingProcessorConfig {
    /// 사용자가 쓸 수 있는 프로세서 타입
    pub const TYPES: [&'static str; 9] = [
        "parse_json",
        "parse_regex",
        "parse_multiline",
        "exclude_logs",
        "modify_fields",
        "nginx_access",
        "nginx_error",
        "apache_access",
        "apache_error",
    ];

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::ParseJson(_) => "parse_json",
            Self::ParseRegex(_) => "parse_regex",
            Self::ParseMultiline(_) => "parse_multiline",
            Self::ExcludeLogs(_) => "exclude_logs",
            Self::ModifyFields(_) => "modify_fields",
            Self::NginxAccess(_) => AppLog::NginxAccess.type_name(),
            Self::NginxError(_) => AppLog::NginxError.type_name(),
            Self::ApacheAccess(_) => AppLog::ApacheAccess.type_name(),
            Self::ApacheError(_) => AppLog::ApacheError.type_name(),
        }
    }

    pub fn validate(&self, id: &str) -> Result<(), CompileError> {
        match self {
            Self::ParseRegex(p) => p.validate(id),
            Self::ParseMultiline(p) => p.validate(id),
            Self::ExcludeLogs(p) => p.validate(id),
            Self::ModifyFields(p) => p.validate(id),
            Self::ParseJson(_)
            | Self::NginxAccess(_)
            | Self::NginxError(_)
            | Self::ApacheAccess(_)
            | Self::ApacheError(_) => Ok(()),
        }
    }

    pub fn instantiate(&self) -> ProcessorRef {
        match self {
            Self::ParseJson(p) => Arc::new(p.clone()),
            Self::ParseRegex(p) => Arc::new(p.clone()),
            Self::ParseMultiline(p) => Arc::new(p.clone()),
            Self::ExcludeLogs(p) => Arc::new(p.clone()),
            Self::ModifyFields(p) => Arc::new(p.clone()),
            Self::NginxAccess(_) => Arc::new(AppProcessor {
                app: AppLog::NginxAccess,
            }),
            Self::NginxError(_) => Arc::new(AppProcessor {
                app: AppLog::NginxError,
            }),
            Self::ApacheAccess(_) => Arc::new(AppProcessor {
                app: AppLog::ApacheAccess,
            }),
            Self::ApacheError(_) => Arc::new(AppProcessor {
                app: AppLog::ApacheError,
            }),
        }
    }
}

// ─── metrics ────────────────────────────────────────────────────────

/// 메트릭 도메인
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Metrics {
    #[serde(default)]
    pub receivers: BTreeMap<String, MetricsReceiverConfig>,
    #[serde(default)]
    pub processors: BTreeMap<String, MetricsProcessorConfig>,
    #[serde(default)]
    pub exporters: BTreeMap<String, MetricsExporterConfig>,
    #[serde(default)]
    pub service: MetricsService,
}

impl Metrics {
    /// 설정된 `hostmetrics` 리시버 수
    pub fn hostmetrics_count(&self) -> usize {
        self.receivers
            .values()
            .filter(|r| matches!(r, MetricsReceiverConfig::Hostmetrics(_)))
            .count()
    }

    fn validate(&self) -> Result<(), CompileError> {
        let subagent = Subagent::Metrics;
        check_reserved_ids(subagent, ComponentRole::Receiver, self.receivers.keys())?;
        check_reserved_ids(subagent, ComponentRole::Processor, self.processors.keys())?;
        check_reserved_ids(subagent, ComponentRole::Exporter, self.exporters.keys())?;
        check_reserved_ids(
            subagent,
            ComponentRole::Pipeline,
            self.service.pipelines.keys(),
        )?;
        check_log_level(
            subagent,
            self.service.log_level.as_deref(),
            &METRICS_LOG_LEVELS,
        )?;

        let hostmetrics = self.hostmetrics_count();
        if hostmetrics > 1 {
            return Err(CompileError::Cardinality {
                subagent,
                rule: "at most one metrics receiver with type \"hostmetrics\" is allowed"
                    .to_owned(),
                found: hostmetrics,
            });
        }

        for (id, receiver) in &self.receivers {
            receiver.validate(id)?;
        }
        for (id, processor) in &self.processors {
            processor.validate(id)?;
        }
        Ok(())
    }
}

/// 메트릭 서비스 섹션
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsService {
    /// 컬렉터 자체 로그 레벨
    #[serde(default)]
    pub log_level: Option<String>,
    #[serde(default)]
    pub pipelines: BTreeMap<String, MetricsPipeline>,
}

/// 메트릭 서비스 파이프라인
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsPipeline {
    #[serde(default)]
    pub receivers: Vec<String>,
    #[serde(default)]
    pub processors: Vec<String>,
    #[serde(default)]
    pub exporters: Vec<String>,
}

/// 메트릭 리시버 설정
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MetricsReceiverConfig {
    Hostmetrics(HostmetricsReceiver),
    Nginx(NginxReceiver),
    Otlp(OtlpReceiver),
}

impl MetricsReceiverConfig {
    pub const TYPES: [&'static str; 3] = ["hostmetrics", "nginx", "otlp"];

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Hostmetrics(_) => "hostmetrics",
            Self::Nginx(_) => "nginx",
            Self::Otlp(_) => "otlp",
        }
    }

    pub fn validate(&self, id: &str) -> Result<(), CompileError> {
        match self {
            Self::Hostmetrics(r) => r.validate(id),
            Self::Nginx(r) => r.validate(id),
            Self::Otlp(r) => r.validate(id),
        }
    }

    pub fn instantiate(&self) -> Arc<dyn MetricsReceiver> {
        match self {
            Self::Hostmetrics(r) => Arc::new(r.clone()),
            Self::Nginx(r) => Arc::new(r.clone()),
            Self::Otlp(r) => Arc::new(r.clone()),
        }
    }
}

/// 메트릭 프로세서 설정
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MetricsProcessorConfig {
    ExcludeMetrics(ExcludeMetrics),
}

impl MetricsProcessorConfig {
    pub const TYPES: [&'static str; 1] = ["exclude_metrics"];

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::ExcludeMetrics(_) => "exclude_metrics",
        }
    }

    pub fn validate(&self, id: &str) -> Result<(), CompileError> {
        match self {
            Self::ExcludeMetrics(p) => p.validate(id),
        }
    }

    pub fn instantiate(&self) -> Arc<dyn MetricsProcessor> {
        match self {
            Self::ExcludeMetrics(p) => Arc::new(p.clone()),
        }
    }
}
