//! 익스포터 -- 로그/메트릭 전송 대상

use serde::Deserialize;
use serde_json::json;

use opsforge_core::platform::PlatformFacts;
use opsforge_otel::{self as otel, ExporterType};

/// 파이프라인이 익스포터를 나열하지 않았을 때 쓰는 내장 로그 익스포터
pub const DEFAULT_LOGGING_EXPORTER: &str = "lib:google_cloud_logging";

/// 로그 출력 user agent 접두어
pub const LOGGING_USER_AGENT_PREFIX: &str = "Opsforge-Logging";

/// 컬렉터 익스포터 user agent 접두어
pub const COLLECTOR_USER_AGENT_PREFIX: &str = "Opsforge-Collector";

/// 파라미터가 없는 컴포넌트 설정
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NoParameters {}

/// 로그 익스포터
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LoggingExporterConfig {
    GoogleCloudLogging(NoParameters),
}

impl LoggingExporterConfig {
    pub const TYPES: [&'static str; 1] = ["google_cloud_logging"];

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::GoogleCloudLogging(_) => "google_cloud_logging",
        }
    }
}

/// 메트릭 익스포터
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MetricsExporterConfig {
    GoogleCloudMonitoring(NoParameters),
    GoogleManagedPrometheus(NoParameters),
}

impl MetricsExporterConfig {
    pub const TYPES: [&'static str; 2] = ["google_cloud_monitoring", "google_managed_prometheus"];

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::GoogleCloudMonitoring(_) => "google_cloud_monitoring",
            Self::GoogleManagedPrometheus(_) => "google_managed_prometheus",
        }
    }

    pub fn exporter_type(&self) -> ExporterType {
        match self {
            Self::GoogleCloudMonitoring(_) => ExporterType::CloudMonitoring,
            Self::GoogleManagedPrometheus(_) => ExporterType::ManagedPrometheus,
        }
    }
}

/// 익스포터 종류별 컬렉터 익스포터 컴포넌트
pub fn otel_exporter(exporter_type: ExporterType, platform: &PlatformFacts) -> otel::Component {
    let user_agent = platform.user_agent(COLLECTOR_USER_AGENT_PREFIX);
    match exporter_type {
        ExporterType::CloudMonitoring => otel::Component::new(
            "googlecloud",
            json!({
                "user_agent": user_agent,
                "metric": {
                    "prefix": "",
                    "skip_create_descriptor": true,
                },
            }),
        ),
        ExporterType::ManagedPrometheus => otel::Component::new(
            "googlemanagedprometheus",
            json!({ "user_agent": user_agent }),
        ),
        ExporterType::CloudLogging => otel::Component::new(
            "googlecloud",
            json!({
                "user_agent": user_agent,
                "log": { "default_log_name": "opsforge-collector" },
            }),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exporter_types_parse_from_yaml() {
        let e: MetricsExporterConfig =
            serde_yaml::from_str("type: google_managed_prometheus").unwrap();
        assert_eq!(e.exporter_type(), ExporterType::ManagedPrometheus);
        let e: LoggingExporterConfig = serde_yaml::from_str("type: google_cloud_logging").unwrap();
        assert_eq!(e.type_name(), "google_cloud_logging");
    }

    #[test]
    fn exporters_reject_parameters() {
        let result: Result<LoggingExporterConfig, _> =
            serde_yaml::from_str("type: google_cloud_logging\nendpoint: x");
        assert!(result.is_err());
    }

    #[test]
    fn logging_and_monitoring_exporters_get_distinct_names() {
        let platform = PlatformFacts::for_tests();
        let monitoring = otel_exporter(ExporterType::CloudMonitoring, &platform);
        let logging = otel_exporter(ExporterType::CloudLogging, &platform);
        assert_ne!(
            monitoring.name(ExporterType::CloudMonitoring.suffix()),
            logging.name(ExporterType::CloudLogging.suffix())
        );
        assert!(
            logging.config["user_agent"]
                .as_str()
                .unwrap()
                .starts_with("Opsforge-Collector/1.0.0")
        );
    }
}
