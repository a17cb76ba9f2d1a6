//! 설정 관리 -- opsforge.toml 파싱 및 런타임 설정
//!
//! [`OpsforgeConfig`]는 컴파일러 실행 환경(로깅, 경로, 에이전트 빌드 정보)을 담습니다.
//! 사용자 텔레메트리 구성(YAML)은 `opsforge-confgen`이 별도로 다룹니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`OPSFORGE_PATHS_STATE_DIR=/tmp/state` 형식)
//! 3. 설정 파일 (`opsforge.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), opsforge_core::error::OpsforgeError> {
//! use opsforge_core::config::OpsforgeConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = OpsforgeConfig::load("opsforge.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = OpsforgeConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, OpsforgeError};

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Opsforge 실행 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpsforgeConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 경로 설정
    #[serde(default)]
    pub paths: PathsConfig,
    /// 에이전트 빌드 정보
    #[serde(default)]
    pub agent: AgentConfig,
}

impl OpsforgeConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, OpsforgeError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 파일이 없으면 기본값을 사용합니다. 환경변수 오버라이드는 항상 적용됩니다.
    pub async fn load_or_default(path: impl AsRef<Path>) -> Result<Self, OpsforgeError> {
        let mut config = match Self::from_file(path).await {
            Ok(config) => config,
            Err(OpsforgeError::Config(ConfigError::FileNotFound { path })) => {
                tracing::debug!(path = %path, "settings file not found, using defaults");
                Self::default()
            }
            Err(e) => return Err(e),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, OpsforgeError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                OpsforgeError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                OpsforgeError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, OpsforgeError> {
        toml::from_str(toml_str).map_err(|e| {
            OpsforgeError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `OPSFORGE_{SECTION}_{FIELD}`
    /// 예: `OPSFORGE_GENERAL_LOG_LEVEL=debug`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "OPSFORGE_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "OPSFORGE_GENERAL_LOG_FORMAT");
        override_string(
            &mut self.general.backend_log_level,
            "OPSFORGE_GENERAL_BACKEND_LOG_LEVEL",
        );
        override_bool(&mut self.general.self_logs, "OPSFORGE_GENERAL_SELF_LOGS");

        // Paths
        override_string(&mut self.paths.logs_dir, "OPSFORGE_PATHS_LOGS_DIR");
        override_string(&mut self.paths.state_dir, "OPSFORGE_PATHS_STATE_DIR");
        override_string(&mut self.paths.output_dir, "OPSFORGE_PATHS_OUTPUT_DIR");

        // Agent
        override_string(&mut self.agent.version, "OPSFORGE_AGENT_VERSION");
        override_string(&mut self.agent.build_distro, "OPSFORGE_AGENT_BUILD_DISTRO");
        override_string(&mut self.agent.short_name, "OPSFORGE_AGENT_SHORT_NAME");
        override_string(
            &mut self.agent.short_version,
            "OPSFORGE_AGENT_SHORT_VERSION",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), OpsforgeError> {
        // log_level 검증
        if !VALID_LOG_LEVELS.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", VALID_LOG_LEVELS.join(", ")),
            }
            .into());
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        // 로그 백엔드가 받아들이는 레벨
        let backend_levels = ["off", "error", "warn", "info", "debug", "trace"];
        if !backend_levels.contains(&self.general.backend_log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.backend_log_level".to_owned(),
                reason: format!("must be one of: {}", backend_levels.join(", ")),
            }
            .into());
        }

        for (field, value) in [
            ("paths.logs_dir", &self.paths.logs_dir),
            ("paths.state_dir", &self.paths.state_dir),
            ("paths.output_dir", &self.paths.output_dir),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: field.to_owned(),
                    reason: "must not be empty".to_owned(),
                }
                .into());
            }
        }

        if self.agent.version.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "agent.version".to_owned(),
                reason: "must not be empty".to_owned(),
            }
            .into());
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
    /// 생성된 로그 백엔드 설정의 기본 Log_Level
    pub backend_log_level: String,
    /// 에이전트 자체 로그 수집 여부
    pub self_logs: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
            backend_log_level: "info".to_owned(),
            self_logs: true,
        }
    }
}

/// 경로 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// 에이전트 로그 디렉토리
    pub logs_dir: String,
    /// 에이전트 상태 디렉토리
    pub state_dir: String,
    /// 생성된 설정 파일 출력 디렉토리
    pub output_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            logs_dir: "/var/log/opsforge".to_owned(),
            state_dir: "/var/lib/opsforge".to_owned(),
            output_dir: "/run/opsforge".to_owned(),
        }
    }
}

/// 에이전트 빌드 정보 (User-Agent 및 버전 레이블)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub version: String,
    pub build_distro: String,
    pub short_name: String,
    pub short_version: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_owned(),
            build_distro: "source".to_owned(),
            short_name: "unknown".to_owned(),
            short_version: "unknown".to_owned(),
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}
