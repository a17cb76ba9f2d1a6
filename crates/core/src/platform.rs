//! 플랫폼 정보 -- 컴파일 실행마다 명시적으로 전달되는 호스트 사실 값
//!
//! 컴파일러 코어는 환경변수나 파일시스템을 직접 읽지 않습니다.
//! 프로세스 시작 시 한 번 [`PlatformFacts`]를 구성하고 모든 emitter에 인자로 넘깁니다.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::OpsforgeConfig;

/// 호스트 운영체제 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OsKind {
    Linux,
    Windows,
}

impl OsKind {
    /// 컴파일된 타겟 OS에서 결정합니다.
    pub fn current() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Linux
        }
    }
}

impl fmt::Display for OsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linux => write!(f, "linux"),
            Self::Windows => write!(f, "windows"),
        }
    }
}

/// 컴파일에 필요한 호스트 사실 값 (읽기 전용)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformFacts {
    /// 운영체제
    pub os: OsKind,
    /// 호스트 이름
    pub hostname: String,
    /// 에이전트 버전
    pub agent_version: String,
    /// 빌드 배포판 (예: "build_distro")
    pub build_distro: String,
    /// OS 짧은 이름 (예: "debian")
    pub short_name: String,
    /// OS 짧은 버전 (예: "12")
    pub short_version: String,
    /// 에이전트 로그 디렉토리
    pub logs_dir: String,
    /// 에이전트 상태 디렉토리 (버퍼, 체크포인트)
    pub state_dir: String,
}

impl PlatformFacts {
    /// 설정 파일 값과 호스트 이름으로 플랫폼 정보를 구성합니다.
    pub fn from_config(config: &OpsforgeConfig, hostname: impl Into<String>) -> Self {
        Self {
            os: OsKind::current(),
            hostname: hostname.into(),
            agent_version: config.agent.version.clone(),
            build_distro: config.agent.build_distro.clone(),
            short_name: config.agent.short_name.clone(),
            short_version: config.agent.short_version.clone(),
            logs_dir: config.paths.logs_dir.clone(),
            state_dir: config.paths.state_dir.clone(),
        }
    }

    /// 테스트용 결정적 플랫폼 정보
    pub fn for_tests() -> Self {
        Self {
            os: OsKind::Linux,
            hostname: "test-host".to_owned(),
            agent_version: "1.0.0".to_owned(),
            build_distro: "build_distro".to_owned(),
            short_name: "linux_os".to_owned(),
            short_version: "linux_os_version".to_owned(),
            logs_dir: "/var/log/opsforge".to_owned(),
            state_dir: "/var/lib/opsforge".to_owned(),
        }
    }

    /// 출력 플러그인에 전달하는 User-Agent 문자열
    pub fn user_agent(&self, prefix: &str) -> String {
        format!(
            "{prefix}/{version} (BuildDistro={distro};Platform={os};ShortName={name};ShortVersion={short})",
            version = self.agent_version,
            distro = self.build_distro,
            os = self.os,
            name = self.short_name,
            short = self.short_version,
        )
    }

    /// 출력 워커 수 (linux: 8, 그 외: 1)
    pub fn output_workers(&self) -> u32 {
        match self.os {
            OsKind::Linux => 8,
            OsKind::Windows => 1,
        }
    }

    /// 로그 백엔드 버퍼 디렉토리
    pub fn buffers_dir(&self) -> String {
        join_path(&self.state_dir, "buffers")
    }
}

/// OS에 무관하게 '/' 구분자로 경로를 잇습니다. 생성된 설정 텍스트는 항상 같은 형태여야 합니다.
fn join_path(base: &str, child: &str) -> String {
    format!("{}/{}", base.trim_end_matches(['/', '\\']), child)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_agent_has_expected_shape() {
        let facts = PlatformFacts::for_tests();
        assert_eq!(
            facts.user_agent("Google-Cloud-Ops-Agent-Logging"),
            "Google-Cloud-Ops-Agent-Logging/1.0.0 (BuildDistro=build_distro;Platform=linux;ShortName=linux_os;ShortVersion=linux_os_version)"
        );
    }

    #[test]
    fn workers_depend_on_os() {
        let mut facts = PlatformFacts::for_tests();
        assert_eq!(facts.output_workers(), 8);
        facts.os = OsKind::Windows;
        assert_eq!(facts.output_workers(), 1);
    }

    #[test]
    fn buffers_dir_strips_trailing_separator() {
        let mut facts = PlatformFacts::for_tests();
        facts.state_dir = "/var/lib/opsforge/".to_owned();
        assert_eq!(facts.buffers_dir(), "/var/lib/opsforge/buffers");
    }

    #[test]
    fn from_config_copies_agent_fields() {
        let mut config = OpsforgeConfig::default();
        config.agent.version = "2.3.4".to_owned();
        config.paths.logs_dir = "/tmp/logs".to_owned();
        let facts = PlatformFacts::from_config(&config, "vm-1");
        assert_eq!(facts.agent_version, "2.3.4");
        assert_eq!(facts.logs_dir, "/tmp/logs");
        assert_eq!(facts.hostname, "vm-1");
    }
}
