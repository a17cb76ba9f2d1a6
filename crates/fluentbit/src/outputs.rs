//! OUTPUT 섹션 빌더 -- 원격 로그 수집 서비스로 보내는 stackdriver 출력

use crate::component::{Component, Kind};

/// 레코드에서 HTTP 요청 구조체를 찾는 키
pub const HTTP_REQUEST_KEY: &str = "logging.googleapis.com/httpRequest";

/// 전송 실패 시 재시도 횟수
const RETRY_LIMIT: &str = "3";

/// stackdriver 출력 설정
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackdriverOutput {
    /// 매칭 정규식 (`^(a|b)$`)
    pub match_regex: String,
    /// 요청에 실리는 user agent
    pub user_agent: String,
    /// 출력 워커 수
    pub workers: u32,
}

impl StackdriverOutput {
    pub fn new(match_regex: impl Into<String>, user_agent: impl Into<String>, workers: u32) -> Self {
        Self {
            match_regex: match_regex.into(),
            user_agent: user_agent.into(),
            workers,
        }
    }

    pub fn component(&self) -> Component {
        Component::new(Kind::Output)
            .with("Name", "stackdriver")
            .with("Match_Regex", self.match_regex.as_str())
            .with("resource", "gce_instance")
            .with("http_request_key", HTTP_REQUEST_KEY)
            .with("stackdriver_agent", self.user_agent.as_str())
            .with("Retry_Limit", RETRY_LIMIT)
            .with("tls", "On")
            .with("tls.verify", "Off")
            .with("workers", self.workers.to_string())
            .with("net.connect_timeout_log_error", "False")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stackdriver_output_keys() {
        let c = StackdriverOutput::new(r"^(p1\.r1)$", "google-cloud-ops-agent-logging/1.0", 8)
            .component();
        assert_eq!(c.kind, Kind::Output);
        assert_eq!(c.get("Match_Regex"), Some(r"^(p1\.r1)$"));
        assert_eq!(c.get("workers"), Some("8"));
        assert_eq!(c.get("Retry_Limit"), Some("3"));
        assert_eq!(c.get("tls.verify"), Some("Off"));
        assert_eq!(
            c.get("http_request_key"),
            Some("logging.googleapis.com/httpRequest")
        );
        assert!(c.ordered_config.is_empty());
    }
}
