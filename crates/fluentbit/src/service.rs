//! SERVICE 섹션 -- 엔진 전역 설정, 항상 주 파일의 첫 섹션

use std::collections::BTreeMap;

use crate::component::{Component, Kind};
use crate::inputs::buffers_dir_ref;
use crate::modular::{BUFFERS_DIR_VARIABLE, LOGS_DIR_VARIABLE};

/// 엔진 전역 SERVICE 섹션
pub fn service(log_level: &str) -> Component {
    Component::new(Kind::Service)
        .with("Flush", "1")
        .with("Daemon", "off")
        .with("Log_Level", log_level)
        // 내장 메트릭 입력을 생성하지 않으므로 HTTP 서버도 불필요
        .with("HTTP_Server", "Off")
        .with("dns.resolver", "legacy")
        .with("storage.path", buffers_dir_ref())
        .with("storage.sync", "normal")
        .with("storage.checksum", "off")
        .with("storage.backlog.mem_limit", "50M")
        .with("storage.max_chunks_up", "128")
}

/// 주 파일 `@SET` 변수 집합
pub fn variables(buffers_dir: &str, logs_dir: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        (BUFFERS_DIR_VARIABLE.to_owned(), buffers_dir.to_owned()),
        (LOGS_DIR_VARIABLE.to_owned(), logs_dir.to_owned()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_refers_to_buffers_variable() {
        let c = service("info");
        assert_eq!(c.kind, Kind::Service);
        assert_eq!(c.get("storage.path"), Some("${buffers_dir}"));
        assert_eq!(c.get("Log_Level"), Some("info"));
        assert_eq!(c.get("HTTP_Server"), Some("Off"));
    }

    #[test]
    fn variables_are_named_after_macros() {
        let vars = variables("/var/lib/opsforge/buffers", "/var/log/opsforge");
        assert_eq!(vars["buffers_dir"], "/var/lib/opsforge/buffers");
        assert_eq!(vars["logs_dir"], "/var/log/opsforge");
    }
}
