//! 통합 테스트 -- YAML 파싱부터 백엔드 파일 생성까지 전체 흐름 검증

use opsforge_confgen::{CompileOptions, OutputFiles, UnifiedConfig, generate};
use opsforge_core::error::{CompileError, OpsforgeError};
use opsforge_core::types::{Backend, ComponentRole, Subagent};
use opsforge_core::PlatformFacts;
use opsforge_fluentbit::{MAIN_CONFIG_FILE_NAME, PipelineTag};
use proptest::prelude::*;

fn compile(yaml: &str, backend: Backend) -> Result<OutputFiles, CompileError> {
    let config = UnifiedConfig::parse(yaml).expect("config should parse");
    generate(
        &config,
        backend,
        &PlatformFacts::for_tests(),
        &CompileOptions::default(),
    )
}

fn main_file(yaml: &str) -> String {
    let mut files = compile(yaml, Backend::FluentBit).expect("compile should succeed");
    files.remove(MAIN_CONFIG_FILE_NAME).expect("main file")
}

/// `key value` 형태 줄의 값 목록
fn values_of<'a>(text: &'a str, key: &str) -> Vec<&'a str> {
    text.lines()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            (parts.next() == Some(key)).then(|| parts.next()).flatten()
        })
        .collect()
}

// ─── 라우팅 시나리오 ────────────────────────────────────────────────

#[test]
fn single_file_receiver_routes_by_exact_tag() {
    let main = main_file(
        r#"
logging:
  receivers:
    r1:
      type: files
      include_paths: [/var/log/app.log]
  service:
    pipelines:
      p1:
        receivers: [r1]
"#,
    );

    assert_eq!(main.matches("[INPUT]").count(), 1);
    assert_eq!(values_of(&main, "Tag"), vec!["p1.r1"]);
    // 식별 FILTER 하나뿐
    assert_eq!(main.matches("[FILTER]").count(), 1);
    assert_eq!(main.matches("[OUTPUT]").count(), 1);
    assert_eq!(values_of(&main, "Match_Regex"), vec![r"^(p1\.r1)$"]);
}

#[test]
fn shared_output_matches_alternation_of_tags() {
    let main = main_file(
        r#"
logging:
  receivers:
    r1:
      type: files
      include_paths: [/var/log/a.log]
    r2:
      type: files
      include_paths: [/var/log/b.log]
  service:
    pipelines:
      p1:
        receivers: [r1]
      p2:
        receivers: [r2]
"#,
    );

    assert_eq!(main.matches("[OUTPUT]").count(), 1);
    assert_eq!(values_of(&main, "Match_Regex"), vec![r"^(p1\.r1|p2\.r2)$"]);
}

#[test]
fn dynamic_tag_uses_escaped_wildcard_suffix() {
    let main = main_file(
        r#"
logging:
  receivers:
    r1:
      type: fluent_forward
  service:
    pipelines:
      p1:
        receivers: [r1]
"#,
    );

    let tag = PipelineTag::for_instance("p1", "r1", true);
    assert_eq!(tag.base, "p1.r1");
    assert!(tag.routing.ends_with('*'));

    let match_regex = values_of(&main, "Match_Regex");
    assert_eq!(match_regex.len(), 1);
    assert!(match_regex[0].contains(r"\..*"));
    assert!(values_of(&main, "Match").iter().all(|m| m.ends_with(".*")));

    let re = regex::Regex::new(match_regex[0]).unwrap();
    assert!(re.is_match(&format!("{}some.forwarded.tag", tag.input)));
    // 같은 접두어를 공유하지만 다른 세그먼트인 태그는 매칭되지 않음
    let prefix = tag.input.trim_end_matches('.');
    assert!(!re.is_match(&format!("{prefix}x.other")));
    assert!(!re.is_match("p1.r1"));
}

#[test]
fn forwarded_records_get_client_tag_in_log_name() {
    let yaml = r#"
logging:
  receivers:
    fwd:
      type: fluent_forward
    app:
      type: files
      include_paths: [/var/log/app.log]
  service:
    pipelines:
      p1:
        receivers: [fwd, app]
"#;
    let files = compile(yaml, Backend::FluentBit).expect("compile should succeed");
    let main = &files[MAIN_CONFIG_FILE_NAME];
    let forward = PipelineTag::for_instance("p1", "fwd", true);

    // lua FILTER는 forward 인스턴스에만, 식별 FILTER 다음에 위치
    let calls = values_of(main, "call");
    assert_eq!(calls, vec!["add_log_name"]);
    let identity = main.find("logging.googleapis.com/logName fwd").expect("identity filter");
    let lua = main.find("add_log_name").expect("lua filter");
    assert!(identity < lua);

    let start = main[..lua].rfind("[FILTER]").expect("section start");
    let end = main[lua..].find("\n\n").map_or(main.len(), |i| lua + i);
    let lua_section = &main[start..end];
    assert_eq!(values_of(lua_section, "Match"), vec![forward.routing.as_str()]);
    let script_name = values_of(lua_section, "script")[0];
    assert!(files[script_name].contains("function add_log_name"));
}

#[test]
fn dotted_ids_mapping_to_one_tag_are_a_user_error() {
    let yaml = r#"
logging:
  receivers:
    "b.c":
      type: files
      include_paths: [/var/log/one.log]
    c:
      type: files
      include_paths: [/var/log/two.log]
  processors:
    json:
      type: parse_json
  service:
    pipelines:
      a:
        receivers: ["b.c"]
        processors: [json]
      "a.b":
        receivers: [c]
        processors: [json]
"#;
    let err = compile(yaml, Backend::FluentBit).unwrap_err();
    assert!(!err.is_internal(), "{err}");
    let msg = err.to_string();
    assert!(msg.contains(r#"pipeline "a" with receiver "b.c""#), "{msg}");
    assert!(msg.contains(r#"pipeline "a.b" with receiver "c""#), "{msg}");

    // 프로세서가 없어도 같은 태그의 INPUT 두 개를 만들지 않음
    let without_processors = yaml.replace("        processors: [json]\n", "");
    assert!(matches!(
        compile(&without_processors, Backend::FluentBit),
        Err(CompileError::TagCollision { .. })
    ));
}

// ─── 예약 접두어 ────────────────────────────────────────────────────

fn reserved_error(yaml: &str) -> CompileError {
    match UnifiedConfig::parse(yaml) {
        Err(OpsforgeError::Compile(err)) => err,
        other => panic!("expected compile error, got {other:?}"),
    }
}

#[test]
fn reserved_prefix_rejected_for_every_logging_role() {
    let cases = [
        (
            ComponentRole::Receiver,
            "logging:\n  receivers:\n    \"lib:r\":\n      type: files\n      include_paths: [/a]\n",
        ),
        (
            ComponentRole::Processor,
            "logging:\n  processors:\n    \"lib:p\":\n      type: parse_json\n",
        ),
        (
            ComponentRole::Exporter,
            "logging:\n  exporters:\n    \"lib:e\":\n      type: google_cloud_logging\n",
        ),
        (
            ComponentRole::Pipeline,
            "logging:\n  service:\n    pipelines:\n      \"lib:pl\":\n        receivers: []\n",
        ),
    ];
    for (role, yaml) in cases {
        let err = reserved_error(yaml);
        assert!(
            matches!(err, CompileError::ReservedId { subagent: Subagent::Logging, role: r, .. } if r == role),
            "{role}: {err:?}"
        );
        assert!(err.to_string().contains("prefix 'lib:' is reserved"));
    }
}

#[test]
fn reserved_prefix_rejected_for_every_metrics_role() {
    let cases = [
        (
            ComponentRole::Receiver,
            "metrics:\n  receivers:\n    \"lib:r\":\n      type: hostmetrics\n",
        ),
        (
            ComponentRole::Processor,
            "metrics:\n  processors:\n    \"lib:p\":\n      type: exclude_metrics\n      metrics_pattern: [a/b]\n",
        ),
        (
            ComponentRole::Exporter,
            "metrics:\n  exporters:\n    \"lib:e\":\n      type: google_cloud_monitoring\n",
        ),
        (
            ComponentRole::Pipeline,
            "metrics:\n  service:\n    pipelines:\n      \"lib:pl\":\n        receivers: []\n",
        ),
    ];
    for (role, yaml) in cases {
        let err = reserved_error(yaml);
        assert!(
            matches!(err, CompileError::ReservedId { subagent: Subagent::Metrics, role: r, .. } if r == role),
            "{role}: {err:?}"
        );
    }
}

// ─── 참조 무결성 ────────────────────────────────────────────────────

#[test]
fn undefined_references_name_the_missing_id() {
    let logging = r#"
logging:
  receivers:
    r1:
      type: files
      include_paths: [/a]
  service:
    pipelines:
      p1:
        receivers: [r1]
        processors: [ghost]
"#;
    let err = compile(logging, Backend::FluentBit).unwrap_err();
    assert_eq!(
        err.to_string(),
        "logging processor \"ghost\" from pipeline \"p1\" is not defined."
    );

    let metrics = r#"
metrics:
  receivers:
    hostmetrics:
      type: hostmetrics
  service:
    pipelines:
      p1:
        receivers: [hostmetrics]
        exporters: [nowhere]
"#;
    let err = compile(metrics, Backend::Otel).unwrap_err();
    assert_eq!(
        err.to_string(),
        "metrics exporter \"nowhere\" from pipeline \"p1\" is not defined."
    );
}

#[test]
fn builtin_parser_reference_is_allowed() {
    let main = main_file(
        r#"
logging:
  receivers:
    r1:
      type: files
      include_paths: [/var/log/apache.log]
  service:
    pipelines:
      p1:
        receivers: [r1]
        processors: ["lib:apache"]
"#,
    );
    assert_eq!(values_of(&main, "Parser"), vec!["lib:apache"]);
}

// ─── 단순화 ─────────────────────────────────────────────────────────

const MULTILINE: &str = r#"
logging:
  receivers:
    r1:
      type: files
      include_paths: [/var/log/app.log]
  processors:
    json:
      type: parse_json
    java:
      type: parse_multiline
      match_any:
        - type: language_exceptions
          language: java
  service:
    pipelines:
      p1:
        receivers: [r1]
        processors: [PROCESSORS]
"#;

#[test]
fn leading_multiline_merges_into_input() {
    let main = main_file(&MULTILINE.replace("PROCESSORS", "java, json"));
    assert_eq!(values_of(&main, "multiline.parser"), vec!["multiline.p1.r1"]);
}

#[test]
fn merge_stops_at_first_unmergeable_processor() {
    let main = main_file(&MULTILINE.replace("PROCESSORS", "json, java"));
    // 입력 단계가 아닌 FILTER 단계의 multiline 파서로 남음
    assert_eq!(
        values_of(&main, "multiline.parser"),
        vec!["multiline.p1.r1.1"]
    );
}

// ─── 레거시 엔진 ────────────────────────────────────────────────────

#[test]
fn collectd_host_metrics_configuration() {
    let files = compile(
        r#"
metrics:
  receivers:
    hostmetrics:
      type: hostmetrics
      collection_interval: 1m
  exporters:
    google:
      type: google_cloud_monitoring
  service:
    pipelines:
      default_pipeline:
        receivers: [hostmetrics]
        exporters: [google]
"#,
        Backend::Collectd,
    )
    .unwrap();
    let conf = &files["collectd.conf"];
    assert!(conf.starts_with("Interval 60\n"));
    assert!(conf.contains("LoadPlugin tcpconns"));
    assert!(conf.contains("PostCacheChain \"PostCache\""));
}

#[test]
fn collectd_rejects_two_receivers() {
    let err = compile(
        r#"
metrics:
  receivers:
    hostmetrics:
      type: hostmetrics
    web:
      type: nginx
"#,
        Backend::Collectd,
    )
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "at most one metrics receiver with type \"hostmetrics\" is allowed (found 2)."
    );
}

// ─── 결정성 ─────────────────────────────────────────────────────────

fn generated_config(ids: &[(String, String)]) -> String {
    let receivers: std::collections::BTreeSet<&String> = ids.iter().map(|(_, r)| r).collect();
    let mut yaml = String::from("logging:\n  receivers:\n");
    for receiver in receivers {
        yaml.push_str(&format!(
            "    {receiver}:\n      type: files\n      include_paths: [/var/log/{receiver}.log]\n"
        ));
    }
    yaml.push_str("  service:\n    pipelines:\n");
    for (pipeline, receiver) in ids {
        yaml.push_str(&format!("      {pipeline}:\n        receivers: [{receiver}]\n"));
    }
    yaml.push_str("metrics:\n  receivers:\n    hostmetrics:\n      type: hostmetrics\n");
    yaml.push_str("  service:\n    pipelines:\n      default:\n        receivers: [hostmetrics]\n");
    yaml
}

proptest! {
    #[test]
    fn compilation_is_byte_deterministic(
        ids in proptest::collection::btree_map("p[a-z0-9_]{0,8}", "r[a-z0-9_]{0,8}", 1..5)
    ) {
        // 리시버 ID가 겹치면 같은 리시버를 공유
        let ids: Vec<(String, String)> = ids.into_iter().collect();
        let yaml = generated_config(&ids);
        for backend in Backend::ALL {
            let first = compile(&yaml, backend);
            let second = compile(&yaml, backend);
            prop_assert_eq!(first, second);
        }
    }
}
