//! 통합 테스트 -- 섹션 빌더부터 파일 렌더링까지의 전체 흐름 검증

use opsforge_fluentbit::filters::{identity_filter, parse_chain};
use opsforge_fluentbit::inputs::{TailInput, forward_input};
use opsforge_fluentbit::outputs::StackdriverOutput;
use opsforge_fluentbit::service::variables;
use opsforge_fluentbit::{
    Kind, MAIN_CONFIG_FILE_NAME, ModularConfig, PARSER_CONFIG_FILE_NAME, ParserDefinition,
    ParserRegistry, PipelineTag, match_alternation,
};

fn single_tail_pipeline() -> Vec<opsforge_fluentbit::Component> {
    let tag = PipelineTag::for_instance("p1", "r1", false);
    let tail = TailInput {
        include_paths: vec!["/var/log/a.log".to_owned()],
        ..Default::default()
    };
    let mut components: Vec<_> = tail.component(&tag).into_iter().collect();
    components.push(identity_filter(&tag.routing, "p1", "r1", "test-host"));
    components.push(StackdriverOutput::new(match_alternation([&tag]), "ua", 8).component());
    components
}

/// 단일 tail 파이프라인의 주 파일 전체 텍스트
#[test]
fn single_tail_pipeline_renders_golden_main_file() {
    let files = ModularConfig::new(variables("/b", "/l"), single_tail_pipeline())
        .generate()
        .expect("should render");

    let expected = "@SET buffers_dir=/b\n@SET logs_dir=/l\n\n\
[INPUT]\n    Buffer_Chunk_Size 512k\n    Buffer_Max_Size   2M\n    DB                ${buffers_dir}/p1_r1\n    DB.locking        true\n    Key               message\n    Mem_Buf_Limit     10M\n    Name              tail\n    Path              /var/log/a.log\n    Read_from_Head    True\n    Rotate_Wait       30\n    Skip_Long_Lines   On\n    Tag               p1.r1\n    storage.type      filesystem\n\n\
[FILTER]\n    Match p1.r1\n    Name  modify\n    Add   logging.googleapis.com/logName r1\n    Add   logging.googleapis.com/labels.pipeline p1\n    Add   agent.googleapis.com/hostname test-host\n\n\
[OUTPUT]\n    Match_Regex                   ^(p1\\.r1)$\n    Name                          stackdriver\n    Retry_Limit                   3\n    http_request_key              logging.googleapis.com/httpRequest\n    net.connect_timeout_log_error False\n    resource                      gce_instance\n    stackdriver_agent             ua\n    tls                           On\n    tls.verify                    Off\n    workers                       8\n";
    assert_eq!(files[MAIN_CONFIG_FILE_NAME], expected);
    assert_eq!(files[PARSER_CONFIG_FILE_NAME], "");
}

/// 동일 입력 두 번 렌더링 시 바이트 단위로 같은 결과
#[test]
fn rendering_is_deterministic() {
    let render = || {
        let mut components = single_tail_pipeline();
        let tag = PipelineTag::for_instance("p1", "r1", false);
        components.extend(parse_chain(&tag.routing, None, &["p1.r1.0".to_owned()], false));
        components.push(ParserDefinition::json("p1.r1.0").component());
        let components = ParserRegistry::deduplicate(components).expect("should dedupe");
        ModularConfig::new(variables("/b", "/l"), components)
            .generate()
            .expect("should render")
    };
    assert_eq!(render(), render());
}

/// 사용자 파서는 내장 파서 뒤에 렌더링되고 lua 스크립트는 별도 파일로 분리
#[test]
fn parsers_and_scripts_are_split_into_their_files() {
    let tag = PipelineTag::for_instance("p1", "r1", false);
    let mut components = parse_chain(&tag.routing, None, &["p1.r1.0".to_owned()], false);
    components.push(ParserDefinition::json("p1.r1.0").component());
    let components = ParserRegistry::deduplicate(components).expect("should dedupe");
    let files = ModularConfig::new(variables("/b", "/l"), components)
        .generate()
        .expect("should render");

    let parsers = &files[PARSER_CONFIG_FILE_NAME];
    let builtin = parsers.find("lib:syslog-rfc3164").expect("builtin present");
    let user = parsers.find("p1.r1.0").expect("user parser present");
    assert!(builtin < user);

    let scripts: Vec<&String> = files.keys().filter(|k| k.ends_with(".lua")).collect();
    assert_eq!(scripts.len(), 2);
    for script in scripts {
        assert!(files[MAIN_CONFIG_FILE_NAME].contains(script.as_str()));
    }
}

/// 동적 태그 파이프라인의 OUTPUT 정규식은 이스케이프된 접두어 + `\..*`
#[test]
fn dynamic_tag_pipeline_matches_only_its_family() {
    let tag = PipelineTag::for_instance("p1", "r1", true);
    let components = vec![
        forward_input(&tag, "127.0.0.1", 24224),
        identity_filter(&tag.routing, "p1", "r1", "test-host"),
        StackdriverOutput::new(match_alternation([&tag]), "ua", 1).component(),
    ];
    let files = ModularConfig::new(variables("/b", "/l"), components)
        .generate()
        .expect("should render");
    let main = &files[MAIN_CONFIG_FILE_NAME];

    assert!(main.contains(&format!("Match {}", tag.routing)));
    assert!(tag.routing.ends_with(".*"));
    assert!(main.contains(r"\..*)$"));
    assert!(!main.contains(r"^(p1\.r1)$"));
}

#[test]
fn all_builtin_kinds_are_recognized() {
    let components = vec![opsforge_fluentbit::Component::new(Kind::Other(
        "INPUTS".to_owned(),
    ))];
    let err = ModularConfig::new(variables("/b", "/l"), components)
        .generate()
        .unwrap_err();
    assert!(err.to_string().contains("INPUTS"));
}
