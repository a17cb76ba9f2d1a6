#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use opsforge_fluentbit::{Component, Kind, MAIN_CONFIG_FILE_NAME, ModularConfig};

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    variables: Vec<(String, String)>,
    /// 섹션 목록 (최대 16개로 제한)
    sections: Vec<FuzzSection>,
}

#[derive(Arbitrary, Debug)]
struct FuzzSection {
    kind: FuzzKind,
    config: Vec<(String, String)>,
    ordered: Vec<(String, String)>,
}

#[derive(Arbitrary, Debug)]
enum FuzzKind {
    Service,
    Input,
    Filter,
    Output,
    Parser,
    MultilineParser,
    OutputFile,
    Other(String),
}

impl FuzzKind {
    fn into_kind(self) -> Kind {
        match self {
            FuzzKind::Service => Kind::Service,
            FuzzKind::Input => Kind::Input,
            FuzzKind::Filter => Kind::Filter,
            FuzzKind::Output => Kind::Output,
            FuzzKind::Parser => Kind::Parser,
            FuzzKind::MultilineParser => Kind::MultilineParser,
            FuzzKind::OutputFile => Kind::OutputFile,
            FuzzKind::Other(name) => Kind::from_name(&name),
        }
    }
}

fuzz_target!(|input: FuzzInput| {
    let components = input
        .sections
        .into_iter()
        .take(16)
        .map(|section| {
            let mut component = Component::new(section.kind.into_kind());
            for (key, value) in section.config {
                component.set(key, value);
            }
            for (key, value) in section.ordered {
                component.push_ordered(key, value);
            }
            component
        })
        .collect();

    let config = ModularConfig::new(input.variables.into_iter().collect(), components);
    if let Ok(files) = config.generate() {
        assert!(files.contains_key(MAIN_CONFIG_FILE_NAME));
    }
});
