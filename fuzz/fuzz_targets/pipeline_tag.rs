#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use opsforge_fluentbit::{PipelineTag, match_alternation};
use regex::Regex;

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    pipeline_id: String,
    receiver_id: String,
    dynamic: bool,
    suffix: String,
}

fuzz_target!(|input: FuzzInput| {
    let tag = PipelineTag::for_instance(&input.pipeline_id, &input.receiver_id, input.dynamic);
    let Ok(re) = Regex::new(&match_alternation([&tag])) else {
        panic!("alternation must always compile: {tag:?}");
    };

    if tag.dynamic {
        // 입력 접두어 뒤에 어떤 접미사가 붙어도 매칭
        if !input.suffix.contains('\n') {
            assert!(re.is_match(&format!("{}{}", tag.input, input.suffix)));
        }
    } else {
        assert!(re.is_match(&tag.base));
    }
});
