#![no_main]

use libfuzzer_sys::fuzz_target;
use opsforge_confgen::{CompileOptions, UnifiedConfig, generate};
use opsforge_core::{Backend, PlatformFacts};

fuzz_target!(|data: &[u8]| {
    // YAML 파서는 &str을 받으므로 UTF-8 변환 필요
    let Ok(yaml) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(config) = UnifiedConfig::parse(yaml) else {
        return;
    };

    let platform = PlatformFacts::for_tests();
    let options = CompileOptions {
        self_logs: true,
        ..CompileOptions::default()
    };
    for backend in Backend::ALL {
        let first = generate(&config, backend, &platform, &options);
        // 같은 입력은 항상 같은 출력
        assert_eq!(first, generate(&config, backend, &platform, &options));
    }
});
