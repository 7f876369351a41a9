#![no_main]

use flowgate_core::config::FlowgateConfig;
use flowgate_filter_engine::EngineConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    // 파싱/검증이 패닉 없이 끝나야 하고, 검증을 통과한 차단 목록은 엔진 설정으로 변환 가능
    if let Ok(config) = FlowgateConfig::parse(text) {
        if config.validate().is_ok() {
            assert!(EngineConfig::from_core(&config.filter).is_ok());
        }
    }
});
