#![no_main]

use std::sync::Arc;

use flowgate_filter_engine::flowgate_filter_common::{MIN_HEADER_LEN, Verdict, source_addr};
use flowgate_filter_engine::{BanTable, FilterPipeline, RateCounters};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let counters = Arc::new(RateCounters::new(16));
    let pipeline = FilterPipeline::standard(Arc::new(BanTable::new(16)), Arc::clone(&counters));

    // 패닉 없이 판정을 반환해야 하고, 짧은 프레임은 검사 없이 통과
    let verdict = pipeline.process(data);
    if data.len() < MIN_HEADER_LEN {
        assert_eq!(verdict, Verdict::Admit);
        assert!(source_addr(data).is_none());
        assert!(counters.is_empty());
    } else {
        assert_eq!(verdict, Verdict::Admit, "first packet of a source is within limit");
        assert_eq!(counters.len(), 1);
    }
});
