#![no_main]

use std::collections::{HashMap, HashSet};
use std::net::Ipv4Addr;
use std::sync::Arc;

use arbitrary::Arbitrary;
use flowgate_filter_engine::flowgate_filter_common::{
    IPV4_SRC_OFFSET, MIN_HEADER_LEN, RATE_LIMIT_THRESHOLD, Verdict,
};
use flowgate_filter_engine::{BanTable, FilterPipeline, RateCounters};
use libfuzzer_sys::fuzz_target;

/// 발신지 풀 크기. 테이블 용량보다 작게 유지해 fail-open 경로를 배제
const SOURCES: u8 = 8;
const CAPACITY: usize = 16;

/// 퍼저용 제어/데이터 평면 연산
#[derive(Arbitrary, Debug)]
enum Op {
    /// 발신지 인덱스, 프레임 길이, 반복 횟수
    Packet { src: u8, len: u8, repeat: u8 },
    Ban { src: u8, banned: bool },
    ResetCounters,
}

fn addr(src: u8) -> Ipv4Addr {
    Ipv4Addr::new(10, 0, 0, src % SOURCES)
}

fn frame(src: Ipv4Addr, len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len.max(IPV4_SRC_OFFSET + 4)];
    buf[IPV4_SRC_OFFSET..IPV4_SRC_OFFSET + 4].copy_from_slice(&src.octets());
    buf.truncate(len);
    buf
}

fuzz_target!(|ops: Vec<Op>| {
    let bans = Arc::new(BanTable::new(CAPACITY));
    let counters = Arc::new(RateCounters::new(CAPACITY));
    let pipeline = FilterPipeline::standard(Arc::clone(&bans), Arc::clone(&counters));

    // 기대값 모델
    let mut banned: HashSet<Ipv4Addr> = HashSet::new();
    let mut counts: HashMap<Ipv4Addr, u64> = HashMap::new();

    for op in ops.iter().take(256) {
        match *op {
            Op::Packet { src, len, repeat } => {
                let src = addr(src);
                let len = len as usize;
                let packet = frame(src, len);

                for _ in 0..=repeat {
                    let expected = if len < MIN_HEADER_LEN {
                        Verdict::Admit
                    } else if banned.contains(&src) {
                        Verdict::Discard
                    } else {
                        let count = counts.entry(src).or_insert(0);
                        *count += 1;
                        if *count > RATE_LIMIT_THRESHOLD {
                            Verdict::Discard
                        } else {
                            Verdict::Admit
                        }
                    };
                    assert_eq!(pipeline.process(&packet), expected);
                }
            }
            Op::Ban { src, banned: flag } => {
                let src = addr(src);
                bans.set(src, flag).expect("ban table sized for the source pool");
                if flag {
                    banned.insert(src);
                } else {
                    banned.remove(&src);
                }
            }
            Op::ResetCounters => {
                counters.reset();
                counts.clear();
            }
        }
    }

    for (src, count) in &counts {
        assert_eq!(counters.count(*src), Some(*count));
    }
});
