//! 속성 기반 테스트 -- 임의 입력에 대한 판정 불변식 검증

use std::net::Ipv4Addr;
use std::sync::Arc;

use proptest::prelude::*;

use flowgate_filter_engine::flowgate_filter_common::{
    IPV4_SRC_OFFSET, MIN_HEADER_LEN, RATE_LIMIT_THRESHOLD, Verdict,
};
use flowgate_filter_engine::{BanTable, FilterPipeline, RateCounters};

fn pipeline(capacity: usize) -> (FilterPipeline, Arc<BanTable>, Arc<RateCounters>) {
    let bans = Arc::new(BanTable::new(capacity));
    let counters = Arc::new(RateCounters::new(capacity));
    let pipeline = FilterPipeline::standard(Arc::clone(&bans), Arc::clone(&counters));
    (pipeline, bans, counters)
}

fn frame_with(src: [u8; 4], mut payload: Vec<u8>) -> Vec<u8> {
    if payload.len() < MIN_HEADER_LEN {
        payload.resize(MIN_HEADER_LEN, 0);
    }
    payload[IPV4_SRC_OFFSET..IPV4_SRC_OFFSET + 4].copy_from_slice(&src);
    payload
}

proptest! {
    /// 차단된 발신지는 이전 카운트와 무관하게 항상 폐기되고 카운트되지 않음
    #[test]
    fn banned_source_always_discarded(
        src in any::<[u8; 4]>(),
        prior in 0u64..250,
        payload in prop::collection::vec(any::<u8>(), 0..128),
    ) {
        let (pipeline, bans, counters) = pipeline(64);
        let packet = frame_with(src, payload);

        for _ in 0..prior {
            pipeline.process(&packet);
        }
        let before = counters.count(Ipv4Addr::from(src));

        bans.set(Ipv4Addr::from(src), true).unwrap();
        prop_assert_eq!(pipeline.process(&packet), Verdict::Discard);
        prop_assert_eq!(counters.count(Ipv4Addr::from(src)), before);
    }

    /// 헤더보다 짧은 버퍼는 내용과 무관하게 항상 통과하고 상태를 바꾸지 않음
    #[test]
    fn truncated_input_always_admitted(
        bytes in prop::collection::vec(any::<u8>(), 0..MIN_HEADER_LEN),
        ban_everything in any::<bool>(),
    ) {
        let (pipeline, bans, counters) = pipeline(64);
        if ban_everything && bytes.len() >= IPV4_SRC_OFFSET + 4 {
            let src: [u8; 4] = bytes[IPV4_SRC_OFFSET..IPV4_SRC_OFFSET + 4].try_into().unwrap();
            bans.set(Ipv4Addr::from(src), true).unwrap();
        }

        for _ in 0..(RATE_LIMIT_THRESHOLD + 5) {
            prop_assert_eq!(pipeline.process(&bytes), Verdict::Admit);
        }
        prop_assert!(counters.is_empty());
    }

    /// 한 발신지의 트래픽은 다른 발신지의 판정에 영향을 주지 않음
    #[test]
    fn sources_are_independent(
        a in any::<[u8; 4]>(),
        b in any::<[u8; 4]>(),
        a_packets in 0u64..300,
    ) {
        prop_assume!(a != b);
        let (pipeline, _bans, counters) = pipeline(64);
        let frame_a = frame_with(a, Vec::new());
        let frame_b = frame_with(b, Vec::new());

        for _ in 0..a_packets {
            pipeline.process(&frame_a);
        }

        for n in 1..=RATE_LIMIT_THRESHOLD {
            prop_assert_eq!(pipeline.process(&frame_b), Verdict::Admit, "packet {}", n);
        }
        prop_assert_eq!(pipeline.process(&frame_b), Verdict::Discard);
        prop_assert_eq!(counters.count(Ipv4Addr::from(a)), (a_packets > 0).then_some(a_packets));
    }

    /// n번째 패킷은 n이 임계값 이하일 때만 통과
    #[test]
    fn verdict_follows_post_increment_count(src in any::<[u8; 4]>(), total in 1u64..250) {
        let (pipeline, _bans, _counters) = pipeline(64);
        let packet = frame_with(src, Vec::new());

        for n in 1..=total {
            let expected = if n > RATE_LIMIT_THRESHOLD { Verdict::Discard } else { Verdict::Admit };
            prop_assert_eq!(pipeline.process(&packet), expected);
        }
    }

    /// 임의 바이트 입력에서도 패닉 없이 판정을 반환
    #[test]
    fn arbitrary_bytes_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let (pipeline, _bans, _counters) = pipeline(4);
        let verdict = pipeline.process(&bytes);
        prop_assert!(verdict == Verdict::Admit || verdict == Verdict::Discard);
    }
}
