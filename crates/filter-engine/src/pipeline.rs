//! 호스트 파이프라인 모델
//!
//! [`FilterPipeline`]은 커널 XDP 프로그램과 같은 판정 함수를 같은 순서로 실행하는
//! 유저스페이스 모델입니다. 테이블은 `Arc`로 주입받으므로 컨트롤 플레인과
//! 데이터 경로가 같은 상태를 공유합니다.
//!
//! ```text
//! frame ──▶ dispatch() ──Pass──────────────▶ Admit
//!               └──Jump(slot)──▶ DispatchTable ──▶ Stage::run()
//!                                     └─ 빈 슬롯 ──▶ Admit
//! ```

use std::sync::Arc;

use flowgate_core::error::FilterError;
use flowgate_filter_common::{NoopSink, Route, Verdict, dispatch};

use crate::dispatch::{BanFilterStage, DispatchTable, RateLimiterStage, SharedSink, Stage};
use crate::tables::{BanTable, RateCounters};

/// 디스패처 + 디스패치 테이블 + 공유 테이블
#[derive(Debug)]
pub struct FilterPipeline {
    bans: Arc<BanTable>,
    counters: Arc<RateCounters>,
    stages: DispatchTable,
}

impl FilterPipeline {
    /// 디스패치 테이블이 비어 있는 파이프라인을 생성합니다.
    ///
    /// 스테이지를 설치하기 전까지 모든 패킷은 통과합니다.
    pub fn new(bans: Arc<BanTable>, counters: Arc<RateCounters>) -> Self {
        Self {
            bans,
            counters,
            stages: DispatchTable::new(),
        }
    }

    /// 슬롯 1에 차단 필터, 슬롯 2에 레이트 리미터를 설치한 파이프라인을 생성합니다.
    pub fn with_default_stages(
        bans: Arc<BanTable>,
        counters: Arc<RateCounters>,
        sink: SharedSink,
    ) -> Self {
        let ban: Arc<dyn Stage> = Arc::new(BanFilterStage::new(Arc::clone(&sink)));
        let rate: Arc<dyn Stage> = Arc::new(RateLimiterStage::new(Arc::clone(&counters), sink));
        Self {
            bans,
            counters,
            stages: DispatchTable::with_default_stages(ban, rate),
        }
    }

    /// 이벤트를 버리는 기본 스테이지 파이프라인
    pub fn standard(bans: Arc<BanTable>, counters: Arc<RateCounters>) -> Self {
        Self::with_default_stages(bans, counters, Arc::new(NoopSink))
    }

    /// 슬롯에 스테이지를 설치합니다.
    pub fn set_stage(&mut self, slot: u32, stage: Arc<dyn Stage>) -> Result<(), FilterError> {
        self.stages.set_stage(slot, stage).map(|_| ())
    }

    /// 슬롯을 비웁니다.
    pub fn clear_stage(&mut self, slot: u32) -> Result<(), FilterError> {
        self.stages.clear_stage(slot).map(|_| ())
    }

    /// 프레임 하나를 판정합니다. 항상 Admit 또는 Discard 중 하나를 반환합니다.
    pub fn process(&self, frame: &[u8]) -> Verdict {
        match dispatch(frame, self.bans.as_ref()) {
            Route::Pass => Verdict::Admit,
            Route::Jump(slot) => self.stages.jump(slot, frame).unwrap_or(Verdict::Admit),
        }
    }

    pub fn bans(&self) -> &Arc<BanTable> {
        &self.bans
    }

    pub fn counters(&self) -> &Arc<RateCounters> {
        &self.counters
    }

    pub fn stages(&self) -> &DispatchTable {
        &self.stages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    use flowgate_filter_common::{
        IPV4_SRC_OFFSET, MIN_HEADER_LEN, SLOT_BAN_FILTER, SLOT_RATE_LIMITER,
    };

    fn frame(src: Ipv4Addr) -> Vec<u8> {
        let mut buf = vec![0u8; 64];
        buf[12] = 0x08;
        buf[14] = 0x45;
        buf[IPV4_SRC_OFFSET..IPV4_SRC_OFFSET + 4].copy_from_slice(&src.octets());
        buf
    }

    fn tables() -> (Arc<BanTable>, Arc<RateCounters>) {
        (Arc::new(BanTable::new(16)), Arc::new(RateCounters::new(16)))
    }

    #[test]
    fn empty_dispatch_table_fails_open() {
        let (bans, counters) = tables();
        let src = Ipv4Addr::new(192, 168, 1, 100);
        bans.set(src, true).unwrap();

        let pipeline = FilterPipeline::new(bans, Arc::clone(&counters));
        assert_eq!(pipeline.process(&frame(src)), Verdict::Admit);
        assert_eq!(pipeline.process(&frame(Ipv4Addr::new(10, 0, 0, 1))), Verdict::Admit);
        assert!(counters.is_empty());
    }

    #[test]
    fn cleared_ban_slot_fails_open_for_banned_source() {
        let (bans, counters) = tables();
        let src = Ipv4Addr::new(192, 168, 1, 100);
        bans.set(src, true).unwrap();

        let mut pipeline = FilterPipeline::standard(bans, counters);
        assert_eq!(pipeline.process(&frame(src)), Verdict::Discard);

        pipeline.clear_stage(SLOT_BAN_FILTER).unwrap();
        assert_eq!(pipeline.process(&frame(src)), Verdict::Admit);
    }

    #[test]
    fn truncated_frame_is_admitted_without_counting() {
        let (bans, counters) = tables();
        let pipeline = FilterPipeline::standard(bans, Arc::clone(&counters));
        let full = frame(Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(pipeline.process(&full[..MIN_HEADER_LEN - 1]), Verdict::Admit);
        assert!(counters.is_empty());
    }

    #[test]
    fn ban_takes_effect_for_later_packets() {
        let (bans, counters) = tables();
        let pipeline = FilterPipeline::standard(Arc::clone(&bans), counters);
        let src = Ipv4Addr::new(172, 16, 0, 5);

        assert_eq!(pipeline.process(&frame(src)), Verdict::Admit);
        bans.set(src, true).unwrap();
        assert_eq!(pipeline.process(&frame(src)), Verdict::Discard);
        bans.clear(src);
        assert_eq!(pipeline.process(&frame(src)), Verdict::Admit);
    }

    #[test]
    fn default_stages_occupy_slots_one_and_two() {
        let (bans, counters) = tables();
        let pipeline = FilterPipeline::standard(bans, counters);
        assert_eq!(pipeline.stages().populated(), 2);
        assert_eq!(
            pipeline.stages().stage(SLOT_BAN_FILTER).map(|s| s.name()),
            Some("ban_filter")
        );
        assert_eq!(
            pipeline.stages().stage(SLOT_RATE_LIMITER).map(|s| s.name()),
            Some("rate_limiter")
        );
    }
}
