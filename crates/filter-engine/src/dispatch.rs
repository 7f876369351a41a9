//! 디스패치 테이블 -- 슬롯 번호로 색인되는 스테이지 핸들 배열
//!
//! 커널의 `STAGES` ProgramArray에 대응합니다. 컨트롤 플레인이 한 번 채우고,
//! 이후 데이터 경로는 읽기만 합니다. 비어 있는 슬롯으로의 점프는 실패하며
//! 호출 측은 이를 Admit으로 처리합니다.

use std::fmt;
use std::sync::Arc;

use flowgate_core::error::FilterError;
use flowgate_filter_common::{
    DiscardSink, SLOT_BAN_FILTER, SLOT_RATE_LIMITER, STAGE_SLOTS, Verdict, ban_filter,
    rate_limit,
};

use crate::tables::RateCounters;

/// 디스패치 가능한 필터 스테이지
///
/// 스테이지는 종단이며 다른 스테이지를 호출하지 않습니다.
pub trait Stage: Send + Sync {
    /// 로그용 스테이지 이름
    fn name(&self) -> &'static str;

    /// 프레임을 판정합니다.
    fn run(&self, frame: &[u8]) -> Verdict;
}

impl fmt::Debug for dyn Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Stage").field(&self.name()).finish()
    }
}

/// 공유 가능한 폐기 이벤트 싱크
pub type SharedSink = Arc<dyn DiscardSink + Send + Sync>;

/// 차단 필터 스테이지 (무조건 폐기)
pub struct BanFilterStage {
    sink: SharedSink,
}

impl BanFilterStage {
    pub fn new(sink: SharedSink) -> Self {
        Self { sink }
    }
}

impl Stage for BanFilterStage {
    fn name(&self) -> &'static str {
        "ban_filter"
    }

    fn run(&self, frame: &[u8]) -> Verdict {
        ban_filter(frame, self.sink.as_ref())
    }
}

/// 레이트 리미터 스테이지
pub struct RateLimiterStage {
    counters: Arc<RateCounters>,
    sink: SharedSink,
}

impl RateLimiterStage {
    pub fn new(counters: Arc<RateCounters>, sink: SharedSink) -> Self {
        Self { counters, sink }
    }
}

impl Stage for RateLimiterStage {
    fn name(&self) -> &'static str {
        "rate_limiter"
    }

    fn run(&self, frame: &[u8]) -> Verdict {
        rate_limit(frame, self.counters.as_ref(), self.sink.as_ref()).verdict()
    }
}

/// 고정 크기 디스패치 테이블
pub struct DispatchTable {
    slots: [Option<Arc<dyn Stage>>; STAGE_SLOTS as usize],
}

impl DispatchTable {
    /// 모든 슬롯이 빈 테이블을 생성합니다.
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
        }
    }

    /// 슬롯 1에 차단 필터, 슬롯 2에 레이트 리미터가 설치된 테이블을 생성합니다.
    pub fn with_default_stages(ban_filter: Arc<dyn Stage>, rate_limiter: Arc<dyn Stage>) -> Self {
        let mut slots: [Option<Arc<dyn Stage>>; STAGE_SLOTS as usize] =
            std::array::from_fn(|_| None);
        slots[SLOT_BAN_FILTER as usize] = Some(ban_filter);
        slots[SLOT_RATE_LIMITER as usize] = Some(rate_limiter);
        Self { slots }
    }

    /// 슬롯에 스테이지를 설치하고 이전 스테이지를 반환합니다.
    ///
    /// # 에러
    /// - `FilterError::InvalidSlot`: 슬롯이 범위를 벗어난 경우
    pub fn set_stage(
        &mut self,
        slot: u32,
        stage: Arc<dyn Stage>,
    ) -> Result<Option<Arc<dyn Stage>>, FilterError> {
        let entry = self.slot_mut(slot)?;
        Ok(entry.replace(stage))
    }

    /// 슬롯을 비우고 이전 스테이지를 반환합니다.
    pub fn clear_stage(&mut self, slot: u32) -> Result<Option<Arc<dyn Stage>>, FilterError> {
        let entry = self.slot_mut(slot)?;
        Ok(entry.take())
    }

    /// 슬롯의 스테이지. 범위 밖이거나 비어 있으면 `None`.
    pub fn stage(&self, slot: u32) -> Option<&Arc<dyn Stage>> {
        self.slots.get(slot as usize)?.as_ref()
    }

    /// 슬롯으로 점프하여 스테이지를 실행합니다. 점프 실패 시 `None`.
    pub fn jump(&self, slot: u32, frame: &[u8]) -> Option<Verdict> {
        self.stage(slot).map(|stage| stage.run(frame))
    }

    /// 채워진 슬롯 수
    pub fn populated(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    fn slot_mut(&mut self, slot: u32) -> Result<&mut Option<Arc<dyn Stage>>, FilterError> {
        self.slots
            .get_mut(slot as usize)
            .ok_or(FilterError::InvalidSlot {
                slot,
                max: STAGE_SLOTS - 1,
            })
    }
}

impl Default for DispatchTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DispatchTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_map();
        for (slot, stage) in self.slots.iter().enumerate() {
            if let Some(stage) = stage {
                list.entry(&slot, &stage.name());
            }
        }
        list.finish()
    }
}
