//! 폐기 이벤트 변환 및 전달
//!
//! 커널 RingBuf 레코드([`DiscardEventData`])를 core의 [`DiscardEvent`]로 변환하고,
//! 호스트 파이프라인 모델에서 쓰는 채널 싱크([`ChannelSink`])를 제공합니다.
//! 전달은 best-effort이며 실패는 메트릭으로만 기록됩니다.

use std::net::Ipv4Addr;

use tokio::sync::mpsc;

use flowgate_core::event::{DiscardEvent, DiscardStage};
use flowgate_core::metrics as m;
use flowgate_filter_common::{
    DiscardEventData, DiscardSink, SLOT_BAN_FILTER, SLOT_RATE_LIMITER, key_octets,
};

/// 커널이 보고한 슬롯 번호를 스테이지로 변환합니다.
pub fn stage_from_slot(slot: u8) -> DiscardStage {
    match u32::from(slot) {
        SLOT_BAN_FILTER => DiscardStage::BanFilter,
        SLOT_RATE_LIMITER => DiscardStage::RateLimiter,
        _ => DiscardStage::Unknown(slot),
    }
}

/// 원시 이벤트 데이터를 [`DiscardEvent`]로 변환합니다.
pub fn to_discard_event(raw: &DiscardEventData) -> DiscardEvent {
    DiscardEvent::new(
        Ipv4Addr::from(key_octets(raw.src_addr)),
        stage_from_slot(raw.stage),
    )
}

/// RingBuf 레코드 바이트를 파싱합니다. 길이가 부족하면 `None`.
pub fn parse_record(bytes: &[u8]) -> Option<DiscardEvent> {
    DiscardEventData::from_bytes(bytes).map(|raw| to_discard_event(&raw))
}

/// 이벤트를 bounded 채널로 보내는 싱크
///
/// `try_send`만 사용하므로 호출 측을 절대 블록하지 않습니다.
/// 채널이 가득 찼거나 닫혔으면 이벤트를 버립니다.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<DiscardEvent>,
}

impl ChannelSink {
    /// 송신자로 싱크를 생성합니다.
    pub fn new(tx: mpsc::Sender<DiscardEvent>) -> Self {
        Self { tx }
    }

    /// 용량 `capacity`의 채널을 만들고 싱크와 수신자를 반환합니다.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<DiscardEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }

    /// 변환된 이벤트를 전달합니다. 실패하면 `false`.
    pub fn send(&self, event: DiscardEvent) -> bool {
        if self.tx.try_send(event).is_err() {
            metrics::counter!(m::FILTER_EVENTS_DROPPED_TOTAL).increment(1);
            return false;
        }
        true
    }
}

impl DiscardSink for ChannelSink {
    fn emit(&self, event: DiscardEventData) {
        self.send(to_discard_event(&event));
    }
}
