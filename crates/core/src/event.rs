//! 이벤트 -- 필터가 패킷을 폐기했을 때 생성되는 진단 이벤트
//!
//! XDP 프로그램은 폐기 이벤트를 RingBuf로 전달하고, 필터 엔진은 이를
//! [`DiscardEvent`]로 변환하여 채널로 내보냅니다. 이벤트 전달은 best-effort이며
//! 전달 실패가 판정에 영향을 주지 않습니다.

use std::fmt;
use std::net::Ipv4Addr;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

// --- 모듈명 상수 ---

/// 패킷 필터 엔진 모듈명
pub const MODULE_FILTER: &str = "filter-engine";

// --- 이벤트 타입 상수 ---

/// 폐기 이벤트 타입
pub const EVENT_TYPE_DISCARD: &str = "discard";

/// 이벤트 메타데이터 -- 모든 이벤트에 공통으로 포함되는 추적 정보
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMetadata {
    /// 이벤트 발생 시각
    pub timestamp: SystemTime,
    /// 이벤트를 생성한 모듈명
    pub source_module: String,
    /// 분산 추적 ID
    pub trace_id: String,
}

impl EventMetadata {
    /// 기존 trace_id를 사용하여 새 메타데이터를 생성합니다.
    pub fn new(source_module: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self {
            timestamp: SystemTime::now(),
            source_module: source_module.into(),
            trace_id: trace_id.into(),
        }
    }

    /// 새로운 UUID v4 trace_id를 생성하여 메타데이터를 만듭니다.
    pub fn with_new_trace(source_module: impl Into<String>) -> Self {
        Self {
            timestamp: SystemTime::now(),
            source_module: source_module.into(),
            trace_id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

impl fmt::Display for EventMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] source={} trace={}",
            unix_timestamp_str(self.timestamp),
            self.source_module,
            self.trace_id,
        )
    }
}

/// 모든 이벤트가 구현해야 하는 기본 trait
///
/// `Send + Sync + 'static` 바운드로 `tokio::mpsc` 채널을 통한 전송을 보장합니다.
pub trait Event: Send + Sync + 'static {
    /// 이벤트 고유 ID (UUID v4)
    fn event_id(&self) -> &str;

    /// 이벤트 메타데이터
    fn metadata(&self) -> &EventMetadata;

    /// 이벤트 타입명 (로깅 및 라우팅에 사용)
    fn event_type(&self) -> &str;
}

/// 폐기 판정을 내린 스테이지
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscardStage {
    /// 차단 목록 필터 (디스패치 슬롯 1)
    BanFilter,
    /// 발신지별 레이트 리미터 (디스패치 슬롯 2)
    RateLimiter,
    /// 알 수 없는 스테이지 (커널이 보고한 원시 슬롯 값)
    Unknown(u8),
}

impl DiscardStage {
    /// 메트릭 레이블 및 로그에 사용하는 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BanFilter => "ban_filter",
            Self::RateLimiter => "rate_limiter",
            Self::Unknown(_) => "unknown",
        }
    }
}

impl fmt::Display for DiscardStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(slot) => write!(f, "unknown({slot})"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// 패킷 폐기 진단 이벤트
#[derive(Debug, Clone)]
pub struct DiscardEvent {
    /// 이벤트 고유 ID
    pub id: String,
    /// 이벤트 메타데이터
    pub metadata: EventMetadata,
    /// 폐기된 패킷의 발신지 주소
    pub src_addr: Ipv4Addr,
    /// 폐기를 결정한 스테이지
    pub stage: DiscardStage,
}

impl DiscardEvent {
    /// 새로운 trace를 시작하는 폐기 이벤트를 생성합니다.
    pub fn new(src_addr: Ipv4Addr, stage: DiscardStage) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            metadata: EventMetadata::with_new_trace(MODULE_FILTER),
            src_addr,
            stage,
        }
    }
}

impl Event for DiscardEvent {
    fn event_id(&self) -> &str {
        &self.id
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }

    fn event_type(&self) -> &str {
        EVENT_TYPE_DISCARD
    }
}

impl fmt::Display for DiscardEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DiscardEvent[{}] src={} stage={}",
            &self.id[..8.min(self.id.len())],
            self.src_addr,
            self.stage,
        )
    }
}

fn unix_timestamp_str(time: SystemTime) -> String {
    match time.duration_since(SystemTime::UNIX_EPOCH) {
        Ok(duration) => {
            let secs = duration.as_secs();
            format!("{secs}")
        }
        Err(_) => "unknown".to_owned(),
    }
}
