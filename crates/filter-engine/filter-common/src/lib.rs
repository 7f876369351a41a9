//! XDP 커널/유저스페이스 공유 타입과 판정 로직
//!
//! 이 크레이트는 `#![no_std]` 환경에서 사용 가능한 공통 타입과, 커널 XDP
//! 프로그램과 유저스페이스 모델이 똑같이 실행하는 패킷 판정 함수를 정의합니다.
//! 판정 함수는 [`PacketView`], [`BanLookup`], [`CounterStore`], [`DiscardSink`]
//! trait 위에서 동작하므로, 커널에서는 eBPF 맵으로, 호스트에서는 메모리 테이블로
//! 같은 코드를 구동할 수 있습니다.
//!
//! # 맵 타입 선택 근거
//! - **HashMap** (`BANNED_IPS`): 발신지 → 차단 플래그, 컨트롤 플레인만 기록
//! - **HashMap** (`RATE_LIMIT`): 발신지 → 패킷 수, 값 포인터에 원자적 덧셈
//! - **ProgramArray** (`STAGES`): 슬롯 → 스테이지 프로그램, tail call 대상
//! - **RingBuf** (`EVENTS`): 폐기 진단 이벤트
//! - **PerCpuArray** (`STATS`): 판정 경로별 카운터, CPU별 독립 증가
//!
//! # 판정 흐름
//! ```text
//! packet ──▶ dispatch() ──Route::Jump(1)──▶ ban_filter()  ──▶ Discard
//!               │        └─Route::Jump(2)──▶ rate_limit()  ──▶ Admit | Discard
//!               └─Route::Pass (헤더 부족) ──▶ Admit
//! ```
//! 모든 애매한 상황(헤더 부족, 빈 슬롯, 테이블 포화)은 Admit으로 귀결됩니다.

#![cfg_attr(not(test), no_std)]

// =============================================================================
// 맵 / 프로그램 이름 상수
// =============================================================================

/// 차단 목록 HashMap 맵 이름
pub const MAP_BANNED_IPS: &str = "BANNED_IPS";
/// 레이트 카운터 HashMap 맵 이름
pub const MAP_RATE_LIMIT: &str = "RATE_LIMIT";
/// 스테이지 ProgramArray 맵 이름
pub const MAP_STAGES: &str = "STAGES";
/// 폐기 이벤트 RingBuf 맵 이름
pub const MAP_EVENTS: &str = "EVENTS";
/// 판정 통계 PerCpuArray 맵 이름
pub const MAP_STATS: &str = "STATS";

/// 진입점 XDP 프로그램 이름 (인터페이스에 어태치됨)
pub const PROG_MAIN: &str = "xdp_main";
/// 차단 필터 스테이지 프로그램 이름
pub const PROG_BAN_FILTER: &str = "xdp_ban_filter";
/// 레이트 리미터 스테이지 프로그램 이름
pub const PROG_RATE_LIMITER: &str = "xdp_rate_limiter";

// =============================================================================
// 디스패치 슬롯 / 테이블 크기
// =============================================================================

/// 차단 필터 스테이지 슬롯
pub const SLOT_BAN_FILTER: u32 = 1;
/// 레이트 리미터 스테이지 슬롯
pub const SLOT_RATE_LIMITER: u32 = 2;
/// 디스패치 테이블 슬롯 수
pub const STAGE_SLOTS: u32 = 10;

/// 차단 목록 / 카운터 테이블 기본 최대 엔트리 수
pub const TABLE_MAX_ENTRIES: u32 = 1024;
/// 이벤트 RingBuf 기본 크기 (바이트)
pub const EVENTS_BYTE_SIZE: u32 = 64 * 1024;

/// 발신지별 허용 패킷 수. 이 값을 초과한 패킷부터 폐기됩니다.
pub const RATE_LIMIT_THRESHOLD: u64 = 100;

// =============================================================================
// 헤더 오프셋
// =============================================================================

/// 이더넷 헤더 길이
pub const ETH_HDR_LEN: usize = 14;
/// 옵션 없는 IPv4 헤더 길이
pub const IPV4_HDR_LEN: usize = 20;
/// 판정에 필요한 최소 캡처 길이
pub const MIN_HEADER_LEN: usize = ETH_HDR_LEN + IPV4_HDR_LEN;
/// 프레임 시작 기준 IPv4 발신지 주소 오프셋
pub const IPV4_SRC_OFFSET: usize = ETH_HDR_LEN + 12;

// =============================================================================
// Stats 맵 인덱스 (PerCpuArray<u64>)
// =============================================================================

/// 헤더 부족으로 검사 없이 통과
pub const STATS_IDX_TRUNCATED: u32 = 0;
/// 차단 필터가 폐기
pub const STATS_IDX_BAN_DROPS: u32 = 1;
/// 레이트 리미터가 폐기
pub const STATS_IDX_RATE_DROPS: u32 = 2;
/// 레이트 리미터가 통과
pub const STATS_IDX_RATE_ADMITS: u32 = 3;
/// 카운터 갱신 실패로 통과
pub const STATS_IDX_COUNTER_FAILURES: u32 = 4;
/// tail call 실패로 통과
pub const STATS_IDX_DISPATCH_FAILURES: u32 = 5;
/// PerCpuArray 최대 엔트리 수
pub const STATS_MAX_ENTRIES: u32 = 6;

// =============================================================================
// 판정 타입
// =============================================================================

/// 패킷 판정. 모든 호출은 정확히 둘 중 하나를 반환합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// 정상 처리 경로로 통과
    Admit,
    /// 폐기
    Discard,
}

impl Verdict {
    /// 폐기 여부
    #[inline(always)]
    pub const fn is_discard(self) -> bool {
        matches!(self, Verdict::Discard)
    }
}

/// 디스패처의 라우팅 결정
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// 헤더가 부족하여 검사 없이 통과
    Pass,
    /// 지정한 슬롯의 스테이지로 점프
    Jump(u32),
}

/// 레이트 리미터 결정 상세
///
/// 커널 통계 인덱스를 고르기 위해 [`Verdict`]보다 세분화되어 있습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    /// 헤더 부족
    Truncated,
    /// 임계값 이하 (증가 후 카운트)
    Within(u64),
    /// 임계값 초과 (증가 후 카운트)
    Exceeded(u64),
    /// 카운터 갱신 실패 (테이블 포화 등)
    Unavailable,
}

impl RateDecision {
    /// 최종 판정으로 변환합니다. `Exceeded`만 폐기입니다.
    #[inline(always)]
    pub const fn verdict(self) -> Verdict {
        match self {
            RateDecision::Exceeded(_) => Verdict::Discard,
            _ => Verdict::Admit,
        }
    }
}

// =============================================================================
// 저장소 추상화
// =============================================================================

/// 경계 검사가 보장된 패킷 읽기 인터페이스
pub trait PacketView {
    /// 캡처된 바이트 수
    fn captured_len(&self) -> usize;

    /// `offset`부터 4바이트를 와이어 바이트 순서 그대로 읽습니다.
    /// 범위를 벗어나면 `None`.
    fn load_u32(&self, offset: usize) -> Option<u32>;
}

impl PacketView for [u8] {
    #[inline(always)]
    fn captured_len(&self) -> usize {
        self.len()
    }

    #[inline(always)]
    fn load_u32(&self, offset: usize) -> Option<u32> {
        let end = offset.checked_add(4)?;
        match self.get(offset..end)? {
            [a, b, c, d] => Some(u32::from_ne_bytes([*a, *b, *c, *d])),
            _ => None,
        }
    }
}

/// 차단 목록 조회 (데이터 경로에서는 읽기 전용)
pub trait BanLookup {
    /// 주소 키가 차단 상태인지 확인합니다. 엔트리가 없으면 `false`.
    fn is_banned(&self, addr: u32) -> bool;
}

/// 발신지별 패킷 카운터
pub trait CounterStore {
    /// 카운트를 원자적으로 1 증가시키고 증가 후 값을 반환합니다.
    /// 엔트리가 없으면 1로 생성합니다. 갱신할 수 없으면 `None`.
    fn increment(&self, addr: u32) -> Option<u64>;
}

/// 폐기 이벤트 싱크 (best-effort, 실패는 무시됨)
pub trait DiscardSink {
    /// 폐기 이벤트를 내보냅니다.
    fn emit(&self, event: DiscardEventData);
}

/// 이벤트를 버리는 싱크
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl DiscardSink for NoopSink {
    #[inline(always)]
    fn emit(&self, _event: DiscardEventData) {}
}

// =============================================================================
// 판정 함수
// =============================================================================

/// 와이어 바이트 순서의 IPv4 옥텟을 맵 키로 변환합니다.
#[inline(always)]
pub const fn addr_key(octets: [u8; 4]) -> u32 {
    u32::from_ne_bytes(octets)
}

/// 맵 키를 IPv4 옥텟으로 되돌립니다.
#[inline(always)]
pub const fn key_octets(key: u32) -> [u8; 4] {
    key.to_ne_bytes()
}

/// 이더넷 + IPv4 헤더가 모두 캡처된 경우에만 발신지 주소 키를 반환합니다.
#[inline(always)]
pub fn source_addr<P: PacketView + ?Sized>(pkt: &P) -> Option<u32> {
    if pkt.captured_len() < MIN_HEADER_LEN {
        return None;
    }
    pkt.load_u32(IPV4_SRC_OFFSET)
}

/// 디스패처: 차단된 발신지는 슬롯 1, 나머지는 항상 슬롯 2로 라우팅합니다.
///
/// 상태를 변경하지 않습니다.
#[inline(always)]
pub fn dispatch<P, B>(pkt: &P, bans: &B) -> Route
where
    P: PacketView + ?Sized,
    B: BanLookup + ?Sized,
{
    match source_addr(pkt) {
        None => Route::Pass,
        Some(addr) if bans.is_banned(addr) => Route::Jump(SLOT_BAN_FILTER),
        Some(_) => Route::Jump(SLOT_RATE_LIMITER),
    }
}

/// 차단 필터 스테이지: 무조건 폐기합니다.
///
/// 이벤트에 발신지를 싣기 위해 주소를 읽지만 판정에는 사용하지 않습니다.
#[inline(always)]
pub fn ban_filter<P, S>(pkt: &P, sink: &S) -> Verdict
where
    P: PacketView + ?Sized,
    S: DiscardSink + ?Sized,
{
    let src_addr = source_addr(pkt).unwrap_or(0);
    sink.emit(DiscardEventData::new(src_addr, SLOT_BAN_FILTER as u8));
    Verdict::Discard
}

/// 레이트 리미터 스테이지: 카운트를 증가시키고 임계값 초과 시 폐기합니다.
///
/// 디스패처와 파싱 상태를 공유하지 않으므로 헤더 경계를 다시 검사합니다.
#[inline(always)]
pub fn rate_limit<P, C, S>(pkt: &P, counters: &C, sink: &S) -> RateDecision
where
    P: PacketView + ?Sized,
    C: CounterStore + ?Sized,
    S: DiscardSink + ?Sized,
{
    let Some(addr) = source_addr(pkt) else {
        return RateDecision::Truncated;
    };
    let Some(count) = counters.increment(addr) else {
        return RateDecision::Unavailable;
    };
    if count > RATE_LIMIT_THRESHOLD {
        sink.emit(DiscardEventData::new(addr, SLOT_RATE_LIMITER as u8));
        RateDecision::Exceeded(count)
    } else {
        RateDecision::Within(count)
    }
}

// =============================================================================
// 공유 데이터 구조
// =============================================================================

/// 폐기 진단 이벤트 데이터
///
/// `RingBuf`를 통해 커널 → 유저스페이스로 전달됩니다.
///
/// # 메모리 레이아웃 (8 바이트, 4바이트 정렬)
/// ```text
/// offset  field      size
/// 0       src_addr   4
/// 4       stage      1
/// 5       _pad       3
/// ```
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(any(feature = "user", test), derive(Debug))]
pub struct DiscardEventData {
    /// 발신지 IPv4 주소 키 (와이어 바이트 순서)
    pub src_addr: u32,
    /// 폐기를 결정한 스테이지 슬롯
    pub stage: u8,
    /// 4바이트 정렬을 위한 패딩
    pub _pad: [u8; 3],
}

/// 직렬화된 `DiscardEventData` 크기
pub const DISCARD_EVENT_LEN: usize = core::mem::size_of::<DiscardEventData>();

impl DiscardEventData {
    /// 이벤트 데이터를 생성합니다.
    #[inline(always)]
    pub const fn new(src_addr: u32, stage: u8) -> Self {
        Self {
            src_addr,
            stage,
            _pad: [0; 3],
        }
    }

    /// 제로 초기화된 이벤트 데이터를 생성합니다.
    pub const fn zeroed() -> Self {
        Self::new(0, 0)
    }

    /// RingBuf 레코드 바이트에서 이벤트를 복원합니다. 길이가 부족하면 `None`.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < DISCARD_EVENT_LEN {
            return None;
        }
        let src_addr = bytes.load_u32(0)?;
        Some(Self::new(src_addr, bytes[4]))
    }
}

// SAFETY: DiscardEventData는 #[repr(C)]이며 모든 필드가 Plain Old Data입니다.
// 패딩도 명시적으로 정의되어 있습니다.
#[cfg(feature = "user")]
unsafe impl aya::Pod for DiscardEventData {}
