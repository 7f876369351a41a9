#![no_std]
#![no_main]

use core::sync::atomic::{AtomicU64, Ordering};

use aya_ebpf::{
    bindings::{BPF_NOEXIST, xdp_action},
    macros::{map, xdp},
    maps::{HashMap, PerCpuArray, ProgramArray, RingBuf},
    programs::XdpContext,
};
use flowgate_filter_common::{
    BanLookup, CounterStore, DiscardEventData, DiscardSink, EVENTS_BYTE_SIZE, PacketView,
    RateDecision, Route, STAGE_SLOTS, STATS_IDX_BAN_DROPS, STATS_IDX_COUNTER_FAILURES,
    STATS_IDX_DISPATCH_FAILURES, STATS_IDX_RATE_ADMITS, STATS_IDX_RATE_DROPS,
    STATS_IDX_TRUNCATED, STATS_MAX_ENTRIES, TABLE_MAX_ENTRIES, Verdict, ban_filter, dispatch,
    rate_limit,
};
use network_types::{eth::EthHdr, ip::Ipv4Hdr};

// 공유 크레이트의 오프셋이 실제 헤더 구조체 크기와 일치해야 함
const _: () = assert!(EthHdr::LEN + Ipv4Hdr::LEN == flowgate_filter_common::MIN_HEADER_LEN);

// =============================================================================
// 맵
// =============================================================================

/// 차단 목록: 발신지 키 → 플래그 (유저스페이스만 기록)
#[map]
static BANNED_IPS: HashMap<u32, u8> = HashMap::with_max_entries(TABLE_MAX_ENTRIES, 0);

/// 발신지별 패킷 카운터
#[map]
static RATE_LIMIT: HashMap<u32, u64> = HashMap::with_max_entries(TABLE_MAX_ENTRIES, 0);

/// 디스패치 테이블 (슬롯 → 스테이지 프로그램)
#[map]
static STAGES: ProgramArray = ProgramArray::with_max_entries(STAGE_SLOTS, 0);

/// 폐기 진단 이벤트
#[map]
static EVENTS: RingBuf = RingBuf::with_byte_size(EVENTS_BYTE_SIZE, 0);

/// 판정 경로별 카운터
#[map]
static STATS: PerCpuArray<u64> = PerCpuArray::with_max_entries(STATS_MAX_ENTRIES, 0);

// =============================================================================
// 진입점
// =============================================================================

/// 디스패처: 인터페이스에 어태치되어 모든 수신 프레임을 라우팅합니다.
#[xdp]
pub fn xdp_main(ctx: XdpContext) -> u32 {
    match dispatch(&XdpPacket(&ctx), &BanTable) {
        Route::Pass => {
            bump(STATS_IDX_TRUNCATED);
        }
        Route::Jump(slot) => {
            // 성공하면 반환하지 않음
            let _ = unsafe { STAGES.tail_call(&ctx, slot) };
            bump(STATS_IDX_DISPATCH_FAILURES);
        }
    }
    xdp_action::XDP_PASS
}

/// 차단 필터 스테이지 (슬롯 1)
#[xdp]
pub fn xdp_ban_filter(ctx: XdpContext) -> u32 {
    let verdict = ban_filter(&XdpPacket(&ctx), &EventRing);
    bump(STATS_IDX_BAN_DROPS);
    action(verdict)
}

/// 레이트 리미터 스테이지 (슬롯 2)
#[xdp]
pub fn xdp_rate_limiter(ctx: XdpContext) -> u32 {
    let decision = rate_limit(&XdpPacket(&ctx), &CounterTable, &EventRing);
    bump(match decision {
        RateDecision::Truncated => STATS_IDX_TRUNCATED,
        RateDecision::Within(_) => STATS_IDX_RATE_ADMITS,
        RateDecision::Exceeded(_) => STATS_IDX_RATE_DROPS,
        RateDecision::Unavailable => STATS_IDX_COUNTER_FAILURES,
    });
    action(decision.verdict())
}

#[inline(always)]
fn action(verdict: Verdict) -> u32 {
    match verdict {
        Verdict::Admit => xdp_action::XDP_PASS,
        Verdict::Discard => xdp_action::XDP_DROP,
    }
}

#[inline(always)]
fn bump(index: u32) {
    if let Some(counter) = STATS.get_ptr_mut(index) {
        unsafe { *counter += 1 };
    }
}

// =============================================================================
// 맵 기반 저장소 구현
// =============================================================================

struct XdpPacket<'a>(&'a XdpContext);

impl PacketView for XdpPacket<'_> {
    #[inline(always)]
    fn captured_len(&self) -> usize {
        self.0.data_end() - self.0.data()
    }

    #[inline(always)]
    fn load_u32(&self, offset: usize) -> Option<u32> {
        let start = self.0.data();
        let end = self.0.data_end();
        if start + offset + core::mem::size_of::<u32>() > end {
            return None;
        }
        let ptr = (start + offset) as *const u32;
        Some(unsafe { ptr.read_unaligned() })
    }
}

struct BanTable;

impl BanLookup for BanTable {
    #[inline(always)]
    fn is_banned(&self, addr: u32) -> bool {
        matches!(unsafe { BANNED_IPS.get(&addr) }, Some(flag) if *flag != 0)
    }
}

struct CounterTable;

impl CounterTable {
    #[inline(always)]
    fn add_one(ptr: *mut u64) -> u64 {
        // 여러 CPU가 같은 엔트리를 동시에 갱신함. 반환값 사용은 BPF v3 이상 (xtask가 고정)
        let counter = unsafe { AtomicU64::from_ptr(ptr) };
        counter.fetch_add(1, Ordering::Relaxed) + 1
    }
}

impl CounterStore for CounterTable {
    #[inline(always)]
    fn increment(&self, addr: u32) -> Option<u64> {
        if let Some(ptr) = RATE_LIMIT.get_ptr_mut(&addr) {
            return Some(Self::add_one(ptr));
        }
        if RATE_LIMIT.insert(&addr, &1, BPF_NOEXIST as u64).is_ok() {
            return Some(1);
        }
        // 다른 CPU가 먼저 생성했으면 그 엔트리에 더하고, 아니면 테이블 포화
        RATE_LIMIT.get_ptr_mut(&addr).map(Self::add_one)
    }
}

struct EventRing;

impl DiscardSink for EventRing {
    #[inline(always)]
    fn emit(&self, event: DiscardEventData) {
        if let Some(mut entry) = EVENTS.reserve::<DiscardEventData>(0) {
            entry.write(event);
            entry.submit(0);
        }
    }
}

#[cfg(not(test))]
#[panic_handler]
fn panic(_info: &core::panic::PanicInfo) -> ! {
    loop {}
}
