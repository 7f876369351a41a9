//! Flowgate XDP 패킷 필터 엔진
//!
//! 수신 프레임을 XDP 단계에서 검사하여 차단된 발신지를 폐기하고, 나머지는
//! 발신지별 패킷 수가 임계값(100)을 넘으면 폐기합니다. 판정 로직은
//! [`flowgate_filter_common`]에 있으며 커널 프로그램과 호스트 모델이 공유합니다.
//!
//! # 모듈 구성
//! - [`config`]: 차단 규칙 관리 + core 설정 확장
//! - [`engine`]: FilterEngine -- XDP 프로그램 로드/어태치, Pipeline trait 구현
//! - [`pipeline`]: FilterPipeline -- 커널과 같은 판정을 수행하는 호스트 모델
//! - [`dispatch`]: 디스패치 테이블과 스테이지
//! - [`tables`]: 차단 목록 / 레이트 카운터 테이블
//! - [`event`]: 폐기 이벤트 변환 및 채널 싱크
//! - [`stats`]: 판정 경로별 통계 (PerCpuArray 기반)

pub mod config;
pub mod dispatch;
pub mod engine;
pub mod event;
#[cfg(target_os = "linux")]
mod loader;
pub mod pipeline;
pub mod stats;
pub mod tables;

// --- 주요 타입 re-export ---

// 엔진
pub use engine::{FilterEngine, FilterEngineBuilder};

// 설정
pub use config::{BanRule, EngineConfig};

// 호스트 모델
pub use dispatch::{BanFilterStage, DispatchTable, RateLimiterStage, SharedSink, Stage};
pub use pipeline::FilterPipeline;
pub use tables::{BanTable, RateCounters};

// 이벤트
pub use event::ChannelSink;

// 통계
pub use stats::{FilterStats, RawFilterSnapshot};

// 공유 타입 (커널/유저스페이스 공통)
pub use flowgate_filter_common;
