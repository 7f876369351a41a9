//! flowgate 공통 크레이트
//!
//! 패킷 필터 엔진과 데몬이 공유하는 에러, 설정, 이벤트, 파이프라인 trait,
//! 메트릭 이름을 정의합니다.

pub mod config;
pub mod error;
pub mod event;
pub mod metrics;
pub mod pipeline;

// --- 주요 타입 re-export ---

// 에러
pub use error::{ConfigError, FilterError, FlowgateError, PipelineError};

// 설정
pub use config::FlowgateConfig;

// 이벤트
pub use event::{DiscardEvent, DiscardStage, Event, EventMetadata};

// 파이프라인 trait
pub use pipeline::{HealthStatus, Pipeline};
