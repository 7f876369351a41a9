//! 파이프라인 trait -- 모듈 라이프사이클 확장 포인트 정의

use crate::error::FlowgateError;

/// 모듈 상태
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// 정상 동작
    Healthy,
    /// 동작 중이나 일부 기능 저하 (사유 포함)
    Degraded(String),
    /// 동작 불가 (사유 포함)
    Unhealthy(String),
}

impl HealthStatus {
    /// 정상 상태 여부
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }
}

/// 시작/정지 가능한 장기 실행 모듈
///
/// 데몬은 이 trait을 통해 필터 엔진의 라이프사이클을 관리합니다.
#[allow(async_fn_in_trait)]
pub trait Pipeline {
    /// 모듈을 시작합니다. 이미 실행 중이면 `PipelineError::AlreadyRunning`.
    async fn start(&mut self) -> Result<(), FlowgateError>;

    /// 모듈을 정지하고 리소스를 정리합니다. 실행 중이 아니면 `PipelineError::NotRunning`.
    async fn stop(&mut self) -> Result<(), FlowgateError>;

    /// 현재 상태를 확인합니다.
    async fn health_check(&self) -> HealthStatus;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_healthy_is_healthy() {
        assert!(HealthStatus::Healthy.is_healthy());
        assert!(!HealthStatus::Degraded("slow".to_owned()).is_healthy());
        assert!(!HealthStatus::Unhealthy("down".to_owned()).is_healthy());
    }
}
