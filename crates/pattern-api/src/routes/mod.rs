//! API 라우트.
//!
//! # 라우트 구조
//!
//! - `/health` - 헬스 체크 (liveness)
//! - `/health/ready` - 모델 슬롯 상태 (readiness)
//! - `/predict` - 패턴/추세 예측
//! - `/train` - 훈련 실행 및 모델 재로드 표시 (요청 타임아웃 제외)

pub mod health;
pub mod ml;
pub mod predict;

pub use health::{health_router, HealthResponse, ReadinessResponse};
pub use ml::{ml_router, TrainResponse};
pub use predict::{predict_router, PredictRequest};

use axum::{http::StatusCode, Router};
use std::sync::Arc;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;

use crate::state::AppState;

/// 전체 API 라우터 생성.
///
/// 요청 타임아웃(408)은 헬스 체크와 예측에만 적용됩니다.
/// `/train`은 훈련 실행기의 `training.timeout_secs`로 제한됩니다.
pub fn create_api_router(request_timeout: Duration) -> Router<Arc<AppState>> {
    let timed = Router::new()
        .nest("/health", health_router())
        .merge(predict_router())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ));

    timed.merge(ml_router())
}
