//! ML 훈련 트리거 endpoint.
//!
//! 훈련 명령을 동기적으로 실행하고, 성공한 경우에만 모델 슬롯을 무효화합니다.
//! 실패하거나 시간이 초과되면 기존 모델이 그대로 사용됩니다.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use pattern_analytics::ml::TrainingOutcome;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{
    api_error, ml_error_response, ApiErrorResponse, ApiResult, SHUTTING_DOWN, TRAINING_FAILED,
    TRAINING_IN_PROGRESS, TRAINING_TIMEOUT,
};
use crate::metrics::record_training_run;
use crate::state::AppState;

// ==================== 응답 타입 ====================

/// 훈련 성공 응답.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TrainResponse {
    /// 성공 여부
    pub success: bool,
    /// 결과 메시지
    pub message: String,
    /// 실행 ID
    pub run_id: Uuid,
    /// 훈련 프로세스 표준 출력
    pub stdout: String,
    /// 훈련 프로세스 표준 에러
    pub stderr: String,
    /// 실행 시간 (밀리초)
    pub elapsed_ms: u64,
}

// ==================== 핸들러 ====================

/// 훈련을 실행하고 완료되면 모델을 다시 로드하도록 표시합니다.
///
/// POST /train
#[utoipa::path(
    post,
    path = "/train",
    responses(
        (status = 200, description = "훈련 완료", body = TrainResponse),
        (status = 409, description = "이미 훈련 실행 중", body = ApiErrorResponse),
        (status = 500, description = "훈련 실패", body = ApiErrorResponse),
        (status = 503, description = "서버 종료로 훈련 취소", body = ApiErrorResponse),
        (status = 504, description = "훈련 시간 초과", body = ApiErrorResponse)
    ),
    tag = "ml"
)]
pub async fn train(State(state): State<Arc<AppState>>) -> ApiResult<Json<TrainResponse>> {
    let Ok(_guard) = state.training_lock.try_lock() else {
        warn!("Training request rejected: another run is in progress");
        return Err(api_error(
            StatusCode::CONFLICT,
            TRAINING_IN_PROGRESS,
            "A training run is already in progress",
        ));
    };

    let run_id = Uuid::new_v4();
    info!(%run_id, "Training run started");

    // 종료가 시작되면 실행 future를 드롭하여 kill_on_drop으로 프로세스를 종료
    let outcome = tokio::select! {
        biased;
        _ = state.shutdown.cancelled() => {
            warn!(%run_id, "Training run cancelled by shutdown");
            record_training_run("cancelled");
            return Err(api_error(
                StatusCode::SERVICE_UNAVAILABLE,
                SHUTTING_DOWN,
                "Server is shutting down, training run cancelled",
            ));
        }
        result = state.training_runner.run() => result.map_err(|e| {
            record_training_run("failed");
            ml_error_response(e)
        })?,
    };
    record_training_run(outcome.label());

    match outcome {
        TrainingOutcome::Completed {
            stdout,
            stderr,
            elapsed_ms,
        } => {
            state.model_slot.invalidate().await;
            info!(%run_id, elapsed_ms, "Training run completed, model will reload on next request");

            Ok(Json(TrainResponse {
                success: true,
                message: "Training completed, model will be reloaded on next prediction"
                    .to_string(),
                run_id,
                stdout,
                stderr,
                elapsed_ms,
            }))
        }
        TrainingOutcome::Failed {
            exit_code,
            stdout,
            stderr,
        } => {
            warn!(%run_id, ?exit_code, "Training run failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiErrorResponse::with_details(
                    TRAINING_FAILED,
                    match exit_code {
                        Some(code) => format!("Training process exited with code {}", code),
                        None => "Training process terminated by signal".to_string(),
                    },
                    serde_json::json!({
                        "run_id": run_id,
                        "exit_code": exit_code,
                        "stdout": stdout,
                        "stderr": stderr,
                    }),
                )),
            ))
        }
        TrainingOutcome::TimedOut { timeout_secs } => {
            warn!(%run_id, timeout_secs, "Training run timed out");
            Err((
                StatusCode::GATEWAY_TIMEOUT,
                Json(ApiErrorResponse::with_details(
                    TRAINING_TIMEOUT,
                    format!("Training did not finish within {} seconds", timeout_secs),
                    serde_json::json!({ "run_id": run_id, "timeout_secs": timeout_secs }),
                )),
            ))
        }
    }
}

/// ML 라우터 생성.
pub fn ml_router() -> Router<Arc<AppState>> {
    Router::new().route("/train", post(train))
}
