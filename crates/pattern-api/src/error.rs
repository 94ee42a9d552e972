//! 통합 API 에러 응답 타입.
//!
//! 모든 API 엔드포인트에서 일관된 에러 형식을 제공하고,
//! 추론/훈련 에러를 HTTP 상태 코드로 매핑합니다.

use axum::http::StatusCode;
use axum::Json;
use pattern_analytics::ml::MlError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// 통합 API 에러 응답.
///
/// # 예시
///
/// ```json
/// {
///   "code": "VALIDATION_ERROR",
///   "message": "At least 50 candles required",
///   "timestamp": 1738300800
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorResponse {
    /// 에러 코드 (예: "VALIDATION_ERROR", "INSUFFICIENT_DATA")
    pub code: String,
    /// 사람이 읽을 수 있는 에러 메시지
    pub message: String,
    /// 추가 에러 상세 정보 (선택적)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// 에러 발생 타임스탬프 (Unix timestamp, 선택적)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl ApiErrorResponse {
    /// 기본 에러 생성 (타임스탬프 포함).
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            timestamp: Some(chrono::Utc::now().timestamp()),
        }
    }

    /// 상세 정보 포함 에러 생성.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: Value,
    ) -> Self {
        Self {
            details: Some(details),
            ..Self::new(code, message)
        }
    }

    /// 에러 코드 반환.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// 에러 메시지 반환.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ApiErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiErrorResponse {}

// ==================== Error Codes ====================

/// 요청 검증 실패 (캔들 부족/잘못된 값)
pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
/// 정규화 후 윈도우를 만들 수 없음
pub const INSUFFICIENT_DATA: &str = "INSUFFICIENT_DATA";
/// 훈련 프로세스 실패
pub const TRAINING_FAILED: &str = "TRAINING_FAILED";
/// 훈련 시간 초과
pub const TRAINING_TIMEOUT: &str = "TRAINING_TIMEOUT";
/// 다른 훈련이 실행 중
pub const TRAINING_IN_PROGRESS: &str = "TRAINING_IN_PROGRESS";
/// 서버 종료 중
pub const SHUTTING_DOWN: &str = "SHUTTING_DOWN";
/// 기타 내부 에러
pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";

// ==================== Result Type Alias ====================

/// API 핸들러 Result 타입 별칭.
pub type ApiResult<T> = Result<T, (StatusCode, Json<ApiErrorResponse>)>;

/// 상태 코드와 에러 응답 쌍 생성.
pub fn api_error(
    status: StatusCode,
    code: &str,
    message: impl Into<String>,
) -> (StatusCode, Json<ApiErrorResponse>) {
    (status, Json(ApiErrorResponse::new(code, message)))
}

impl From<MlError> for ApiErrorResponse {
    fn from(err: MlError) -> Self {
        match err {
            MlError::InvalidInput(msg) => ApiErrorResponse::new(VALIDATION_ERROR, msg),
            MlError::InsufficientData { required, actual } => ApiErrorResponse::with_details(
                INSUFFICIENT_DATA,
                "Insufficient data after preprocessing",
                serde_json::json!({ "required": required, "available": actual }),
            ),
            MlError::Training(msg) => ApiErrorResponse::new(TRAINING_FAILED, msg),
            other => ApiErrorResponse::new(INTERNAL_ERROR, other.to_string()),
        }
    }
}

/// `MlError`를 HTTP 상태 코드와 에러 응답으로 변환.
pub fn ml_error_response(err: MlError) -> (StatusCode, Json<ApiErrorResponse>) {
    let status = match &err {
        MlError::InvalidInput(_) | MlError::InsufficientData { .. } => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ApiErrorResponse::from(err)))
}
