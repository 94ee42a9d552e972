//! OpenAPI 문서화 설정.
//!
//! utoipa를 사용하여 REST API의 OpenAPI 3.0 스펙을 생성합니다.
//! 서버 바이너리의 `--export-openapi` 플래그로 JSON을 출력할 수 있습니다.
//!
//! 새로운 엔드포인트를 추가할 때:
//!
//! 1. 응답/요청 타입에 `#[derive(ToSchema)]` 추가
//! 2. 핸들러에 `#[utoipa::path(...)]` 어노테이션 추가
//! 3. 이 파일의 `components(schemas(...))` 및 `paths(...)` 섹션에 추가

use pattern_analytics::ml::{ModelStatus, PredictionResponse, Trend};
use pattern_core::Candle;
use utoipa::OpenApi;

use crate::error::ApiErrorResponse;
use crate::routes::{HealthResponse, PredictRequest, ReadinessResponse, TrainResponse};

/// Pattern API 문서.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Pattern Detection API",
        description = r#"
# 차트 패턴 / 추세 예측 API

OHLCV 캔들 목록을 받아 차트 패턴, 신뢰도, 추세 방향을 반환합니다.

- 최소 50개 캔들이 필요합니다.
- 학습된 모델이 없으면 최근 수익률 기반 규칙으로 예측합니다.
- `POST /train` 성공 후 다음 예측에서 모델을 다시 로드합니다.
"#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:8000", description = "로컬 개발 서버"),
    ),
    tags(
        (name = "health", description = "헬스 체크 - 서버 상태 확인"),
        (name = "predict", description = "예측 - 패턴/추세 추론"),
        (name = "ml", description = "ML - 모델 훈련")
    ),
    // ==================== 스키마 등록 ====================
    components(
        schemas(
            // ===== Health =====
            HealthResponse,
            ReadinessResponse,
            ModelStatus,

            // ===== Common =====
            ApiErrorResponse,

            // ===== Predict =====
            Candle,
            PredictRequest,
            PredictionResponse,
            Trend,

            // ===== ML =====
            TrainResponse,
        )
    ),
    // ==================== 경로 등록 ====================
    paths(
        crate::routes::health::health_check,
        crate::routes::health::health_ready,
        crate::routes::predict::predict,
        crate::routes::ml::train,
    )
)]
pub struct ApiDoc;
