//! 패턴/추세 예측 endpoint.

use axum::{extract::State, routing::post, Json, Router};
use pattern_analytics::ml::PredictionResponse;
use pattern_core::Candle;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use utoipa::ToSchema;

use crate::error::{ml_error_response, ApiErrorResponse, ApiResult};
use crate::state::AppState;

/// 예측 요청.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PredictRequest {
    /// 시간순으로 정렬된 OHLCV 캔들 (최소 50개)
    pub candles: Vec<Candle>,
}

/// 캔들 목록에서 차트 패턴과 추세를 예측합니다.
///
/// POST /predict
#[utoipa::path(
    post,
    path = "/predict",
    request_body = PredictRequest,
    responses(
        (status = 200, description = "예측 성공", body = PredictionResponse),
        (status = 400, description = "캔들 부족 또는 잘못된 값", body = ApiErrorResponse)
    ),
    tag = "predict"
)]
pub async fn predict(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PredictRequest>,
) -> ApiResult<Json<PredictionResponse>> {
    debug!(candles = request.candles.len(), "Predict request");

    let response = state
        .inference
        .handle_predict(&request.candles)
        .await
        .map_err(ml_error_response)?;

    Ok(Json(response))
}

/// 예측 라우터 생성.
pub fn predict_router() -> Router<Arc<AppState>> {
    Router::new().route("/predict", post(predict))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::create_test_state;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    fn app() -> Router {
        predict_router().with_state(Arc::new(create_test_state()))
    }

    fn candles_json(closes: impl Iterator<Item = f64>) -> serde_json::Value {
        let candles: Vec<_> = closes
            .map(|c| serde_json::json!({"open": c, "high": c + 0.5, "low": c - 0.5, "close": c}))
            .collect();
        serde_json::json!({ "candles": candles })
    }

    async fn post_json(app: Router, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/predict")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_predict_rising() {
        let body = candles_json((0..60).map(|i| 100.0 + 10.0 * i as f64 / 59.0));
        let (status, json) = post_json(app(), body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["pattern"], "Bullish Flag");
        assert_eq!(json["probability"], 0.95);
        assert_eq!(json["trend_prediction"], "BULLISH");
    }

    #[tokio::test]
    async fn test_predict_too_few_candles() {
        let body = candles_json((0..10).map(|i| 100.0 + i as f64));
        let (status, json) = post_json(app(), body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert_eq!(json["message"], "At least 50 candles required");
    }

    #[tokio::test]
    async fn test_predict_insufficient_after_preprocessing() {
        let body = candles_json((0..55).map(|i| 100.0 + i as f64));
        let (status, json) = post_json(app(), body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "INSUFFICIENT_DATA");
        assert_eq!(json["message"], "Insufficient data after preprocessing");
    }
}
