//! 추론 서비스.
//!
//! 요청 검증 → 정규화 → 모델 슬롯 조회 → 예측 전략 순서로 처리하고
//! 결과를 응답 형식으로 변환합니다.

use crate::ml::features::FeatureNormalizer;
use crate::ml::lifecycle::ModelSlot;
use crate::ml::predictor::PredictionStrategy;
use crate::ml::types::{PredictionResult, PredictionSource, Trend};
use crate::ml::{MlError, MlResult};
use pattern_core::{Candle, InferenceConfig};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

/// 응답 확률의 소수점 자릿수 배율 (4자리).
const PROBABILITY_SCALE: f64 = 10_000.0;

/// 확률을 소수점 4자리로 반올림.
pub fn round_probability(p: f64) -> f64 {
    (p * PROBABILITY_SCALE).round() / PROBABILITY_SCALE
}

/// 예측 응답.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct PredictionResponse {
    /// 패턴 이름
    #[cfg_attr(feature = "utoipa-support", schema(example = "Bullish Flag"))]
    pub pattern: String,
    /// 신뢰도 (소수점 4자리)
    #[cfg_attr(feature = "utoipa-support", schema(example = 0.95))]
    pub probability: f64,
    /// 추세 방향
    pub trend_prediction: Trend,
}

impl From<&PredictionResult> for PredictionResponse {
    fn from(result: &PredictionResult) -> Self {
        Self {
            pattern: result.pattern.as_str().to_string(),
            probability: round_probability(result.probability),
            trend_prediction: result.trend,
        }
    }
}

/// 추론 서비스.
///
/// 모델 슬롯을 공유하며 요청 간에 다른 상태를 가지지 않습니다.
#[derive(Debug, Clone)]
pub struct InferenceService {
    config: InferenceConfig,
    normalizer: FeatureNormalizer,
    strategy: PredictionStrategy,
    slot: Arc<ModelSlot>,
}

impl InferenceService {
    /// 새 추론 서비스 생성.
    pub fn new(config: InferenceConfig, slot: Arc<ModelSlot>) -> Self {
        Self {
            normalizer: FeatureNormalizer::from(&config),
            strategy: PredictionStrategy::default(),
            config,
            slot,
        }
    }

    /// 추론 설정 반환.
    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    /// 공유 모델 슬롯 반환.
    pub fn model_slot(&self) -> &Arc<ModelSlot> {
        &self.slot
    }

    /// 요청을 검증합니다. 정규화 전에 호출되어야 합니다.
    pub fn validate(&self, candles: &[Candle]) -> MlResult<()> {
        if candles.len() < self.config.min_candles {
            return Err(MlError::InvalidInput(format!(
                "At least {} candles required",
                self.config.min_candles
            )));
        }

        for (i, candle) in candles.iter().enumerate() {
            candle.validate().map_err(|e| match MlError::from(e) {
                MlError::InvalidInput(msg) => {
                    MlError::InvalidInput(format!("candles[{}]: {}", i, msg))
                }
                other => other,
            })?;
        }

        Ok(())
    }

    /// 전체 정밀도의 예측 결과 반환.
    #[instrument(skip(self, candles), fields(candles = candles.len()))]
    pub async fn predict(&self, candles: &[Candle]) -> MlResult<PredictionResult> {
        self.validate(candles)?;

        let window = self.normalizer.normalize(candles).ok_or_else(|| {
            MlError::InsufficientData {
                required: self.normalizer.seq_len(),
                actual: candles.len().min(self.normalizer.max_candles()),
            }
        })?;

        let model = self.slot.get_or_load().await;
        let result = self.strategy.predict(&window, &model);

        let source = match &result.source {
            PredictionSource::Model(_) => "model",
            PredictionSource::Fallback => "fallback",
        };
        metrics::counter!(
            "pattern_predictions_total",
            "source" => source,
            "trend" => result.trend.as_str()
        )
        .increment(1);

        debug!(
            pattern = %result.pattern,
            probability = result.probability,
            trend = %result.trend,
            source,
            "Prediction complete"
        );

        Ok(result)
    }

    /// 캔들 목록에 대한 예측 응답 반환.
    pub async fn handle_predict(&self, candles: &[Candle]) -> MlResult<PredictionResponse> {
        let result = self.predict(candles).await?;
        Ok(PredictionResponse::from(&result))
    }
}
