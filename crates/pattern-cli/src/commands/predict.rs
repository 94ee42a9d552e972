//! 단발성 예측 명령어.
//!
//! JSON 파일에서 캔들을 읽어 서버와 같은 추론 파이프라인으로 예측합니다.
//!
//! # 사용 예시
//!
//! ```bash
//! # 캔들 배열 또는 {"candles": [...]} 형식 모두 지원
//! pattern predict --input data/candles.json
//! ```

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info};

use pattern_analytics::ml::{InferenceService, ModelSlot, PredictionResponse};
use pattern_core::{AppConfig, Candle};

/// 예측 입력 파일 형식.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PredictInput {
    /// 캔들 배열
    Bare(Vec<Candle>),
    /// API 요청과 같은 `{candles: [...]}` 형식
    Wrapped { candles: Vec<Candle> },
}

impl PredictInput {
    /// 캔들 목록 추출.
    pub fn into_candles(self) -> Vec<Candle> {
        match self {
            PredictInput::Bare(candles) | PredictInput::Wrapped { candles } => candles,
        }
    }
}

/// JSON 문자열에서 캔들 파싱.
pub fn parse_candles(json: &str) -> Result<Vec<Candle>> {
    let input: PredictInput = serde_json::from_str(json)
        .context("Input must be a JSON array of candles or an object with a `candles` field")?;
    Ok(input.into_candles())
}

/// 주어진 서비스로 캔들 예측.
pub async fn predict_candles(
    service: &InferenceService,
    candles: &[Candle],
) -> Result<PredictionResponse> {
    let response = service.handle_predict(candles).await?;
    Ok(response)
}

/// 입력 파일을 읽어 예측을 실행합니다.
pub async fn run_predict(config: &AppConfig, input: &Path) -> Result<PredictionResponse> {
    let json = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read input file: {}", input.display()))?;
    let candles = parse_candles(&json)?;
    debug!(candles = candles.len(), "Loaded candles from input");

    let slot = Arc::new(ModelSlot::onnx(config.model.clone()));
    let service = InferenceService::new(config.inference.clone(), slot);

    let response = predict_candles(&service, &candles).await?;
    info!(
        pattern = %response.pattern,
        probability = response.probability,
        trend = %response.trend_prediction,
        "Prediction completed"
    );

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pattern_analytics::ml::{MlError, ModelLoader, MlResult, TrendModel, Trend};

    struct NoArtifact;

    impl ModelLoader for NoArtifact {
        fn load(&self) -> MlResult<Arc<dyn TrendModel>> {
            Err(MlError::ModelLoad("missing".to_string()))
        }

        fn describe(&self) -> String {
            "none".to_string()
        }
    }

    fn service() -> InferenceService {
        let config = AppConfig::default();
        InferenceService::new(config.inference, Arc::new(ModelSlot::new(NoArtifact)))
    }

    fn candle_json(close: f64) -> String {
        format!(
            r#"{{"open":{c},"high":{h},"low":{l},"close":{c},"volume":10}}"#,
            c = close,
            h = close + 0.5,
            l = close - 0.5
        )
    }

    #[test]
    fn test_parse_bare_array() {
        let json = format!("[{},{}]", candle_json(100.0), candle_json(101.0));
        let candles = parse_candles(&json).unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[1].close, 101.0);
    }

    #[test]
    fn test_parse_wrapped_object() {
        let json = format!(r#"{{"candles":[{}]}}"#, candle_json(100.0));
        let candles = parse_candles(&json).unwrap();
        assert_eq!(candles.len(), 1);
    }

    #[test]
    fn test_parse_volume_defaults_to_zero() {
        let candles =
            parse_candles(r#"[{"open":1,"high":2,"low":0.5,"close":1.5}]"#).unwrap();
        assert_eq!(candles[0].volume, 0.0);
    }

    #[test]
    fn test_parse_rejects_other_shapes() {
        assert!(parse_candles(r#"{"data": []}"#).is_err());
        assert!(parse_candles("not json").is_err());
    }

    #[tokio::test]
    async fn test_predict_falling_series() {
        let closes: Vec<String> = (0..60)
            .map(|i| candle_json(110.0 - 10.0 * i as f64 / 59.0))
            .collect();
        let candles = parse_candles(&format!("[{}]", closes.join(","))).unwrap();

        let response = predict_candles(&service(), &candles).await.unwrap();

        assert_eq!(response.pattern, "Bearish Flag");
        assert_eq!(response.probability, 0.95);
        assert_eq!(response.trend_prediction, Trend::Bearish);
    }

    #[tokio::test]
    async fn test_predict_too_few_candles_is_error() {
        let candles = parse_candles(&format!("[{}]", candle_json(100.0))).unwrap();
        let err = predict_candles(&service(), &candles).await.unwrap_err();
        assert!(err.to_string().contains("At least 50 candles required"));
    }
}
