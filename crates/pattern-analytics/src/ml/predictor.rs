//! 추세 예측 전략.
//!
//! 로드된 모델이 있으면 모델로 예측하고, 모델이 없거나 모델 호출이 실패하면
//! 규칙 기반 fallback으로 예측합니다. 모델 실패는 호출자에게 에러로 전달되지 않습니다.
//!
//! ONNX 모델은 다음을 가져야 합니다:
//! - 입력: [1, seq_len, 5] 형태의 float32 텐서
//! - 출력: 3개 값 (클래스 확률 [BULLISH, BEARISH, NEUTRAL])

use crate::ml::lifecycle::ModelHandle;
use crate::ml::types::{PatternLabel, PredictionResult, PredictionSource, Trend, Window};
use crate::ml::{MlError, MlResult};
use tracing::{debug, warn};

/// close 열 인덱스 (`[open, high, low, close, volume]`).
const CLOSE_COLUMN: usize = 3;

/// fallback에서 0 나눗셈을 막기 위한 값.
pub const FALLBACK_EPSILON: f64 = 1e-8;

/// 다형성을 가능하게 하는 추세 모델 trait.
///
/// 구현체는 윈도우를 변경하지 않으며 여러 요청에서 동시에 호출될 수 있습니다.
pub trait TrendModel: Send + Sync {
    /// 윈도우에 대한 원시 클래스 출력 반환.
    fn predict(&self, window: &Window) -> MlResult<Vec<f32>>;

    /// 모델 이름 반환.
    fn name(&self) -> &str;
}

/// ONNX 기반 추세 모델.
#[cfg(feature = "ml")]
pub struct OnnxTrendModel {
    session: std::sync::Mutex<ort::session::Session>,
    name: String,
    input_name: String,
}

#[cfg(feature = "ml")]
impl OnnxTrendModel {
    /// 지정된 경로에서 ONNX 모델 로드.
    pub fn load(
        path: &std::path::Path,
        name: impl Into<String>,
        input_name: impl Into<String>,
    ) -> MlResult<Self> {
        use ort::session::{builder::GraphOptimizationLevel, Session};

        if !path.exists() {
            return Err(MlError::ModelLoad(format!(
                "Model file not found: {}",
                path.display()
            )));
        }

        let name = name.into();
        tracing::info!(model = %name, path = %path.display(), "Loading ONNX model");

        let session = Session::builder()
            .map_err(|e| MlError::ModelLoad(format!("Failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| MlError::ModelLoad(format!("Failed to set optimization level: {}", e)))?
            .commit_from_file(path)
            .map_err(|e| MlError::ModelLoad(format!("Failed to load model: {}", e)))?;

        Ok(Self {
            session: std::sync::Mutex::new(session),
            name,
            input_name: input_name.into(),
        })
    }
}

#[cfg(feature = "ml")]
impl TrendModel for OnnxTrendModel {
    fn predict(&self, window: &Window) -> MlResult<Vec<f32>> {
        let [batch, seq_len, features] = window.shape();
        let input_shape = [batch as i64, seq_len as i64, features as i64];

        let input_tensor =
            ort::value::Tensor::from_array((input_shape, window.to_f32_vec().into_boxed_slice()))
                .map_err(|e| MlError::Inference(format!("Failed to create input tensor: {}", e)))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| MlError::Inference("Session lock poisoned".to_string()))?;

        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input_tensor])
            .map_err(|e| MlError::Inference(format!("Inference failed: {}", e)))?;

        let output_name = outputs
            .iter()
            .next()
            .map(|(name, _)| name.to_string())
            .ok_or_else(|| MlError::Inference("No output tensor found".to_string()))?;

        let output = outputs
            .get(&output_name)
            .ok_or_else(|| MlError::Inference("Failed to get output by name".to_string()))?;

        let (_, output_slice) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| MlError::Inference(format!("Failed to extract output tensor: {}", e)))?;

        Ok(output_slice.to_vec())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// 실제 모델 파일 없이 테스트하기 위한 mock 모델.
#[derive(Debug, Clone)]
pub struct MockTrendModel {
    name: String,
    output: Result<Vec<f32>, String>,
}

impl MockTrendModel {
    /// 항상 주어진 출력을 반환하는 mock 생성.
    pub fn with_output(output: Vec<f32>) -> Self {
        Self {
            name: "mock_model".to_string(),
            output: Ok(output),
        }
    }

    /// 항상 추론 에러를 반환하는 mock 생성.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            name: "mock_model".to_string(),
            output: Err(message.into()),
        }
    }

    /// 모델 이름 설정.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl TrendModel for MockTrendModel {
    fn predict(&self, _window: &Window) -> MlResult<Vec<f32>> {
        self.output.clone().map_err(MlError::Inference)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// 모델 출력을 확률 분포로 해석하여 (클래스 인덱스, 확률) 반환.
///
/// 출력은 정확히 3개의 음수가 아닌 유한한 값이어야 합니다.
/// 합이 1에서 0.01보다 멀면 softmax를 적용합니다.
pub fn interpret_probabilities(raw: &[f32]) -> MlResult<(usize, f64)> {
    if raw.len() != Trend::ALL.len() {
        return Err(MlError::Inference(format!(
            "Expected {} output values, got {}",
            Trend::ALL.len(),
            raw.len()
        )));
    }
    if raw.iter().any(|v| !v.is_finite()) {
        return Err(MlError::Inference(
            "Model output contains non-finite values".to_string(),
        ));
    }
    if raw.iter().any(|v| *v < 0.0) {
        return Err(MlError::Inference(
            "Model output contains negative values".to_string(),
        ));
    }

    let values: Vec<f64> = raw.iter().map(|v| *v as f64).collect();
    let sum: f64 = values.iter().sum();
    let probs = if (sum - 1.0).abs() > 0.01 {
        let max_val = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let exp_vals: Vec<f64> = values.iter().map(|x| (x - max_val).exp()).collect();
        let exp_sum: f64 = exp_vals.iter().sum();
        exp_vals.into_iter().map(|x| x / exp_sum).collect()
    } else {
        values
    };

    // 동률이면 앞쪽 인덱스 우선
    let (index, probability) = probs
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(best_i, best_p), (i, p)| {
            if *p > best_p {
                (i, *p)
            } else {
                (best_i, best_p)
            }
        });

    Ok((index, probability.clamp(0.0, 1.0)))
}

/// 규칙 기반 fallback의 중간 값.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallbackStats {
    /// 구간 수익률
    pub ret: f64,
    /// 변동성 (표준편차 / 평균). 분기에는 사용하지 않음
    pub volatility: f64,
    /// 사용한 종가 개수
    pub samples: usize,
}

/// 최근 종가 수익률로 추세를 판단하는 규칙 기반 predictor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleBasedPredictor {
    lookback: usize,
    threshold: f64,
    max_probability: f64,
}

impl Default for RuleBasedPredictor {
    fn default() -> Self {
        Self {
            lookback: 20,
            threshold: 0.02,
            max_probability: 0.95,
        }
    }
}

impl RuleBasedPredictor {
    /// 윈도우의 최근 종가에서 통계 계산. 종가가 2개 미만이면 `None`.
    pub fn stats(&self, window: &Window) -> Option<FallbackStats> {
        let closes = window.column(CLOSE_COLUMN);
        let recent = &closes[closes.len().saturating_sub(self.lookback)..];
        if recent.len() < 2 {
            return None;
        }

        let first = recent[0];
        let last = recent[recent.len() - 1];
        let ret = (last - first) / (first + FALLBACK_EPSILON);

        let n = recent.len() as f64;
        let mean = recent.iter().sum::<f64>() / n;
        let variance = recent.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / n;
        let volatility = variance.sqrt() / (mean + FALLBACK_EPSILON);

        Some(FallbackStats {
            ret,
            volatility,
            samples: recent.len(),
        })
    }

    /// 규칙 기반 예측.
    pub fn predict(&self, window: &Window) -> PredictionResult {
        let Some(stats) = self.stats(window) else {
            return PredictionResult::neutral();
        };

        let probability = (0.6 + stats.ret.abs() * 5.0).min(self.max_probability);
        let result = if stats.ret > self.threshold {
            PredictionResult::fallback(PatternLabel::BullishFlag, probability, Trend::Bullish)
        } else if stats.ret < -self.threshold {
            PredictionResult::fallback(PatternLabel::BearishFlag, probability, Trend::Bearish)
        } else {
            PredictionResult::neutral()
        };

        debug!(
            ret = stats.ret,
            volatility = stats.volatility,
            trend = %result.trend,
            "Rule-based prediction"
        );

        result
    }
}

/// 기본 규칙으로 fallback 예측.
pub fn fallback_predict(window: &Window) -> PredictionResult {
    RuleBasedPredictor::default().predict(window)
}

/// 모델 경로와 fallback 경로를 선택하는 예측 전략.
#[derive(Debug, Clone, Default)]
pub struct PredictionStrategy {
    fallback: RuleBasedPredictor,
}

impl PredictionStrategy {
    /// 새 예측 전략 생성.
    pub fn new(fallback: RuleBasedPredictor) -> Self {
        Self { fallback }
    }

    /// 모델 핸들에 따라 예측합니다. 항상 결과를 반환합니다.
    pub fn predict(&self, window: &Window, model: &ModelHandle) -> PredictionResult {
        match model {
            ModelHandle::Loaded(model) => match Self::predict_with_model(model.as_ref(), window) {
                Ok(result) => result,
                Err(e) => {
                    warn!(model = model.name(), error = %e, "Model prediction failed, using fallback");
                    metrics::counter!("pattern_model_fallbacks_total").increment(1);
                    self.fallback.predict(window)
                }
            },
            ModelHandle::Absent => self.fallback.predict(window),
        }
    }

    fn predict_with_model(model: &dyn TrendModel, window: &Window) -> MlResult<PredictionResult> {
        let raw = model.predict(window)?;
        let (index, probability) = interpret_probabilities(&raw)?;
        let trend = Trend::from_index(index)
            .ok_or_else(|| MlError::Inference(format!("Unknown class index {}", index)))?;

        Ok(PredictionResult {
            pattern: PatternLabel::from_index(index),
            probability,
            trend,
            source: PredictionSource::Model(model.name().to_string()),
        })
    }
}
