//! 추세 예측 및 모델 수명 주기.
//!
//! 이 모듈은 캔들 시퀀스에서 차트 패턴과 추세를 예측합니다:
//!
//! - **Feature 정규화**: 최근 캔들을 열별 min-max 스케일링한 고정 길이 윈도우
//! - **예측 전략**: ONNX 모델 또는 규칙 기반 fallback
//! - **모델 슬롯**: 지연 로드, 훈련 후 무효화
//! - **추론 서비스**: 요청 검증과 응답 변환
//!
//! # 아키텍처
//!
//! ```text
//! Candles (요청)
//!        │
//!        ▼
//! ┌─────────────────┐
//! │ InferenceService│ ← 개수/값 검증
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │FeatureNormalizer│     │    ModelSlot     │ ← 첫 요청 시 로드
//! └────────┬────────┘     └────────┬─────────┘
//!          │ Window                │ ModelHandle
//!          └───────────┬───────────┘
//!                      ▼
//!            ┌────────────────────┐
//!            │ PredictionStrategy │ ← 모델 실패 시 규칙 기반
//!            └────────────────────┘
//!                      │
//!                      ▼
//!             PredictionResponse
//! ```
//!
//! # 예제
//!
//! ```ignore
//! use pattern_analytics::ml::{InferenceService, ModelSlot};
//! use std::sync::Arc;
//!
//! let slot = Arc::new(ModelSlot::onnx(config.model.clone()));
//! let service = InferenceService::new(config.inference.clone(), slot);
//!
//! let response = service.handle_predict(&candles).await?;
//! println!("{} ({:.2}%)", response.pattern, response.probability * 100.0);
//! ```

pub mod error;
pub mod features;
pub mod lifecycle;
pub mod predictor;
pub mod service;
pub mod synthetic;
pub mod training;
pub mod types;

// 자주 사용되는 타입 재내보내기
pub use error::{MlError, MlResult};
pub use features::{normalize, FeatureNormalizer};
pub use lifecycle::{ModelHandle, ModelLoader, ModelSlot, ModelStatus, OnnxModelLoader};
#[cfg(feature = "ml")]
pub use predictor::OnnxTrendModel;
pub use predictor::{
    fallback_predict, interpret_probabilities, FallbackStats, MockTrendModel, PredictionStrategy,
    RuleBasedPredictor, TrendModel,
};
pub use service::{round_probability, InferenceService, PredictionResponse};
pub use synthetic::{SyntheticGenerator, SyntheticSample};
pub use training::{TrainingOutcome, TrainingRunner};
pub use types::{PatternLabel, PredictionResult, PredictionSource, Trend, Window};
