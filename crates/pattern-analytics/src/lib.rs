//! # Pattern Analytics
//!
//! OHLCV 캔들 윈도우를 차트 패턴과 추세 방향으로 분류하는 추론 파이프라인.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - Feature 정규화 (열별 min-max 윈도우)
//! - 모델 추론 (ONNX) - `ml` feature 필요, 없으면 규칙 기반 fallback만 사용
//! - 모델 슬롯 수명 주기와 훈련 프로세스 실행
//! - 합성 훈련 데이터 생성
//!
//! 자세한 구성은 [`ml`] 모듈 문서를 참고하세요.

pub mod ml;

pub use ml::{
    InferenceService, MlError, MlResult, ModelSlot, PredictionResponse, TrainingOutcome,
    TrainingRunner, Trend,
};
