//! ML 모듈 에러 타입.

use pattern_core::CoreError;
use thiserror::Error;

/// ML 작업에서 발생할 수 있는 에러.
#[derive(Debug, Error)]
pub enum MlError {
    /// 모델 로드 에러
    #[error("Model load error: {0}")]
    ModelLoad(String),

    /// 모델 추론 중 에러
    #[error("Inference error: {0}")]
    Inference(String),

    /// 유효하지 않은 입력 데이터
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// 윈도우를 만들기 위한 데이터 부족
    #[error("Insufficient data: need {required} samples, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// 훈련 프로세스 실행 에러
    #[error("Training error: {0}")]
    Training(String),
}

/// ML 작업을 위한 Result 타입.
pub type MlResult<T> = Result<T, MlError>;

impl From<CoreError> for MlError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidInput(msg) => MlError::InvalidInput(msg),
            other => MlError::InvalidInput(other.to_string()),
        }
    }
}
