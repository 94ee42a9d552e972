//! CLI 도구 모음.
//!
//! 이 crate는 다음 기능을 제공합니다:
//! - JSON 파일 기반 단발성 예측
//! - 합성 훈련 데이터셋 생성
//! - 훈련 명령 실행

pub mod commands;
