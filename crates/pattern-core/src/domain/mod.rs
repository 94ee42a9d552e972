//! 추론 서비스를 위한 도메인 모델.

mod market_data;

pub use market_data::*;
