//! 시장 데이터 타입.
//!
//! 추론 요청으로 들어오는 OHLCV 캔들을 정의합니다.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};

/// 캔들 하나가 가지는 feature 개수 (open, high, low, close, volume).
pub const NUM_FEATURES: usize = 5;

/// OHLCV 캔들스틱 데이터.
///
/// 요청 본문에서 받은 그대로 보관하며 이후 변경하지 않습니다.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct Candle {
    /// 시가
    pub open: f64,
    /// 고가
    pub high: f64,
    /// 저가
    pub low: f64,
    /// 종가
    pub close: f64,
    /// 거래량 (없으면 0)
    #[serde(default)]
    pub volume: f64,
}

impl Candle {
    /// 새 캔들을 생성합니다.
    pub fn new(open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// 모든 가격이 같은 캔들을 생성합니다.
    pub fn flat(price: f64, volume: f64) -> Self {
        Self::new(price, price, price, price, volume)
    }

    /// feature 행으로 변환합니다. 열 순서는 `[open, high, low, close, volume]`.
    pub fn as_features(&self) -> [f64; NUM_FEATURES] {
        [self.open, self.high, self.low, self.close, self.volume]
    }

    /// 캔들 값이 추론에 사용할 수 있는지 검증합니다.
    ///
    /// 모든 값은 유한해야 하고, 가격은 양수, 거래량은 0 이상이어야 합니다.
    pub fn validate(&self) -> CoreResult<()> {
        let prices = [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ];

        for (name, value) in prices {
            if !value.is_finite() || value <= 0.0 {
                return Err(CoreError::InvalidInput(format!(
                    "{} must be a positive finite number, got {}",
                    name, value
                )));
            }
        }

        if !self.volume.is_finite() || self.volume < 0.0 {
            return Err(CoreError::InvalidInput(format!(
                "volume must be a non-negative finite number, got {}",
                self.volume
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_defaults_to_zero() {
        let candle: Candle =
            serde_json::from_str(r#"{"open":1.0,"high":2.0,"low":0.5,"close":1.5}"#).unwrap();
        assert_eq!(candle.volume, 0.0);
    }

    #[test]
    fn test_as_features_column_order() {
        let candle = Candle::new(1.0, 2.0, 0.5, 1.5, 10.0);
        assert_eq!(candle.as_features(), [1.0, 2.0, 0.5, 1.5, 10.0]);
    }

    #[test]
    fn test_validate() {
        assert!(Candle::new(1.0, 2.0, 0.5, 1.5, 0.0).validate().is_ok());
        assert!(Candle::new(0.0, 2.0, 0.5, 1.5, 0.0).validate().is_err());
        assert!(Candle::new(1.0, f64::NAN, 0.5, 1.5, 0.0).validate().is_err());
        assert!(Candle::new(1.0, 2.0, 0.5, 1.5, -1.0).validate().is_err());
    }

    #[test]
    fn test_validate_reports_field() {
        let err = Candle::new(1.0, 2.0, -0.5, 1.5, 0.0).validate().unwrap_err();
        assert!(err.to_string().contains("low"));
    }
}
