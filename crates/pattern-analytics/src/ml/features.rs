//! 캔들 시퀀스를 모델 입력 윈도우로 변환.
//!
//! 최근 `max_candles`개로 자른 뒤 마지막 `seq_len`개 행에 대해 열별 min-max 스케일링을 적용합니다.
//! 스케일링 범위는 해당 윈도우에서만 계산되며 요청 간에 공유되지 않습니다.

use crate::ml::types::Window;
use pattern_core::{Candle, InferenceConfig, NUM_FEATURES};
use tracing::trace;

/// 범위가 0인 열(모든 값이 동일)에 사용하는 값.
pub const DEGENERATE_COLUMN_VALUE: f64 = 0.5;

/// 열별 min-max 정규화기.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureNormalizer {
    seq_len: usize,
    max_candles: usize,
}

impl Default for FeatureNormalizer {
    fn default() -> Self {
        Self::from(&InferenceConfig::default())
    }
}

impl From<&InferenceConfig> for FeatureNormalizer {
    fn from(config: &InferenceConfig) -> Self {
        Self::new(config.seq_len, config.max_candles)
    }
}

impl FeatureNormalizer {
    /// 새 정규화기 생성.
    ///
    /// `max_candles`는 최소 `seq_len`으로 맞춰집니다.
    pub fn new(seq_len: usize, max_candles: usize) -> Self {
        Self {
            seq_len,
            max_candles: max_candles.max(seq_len),
        }
    }

    /// 윈도우 길이.
    pub fn seq_len(&self) -> usize {
        self.seq_len
    }

    /// 유지하는 최대 캔들 수.
    pub fn max_candles(&self) -> usize {
        self.max_candles
    }

    /// 캔들 시퀀스를 정규화된 윈도우로 변환합니다.
    ///
    /// 잘라낸 뒤 남은 캔들이 `seq_len`보다 적으면 `None`을 반환합니다.
    pub fn normalize(&self, candles: &[Candle]) -> Option<Window> {
        let truncated = &candles[candles.len().saturating_sub(self.max_candles)..];
        if self.seq_len == 0 || truncated.len() < self.seq_len {
            trace!(
                available = truncated.len(),
                required = self.seq_len,
                "Not enough candles for a window"
            );
            return None;
        }

        let window = &truncated[truncated.len() - self.seq_len..];
        let rows: Vec<[f64; NUM_FEATURES]> = window.iter().map(Candle::as_features).collect();

        let mut mins = [f64::INFINITY; NUM_FEATURES];
        let mut maxs = [f64::NEG_INFINITY; NUM_FEATURES];
        for row in &rows {
            for (j, value) in row.iter().enumerate() {
                mins[j] = mins[j].min(*value);
                maxs[j] = maxs[j].max(*value);
            }
        }

        let scaled = rows
            .into_iter()
            .map(|row| {
                let mut out = [0.0; NUM_FEATURES];
                for j in 0..NUM_FEATURES {
                    out[j] = scale(row[j], mins[j], maxs[j]);
                }
                out
            })
            .collect();

        Some(Window::from_rows(scaled))
    }
}

fn scale(value: f64, min: f64, max: f64) -> f64 {
    let range = max - min;
    if range <= 0.0 || !range.is_finite() {
        return DEGENERATE_COLUMN_VALUE;
    }
    ((value - min) / range).clamp(0.0, 1.0)
}

/// 기본 설정으로 정규화합니다.
pub fn normalize(candles: &[Candle], seq_len: usize, max_candles: usize) -> Option<Window> {
    FeatureNormalizer::new(seq_len, max_candles).normalize(candles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn rising(n: usize) -> Vec<Candle> {
        (0..n)
            .map(|i| {
                let c = 100.0 + i as f64;
                Candle::new(c - 0.5, c + 1.0, c - 1.0, c, 1000.0 + i as f64)
            })
            .collect()
    }

    #[test]
    fn test_too_few_candles() {
        let normalizer = FeatureNormalizer::new(60, 500);
        assert!(normalizer.normalize(&rising(59)).is_none());
        assert!(normalizer.normalize(&[]).is_none());
        assert!(normalizer.normalize(&rising(60)).is_some());
    }

    #[test]
    fn test_window_shape() {
        let window = normalize(&rising(120), 60, 500).unwrap();
        assert_eq!(window.shape(), [1, 60, NUM_FEATURES]);
        assert_eq!(window.as_slice().len(), 60 * NUM_FEATURES);
    }

    #[test]
    fn test_uses_most_recent_rows() {
        let mut candles = rising(60);
        // 윈도우 밖의 극단값은 스케일링에 영향을 주지 않아야 함
        candles.insert(0, Candle::new(1.0, 10_000.0, 0.5, 5_000.0, 1e9));

        let window = normalize(&candles, 60, 500).unwrap();
        let closes = window.column(3);
        assert_eq!(closes[0], 0.0);
        assert_eq!(closes[59], 1.0);
    }

    #[test]
    fn test_max_candles_raised_to_seq_len() {
        // seq_len보다 작은 max_candles는 seq_len으로 올라감
        let normalizer = FeatureNormalizer::new(120, 100);
        assert_eq!(normalizer.max_candles(), 120);
        assert!(normalizer.normalize(&rising(120)).is_some());
    }

    #[test]
    fn test_long_input_uses_last_seq_len_rows() {
        let normalizer = FeatureNormalizer::new(60, 100);
        let window = normalizer.normalize(&rising(1000)).unwrap();
        assert_eq!(window.seq_len(), 60);
    }

    #[test]
    fn test_flat_column_maps_to_half() {
        let candles = vec![Candle::flat(100.0, 0.0); 60];
        let window = normalize(&candles, 60, 500).unwrap();
        assert!(window.as_slice().iter().all(|v| *v == DEGENERATE_COLUMN_VALUE));
    }

    #[test]
    fn test_linear_closes_scale_linearly() {
        let window = normalize(&rising(60), 60, 500).unwrap();
        let closes = window.column(3);
        for (i, value) in closes.iter().enumerate() {
            assert!((value - i as f64 / 59.0).abs() < 1e-12);
        }
    }

    fn candle_strategy() -> impl Strategy<Value = Candle> {
        (1.0f64..1000.0, 0.0f64..50.0, 0.0f64..50.0, 0.0f64..1.0, 0.0f64..1e6).prop_map(
            |(open, up, down, frac, volume)| {
                let high = open + up;
                let low = (open - down).max(0.01);
                let close = low + (high - low) * frac;
                Candle::new(open, high, low, close, volume)
            },
        )
    }

    proptest! {
        #[test]
        fn prop_values_in_unit_interval(candles in prop::collection::vec(candle_strategy(), 0..200)) {
            let normalizer = FeatureNormalizer::new(30, 100);
            match normalizer.normalize(&candles) {
                Some(window) => {
                    prop_assert!(candles.len() >= 30);
                    prop_assert_eq!(window.seq_len(), 30);
                    prop_assert!(window.as_slice().iter().all(|v| (0.0..=1.0).contains(v)));
                }
                None => prop_assert!(candles.len() < 30),
            }
        }

        #[test]
        fn prop_deterministic(candles in prop::collection::vec(candle_strategy(), 30..80)) {
            let normalizer = FeatureNormalizer::new(30, 100);
            prop_assert_eq!(normalizer.normalize(&candles), normalizer.normalize(&candles));
        }
    }
}
