//! ML 모듈의 공통 타입.

use pattern_core::NUM_FEATURES;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 예측된 추세 방향.
///
/// 모델 출력 인덱스와 1:1로 대응하며 순서가 의미를 가집니다: `[BULLISH, BEARISH, NEUTRAL]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub enum Trend {
    /// 상승 추세
    Bullish,
    /// 하락 추세
    Bearish,
    /// 횡보
    Neutral,
}

impl Trend {
    /// 모델 출력 순서대로 나열한 추세 테이블.
    pub const ALL: [Trend; 3] = [Trend::Bullish, Trend::Bearish, Trend::Neutral];

    /// 모델 출력 인덱스에서 변환. 범위를 벗어나면 `None`.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// 응답에 사용하는 문자열.
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Bullish => "BULLISH",
            Trend::Bearish => "BEARISH",
            Trend::Neutral => "NEUTRAL",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 차트 패턴 레이블.
///
/// 모델 인덱스 매핑에 사용되므로 순서를 바꾸면 안 됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub enum PatternLabel {
    #[serde(rename = "Head and Shoulders")]
    HeadAndShoulders,
    #[serde(rename = "Double Bottom")]
    DoubleBottom,
    #[serde(rename = "Bullish Flag")]
    BullishFlag,
    #[serde(rename = "Bearish Flag")]
    BearishFlag,
    #[serde(rename = "Consolidation")]
    Consolidation,
}

impl PatternLabel {
    /// 인덱스 순서대로 나열한 패턴 테이블.
    pub const ALL: [PatternLabel; 5] = [
        PatternLabel::HeadAndShoulders,
        PatternLabel::DoubleBottom,
        PatternLabel::BullishFlag,
        PatternLabel::BearishFlag,
        PatternLabel::Consolidation,
    ];

    /// 모델 클래스 인덱스에서 변환. 테이블보다 큰 인덱스는 마지막 항목으로 고정됩니다.
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index.min(Self::ALL.len() - 1)]
    }

    /// 패턴 이름.
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternLabel::HeadAndShoulders => "Head and Shoulders",
            PatternLabel::DoubleBottom => "Double Bottom",
            PatternLabel::BullishFlag => "Bullish Flag",
            PatternLabel::BearishFlag => "Bearish Flag",
            PatternLabel::Consolidation => "Consolidation",
        }
    }
}

impl fmt::Display for PatternLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 예측을 생성한 경로.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "model", rename_all = "snake_case")]
pub enum PredictionSource {
    /// 로드된 모델이 예측
    Model(String),
    /// 규칙 기반 fallback
    Fallback,
}

/// 한 번의 예측 결과.
///
/// 요청마다 새로 만들어지며 캐시되지 않습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// 패턴 레이블
    pub pattern: PatternLabel,
    /// 신뢰도 (0.0 ~ 1.0, 전체 정밀도)
    pub probability: f64,
    /// 추세 방향
    pub trend: Trend,
    /// 예측 경로
    pub source: PredictionSource,
}

impl PredictionResult {
    /// 규칙 기반 fallback 결과 생성.
    pub fn fallback(pattern: PatternLabel, probability: f64, trend: Trend) -> Self {
        Self {
            pattern,
            probability,
            trend,
            source: PredictionSource::Fallback,
        }
    }

    /// 기본 중립 결과 (`Consolidation`, 0.5, `NEUTRAL`).
    pub fn neutral() -> Self {
        Self::fallback(PatternLabel::Consolidation, 0.5, Trend::Neutral)
    }

    /// 모델 경로에서 나온 결과인지 확인.
    pub fn is_from_model(&self) -> bool {
        matches!(self.source, PredictionSource::Model(_))
    }
}

/// 정규화된 입력 윈도우.
///
/// 항상 `seq_len × NUM_FEATURES` 크기를 가지며 각 값은 열별 min-max 스케일링 결과입니다.
/// 생성은 [`FeatureNormalizer`](crate::ml::FeatureNormalizer)만 할 수 있습니다.
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    seq_len: usize,
    // row-major: values[row * NUM_FEATURES + col]
    values: Vec<f64>,
}

impl Window {
    pub(crate) fn from_rows(rows: Vec<[f64; NUM_FEATURES]>) -> Self {
        let seq_len = rows.len();
        let values = rows.into_iter().flatten().collect();
        Self { seq_len, values }
    }

    /// 윈도우 길이 (행 수).
    pub fn seq_len(&self) -> usize {
        self.seq_len
    }

    /// feature 수 (열 수).
    pub fn num_features(&self) -> usize {
        NUM_FEATURES
    }

    /// 단일 샘플 배치 형태 `[1, seq_len, num_features]`.
    pub fn shape(&self) -> [usize; 3] {
        [1, self.seq_len, NUM_FEATURES]
    }

    /// `i`번째 행.
    pub fn row(&self, i: usize) -> &[f64] {
        &self.values[i * NUM_FEATURES..(i + 1) * NUM_FEATURES]
    }

    /// `j`번째 열을 복사해서 반환.
    pub fn column(&self, j: usize) -> Vec<f64> {
        self.values
            .iter()
            .skip(j)
            .step_by(NUM_FEATURES)
            .copied()
            .collect()
    }

    /// 평탄화된 값.
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// 모델 입력용 f32 값.
    pub fn to_f32_vec(&self) -> Vec<f32> {
        self.values.iter().map(|v| *v as f32).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trend_from_index() {
        assert_eq!(Trend::from_index(0), Some(Trend::Bullish));
        assert_eq!(Trend::from_index(1), Some(Trend::Bearish));
        assert_eq!(Trend::from_index(2), Some(Trend::Neutral));
        assert_eq!(Trend::from_index(3), None);
    }

    #[test]
    fn test_trend_serialization() {
        assert_eq!(serde_json::to_string(&Trend::Bullish).unwrap(), r#""BULLISH""#);
        assert_eq!(Trend::Neutral.to_string(), "NEUTRAL");
    }

    #[test]
    fn test_pattern_from_index_clamps() {
        assert_eq!(PatternLabel::from_index(0), PatternLabel::HeadAndShoulders);
        assert_eq!(PatternLabel::from_index(2), PatternLabel::BullishFlag);
        assert_eq!(PatternLabel::from_index(4), PatternLabel::Consolidation);
        assert_eq!(PatternLabel::from_index(99), PatternLabel::Consolidation);
    }

    #[test]
    fn test_pattern_serialization_uses_display_name() {
        let json = serde_json::to_string(&PatternLabel::HeadAndShoulders).unwrap();
        assert_eq!(json, r#""Head and Shoulders""#);
        assert_eq!(PatternLabel::BearishFlag.to_string(), "Bearish Flag");
    }

    #[test]
    fn test_window_accessors() {
        let window = Window::from_rows(vec![
            [0.0, 0.1, 0.2, 0.3, 0.4],
            [1.0, 0.9, 0.8, 0.7, 0.6],
        ]);

        assert_eq!(window.seq_len(), 2);
        assert_eq!(window.shape(), [1, 2, 5]);
        assert_eq!(window.row(1), &[1.0, 0.9, 0.8, 0.7, 0.6]);
        assert_eq!(window.column(3), vec![0.3, 0.7]);
        assert_eq!(window.to_f32_vec().len(), 10);
    }

    #[test]
    fn test_neutral_result() {
        let result = PredictionResult::neutral();
        assert_eq!(result.pattern, PatternLabel::Consolidation);
        assert_eq!(result.probability, 0.5);
        assert_eq!(result.trend, Trend::Neutral);
        assert!(!result.is_from_model());
    }
}
