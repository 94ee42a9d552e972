//! 합성 훈련 데이터 생성.
//!
//! 랜덤 워크 종가로 캔들 시퀀스를 만들고, 추론과 같은 정규화기로 윈도우를 만든 뒤
//! 전체 구간 수익률로 레이블을 붙입니다.
//!
//! 레이블: 0 = BULLISH (수익률 > 1%), 1 = BEARISH (< -1%), 2 = NEUTRAL

use crate::ml::features::FeatureNormalizer;
use crate::ml::types::Trend;
use pattern_core::{Candle, NUM_FEATURES};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Exp1, StandardNormal};

/// 윈도우 앞에 추가로 생성하는 캔들 수.
pub const EXTRA_CANDLES: usize = 20;

/// 레이블 판정 수익률 임계값.
pub const LABEL_THRESHOLD: f64 = 0.01;

const START_PRICE: f64 = 100.0;
const STEP_SCALE: f64 = 0.5;
const WICK_SCALE: f64 = 0.2;
const MEAN_VOLUME: f64 = 1000.0;

/// 레이블이 붙은 합성 샘플.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticSample {
    /// 클래스 인덱스 (`Trend::ALL` 순서)
    pub label: usize,
    /// 평탄화된 정규화 윈도우 (`seq_len * 5`)
    pub features: Vec<f64>,
}

impl SyntheticSample {
    /// 레이블에 해당하는 추세.
    pub fn trend(&self) -> Option<Trend> {
        Trend::from_index(self.label)
    }

    /// CSV 행으로 변환.
    pub fn to_csv_row(&self) -> String {
        let mut row = self.label.to_string();
        for value in &self.features {
            row.push(',');
            row.push_str(&value.to_string());
        }
        row
    }
}

/// CSV 헤더 `label,f0,...,f{seq_len*5-1}`.
pub fn csv_header(seq_len: usize) -> String {
    let mut header = String::from("label");
    for i in 0..seq_len * NUM_FEATURES {
        header.push_str(&format!(",f{}", i));
    }
    header
}

/// 종가 시퀀스 전체 수익률로 레이블 결정.
pub fn label_for(closes: &[f64]) -> usize {
    let (Some(first), Some(last)) = (closes.first(), closes.last()) else {
        return 2;
    };
    let ret = (last - first) / first;
    if ret > LABEL_THRESHOLD {
        0
    } else if ret < -LABEL_THRESHOLD {
        1
    } else {
        2
    }
}

/// 합성 샘플 생성기.
#[derive(Debug)]
pub struct SyntheticGenerator {
    rng: StdRng,
    normalizer: FeatureNormalizer,
}

impl SyntheticGenerator {
    /// 새 생성기 생성. 시드를 주면 출력이 재현됩니다.
    pub fn new(seq_len: usize, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            normalizer: FeatureNormalizer::new(seq_len, seq_len + EXTRA_CANDLES),
        }
    }

    /// 윈도우 길이.
    pub fn seq_len(&self) -> usize {
        self.normalizer.seq_len()
    }

    /// `seq_len + 20`개의 랜덤 워크 캔들 생성.
    pub fn candles(&mut self) -> Vec<Candle> {
        let len = self.seq_len() + EXTRA_CANDLES;
        let mut candles = Vec::with_capacity(len);
        let mut close = START_PRICE;
        let mut open = START_PRICE;

        for _ in 0..len {
            close += self.normal() * STEP_SCALE;
            let high = open.max(close) + self.normal().abs() * WICK_SCALE;
            let low = open.min(close) - self.normal().abs() * WICK_SCALE;
            let volume = self.rng.sample::<f64, _>(Exp1) * MEAN_VOLUME;

            candles.push(Candle::new(open, high, low, close, volume));
            open = close;
        }

        candles
    }

    /// 레이블이 붙은 샘플 하나 생성.
    pub fn sample(&mut self) -> SyntheticSample {
        let candles = self.candles();
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let features = self
            .normalizer
            .normalize(&candles)
            .map(|window| window.as_slice().to_vec())
            .unwrap_or_default();

        SyntheticSample {
            label: label_for(&closes),
            features,
        }
    }

    fn normal(&mut self) -> f64 {
        self.rng.sample(StandardNormal)
    }
}

impl Iterator for SyntheticGenerator {
    type Item = SyntheticSample;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.sample())
    }
}
