//! 설정 관리.
//!
//! 이 모듈은 애플리케이션 설정을 정의하고 관리합니다.
//! 기본값 → TOML 파일 → `PATTERN__` 접두사 환경 변수 순서로 덮어씁니다.

use crate::error::{CoreError, CoreResult};
use crate::logging::LogFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 모델 아티팩트 경로를 직접 지정하는 환경 변수.
pub const MODEL_PATH_ENV: &str = "ML_MODEL_PATH";

/// 기본 모델 아티팩트 파일명.
pub const DEFAULT_MODEL_PATH: &str = "saved_model.onnx";

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// 서버 설정
    pub server: ServerConfig,
    /// 로깅 설정
    pub logging: LoggingConfig,
    /// 추론 설정
    pub inference: InferenceConfig,
    /// 모델 아티팩트 설정
    pub model: ModelConfig,
    /// 훈련 프로세스 설정
    pub training: TrainingConfig,
}

/// 서버 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 바인딩할 호스트
    pub host: String,
    /// 리스닝할 포트
    pub port: u16,
    /// 요청 타임아웃 (초)
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            request_timeout_secs: 30,
        }
    }
}

impl ServerConfig {
    /// `host:port` 형식의 바인딩 주소.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// 추론 입력 설정.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// 모델 입력 윈도우 길이
    pub seq_len: usize,
    /// 정규화 전에 유지할 최근 캔들 최대 개수
    pub max_candles: usize,
    /// 요청에 필요한 최소 캔들 수
    pub min_candles: usize,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            seq_len: 60,
            max_candles: 500,
            min_candles: 50,
        }
    }
}

/// 모델 아티팩트 설정.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ModelConfig {
    /// 모델 파일 경로
    pub path: PathBuf,
    /// 로깅/식별을 위한 모델 이름
    pub name: String,
    /// 모델 입력 텐서 이름
    pub input_name: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_MODEL_PATH),
            name: "trend_lstm".to_string(),
            input_name: "input".to_string(),
        }
    }
}

/// 훈련 프로세스 설정.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// 실행할 명령 (프로그램 + 공백으로 구분된 인자)
    pub command: String,
    /// 작업 디렉토리
    pub working_dir: PathBuf,
    /// 최대 실행 시간 (초)
    pub timeout_secs: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            command: "python train.py".to_string(),
            working_dir: PathBuf::from("."),
            timeout_secs: 600,
        }
    }
}

impl TrainingConfig {
    /// 명령을 프로그램과 인자로 분리합니다. 빈 명령이면 `None`.
    pub fn program_and_args(&self) -> Option<(String, Vec<String>)> {
        let mut parts = self.command.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some((program, parts.collect()))
    }
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    ///
    /// 파일이 없으면 기본값과 환경 변수만 사용합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> CoreResult<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(
                config::Environment::with_prefix("PATTERN")
                    .separator("__")
                    .try_parsing(true),
            );

        let mut config: AppConfig = builder.build()?.try_deserialize()?;
        config.apply_model_path_override(std::env::var(MODEL_PATH_ENV).ok());
        config.validate()?;
        Ok(config)
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> CoreResult<Self> {
        Self::load("config/default.toml")
    }

    /// `ML_MODEL_PATH` 값이 있으면 모델 경로를 덮어씁니다.
    pub fn apply_model_path_override(&mut self, value: Option<String>) {
        if let Some(path) = value.filter(|p| !p.trim().is_empty()) {
            self.model.path = PathBuf::from(path);
        }
    }

    /// 설정 값의 일관성을 검증합니다.
    pub fn validate(&self) -> CoreResult<()> {
        let inference = &self.inference;
        if inference.seq_len == 0 {
            return Err(CoreError::Config("inference.seq_len must be > 0".to_string()));
        }
        if inference.max_candles < inference.seq_len {
            return Err(CoreError::Config(format!(
                "inference.max_candles ({}) must be >= seq_len ({})",
                inference.max_candles, inference.seq_len
            )));
        }
        if inference.min_candles == 0 {
            return Err(CoreError::Config(
                "inference.min_candles must be > 0".to_string(),
            ));
        }
        if self.training.program_and_args().is_none() {
            return Err(CoreError::Config(
                "training.command must not be empty".to_string(),
            ));
        }
        if self.training.timeout_secs == 0 {
            return Err(CoreError::Config(
                "training.timeout_secs must be > 0".to_string(),
            ));
        }
        self.logging.format.parse::<LogFormat>()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.inference.seq_len, 60);
        assert_eq!(config.inference.max_candles, 500);
        assert_eq!(config.inference.min_candles, 50);
        assert_eq!(config.model.path, PathBuf::from(DEFAULT_MODEL_PATH));
        assert_eq!(config.training.timeout_secs, 600);
        assert_eq!(config.server.bind_address(), "127.0.0.1:8000");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_model_path_override() {
        let mut config = AppConfig::default();
        config.apply_model_path_override(Some("models/custom.onnx".to_string()));
        assert_eq!(config.model.path, PathBuf::from("models/custom.onnx"));

        // 빈 값은 무시
        config.apply_model_path_override(Some("  ".to_string()));
        assert_eq!(config.model.path, PathBuf::from("models/custom.onnx"));

        config.apply_model_path_override(None);
        assert_eq!(config.model.path, PathBuf::from("models/custom.onnx"));
    }

    #[test]
    fn test_program_and_args() {
        let training = TrainingConfig {
            command: "python  train.py --epochs 10".to_string(),
            ..Default::default()
        };
        let (program, args) = training.program_and_args().unwrap();
        assert_eq!(program, "python");
        assert_eq!(args, vec!["train.py", "--epochs", "10"]);

        let empty = TrainingConfig {
            command: "   ".to_string(),
            ..Default::default()
        };
        assert!(empty.program_and_args().is_none());
    }

    #[test]
    fn test_validate_rejects_inconsistent_values() {
        let mut config = AppConfig::default();
        config.inference.max_candles = 10;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.inference.seq_len = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.training.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.training.command = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialize_partial_toml_section() {
        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(
                "[inference]\nseq_len = 30\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.inference.seq_len, 30);
        assert_eq!(config.inference.max_candles, 500);
        assert_eq!(config.server.port, 8000);
    }
}
