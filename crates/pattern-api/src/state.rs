//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! AppState는 Arc로 래핑되어 여러 요청 간에 안전하게 공유됩니다.
//! 모델 슬롯은 추론 서비스와 훈련 핸들러가 같은 인스턴스를 사용합니다.

use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use pattern_analytics::ml::{InferenceService, MlResult, ModelSlot, TrainingRunner};
use pattern_core::AppConfig;

/// 애플리케이션 공유 상태.
#[derive(Clone)]
pub struct AppState {
    /// 로드된 설정
    pub config: Arc<AppConfig>,

    /// 모델 슬롯 - 지연 로드, 훈련 후 무효화
    pub model_slot: Arc<ModelSlot>,

    /// 추론 서비스 - 요청 검증, 정규화, 예측
    pub inference: InferenceService,

    /// 훈련 프로세스 실행기
    pub training_runner: TrainingRunner,

    /// 동시 훈련 방지 락
    pub training_lock: Arc<Mutex<()>>,

    /// 종료 토큰 - 취소되면 진행 중인 훈련 프로세스를 중단
    pub shutdown: CancellationToken,

    /// 서버 시작 시각
    pub started_at: chrono::DateTime<chrono::Utc>,

    /// API 버전
    pub version: String,
}

impl AppState {
    /// 설정에서 상태 생성. ONNX 로더를 사용합니다.
    pub fn new(config: AppConfig) -> MlResult<Self> {
        let slot = Arc::new(ModelSlot::onnx(config.model.clone()));
        Self::with_model_slot(config, slot)
    }

    /// 주어진 모델 슬롯으로 상태 생성.
    pub fn with_model_slot(config: AppConfig, model_slot: Arc<ModelSlot>) -> MlResult<Self> {
        let inference = InferenceService::new(config.inference.clone(), model_slot.clone());
        let training_runner = TrainingRunner::new(&config.training, &config.model.path)?;

        Ok(Self {
            config: Arc::new(config),
            model_slot,
            inference,
            training_runner,
            training_lock: Arc::new(Mutex::new(())),
            shutdown: CancellationToken::new(),
            started_at: chrono::Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }

    /// 훈련 실행기 교체.
    pub fn with_training_runner(mut self, runner: TrainingRunner) -> Self {
        self.training_runner = runner;
        self
    }

    /// 서버 업타임(초).
    pub fn uptime_secs(&self) -> i64 {
        chrono::Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds()
    }
}

/// 테스트용 상태 생성.
///
/// 모델 아티팩트가 없는 슬롯을 사용하므로 예측은 규칙 기반 fallback으로 처리됩니다.
#[cfg(any(test, feature = "test-utils"))]
pub fn create_test_state() -> AppState {
    use pattern_analytics::ml::{MlError, ModelLoader, TrendModel};

    struct NoArtifact;

    impl ModelLoader for NoArtifact {
        fn load(&self) -> MlResult<Arc<dyn TrendModel>> {
            Err(MlError::ModelLoad("no artifact in test state".to_string()))
        }

        fn describe(&self) -> String {
            "test".to_string()
        }
    }

    create_test_state_with_loader(NoArtifact)
}

/// 주어진 로더로 테스트용 상태 생성.
#[cfg(any(test, feature = "test-utils"))]
pub fn create_test_state_with_loader(
    loader: impl pattern_analytics::ml::ModelLoader + 'static,
) -> AppState {
    let mut config = AppConfig::default();
    config.training.command = "true".to_string();

    AppState::with_model_slot(config, Arc::new(ModelSlot::new(loader)))
        .expect("default test config is valid")
}
