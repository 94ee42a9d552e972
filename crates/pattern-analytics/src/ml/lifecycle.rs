//! 모델 수명 주기 관리.
//!
//! 프로세스 전체에서 하나의 모델 슬롯을 관리합니다:
//! 미초기화 → (첫 요청 시) 로드 → (훈련 후) 무효화 → (다음 요청 시) 재로드.
//!
//! 로드 실패는 에러가 아니라 `Absent` 마커로 캐시되어 같은 epoch 안에서는 재시도하지 않습니다.
//! 새 모델은 완전히 로드된 뒤에 슬롯에 교체되므로 진행 중인 예측은 이전 모델을 계속 사용합니다.

use crate::ml::predictor::TrendModel;
use crate::ml::MlResult;
use pattern_core::ModelConfig;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// 슬롯에 캐시되는 모델 상태.
#[derive(Clone)]
pub enum ModelHandle {
    /// 로드된 모델
    Loaded(Arc<dyn TrendModel>),
    /// 사용할 수 있는 모델 없음
    Absent,
}

impl ModelHandle {
    /// 모델이 로드되어 있는지 확인.
    pub fn is_loaded(&self) -> bool {
        matches!(self, ModelHandle::Loaded(_))
    }

    /// 로드된 모델 이름.
    pub fn model_name(&self) -> Option<&str> {
        match self {
            ModelHandle::Loaded(model) => Some(model.name()),
            ModelHandle::Absent => None,
        }
    }
}

impl fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelHandle::Loaded(model) => f.debug_tuple("Loaded").field(&model.name()).finish(),
            ModelHandle::Absent => f.write_str("Absent"),
        }
    }
}

/// 영속화된 모델 아티팩트를 로드하는 trait.
pub trait ModelLoader: Send + Sync {
    /// 모델을 로드합니다.
    fn load(&self) -> MlResult<Arc<dyn TrendModel>>;

    /// 로드 대상 설명 (로깅용).
    fn describe(&self) -> String;
}

/// ONNX 아티팩트 로더.
#[derive(Debug, Clone)]
pub struct OnnxModelLoader {
    config: ModelConfig,
}

impl OnnxModelLoader {
    /// 새 로더 생성.
    pub fn new(config: ModelConfig) -> Self {
        Self { config }
    }

    /// 모델 설정 반환.
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }
}

impl ModelLoader for OnnxModelLoader {
    #[cfg(feature = "ml")]
    fn load(&self) -> MlResult<Arc<dyn TrendModel>> {
        let model = crate::ml::predictor::OnnxTrendModel::load(
            &self.config.path,
            self.config.name.clone(),
            self.config.input_name.clone(),
        )?;
        Ok(Arc::new(model))
    }

    #[cfg(not(feature = "ml"))]
    fn load(&self) -> MlResult<Arc<dyn TrendModel>> {
        Err(crate::ml::MlError::ModelLoad(format!(
            "ONNX runtime not enabled (build with the `ml` feature), cannot load {}",
            self.config.path.display()
        )))
    }

    fn describe(&self) -> String {
        self.config.path.display().to_string()
    }
}

/// 슬롯 상태 요약.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct ModelStatus {
    /// "uninitialized", "loaded", "absent"
    pub state: String,
    /// 로드된 모델 이름
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    /// 무효화 횟수
    pub epoch: u64,
    /// 로드 시도 횟수
    pub load_attempts: u64,
}

/// 프로세스 전체에서 공유하는 단일 모델 슬롯.
pub struct ModelSlot {
    loader: Box<dyn ModelLoader>,
    slot: RwLock<Option<ModelHandle>>,
    epoch: AtomicU64,
    load_attempts: AtomicU64,
}

impl ModelSlot {
    /// 새 슬롯 생성. 모델은 첫 요청 시 로드됩니다.
    pub fn new(loader: impl ModelLoader + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            slot: RwLock::new(None),
            epoch: AtomicU64::new(0),
            load_attempts: AtomicU64::new(0),
        }
    }

    /// ONNX 로더를 사용하는 슬롯 생성.
    pub fn onnx(config: ModelConfig) -> Self {
        Self::new(OnnxModelLoader::new(config))
    }

    /// 캐시된 모델 핸들을 반환하고, 없으면 로드합니다.
    ///
    /// 동시에 들어온 첫 요청들은 한 번의 로드만 수행합니다.
    pub async fn get_or_load(&self) -> ModelHandle {
        if let Some(handle) = self.slot.read().await.as_ref() {
            return handle.clone();
        }

        let mut guard = self.slot.write().await;
        // 쓰기 락을 기다리는 동안 다른 요청이 로드했을 수 있음
        if let Some(handle) = guard.as_ref() {
            return handle.clone();
        }

        let attempt = self.load_attempts.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(attempt, artifact = %self.loader.describe(), "Loading model");

        let handle = match self.loader.load() {
            Ok(model) => {
                info!(model = model.name(), epoch = self.epoch(), "Model loaded");
                ModelHandle::Loaded(model)
            }
            Err(e) => {
                warn!(
                    error = %e,
                    artifact = %self.loader.describe(),
                    "Model unavailable, using rule-based fallback"
                );
                ModelHandle::Absent
            }
        };

        *guard = Some(handle.clone());
        handle
    }

    /// 캐시를 비웁니다. 다음 `get_or_load`에서 다시 로드합니다.
    ///
    /// 이미 핸들을 가져간 예측은 영향을 받지 않습니다.
    pub async fn invalidate(&self) {
        let mut guard = self.slot.write().await;
        *guard = None;
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        info!(epoch, "Model slot invalidated");
    }

    /// 현재 epoch (무효화 횟수).
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// 누적 로드 시도 횟수.
    pub fn load_attempts(&self) -> u64 {
        self.load_attempts.load(Ordering::SeqCst)
    }

    /// 로드를 시도하지 않고 현재 상태를 반환.
    pub async fn describe(&self) -> ModelStatus {
        let guard = self.slot.read().await;
        let (state, model_name) = match guard.as_ref() {
            None => ("uninitialized", None),
            Some(ModelHandle::Absent) => ("absent", None),
            Some(ModelHandle::Loaded(model)) => ("loaded", Some(model.name().to_string())),
        };

        ModelStatus {
            state: state.to_string(),
            model_name,
            epoch: self.epoch(),
            load_attempts: self.load_attempts(),
        }
    }
}

impl fmt::Debug for ModelSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelSlot")
            .field("loader", &self.loader.describe())
            .field("epoch", &self.epoch())
            .field("load_attempts", &self.load_attempts())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::predictor::MockTrendModel;
    use crate::ml::MlError;
    use std::sync::atomic::AtomicBool;

    /// 로드 결과를 테스트에서 바꿀 수 있는 로더.
    struct ToggleLoader {
        available: Arc<AtomicBool>,
    }

    impl ModelLoader for ToggleLoader {
        fn load(&self) -> MlResult<Arc<dyn TrendModel>> {
            if self.available.load(Ordering::SeqCst) {
                Ok(Arc::new(
                    MockTrendModel::with_output(vec![0.1, 0.8, 0.1]).with_name("retrained"),
                ))
            } else {
                Err(MlError::ModelLoad("no artifact".to_string()))
            }
        }

        fn describe(&self) -> String {
            "toggle".to_string()
        }
    }

    fn toggle_slot(available: bool) -> (ModelSlot, Arc<AtomicBool>) {
        let flag = Arc::new(AtomicBool::new(available));
        let slot = ModelSlot::new(ToggleLoader {
            available: flag.clone(),
        });
        (slot, flag)
    }

    #[tokio::test]
    async fn test_absent_is_cached() {
        let (slot, _) = toggle_slot(false);

        assert!(!slot.get_or_load().await.is_loaded());
        assert!(!slot.get_or_load().await.is_loaded());
        assert_eq!(slot.load_attempts(), 1);
        assert_eq!(slot.describe().await.state, "absent");
    }

    #[tokio::test]
    async fn test_invalidate_triggers_reload() {
        let (slot, flag) = toggle_slot(false);

        assert!(!slot.get_or_load().await.is_loaded());

        flag.store(true, Ordering::SeqCst);
        // 무효화 전에는 캐시된 Absent 유지
        assert!(!slot.get_or_load().await.is_loaded());

        slot.invalidate().await;
        assert_eq!(slot.epoch(), 1);
        assert_eq!(slot.describe().await.state, "uninitialized");

        let handle = slot.get_or_load().await;
        assert_eq!(handle.model_name(), Some("retrained"));
        assert_eq!(slot.load_attempts(), 2);

        let status = slot.describe().await;
        assert_eq!(status.state, "loaded");
        assert_eq!(status.model_name.as_deref(), Some("retrained"));
    }

    #[tokio::test]
    async fn test_in_flight_handle_survives_invalidate() {
        let (slot, _) = toggle_slot(true);

        let handle = slot.get_or_load().await;
        slot.invalidate().await;

        // 이전 핸들은 여전히 유효
        assert_eq!(handle.model_name(), Some("retrained"));
    }

    #[tokio::test]
    async fn test_describe_does_not_load() {
        let (slot, _) = toggle_slot(true);
        let status = slot.describe().await;
        assert_eq!(status.state, "uninitialized");
        assert_eq!(status.load_attempts, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_requests_load_once() {
        let (slot, _) = toggle_slot(true);
        let slot = Arc::new(slot);

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let slot = slot.clone();
                tokio::spawn(async move { slot.get_or_load().await.is_loaded() })
            })
            .collect();

        for task in tasks {
            assert!(task.await.unwrap());
        }
        assert_eq!(slot.load_attempts(), 1);
    }

    #[cfg(not(feature = "ml"))]
    #[tokio::test]
    async fn test_onnx_loader_without_runtime_is_absent() {
        let slot = ModelSlot::onnx(ModelConfig::default());
        assert!(!slot.get_or_load().await.is_loaded());
    }

    #[cfg(feature = "ml")]
    #[tokio::test]
    async fn test_onnx_loader_missing_file_is_absent() {
        let slot = ModelSlot::onnx(ModelConfig {
            path: "nonexistent/model.onnx".into(),
            ..Default::default()
        });
        assert!(!slot.get_or_load().await.is_loaded());
    }
}
