//! 외부 훈련 프로세스 실행.
//!
//! 설정된 명령을 자식 프로세스로 실행하고 결과를 수집합니다.
//! 제한 시간을 넘기면 프로세스를 종료하고 실패로 처리합니다.
//! 모델 슬롯 무효화는 `Completed`인 경우에만 호출자가 수행합니다.

use crate::ml::{MlError, MlResult};
use pattern_core::{TrainingConfig, MODEL_PATH_ENV};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{error, info, warn};

/// 훈련 실행 결과.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TrainingOutcome {
    /// 정상 종료
    Completed {
        stdout: String,
        stderr: String,
        elapsed_ms: u64,
    },
    /// 0이 아닌 종료 코드 (시그널 종료 시 `None`)
    Failed {
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    },
    /// 제한 시간 초과
    TimedOut { timeout_secs: u64 },
}

impl TrainingOutcome {
    /// 성공 여부.
    pub fn is_success(&self) -> bool {
        matches!(self, TrainingOutcome::Completed { .. })
    }

    /// 메트릭 레이블.
    pub fn label(&self) -> &'static str {
        match self {
            TrainingOutcome::Completed { .. } => "completed",
            TrainingOutcome::Failed { .. } => "failed",
            TrainingOutcome::TimedOut { .. } => "timed_out",
        }
    }
}

/// 훈련 프로세스 실행기.
#[derive(Debug, Clone)]
pub struct TrainingRunner {
    program: String,
    args: Vec<String>,
    working_dir: PathBuf,
    timeout: Duration,
    model_path: PathBuf,
}

impl TrainingRunner {
    /// 설정에서 실행기 생성. 명령이 비어 있으면 에러.
    pub fn new(config: &TrainingConfig, model_path: impl AsRef<Path>) -> MlResult<Self> {
        let (program, args) = config
            .program_and_args()
            .ok_or_else(|| MlError::Training("Training command is empty".to_string()))?;

        Ok(Self {
            program,
            args,
            working_dir: config.working_dir.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            model_path: model_path.as_ref().to_path_buf(),
        })
    }

    /// 제한 시간 변경.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// 제한 시간.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// 훈련 명령을 실행하고 완료될 때까지 기다립니다.
    ///
    /// 프로세스를 시작할 수 없으면 `MlError::Training`을 반환합니다.
    pub async fn run(&self) -> MlResult<TrainingOutcome> {
        info!(
            program = %self.program,
            args = ?self.args,
            timeout_secs = self.timeout.as_secs(),
            "Starting training process"
        );

        let child = Command::new(&self.program)
            .args(&self.args)
            .current_dir(&self.working_dir)
            .env(MODEL_PATH_ENV, &self.model_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                MlError::Training(format!("Failed to start '{}': {}", self.program, e))
            })?;

        let started = Instant::now();
        // 시간 초과 시 future가 드롭되면서 kill_on_drop으로 프로세스가 종료됨
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result
                .map_err(|e| MlError::Training(format!("Failed to wait for process: {}", e)))?,
            Err(_) => {
                warn!(
                    timeout_secs = self.timeout.as_secs(),
                    "Training process timed out"
                );
                return Ok(TrainingOutcome::TimedOut {
                    timeout_secs: self.timeout.as_secs(),
                });
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if output.status.success() {
            let elapsed_ms = started.elapsed().as_millis() as u64;
            info!(elapsed_ms, "Training process completed");
            Ok(TrainingOutcome::Completed {
                stdout,
                stderr,
                elapsed_ms,
            })
        } else {
            error!(exit_code = ?output.status.code(), "Training process failed");
            Ok(TrainingOutcome::Failed {
                exit_code: output.status.code(),
                stdout,
                stderr,
            })
        }
    }
}
