//! 훈련 실행 명령어.
//!
//! 설정된 훈련 명령을 시간 제한과 함께 실행하고 결과를 출력합니다.
//!
//! # 사용 예시
//!
//! ```bash
//! pattern train --config config/default.toml
//! ```

use anyhow::{anyhow, Result};
use tracing::{error, info};

use pattern_analytics::ml::{TrainingOutcome, TrainingRunner};
use pattern_core::AppConfig;

/// 훈련 명령을 실행합니다.
///
/// 프로세스 시작 실패만 에러로 반환하고, 종료 코드나 시간 초과는 결과로 돌려줍니다.
pub async fn run_training(config: &AppConfig) -> Result<TrainingOutcome> {
    let runner = TrainingRunner::new(&config.training, &config.model.path)?;

    info!(
        command = %config.training.command,
        timeout_secs = runner.timeout().as_secs(),
        model_path = %config.model.path.display(),
        "Running training command"
    );

    let outcome = runner.run().await?;
    Ok(outcome)
}

/// 훈련 결과를 출력하고 실패 시 에러로 변환합니다.
pub fn report_outcome(outcome: &TrainingOutcome) -> Result<()> {
    match outcome {
        TrainingOutcome::Completed {
            stdout,
            stderr,
            elapsed_ms,
        } => {
            print_output(stdout, stderr);
            info!(elapsed_ms, "Training completed");
            println!("\n훈련 완료: {:.1}초", *elapsed_ms as f64 / 1000.0);
            Ok(())
        }
        TrainingOutcome::Failed {
            exit_code,
            stdout,
            stderr,
        } => {
            print_output(stdout, stderr);
            error!(?exit_code, "Training failed");
            match exit_code {
                Some(code) => Err(anyhow!("Training process exited with code {}", code)),
                None => Err(anyhow!("Training process terminated by signal")),
            }
        }
        TrainingOutcome::TimedOut { timeout_secs } => {
            error!(timeout_secs, "Training timed out");
            Err(anyhow!(
                "Training did not finish within {} seconds",
                timeout_secs
            ))
        }
    }
}

fn print_output(stdout: &str, stderr: &str) {
    if !stdout.trim().is_empty() {
        println!("{}", stdout.trim_end());
    }
    if !stderr.trim().is_empty() {
        eprintln!("{}", stderr.trim_end());
    }
}
