//! 차트 패턴 추론 CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # JSON 파일의 캔들로 예측
//! pattern predict --input data/candles.json
//!
//! # 합성 훈련 데이터 생성
//! pattern generate --samples 5000 --seq-len 60 --output data/train.csv --seed 42
//!
//! # 훈련 명령 실행
//! pattern train --config config/default.toml
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::error;

use pattern_cli::commands::generate::{generate_dataset, GenerateConfig};
use pattern_cli::commands::predict::run_predict;
use pattern_cli::commands::train::{report_outcome, run_training};
use pattern_core::{init_logging_from_env, AppConfig};

#[derive(Parser)]
#[command(name = "pattern")]
#[command(about = "Chart pattern inference CLI - 캔들 패턴/추세 예측 도구", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// JSON 파일의 캔들로 패턴과 추세 예측
    Predict {
        /// 입력 파일 (캔들 배열 또는 {"candles": [...]})
        #[arg(short, long)]
        input: PathBuf,

        /// 설정 파일
        #[arg(short, long, default_value = "config/default.toml")]
        config: PathBuf,
    },

    /// 합성 훈련 데이터셋 생성 (CSV)
    Generate {
        /// 샘플 수
        #[arg(short = 'n', long, default_value = "1000")]
        samples: usize,

        /// 윈도우 길이
        #[arg(short = 'l', long, default_value = "60")]
        seq_len: usize,

        /// 출력 파일 경로
        #[arg(short, long, default_value = "data/train.csv")]
        output: PathBuf,

        /// 난수 시드 (지정하면 재현 가능)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// 훈련 명령 실행 (시간 제한 적용)
    Train {
        /// 설정 파일
        #[arg(short, long, default_value = "config/default.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    // 트레이싱 초기화
    init_logging_from_env().map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Predict { input, config } => {
            let config = AppConfig::load(&config)?;
            match run_predict(&config, &input).await {
                Ok(response) => {
                    println!("{}", serde_json::to_string_pretty(&response)?);
                }
                Err(e) => {
                    error!("Prediction failed: {}", e);
                    return Err(e);
                }
            }
        }

        Commands::Generate {
            samples,
            seq_len,
            output,
            seed,
        } => {
            let config = GenerateConfig {
                samples,
                seq_len,
                output: output.clone(),
                seed,
            };

            let summary = generate_dataset(config)?;
            println!("\n데이터셋 생성 완료: {} 샘플", summary.written);
            println!("저장 위치: {}", output.display());
        }

        Commands::Train { config } => {
            let config = AppConfig::load(&config)?;
            let outcome = run_training(&config).await?;
            report_outcome(&outcome)?;
        }
    }

    Ok(())
}
