//! 설정 파일 로드 통합 테스트

use pattern_core::AppConfig;
use std::path::PathBuf;

fn write_temp_config(contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("pattern-config-{}.toml", uuid::Uuid::new_v4()));
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_load_from_toml_file() {
    let path = write_temp_config(
        r#"
[server]
port = 9100

[inference]
seq_len = 40
max_candles = 200

[training]
command = "python train.py --fast"
timeout_secs = 30
"#,
    );

    let config = AppConfig::load(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(config.server.port, 9100);
    assert_eq!(config.inference.seq_len, 40);
    assert_eq!(config.inference.max_candles, 200);
    // 지정하지 않은 값은 기본값 유지
    assert_eq!(config.inference.min_candles, 50);
    assert_eq!(config.training.timeout_secs, 30);
}

#[test]
fn test_missing_file_falls_back_to_defaults() {
    let path = std::env::temp_dir().join(format!("missing-{}.toml", uuid::Uuid::new_v4()));
    let config = AppConfig::load(&path).unwrap();

    assert_eq!(config.inference.seq_len, 60);
    assert_eq!(config.training.timeout_secs, 600);
}

#[test]
fn test_invalid_file_values_are_rejected() {
    let path = write_temp_config("[inference]\nseq_len = 100\nmax_candles = 20\n");
    let result = AppConfig::load(&path);
    std::fs::remove_file(&path).ok();

    assert!(result.is_err());
}

#[test]
fn test_unknown_log_format_is_rejected() {
    let path = write_temp_config("[logging]\nformat = \"xml\"\n");
    let result = AppConfig::load(&path);
    std::fs::remove_file(&path).ok();

    let err = result.unwrap_err();
    assert!(err.to_string().contains("xml"));
}
