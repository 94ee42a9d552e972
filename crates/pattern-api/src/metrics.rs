//! Prometheus 메트릭 설정 및 유틸리티.
//!
//! HTTP 요청 메트릭, 비즈니스 메트릭을 수집하고 `/metrics` 엔드포인트로 노출합니다.
//! 예측 카운터(`pattern_predictions_total`, `pattern_model_fallbacks_total`)는
//! 추론 서비스에서 직접 기록합니다.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};

/// Prometheus 메트릭 레코더를 설정하고 핸들을 반환합니다.
///
/// 레코더가 이미 설치되어 있으면 에러를 반환합니다.
pub fn setup_metrics_recorder() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new()
        // HTTP 요청 지속 시간 히스토그램 버킷 설정
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0],
        )?
        .install_recorder()
}

// ============================================================================
// HTTP 메트릭 헬퍼 함수
// ============================================================================

/// HTTP 요청 카운터 증가.
pub fn record_http_request(method: &str, path: &str) {
    counter!("http_requests_total", "method" => method.to_string(), "path" => path.to_string())
        .increment(1);
}

/// HTTP 응답 카운터 증가.
pub fn record_http_response(method: &str, path: &str, status: u16) {
    counter!(
        "http_responses_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// HTTP 요청 지속 시간 기록.
pub fn record_http_duration(method: &str, path: &str, duration_secs: f64) {
    histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_secs);
}

// ============================================================================
// 비즈니스 메트릭 헬퍼 함수
// ============================================================================

/// 훈련 실행 카운터 증가.
pub fn record_training_run(outcome: &str) {
    counter!("pattern_training_runs_total", "outcome" => outcome.to_string()).increment(1);
}

// ============================================================================
// 경로 라벨
// ============================================================================

/// 어떤 라우트에도 매칭되지 않은 요청의 경로 라벨.
pub const UNMATCHED_ROUTE: &str = "unmatched";

/// 메트릭 경로 라벨.
///
/// 매칭된 라우트 템플릿을 그대로 사용하고, 매칭되지 않은 요청(404)은
/// 하나의 라벨로 묶어 임의의 URL이 라벨 수를 늘리지 않도록 합니다.
pub fn route_label(matched_path: Option<&str>) -> &str {
    matched_path.unwrap_or(UNMATCHED_ROUTE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_label_uses_matched_template() {
        assert_eq!(route_label(Some("/predict")), "/predict");
        assert_eq!(route_label(Some("/health/ready")), "/health/ready");
    }

    #[test]
    fn test_route_label_unmatched() {
        assert_eq!(route_label(None), UNMATCHED_ROUTE);
    }
}
