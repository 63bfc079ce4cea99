//! 指标采集与导出模块
//!
//! text 配置下维护进程级指标注册表，并在独立端口以 Prometheus
//! 文本格式对外暴露。

use axum::{extract::State, response::IntoResponse, routing::get, Router};
use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tokio::net::TcpListener;
use tracing::info;

/// 成功处理的探测请求总数
pub const REQUESTS_TOTAL: &str = "latency_probe_requests_total";
/// 探测延迟分布（秒）
pub const QUERY_DURATION_SECONDS: &str = "latency_probe_query_duration_seconds";

/// Installs the process-wide Prometheus recorder and registers metric
/// descriptions. Must be called once, at startup, before any request.
pub fn install_recorder() -> PrometheusHandle {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("安装 Prometheus 记录器失败");

    describe_counter!(
        REQUESTS_TOTAL,
        Unit::Count,
        "Total successfully handled probe requests"
    );
    describe_histogram!(
        QUERY_DURATION_SECONDS,
        Unit::Seconds,
        "Distribution of probe query latency in seconds"
    );

    handle
}

/// Records one successful probe: bumps the request counter and observes
/// the measured latency. Safe under concurrent handler invocations.
pub fn record_request(latency_seconds: f64) {
    counter!(REQUESTS_TOTAL).increment(1);
    histogram!(QUERY_DURATION_SECONDS).record(latency_seconds);
}

/// Serves `GET /metrics` on the dedicated metrics listener.
pub async fn serve(handle: PrometheusHandle, addr: String) {
    let app = router(handle);

    info!(address = %addr, "启动指标监听");
    let listener = TcpListener::bind(&addr).await.expect("绑定指标地址失败");
    axum::serve(listener, app).await.expect("指标服务启动失败");
}

fn router(handle: PrometheusHandle) -> Router {
    Router::new()
        .route("/metrics", get(render_metrics))
        .with_state(handle)
}

/// Renders the registry; reading never mutates counter or summary state.
async fn render_metrics(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    handle.render()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_without_recorder_is_a_noop() {
        // No recorder installed in unit tests; recording must not panic.
        record_request(0.01);
    }
}
