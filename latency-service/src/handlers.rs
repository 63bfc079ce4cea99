//! Handler模块

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use common::config::ResponseProfile;
use common::errors::ErrorBody;
use common::models::{LatencyReport, QueryLatencyResponse};

use crate::metrics;
use crate::state::AppState;

/// 执行固定查询并返回测得的延迟
#[utoipa::path(
    get,
    path = "/",
    tag = "latency",
    responses(
        (status = 200, description = "查询延迟与结果行", body = QueryLatencyResponse),
        (status = 500, description = "数据库错误", body = ErrorBody)
    )
)]
pub async fn query_latency(State(state): State<AppState>) -> Response {
    match state.probe.run().await {
        Ok(report) => {
            // text 配置下先记录指标，再构造响应
            if state.config.profile.metrics_enabled() {
                metrics::record_request(report.latency_seconds);
            }
            match state.config.profile {
                ResponseProfile::Json => {
                    Json(QueryLatencyResponse::from(report)).into_response()
                }
                ResponseProfile::Text => render_text_report(&report).into_response(),
            }
        }
        Err(err) => match state.config.profile {
            ResponseProfile::Json => err.into_response(),
            // text 配置不做结构化包装，按原始错误文本返回
            ResponseProfile::Text => {
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
            }
        },
    }
}

/// Renders the plain-text success body of the text profile.
fn render_text_report(report: &LatencyReport) -> String {
    let rows = serde_json::to_string(&report.rows).unwrap_or_else(|_| "[]".to_string());
    format!(
        "Query latency: {} seconds. Result: {}",
        report.latency_seconds, rows
    )
}

/// 健康检查端点
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses(
        (status = 200, description = "服务运行正常", body = HealthResponse)
    )
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "latency-service".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    })
}

/// 健康检查响应
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// 服务状态
    pub status: String,
    /// 服务名称
    pub service: String,
    /// 服务版本
    pub version: String,
    /// 当前时间戳
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use serde_json::json;

    use common::config::{AppConfig, DatabaseConfig};
    use common::errors::{AppError, AppResult};

    use super::*;
    use crate::service::QueryProbeTrait;

    struct StubProbe {
        outcome: Result<LatencyReport, String>,
    }

    #[async_trait]
    impl QueryProbeTrait for StubProbe {
        async fn run(&self) -> AppResult<LatencyReport> {
            match &self.outcome {
                Ok(report) => Ok(report.clone()),
                Err(message) => Err(AppError::Database(message.clone())),
            }
        }
    }

    fn state_with(
        profile: ResponseProfile,
        outcome: Result<LatencyReport, String>,
    ) -> AppState {
        let config = AppConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            metrics_port: 0,
            profile,
            database: DatabaseConfig::default(),
        };
        AppState::with_probe(config, Arc::new(StubProbe { outcome }))
    }

    fn sample_report() -> LatencyReport {
        LatencyReport {
            latency_seconds: 0.125,
            rows: vec![
                vec![json!(1), json!("alice")],
                vec![json!(2), json!("bob")],
                vec![json!(3), json!("carol")],
            ],
        }
    }

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_json_profile_success() {
        let state = state_with(ResponseProfile::Json, Ok(sample_report()));
        let response = query_latency(State(state)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body: serde_json::Value =
            serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["latency"], 0.125);
        assert_eq!(body["results"].as_array().unwrap().len(), 3);
        assert_eq!(body["results"][0][1], "alice");
    }

    #[tokio::test]
    async fn test_json_profile_failure_is_structured_500() {
        let state = state_with(
            ResponseProfile::Json,
            Err("Unknown database 'test'".to_string()),
        );
        let response = query_latency(State(state)).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: serde_json::Value =
            serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["error"], "Unknown database 'test'");
        assert!(body.get("latency").is_none());
    }

    #[tokio::test]
    async fn test_text_profile_success() {
        let state = state_with(ResponseProfile::Text, Ok(sample_report()));
        let response = query_latency(State(state)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_string(response).await;
        assert!(body.starts_with("Query latency: 0.125 seconds. Result: "));
        assert!(body.contains("\"carol\""));
    }

    #[tokio::test]
    async fn test_text_profile_failure_is_raw_500() {
        let state = state_with(
            ResponseProfile::Text,
            Err("connection refused".to_string()),
        );
        let response = query_latency(State(state)).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_string(response).await, "connection refused");
    }

    #[test]
    fn test_render_text_report() {
        let rendered = render_text_report(&LatencyReport {
            latency_seconds: 0.5,
            rows: vec![vec![json!(7)]],
        });
        assert_eq!(rendered, "Query latency: 0.5 seconds. Result: [[7]]");
    }
}
