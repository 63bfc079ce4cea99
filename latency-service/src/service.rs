//! 查询延迟探测服务模块

use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::mysql::{MySqlConnection, MySqlRow};
use sqlx::{Column, Connection, Row, TypeInfo, ValueRef};

use common::config::DatabaseConfig;
use common::errors::{AppError, AppResult};
use common::models::LatencyReport;

/// 固定探测查询，有意写死而非配置项
pub const PROBE_QUERY: &str = "SELECT * FROM users";

/// 延迟探测 Trait
#[async_trait]
pub trait QueryProbeTrait: Send + Sync {
    /// 执行一次探测：建立连接、计时执行固定查询并取回全部行
    async fn run(&self) -> AppResult<LatencyReport>;
}

/// MySQL 查询延迟探测服务
pub struct QueryProbe {
    database: DatabaseConfig,
}

impl QueryProbe {
    /// 创建新的探测服务实例
    pub fn new(database: DatabaseConfig) -> Self {
        Self { database }
    }
}

#[async_trait]
impl QueryProbeTrait for QueryProbe {
    async fn run(&self) -> AppResult<LatencyReport> {
        // 每次请求独立建立连接，不复用、不共享
        let mut conn = MySqlConnection::connect(&self.database.url())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let started = Instant::now();
        let fetched = sqlx::query(PROBE_QUERY).fetch_all(&mut conn).await;
        let latency_seconds = started.elapsed().as_secs_f64();

        match fetched {
            Ok(fetched_rows) => {
                // 成功路径显式关闭连接；失败路径由 drop 释放
                if let Err(e) = conn.close().await {
                    tracing::warn!(error = %e, "关闭数据库连接失败");
                }

                let rows: Vec<Vec<serde_json::Value>> =
                    fetched_rows.iter().map(row_values).collect();
                tracing::info!(latency_seconds, row_count = rows.len(), "探测完成");

                Ok(LatencyReport {
                    latency_seconds,
                    rows,
                })
            }
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }
}

/// Decodes one row into JSON values, column by column.
fn row_values(row: &MySqlRow) -> Vec<serde_json::Value> {
    (0..row.len()).map(|index| column_value(row, index)).collect()
}

/// Decodes a single column by its MySQL type name.
///
/// Integers become JSON numbers, temporal types their driver textual form,
/// JSON columns pass through verbatim. Anything unrecognized is read as
/// UTF-8 text, with a lossy fallback for binary payloads. A value that
/// fails every decode becomes null rather than failing the request.
fn column_value(row: &MySqlRow, index: usize) -> serde_json::Value {
    use serde_json::Value;

    let raw = match row.try_get_raw(index) {
        Ok(raw) => raw,
        Err(_) => return Value::Null,
    };
    if raw.is_null() {
        return Value::Null;
    }

    match row.column(index).type_info().name() {
        "BOOLEAN" => row
            .try_get::<bool, _>(index)
            .map(Value::from)
            .unwrap_or(Value::Null),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => row
            .try_get::<i64, _>(index)
            .map(Value::from)
            .unwrap_or(Value::Null),
        "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
        | "BIGINT UNSIGNED" | "YEAR" | "BIT" => row
            .try_get::<u64, _>(index)
            .map(Value::from)
            .unwrap_or(Value::Null),
        "FLOAT" => row
            .try_get::<f32, _>(index)
            .map(|v| float_value(v as f64))
            .unwrap_or(Value::Null),
        "DOUBLE" => row
            .try_get::<f64, _>(index)
            .map(float_value)
            .unwrap_or(Value::Null),
        "DATE" => row
            .try_get::<NaiveDate, _>(index)
            .map(|v| Value::String(v.to_string()))
            .unwrap_or_else(|_| text_value(row, index)),
        "TIME" => row
            .try_get::<NaiveTime, _>(index)
            .map(|v| Value::String(v.to_string()))
            .unwrap_or_else(|_| text_value(row, index)),
        "DATETIME" => row
            .try_get::<NaiveDateTime, _>(index)
            .map(|v| Value::String(v.to_string()))
            .unwrap_or_else(|_| text_value(row, index)),
        "TIMESTAMP" => row
            .try_get::<DateTime<Utc>, _>(index)
            .map(|v| Value::String(v.to_rfc3339()))
            .unwrap_or_else(|_| text_value(row, index)),
        "JSON" => row
            .try_get::<serde_json::Value, _>(index)
            .unwrap_or(Value::Null),
        _ => text_value(row, index),
    }
}

/// Reads a column as text, falling back to lossy UTF-8 for binary data.
fn text_value(row: &MySqlRow, index: usize) -> serde_json::Value {
    if let Ok(text) = row.try_get::<String, _>(index) {
        return serde_json::Value::String(text);
    }
    match row.try_get::<Vec<u8>, _>(index) {
        Ok(bytes) => serde_json::Value::String(String::from_utf8_lossy(&bytes).into_owned()),
        Err(_) => serde_json::Value::Null,
    }
}

/// JSON numbers cannot carry NaN or infinity; those become null.
fn float_value(v: f64) -> serde_json::Value {
    serde_json::Number::from_f64(v)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_query_is_the_fixed_statement() {
        assert_eq!(PROBE_QUERY, "SELECT * FROM users");
    }

    #[test]
    fn test_float_value_rejects_non_finite() {
        assert_eq!(float_value(1.5), serde_json::json!(1.5));
        assert_eq!(float_value(f64::NAN), serde_json::Value::Null);
        assert_eq!(float_value(f64::INFINITY), serde_json::Value::Null);
    }
}
