//! Latency probe models.
//!
//! Contains the request-scoped measurement and its JSON wire shape.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Outcome of one probe: the measured latency plus all fetched rows.
///
/// Lives only for the duration of one handler invocation.
#[derive(Debug, Clone)]
pub struct LatencyReport {
    /// Wall-clock seconds spent executing and fetching the query.
    pub latency_seconds: f64,

    /// Fetched rows (each row is a vector of JSON values).
    pub rows: Vec<Vec<serde_json::Value>>,
}

impl LatencyReport {
    /// Number of rows the query returned.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Success body of the JSON profile.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct QueryLatencyResponse {
    /// Query latency in seconds.
    pub latency: f64,

    /// Row data (each row is a vector of JSON values).
    pub results: Vec<Vec<serde_json::Value>>,
}

impl From<LatencyReport> for QueryLatencyResponse {
    fn from(report: LatencyReport) -> Self {
        Self {
            latency: report.latency_seconds,
            results: report.rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_report_into_response_shape() {
        let report = LatencyReport {
            latency_seconds: 0.0421,
            rows: vec![vec![json!(1), json!("alice")], vec![json!(2), json!("bob")]],
        };
        assert_eq!(report.row_count(), 2);

        let response = QueryLatencyResponse::from(report);
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["latency"], 0.0421);
        assert_eq!(value["results"][1][1], "bob");
    }
}
