// HTTP export repository - pulls device records from the sensor server
use crate::application::telemetry_repository::TelemetryRepository;
use crate::domain::telemetry::{Record, TimeWindow};
use crate::infrastructure::config::{SourceSettings, fill_template};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request to sensor server failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("sensor server answered {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("sensor server returned malformed JSON: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("record {index}: {reason}")]
    Schema { index: usize, reason: String },
}

#[derive(Debug, Clone)]
pub struct ExportRepository {
    client: reqwest::Client,
    address: String,
    endpoint: String,
    value_field: String,
}

impl ExportRepository {
    pub fn new(settings: &SourceSettings) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout())
            .build()?;

        Ok(Self {
            client,
            address: settings.address.trim_end_matches('/').to_string(),
            endpoint: settings.endpoint.clone(),
            value_field: settings.value_field.clone(),
        })
    }

    fn build_export_url(&self, device_id: u32, window: &TimeWindow) -> String {
        let mut vars = HashMap::new();
        vars.insert("id", device_id.to_string());
        vars.insert("after", urlencoding::encode(&window.after_param()).into_owned());
        vars.insert("before", urlencoding::encode(&window.before_param()).into_owned());

        format!("{}{}", self.address, fill_template(&self.endpoint, &vars))
    }

    async fn fetch(&self, device_id: u32, window: &TimeWindow) -> Result<Vec<Record>, FetchError> {
        let url = self.build_export_url(device_id, window);
        tracing::debug!(device_id, %url, "fetching device records");

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status { status, body });
        }

        let bytes = response.bytes().await?;
        let rows: Vec<serde_json::Map<String, Value>> = serde_json::from_slice(&bytes)?;

        rows.iter()
            .enumerate()
            .map(|(index, row)| self.parse_record(device_id, index, row))
            .collect()
    }

    fn parse_record(
        &self,
        device_id: u32,
        index: usize,
        row: &serde_json::Map<String, Value>,
    ) -> Result<Record, FetchError> {
        let number = |field: &str| -> Result<f64, FetchError> {
            match row.get(field) {
                Some(Value::Number(n)) => n.as_f64().ok_or_else(|| FetchError::Schema {
                    index,
                    reason: format!("field `{}` is out of range", field),
                }),
                Some(Value::String(s)) => s.trim().parse().map_err(|_| FetchError::Schema {
                    index,
                    reason: format!("field `{}` is not numeric: {:?}", field, s),
                }),
                Some(other) => Err(FetchError::Schema {
                    index,
                    reason: format!("field `{}` has unexpected value {}", field, other),
                }),
                None => Err(FetchError::Schema {
                    index,
                    reason: format!("missing field `{}`", field),
                }),
            }
        };

        Ok(Record::new(
            device_id,
            number("longitude")?,
            number("latitude")?,
            number(self.value_field.as_str())?,
        ))
    }
}

#[async_trait]
impl TelemetryRepository for ExportRepository {
    async fn fetch_records(&self, device_id: u32, window: &TimeWindow) -> anyhow::Result<Vec<Record>> {
        Ok(self.fetch(device_id, window).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::StatusCode as AxumStatus;
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::{Json, Router};
    use chrono::{Duration, FixedOffset, TimeZone};
    use serde_json::json;

    fn window() -> TimeWindow {
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        let now = tokyo.with_ymd_and_hms(2024, 5, 1, 12, 5, 30).unwrap();
        TimeWindow::ending_at(now, Duration::minutes(10))
    }

    fn settings(address: String) -> SourceSettings {
        SourceSettings {
            address,
            value_field: "rssi".to_string(),
            timeout_secs: 1,
            ..SourceSettings::default()
        }
    }

    async fn export_data(Query(params): Query<HashMap<String, String>>) -> axum::response::Response {
        match params.get("id").map(String::as_str) {
            Some("1") => Json(json!([
                {"id": 1, "longitude": 139.69, "latitude": 35.67, "rssi": 30, "timestamp": "2024-05-01 12:00:00"},
                {"id": 1, "longitude": 139.71, "latitude": 35.69, "rssi": "50"}
            ]))
            .into_response(),
            Some("2") => Json(json!([])).into_response(),
            Some("3") => Json(json!([{"longitude": 139.7, "latitude": 35.6}])).into_response(),
            Some("4") => "not json".into_response(),
            Some("5") => {
                tokio::time::sleep(std::time::Duration::from_secs(3)).await;
                Json(json!([])).into_response()
            }
            _ => (AxumStatus::INTERNAL_SERVER_ERROR, "boom").into_response(),
        }
    }

    async fn spawn_sensor_server() -> String {
        let router = Router::new().route("/database/export_data", get(export_data));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_build_export_url() {
        let repo = ExportRepository::new(&settings("http://127.0.0.1:5000/".to_string())).unwrap();
        assert_eq!(
            repo.build_export_url(42, &window()),
            "http://127.0.0.1:5000/database/export_data?id=42&after=2024-05-01%2011%3A55%3A30&before=2024-05-01%2012%3A05%3A30"
        );
    }

    #[tokio::test]
    async fn test_fetch_parses_records() {
        let repo = ExportRepository::new(&settings(spawn_sensor_server().await)).unwrap();
        let records = repo.fetch(1, &window()).await.unwrap();

        assert_eq!(
            records,
            vec![
                Record::new(1, 139.69, 35.67, 30.0),
                Record::new(1, 139.71, 35.69, 50.0),
            ]
        );
    }

    #[tokio::test]
    async fn test_fetch_empty_array() {
        let repo = ExportRepository::new(&settings(spawn_sensor_server().await)).unwrap();
        assert!(repo.fetch(2, &window()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failures_are_classified() {
        let repo = ExportRepository::new(&settings(spawn_sensor_server().await)).unwrap();

        assert!(matches!(
            repo.fetch(3, &window()).await,
            Err(FetchError::Schema { index: 0, .. })
        ));
        assert!(matches!(repo.fetch(4, &window()).await, Err(FetchError::Decode(_))));
        assert!(matches!(
            repo.fetch(9, &window()).await,
            Err(FetchError::Status { .. })
        ));
    }

    #[tokio::test]
    async fn test_fetch_times_out() {
        let repo = ExportRepository::new(&settings(spawn_sensor_server().await)).unwrap();

        match repo.fetch(5, &window()).await {
            Err(FetchError::Transport(e)) => assert!(e.is_timeout()),
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        let repo = ExportRepository::new(&settings("http://127.0.0.1:9".to_string())).unwrap();
        assert!(repo.fetch_records(1, &window()).await.is_err());
    }
}
