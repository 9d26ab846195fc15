// Repository trait for telemetry data access
use crate::domain::telemetry::{Record, TimeWindow};
use async_trait::async_trait;

#[async_trait]
pub trait TelemetryRepository: Send + Sync {
    /// Fetch every record one device reported inside `window`.
    async fn fetch_records(&self, device_id: u32, window: &TimeWindow) -> anyhow::Result<Vec<Record>>;
}
