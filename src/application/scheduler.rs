// Refresh scheduler - runs the map refresh forever at a fixed pause
use crate::application::map_refresh_service::{MapRefreshService, TickOutcome};
use chrono::{FixedOffset, Utc};
use std::sync::Arc;
use std::time::Duration;

pub struct RefreshScheduler {
    service: Arc<MapRefreshService>,
    interval: Duration,
    offset: FixedOffset,
}

impl RefreshScheduler {
    pub fn new(service: Arc<MapRefreshService>, interval: Duration, offset: FixedOffset) -> Self {
        Self {
            service,
            interval,
            offset,
        }
    }

    /// Loop until the task is dropped. The pause is measured from the end of
    /// one tick to the start of the next.
    pub async fn run(self) {
        tracing::info!(interval_secs = self.interval.as_secs(), "map refresh loop started");
        loop {
            self.tick().await;
            tokio::time::sleep(self.interval).await;
        }
    }

    /// One isolated tick: errors and panics are logged, never propagated.
    async fn tick(&self) {
        let now = Utc::now().with_timezone(&self.offset);
        let service = self.service.clone();

        match tokio::spawn(async move { service.run_tick(now).await }).await {
            Ok(Ok(TickOutcome::Published { samples, viewport })) => {
                tracing::debug!(samples, zoom = viewport.zoom, "tick finished");
            }
            Ok(Ok(TickOutcome::NoSamples)) => {
                tracing::debug!("tick finished without samples");
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %format!("{:#}", e), "map update failed, retrying next tick");
            }
            Err(e) if e.is_panic() => {
                tracing::error!(error = %e, "map update panicked, retrying next tick");
            }
            Err(e) => {
                tracing::warn!(error = %e, "map update task was cancelled");
            }
        }
    }
}
