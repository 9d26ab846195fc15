// Map refresh service - one fetch, aggregate and render pass
use crate::application::document_store::MapDocumentStore;
use crate::application::telemetry_repository::TelemetryRepository;
use crate::domain::telemetry::{Record, Sample, TimeWindow, aggregate};
use crate::domain::viewport::{Viewport, compute_viewport};
use crate::infrastructure::html_map::HtmlMapRenderer;
use anyhow::Context;
use chrono::{DateTime, FixedOffset};
use futures::StreamExt;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct RefreshSettings {
    pub device_ids: Vec<u32>,
    pub window: chrono::Duration,
    pub scale_max: f64,
    pub fetch_concurrency: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Published { samples: usize, viewport: Viewport },
    NoSamples,
}

#[derive(Clone)]
pub struct MapRefreshService {
    repository: Arc<dyn TelemetryRepository>,
    store: Arc<dyn MapDocumentStore>,
    renderer: HtmlMapRenderer,
    settings: RefreshSettings,
}

impl MapRefreshService {
    pub fn new(
        repository: Arc<dyn TelemetryRepository>,
        store: Arc<dyn MapDocumentStore>,
        renderer: HtmlMapRenderer,
        settings: RefreshSettings,
    ) -> Self {
        Self {
            repository,
            store,
            renderer,
            settings,
        }
    }

    /// Run one refresh for the window ending at `now`.
    ///
    /// With no samples the store is left untouched so the previous map
    /// stays visible.
    pub async fn run_tick(&self, now: DateTime<FixedOffset>) -> anyhow::Result<TickOutcome> {
        let window = TimeWindow::ending_at(now, self.settings.window);
        tracing::debug!(
            after = %window.after_param(),
            before = %window.before_param(),
            "started map update"
        );

        let samples = self.collect_samples(&window).await;
        let Some(viewport) = compute_viewport(&samples) else {
            tracing::debug!("no device reported in window, keeping previous map");
            return Ok(TickOutcome::NoSamples);
        };

        let document = self
            .renderer
            .render(&viewport, &samples, self.settings.scale_max, &now);
        self.store
            .publish(document)
            .await
            .context("failed to publish map document")?;

        tracing::info!(
            samples = samples.len(),
            zoom = viewport.zoom,
            session = %window.before_param(),
            "map updated"
        );

        Ok(TickOutcome::Published {
            samples: samples.len(),
            viewport,
        })
    }

    /// One sample per reporting device, in configured device order.
    pub async fn collect_samples(&self, window: &TimeWindow) -> Vec<Sample> {
        futures::stream::iter(self.settings.device_ids.iter().copied())
            .map(|device_id| async move {
                let records = self.fetch_device(device_id, window).await;
                aggregate(&records)
            })
            .buffered(self.settings.fetch_concurrency.max(1))
            .filter_map(|sample| async move { sample })
            .collect()
            .await
    }

    /// Records for one device; any failure counts as an empty window.
    async fn fetch_device(&self, device_id: u32, window: &TimeWindow) -> Vec<Record> {
        match self.repository.fetch_records(device_id, window).await {
            Ok(records) => records,
            Err(e) => {
                tracing::debug!(device_id, error = %e, "fetch failed, skipping device this tick");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config::MapSettings;
    use crate::infrastructure::map_store::MemoryMapStore;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves canned records per device and remembers the requested windows.
    #[derive(Default)]
    struct FakeRepository {
        records: HashMap<u32, Vec<Record>>,
        failing: Vec<u32>,
        requests: Mutex<Vec<(u32, String, String)>>,
    }

    #[async_trait]
    impl TelemetryRepository for FakeRepository {
        async fn fetch_records(&self, device_id: u32, window: &TimeWindow) -> anyhow::Result<Vec<Record>> {
            self.requests.lock().unwrap().push((
                device_id,
                window.after_param(),
                window.before_param(),
            ));
            if self.failing.contains(&device_id) {
                anyhow::bail!("connection refused");
            }
            Ok(self.records.get(&device_id).cloned().unwrap_or_default())
        }
    }

    fn now() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(9 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 5, 1, 12, 5, 30)
            .unwrap()
    }

    fn service(
        repository: FakeRepository,
        device_ids: Vec<u32>,
    ) -> (MapRefreshService, Arc<FakeRepository>, Arc<MemoryMapStore>) {
        service_with_store(repository, device_ids, Arc::new(MemoryMapStore::new()))
    }

    fn service_with_store(
        repository: FakeRepository,
        device_ids: Vec<u32>,
        store: Arc<MemoryMapStore>,
    ) -> (MapRefreshService, Arc<FakeRepository>, Arc<MemoryMapStore>) {
        let repository = Arc::new(repository);
        let service = MapRefreshService::new(
            repository.clone(),
            store.clone(),
            HtmlMapRenderer::new(MapSettings::default()),
            RefreshSettings {
                device_ids,
                window: chrono::Duration::minutes(10),
                scale_max: 80.0,
                fetch_concurrency: 4,
            },
        );
        (service, repository, store)
    }

    #[tokio::test]
    async fn test_single_reporting_device_is_published() {
        let mut records = HashMap::new();
        records.insert(
            1,
            vec![
                Record::new(1, 139.69, 35.67, 30.0),
                Record::new(1, 139.71, 35.69, 50.0),
            ],
        );
        let (service, _, store) = service(
            FakeRepository {
                records,
                ..Default::default()
            },
            vec![1, 2],
        );

        let outcome = service.run_tick(now()).await.unwrap();
        let TickOutcome::Published { samples, viewport } = outcome else {
            panic!("expected a published map, got {:?}", outcome);
        };
        assert_eq!(samples, 1);
        assert!((viewport.center_lat - 35.68).abs() < 1e-9);
        assert!((viewport.center_lon - 139.70).abs() < 1e-9);
        assert_eq!(viewport.zoom, 20);

        let html = store.current().await.unwrap().unwrap().into_html();
        assert_eq!(html.matches("class=\"marker\"").count(), 1);
        assert!(html.contains("data-device=\"1\""));
        assert!(html.contains("data-color=\"#dddcdc\""));
        assert!(html.contains("2024-05-01 12:05:30"));
    }

    #[tokio::test]
    async fn test_empty_tick_keeps_previous_document() {
        let mut records = HashMap::new();
        records.insert(1, vec![Record::new(1, 139.70, 35.68, 40.0)]);
        let (service, _, store) = service(
            FakeRepository {
                records,
                ..Default::default()
            },
            vec![1],
        );
        service.run_tick(now()).await.unwrap();
        let before = store.current().await.unwrap();
        assert!(before.is_some());

        let (empty_service, _, _) =
            service_with_store(FakeRepository::default(), vec![1, 2, 3], store.clone());
        let outcome = empty_service.run_tick(now()).await.unwrap();
        assert_eq!(outcome, TickOutcome::NoSamples);
        assert_eq!(store.current().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_no_samples_leaves_store_empty() {
        let (service, repository, store) = service(FakeRepository::default(), vec![1, 2]);

        assert_eq!(service.run_tick(now()).await.unwrap(), TickOutcome::NoSamples);
        assert_eq!(store.current().await.unwrap(), None);
        assert_eq!(repository.requests.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_failing_device_does_not_abort_tick() {
        let mut records = HashMap::new();
        records.insert(2, vec![Record::new(2, 139.70, 35.68, 10.0)]);
        records.insert(3, vec![Record::new(3, 139.71, 35.69, 70.0)]);
        let (service, _, store) = service(
            FakeRepository {
                records,
                failing: vec![1],
                ..Default::default()
            },
            vec![1, 2, 3],
        );

        let outcome = service.run_tick(now()).await.unwrap();
        assert!(matches!(outcome, TickOutcome::Published { samples: 2, .. }));
        assert!(store.current().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_samples_keep_device_order_and_window() {
        let mut records = HashMap::new();
        for id in [5, 3, 9] {
            records.insert(id, vec![Record::new(id, 139.7, 35.68, f64::from(id))]);
        }
        let (service, repository, _) = service(
            FakeRepository {
                records,
                ..Default::default()
            },
            vec![5, 3, 9],
        );

        let window = TimeWindow::ending_at(now(), chrono::Duration::minutes(10));
        let samples = service.collect_samples(&window).await;
        let ids: Vec<u32> = samples.iter().map(|s| s.device_id).collect();
        assert_eq!(ids, vec![5, 3, 9]);

        let requests = repository.requests.lock().unwrap();
        assert!(requests.iter().all(|(_, after, before)| {
            after == "2024-05-01 11:55:30" && before == "2024-05-01 12:05:30"
        }));
    }
}
