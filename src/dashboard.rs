use std::sync::Arc;

use chrono::{Local, NaiveTime};
use smol_str::SmolStr;
use tracing::info;

use crate::cache::FreshnessCache;
use crate::data::{blocking, SnapshotProvider};
use crate::error::Result;
use crate::policy::{FreshnessPolicy, Verdict};
use crate::render::{content_hash, ImageRenderer};
use crate::schedule::PollSchedule;
use crate::snapshot::DashboardSnapshot;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageRequest {
    /// Token of the image the client already holds.
    pub token: Option<String>,
    /// A user-triggered action; always forces a fresh render.
    pub action: Option<SmolStr>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedImage {
    pub bytes: Vec<u8>,
    pub token: String,
    pub poll_minutes: u32,
    pub actions: Vec<SmolStr>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageOutcome {
    NotModified { poll_minutes: u32 },
    Fresh(RenderedImage),
}

/// Serves dashboard images, re-rendering only when the data behind the
/// image the client holds has changed enough to matter.
pub struct Dashboard {
    provider: Arc<dyn SnapshotProvider>,
    renderer: Arc<dyn ImageRenderer>,
    cache: FreshnessCache<Arc<DashboardSnapshot>>,
    policy: FreshnessPolicy,
    schedule: PollSchedule,
}

impl Dashboard {
    pub fn new(
        provider: Arc<dyn SnapshotProvider>,
        renderer: Arc<dyn ImageRenderer>,
        cache: FreshnessCache<Arc<DashboardSnapshot>>,
        policy: FreshnessPolicy,
        schedule: PollSchedule,
    ) -> Self {
        Self {
            provider,
            renderer,
            cache,
            policy,
            schedule,
        }
    }

    pub fn cache(&self) -> &FreshnessCache<Arc<DashboardSnapshot>> {
        &self.cache
    }

    pub async fn snapshot(&self) -> Result<DashboardSnapshot> {
        let provider = Arc::clone(&self.provider);
        blocking(move || provider.snapshot()).await
    }

    pub async fn image(&self, request: ImageRequest) -> Result<ImageOutcome> {
        self.image_at(request, Local::now().time()).await
    }

    /// As [`Dashboard::image`], with the local wall-clock time used for the
    /// poll delay supplied by the caller.
    pub async fn image_at(
        &self,
        request: ImageRequest,
        local_time: NaiveTime,
    ) -> Result<ImageOutcome> {
        if let Some(action) = &request.action {
            info!(action = %action, "action requested, bypassing cache");
        }
        if let Some(token) = &request.token {
            info!(token = %token, "client presented token");
        }

        let snapshot = Arc::new(self.snapshot().await?);

        let poll_minutes = self.schedule.minutes_until_next_poll(local_time);
        info!(poll_minutes, "computed poll delay");

        if request.action.is_none() {
            if let Some(token) = request.token.as_deref() {
                let cached = self.cache.get(token);
                match self.policy.evaluate(cached.as_deref(), &snapshot) {
                    Verdict::Reusable => {
                        info!(token = %token, "no significant change, image not modified");
                        return Ok(ImageOutcome::NotModified { poll_minutes });
                    }
                    Verdict::Regenerate(reason) => {
                        info!(%reason, "regenerating dashboard image");
                    }
                }
            }
        }

        let renderer = Arc::clone(&self.renderer);
        let to_render = Arc::clone(&snapshot);
        let bytes = blocking(move || renderer.render(&to_render)).await?;

        let token = content_hash(&bytes);
        info!(token = %token, bytes = bytes.len(), "rendered dashboard image");

        let actions = snapshot.action_ids();
        self.cache.set(token.clone(), snapshot);

        Ok(ImageOutcome::Fresh(RenderedImage {
            bytes,
            token,
            poll_minutes,
            actions,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DashError;
    use crate::snapshot::{Action, LeafState, TemperatureReading};
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Hands out a settable snapshot, or fails when none is set.
    struct FakeProvider(Mutex<Option<DashboardSnapshot>>);

    impl FakeProvider {
        fn set(&self, snapshot: Option<DashboardSnapshot>) {
            *self.0.lock().unwrap() = snapshot;
        }

        fn update(&self, change: impl FnOnce(&mut DashboardSnapshot)) {
            let mut guard = self.0.lock().unwrap();
            change(guard.as_mut().unwrap());
        }
    }

    impl SnapshotProvider for FakeProvider {
        fn snapshot(&self) -> Result<DashboardSnapshot> {
            let mut snapshot = self
                .0
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| DashError::NotFound("leaf-summary.json".into()))?;
            snapshot.generated_at = Utc::now();
            Ok(snapshot)
        }
    }

    /// Encodes the displayed fields as text and counts renders.
    #[derive(Default)]
    struct FakeRenderer(AtomicUsize);

    impl ImageRenderer for FakeRenderer {
        fn render(&self, snapshot: &DashboardSnapshot) -> Result<Vec<u8>> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(format!(
                "{:.0}|{}|{:?}",
                snapshot.leaf.cruising_range_ac_off, snapshot.message, snapshot.temperature_reading
            )
            .into_bytes())
        }
    }

    fn snapshot() -> DashboardSnapshot {
        DashboardSnapshot {
            leaf: LeafState {
                is_plugged_in: false,
                is_charging: false,
                cruising_range_ac_off: 100.0,
                cruising_range_ac_on: 90.0,
            },
            message: "Hello".to_string(),
            date_string: "Monday, 19 October 2026".to_string(),
            weather: None,
            temperature_reading: Some(TemperatureReading {
                temperature: 20.0,
                humidity: 50.0,
            }),
            actions: vec![Action::refresh()],
            generated_at: Utc::now(),
        }
    }

    fn dashboard() -> (Dashboard, Arc<FakeProvider>, Arc<FakeRenderer>) {
        let provider = Arc::new(FakeProvider(Mutex::new(Some(snapshot()))));
        let renderer = Arc::new(FakeRenderer::default());
        let dashboard = Dashboard::new(
            provider.clone(),
            renderer.clone(),
            FreshnessCache::new(Duration::from_secs(600)),
            FreshnessPolicy::default(),
            PollSchedule::default(),
        );
        (dashboard, provider, renderer)
    }

    fn noon() -> NaiveTime {
        NaiveTime::from_hms_opt(12, 0, 0).unwrap()
    }

    async fn fresh(dashboard: &Dashboard, request: ImageRequest) -> RenderedImage {
        match dashboard.image_at(request, noon()).await.unwrap() {
            ImageOutcome::Fresh(image) => image,
            other => panic!("expected a fresh image, got {other:?}"),
        }
    }

    fn with_token(token: &str) -> ImageRequest {
        ImageRequest {
            token: Some(token.to_string()),
            action: None,
        }
    }

    #[tokio::test]
    async fn test_first_request_renders_and_caches() {
        let (dashboard, _, renderer) = dashboard();

        let image = fresh(&dashboard, ImageRequest::default()).await;
        assert_eq!(image.token, content_hash(&image.bytes));
        assert_eq!(image.poll_minutes, 5);
        assert_eq!(image.actions, vec![SmolStr::new("refresh")]);
        assert_eq!(renderer.0.load(Ordering::SeqCst), 1);
        assert!(dashboard.cache().get(&image.token).is_some());
    }

    #[tokio::test]
    async fn test_matching_token_is_not_modified() {
        let (dashboard, provider, renderer) = dashboard();
        let image = fresh(&dashboard, ImageRequest::default()).await;

        // small changes within tolerance
        provider.update(|s| s.leaf.cruising_range_ac_off = 98.0);

        let outcome = dashboard
            .image_at(with_token(&image.token), NaiveTime::from_hms_opt(23, 0, 0).unwrap())
            .await
            .unwrap();
        assert_eq!(outcome, ImageOutcome::NotModified { poll_minutes: 420 });
        assert_eq!(renderer.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_action_bypasses_cache() {
        let (dashboard, _, renderer) = dashboard();
        let image = fresh(&dashboard, ImageRequest::default()).await;

        let request = ImageRequest {
            token: Some(image.token.clone()),
            action: Some(SmolStr::new("refresh")),
        };
        let again = fresh(&dashboard, request).await;
        assert_eq!(again.token, image.token);
        assert_eq!(renderer.0.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_significant_change_renders_new_token() {
        let (dashboard, provider, _) = dashboard();
        let image = fresh(&dashboard, ImageRequest::default()).await;

        provider.update(|s| s.leaf.cruising_range_ac_off = 90.0);

        let again = fresh(&dashboard, with_token(&image.token)).await;
        assert_ne!(again.token, image.token);
        assert!(dashboard.cache().get(&again.token).is_some());
    }

    #[tokio::test]
    async fn test_unknown_token_renders() {
        let (dashboard, _, renderer) = dashboard();

        fresh(&dashboard, with_token("deadbeef")).await;
        assert_eq!(renderer.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_provider_failure_is_not_cached() {
        let (dashboard, provider, renderer) = dashboard();
        provider.set(None);

        let result = dashboard.image_at(ImageRequest::default(), noon()).await;
        assert!(result.is_err());
        assert!(dashboard.cache().is_empty());
        assert_eq!(renderer.0.load(Ordering::SeqCst), 0);
    }
}
