use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::SiteConfig;
use crate::error::TelemetryError;

/// Delivery backend for analytics events. The service owns queueing and
/// enrichment; sinks only ship what they are handed.
#[async_trait]
pub trait AnalyticsSink: Send + Sync {
    async fn initialize(&self) -> Result<(), TelemetryError>;
    async fn capture(&self, event: &str, properties: &Map<String, Value>);
    async fn identify(&self, distinct_id: &str, properties: &Map<String, Value>);
    async fn reset(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SinkState {
    Uninitialized,
    Initializing,
    Ready,
}

struct QueuedEvent {
    event: String,
    properties: Map<String, Value>,
}

struct Inner {
    state: SinkState,
    queue: VecDeque<QueuedEvent>,
}

/// Typed analytics capture with queue-until-ready semantics: events recorded
/// before the sink finishes initializing are buffered and replayed in order,
/// exactly once, on the transition to ready.
#[derive(Clone)]
pub struct AnalyticsService {
    config: Arc<SiteConfig>,
    sink: Arc<dyn AnalyticsSink>,
    inner: Arc<RwLock<Inner>>,
}

impl AnalyticsService {
    pub fn new(config: Arc<SiteConfig>, sink: Arc<dyn AnalyticsSink>) -> Self {
        Self {
            config,
            sink,
            inner: Arc::new(RwLock::new(Inner {
                state: SinkState::Uninitialized,
                queue: VecDeque::new(),
            })),
        }
    }

    /// Service backed by the PostHog HTTP sink.
    pub fn posthog(config: Arc<SiteConfig>, client: Client) -> Self {
        let sink = PosthogSink::new(
            client,
            config.posthog_key.clone(),
            config.posthog_host.clone(),
        );
        Self::new(config, Arc::new(sink))
    }

    /// Bring the sink up, once. Without an analytics key this stays a no-op
    /// and captures queue indefinitely; a failed attempt falls back to
    /// uninitialized so a later call may retry.
    pub async fn initialize(&self) {
        if self.config.posthog_key.is_empty() {
            debug!("analytics key not configured; events stay queued");
            return;
        }

        {
            let mut inner = self.inner.write().await;
            if inner.state != SinkState::Uninitialized {
                return;
            }
            inner.state = SinkState::Initializing;
        }

        match self.sink.initialize().await {
            Ok(()) => {
                let drained = {
                    let mut inner = self.inner.write().await;
                    inner.state = SinkState::Ready;
                    std::mem::take(&mut inner.queue)
                };
                for queued in drained {
                    self.sink.capture(&queued.event, &queued.properties).await;
                }
            }
            Err(err) => {
                warn!(error = %err, "analytics sink failed to initialize");
                self.inner.write().await.state = SinkState::Uninitialized;
            }
        }
    }

    pub async fn is_ready(&self) -> bool {
        self.inner.read().await.state == SinkState::Ready
    }

    /// Record an event, enriched with the site identity and a timestamp.
    /// Forwards immediately when ready, queues otherwise.
    pub async fn capture(&self, event: &str, properties: Map<String, Value>) {
        let enriched = self.enrich(properties);

        let forward = {
            let mut inner = self.inner.write().await;
            if inner.state == SinkState::Ready {
                true
            } else {
                inner.queue.push_back(QueuedEvent {
                    event: event.to_string(),
                    properties: enriched.clone(),
                });
                false
            }
        };

        if forward {
            self.sink.capture(event, &enriched).await;
        }
    }

    pub async fn capture_page_view(&self, path: &str, url: &str, title: Option<&str>) {
        let mut properties = Map::new();
        properties.insert("path".into(), json!(path));
        properties.insert("url".into(), json!(url));
        if let Some(title) = title {
            properties.insert("title".into(), json!(title));
        }
        self.capture("page_view", properties).await;
    }

    pub async fn capture_article_view(&self, slug: &str, title: &str, category: Option<&str>) {
        let mut properties = Map::new();
        properties.insert("article_slug".into(), json!(slug));
        properties.insert("article_title".into(), json!(title));
        if let Some(category) = category {
            properties.insert("article_category".into(), json!(category));
        }
        self.capture("article_view", properties).await;
    }

    pub async fn capture_scroll_depth(&self, depth_percent: u32, path: &str) {
        let mut properties = Map::new();
        properties.insert("depth_percent".into(), json!(depth_percent));
        properties.insert("path".into(), json!(path));
        self.capture("scroll_depth", properties).await;
    }

    pub async fn capture_article_scroll_deep(
        &self,
        article_slug: &str,
        scroll_percentage: u32,
        page_url: &str,
    ) {
        let mut properties = Map::new();
        properties.insert("article_slug".into(), json!(article_slug));
        properties.insert("scroll_percentage".into(), json!(scroll_percentage));
        properties.insert("page_url".into(), json!(page_url));
        self.capture("article_scroll_deep", properties).await;
    }

    pub async fn capture_sponsor_banner_click(
        &self,
        sponsor_location: &str,
        sponsor_id: Option<&str>,
        sponsor_name: Option<&str>,
        page_url: &str,
    ) {
        let mut properties = Map::new();
        properties.insert("sponsor_location".into(), json!(sponsor_location));
        if let Some(id) = sponsor_id {
            properties.insert("sponsor_id".into(), json!(id));
        }
        if let Some(name) = sponsor_name {
            properties.insert("sponsor_name".into(), json!(name));
        }
        properties.insert("page_url".into(), json!(page_url));
        self.capture("sponsor_banner_clicked", properties).await;
    }

    pub async fn capture_adsense_banner_click(
        &self,
        ads_location: &str,
        ads_slot: Option<&str>,
        page_url: &str,
    ) {
        let mut properties = Map::new();
        properties.insert("ads_location".into(), json!(ads_location));
        if let Some(slot) = ads_slot {
            properties.insert("ads_slot".into(), json!(slot));
        }
        properties.insert("page_url".into(), json!(page_url));
        self.capture("adsense_banner_clicked", properties).await;
    }

    pub async fn capture_tool_used(
        &self,
        tool_name: &str,
        tool_type: &str,
        tool_category: &str,
        tool_location: &str,
    ) {
        let mut properties = Map::new();
        properties.insert("tool_name".into(), json!(tool_name));
        properties.insert("tool_type".into(), json!(tool_type));
        properties.insert("tool_category".into(), json!(tool_category));
        properties.insert("tool_location".into(), json!(tool_location));
        self.capture("tool_used", properties).await;
    }

    pub async fn capture_search_performed(
        &self,
        search_query: &str,
        search_results_count: u64,
        search_location: &str,
    ) {
        let mut properties = Map::new();
        properties.insert("search_query".into(), json!(search_query));
        properties.insert("search_results_count".into(), json!(search_results_count));
        properties.insert("search_location".into(), json!(search_location));
        self.capture("search_performed", properties).await;
    }

    pub async fn capture_search_result_click(
        &self,
        search_query: &str,
        result_position: u32,
        result_title: &str,
    ) {
        let mut properties = Map::new();
        properties.insert("search_query".into(), json!(search_query));
        properties.insert("result_position".into(), json!(result_position));
        properties.insert("result_title".into(), json!(result_title));
        self.capture("search_result_clicked", properties).await;
    }

    /// No-op until the sink is ready.
    pub async fn identify(&self, distinct_id: &str, properties: Map<String, Value>) {
        if !self.is_ready().await {
            return;
        }
        self.sink.identify(distinct_id, &properties).await;
    }

    /// No-op until the sink is ready.
    pub async fn reset(&self) {
        if !self.is_ready().await {
            return;
        }
        self.sink.reset().await;
    }

    fn enrich(&self, mut properties: Map<String, Value>) -> Map<String, Value> {
        properties.insert("site_id".into(), json!(self.config.site_id));
        // Duplicate key kept for the analytics queries that filter on it.
        properties.insert("website_id".into(), json!(self.config.site_id));
        properties.insert("site_name".into(), json!(self.config.site_name));
        properties.insert("timestamp".into(), json!(Utc::now().to_rfc3339()));
        properties
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct AnalyticsState {
    distinct_id: String,
}

/// PostHog delivery over its HTTP capture endpoint. The distinct id is a v4
/// uuid persisted in the user config directory so identity survives restarts;
/// without a config directory it stays in-memory for the session.
pub struct PosthogSink {
    client: Client,
    api_key: String,
    host: String,
    distinct_id: RwLock<String>,
    state_path: Option<PathBuf>,
}

impl PosthogSink {
    pub fn new(client: Client, api_key: String, host: String) -> Self {
        let state_path = dirs::config_dir().map(|dir| dir.join("bvx").join("analytics.json"));
        Self {
            client,
            api_key,
            host,
            distinct_id: RwLock::new(String::new()),
            state_path,
        }
    }

    async fn load_persisted_id(&self) -> Option<String> {
        let path = self.state_path.as_ref()?;
        let bytes = tokio::fs::read(path).await.ok()?;
        serde_json::from_slice::<AnalyticsState>(&bytes)
            .ok()
            .map(|state| state.distinct_id)
            .filter(|id| !id.is_empty())
    }

    async fn persist_id(&self, distinct_id: &str) {
        let Some(path) = &self.state_path else {
            debug!("no config directory; analytics identity stays in-memory");
            return;
        };
        let state = AnalyticsState {
            distinct_id: distinct_id.to_string(),
        };
        let bytes = serde_json::to_vec_pretty(&state).unwrap_or_default();
        if let Some(parent) = path.parent() {
            let _ = tokio::fs::create_dir_all(parent).await;
        }
        if let Err(err) = tokio::fs::write(path, bytes).await {
            warn!(error = %err, path = %path.display(), "failed to persist analytics identity");
        }
    }

    fn capture_url(&self) -> String {
        format!("{}/capture/", self.host.trim_end_matches('/'))
    }

    async fn send(&self, event: &str, properties: &Map<String, Value>) {
        let distinct_id = self.distinct_id.read().await.clone();
        let payload = json!({
            "api_key": self.api_key,
            "event": event,
            "distinct_id": distinct_id,
            "properties": properties,
        });
        if let Err(err) = self.client.post(self.capture_url()).json(&payload).send().await {
            warn!(error = %err, event, "failed to deliver analytics event");
        }
    }
}

#[async_trait]
impl AnalyticsSink for PosthogSink {
    async fn initialize(&self) -> Result<(), TelemetryError> {
        let distinct_id = match self.load_persisted_id().await {
            Some(id) => id,
            None => {
                let id = Uuid::new_v4().to_string();
                self.persist_id(&id).await;
                id
            }
        };
        *self.distinct_id.write().await = distinct_id;
        Ok(())
    }

    async fn capture(&self, event: &str, properties: &Map<String, Value>) {
        self.send(event, properties).await;
    }

    async fn identify(&self, distinct_id: &str, properties: &Map<String, Value>) {
        {
            let mut current = self.distinct_id.write().await;
            *current = distinct_id.to_string();
        }
        self.persist_id(distinct_id).await;

        let mut identify_props = Map::new();
        identify_props.insert("$set".into(), Value::Object(properties.clone()));
        self.send("$identify", &identify_props).await;
    }

    async fn reset(&self) {
        let id = Uuid::new_v4().to_string();
        *self.distinct_id.write().await = id.clone();
        self.persist_id(&id).await;
    }
}
