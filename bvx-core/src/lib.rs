pub mod cache;
pub mod config;
pub mod content;
pub mod error;
pub mod models;
pub mod newsletter;
pub mod normalize;
pub mod telemetry;

pub use cache::TtlCache;
pub use config::SiteConfig;
pub use content::{ArticleFilter, ContentService, DEFAULT_CACHE_TTL, DEFAULT_PAGE_SIZE};
pub use error::{FetchError, TelemetryError};
pub use models::{Article, ArticlePage, SubscribeOutcome, Subscription};
pub use newsletter::NewsletterService;
pub use telemetry::{AnalyticsService, AnalyticsSink, PosthogSink};
