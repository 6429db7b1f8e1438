use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::normalize;

/// Reading-time label attached to legacy records, which carry no usable body
/// length at normalization time.
const LEGACY_READING_TIME: &str = "5 min";

/// Normalized article as the UI consumes it. Constructed once per fetched
/// snapshot and immutable afterwards; `content` never carries an unrewritten
/// relative `/api/` image path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub main_image: Option<String>,
    pub author: Option<String>,
    pub published_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
    pub category: Option<String>,
    pub reading_time: String,
}

/// One page of articles plus pagination totals. Derived per fetch, never
/// stored outside the response cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticlePage {
    pub data: Vec<Article>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

impl ArticlePage {
    pub(crate) fn from_articles(data: Vec<Article>, total: u64, offset: u32, limit: u32) -> Self {
        let per_page = limit.max(1) as u64;
        Self {
            data,
            total,
            page: offset / limit.max(1) + 1,
            limit,
            total_pages: total.div_ceil(per_page) as u32,
        }
    }

    pub(crate) fn empty(offset: u32, limit: u32) -> Self {
        Self {
            data: Vec::new(),
            total: 0,
            page: offset / limit.max(1) + 1,
            limit,
            total_pages: 0,
        }
    }
}

/// Raw per-article record as both content endpoints deliver it. The two
/// shapes overlap; fields absent on one side are individually defaulted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleSnapshot {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub locales: Vec<LocaleBlock>,
}

/// Per-locale text block inside a snapshot.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocaleBlock {
    #[serde(default)]
    pub locale: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub main_image: Option<String>,
}

/// Headless list payload: `{ site, articles, stats }` (the `site` block is
/// not consumed here).
#[derive(Debug, Clone, Deserialize)]
pub struct HeadlessPage {
    #[serde(default)]
    pub articles: Vec<ArticleSnapshot>,
    #[serde(default)]
    pub stats: Option<SiteStats>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteStats {
    #[serde(default)]
    pub total_articles: Option<u64>,
}

/// Legacy list payload: `{ articles, total }`.
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyPage {
    #[serde(default)]
    pub articles: Vec<ArticleSnapshot>,
    #[serde(default)]
    pub total: Option<u64>,
}

fn parse_timestamp(value: Option<&str>) -> Option<DateTime<Utc>> {
    value
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

impl Article {
    /// Map a headless snapshot into the normalized model, selecting the text
    /// block for `locale` (first block when no exact match).
    pub fn from_snapshot(snapshot: &ArticleSnapshot, locale: &str) -> Self {
        let block = normalize::pick_locale(&snapshot.locales, locale);
        let body = block.and_then(|b| b.body.as_deref()).unwrap_or_default();

        Self {
            id: snapshot.id.clone(),
            slug: snapshot.slug.clone(),
            title: block.and_then(|b| b.title.clone()).unwrap_or_default(),
            excerpt: block.and_then(|b| b.summary.clone()).unwrap_or_default(),
            content: normalize::rewrite_content_images(body),
            main_image: block
                .and_then(|b| b.main_image.as_deref())
                .map(normalize::rewrite_image_url),
            author: snapshot.author.clone(),
            published_at: parse_timestamp(snapshot.published_at.as_deref())
                .or_else(|| parse_timestamp(snapshot.updated_at.as_deref()))
                .unwrap_or_else(Utc::now),
            updated_at: parse_timestamp(snapshot.updated_at.as_deref()),
            tags: snapshot.tags.clone(),
            category: snapshot.category.clone(),
            reading_time: normalize::reading_time_label(body),
        }
    }

    /// Looser mapping for the legacy endpoint shape: the title falls back to
    /// the slug, authorship is absent and the reading time is a fixed default.
    pub fn from_legacy(record: &ArticleSnapshot, locale: &str) -> Self {
        let block = normalize::pick_locale(&record.locales, locale);
        let body = block.and_then(|b| b.body.as_deref()).unwrap_or_default();

        Self {
            id: record.id.clone(),
            slug: record.slug.clone(),
            title: block
                .and_then(|b| b.title.clone())
                .unwrap_or_else(|| record.slug.clone()),
            excerpt: block.and_then(|b| b.summary.clone()).unwrap_or_default(),
            content: normalize::rewrite_content_images(body),
            main_image: block
                .and_then(|b| b.main_image.as_deref())
                .map(normalize::rewrite_image_url),
            author: None,
            published_at: parse_timestamp(record.published_at.as_deref())
                .or_else(|| parse_timestamp(record.created_at.as_deref()))
                .unwrap_or_else(Utc::now),
            updated_at: parse_timestamp(record.updated_at.as_deref()),
            tags: record.tags.clone(),
            category: record.category.clone(),
            reading_time: LEGACY_READING_TIME.to_string(),
        }
    }
}

/// Newsletter sign-up request. Only the email travels to the backend; name
/// and source stay caller-side context.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Subscription {
    pub email: String,
    pub name: Option<String>,
    pub source: Option<String>,
}

/// Outcome of a subscription attempt, with a message fit to display verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscribeOutcome {
    pub success: bool,
    pub message: String,
}

impl SubscribeOutcome {
    pub(crate) fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub(crate) fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}
