use std::sync::Arc;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response, StatusCode};
use tracing::{debug, warn};
use url::form_urlencoded;

use crate::cache::TtlCache;
use crate::config::SiteConfig;
use crate::error::FetchError;
use crate::models::{Article, ArticlePage, ArticleSnapshot, HeadlessPage, LegacyPage};

/// How long cached responses stay fresh.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Page size applied when a filter does not set one.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Listing filter; unset fields are omitted from the upstream query.
#[derive(Debug, Clone, Default)]
pub struct ArticleFilter {
    pub offset: Option<u32>,
    pub limit: Option<u32>,
    pub category: Option<String>,
    pub tag: Option<String>,
    pub search: Option<String>,
}

impl ArticleFilter {
    pub fn offset(&self) -> u32 {
        self.offset.unwrap_or(0)
    }

    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE)
    }

    /// Canonical query-string encoding; also the cache key material, so the
    /// pair ordering is fixed.
    fn query_string(&self, locale: &str) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        query.append_pair("limit", &self.limit().to_string());
        query.append_pair("offset", &self.offset().to_string());
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            query.append_pair("q", search);
        }
        if let Some(category) = self.category.as_deref().filter(|s| !s.is_empty()) {
            query.append_pair("category", category);
        }
        if let Some(tag) = self.tag.as_deref().filter(|s| !s.is_empty()) {
            query.append_pair("tag", tag);
        }
        query.append_pair("locale", locale);
        query.finish()
    }
}

pub(crate) fn is_json_response(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.contains("application/json"))
}

fn content_type_of(response: &Response) -> Option<String> {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(ToOwned::to_owned)
}

/// Article retrieval against the headless snapshot API, with a legacy content
/// endpoint as fallback and bounded-staleness caching. Callers always get a
/// renderable (possibly empty) result; upstream failures never propagate.
#[derive(Debug, Clone)]
pub struct ContentService {
    config: Arc<SiteConfig>,
    client: Client,
    pages: TtlCache<ArticlePage>,
    articles: TtlCache<Article>,
}

impl ContentService {
    pub fn new(config: Arc<SiteConfig>, client: Client) -> Self {
        Self::with_cache_ttl(config, client, DEFAULT_CACHE_TTL)
    }

    pub fn with_cache_ttl(config: Arc<SiteConfig>, client: Client, ttl: Duration) -> Self {
        Self {
            config,
            client,
            pages: TtlCache::new(ttl),
            articles: TtlCache::new(ttl),
        }
    }

    /// Plain article sequence for callers that do not paginate.
    pub async fn list_articles(&self, filter: &ArticleFilter) -> Vec<Article> {
        self.list_articles_paginated(filter).await.data
    }

    /// Fetch one page of articles. Headless endpoint first, legacy endpoint
    /// on non-404 failure, empty page when both are down.
    pub async fn list_articles_paginated(&self, filter: &ArticleFilter) -> ArticlePage {
        let query = filter.query_string(&self.config.locale);
        let cache_key = format!("articles:{query}");
        if let Some(page) = self.pages.get(&cache_key).await {
            debug!(key = %cache_key, "article page served from cache");
            return page;
        }

        match self.fetch_headless_page(&query, filter).await {
            Ok(page) => {
                self.pages.insert(cache_key, page.clone()).await;
                return page;
            }
            Err(FetchError::NotFound) => {
                debug!("headless endpoint reported no articles for this site");
                return ArticlePage::empty(filter.offset(), filter.limit());
            }
            Err(err) => {
                warn!(error = %err, "headless content endpoint failed, trying legacy endpoint");
            }
        }

        match self.fetch_legacy_page(&query, filter).await {
            Ok(page) => {
                self.pages.insert(cache_key, page.clone()).await;
                page
            }
            Err(err) => {
                warn!(error = %err, "legacy content endpoint failed");
                ArticlePage::empty(filter.offset(), filter.limit())
            }
        }
    }

    /// Single article by slug, cached. `None` covers both "not found" and
    /// "fetch failed"; the distinction only survives in the logs.
    pub async fn article_by_slug(&self, slug: &str) -> Option<Article> {
        if let Some(article) = self.articles.get(slug).await {
            debug!(slug, "article served from cache");
            return Some(article);
        }

        match self.fetch_article_by_slug(slug).await {
            Ok(Some(article)) => {
                self.articles.insert(slug, article.clone()).await;
                Some(article)
            }
            Ok(None) => None,
            Err(err) => {
                warn!(slug, error = %err, "article lookup failed");
                None
            }
        }
    }

    /// First result of a limit-1 fetch, for the hero slot.
    pub async fn featured_article(&self) -> Option<Article> {
        let filter = ArticleFilter {
            limit: Some(1),
            ..ArticleFilter::default()
        };
        self.list_articles(&filter).await.into_iter().next()
    }

    /// Best-effort related list: the most recent articles minus the one being
    /// read. Not a relevance query.
    pub async fn related_articles(&self, slug: &str, limit: u32) -> Vec<Article> {
        let filter = ArticleFilter {
            limit: Some(limit + 1),
            ..ArticleFilter::default()
        };
        let mut related: Vec<Article> = self
            .list_articles(&filter)
            .await
            .into_iter()
            .filter(|article| article.slug != slug)
            .collect();
        related.truncate(limit as usize);
        related
    }

    /// Distinct categories across a recent-articles window, in first-seen
    /// order.
    pub async fn categories(&self) -> Vec<String> {
        let filter = ArticleFilter {
            limit: Some(50),
            ..ArticleFilter::default()
        };
        let mut categories: Vec<String> = Vec::new();
        for article in self.list_articles(&filter).await {
            if let Some(category) = article.category {
                if !categories.contains(&category) {
                    categories.push(category);
                }
            }
        }
        categories
    }

    /// Drop every cached page and article unconditionally.
    pub async fn clear_cache(&self) {
        self.pages.clear().await;
        self.articles.clear().await;
    }

    async fn fetch_headless_page(
        &self,
        query: &str,
        filter: &ArticleFilter,
    ) -> Result<ArticlePage, FetchError> {
        let url = format!(
            "{}/api/headless/sites-by-id/{}?{}",
            self.config.api_url, self.config.site_id, query
        );
        let body: HeadlessPage = self.fetch_json(&url).await?;

        let articles: Vec<Article> = body
            .articles
            .iter()
            .map(|snapshot| Article::from_snapshot(snapshot, &self.config.locale))
            .collect();
        let total = body
            .stats
            .and_then(|stats| stats.total_articles)
            .unwrap_or(articles.len() as u64);

        Ok(ArticlePage::from_articles(
            articles,
            total,
            filter.offset(),
            filter.limit(),
        ))
    }

    async fn fetch_legacy_page(
        &self,
        query: &str,
        filter: &ArticleFilter,
    ) -> Result<ArticlePage, FetchError> {
        let url = format!(
            "{}/api/content/sites/{}/articles?{}",
            self.config.api_url, self.config.site_id, query
        );
        let body: LegacyPage = self.fetch_json(&url).await?;

        let articles: Vec<Article> = body
            .articles
            .iter()
            .map(|record| Article::from_legacy(record, &self.config.locale))
            .collect();
        let total = body.total.unwrap_or(articles.len() as u64);

        Ok(ArticlePage::from_articles(
            articles,
            total,
            filter.offset(),
            filter.limit(),
        ))
    }

    /// Not-found stays distinct from failure here even though the public
    /// method collapses both to `None`.
    async fn fetch_article_by_slug(&self, slug: &str) -> Result<Option<Article>, FetchError> {
        let url = format!(
            "{}/api/headless/sites-by-id/{}/articles/{}?locale={}",
            self.config.api_url, self.config.site_id, slug, self.config.locale
        );
        let response = self.client.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        let bytes = response.bytes().await?;
        let snapshot: ArticleSnapshot = serde_json::from_slice(&bytes)?;
        Ok(Some(Article::from_snapshot(&snapshot, &self.config.locale)))
    }

    async fn fetch_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let response = self.client.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound);
        }
        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }
        if !is_json_response(&response) {
            return Err(FetchError::ContentType(content_type_of(&response)));
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
