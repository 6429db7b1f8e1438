use std::sync::Arc;
use std::time::Duration;

use bvx_core::{ArticleFilter, ContentService, SiteConfig};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(api_url: String) -> Arc<SiteConfig> {
    Arc::new(SiteConfig {
        site_id: "site-1".into(),
        api_url,
        ..SiteConfig::default()
    })
}

fn snapshot(slug: &str, title: &str) -> serde_json::Value {
    json!({
        "id": format!("id-{slug}"),
        "slug": slug,
        "author": "Jordan Avery",
        "publishedAt": "2025-03-01T10:00:00Z",
        "updatedAt": "2025-03-02T08:30:00Z",
        "tags": ["markets"],
        "category": "finance",
        "locales": [{
            "locale": "en-US",
            "title": title,
            "summary": "A short summary",
            "body": "<p>rates climbed again this quarter</p>",
            "mainImage": "/api/content/images/cover.png"
        }]
    })
}

#[tokio::test]
async fn headless_page_is_normalized_and_paginated() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/headless/sites-by-id/site-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "site": {"name": "Test Site"},
            "articles": [snapshot("rates-up", "Rates Up")],
            "stats": {"totalArticles": 12}
        })))
        .mount(&server)
        .await;

    let service = ContentService::new(test_config(server.uri()), reqwest::Client::new());
    let page = service
        .list_articles_paginated(&ArticleFilter::default())
        .await;

    assert_eq!(page.total, 12);
    assert_eq!(page.page, 1);
    assert_eq!(page.limit, 10);
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.data.len(), 1);

    let article = &page.data[0];
    assert_eq!(article.slug, "rates-up");
    assert_eq!(article.title, "Rates Up");
    assert_eq!(article.author.as_deref(), Some("Jordan Avery"));
    assert_eq!(
        article.main_image.as_deref(),
        Some("/api-proxy/api/content/images/cover.png")
    );
    assert_eq!(article.reading_time, "1 min");
}

#[tokio::test]
async fn identical_filters_share_one_request_until_ttl_expires() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/headless/sites-by-id/site-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "articles": [snapshot("cached", "Cached")],
            "stats": {"totalArticles": 1}
        })))
        .expect(2)
        .mount(&server)
        .await;

    let service = ContentService::with_cache_ttl(
        test_config(server.uri()),
        reqwest::Client::new(),
        Duration::from_millis(150),
    );
    let filter = ArticleFilter::default();

    let first = service.list_articles_paginated(&filter).await;
    let second = service.list_articles_paginated(&filter).await;
    assert_eq!(first, second);

    // Past the TTL the entry counts as absent and the network is hit again.
    tokio::time::sleep(Duration::from_millis(200)).await;
    let third = service.list_articles_paginated(&filter).await;
    assert_eq!(third.data.len(), 1);
}

#[tokio::test]
async fn clear_cache_forces_a_refetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/headless/sites-by-id/site-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "articles": [snapshot("fresh", "Fresh")],
            "stats": {"totalArticles": 1}
        })))
        .expect(2)
        .mount(&server)
        .await;

    let service = ContentService::new(test_config(server.uri()), reqwest::Client::new());
    let filter = ArticleFilter::default();

    service.list_articles_paginated(&filter).await;
    service.clear_cache().await;
    service.list_articles_paginated(&filter).await;
}

#[tokio::test]
async fn falls_back_to_legacy_endpoint_on_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/headless/sites-by-id/site-1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/content/sites/site-1/articles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "articles": [{
                "id": "l1",
                "slug": "legacy-article",
                "publishedAt": "2025-01-05T00:00:00Z",
                "locales": [{
                    "locale": "en-US",
                    "summary": "legacy summary",
                    "body": "just two words"
                }]
            }],
            "total": 1
        })))
        .mount(&server)
        .await;

    let service = ContentService::new(test_config(server.uri()), reqwest::Client::new());
    let page = service
        .list_articles_paginated(&ArticleFilter::default())
        .await;

    assert_eq!(page.total, 1);
    assert_eq!(page.page, 1);
    assert_eq!(page.limit, 10);
    assert_eq!(page.total_pages, 1);
    assert_eq!(page.data.len(), 1);

    // Legacy records take the looser mapping.
    let article = &page.data[0];
    assert_eq!(article.title, "legacy-article");
    assert_eq!(article.author, None);
    assert_eq!(article.reading_time, "5 min");
}

#[tokio::test]
async fn falls_back_when_headless_returns_html() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/headless/sites-by-id/site-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string("<html>gateway error</html>"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/content/sites/site-1/articles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "articles": [],
            "total": 0
        })))
        .expect(1)
        .mount(&server)
        .await;

    let service = ContentService::new(test_config(server.uri()), reqwest::Client::new());
    let page = service
        .list_articles_paginated(&ArticleFilter::default())
        .await;
    assert!(page.data.is_empty());
}

#[tokio::test]
async fn empty_page_when_both_endpoints_fail() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/headless/sites-by-id/site-1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/content/sites/site-1/articles"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let service = ContentService::new(test_config(server.uri()), reqwest::Client::new());
    let page = service
        .list_articles_paginated(&ArticleFilter::default())
        .await;

    assert!(page.data.is_empty());
    assert_eq!(page.total, 0);
    assert_eq!(page.page, 1);
    assert_eq!(page.limit, 10);
    assert_eq!(page.total_pages, 0);
}

#[tokio::test]
async fn filter_parameters_reach_the_api() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/headless/sites-by-id/site-1"))
        .and(query_param("limit", "2"))
        .and(query_param("offset", "4"))
        .and(query_param("q", "rates"))
        .and(query_param("category", "finance"))
        .and(query_param("locale", "en-US"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "articles": [snapshot("a", "A"), snapshot("b", "B")],
            "stats": {"totalArticles": 9}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let service = ContentService::new(test_config(server.uri()), reqwest::Client::new());
    let filter = ArticleFilter {
        offset: Some(4),
        limit: Some(2),
        category: Some("finance".into()),
        search: Some("rates".into()),
        ..ArticleFilter::default()
    };
    let articles = service.list_articles(&filter).await;

    assert!(articles.len() <= 2);
    let page = service.list_articles_paginated(&filter).await;
    assert_eq!(page.page, 3);
    assert_eq!(page.total_pages, 5);
}

#[tokio::test]
async fn related_articles_exclude_the_current_slug() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/headless/sites-by-id/site-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "articles": [
                snapshot("current", "Current"),
                snapshot("other-1", "Other 1"),
                snapshot("other-2", "Other 2"),
                snapshot("other-3", "Other 3")
            ],
            "stats": {"totalArticles": 4}
        })))
        .mount(&server)
        .await;

    let service = ContentService::new(test_config(server.uri()), reqwest::Client::new());
    let related = service.related_articles("current", 3).await;

    assert_eq!(related.len(), 3);
    assert!(related.iter().all(|article| article.slug != "current"));
}

#[tokio::test]
async fn featured_article_is_the_first_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/headless/sites-by-id/site-1"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "articles": [snapshot("hero", "Hero Piece")],
            "stats": {"totalArticles": 30}
        })))
        .mount(&server)
        .await;

    let service = ContentService::new(test_config(server.uri()), reqwest::Client::new());
    let featured = service.featured_article().await;
    assert_eq!(featured.map(|article| article.slug), Some("hero".into()));
}

#[tokio::test]
async fn categories_are_distinct_and_ordered() {
    let server = MockServer::start().await;
    let mut finance_dup = snapshot("dup", "Dup");
    finance_dup["category"] = json!("finance");
    let mut guides = snapshot("guide", "Guide");
    guides["category"] = json!("guides");

    Mock::given(method("GET"))
        .and(path("/api/headless/sites-by-id/site-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "articles": [snapshot("first", "First"), finance_dup, guides],
            "stats": {"totalArticles": 3}
        })))
        .mount(&server)
        .await;

    let service = ContentService::new(test_config(server.uri()), reqwest::Client::new());
    let categories = service.categories().await;
    assert_eq!(categories, vec!["finance".to_string(), "guides".to_string()]);
}
