use std::sync::Arc;

use bvx_core::{AnalyticsService, ArticleFilter, ContentService, SiteConfig};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Arc::new(SiteConfig::from_env());
    let missing = config.missing_required();
    if !missing.is_empty() {
        eprintln!("missing required configuration: {}", missing.join(", "));
        return;
    }

    let client = reqwest::Client::new();
    let content = ContentService::new(config.clone(), client.clone());
    let analytics = AnalyticsService::posthog(config.clone(), client);
    analytics.initialize().await;

    if let Some(featured) = content.featured_article().await {
        println!("featured: {} ({})", featured.title, featured.reading_time);
        analytics
            .capture_article_view(&featured.slug, &featured.title, featured.category.as_deref())
            .await;
    }

    let page = content
        .list_articles_paginated(&ArticleFilter::default())
        .await;
    println!(
        "page {}/{}: {} of {} articles",
        page.page,
        page.total_pages,
        page.data.len(),
        page.total
    );
    for article in &page.data {
        println!("- {} [{}]", article.title, article.reading_time);
    }
}
