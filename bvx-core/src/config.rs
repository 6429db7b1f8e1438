use tracing::{debug, warn};

/// Flat site configuration, read once at startup from `BVX_*` environment
/// variables. Values never change at runtime; share via `Arc<SiteConfig>`.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub site_id: String,
    pub site_name: String,
    pub site_url: String,
    pub site_description: String,
    pub site_keywords: String,

    pub api_url: String,
    pub content_api_url: String,

    pub newsletter_endpoint: String,

    pub posthog_key: String,
    pub posthog_host: String,

    pub revive_url: String,
    pub revive_id: String,
    pub revive_zone_header: String,
    pub revive_zone_sidebar: String,
    pub revive_zone_in_article_1: String,
    pub revive_zone_in_article_2: String,
    pub revive_zone_sticky_footer: String,

    pub locale: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site_id: String::new(),
            site_name: "Site".to_string(),
            site_url: String::new(),
            site_description: String::new(),
            site_keywords: String::new(),
            api_url: String::new(),
            content_api_url: String::new(),
            newsletter_endpoint: String::new(),
            posthog_key: String::new(),
            posthog_host: "https://us.i.posthog.com".to_string(),
            revive_url: String::new(),
            revive_id: String::new(),
            revive_zone_header: String::new(),
            revive_zone_sidebar: String::new(),
            revive_zone_in_article_1: String::new(),
            revive_zone_in_article_2: String::new(),
            revive_zone_sticky_footer: String::new(),
            locale: "en-US".to_string(),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

impl SiteConfig {
    /// Read the whole configuration from the environment in one pass.
    pub fn from_env() -> Self {
        let config = Self {
            site_id: env_or("BVX_SITE_ID", ""),
            site_name: env_or("BVX_SITE_NAME", "Site"),
            site_url: env_or("BVX_SITE_URL", ""),
            site_description: env_or("BVX_SITE_DESCRIPTION", ""),
            site_keywords: env_or("BVX_SITE_KEYWORDS", ""),
            api_url: env_or("BVX_API_URL", ""),
            content_api_url: env_or("BVX_CONTENT_API_URL", ""),
            newsletter_endpoint: env_or("BVX_NEWSLETTER_ENDPOINT", ""),
            posthog_key: env_or("BVX_POSTHOG_KEY", ""),
            posthog_host: env_or("BVX_POSTHOG_HOST", "https://us.i.posthog.com"),
            revive_url: env_or("BVX_REVIVE_URL", ""),
            revive_id: env_or("BVX_REVIVE_ID", ""),
            revive_zone_header: env_or("BVX_REVIVE_ZONE_HEADER", ""),
            revive_zone_sidebar: env_or("BVX_REVIVE_ZONE_SIDEBAR", ""),
            revive_zone_in_article_1: env_or("BVX_REVIVE_ZONE_INARTICLE_1", ""),
            revive_zone_in_article_2: env_or("BVX_REVIVE_ZONE_INARTICLE_2", ""),
            revive_zone_sticky_footer: env_or("BVX_REVIVE_ZONE_STICKY_FOOTER", ""),
            locale: env_or("BVX_LOCALE", "en-US"),
        };

        debug!(
            site_id = %config.site_id,
            site_name = %config.site_name,
            locale = %config.locale,
            "site configuration loaded"
        );
        if config.revive_url.is_empty() {
            warn!("BVX_REVIVE_URL is not set; ad zones will stay empty");
        }
        if config.revive_id.is_empty() {
            warn!("BVX_REVIVE_ID is not set; ad zones will stay empty");
        }

        config
    }

    /// Names of required variables that are missing.
    pub fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.site_id.is_empty() {
            missing.push("BVX_SITE_ID");
        }
        if self.api_url.is_empty() {
            missing.push("BVX_API_URL");
        }
        missing
    }

    /// Newsletter endpoint: explicit override, or the public subscribe route
    /// under the API base.
    pub fn newsletter_url(&self) -> String {
        if self.newsletter_endpoint.is_empty() {
            format!("{}/api/public/newsletter/subscribe", self.api_url)
        } else {
            self.newsletter_endpoint.clone()
        }
    }
}
