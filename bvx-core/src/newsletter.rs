use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, warn};

use crate::config::SiteConfig;
use crate::content::is_json_response;
use crate::error::FetchError;
use crate::models::{SubscribeOutcome, Subscription};

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern"));

const SUCCESS_MESSAGE: &str = "Successfully subscribed!";
const FAILURE_MESSAGE: &str = "Subscription failed. Please try again.";
const CONFIG_ERROR_MESSAGE: &str =
    "Configuration error: the newsletter endpoint returned HTML instead of JSON.";
const CONNECTION_ERROR_MESSAGE: &str = "Connection error. Please check your network and try again.";

/// Newsletter sign-up: one POST per call, no retries. Every failure comes
/// back as a `{success: false, message}` outcome the UI can show verbatim.
#[derive(Debug, Clone)]
pub struct NewsletterService {
    config: Arc<SiteConfig>,
    client: Client,
}

impl NewsletterService {
    pub fn new(config: Arc<SiteConfig>, client: Client) -> Self {
        Self { config, client }
    }

    pub async fn subscribe(&self, subscription: &Subscription) -> SubscribeOutcome {
        if let Some(source) = subscription.source.as_deref() {
            debug!(source, "newsletter subscription requested");
        }
        match self.post_subscription(subscription).await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(error = %err, "newsletter subscription failed");
                SubscribeOutcome::failure(CONNECTION_ERROR_MESSAGE)
            }
        }
    }

    /// Syntactic `local@domain.tld` check only; no MX or deliverability
    /// verification.
    pub fn validate_email(&self, email: &str) -> bool {
        EMAIL_PATTERN.is_match(email)
    }

    async fn post_subscription(
        &self,
        subscription: &Subscription,
    ) -> Result<SubscribeOutcome, FetchError> {
        let response = self
            .client
            .post(self.config.newsletter_url())
            .json(&json!({
                "email": subscription.email,
                "websiteId": self.config.site_id,
                // Honeypot field, must be sent empty.
                "website_url": "",
            }))
            .send()
            .await?;

        if !is_json_response(&response) {
            let body = response.text().await.unwrap_or_default();
            warn!(body = %body, "newsletter endpoint returned a non-JSON response");
            return Ok(SubscribeOutcome::failure(CONFIG_ERROR_MESSAGE));
        }

        if !response.status().is_success() {
            let message = response
                .json::<serde_json::Value>()
                .await
                .ok()
                .and_then(|body| {
                    body.get("message")
                        .and_then(|value| value.as_str())
                        .map(ToOwned::to_owned)
                })
                .unwrap_or_else(|| FAILURE_MESSAGE.to_string());
            return Ok(SubscribeOutcome::failure(message));
        }

        // Drain the (empty) success payload before reporting.
        let _ = response.json::<serde_json::Value>().await?;
        Ok(SubscribeOutcome::ok(SUCCESS_MESSAGE))
    }
}
