// =============================================================================
// Notification Sink — Discord webhook delivery
// =============================================================================
//
// Delivery is fire-and-forget: a failed post is logged and counted by the
// caller, never retried and never fatal to the scan. When no webhook URL is
// configured the engine falls back to a log-only sink so the pipeline still
// runs end-to-end.
// =============================================================================

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info};

/// Outbound alert delivery.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, message: &str) -> Result<()>;
}

// =============================================================================
// Discord webhook
// =============================================================================

/// Posts `{"content": ...}` JSON to a Discord webhook URL.
pub struct DiscordWebhook {
    webhook_url: String,
    client: reqwest::Client,
}

impl DiscordWebhook {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("failed to build reqwest client");

        Self {
            webhook_url: webhook_url.into(),
            client,
        }
    }
}

#[async_trait]
impl NotificationSink for DiscordWebhook {
    async fn notify(&self, message: &str) -> Result<()> {
        let payload = serde_json::json!({ "content": message });

        let resp = self
            .client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await
            .context("POST to Discord webhook failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Discord webhook returned {status}: {body}");
        }

        debug!("alert delivered to Discord webhook");
        Ok(())
    }
}

impl std::fmt::Debug for DiscordWebhook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The webhook URL embeds a secret token; never print it.
        f.debug_struct("DiscordWebhook")
            .field("webhook_url", &"<redacted>")
            .finish()
    }
}

// =============================================================================
// Log-only fallback
// =============================================================================

/// Sink used when `DISCORD_WEBHOOK_URL` is unset: alerts land in the log.
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn notify(&self, message: &str) -> Result<()> {
        info!(alert = %message, "alert (log-only sink)");
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn log_sink_always_succeeds() {
        assert!(LogSink.notify("test alert").await.is_ok());
    }

    #[test]
    fn discord_webhook_debug_redacts_url() {
        let sink = DiscordWebhook::new("https://discord.com/api/webhooks/123/secret-token");
        let debug = format!("{sink:?}");
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("<redacted>"));
    }
}
