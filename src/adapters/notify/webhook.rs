//! Webhook Notifier - Embed-style Alert Delivery
//!
//! Implements the `Notifier` port by posting embed JSON to a configured
//! webhook URL. Delivery is best-effort: failures are logged and
//! swallowed so a dead alert channel can never stall the control loop.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::warn;

use crate::ports::notifier::{NoticeField, Notifier};

const COLOR_INFO: u32 = 0x3498db;
const COLOR_SUCCESS: u32 = 0x2ecc71;
const COLOR_ERROR: u32 = 0xe74c3c;

/// Notifier posting embed payloads to a webhook.
pub struct WebhookNotifier {
    http: Client,
    url: String,
    username: String,
}

impl WebhookNotifier {
    pub fn new(url: String, username: String) -> Self {
        Self {
            http: Client::new(),
            url,
            username,
        }
    }

    fn embed(
        &self,
        title: &str,
        description: &str,
        tx_id: &str,
        fields: &[NoticeField],
        color: u32,
    ) -> Value {
        let fields: Vec<Value> = fields
            .iter()
            .map(|f| json!({ "name": f.name, "value": f.value, "inline": true }))
            .collect();
        json!({
            "username": self.username,
            "embeds": [{
                "title": title,
                "description": description,
                "color": color,
                "fields": fields,
                "footer": { "text": tx_id },
                "timestamp": Utc::now().to_rfc3339(),
            }],
        })
    }

    async fn post(&self, payload: Value) {
        let result = self.http.post(&self.url).json(&payload).send().await;
        match result {
            Ok(response) if !response.status().is_success() => {
                warn!(status = %response.status(), "Webhook rejected notification");
            }
            Err(e) => warn!(error = %e, "Webhook delivery failed"),
            Ok(_) => {}
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn info(&self, title: &str, description: &str, tx_id: &str, fields: &[NoticeField]) {
        self.post(self.embed(title, description, tx_id, fields, COLOR_INFO))
            .await;
    }

    async fn success(&self, title: &str, description: &str, tx_id: &str, fields: &[NoticeField]) {
        self.post(self.embed(title, description, tx_id, fields, COLOR_SUCCESS))
            .await;
    }

    async fn error(&self, title: &str, description: &str) {
        self.post(self.embed(title, description, "", &[], COLOR_ERROR))
            .await;
    }
}
