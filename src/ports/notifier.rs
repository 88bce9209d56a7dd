//! Notifier Port - Outbound Alert Interface
//!
//! Narrow capability for reporting action outcomes. Delivery is
//! best-effort: implementors log and swallow their own transport failures
//! so a dead alert channel can never stall the control loop.

use async_trait::async_trait;

/// One inline key/value field attached to a notification.
#[derive(Debug, Clone)]
pub struct NoticeField {
    pub name: String,
    pub value: String,
}

impl NoticeField {
    pub fn new(name: impl Into<String>, value: impl ToString) -> Self {
        Self {
            name: name.into(),
            value: value.to_string(),
        }
    }
}

/// Trait for alert sinks.
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    /// Routine action report (settle, cancel, place).
    async fn info(&self, title: &str, description: &str, tx_id: &str, fields: &[NoticeField]);

    /// Favorable outcome worth highlighting (completed swap).
    async fn success(&self, title: &str, description: &str, tx_id: &str, fields: &[NoticeField]);

    /// Action or cycle failure.
    async fn error(&self, title: &str, description: &str);
}
