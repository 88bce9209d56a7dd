//! Notification Adapters - Outbound Alert Delivery

pub mod webhook;

pub use webhook::WebhookNotifier;
