//! Configuration Module - TOML-based Bot Configuration
//!
//! Loads and validates configuration from `config.toml`. All account
//! identities, pool descriptors, and thresholds are externalized here;
//! nothing is hardcoded in the domain layer. Every field is immutable for
//! the process lifetime.

pub mod loader;

use serde::Deserialize;

use crate::domain::rate::SwapVenue;

/// Top-level bot configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Bot identity and loop parameters.
    pub bot: BotConfig,
    /// Redundant RPC endpoints and commitment.
    pub rpc: RpcConfig,
    /// Market and account identities for the traded pair.
    pub market: MarketConfig,
    /// Constant-product pool descriptor and swap venue.
    pub pool: PoolConfig,
    /// Alert webhook destination.
    pub alerts: AlertConfig,
    /// Metrics and health endpoints; the whole table may be omitted.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Bot identity and control-loop parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Human-readable bot name.
    pub name: String,
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Verbose decision logging; forces the debug level.
    #[serde(default)]
    pub debug: bool,
    /// Dry-run mode: decisions computed and logged, nothing submitted.
    #[serde(default)]
    pub dry_run: bool,
    /// Evaluation tick interval in milliseconds.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    /// Per-action cooldown window in milliseconds.
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
    /// Swap slippage tolerance in percent.
    #[serde(default = "default_slippage_pct")]
    pub slippage_pct: f64,
}

/// RPC endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcConfig {
    /// Redundant endpoint URLs; all stay eligible for selection forever.
    pub endpoints: Vec<String>,
    /// Commitment level attached to reads and subscriptions.
    #[serde(default = "default_commitment")]
    pub commitment: String,
    /// Per-call transport timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Signing identity submitted alongside transactions.
    pub signer_identity: String,
}

/// Market and user account identities for the traded pair.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketConfig {
    /// The market's own address.
    pub address: String,
    /// Order-entry program the market belongs to.
    pub program: String,
    /// Ask-side book account.
    pub asks_account: String,
    /// Bid-side book account (refresh-on-demand only).
    pub bids_account: String,
    /// The caller's base token wallet account.
    pub base_wallet_account: String,
    /// The caller's quote token wallet account.
    pub quote_wallet_account: String,
    /// The caller's open-orders account.
    pub open_orders_account: String,
    /// Decimal precision of the base token.
    pub base_decimals: u32,
    /// Decimal precision of the quote token.
    pub quote_decimals: u32,
    /// Decimal precision of the price grid (minimum order quantity).
    pub min_order_quantity_decimals: u32,
    /// Cumulative book depth treated as ignorable noise.
    pub ignore_depth_amount: f64,
}

/// Constant-product pool descriptor.
#[derive(Debug, Clone, Deserialize)]
pub struct PoolConfig {
    /// Which swap venue the pool belongs to (fixes the fee rate).
    pub venue: SwapVenue,
    /// Pool state account.
    pub token_swap: String,
    /// Pool authority.
    pub authority: String,
    /// LP mint account.
    pub pool_mint: String,
    /// Venue fee collection account.
    pub fee_account: String,
    /// Reserve account holding the base asset.
    pub base_reserve_account: String,
    /// Reserve account holding the quote asset.
    pub quote_reserve_account: String,
}

/// Alert destination configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AlertConfig {
    /// Webhook URL notifications are posted to.
    pub webhook_url: String,
    /// Display name attached to posted alerts.
    #[serde(default = "default_alert_username")]
    pub username: String,
}

/// Metrics and health endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Enable the Prometheus/health HTTP server.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Bind address for /metrics, /live, /ready.
    #[serde(default = "default_metrics_addr")]
    pub bind_address: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            bind_address: default_metrics_addr(),
        }
    }
}

// Default value functions for serde

fn default_log_level() -> String {
    "info".to_string()
}

fn default_tick_ms() -> u64 {
    1_000
}

fn default_cooldown_ms() -> u64 {
    10_000
}

fn default_slippage_pct() -> f64 {
    1.0
}

fn default_commitment() -> String {
    "confirmed".to_string()
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_alert_username() -> String {
    "amm-maker-bot".to_string()
}

fn default_true() -> bool {
    true
}

fn default_metrics_addr() -> String {
    "0.0.0.0:9090".to_string()
}
