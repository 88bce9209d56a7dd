//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters,
//! and providing clear error messages for misconfiguration.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::AppConfig;

/// Load and validate configuration from a TOML file.
///
/// # Errors
/// Returns detailed error if the file can't be read, TOML parsing fails,
/// or a validation rule is violated.
pub fn load_config(path: &str) -> Result<AppConfig> {
    let path = Path::new(path);

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: AppConfig =
        toml::from_str(&content).with_context(|| "Failed to parse config.toml")?;

    validate_config(&config)?;

    info!(
        endpoints = config.rpc.endpoints.len(),
        market = %config.market.address,
        venue = %config.pool.venue,
        dry_run = config.bot.dry_run,
        "Configuration loaded successfully"
    );

    Ok(config)
}

/// Validate all configuration parameters.
fn validate_config(config: &AppConfig) -> Result<()> {
    // RPC validation
    anyhow::ensure!(
        !config.rpc.endpoints.is_empty(),
        "At least one RPC endpoint must be configured"
    );
    for (i, endpoint) in config.rpc.endpoints.iter().enumerate() {
        anyhow::ensure!(
            endpoint.starts_with("http://") || endpoint.starts_with("https://"),
            "RPC endpoint {i} must be an http(s) URL, got {endpoint}"
        );
    }
    anyhow::ensure!(
        !config.rpc.signer_identity.is_empty(),
        "Signer identity must not be empty"
    );
    anyhow::ensure!(
        config.rpc.timeout_ms > 0,
        "RPC timeout must be positive"
    );

    // Bot loop validation
    anyhow::ensure!(config.bot.tick_ms > 0, "tick_ms must be positive");
    anyhow::ensure!(
        config.bot.cooldown_ms >= config.bot.tick_ms,
        "cooldown_ms ({}) must be at least one tick ({})",
        config.bot.cooldown_ms,
        config.bot.tick_ms
    );
    anyhow::ensure!(
        config.bot.slippage_pct > 0.0 && config.bot.slippage_pct < 100.0,
        "slippage_pct must be in (0, 100), got {}",
        config.bot.slippage_pct
    );

    // Market validation
    for (field, value) in [
        ("market.address", &config.market.address),
        ("market.program", &config.market.program),
        ("market.asks_account", &config.market.asks_account),
        ("market.bids_account", &config.market.bids_account),
        ("market.base_wallet_account", &config.market.base_wallet_account),
        ("market.quote_wallet_account", &config.market.quote_wallet_account),
        ("market.open_orders_account", &config.market.open_orders_account),
    ] {
        anyhow::ensure!(!value.is_empty(), "{field} must not be empty");
    }
    anyhow::ensure!(
        config.market.min_order_quantity_decimals <= 12,
        "min_order_quantity_decimals must be at most 12, got {}",
        config.market.min_order_quantity_decimals
    );
    anyhow::ensure!(
        config.market.base_decimals <= 18 && config.market.quote_decimals <= 18,
        "token decimals must be at most 18"
    );
    anyhow::ensure!(
        config.market.ignore_depth_amount >= 0.0,
        "ignore_depth_amount must be non-negative, got {}",
        config.market.ignore_depth_amount
    );

    // Pool validation
    for (field, value) in [
        ("pool.token_swap", &config.pool.token_swap),
        ("pool.authority", &config.pool.authority),
        ("pool.pool_mint", &config.pool.pool_mint),
        ("pool.fee_account", &config.pool.fee_account),
        ("pool.base_reserve_account", &config.pool.base_reserve_account),
        ("pool.quote_reserve_account", &config.pool.quote_reserve_account),
    ] {
        anyhow::ensure!(!value.is_empty(), "{field} must not be empty");
    }

    // Alert validation
    anyhow::ensure!(
        config.alerts.webhook_url.starts_with("http"),
        "Alert webhook_url must be an http(s) URL"
    );

    Ok(())
}
