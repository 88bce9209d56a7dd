//! Order Entry Port - Venue Order Management Interface
//!
//! Defines the trait for placing, cancelling, and settling orders on the
//! venue's limit order book. The controller only ever places post-only
//! resting sells; cancellation is per resting order and settlement drains
//! the open-orders account into the wallet.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::book::RestingOrder;
use crate::ports::ledger::TxId;

/// A post-only resting sell to be placed on the book.
#[derive(Debug, Clone)]
pub struct OrderRequest {
    /// Client-side id attached to the order for later correlation.
    pub client_id: Uuid,
    /// Limit price in human units, already on the tick grid.
    pub price: f64,
    /// Size in base units.
    pub size: f64,
}

impl OrderRequest {
    pub fn new(price: f64, size: f64) -> Self {
        Self {
            client_id: Uuid::new_v4(),
            price,
            size,
        }
    }
}

/// Trait for order-entry providers.
///
/// Implementors build the venue-specific transactions and submit them
/// through the pooled ledger client. All placements are post-only: the
/// order rests or is rejected, it never takes liquidity.
#[async_trait]
pub trait OrderEntry: Send + Sync + 'static {
    /// Place one post-only resting sell.
    async fn place_order(&self, request: &OrderRequest) -> anyhow::Result<TxId>;

    /// Cancel one resting order belonging to the caller.
    async fn cancel_order(&self, order: &RestingOrder) -> anyhow::Result<TxId>;

    /// Settle the open-orders account's unsettled funds into the wallet.
    async fn settle_funds(&self) -> anyhow::Result<TxId>;
}
