//! Venue Order Entry - Book Transaction Builder
//!
//! Implements the `OrderEntry` port by encoding new-order, cancel, and
//! settle instructions against the market's order-entry program and
//! submitting them through the pooled ledger client.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::prelude::*;

use crate::domain::book::{AccountId, RestingOrder};
use crate::ports::execution::{OrderEntry, OrderRequest};
use crate::ports::ledger::{Instruction, InstructionAccount, LedgerClient, TxId};

/// Instruction tags understood by the order-entry program.
const IX_NEW_ORDER: u8 = 0;
const IX_CANCEL_ORDER: u8 = 1;
const IX_SETTLE_FUNDS: u8 = 2;

/// Side byte in the new-order payload; the controller only sells.
const SIDE_SELL: u8 = 1;

/// Market and user accounts every book transaction references.
#[derive(Debug, Clone)]
pub struct MarketAccounts {
    pub market: AccountId,
    pub program: AccountId,
    pub open_orders: AccountId,
    pub base_wallet: AccountId,
    pub quote_wallet: AccountId,
    pub owner: AccountId,
}

/// Decimal scaling applied when encoding prices and sizes to the wire.
#[derive(Debug, Clone, Copy)]
pub struct WireScaling {
    pub price_decimals: u32,
    pub size_decimals: u32,
}

/// Order-entry adapter over the pooled ledger client.
pub struct VenueOrderEntry<L: LedgerClient> {
    ledger: Arc<L>,
    accounts: MarketAccounts,
    scaling: WireScaling,
}

impl<L: LedgerClient> VenueOrderEntry<L> {
    pub fn new(ledger: Arc<L>, accounts: MarketAccounts, scaling: WireScaling) -> Self {
        Self {
            ledger,
            accounts,
            scaling,
        }
    }

    /// Human-unit value → atomic wire units, exactly on the grid.
    fn to_atomic(value: f64, decimals: u32) -> anyhow::Result<u64> {
        let scaled = Decimal::from_f64(value)
            .ok_or_else(|| anyhow::anyhow!("non-finite value {value}"))?
            * Decimal::from(10u64.pow(decimals));
        scaled
            .round()
            .to_u64()
            .ok_or_else(|| anyhow::anyhow!("value {value} out of wire range"))
    }
}

#[async_trait]
impl<L: LedgerClient> OrderEntry for VenueOrderEntry<L> {
    async fn place_order(&self, request: &OrderRequest) -> anyhow::Result<TxId> {
        let price = Self::to_atomic(request.price, self.scaling.price_decimals)?;
        let size = Self::to_atomic(request.size, self.scaling.size_decimals)?;

        let mut data = Vec::with_capacity(35);
        data.push(IX_NEW_ORDER);
        data.push(SIDE_SELL);
        data.extend_from_slice(&price.to_le_bytes());
        data.extend_from_slice(&size.to_le_bytes());
        // Post-only: rest or reject, never take.
        data.push(1);
        data.extend_from_slice(request.client_id.as_u128().to_le_bytes().as_ref());

        let instruction = Instruction {
            program: self.accounts.program.clone(),
            accounts: vec![
                InstructionAccount::writable(self.accounts.market.clone()),
                InstructionAccount::writable(self.accounts.open_orders.clone()),
                InstructionAccount::writable(self.accounts.base_wallet.clone()),
                InstructionAccount::signer(self.accounts.owner.clone()),
            ],
            data,
        };
        Ok(self.ledger.submit(&[instruction]).await?)
    }

    async fn cancel_order(&self, order: &RestingOrder) -> anyhow::Result<TxId> {
        let mut data = Vec::with_capacity(17);
        data.push(IX_CANCEL_ORDER);
        data.extend_from_slice(&order.order_id.to_le_bytes());

        let instruction = Instruction {
            program: self.accounts.program.clone(),
            accounts: vec![
                InstructionAccount::writable(self.accounts.market.clone()),
                InstructionAccount::writable(self.accounts.open_orders.clone()),
                InstructionAccount::signer(self.accounts.owner.clone()),
            ],
            data,
        };
        Ok(self.ledger.submit(&[instruction]).await?)
    }

    async fn settle_funds(&self) -> anyhow::Result<TxId> {
        let instruction = Instruction {
            program: self.accounts.program.clone(),
            accounts: vec![
                InstructionAccount::writable(self.accounts.market.clone()),
                InstructionAccount::writable(self.accounts.open_orders.clone()),
                InstructionAccount::writable(self.accounts.base_wallet.clone()),
                InstructionAccount::writable(self.accounts.quote_wallet.clone()),
                InstructionAccount::signer(self.accounts.owner.clone()),
            ],
            data: vec![IX_SETTLE_FUNDS],
        };
        Ok(self.ledger.submit(&[instruction]).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_atomic_rounds_on_grid() {
        assert_eq!(
            VenueOrderEntry::<crate::adapters::rpc::PooledLedgerClient>::to_atomic(10.19, 2)
                .unwrap(),
            1_019
        );
        assert_eq!(
            VenueOrderEntry::<crate::adapters::rpc::PooledLedgerClient>::to_atomic(1.5, 6)
                .unwrap(),
            1_500_000
        );
    }

    #[test]
    fn test_to_atomic_rejects_non_finite() {
        assert!(VenueOrderEntry::<crate::adapters::rpc::PooledLedgerClient>::to_atomic(
            f64::NAN,
            2
        )
        .is_err());
    }
}
