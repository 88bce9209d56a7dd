//! Swap Adapter Port - Pool Swap Instruction Builder
//!
//! One adapter per supported swap venue. The adapter encodes a
//! quote-to-base swap through the constant-product pool into a venue
//! instruction; amounts cross this boundary already scaled to atomic
//! units.

use crate::domain::book::AccountId;
use crate::ports::ledger::Instruction;

/// Pool accounts the swap instruction references, from configuration.
#[derive(Debug, Clone)]
pub struct PoolAccounts {
    /// The pool's state account.
    pub token_swap: AccountId,
    /// The pool authority.
    pub authority: AccountId,
    /// LP mint, credited with the fee share.
    pub pool_mint: AccountId,
    /// Venue fee collection account.
    pub fee_account: AccountId,
    /// Pool reserve holding the base asset.
    pub base_reserve: AccountId,
    /// Pool reserve holding the quote asset.
    pub quote_reserve: AccountId,
}

/// Source and destination wallet accounts for one swap.
#[derive(Debug, Clone)]
pub struct SwapRoute {
    /// Wallet account the input amount is drawn from.
    pub user_source: AccountId,
    /// Wallet account the output is credited to.
    pub user_destination: AccountId,
    /// Signing identity authorizing the transfer.
    pub authority: AccountId,
}

/// Trait for venue-specific swap instruction builders.
pub trait SwapAdapter: Send + Sync + 'static {
    /// Encode a swap of `amount_in` atomic input units with a minimum
    /// acceptable output of `min_amount_out` atomic units.
    fn build_swap_instruction(
        &self,
        pool: &PoolAccounts,
        route: &SwapRoute,
        amount_in: u64,
        min_amount_out: u64,
    ) -> anyhow::Result<Instruction>;
}
