//! Swap Instruction Builders - One per Supported Venue
//!
//! Both venues share the same basic layout (tag byte + amount-in +
//! min-amount-out, little endian) but differ in program id and in the
//! accounts the instruction must reference: Cascade additionally wants
//! the owner as a writable signer.

use crate::domain::rate::SwapVenue;
use crate::ports::ledger::{Instruction, InstructionAccount};
use crate::ports::swap::{PoolAccounts, SwapAdapter, SwapRoute};

const PRISM_PROGRAM: &str = "PrsmSwapV2Program11111111111111111111111111";
const CASCADE_PROGRAM: &str = "CascdSwapProgram111111111111111111111111111";

/// Swap instruction tag shared by both venues.
const IX_SWAP: u8 = 1;

fn swap_data(amount_in: u64, min_amount_out: u64) -> Vec<u8> {
    let mut data = Vec::with_capacity(17);
    data.push(IX_SWAP);
    data.extend_from_slice(&amount_in.to_le_bytes());
    data.extend_from_slice(&min_amount_out.to_le_bytes());
    data
}

/// Accounts common to both venues, in the order the programs expect.
fn common_accounts(pool: &PoolAccounts, route: &SwapRoute) -> Vec<InstructionAccount> {
    vec![
        InstructionAccount::readonly(pool.token_swap.clone()),
        InstructionAccount::readonly(pool.authority.clone()),
        InstructionAccount::signer(route.authority.clone()),
        InstructionAccount::writable(route.user_source.clone()),
        InstructionAccount::writable(pool.quote_reserve.clone()),
        InstructionAccount::writable(pool.base_reserve.clone()),
        InstructionAccount::writable(route.user_destination.clone()),
        InstructionAccount::writable(pool.pool_mint.clone()),
        InstructionAccount::writable(pool.fee_account.clone()),
    ]
}

/// Prism constant-product swap (0.25% fee).
#[derive(Debug, Default)]
pub struct PrismSwap;

impl SwapAdapter for PrismSwap {
    fn build_swap_instruction(
        &self,
        pool: &PoolAccounts,
        route: &SwapRoute,
        amount_in: u64,
        min_amount_out: u64,
    ) -> anyhow::Result<Instruction> {
        Ok(Instruction {
            program: PRISM_PROGRAM.to_string(),
            accounts: common_accounts(pool, route),
            data: swap_data(amount_in, min_amount_out),
        })
    }
}

/// Cascade constant-product swap (0.3% fee); wants the owner account too.
#[derive(Debug, Default)]
pub struct CascadeSwap;

impl SwapAdapter for CascadeSwap {
    fn build_swap_instruction(
        &self,
        pool: &PoolAccounts,
        route: &SwapRoute,
        amount_in: u64,
        min_amount_out: u64,
    ) -> anyhow::Result<Instruction> {
        let mut accounts = common_accounts(pool, route);
        accounts.push(InstructionAccount {
            address: route.authority.clone(),
            signer: true,
            writable: true,
        });
        Ok(Instruction {
            program: CASCADE_PROGRAM.to_string(),
            accounts,
            data: swap_data(amount_in, min_amount_out),
        })
    }
}

/// Adapter for the configured venue.
pub fn for_venue(venue: SwapVenue) -> Box<dyn SwapAdapter> {
    match venue {
        SwapVenue::Prism => Box::new(PrismSwap),
        SwapVenue::Cascade => Box::new(CascadeSwap),
    }
}
