//! Ledger Client Port - Venue Account Access Interface
//!
//! Defines the trait for reading accounts, subscribing to account pushes,
//! and submitting signed transactions to the venue's ledger. Transport
//! failures carry the endpoint identity explicitly so the connection pool
//! can penalize the right endpoint without parsing error strings.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::domain::book::AccountId;

/// Transaction identifier returned by the ledger on submission.
pub type TxId = String;

/// Structured transport-level error from the ledger client.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The endpoint was unreachable or dropped the call mid-flight.
    #[error("transport failure via {endpoint}: {message}")]
    Transport {
        /// Endpoint URL the call was routed to.
        endpoint: String,
        message: String,
    },
    /// The venue accepted the connection but rejected the call.
    #[error("call rejected: {0}")]
    Rejected(String),
    /// The account payload was missing or not in the expected envelope.
    #[error("malformed response for {account}: {message}")]
    MalformedResponse { account: AccountId, message: String },
}

/// One account referenced by an instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionAccount {
    pub address: AccountId,
    pub signer: bool,
    pub writable: bool,
}

impl InstructionAccount {
    pub fn readonly(address: impl Into<AccountId>) -> Self {
        Self {
            address: address.into(),
            signer: false,
            writable: false,
        }
    }

    pub fn writable(address: impl Into<AccountId>) -> Self {
        Self {
            address: address.into(),
            signer: false,
            writable: true,
        }
    }

    pub fn signer(address: impl Into<AccountId>) -> Self {
        Self {
            address: address.into(),
            signer: true,
            writable: false,
        }
    }
}

/// A single venue instruction: target program, accounts, opaque data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub program: AccountId,
    pub accounts: Vec<InstructionAccount>,
    pub data: Vec<u8>,
}

/// Trait for ledger access through the weighted connection pool.
///
/// Implementors route each call through one of several redundant
/// endpoints. Signing is handled inside the adapter with the configured
/// identity; key custody never crosses this boundary.
#[async_trait]
pub trait LedgerClient: Send + Sync + 'static {
    /// Read the raw payload of one account.
    async fn read_account(&self, address: &AccountId) -> Result<Vec<u8>, LedgerError>;

    /// Subscribe to push updates for one account.
    ///
    /// The returned channel keeps delivering payloads across reconnects;
    /// it closes only when the receiver is dropped.
    async fn subscribe_account(
        &self,
        address: &AccountId,
    ) -> Result<mpsc::Receiver<Vec<u8>>, LedgerError>;

    /// Sign and submit a transaction built from `instructions`.
    async fn submit(&self, instructions: &[Instruction]) -> Result<TxId, LedgerError>;
}
