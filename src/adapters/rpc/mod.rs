//! RPC Adapters - Weighted Endpoint Pool and Pooled Ledger Client
//!
//! Connection handling for the redundant venue endpoints: adaptive
//! weighted selection, per-call routing, push subscriptions with
//! reconnect/backoff, and weight feedback on failure and recovery.

pub mod client;
pub mod pool;

pub use client::{LedgerClientConfig, PooledLedgerClient};
pub use pool::EndpointPool;
