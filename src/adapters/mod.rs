//! Adapters Layer - Infrastructure Implementations
//!
//! Concrete implementations of the port traits: JSON-RPC ledger client
//! with an adaptive endpoint pool, venue account decoding and order
//! wire encoding, swap instruction builders, webhook alerts, and the
//! metrics/health servers.

pub mod metrics;
pub mod notify;
pub mod rpc;
pub mod venue;
