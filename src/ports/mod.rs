//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the domain/usecases layer
//! requires from the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `LedgerClient`: account reads, push subscriptions, tx submission
//! - `OrderEntry`: order placement, cancellation, fund settlement
//! - `SwapAdapter`: venue-specific pool swap instruction building
//! - `MarketDecoder`: raw payload decoding into semantic shapes
//! - `Notifier`: outbound alert delivery

pub mod decoder;
pub mod execution;
pub mod ledger;
pub mod notifier;
pub mod swap;
