//! Venue Adapters - Layout Decoding and Transaction Building
//!
//! Concrete implementations of the venue-facing ports: the fixed-offset
//! account layout decoder, the order-entry transaction builder, and the
//! per-venue swap instruction builders.

pub mod book;
pub mod decode;
pub mod swap;

pub use book::{MarketAccounts, VenueOrderEntry, WireScaling};
pub use decode::{DecoderConfig, LayoutDecoder};
pub use swap::{for_venue, CascadeSwap, PrismSwap};
