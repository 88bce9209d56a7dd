//! Market Decoder Port - Raw Payload Decoding Interface
//!
//! Decodes raw account payloads pushed by the ledger into the semantic
//! shapes the cache holds: balances in human units, book sides as raw
//! orders plus aggregated top-20 levels.

use thiserror::Error;

use crate::domain::book::{Level, RestingOrder};

/// Failure to decode an account payload.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("payload truncated: need {need} bytes, got {got}")]
    Truncated { need: usize, got: usize },
    #[error("malformed {what}")]
    Malformed { what: &'static str },
}

/// Unsettled balances decoded from the open-orders account.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpenOrdersView {
    pub base_unsettled: f64,
    pub quote_unsettled: f64,
}

/// One decoded book side: raw orders and the aggregated level view.
#[derive(Debug, Clone)]
pub struct BookSideView {
    pub orders: Vec<RestingOrder>,
    pub levels: Vec<Level>,
}

/// Trait for venue payload decoders.
///
/// Implementors own the venue's binary layouts; everything they return is
/// in human units, scaled by the decimals they were constructed with.
pub trait MarketDecoder: Send + Sync + 'static {
    /// Decode a token wallet account into its human-unit balance.
    fn decode_token_amount(&self, payload: &[u8], decimals: u32) -> Result<f64, DecodeError>;

    /// Decode the open-orders account's unsettled balances.
    fn decode_open_orders(&self, payload: &[u8]) -> Result<OpenOrdersView, DecodeError>;

    /// Decode one side of the book into raw orders and top-20 levels.
    fn decode_book_side(&self, payload: &[u8]) -> Result<BookSideView, DecodeError>;
}
