//! Layout Decoder - Fixed-offset Binary Account Layouts
//!
//! Implements the `MarketDecoder` port for the venue's account layouts:
//! token wallets, the open-orders account, and book sides. All amounts
//! come out in human units; owner keys surface in the same encoded string
//! form the configuration uses for account identities.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::domain::book::{Level, RestingOrder};
use crate::ports::decoder::{BookSideView, DecodeError, MarketDecoder, OpenOrdersView};

/// Token wallet layout: the u64 amount sits at this offset.
const TOKEN_AMOUNT_OFFSET: usize = 64;
const TOKEN_ACCOUNT_LEN: usize = 72;

/// Open-orders layout: 8-byte header, then base/quote free amounts.
const OPEN_ORDERS_BASE_OFFSET: usize = 8;
const OPEN_ORDERS_QUOTE_OFFSET: usize = 16;
const OPEN_ORDERS_LEN: usize = 24;

/// Book side layout: 1-byte side tag, 3 pad, u32 count, then records.
const BOOK_HEADER_LEN: usize = 8;
/// Record: order id (16) + owner key (32) + price (8) + size (8).
const BOOK_RECORD_LEN: usize = 64;

/// How many aggregated price levels the cache keeps per side.
const DEPTH_LEVELS: usize = 20;

/// Decimal scaling for the wire's integer price and size fields.
#[derive(Debug, Clone, Copy)]
pub struct DecoderConfig {
    pub price_decimals: u32,
    pub size_decimals: u32,
}

/// Fixed-offset layout decoder for the venue's accounts.
#[derive(Debug, Clone)]
pub struct LayoutDecoder {
    config: DecoderConfig,
}

impl LayoutDecoder {
    pub fn new(config: DecoderConfig) -> Self {
        Self { config }
    }

    fn scale(raw: u64, decimals: u32) -> f64 {
        raw as f64 / 10f64.powi(decimals as i32)
    }
}

fn read_u64(payload: &[u8], offset: usize) -> Result<u64, DecodeError> {
    let end = offset + 8;
    let bytes = payload
        .get(offset..end)
        .ok_or(DecodeError::Truncated {
            need: end,
            got: payload.len(),
        })?;
    Ok(u64::from_le_bytes(bytes.try_into().expect("8-byte slice")))
}

fn read_u128(payload: &[u8], offset: usize) -> Result<u128, DecodeError> {
    let end = offset + 16;
    let bytes = payload
        .get(offset..end)
        .ok_or(DecodeError::Truncated {
            need: end,
            got: payload.len(),
        })?;
    Ok(u128::from_le_bytes(bytes.try_into().expect("16-byte slice")))
}

impl MarketDecoder for LayoutDecoder {
    fn decode_token_amount(&self, payload: &[u8], decimals: u32) -> Result<f64, DecodeError> {
        if payload.len() < TOKEN_ACCOUNT_LEN {
            return Err(DecodeError::Truncated {
                need: TOKEN_ACCOUNT_LEN,
                got: payload.len(),
            });
        }
        Ok(Self::scale(read_u64(payload, TOKEN_AMOUNT_OFFSET)?, decimals))
    }

    fn decode_open_orders(&self, payload: &[u8]) -> Result<OpenOrdersView, DecodeError> {
        if payload.len() < OPEN_ORDERS_LEN {
            return Err(DecodeError::Truncated {
                need: OPEN_ORDERS_LEN,
                got: payload.len(),
            });
        }
        Ok(OpenOrdersView {
            base_unsettled: Self::scale(
                read_u64(payload, OPEN_ORDERS_BASE_OFFSET)?,
                self.config.size_decimals,
            ),
            quote_unsettled: Self::scale(
                read_u64(payload, OPEN_ORDERS_QUOTE_OFFSET)?,
                self.config.size_decimals,
            ),
        })
    }

    fn decode_book_side(&self, payload: &[u8]) -> Result<BookSideView, DecodeError> {
        if payload.len() < BOOK_HEADER_LEN {
            return Err(DecodeError::Truncated {
                need: BOOK_HEADER_LEN,
                got: payload.len(),
            });
        }
        let count = u32::from_le_bytes(
            payload[4..8].try_into().expect("4-byte slice"),
        ) as usize;
        let need = BOOK_HEADER_LEN + count * BOOK_RECORD_LEN;
        if payload.len() < need {
            return Err(DecodeError::Truncated {
                need,
                got: payload.len(),
            });
        }

        let mut orders = Vec::with_capacity(count);
        for i in 0..count {
            let base = BOOK_HEADER_LEN + i * BOOK_RECORD_LEN;
            let order_id = read_u128(payload, base)?;
            let owner = BASE64.encode(&payload[base + 16..base + 48]);
            let price = Self::scale(
                read_u64(payload, base + 48)?,
                self.config.price_decimals,
            );
            let size = Self::scale(
                read_u64(payload, base + 56)?,
                self.config.size_decimals,
            );
            orders.push(RestingOrder {
                order_id,
                owner,
                price,
                size,
            });
        }

        Ok(BookSideView {
            levels: aggregate_levels(&orders),
            orders,
        })
    }
}

/// Fold book-ordered orders into the aggregated top-level view.
fn aggregate_levels(orders: &[RestingOrder]) -> Vec<Level> {
    let mut levels: Vec<Level> = Vec::new();
    for order in orders {
        if let Some(level) = levels.last_mut() {
            if level.price == order.price {
                level.size += order.size;
                continue;
            }
        }
        if levels.len() == DEPTH_LEVELS {
            break;
        }
        levels.push(Level::new(order.price, order.size));
    }
    levels
}
