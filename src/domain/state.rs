//! In-memory bot state cache and the typed events that mutate it.
//!
//! A single controller task owns `BotState`; push handlers never touch it
//! directly. Instead each subscription pump decodes its payload into a
//! `CacheEvent` and sends it down one mpsc channel, preserving
//! single-writer-per-field semantics without locks.

use serde::{Deserialize, Serialize};

use super::book::{AccountId, Level, MarketSnapshot, RestingOrder};
use super::rate::{PoolReserves, SwapVenue};

/// Wallet and unsettled sub-balances for one token, in human units.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenBalance {
    /// Balance sitting in the wallet account.
    pub wallet: f64,
    /// Proceeds of filled orders not yet withdrawn to the wallet.
    pub unsettled: f64,
}

/// Price and size of the most recently placed order.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct LastOrder {
    pub price: f64,
    pub size: f64,
}

/// The caller's own balances and order bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct UserAccount {
    pub base: TokenBalance,
    pub quote: TokenBalance,
    /// Open-orders account whose address tags our resting orders.
    pub open_orders: AccountId,
    pub last_order: LastOrder,
}

/// Typed cache update produced by a subscription pump or a refresh call.
#[derive(Debug, Clone)]
pub enum CacheEvent {
    /// Full ask-side replacement: raw orders plus aggregated levels.
    AskBook {
        orders: Vec<RestingOrder>,
        levels: Vec<Level>,
    },
    /// On-demand bid-side refresh (no subscription behind it).
    BidBook { levels: Vec<Level> },
    /// Unsettled balances from the open-orders account.
    OpenOrders {
        base_unsettled: f64,
        quote_unsettled: f64,
    },
    BaseWallet(f64),
    QuoteWallet(f64),
    PoolBase(f64),
    PoolQuote(f64),
}

impl CacheEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AskBook { .. } => "ask_book",
            Self::BidBook { .. } => "bid_book",
            Self::OpenOrders { .. } => "open_orders",
            Self::BaseWallet(_) => "base_wallet",
            Self::QuoteWallet(_) => "quote_wallet",
            Self::PoolBase(_) => "pool_base",
            Self::PoolQuote(_) => "pool_quote",
        }
    }
}

/// Latest known market, pool, and account state.
#[derive(Debug, Clone)]
pub struct BotState {
    pub market: MarketSnapshot,
    pub reserves: PoolReserves,
    pub user: UserAccount,
    pub venue: SwapVenue,
}

impl BotState {
    pub fn new(venue: SwapVenue, open_orders: AccountId) -> Self {
        Self {
            market: MarketSnapshot::default(),
            reserves: PoolReserves::default(),
            user: UserAccount {
                open_orders,
                ..UserAccount::default()
            },
            venue,
        }
    }

    /// Apply one typed update to exactly the matching fields.
    pub fn apply(&mut self, event: CacheEvent) {
        match event {
            CacheEvent::AskBook { orders, levels } => {
                self.market.ask_orders = orders;
                self.market.asks = levels;
            }
            CacheEvent::BidBook { levels } => {
                self.market.bids = levels;
            }
            CacheEvent::OpenOrders {
                base_unsettled,
                quote_unsettled,
            } => {
                self.user.base.unsettled = base_unsettled;
                self.user.quote.unsettled = quote_unsettled;
            }
            CacheEvent::BaseWallet(amount) => self.user.base.wallet = amount,
            CacheEvent::QuoteWallet(amount) => self.user.quote.wallet = amount,
            CacheEvent::PoolBase(amount) => {
                self.reserves.observe_base(amount, self.venue);
            }
            CacheEvent::PoolQuote(amount) => {
                self.reserves.observe_quote(amount, self.venue);
            }
        }
    }

    /// The caller's own resting asks, in book (ascending price) order.
    pub fn my_orders(&self) -> Vec<&RestingOrder> {
        self.market
            .ask_orders
            .iter()
            .filter(|order| order.owner == self.user.open_orders)
            .collect()
    }

    /// Lowest-priced own resting ask, if any.
    pub fn min_my_order(&self) -> Option<&RestingOrder> {
        self.my_orders()
            .into_iter()
            .min_by(|a, b| a.price.total_cmp(&b.price))
    }

    /// Seed `last_order` from the live book at startup so a restart does
    /// not treat a pre-existing quote as foreign.
    pub fn seed_last_order(&mut self) {
        if let Some(order) = self.min_my_order() {
            self.user.last_order = LastOrder {
                price: order.price,
                size: order.size,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> BotState {
        BotState::new(SwapVenue::Prism, "me".to_string())
    }

    fn order(owner: &str, price: f64, size: f64) -> RestingOrder {
        RestingOrder {
            order_id: 1,
            owner: owner.to_string(),
            price,
            size,
        }
    }

    #[test]
    fn test_apply_ask_book_replaces_wholesale() {
        let mut s = state();
        s.apply(CacheEvent::AskBook {
            orders: vec![order("other", 10.0, 5.0)],
            levels: vec![Level::new(10.0, 5.0)],
        });
        s.apply(CacheEvent::AskBook {
            orders: vec![],
            levels: vec![],
        });
        assert!(s.market.ask_orders.is_empty());
        assert!(s.market.asks.is_empty());
    }

    #[test]
    fn test_apply_balances_touch_only_their_field() {
        let mut s = state();
        s.apply(CacheEvent::QuoteWallet(12.5));
        s.apply(CacheEvent::OpenOrders {
            base_unsettled: 1.0,
            quote_unsettled: 2.0,
        });
        assert_eq!(s.user.quote.wallet, 12.5);
        assert_eq!(s.user.base.wallet, 0.0);
        assert_eq!(s.user.base.unsettled, 1.0);
        assert_eq!(s.user.quote.unsettled, 2.0);
    }

    #[test]
    fn test_pool_events_drive_the_rate() {
        let mut s = state();
        s.apply(CacheEvent::PoolBase(1_000_000.0));
        assert_eq!(s.reserves.rate, 0.0);
        s.apply(CacheEvent::PoolQuote(1_000_000.0));
        assert!(s.reserves.rate > 1.0);
    }

    #[test]
    fn test_my_orders_filters_by_owner() {
        let mut s = state();
        s.apply(CacheEvent::AskBook {
            orders: vec![
                order("other", 9.9, 1.0),
                order("me", 10.0, 2.0),
                order("me", 10.5, 3.0),
            ],
            levels: vec![],
        });
        let mine = s.my_orders();
        assert_eq!(mine.len(), 2);
        assert_eq!(s.min_my_order().unwrap().price, 10.0);
    }

    #[test]
    fn test_seed_last_order_from_book() {
        let mut s = state();
        s.apply(CacheEvent::AskBook {
            orders: vec![order("me", 10.4, 7.0), order("me", 10.2, 3.0)],
            levels: vec![],
        });
        s.seed_last_order();
        assert_eq!(s.user.last_order.price, 10.2);
        assert_eq!(s.user.last_order.size, 3.0);
    }
}
