//! State Sync - Account Reads and Subscription Pumps
//!
//! Bootstraps the cache with a full read of every watched account, then
//! spawns one pump per subscription that decodes pushed payloads into
//! typed `CacheEvent`s and forwards them to the controller over a single
//! mpsc channel. Pumps never touch `BotState` directly.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, instrument, warn};

use crate::config::{MarketConfig, PoolConfig};
use crate::domain::state::CacheEvent;
use crate::ports::decoder::MarketDecoder;
use crate::ports::ledger::LedgerClient;

/// Addresses and decimals for every account the cache watches.
#[derive(Debug, Clone)]
pub struct WatchedAccounts {
    pub asks: String,
    pub bids: String,
    pub open_orders: String,
    pub base_wallet: String,
    pub quote_wallet: String,
    pub pool_base_reserve: String,
    pub pool_quote_reserve: String,
    pub base_decimals: u32,
    pub quote_decimals: u32,
}

impl WatchedAccounts {
    pub fn from_config(market: &MarketConfig, pool: &PoolConfig) -> Self {
        Self {
            asks: market.asks_account.clone(),
            bids: market.bids_account.clone(),
            open_orders: market.open_orders_account.clone(),
            base_wallet: market.base_wallet_account.clone(),
            quote_wallet: market.quote_wallet_account.clone(),
            pool_base_reserve: pool.base_reserve_account.clone(),
            pool_quote_reserve: pool.quote_reserve_account.clone(),
            base_decimals: market.base_decimals,
            quote_decimals: market.quote_decimals,
        }
    }
}

/// Keeps the cache fed: initial reads plus long-lived subscription pumps.
pub struct StateSync<L: LedgerClient, D: MarketDecoder> {
    ledger: Arc<L>,
    decoder: Arc<D>,
    accounts: WatchedAccounts,
}

impl<L: LedgerClient, D: MarketDecoder> Clone for StateSync<L, D> {
    fn clone(&self) -> Self {
        Self {
            ledger: Arc::clone(&self.ledger),
            decoder: Arc::clone(&self.decoder),
            accounts: self.accounts.clone(),
        }
    }
}

impl<L: LedgerClient, D: MarketDecoder> StateSync<L, D> {
    pub fn new(ledger: Arc<L>, decoder: Arc<D>, accounts: WatchedAccounts) -> Self {
        Self {
            ledger,
            decoder,
            accounts,
        }
    }

    /// Read every watched account once and emit the resulting events.
    ///
    /// Bids are included here so the first tick sees a full snapshot;
    /// afterwards they refresh only on demand.
    #[instrument(skip(self, events))]
    pub async fn initial_refresh(
        &self,
        events: &mpsc::Sender<CacheEvent>,
    ) -> anyhow::Result<()> {
        let refreshed = [
            self.read_event(&self.accounts.asks, Resource::Asks).await?,
            self.read_event(&self.accounts.bids, Resource::Bids).await?,
            self.read_event(&self.accounts.open_orders, Resource::OpenOrders)
                .await?,
            self.read_event(&self.accounts.base_wallet, Resource::BaseWallet)
                .await?,
            self.read_event(&self.accounts.quote_wallet, Resource::QuoteWallet)
                .await?,
            self.read_event(&self.accounts.pool_base_reserve, Resource::PoolBase)
                .await?,
            self.read_event(&self.accounts.pool_quote_reserve, Resource::PoolQuote)
                .await?,
        ];
        for event in refreshed {
            events.send(event).await?;
        }
        info!("Initial account refresh complete");
        Ok(())
    }

    /// Re-read the bid side on demand; there is no subscription behind it.
    pub async fn refresh_bids(
        &self,
        events: &mpsc::Sender<CacheEvent>,
    ) -> anyhow::Result<()> {
        let event = self.read_event(&self.accounts.bids, Resource::Bids).await?;
        events.send(event).await?;
        Ok(())
    }

    /// Subscribe to every push-capable account and spawn its pump.
    #[instrument(skip(self, events))]
    pub async fn spawn_pumps(
        &self,
        events: mpsc::Sender<CacheEvent>,
    ) -> anyhow::Result<()> {
        let pumps = [
            (self.accounts.asks.clone(), Resource::Asks),
            (self.accounts.open_orders.clone(), Resource::OpenOrders),
            (self.accounts.base_wallet.clone(), Resource::BaseWallet),
            (self.accounts.quote_wallet.clone(), Resource::QuoteWallet),
            (self.accounts.pool_base_reserve.clone(), Resource::PoolBase),
            (self.accounts.pool_quote_reserve.clone(), Resource::PoolQuote),
        ];
        for (address, resource) in pumps {
            let mut payloads = self.ledger.subscribe_account(&address).await?;
            let me = self.clone();
            let tx = events.clone();
            tokio::spawn(async move {
                info!(account = %address, resource = resource.name(), "Pump started");
                while let Some(payload) = payloads.recv().await {
                    match me.decode(&payload, resource) {
                        Ok(event) => {
                            if tx.send(event).await.is_err() {
                                break;
                            }
                        }
                        Err(err) => {
                            warn!(
                                account = %address,
                                resource = resource.name(),
                                error = %err,
                                "Dropping undecodable push"
                            );
                        }
                    }
                }
                info!(account = %address, "Pump stopped");
            });
        }
        Ok(())
    }

    async fn read_event(
        &self,
        address: &str,
        resource: Resource,
    ) -> anyhow::Result<CacheEvent> {
        let owned = address.to_string();
        let payload = self.ledger.read_account(&owned).await?;
        Ok(self.decode(&payload, resource)?)
    }

    fn decode(
        &self,
        payload: &[u8],
        resource: Resource,
    ) -> Result<CacheEvent, crate::ports::decoder::DecodeError> {
        match resource {
            Resource::Asks => {
                let view = self.decoder.decode_book_side(payload)?;
                Ok(CacheEvent::AskBook {
                    orders: view.orders,
                    levels: view.levels,
                })
            }
            Resource::Bids => {
                let view = self.decoder.decode_book_side(payload)?;
                Ok(CacheEvent::BidBook {
                    levels: view.levels,
                })
            }
            Resource::OpenOrders => {
                let view = self.decoder.decode_open_orders(payload)?;
                Ok(CacheEvent::OpenOrders {
                    base_unsettled: view.base_unsettled,
                    quote_unsettled: view.quote_unsettled,
                })
            }
            Resource::BaseWallet => Ok(CacheEvent::BaseWallet(
                self.decoder
                    .decode_token_amount(payload, self.accounts.base_decimals)?,
            )),
            Resource::QuoteWallet => Ok(CacheEvent::QuoteWallet(
                self.decoder
                    .decode_token_amount(payload, self.accounts.quote_decimals)?,
            )),
            Resource::PoolBase => Ok(CacheEvent::PoolBase(
                self.decoder
                    .decode_token_amount(payload, self.accounts.base_decimals)?,
            )),
            Resource::PoolQuote => Ok(CacheEvent::PoolQuote(
                self.decoder
                    .decode_token_amount(payload, self.accounts.quote_decimals)?,
            )),
        }
    }
}

/// Which cache resource a subscription feeds.
#[derive(Debug, Clone, Copy)]
enum Resource {
    Asks,
    Bids,
    OpenOrders,
    BaseWallet,
    QuoteWallet,
    PoolBase,
    PoolQuote,
}

impl Resource {
    fn name(self) -> &'static str {
        match self {
            Self::Asks => "asks",
            Self::Bids => "bids",
            Self::OpenOrders => "open_orders",
            Self::BaseWallet => "base_wallet",
            Self::QuoteWallet => "quote_wallet",
            Self::PoolBase => "pool_base",
            Self::PoolQuote => "pool_quote",
        }
    }
}
