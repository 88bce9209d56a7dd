//! Domain layer - Core control-loop logic and models.
//!
//! Pure decision and pricing logic for the market-making controller.
//! No transport or venue dependencies here (hexagonal inner ring); every
//! type in this module is testable in isolation.

pub mod book;
pub mod clock;
pub mod policy;
pub mod rate;
pub mod state;

// Re-export core types for convenience
pub use book::{better_level, round_to_tick, tick_size, AccountId, Level, MarketSnapshot, RestingOrder};
pub use clock::{ActionClock, ActionKind, DEFAULT_COOLDOWN};
pub use policy::{CancelDiagnostics, Decision, DecisionPolicy};
pub use rate::{swap_rate, PoolReserves, SwapVenue, REFERENCE_NOTIONAL};
pub use state::{BotState, CacheEvent, LastOrder, TokenBalance, UserAccount};
