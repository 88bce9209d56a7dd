//! Use Cases Layer - Control Loop Orchestration
//!
//! Wires the domain decision logic to the ports: state sync keeps the
//! cache fed, the action runner executes corrective actions, and the
//! controller drives the single-writer decision loop.

pub mod actions;
pub mod controller;
pub mod sync;

pub use actions::{ActionRunner, PlaceOutcome};
pub use controller::Controller;
pub use sync::{StateSync, WatchedAccounts};
