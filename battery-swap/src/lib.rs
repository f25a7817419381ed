//! Battery Swap
//!
//! Asset lifecycle and settlement engine for a battery-swapping network,
//! running on the transactional world state of [`ledger_core`].
//!
//! # Architecture
//!
//! - **Registry**: networks, stations, fleets, users and batteries keyed by
//!   natural ID, plus a `model~number` composite index
//! - **Lifecycle**: battery custody transitions with their counter deltas
//! - **Settlement**: escrow split between renter, networks and platform on
//!   return
//! - **Dispatch**: operation name + string arguments → typed request
//! - **Contract**: one invocation = one atomic transaction
//!
//! # Invariants
//!
//! - A failed invocation stages nothing
//! - Counters and wallets never overflow
//! - Escrow is non-zero only while a battery is rented

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod arith;
pub mod args;
pub mod audit;
pub mod config;
pub mod contract;
pub mod dispatch;
pub mod error;
pub mod fleet;
pub mod lifecycle;
pub mod metrics;
pub mod registry;
pub mod settlement;
pub mod trading;
pub mod types;

// Re-exports
pub use config::{Config, LogConfig, SettlementConfig};
pub use contract::SwapContract;
pub use dispatch::{Dispatcher, Operation, Response};
pub use error::{Error, Result};
pub use metrics::Metrics;
pub use settlement::SettlementBreakdown;
pub use types::{Battery, BatteryStatus, Fleet, Network, NetworkStatus, Station, User};
