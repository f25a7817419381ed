//! Operation dispatch
//!
//! Every externally invocable operation is a typed request implementing
//! [`Operation`]. [`Dispatcher::new`] builds the name → handler table once;
//! each handler checks the argument count, parses the request and runs it.

use crate::{
    args::Args, audit, config::SettlementConfig, fleet, lifecycle, registry, trading,
    types::{Battery, Fleet, Network, Station, User},
    Error, Result,
};
use ledger_core::LedgerStub;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// Result of one invocation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    /// Mutation staged under this transaction ID
    TxId(String),
    /// Read result
    Document(Value),
}

impl Response {
    /// Acknowledge a mutation with the running transaction's ID
    pub fn committed(ledger: &dyn LedgerStub) -> Self {
        Response::TxId(ledger.tx_id().to_string())
    }

    /// Serialize a read result
    pub fn document<T: Serialize>(value: &T) -> Result<Self> {
        Ok(Response::Document(serde_json::to_value(value)?))
    }
}

/// A typed request on the invocation surface
pub trait Operation: Sized {
    /// Wire name
    const NAME: &'static str;
    /// Exact argument count
    const ARITY: usize;

    /// Parse positional arguments
    fn parse(args: Args<'_>) -> Result<Self>;

    /// Run against the open transaction
    fn execute(self, ledger: &mut dyn LedgerStub, settlement: &SettlementConfig)
        -> Result<Response>;
}

/// Type-erased handler stored in the table
pub type Handler = fn(&mut dyn LedgerStub, &SettlementConfig, &[String]) -> Result<Response>;

fn handle<O: Operation>(
    ledger: &mut dyn LedgerStub,
    settlement: &SettlementConfig,
    values: &[String],
) -> Result<Response> {
    let args = Args::new(O::NAME, values, O::ARITY)?;
    O::parse(args)?.execute(ledger, settlement)
}

/// Name → handler lookup table
#[derive(Clone)]
pub struct Dispatcher {
    handlers: HashMap<&'static str, Handler>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("operations", &self.handlers.len())
            .finish()
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    /// Table with every operation registered
    pub fn new() -> Self {
        let mut dispatcher = Self {
            handlers: HashMap::new(),
        };

        // Registry
        dispatcher.register::<registry::InitializeNetwork>();
        dispatcher.register::<registry::SetPlatformNetwork>();
        dispatcher.register::<registry::InitializeStation>();
        dispatcher.register::<registry::InitializeFleet>();
        dispatcher.register::<registry::InitializeUser>();
        dispatcher.register::<registry::InitializeBattery>();
        dispatcher.register::<registry::RechargeUserWallet>();
        dispatcher.register::<registry::ReadRecord<Network>>();
        dispatcher.register::<registry::ReadRecord<Station>>();
        dispatcher.register::<registry::ReadRecord<Fleet>>();
        dispatcher.register::<registry::ReadRecord<User>>();
        dispatcher.register::<registry::ReadRecord<Battery>>();
        dispatcher.register::<registry::ReadBatteryHistory>();
        dispatcher.register::<registry::GetBatteriesByModel>();
        dispatcher.register::<registry::GetBatteriesByRange>();
        dispatcher.register::<registry::GetBatteriesByRangeWithPagination>();
        dispatcher.register::<registry::QueryBatteries>();
        dispatcher.register::<registry::QueryBatteriesWithPagination>();
        dispatcher.register::<registry::QueryBatteriesByOwner>();
        dispatcher.register::<registry::QueryBatteriesByUser>();
        dispatcher.register::<registry::TransferBatteryOwnership>();
        dispatcher.register::<registry::TransferBatteriesByModel>();

        // Lifecycle
        dispatcher.register::<lifecycle::DockBattery>();
        dispatcher.register::<lifecycle::DockOonBattery>();
        dispatcher.register::<lifecycle::VerifyOonBattery>();
        dispatcher.alias("VerifyOONBatteryOnSS", lifecycle::VerifyOonBattery::NAME);
        dispatcher.register::<lifecycle::RentBattery>();
        dispatcher.register::<lifecycle::ReturnBattery>();
        dispatcher.register::<lifecycle::ReturnFromService>();
        dispatcher.register::<lifecycle::MarkStolen>();
        dispatcher.register::<lifecycle::MarkError>();
        dispatcher.register::<lifecycle::MarkExpired>();

        // Fleets
        dispatcher.register::<fleet::AllocateBattery>();
        dispatcher.register::<fleet::DeallocateBattery>();
        dispatcher.register::<fleet::TransferBetweenFleets>();
        dispatcher.register::<fleet::GenerateFleetReport>();

        // Audit
        dispatcher.register::<audit::AuditStationCounters>();
        dispatcher.register::<audit::AuditNetworkCounters>();

        // Energy trading
        dispatcher.register::<trading::UpdateUserProfile>();
        dispatcher.register::<trading::SignPlatformContract>();
        dispatcher.register::<trading::SignTradingContract>();
        dispatcher.register::<trading::RecordPayment>();
        dispatcher.register::<trading::RegisterOrder>();
        dispatcher.register::<trading::ProcessBidMatch>();
        dispatcher.register::<trading::ProcessEnergyBid>();
        dispatcher.register::<trading::ReadTradingRecord<trading::UserProfile>>();
        dispatcher.register::<trading::ReadTradingRecord<trading::PlatformContract>>();
        dispatcher.register::<trading::ReadTradingRecord<trading::TradingContract>>();
        dispatcher.register::<trading::ReadTradingRecord<trading::Payment>>();
        dispatcher.register::<trading::ReadTradingRecord<trading::PaymentDetail>>();
        dispatcher.register::<trading::ReadTradingRecord<trading::Order>>();
        dispatcher.register::<trading::ReadTradingRecord<trading::BidMatch>>();
        dispatcher.register::<trading::ReadTradingRecord<trading::EnergyBid>>();

        dispatcher
    }

    fn register<O: Operation>(&mut self) {
        self.handlers.insert(O::NAME, handle::<O>);
    }

    fn alias(&mut self, alias: &'static str, target: &'static str) {
        if let Some(handler) = self.handlers.get(target).copied() {
            self.handlers.insert(alias, handler);
        }
    }

    /// Handler for an operation name
    pub fn handler(&self, operation: &str) -> Result<Handler> {
        self.handlers.get(operation).copied().ok_or_else(|| {
            Error::Validation(format!(
                "Received unknown invoke function name - '{}'",
                operation
            ))
        })
    }

    /// The registered spelling of `operation`, if it is registered
    pub fn registered_name(&self, operation: &str) -> Option<&'static str> {
        self.handlers.get_key_value(operation).map(|(name, _)| *name)
    }

    /// Registered operation names, sorted
    pub fn operations(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.handlers.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Run one operation against an open transaction
    pub fn dispatch(
        &self,
        ledger: &mut dyn LedgerStub,
        settlement: &SettlementConfig,
        operation: &str,
        args: &[String],
    ) -> Result<Response> {
        let handler = self.handler(operation)?;
        handler(ledger, settlement, args)
    }
}
