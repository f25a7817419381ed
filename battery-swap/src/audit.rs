//! Counter audit
//!
//! Station and network counters are maintained incrementally by every
//! transition. The audit replays each battery's committed versions through
//! the same per-transition deltas and reports where the recorded counters
//! disagree. It never writes.

use crate::{
    arith,
    args::Args,
    config::SettlementConfig,
    dispatch::{Operation, Response},
    registry::{battery_history, load, query_batteries},
    types::{Battery, BatteryStatus, Network, Station, DOC_BATTERY},
    Result,
};
use ledger_core::LedgerStub;
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;

const UNVERIFIED: &str = "unverifiedBatteries";
const DISCHARGED: &str = "dischargedBatteries";
const ACTIVE: &str = "activeBatteries";
const TOTAL: &str = "totalBatteries";
const EXPIRED: &str = "expiredBatteries";

/// Recorded vs. observed value of one counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CounterCheck {
    /// Value stored on the record
    pub recorded: i64,
    /// Value replayed from battery history
    pub observed: i64,
    /// `recorded - observed`
    pub drift: i64,
}

impl CounterCheck {
    fn new(recorded: i64, observed: i64) -> Self {
        Self {
            recorded,
            observed,
            drift: recorded.saturating_sub(observed),
        }
    }
}

/// Audit result for one station or network
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterAudit {
    /// Station or network ID
    pub id: String,
    /// Counter name → check
    pub counters: BTreeMap<&'static str, CounterCheck>,
}

impl CounterAudit {
    /// Whether every counter matches
    pub fn is_consistent(&self) -> bool {
        self.counters.values().all(|c| c.drift == 0)
    }
}

/// Counter values rebuilt from battery versions, keyed by `(recordId, counter)`
///
/// Stations and networks share the world-state key space, so one map holds
/// both.
#[derive(Debug, Default)]
struct Replay {
    counters: BTreeMap<(String, &'static str), i64>,
}

impl Replay {
    fn bump(&mut self, id: &str, counter: &'static str, delta: i64) -> Result<()> {
        let slot = self.counters.entry((id.to_string(), counter)).or_insert(0);
        *slot = arith::adjust_counter(*slot, delta, counter)?;
        Ok(())
    }

    fn get(&self, id: &str, counter: &'static str) -> i64 {
        self.counters
            .get(&(id.to_string(), counter))
            .copied()
            .unwrap_or(0)
    }

    /// Apply the deltas of one version change
    fn step(&mut self, prev: Option<&Battery>, next: &Battery) -> Result<()> {
        use BatteryStatus::*;

        let station = next.docked_station.as_str();
        let network = next.network_id.as_str();
        match (prev.map(|b| b.status), next.status) {
            (Some(from), to) if from == to => {}
            // Out-of-network arrival
            (None, Unverified) => {
                self.bump(station, UNVERIFIED, 1)?;
                self.bump(network, UNVERIFIED, 1)?;
            }
            (None, _) => {}
            (Some(Undocked), InService) => {
                self.bump(station, TOTAL, 1)?;
                self.bump(station, DISCHARGED, 1)?;
            }
            (Some(Unverified), InService) => {
                self.bump(network, UNVERIFIED, -1)?;
                self.bump(network, TOTAL, 1)?;
                self.bump(station, UNVERIFIED, -1)?;
                self.bump(station, TOTAL, 1)?;
                self.bump(station, DISCHARGED, 1)?;
            }
            // Return from rental, to the station now docked at
            (Some(_), InService) => {
                self.bump(station, DISCHARGED, 1)?;
                self.bump(station, TOTAL, 1)?;
            }
            (Some(_), InUse) => {
                self.bump(station, ACTIVE, -1)?;
                self.bump(station, TOTAL, -1)?;
            }
            (Some(_), Available) => {
                self.bump(station, ACTIVE, 1)?;
                self.bump(station, DISCHARGED, -1)?;
            }
            (Some(_), Expired) => {
                self.bump(station, EXPIRED, 1)?;
                self.bump(network, EXPIRED, 1)?;
            }
            (Some(_), Undocked | Unverified | Stolen | Error) => {}
        }
        Ok(())
    }

    /// Replay the committed versions of every battery matching `selector`
    fn run(ledger: &dyn LedgerStub, selector: serde_json::Value) -> Result<Self> {
        let query = json!({ "selector": selector }).to_string();
        let mut replay = Self::default();
        for battery in query_batteries(ledger, &query)? {
            let mut prev: Option<Battery> = None;
            for version in battery_history(ledger, &battery.id)? {
                if let Some(next) = &version.record {
                    replay.step(prev.as_ref(), next)?;
                }
                prev = version.record;
            }
        }
        Ok(replay)
    }
}

/// Audit a station against every battery that ever passed through it
pub fn audit_station(ledger: &dyn LedgerStub, station_id: &str) -> Result<CounterAudit> {
    let station: Station = load(ledger, station_id)?;
    let replay = Replay::run(ledger, json!({ "docType": DOC_BATTERY }))?;

    let counters = [
        (UNVERIFIED, station.unverified_batteries),
        (DISCHARGED, station.discharged_batteries),
        (ACTIVE, station.active_batteries),
        (TOTAL, station.total_batteries),
        (EXPIRED, station.expired_batteries),
    ]
    .into_iter()
    .map(|(name, recorded)| (name, CounterCheck::new(recorded, replay.get(&station.id, name))))
    .collect();

    let audit = CounterAudit {
        id: station.id,
        counters,
    };
    if !audit.is_consistent() {
        tracing::warn!(station = %audit.id, "Station counter drift detected");
    }
    Ok(audit)
}

/// Audit a network against the batteries homed there
pub fn audit_network(ledger: &dyn LedgerStub, network_id: &str) -> Result<CounterAudit> {
    let network: Network = load(ledger, network_id)?;
    let replay = Replay::run(
        ledger,
        json!({ "docType": DOC_BATTERY, "id_Network": network.id.as_str() }),
    )?;

    let counters = [
        (UNVERIFIED, network.unverified_batteries),
        (TOTAL, network.total_batteries),
        (EXPIRED, network.expired_batteries),
    ]
    .into_iter()
    .map(|(name, recorded)| (name, CounterCheck::new(recorded, replay.get(&network.id, name))))
    .collect();

    let audit = CounterAudit {
        id: network.id,
        counters,
    };
    if !audit.is_consistent() {
        tracing::warn!(network = %audit.id, "Network counter drift detected");
    }
    Ok(audit)
}

/// `AuditStationCounters(stationId)`
#[derive(Debug, Clone)]
pub struct AuditStationCounters {
    station_id: String,
}

impl Operation for AuditStationCounters {
    const NAME: &'static str = "AuditStationCounters";
    const ARITY: usize = 1;

    fn parse(args: Args<'_>) -> Result<Self> {
        Ok(Self {
            station_id: args.text(0)?,
        })
    }

    fn execute(self, ledger: &mut dyn LedgerStub, _: &SettlementConfig) -> Result<Response> {
        Response::document(&audit_station(ledger, &self.station_id)?)
    }
}

/// `AuditNetworkCounters(networkId)`
#[derive(Debug, Clone)]
pub struct AuditNetworkCounters {
    network_id: String,
}

impl Operation for AuditNetworkCounters {
    const NAME: &'static str = "AuditNetworkCounters";
    const ARITY: usize = 1;

    fn parse(args: Args<'_>) -> Result<Self> {
        Ok(Self {
            network_id: args.text(0)?,
        })
    }

    fn execute(self, ledger: &mut dyn LedgerStub, _: &SettlementConfig) -> Result<Response> {
        Response::document(&audit_network(ledger, &self.network_id)?)
    }
}
