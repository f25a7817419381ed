//! Asset registry
//!
//! Typed load / create / store for the five entity kinds, keyed by natural
//! ID, plus the `model~number` battery index and the battery read surface
//! (range scans, rich queries, history, ownership transfers).

use crate::{
    arith,
    args::Args,
    config::SettlementConfig,
    dispatch::{Operation, Response},
    types::{
        Battery, BatteryStatus, Fleet, Network, NetworkStatus, Station, User, DOC_BATTERY,
        DOC_FLEET, DOC_NETWORK, DOC_STATION, DOC_USER,
    },
    Error, Result,
};
use chrono::{DateTime, Utc};
use ledger_core::{KeyValue, LedgerStub};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use std::marker::PhantomData;

/// Composite index of batteries by model: `(modelNumber, batteryId)`
pub const MODEL_INDEX: &str = "model~number";

/// State key holding the platform network ID
pub const PLATFORM_NETWORK_KEY: &str = "PlatformNetwork";

/// A record stored under its natural ID
pub trait Asset: Serialize + DeserializeOwned {
    /// Kind used in error messages
    const KIND: &'static str;
    /// `docType` stored with every record
    const DOC_TYPE: &'static str;
    /// Operation name that reads one record
    const READ_OPERATION: &'static str;

    /// Natural ID
    fn id(&self) -> &str;
}

impl Asset for Network {
    const KIND: &'static str = "Network";
    const DOC_TYPE: &'static str = DOC_NETWORK;
    const READ_OPERATION: &'static str = "ReadSSNetwork";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Asset for Station {
    const KIND: &'static str = "SwappingStation";
    const DOC_TYPE: &'static str = DOC_STATION;
    const READ_OPERATION: &'static str = "ReadSwappingStation";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Asset for Fleet {
    const KIND: &'static str = "Fleet";
    const DOC_TYPE: &'static str = DOC_FLEET;
    const READ_OPERATION: &'static str = "ReadFleet";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Asset for User {
    const KIND: &'static str = "User";
    const DOC_TYPE: &'static str = DOC_USER;
    const READ_OPERATION: &'static str = "ReadUser";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Asset for Battery {
    const KIND: &'static str = "Battery";
    const DOC_TYPE: &'static str = DOC_BATTERY;
    const READ_OPERATION: &'static str = "ReadBattery";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Decode a stored document if it has the expected `docType`
fn decode<A: Asset>(bytes: &[u8]) -> Result<Option<A>> {
    let document: Value = serde_json::from_slice(bytes)?;
    if document.get("docType").and_then(Value::as_str) != Some(A::DOC_TYPE) {
        return Ok(None);
    }
    Ok(Some(serde_json::from_value(document)?))
}

/// Load a record, `None` when the key is absent or holds another kind
pub fn try_load<A: Asset>(ledger: &dyn LedgerStub, id: &str) -> Result<Option<A>> {
    match ledger.get_state(id)? {
        Some(bytes) => decode(&bytes),
        None => Ok(None),
    }
}

/// Load a record or fail with NotFound
pub fn load<A: Asset>(ledger: &dyn LedgerStub, id: &str) -> Result<A> {
    try_load(ledger, id)?.ok_or_else(|| Error::not_found(A::KIND, id))
}

/// Whether any record occupies `id`
pub fn exists(ledger: &dyn LedgerStub, id: &str) -> Result<bool> {
    Ok(ledger.get_state(id)?.is_some())
}

/// Write a record under its ID
pub fn store<A: Asset>(ledger: &mut dyn LedgerStub, asset: &A) -> Result<()> {
    let bytes = serde_json::to_vec(asset)?;
    ledger.put_state(asset.id(), bytes)?;
    tracing::debug!(kind = A::KIND, id = asset.id(), "Record staged");
    Ok(())
}

/// Write a new record; the ID must be unused
pub fn create<A: Asset>(ledger: &mut dyn LedgerStub, asset: &A) -> Result<()> {
    if exists(ledger, asset.id())? {
        return Err(Error::already_exists(A::KIND, asset.id()));
    }
    store(ledger, asset)
}

/// Create a battery together with its model index entry
pub fn create_battery(ledger: &mut dyn LedgerStub, battery: &Battery) -> Result<()> {
    create(ledger, battery)?;
    let index_key = ledger.create_composite_key(
        MODEL_INDEX,
        &[battery.model_number.as_str(), battery.id.as_str()],
    )?;
    // Index entries carry no payload; a single NUL keeps the value non-empty
    ledger.put_state(&index_key, vec![0x00])?;
    Ok(())
}

/// Platform (root) network ID
pub fn platform_network_id(ledger: &dyn LedgerStub) -> Result<String> {
    let bytes = ledger
        .get_state(PLATFORM_NETWORK_KEY)?
        .ok_or_else(|| Error::not_found("PlatformNetwork", PLATFORM_NETWORK_KEY))?;
    String::from_utf8(bytes).map_err(|e| Error::Persistence(format!("platform network id: {}", e)))
}

/// Battery IDs of one model, ascending
pub fn battery_ids_by_model(ledger: &dyn LedgerStub, model: &str) -> Result<Vec<String>> {
    ledger
        .get_state_by_partial_composite_key(MODEL_INDEX, &[model])?
        .into_iter()
        .map(|kv| -> Result<String> {
            let (_, mut attributes) = ledger.split_composite_key(&kv.key)?;
            match (attributes.len(), attributes.pop()) {
                (2, Some(id)) => Ok(id),
                _ => Err(Error::Persistence(format!(
                    "malformed {} index entry",
                    MODEL_INDEX
                ))),
            }
        })
        .collect()
}

fn batteries_from(records: Vec<KeyValue>) -> Result<Vec<Battery>> {
    let mut batteries = Vec::with_capacity(records.len());
    for record in records {
        if let Some(battery) = decode::<Battery>(&record.value)? {
            batteries.push(battery);
        }
    }
    Ok(batteries)
}

/// Batteries of one model, by ascending ID
pub fn batteries_by_model(ledger: &dyn LedgerStub, model: &str) -> Result<Vec<Battery>> {
    battery_ids_by_model(ledger, model)?
        .iter()
        .map(|id| load::<Battery>(ledger, id))
        .collect()
}

/// Batteries matching a rich query
pub fn query_batteries(ledger: &dyn LedgerStub, query: &str) -> Result<Vec<Battery>> {
    batteries_from(ledger.get_query_result(query)?)
}

fn field_query(field: &str, value: &str) -> String {
    json!({ "selector": { "docType": DOC_BATTERY, (field): value } }).to_string()
}

/// One page of batteries
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatteryPage {
    /// Batteries in key order
    pub records: Vec<Battery>,
    /// Number of records in this page
    pub fetched_records_count: usize,
    /// Pass back to fetch the next page
    pub bookmark: String,
}

/// One version of a battery record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    /// Writing transaction
    pub tx_id: String,
    /// Commit time
    pub timestamp: DateTime<Utc>,
    /// Whether this version deleted the record
    pub is_delete: bool,
    /// Record as written, absent for deletes
    pub record: Option<Battery>,
}

/// Version chain of a battery, oldest first
pub fn battery_history(ledger: &dyn LedgerStub, id: &str) -> Result<Vec<HistoryRecord>> {
    ledger
        .get_history_for_key(id)?
        .into_iter()
        .map(|entry| -> Result<HistoryRecord> {
            let record = if entry.is_delete {
                None
            } else {
                Some(serde_json::from_slice(&entry.value)?)
            };
            Ok(HistoryRecord {
                tx_id: entry.tx_id.to_string(),
                timestamp: entry.timestamp,
                is_delete: entry.is_delete,
                record,
            })
        })
        .collect()
}

fn reassign_owner(ledger: &mut dyn LedgerStub, id: &str, new_owner: &str) -> Result<()> {
    let mut battery: Battery = load(ledger, id)?;
    battery.owner = new_owner.to_string();
    store(ledger, &battery)
}

// Operations

/// `InitializeSSNetwork(id, name, status)`
#[derive(Debug, Clone)]
pub struct InitializeNetwork {
    id: String,
    name: String,
    status: NetworkStatus,
}

impl Operation for InitializeNetwork {
    const NAME: &'static str = "InitializeSSNetwork";
    const ARITY: usize = 3;

    fn parse(args: Args<'_>) -> Result<Self> {
        Ok(Self {
            id: args.text(0)?,
            name: args.text(1)?,
            status: args.text(2)?.parse()?,
        })
    }

    fn execute(self, ledger: &mut dyn LedgerStub, _: &SettlementConfig) -> Result<Response> {
        create(ledger, &Network::new(self.id, self.name, self.status))?;
        Ok(Response::committed(ledger))
    }
}

/// `SetPlatformNetwork(networkId)`
#[derive(Debug, Clone)]
pub struct SetPlatformNetwork {
    network_id: String,
}

impl Operation for SetPlatformNetwork {
    const NAME: &'static str = "SetPlatformNetwork";
    const ARITY: usize = 1;

    fn parse(args: Args<'_>) -> Result<Self> {
        Ok(Self {
            network_id: args.text(0)?,
        })
    }

    fn execute(self, ledger: &mut dyn LedgerStub, _: &SettlementConfig) -> Result<Response> {
        load::<Network>(ledger, &self.network_id)?;
        ledger.put_state(PLATFORM_NETWORK_KEY, self.network_id.into_bytes())?;
        Ok(Response::committed(ledger))
    }
}

/// `InitializeSwappingStation(id, name, networkId, geo, address, license, email, contact, company)`
#[derive(Debug, Clone)]
pub struct InitializeStation {
    station: Station,
}

impl Operation for InitializeStation {
    const NAME: &'static str = "InitializeSwappingStation";
    const ARITY: usize = 9;

    fn parse(args: Args<'_>) -> Result<Self> {
        Ok(Self {
            station: Station {
                id: args.text(0)?,
                name: args.text(1)?,
                network_id: args.text(2)?,
                unverified_batteries: 0,
                total_batteries: 0,
                active_batteries: 0,
                expired_batteries: 0,
                discharged_batteries: 0,
                geo_coordinates: args.text(3)?,
                address: args.text(4)?,
                license_number: args.text(5)?,
                email_id: args.text(6)?,
                contact_number: args.text(7)?,
                company: args.text(8)?,
                doc_type: DOC_STATION.to_string(),
            },
        })
    }

    fn execute(self, ledger: &mut dyn LedgerStub, _: &SettlementConfig) -> Result<Response> {
        load::<Network>(ledger, &self.station.network_id)?;
        create(ledger, &self.station)?;
        Ok(Response::committed(ledger))
    }
}

/// `InitializeFleet(id, name, company, industry, email, contact, address)`
#[derive(Debug, Clone)]
pub struct InitializeFleet {
    fleet: Fleet,
}

impl Operation for InitializeFleet {
    const NAME: &'static str = "InitializeFleet";
    const ARITY: usize = 7;

    fn parse(args: Args<'_>) -> Result<Self> {
        Ok(Self {
            fleet: Fleet {
                id: args.text(0)?,
                name: args.text(1)?,
                total_batteries: 0,
                company: args.text(2)?,
                industry: args.text(3)?,
                email_id: args.text(4)?,
                contact_number: args.text(5)?,
                address: args.text(6)?,
                doc_type: DOC_FLEET.to_string(),
            },
        })
    }

    fn execute(self, ledger: &mut dyn LedgerStub, _: &SettlementConfig) -> Result<Response> {
        create(ledger, &self.fleet)?;
        Ok(Response::committed(ledger))
    }
}

/// `InitializeUser(id, name, address, aadhar, email, fleetId, company, mobile)`
///
/// `fleetId` may be empty for independent riders.
#[derive(Debug, Clone)]
pub struct InitializeUser {
    user: User,
}

impl Operation for InitializeUser {
    const NAME: &'static str = "InitializeUser";
    const ARITY: usize = 8;

    fn parse(args: Args<'_>) -> Result<Self> {
        Ok(Self {
            user: User {
                id: args.text(0)?,
                name: args.text(1)?,
                address: args.text(2)?,
                aadhar_number: args.text(3)?,
                email_id: args.text(4)?,
                fleet_id: args.optional_text(5)?,
                company: args.text(6)?,
                mobile_number: args.text(7)?,
                rented_battery: String::new(),
                wallet: 0.0,
                doc_type: DOC_USER.to_string(),
            },
        })
    }

    fn execute(self, ledger: &mut dyn LedgerStub, _: &SettlementConfig) -> Result<Response> {
        if !self.user.fleet_id.is_empty() {
            load::<Fleet>(ledger, &self.user.fleet_id)?;
        }
        create(ledger, &self.user)?;
        Ok(Response::committed(ledger))
    }
}

/// `InitializeBattery(id, model, soc, soh, energy, cdc, networkId, manufacturerId, manufactureDate)`
#[derive(Debug, Clone)]
pub struct InitializeBattery {
    battery: Battery,
}

impl Operation for InitializeBattery {
    const NAME: &'static str = "InitializeBattery";
    const ARITY: usize = 9;

    fn parse(args: Args<'_>) -> Result<Self> {
        let telemetry = args.telemetry(2)?;
        let network_id = args.text(6)?;
        Ok(Self {
            battery: Battery {
                id: args.text(0)?,
                model_number: args.text(1)?,
                soc: telemetry.soc,
                soh: telemetry.soh,
                energy_content: telemetry.energy_content,
                cdc: telemetry.cdc,
                docked_station: String::new(),
                allocated_to_fleet: String::new(),
                company: String::new(),
                escrowed_amount: 0.0,
                owner: network_id.clone(),
                network_id,
                user: String::new(),
                status: BatteryStatus::Undocked,
                manufacturer_id: args.text(7)?,
                manufacture_date: args.text(8)?,
                doc_type: DOC_BATTERY.to_string(),
            },
        })
    }

    fn execute(self, ledger: &mut dyn LedgerStub, _: &SettlementConfig) -> Result<Response> {
        load::<Network>(ledger, &self.battery.network_id)?;
        create_battery(ledger, &self.battery)?;
        tracing::info!(
            battery_id = %self.battery.id,
            model = %self.battery.model_number,
            network_id = %self.battery.network_id,
            "Battery issued"
        );
        Ok(Response::committed(ledger))
    }
}

/// `RechargeUserWallet(userId, amount)`
#[derive(Debug, Clone)]
pub struct RechargeUserWallet {
    user_id: String,
    amount: f64,
}

impl Operation for RechargeUserWallet {
    const NAME: &'static str = "RechargeUserWallet";
    const ARITY: usize = 2;

    fn parse(args: Args<'_>) -> Result<Self> {
        let amount = args.float(1, "amount")?;
        if amount <= 0.0 {
            return Err(Error::Validation(format!(
                "recharge amount must be positive, got {}",
                amount
            )));
        }
        Ok(Self {
            user_id: args.text(0)?,
            amount,
        })
    }

    fn execute(self, ledger: &mut dyn LedgerStub, _: &SettlementConfig) -> Result<Response> {
        let mut user: User = load(ledger, &self.user_id)?;
        user.wallet = arith::add_float(user.wallet, self.amount)?;
        store(ledger, &user)?;
        Ok(Response::committed(ledger))
    }
}

/// Read one record by ID (`ReadSSNetwork`, `ReadBattery`, ...)
#[derive(Debug, Clone)]
pub struct ReadRecord<A> {
    id: String,
    kind: PhantomData<A>,
}

impl<A: Asset> Operation for ReadRecord<A> {
    const NAME: &'static str = A::READ_OPERATION;
    const ARITY: usize = 1;

    fn parse(args: Args<'_>) -> Result<Self> {
        Ok(Self {
            id: args.text(0)?,
            kind: PhantomData,
        })
    }

    fn execute(self, ledger: &mut dyn LedgerStub, _: &SettlementConfig) -> Result<Response> {
        Response::document(&load::<A>(ledger, &self.id)?)
    }
}

/// `ReadBatteryHistory(batteryId)`
#[derive(Debug, Clone)]
pub struct ReadBatteryHistory {
    id: String,
}

impl Operation for ReadBatteryHistory {
    const NAME: &'static str = "ReadBatteryHistory";
    const ARITY: usize = 1;

    fn parse(args: Args<'_>) -> Result<Self> {
        Ok(Self { id: args.text(0)? })
    }

    fn execute(self, ledger: &mut dyn LedgerStub, _: &SettlementConfig) -> Result<Response> {
        Response::document(&battery_history(ledger, &self.id)?)
    }
}

/// `GetBatteriesByModel(model)`
#[derive(Debug, Clone)]
pub struct GetBatteriesByModel {
    model: String,
}

impl Operation for GetBatteriesByModel {
    const NAME: &'static str = "GetBatteriesByModel";
    const ARITY: usize = 1;

    fn parse(args: Args<'_>) -> Result<Self> {
        Ok(Self {
            model: args.text(0)?,
        })
    }

    fn execute(self, ledger: &mut dyn LedgerStub, _: &SettlementConfig) -> Result<Response> {
        Response::document(&batteries_by_model(ledger, &self.model)?)
    }
}

/// `GetBatteriesByRange(startKey, endKey)`; an empty end key is unbounded
#[derive(Debug, Clone)]
pub struct GetBatteriesByRange {
    start: String,
    end: String,
}

impl Operation for GetBatteriesByRange {
    const NAME: &'static str = "GetBatteriesByRange";
    const ARITY: usize = 2;

    fn parse(args: Args<'_>) -> Result<Self> {
        Ok(Self {
            start: args.optional_text(0)?,
            end: args.optional_text(1)?,
        })
    }

    fn execute(self, ledger: &mut dyn LedgerStub, _: &SettlementConfig) -> Result<Response> {
        let records = ledger.get_state_by_range(&self.start, &self.end)?;
        Response::document(&batteries_from(records)?)
    }
}

/// `GetBatteriesByRangeWithPagination(startKey, endKey, pageSize, bookmark)`
#[derive(Debug, Clone)]
pub struct GetBatteriesByRangeWithPagination {
    start: String,
    end: String,
    page_size: usize,
    bookmark: String,
}

impl Operation for GetBatteriesByRangeWithPagination {
    const NAME: &'static str = "GetBatteriesByRangeWithPagination";
    const ARITY: usize = 4;

    fn parse(args: Args<'_>) -> Result<Self> {
        Ok(Self {
            start: args.optional_text(0)?,
            end: args.optional_text(1)?,
            page_size: args.int(2, "pageSize")?,
            bookmark: args.optional_text(3)?,
        })
    }

    fn execute(self, ledger: &mut dyn LedgerStub, _: &SettlementConfig) -> Result<Response> {
        let page = ledger.get_state_by_range_with_pagination(
            &self.start,
            &self.end,
            self.page_size,
            &self.bookmark,
        )?;
        let records = batteries_from(page.records)?;
        Response::document(&BatteryPage {
            fetched_records_count: records.len(),
            records,
            bookmark: page.bookmark,
        })
    }
}

/// `QueryBatteries(query)`
#[derive(Debug, Clone)]
pub struct QueryBatteries {
    query: String,
}

impl Operation for QueryBatteries {
    const NAME: &'static str = "QueryBatteries";
    const ARITY: usize = 1;

    fn parse(args: Args<'_>) -> Result<Self> {
        Ok(Self {
            query: args.text(0)?,
        })
    }

    fn execute(self, ledger: &mut dyn LedgerStub, _: &SettlementConfig) -> Result<Response> {
        Response::document(&query_batteries(ledger, &self.query)?)
    }
}

/// `QueryBatteriesWithPagination(query, pageSize, bookmark)`
#[derive(Debug, Clone)]
pub struct QueryBatteriesWithPagination {
    query: String,
    page_size: usize,
    bookmark: String,
}

impl Operation for QueryBatteriesWithPagination {
    const NAME: &'static str = "QueryBatteriesWithPagination";
    const ARITY: usize = 3;

    fn parse(args: Args<'_>) -> Result<Self> {
        Ok(Self {
            query: args.text(0)?,
            page_size: args.int(1, "pageSize")?,
            bookmark: args.optional_text(2)?,
        })
    }

    fn execute(self, ledger: &mut dyn LedgerStub, _: &SettlementConfig) -> Result<Response> {
        let page =
            ledger.get_query_result_with_pagination(&self.query, self.page_size, &self.bookmark)?;
        let records = batteries_from(page.records)?;
        Response::document(&BatteryPage {
            fetched_records_count: records.len(),
            records,
            bookmark: page.bookmark,
        })
    }
}

/// `QueryBatteriesByOwner(owner)`
#[derive(Debug, Clone)]
pub struct QueryBatteriesByOwner {
    owner: String,
}

impl Operation for QueryBatteriesByOwner {
    const NAME: &'static str = "QueryBatteriesByOwner";
    const ARITY: usize = 1;

    fn parse(args: Args<'_>) -> Result<Self> {
        Ok(Self {
            owner: args.text(0)?,
        })
    }

    fn execute(self, ledger: &mut dyn LedgerStub, _: &SettlementConfig) -> Result<Response> {
        Response::document(&query_batteries(ledger, &field_query("owner", &self.owner))?)
    }
}

/// `QueryBatteriesByUser(user)`
#[derive(Debug, Clone)]
pub struct QueryBatteriesByUser {
    user: String,
}

impl Operation for QueryBatteriesByUser {
    const NAME: &'static str = "QueryBatteriesByUser";
    const ARITY: usize = 1;

    fn parse(args: Args<'_>) -> Result<Self> {
        Ok(Self {
            user: args.text(0)?,
        })
    }

    fn execute(self, ledger: &mut dyn LedgerStub, _: &SettlementConfig) -> Result<Response> {
        Response::document(&query_batteries(ledger, &field_query("user", &self.user))?)
    }
}

/// `TransferBatteryOwnership(batteryId, newOwner)`
#[derive(Debug, Clone)]
pub struct TransferBatteryOwnership {
    battery_id: String,
    new_owner: String,
}

impl Operation for TransferBatteryOwnership {
    const NAME: &'static str = "TransferBatteryOwnership";
    const ARITY: usize = 2;

    fn parse(args: Args<'_>) -> Result<Self> {
        Ok(Self {
            battery_id: args.text(0)?,
            new_owner: args.text(1)?,
        })
    }

    fn execute(self, ledger: &mut dyn LedgerStub, _: &SettlementConfig) -> Result<Response> {
        reassign_owner(ledger, &self.battery_id, &self.new_owner)?;
        Ok(Response::committed(ledger))
    }
}

/// `TransferBatteriesByModel(model, newOwner)`
#[derive(Debug, Clone)]
pub struct TransferBatteriesByModel {
    model: String,
    new_owner: String,
}

impl Operation for TransferBatteriesByModel {
    const NAME: &'static str = "TransferBatteriesByModel";
    const ARITY: usize = 2;

    fn parse(args: Args<'_>) -> Result<Self> {
        Ok(Self {
            model: args.text(0)?,
            new_owner: args.text(1)?,
        })
    }

    fn execute(self, ledger: &mut dyn LedgerStub, _: &SettlementConfig) -> Result<Response> {
        let ids = battery_ids_by_model(ledger, &self.model)?;
        for id in &ids {
            reassign_owner(ledger, id, &self.new_owner)?;
        }
        tracing::info!(
            model = %self.model,
            new_owner = %self.new_owner,
            count = ids.len(),
            "Batteries reassigned by model"
        );
        Ok(Response::committed(ledger))
    }
}
