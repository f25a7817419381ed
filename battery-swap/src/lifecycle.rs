//! Battery lifecycle transitions
//!
//! ```text
//! Undocked ──dock──▶ In_Service ──service──▶ Available ──rent──▶ In_Use
//!                        ▲                                         │
//! Unverified ──verify────┘◀──────────────return────────────────────┘
//!
//! any ──▶ Stolen | Error | Expired
//! ```
//!
//! Each transition resolves every referenced record before staging a write,
//! then stages the battery together with the station, network and user
//! counter deltas it implies.

use crate::{
    arith,
    args::Args,
    config::SettlementConfig,
    dispatch::{Operation, Response},
    registry::{self, load, store},
    settlement::{self, Parties},
    types::{Battery, BatteryStatus, Network, Station, Telemetry, User, DOC_BATTERY},
    Error, Result,
};
use ledger_core::LedgerStub;

fn require_status(battery: &Battery, expected: BatteryStatus, action: &str) -> Result<()> {
    if battery.status != expected {
        return Err(Error::Precondition(format!(
            "cannot {} battery {}: status is {}, expected {}",
            action, battery.id, battery.status, expected
        )));
    }
    Ok(())
}

fn reject_status(battery: &Battery, forbidden: BatteryStatus, action: &str) -> Result<()> {
    if battery.status == forbidden {
        return Err(Error::Precondition(format!(
            "cannot {} battery {}: status is already {}",
            action, battery.id, battery.status
        )));
    }
    Ok(())
}

fn require_docked(battery: &Battery, action: &str) -> Result<()> {
    if !battery.is_docked() {
        return Err(Error::Precondition(format!(
            "cannot {} battery {}: never docked at a swapping station",
            action, battery.id
        )));
    }
    Ok(())
}

fn require_same_company(left: &str, right: &str, what: &str) -> Result<()> {
    if left != right {
        return Err(Error::Precondition(format!(
            "{} company mismatch: {:?} != {:?}",
            what, left, right
        )));
    }
    Ok(())
}

fn log_transition(battery: &Battery, from: BatteryStatus) {
    tracing::info!(
        battery_id = %battery.id,
        from = %from,
        to = %battery.status,
        station = %battery.docked_station,
        "Battery transition"
    );
}

/// `DockBatteryOnSwappingStation(batteryId, soc, soh, energy, cdc, stationId)`
#[derive(Debug, Clone)]
pub struct DockBattery {
    battery_id: String,
    telemetry: Telemetry,
    station_id: String,
}

impl Operation for DockBattery {
    const NAME: &'static str = "DockBatteryOnSwappingStation";
    const ARITY: usize = 6;

    fn parse(args: Args<'_>) -> Result<Self> {
        Ok(Self {
            battery_id: args.text(0)?,
            telemetry: args.telemetry(1)?,
            station_id: args.text(5)?,
        })
    }

    fn execute(self, ledger: &mut dyn LedgerStub, _: &SettlementConfig) -> Result<Response> {
        let mut battery: Battery = load(ledger, &self.battery_id)?;
        let mut station: Station = load(ledger, &self.station_id)?;

        require_status(&battery, BatteryStatus::Undocked, "dock")?;
        require_same_company(&station.company, &battery.company, "station/battery")?;

        station.total_batteries = arith::adjust_counter(station.total_batteries, 1, "totalBatteries")?;
        station.discharged_batteries =
            arith::adjust_counter(station.discharged_batteries, 1, "dischargedBatteries")?;

        let from = battery.status;
        battery.apply_telemetry(&self.telemetry);
        battery.docked_station = station.id.clone();
        battery.status = BatteryStatus::InService;

        store(ledger, &station)?;
        store(ledger, &battery)?;
        log_transition(&battery, from);
        Ok(Response::committed(ledger))
    }
}

/// `DockOONBatteryOnSwappingStation(batteryId, networkId, stationId, userId, model, manufacturerId, manufactureDate)`
///
/// Registers a battery arriving from outside the platform. It stays
/// `Unverified` until [`VerifyOonBattery`] accepts it.
#[derive(Debug, Clone)]
pub struct DockOonBattery {
    battery_id: String,
    network_id: String,
    station_id: String,
    user_id: String,
    model_number: String,
    manufacturer_id: String,
    manufacture_date: String,
}

impl Operation for DockOonBattery {
    const NAME: &'static str = "DockOONBatteryOnSwappingStation";
    const ARITY: usize = 7;

    fn parse(args: Args<'_>) -> Result<Self> {
        Ok(Self {
            battery_id: args.text(0)?,
            network_id: args.text(1)?,
            station_id: args.text(2)?,
            user_id: args.text(3)?,
            model_number: args.text(4)?,
            manufacturer_id: args.text(5)?,
            manufacture_date: args.text(6)?,
        })
    }

    fn execute(self, ledger: &mut dyn LedgerStub, _: &SettlementConfig) -> Result<Response> {
        if registry::exists(ledger, &self.battery_id)? {
            return Err(Error::already_exists("Battery", self.battery_id));
        }
        let mut network: Network = load(ledger, &self.network_id)?;
        let mut station: Station = load(ledger, &self.station_id)?;
        load::<User>(ledger, &self.user_id)?;

        network.unverified_batteries =
            arith::adjust_counter(network.unverified_batteries, 1, "unverifiedBatteries")?;
        station.unverified_batteries =
            arith::adjust_counter(station.unverified_batteries, 1, "unverifiedBatteries")?;

        let battery = Battery {
            id: self.battery_id,
            model_number: self.model_number,
            soc: 0,
            soh: 0,
            energy_content: 0.0,
            cdc: 0,
            docked_station: station.id.clone(),
            allocated_to_fleet: String::new(),
            company: station.company.clone(),
            escrowed_amount: 0.0,
            network_id: network.id.clone(),
            user: String::new(),
            owner: self.user_id,
            status: BatteryStatus::Unverified,
            manufacturer_id: self.manufacturer_id,
            manufacture_date: self.manufacture_date,
            doc_type: DOC_BATTERY.to_string(),
        };

        store(ledger, &network)?;
        store(ledger, &station)?;
        registry::create_battery(ledger, &battery)?;
        tracing::info!(
            battery_id = %battery.id,
            network_id = %network.id,
            station = %station.id,
            "Out-of-network battery docked"
        );
        Ok(Response::committed(ledger))
    }
}

/// `VerifiyOONBatteryOnSS(batteryId, soc, soh, energy, cdc)`
#[derive(Debug, Clone)]
pub struct VerifyOonBattery {
    battery_id: String,
    telemetry: Telemetry,
}

impl Operation for VerifyOonBattery {
    const NAME: &'static str = "VerifiyOONBatteryOnSS";
    const ARITY: usize = 5;

    fn parse(args: Args<'_>) -> Result<Self> {
        Ok(Self {
            battery_id: args.text(0)?,
            telemetry: args.telemetry(1)?,
        })
    }

    fn execute(self, ledger: &mut dyn LedgerStub, _: &SettlementConfig) -> Result<Response> {
        let mut battery: Battery = load(ledger, &self.battery_id)?;
        require_status(&battery, BatteryStatus::Unverified, "verify")?;
        let mut network: Network = load(ledger, &battery.network_id)?;
        let mut station: Station = load(ledger, &battery.docked_station)?;

        network.unverified_batteries =
            arith::adjust_counter(network.unverified_batteries, -1, "unverifiedBatteries")?;
        network.total_batteries = arith::adjust_counter(network.total_batteries, 1, "totalBatteries")?;
        station.unverified_batteries =
            arith::adjust_counter(station.unverified_batteries, -1, "unverifiedBatteries")?;
        station.total_batteries = arith::adjust_counter(station.total_batteries, 1, "totalBatteries")?;
        station.discharged_batteries =
            arith::adjust_counter(station.discharged_batteries, 1, "dischargedBatteries")?;

        let from = battery.status;
        battery.apply_telemetry(&self.telemetry);
        battery.status = BatteryStatus::InService;

        store(ledger, &network)?;
        store(ledger, &station)?;
        store(ledger, &battery)?;
        log_transition(&battery, from);
        Ok(Response::committed(ledger))
    }
}

/// `TransferBatteryFromSSToUser(batteryId, soc, soh, energy, cdc, userId, charge)`
///
/// Rents a docked battery out. `charge` moves from the renter's wallet into
/// escrow and the supplied energy content becomes the rental's starting
/// energy.
#[derive(Debug, Clone)]
pub struct RentBattery {
    battery_id: String,
    telemetry: Telemetry,
    user_id: String,
    charge: f64,
}

impl Operation for RentBattery {
    const NAME: &'static str = "TransferBatteryFromSSToUser";
    const ARITY: usize = 7;

    fn parse(args: Args<'_>) -> Result<Self> {
        let charge = args.float(6, "charge")?;
        if charge <= 0.0 {
            return Err(Error::Validation(format!(
                "charge must be positive, got {}",
                charge
            )));
        }
        Ok(Self {
            battery_id: args.text(0)?,
            telemetry: args.telemetry(1)?,
            user_id: args.text(5)?,
            charge,
        })
    }

    fn execute(self, ledger: &mut dyn LedgerStub, _: &SettlementConfig) -> Result<Response> {
        let mut battery: Battery = load(ledger, &self.battery_id)?;
        let mut user: User = load(ledger, &self.user_id)?;
        reject_status(&battery, BatteryStatus::InUse, "rent")?;
        require_docked(&battery, "rent")?;
        let mut station: Station = load(ledger, &battery.docked_station)?;

        require_same_company(&station.company, &user.company, "station/user")?;
        if !user.rented_battery.is_empty() {
            return Err(Error::Precondition(format!(
                "user {} already rents battery {}",
                user.id, user.rented_battery
            )));
        }
        if user.wallet < self.charge {
            return Err(Error::Precondition(format!(
                "insufficient funds: wallet {} < charge {}",
                user.wallet, self.charge
            )));
        }

        user.wallet = arith::sub_float(user.wallet, self.charge)?;
        station.active_batteries =
            arith::adjust_counter(station.active_batteries, -1, "activeBatteries")?;
        station.total_batteries = arith::adjust_counter(station.total_batteries, -1, "totalBatteries")?;

        let from = battery.status;
        battery.apply_telemetry(&self.telemetry);
        battery.escrowed_amount = self.charge;
        battery.user = user.id.clone();
        battery.status = BatteryStatus::InUse;
        user.rented_battery = battery.id.clone();

        store(ledger, &user)?;
        store(ledger, &station)?;
        store(ledger, &battery)?;
        log_transition(&battery, from);
        Ok(Response::committed(ledger))
    }
}

/// `TransferBatteryFromUserToSS(batteryId, soc, soh, energy, cdc, stationId)`
///
/// Returns a rented battery to a station and settles its escrow.
#[derive(Debug, Clone)]
pub struct ReturnBattery {
    battery_id: String,
    telemetry: Telemetry,
    station_id: String,
}

impl Operation for ReturnBattery {
    const NAME: &'static str = "TransferBatteryFromUserToSS";
    const ARITY: usize = 6;

    fn parse(args: Args<'_>) -> Result<Self> {
        Ok(Self {
            battery_id: args.text(0)?,
            telemetry: args.telemetry(1)?,
            station_id: args.text(5)?,
        })
    }

    fn execute(self, ledger: &mut dyn LedgerStub, settings: &SettlementConfig) -> Result<Response> {
        let mut battery: Battery = load(ledger, &self.battery_id)?;
        reject_status(&battery, BatteryStatus::InService, "return")?;
        if battery.user.is_empty() {
            return Err(Error::Precondition(format!(
                "battery {} has no renter",
                battery.id
            )));
        }
        let mut user: User = load(ledger, &battery.user)?;
        let mut station: Station = load(ledger, &self.station_id)?;
        let platform = registry::platform_network_id(ledger)?;

        let parties = Parties {
            battery_network: &battery.network_id,
            station_network: &station.network_id,
            platform: &platform,
        };
        let breakdown = settlement::compute(
            battery.escrowed_amount,
            battery.energy_content,
            self.telemetry.energy_content,
            parties,
            settings,
        )?;

        station.discharged_batteries =
            arith::adjust_counter(station.discharged_batteries, 1, "dischargedBatteries")?;
        station.total_batteries = arith::adjust_counter(station.total_batteries, 1, "totalBatteries")?;

        settlement::apply(ledger, &breakdown, &platform, &mut user)?;

        let from = battery.status;
        battery.apply_telemetry(&self.telemetry);
        battery.docked_station = station.id.clone();
        battery.escrowed_amount = 0.0;
        battery.user.clear();
        battery.status = BatteryStatus::InService;
        user.rented_battery.clear();

        store(ledger, &user)?;
        store(ledger, &station)?;
        store(ledger, &battery)?;
        log_transition(&battery, from);
        Ok(Response::committed(ledger))
    }
}

/// `ReturnBatteryFromService(batteryId, soc, soh, energy, cdc)`
///
/// A charged battery becomes available for rent at its docked station.
#[derive(Debug, Clone)]
pub struct ReturnFromService {
    battery_id: String,
    telemetry: Telemetry,
}

impl Operation for ReturnFromService {
    const NAME: &'static str = "ReturnBatteryFromService";
    const ARITY: usize = 5;

    fn parse(args: Args<'_>) -> Result<Self> {
        Ok(Self {
            battery_id: args.text(0)?,
            telemetry: args.telemetry(1)?,
        })
    }

    fn execute(self, ledger: &mut dyn LedgerStub, _: &SettlementConfig) -> Result<Response> {
        let mut battery: Battery = load(ledger, &self.battery_id)?;
        reject_status(&battery, BatteryStatus::Available, "return from service")?;
        require_docked(&battery, "return from service")?;
        let mut station: Station = load(ledger, &battery.docked_station)?;

        station.active_batteries = arith::adjust_counter(station.active_batteries, 1, "activeBatteries")?;
        station.discharged_batteries =
            arith::adjust_counter(station.discharged_batteries, -1, "dischargedBatteries")?;

        let from = battery.status;
        battery.apply_telemetry(&self.telemetry);
        battery.status = BatteryStatus::Available;

        store(ledger, &station)?;
        store(ledger, &battery)?;
        log_transition(&battery, from);
        Ok(Response::committed(ledger))
    }
}

/// Side exit; a rented battery keeps its renter and escrow until returned
fn mark(ledger: &mut dyn LedgerStub, battery_id: &str, target: BatteryStatus) -> Result<Battery> {
    let mut battery: Battery = load(ledger, battery_id)?;
    reject_status(&battery, target, "mark")?;
    let from = battery.status;
    battery.status = target;
    store(ledger, &battery)?;
    log_transition(&battery, from);
    Ok(battery)
}

/// `MarkBatteryStolen(batteryId)`
#[derive(Debug, Clone)]
pub struct MarkStolen {
    battery_id: String,
}

impl Operation for MarkStolen {
    const NAME: &'static str = "MarkBatteryStolen";
    const ARITY: usize = 1;

    fn parse(args: Args<'_>) -> Result<Self> {
        Ok(Self {
            battery_id: args.text(0)?,
        })
    }

    fn execute(self, ledger: &mut dyn LedgerStub, _: &SettlementConfig) -> Result<Response> {
        mark(ledger, &self.battery_id, BatteryStatus::Stolen)?;
        Ok(Response::committed(ledger))
    }
}

/// `MarkBatteryError(batteryId)`
#[derive(Debug, Clone)]
pub struct MarkError {
    battery_id: String,
}

impl Operation for MarkError {
    const NAME: &'static str = "MarkBatteryError";
    const ARITY: usize = 1;

    fn parse(args: Args<'_>) -> Result<Self> {
        Ok(Self {
            battery_id: args.text(0)?,
        })
    }

    fn execute(self, ledger: &mut dyn LedgerStub, _: &SettlementConfig) -> Result<Response> {
        mark(ledger, &self.battery_id, BatteryStatus::Error)?;
        Ok(Response::committed(ledger))
    }
}

/// `MarkBatteryExpired(batteryId)`
///
/// Counted against the docked station and the battery's home network.
#[derive(Debug, Clone)]
pub struct MarkExpired {
    battery_id: String,
}

impl Operation for MarkExpired {
    const NAME: &'static str = "MarkBatteryExpired";
    const ARITY: usize = 1;

    fn parse(args: Args<'_>) -> Result<Self> {
        Ok(Self {
            battery_id: args.text(0)?,
        })
    }

    fn execute(self, ledger: &mut dyn LedgerStub, _: &SettlementConfig) -> Result<Response> {
        let battery: Battery = load(ledger, &self.battery_id)?;
        reject_status(&battery, BatteryStatus::Expired, "expire")?;
        require_docked(&battery, "expire")?;
        let mut station: Station = load(ledger, &battery.docked_station)?;
        let mut network: Network = load(ledger, &battery.network_id)?;

        station.expired_batteries =
            arith::adjust_counter(station.expired_batteries, 1, "expiredBatteries")?;
        network.expired_batteries =
            arith::adjust_counter(network.expired_batteries, 1, "expiredBatteries")?;

        store(ledger, &station)?;
        store(ledger, &network)?;
        mark(ledger, &self.battery_id, BatteryStatus::Expired)?;
        Ok(Response::committed(ledger))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NetworkStatus, DOC_STATION, DOC_USER};
    use ledger_core::{MemoryStore, TxContext};

    fn telemetry(energy: f64) -> Telemetry {
        Telemetry {
            soc: 80,
            soh: 95,
            energy_content: energy,
            cdc: 3,
        }
    }

    fn station(id: &str, network: &str) -> Station {
        Station {
            id: id.to_string(),
            name: id.to_string(),
            network_id: network.to_string(),
            unverified_batteries: 0,
            total_batteries: 0,
            active_batteries: 0,
            expired_batteries: 0,
            discharged_batteries: 0,
            geo_coordinates: "12.9,77.6".to_string(),
            address: "MG Road".to_string(),
            license_number: "LIC-1".to_string(),
            email_id: "ops@example.com".to_string(),
            contact_number: "555-0100".to_string(),
            company: "Acme".to_string(),
            doc_type: DOC_STATION.to_string(),
        }
    }

    fn user(id: &str, wallet: f64) -> User {
        User {
            id: id.to_string(),
            name: id.to_string(),
            address: "MG Road".to_string(),
            aadhar_number: "1234".to_string(),
            email_id: "rider@example.com".to_string(),
            fleet_id: String::new(),
            company: "Acme".to_string(),
            mobile_number: "555-0101".to_string(),
            rented_battery: String::new(),
            wallet,
            doc_type: DOC_USER.to_string(),
        }
    }

    fn battery(id: &str, status: BatteryStatus, docked: &str) -> Battery {
        Battery {
            id: id.to_string(),
            model_number: "EV-12V".to_string(),
            soc: 90,
            soh: 100,
            energy_content: 100.0,
            cdc: 0,
            docked_station: docked.to_string(),
            allocated_to_fleet: String::new(),
            company: "Acme".to_string(),
            escrowed_amount: 0.0,
            network_id: "OEM-1".to_string(),
            user: String::new(),
            owner: "OEM-1".to_string(),
            status,
            manufacturer_id: "M-1".to_string(),
            manufacture_date: "2023-01-01".to_string(),
            doc_type: DOC_BATTERY.to_string(),
        }
    }

    fn seed(tx: &mut TxContext<'_, MemoryStore>) {
        registry::create(tx, &Network::new("OEM-1", "Volt", NetworkStatus::Active)).unwrap();
        registry::create(tx, &station("SS-1", "OEM-1")).unwrap();
        registry::create(tx, &user("rider", 50.0)).unwrap();
    }

    #[test]
    fn test_dock_requires_undocked() {
        let store = MemoryStore::new();
        let mut tx = TxContext::new(&store);
        seed(&mut tx);
        registry::create_battery(&mut tx, &battery("B-1", BatteryStatus::Undocked, "")).unwrap();

        let dock = DockBattery {
            battery_id: "B-1".to_string(),
            telemetry: telemetry(90.0),
            station_id: "SS-1".to_string(),
        };
        dock.clone().execute(&mut tx, &SettlementConfig::default()).unwrap();

        let docked: Battery = load(&tx, "B-1").unwrap();
        assert_eq!(docked.status, BatteryStatus::InService);
        assert_eq!(docked.docked_station, "SS-1");
        assert_eq!(docked.energy_content, 90.0);

        let ss: Station = load(&tx, "SS-1").unwrap();
        assert_eq!((ss.total_batteries, ss.discharged_batteries), (1, 1));

        let err = dock.execute(&mut tx, &SettlementConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Precondition(_)));
    }

    #[test]
    fn test_dock_company_mismatch() {
        let store = MemoryStore::new();
        let mut tx = TxContext::new(&store);
        seed(&mut tx);
        let mut b = battery("B-1", BatteryStatus::Undocked, "");
        b.company = String::new();
        registry::create_battery(&mut tx, &b).unwrap();

        let err = DockBattery {
            battery_id: "B-1".to_string(),
            telemetry: telemetry(90.0),
            station_id: "SS-1".to_string(),
        }
        .execute(&mut tx, &SettlementConfig::default())
        .unwrap_err();
        assert!(matches!(err, Error::Precondition(_)));
    }

    #[test]
    fn test_rent_rejects_insufficient_funds() {
        let store = MemoryStore::new();
        let mut tx = TxContext::new(&store);
        seed(&mut tx);
        registry::create_battery(&mut tx, &battery("B-1", BatteryStatus::Available, "SS-1"))
            .unwrap();

        let err = RentBattery {
            battery_id: "B-1".to_string(),
            telemetry: telemetry(100.0),
            user_id: "rider".to_string(),
            charge: 80.0,
        }
        .execute(&mut tx, &SettlementConfig::default())
        .unwrap_err();
        assert!(matches!(err, Error::Precondition(_)));
    }

    #[test]
    fn test_rent_requires_docked_battery() {
        let store = MemoryStore::new();
        let mut tx = TxContext::new(&store);
        seed(&mut tx);
        registry::create_battery(&mut tx, &battery("B-1", BatteryStatus::Undocked, "")).unwrap();

        let err = RentBattery {
            battery_id: "B-1".to_string(),
            telemetry: telemetry(100.0),
            user_id: "rider".to_string(),
            charge: 10.0,
        }
        .execute(&mut tx, &SettlementConfig::default())
        .unwrap_err();
        assert!(matches!(err, Error::Precondition(_)));
    }

    #[test]
    fn test_rent_in_service_battery_from_fresh_station() {
        let store = MemoryStore::new();
        let mut tx = TxContext::new(&store);
        seed(&mut tx);
        registry::create_battery(&mut tx, &battery("B-1", BatteryStatus::Undocked, "")).unwrap();
        DockBattery {
            battery_id: "B-1".to_string(),
            telemetry: telemetry(90.0),
            station_id: "SS-1".to_string(),
        }
        .execute(&mut tx, &SettlementConfig::default())
        .unwrap();

        RentBattery {
            battery_id: "B-1".to_string(),
            telemetry: telemetry(90.0),
            user_id: "rider".to_string(),
            charge: 10.0,
        }
        .execute(&mut tx, &SettlementConfig::default())
        .unwrap();

        let ss: Station = load(&tx, "SS-1").unwrap();
        assert_eq!(ss.active_batteries, -1);
        assert_eq!(ss.total_batteries, 0);
        assert_eq!(ss.discharged_batteries, 1);
        assert_eq!(load::<Battery>(&tx, "B-1").unwrap().status, BatteryStatus::InUse);
        assert_eq!(load::<User>(&tx, "rider").unwrap().wallet, 40.0);
    }

    #[test]
    fn test_return_without_renter() {
        let store = MemoryStore::new();
        let mut tx = TxContext::new(&store);
        seed(&mut tx);
        registry::create_battery(&mut tx, &battery("B-1", BatteryStatus::Available, "SS-1"))
            .unwrap();

        let err = ReturnBattery {
            battery_id: "B-1".to_string(),
            telemetry: telemetry(60.0),
            station_id: "SS-1".to_string(),
        }
        .execute(&mut tx, &SettlementConfig::default())
        .unwrap_err();
        assert!(matches!(err, Error::Precondition(_)));
    }

    #[test]
    fn test_mark_expired_counts() {
        let store = MemoryStore::new();
        let mut tx = TxContext::new(&store);
        seed(&mut tx);
        registry::create_battery(&mut tx, &battery("B-1", BatteryStatus::InService, "SS-1"))
            .unwrap();

        let expire = MarkExpired {
            battery_id: "B-1".to_string(),
        };
        expire.clone().execute(&mut tx, &SettlementConfig::default()).unwrap();

        let ss: Station = load(&tx, "SS-1").unwrap();
        let net: Network = load(&tx, "OEM-1").unwrap();
        assert_eq!(ss.expired_batteries, 1);
        assert_eq!(net.expired_batteries, 1);
        assert_eq!(load::<Battery>(&tx, "B-1").unwrap().status, BatteryStatus::Expired);

        assert!(matches!(
            expire.execute(&mut tx, &SettlementConfig::default()),
            Err(Error::Precondition(_))
        ));
    }

    #[test]
    fn test_mark_expired_requires_dock() {
        let store = MemoryStore::new();
        let mut tx = TxContext::new(&store);
        seed(&mut tx);
        registry::create_battery(&mut tx, &battery("B-1", BatteryStatus::Undocked, "")).unwrap();

        let err = MarkExpired {
            battery_id: "B-1".to_string(),
        }
        .execute(&mut tx, &SettlementConfig::default())
        .unwrap_err();
        assert!(matches!(err, Error::Precondition(_)));
    }
}
