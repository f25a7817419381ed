//! Fleet allocation
//!
//! A battery belongs to at most one fleet at a time. Allocation also stamps
//! the battery with the fleet's company, which docking and renting check
//! against the station.

use crate::{
    arith,
    args::Args,
    config::SettlementConfig,
    dispatch::{Operation, Response},
    registry::{load, query_batteries, store},
    types::{Battery, BatteryStatus, Fleet, DOC_BATTERY},
    Error, Result,
};
use ledger_core::LedgerStub;
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;

fn require_allocated_to(battery: &Battery, fleet_id: &str) -> Result<()> {
    if battery.allocated_to_fleet != fleet_id {
        return Err(Error::Precondition(format!(
            "battery {} is not allocated to fleet {}",
            battery.id, fleet_id
        )));
    }
    Ok(())
}

/// `AllocateBatteryToFleet(fleetId, batteryId, company)`
#[derive(Debug, Clone)]
pub struct AllocateBattery {
    fleet_id: String,
    battery_id: String,
    company: String,
}

impl Operation for AllocateBattery {
    const NAME: &'static str = "AllocateBatteryToFleet";
    const ARITY: usize = 3;

    fn parse(args: Args<'_>) -> Result<Self> {
        Ok(Self {
            fleet_id: args.text(0)?,
            battery_id: args.text(1)?,
            company: args.text(2)?,
        })
    }

    fn execute(self, ledger: &mut dyn LedgerStub, _: &SettlementConfig) -> Result<Response> {
        let mut fleet: Fleet = load(ledger, &self.fleet_id)?;
        let mut battery: Battery = load(ledger, &self.battery_id)?;

        if !battery.allocated_to_fleet.is_empty() {
            return Err(Error::Precondition(format!(
                "battery {} is already allocated to fleet {}",
                battery.id, battery.allocated_to_fleet
            )));
        }
        if fleet.company != self.company {
            return Err(Error::Precondition(format!(
                "fleet {} belongs to {:?}, not {:?}",
                fleet.id, fleet.company, self.company
            )));
        }

        fleet.total_batteries = arith::adjust_counter(fleet.total_batteries, 1, "totalBatteries")?;
        battery.allocated_to_fleet = fleet.id.clone();
        battery.company = self.company;

        store(ledger, &fleet)?;
        store(ledger, &battery)?;
        tracing::info!(fleet_id = %fleet.id, battery_id = %battery.id, "Battery allocated");
        Ok(Response::committed(ledger))
    }
}

/// `DeallocateBatteryFromFleet(fleetId, batteryId)`
#[derive(Debug, Clone)]
pub struct DeallocateBattery {
    fleet_id: String,
    battery_id: String,
}

impl Operation for DeallocateBattery {
    const NAME: &'static str = "DeallocateBatteryFromFleet";
    const ARITY: usize = 2;

    fn parse(args: Args<'_>) -> Result<Self> {
        Ok(Self {
            fleet_id: args.text(0)?,
            battery_id: args.text(1)?,
        })
    }

    fn execute(self, ledger: &mut dyn LedgerStub, _: &SettlementConfig) -> Result<Response> {
        let mut fleet: Fleet = load(ledger, &self.fleet_id)?;
        let mut battery: Battery = load(ledger, &self.battery_id)?;
        require_allocated_to(&battery, &fleet.id)?;

        fleet.total_batteries = arith::adjust_counter(fleet.total_batteries, -1, "totalBatteries")?;
        battery.allocated_to_fleet.clear();

        store(ledger, &fleet)?;
        store(ledger, &battery)?;
        tracing::info!(fleet_id = %fleet.id, battery_id = %battery.id, "Battery deallocated");
        Ok(Response::committed(ledger))
    }
}

/// `TransferBatteryBetweenFleets(fromFleetId, toFleetId, batteryId)`
#[derive(Debug, Clone)]
pub struct TransferBetweenFleets {
    from_fleet: String,
    to_fleet: String,
    battery_id: String,
}

impl Operation for TransferBetweenFleets {
    const NAME: &'static str = "TransferBatteryBetweenFleets";
    const ARITY: usize = 3;

    fn parse(args: Args<'_>) -> Result<Self> {
        let op = Self {
            from_fleet: args.text(0)?,
            to_fleet: args.text(1)?,
            battery_id: args.text(2)?,
        };
        if op.from_fleet == op.to_fleet {
            return Err(Error::Validation(format!(
                "source and destination fleet are both {}",
                op.from_fleet
            )));
        }
        Ok(op)
    }

    fn execute(self, ledger: &mut dyn LedgerStub, _: &SettlementConfig) -> Result<Response> {
        let mut from: Fleet = load(ledger, &self.from_fleet)?;
        let mut to: Fleet = load(ledger, &self.to_fleet)?;
        let mut battery: Battery = load(ledger, &self.battery_id)?;

        require_allocated_to(&battery, &from.id)?;
        if from.company != to.company {
            return Err(Error::Precondition(format!(
                "fleets {} and {} belong to different companies",
                from.id, to.id
            )));
        }

        from.total_batteries = arith::adjust_counter(from.total_batteries, -1, "totalBatteries")?;
        to.total_batteries = arith::adjust_counter(to.total_batteries, 1, "totalBatteries")?;
        battery.allocated_to_fleet = to.id.clone();

        store(ledger, &from)?;
        store(ledger, &to)?;
        store(ledger, &battery)?;
        tracing::info!(
            from = %from.id,
            to = %to.id,
            battery_id = %battery.id,
            "Battery moved between fleets"
        );
        Ok(Response::committed(ledger))
    }
}

/// Snapshot of one fleet and its batteries
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetReport {
    /// Fleet record
    pub fleet: Fleet,
    /// Allocated batteries, by ascending ID
    pub batteries: Vec<Battery>,
    /// Allocated batteries per status
    pub status_counts: BTreeMap<BatteryStatus, usize>,
}

/// Build the report for one fleet
pub fn fleet_report(ledger: &dyn LedgerStub, fleet_id: &str) -> Result<FleetReport> {
    let fleet: Fleet = load(ledger, fleet_id)?;
    let query = json!({
        "selector": { "docType": DOC_BATTERY, "allocatedToFleet": fleet.id.as_str() }
    })
    .to_string();
    let batteries = query_batteries(ledger, &query)?;

    let mut status_counts = BTreeMap::new();
    for battery in &batteries {
        *status_counts.entry(battery.status).or_insert(0) += 1;
    }

    Ok(FleetReport {
        fleet,
        batteries,
        status_counts,
    })
}

/// `GenerateFleetReport(fleetId)`
#[derive(Debug, Clone)]
pub struct GenerateFleetReport {
    fleet_id: String,
}

impl Operation for GenerateFleetReport {
    const NAME: &'static str = "GenerateFleetReport";
    const ARITY: usize = 1;

    fn parse(args: Args<'_>) -> Result<Self> {
        Ok(Self {
            fleet_id: args.text(0)?,
        })
    }

    fn execute(self, ledger: &mut dyn LedgerStub, _: &SettlementConfig) -> Result<Response> {
        Response::document(&fleet_report(ledger, &self.fleet_id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{registry, types::DOC_FLEET};
    use ledger_core::{MemoryStore, TxContext};

    fn fleet(id: &str, company: &str) -> Fleet {
        Fleet {
            id: id.to_string(),
            name: id.to_string(),
            total_batteries: 0,
            company: company.to_string(),
            industry: "last-mile".to_string(),
            email_id: "fleet@example.com".to_string(),
            contact_number: "555-0102".to_string(),
            address: "Dock Street".to_string(),
            doc_type: DOC_FLEET.to_string(),
        }
    }

    fn battery(id: &str) -> Battery {
        Battery {
            id: id.to_string(),
            model_number: "EV-12V".to_string(),
            soc: 90,
            soh: 100,
            energy_content: 100.0,
            cdc: 0,
            docked_station: String::new(),
            allocated_to_fleet: String::new(),
            company: String::new(),
            escrowed_amount: 0.0,
            network_id: "OEM-1".to_string(),
            user: String::new(),
            owner: "OEM-1".to_string(),
            status: BatteryStatus::Undocked,
            manufacturer_id: "M-1".to_string(),
            manufacture_date: "2023-01-01".to_string(),
            doc_type: DOC_BATTERY.to_string(),
        }
    }

    fn allocate(fleet_id: &str, battery_id: &str, company: &str) -> AllocateBattery {
        AllocateBattery {
            fleet_id: fleet_id.to_string(),
            battery_id: battery_id.to_string(),
            company: company.to_string(),
        }
    }

    #[test]
    fn test_allocate_sets_company_and_counts() {
        let store = MemoryStore::new();
        let mut tx = TxContext::new(&store);
        registry::create(&mut tx, &fleet("F-1", "Acme")).unwrap();
        registry::create_battery(&mut tx, &battery("B-1")).unwrap();

        allocate("F-1", "B-1", "Acme")
            .execute(&mut tx, &SettlementConfig::default())
            .unwrap();

        let b: Battery = load(&tx, "B-1").unwrap();
        assert_eq!(b.allocated_to_fleet, "F-1");
        assert_eq!(b.company, "Acme");
        assert_eq!(load::<Fleet>(&tx, "F-1").unwrap().total_batteries, 1);

        let err = allocate("F-1", "B-1", "Acme")
            .execute(&mut tx, &SettlementConfig::default())
            .unwrap_err();
        assert!(matches!(err, Error::Precondition(_)));
    }

    #[test]
    fn test_allocate_wrong_company() {
        let store = MemoryStore::new();
        let mut tx = TxContext::new(&store);
        registry::create(&mut tx, &fleet("F-1", "Acme")).unwrap();
        registry::create_battery(&mut tx, &battery("B-1")).unwrap();

        let err = allocate("F-1", "B-1", "Globex")
            .execute(&mut tx, &SettlementConfig::default())
            .unwrap_err();
        assert!(matches!(err, Error::Precondition(_)));
    }

    #[test]
    fn test_transfer_and_report() {
        let store = MemoryStore::new();
        let mut tx = TxContext::new(&store);
        registry::create(&mut tx, &fleet("F-1", "Acme")).unwrap();
        registry::create(&mut tx, &fleet("F-2", "Acme")).unwrap();
        for id in ["B-1", "B-2"] {
            registry::create_battery(&mut tx, &battery(id)).unwrap();
            allocate("F-1", id, "Acme")
                .execute(&mut tx, &SettlementConfig::default())
                .unwrap();
        }

        TransferBetweenFleets {
            from_fleet: "F-1".to_string(),
            to_fleet: "F-2".to_string(),
            battery_id: "B-2".to_string(),
        }
        .execute(&mut tx, &SettlementConfig::default())
        .unwrap();

        let report = fleet_report(&tx, "F-1").unwrap();
        assert_eq!(report.fleet.total_batteries, 1);
        assert_eq!(report.batteries.len(), 1);
        assert_eq!(report.batteries[0].id, "B-1");
        assert_eq!(report.status_counts.get(&BatteryStatus::Undocked), Some(&1));

        let report = fleet_report(&tx, "F-2").unwrap();
        assert_eq!(report.fleet.total_batteries, 1);
        assert_eq!(report.batteries[0].id, "B-2");
    }

    #[test]
    fn test_deallocate_requires_membership() {
        let store = MemoryStore::new();
        let mut tx = TxContext::new(&store);
        registry::create(&mut tx, &fleet("F-1", "Acme")).unwrap();
        registry::create_battery(&mut tx, &battery("B-1")).unwrap();

        let deallocate = DeallocateBattery {
            fleet_id: "F-1".to_string(),
            battery_id: "B-1".to_string(),
        };
        assert!(matches!(
            deallocate.clone().execute(&mut tx, &SettlementConfig::default()),
            Err(Error::Precondition(_))
        ));

        allocate("F-1", "B-1", "Acme")
            .execute(&mut tx, &SettlementConfig::default())
            .unwrap();
        deallocate.execute(&mut tx, &SettlementConfig::default()).unwrap();
        assert_eq!(load::<Fleet>(&tx, "F-1").unwrap().total_batteries, 0);
        assert!(load::<Battery>(&tx, "B-1").unwrap().allocated_to_fleet.is_empty());
    }

    #[test]
    fn test_transfer_to_same_fleet_rejected() {
        let values: Vec<String> = ["F-1", "F-1", "B-1"].iter().map(|s| s.to_string()).collect();
        let args = Args::new(TransferBetweenFleets::NAME, &values, 3).unwrap();
        assert!(matches!(
            TransferBetweenFleets::parse(args),
            Err(Error::Validation(_))
        ));
    }
}
