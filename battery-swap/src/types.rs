//! Entity records
//!
//! JSON field names are the stored document format and must not change:
//! existing world state and off-chain indexers read them verbatim.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// `docType` of [`Network`]
pub const DOC_NETWORK: &str = "ssNetwork";
/// `docType` of [`Station`]
pub const DOC_STATION: &str = "swappingStation";
/// `docType` of [`Fleet`]
pub const DOC_FLEET: &str = "fleet";
/// `docType` of [`User`]
pub const DOC_USER: &str = "user";
/// `docType` of [`Battery`]
pub const DOC_BATTERY: &str = "battery";

/// Battery custody status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BatteryStatus {
    /// Issued by its network, not yet docked
    Undocked,
    /// Out-of-network arrival awaiting verification
    Unverified,
    /// Docked and discharged (charging)
    #[serde(rename = "In_Service")]
    InService,
    /// Docked and ready to rent
    Available,
    /// Rented out
    #[serde(rename = "In_Use")]
    InUse,
    /// Reported stolen
    Stolen,
    /// Faulty
    Error,
    /// End of life
    Expired,
}

impl BatteryStatus {
    /// Every status, in lifecycle order
    pub const ALL: [BatteryStatus; 8] = [
        BatteryStatus::Undocked,
        BatteryStatus::Unverified,
        BatteryStatus::InService,
        BatteryStatus::Available,
        BatteryStatus::InUse,
        BatteryStatus::Stolen,
        BatteryStatus::Error,
        BatteryStatus::Expired,
    ];

    /// Wire string
    pub fn as_str(&self) -> &'static str {
        match self {
            BatteryStatus::Undocked => "Undocked",
            BatteryStatus::Unverified => "Unverified",
            BatteryStatus::InService => "In_Service",
            BatteryStatus::Available => "Available",
            BatteryStatus::InUse => "In_Use",
            BatteryStatus::Stolen => "Stolen",
            BatteryStatus::Error => "Error",
            BatteryStatus::Expired => "Expired",
        }
    }

    /// Stolen, Error and Expired have no outgoing transitions
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BatteryStatus::Stolen | BatteryStatus::Error | BatteryStatus::Expired
        )
    }
}

impl fmt::Display for BatteryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BatteryStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        BatteryStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| Error::Validation(format!("unknown battery status {:?}", s)))
    }
}

/// Network operating status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NetworkStatus {
    /// Operating
    Active,
    /// Suspended
    Inactive,
}

impl FromStr for NetworkStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Active" => Ok(NetworkStatus::Active),
            "Inactive" => Ok(NetworkStatus::Inactive),
            other => Err(Error::Validation(format!(
                "network status must be Active or Inactive, got {:?}",
                other
            ))),
        }
    }
}

/// Swapping network operator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    /// Network ID
    #[serde(rename = "Id_Network")]
    pub id: String,
    /// Display name
    #[serde(rename = "name_network")]
    pub name: String,
    /// Out-of-network batteries awaiting verification
    pub unverified_batteries: i64,
    /// Verified batteries
    pub total_batteries: i64,
    /// Expired batteries homed here
    pub expired_batteries: i64,
    /// Operating status
    pub status: NetworkStatus,
    /// Wallet balance
    pub wallet: f64,
    /// Always [`DOC_NETWORK`]
    pub doc_type: String,
}

impl Network {
    /// New network with an empty wallet and zero counters
    pub fn new(id: impl Into<String>, name: impl Into<String>, status: NetworkStatus) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            unverified_batteries: 0,
            total_batteries: 0,
            expired_batteries: 0,
            status,
            wallet: 0.0,
            doc_type: DOC_NETWORK.to_string(),
        }
    }
}

/// Swapping station
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Station {
    /// Station ID
    #[serde(rename = "id_swappingStation")]
    pub id: String,
    /// Display name
    #[serde(rename = "swappingStationName")]
    pub name: String,
    /// Home network
    #[serde(rename = "id_Network")]
    pub network_id: String,
    /// Docked batteries awaiting verification
    pub unverified_batteries: i64,
    /// Docked batteries (discharged plus active)
    pub total_batteries: i64,
    /// Batteries ready to rent
    pub active_batteries: i64,
    /// Batteries expired here
    pub expired_batteries: i64,
    /// Batteries charging
    pub discharged_batteries: i64,
    /// Location
    pub geo_coordinates: String,
    /// Postal address
    pub address: String,
    /// Operating license
    pub license_number: String,
    /// Contact email
    pub email_id: String,
    /// Contact phone
    pub contact_number: String,
    /// Operating company
    pub company: String,
    /// Always [`DOC_STATION`]
    pub doc_type: String,
}

/// Fleet of rented batteries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fleet {
    /// Fleet ID
    #[serde(rename = "id_fleet")]
    pub id: String,
    /// Display name
    #[serde(rename = "fleetName")]
    pub name: String,
    /// Batteries allocated to this fleet
    pub total_batteries: i64,
    /// Owning company
    pub company: String,
    /// Industry segment (last-mile, ride-hailing, ...)
    pub industry: String,
    /// Contact email
    pub email_id: String,
    /// Contact phone
    pub contact_number: String,
    /// Postal address
    pub address: String,
    /// Always [`DOC_FLEET`]
    pub doc_type: String,
}

/// Battery renter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// User ID
    #[serde(rename = "id_user")]
    pub id: String,
    /// Display name
    #[serde(rename = "userName")]
    pub name: String,
    /// Postal address
    pub address: String,
    /// National ID number
    pub aadhar_number: String,
    /// Contact email
    pub email_id: String,
    /// Fleet membership, empty when independent
    pub fleet_id: String,
    /// Company
    pub company: String,
    /// Contact phone
    pub mobile_number: String,
    /// Battery currently rented, empty when none
    pub rented_battery: String,
    /// Wallet balance
    pub wallet: f64,
    /// Always [`DOC_USER`]
    pub doc_type: String,
}

/// Swappable battery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Battery {
    /// Battery ID
    #[serde(rename = "id_battery")]
    pub id: String,
    /// Model number
    pub model_number: String,
    /// State of charge, percent
    #[serde(rename = "soC")]
    pub soc: u8,
    /// State of health, percent
    #[serde(rename = "soH")]
    pub soh: u8,
    /// Energy content; while rented this holds the value at rental start
    pub energy_content: f64,
    /// Charge-discharge cycle count
    pub cdc: u32,
    /// Station the battery was last docked at, empty before first dock
    pub docked_station: String,
    /// Fleet allocation, empty when unallocated
    pub allocated_to_fleet: String,
    /// Company the battery is affiliated with
    pub company: String,
    /// Escrow held while rented
    pub escrowed_amount: f64,
    /// Home network
    #[serde(rename = "id_Network")]
    pub network_id: String,
    /// Current renter, empty when not rented
    pub user: String,
    /// Owner
    pub owner: String,
    /// Custody status
    pub status: BatteryStatus,
    /// Manufacturer
    pub manufacturer_id: String,
    /// Manufacture date as supplied
    pub manufacture_date: String,
    /// Always [`DOC_BATTERY`]
    pub doc_type: String,
}

impl Battery {
    /// Overwrite sensor readings
    pub fn apply_telemetry(&mut self, telemetry: &Telemetry) {
        self.soc = telemetry.soc;
        self.soh = telemetry.soh;
        self.energy_content = telemetry.energy_content;
        self.cdc = telemetry.cdc;
    }

    /// Whether the battery has ever been docked
    pub fn is_docked(&self) -> bool {
        !self.docked_station.is_empty()
    }
}

/// Sensor readings supplied with a transition
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Telemetry {
    /// State of charge, 0-100
    pub soc: u8,
    /// State of health, 0-100
    pub soh: u8,
    /// Energy content
    pub energy_content: f64,
    /// Cycle count
    pub cdc: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_wire_strings() {
        for status in BatteryStatus::ALL {
            let encoded = serde_json::to_value(status).unwrap();
            assert_eq!(encoded, json!(status.as_str()));
            assert_eq!(status.as_str().parse::<BatteryStatus>().unwrap(), status);
        }
        assert!("in_service".parse::<BatteryStatus>().is_err());
    }

    #[test]
    fn test_network_field_names() {
        let network = Network::new("OEM-1", "Volt", NetworkStatus::Active);
        let doc = serde_json::to_value(&network).unwrap();
        assert_eq!(doc["Id_Network"], "OEM-1");
        assert_eq!(doc["name_network"], "Volt");
        assert_eq!(doc["unverifiedBatteries"], 0);
        assert_eq!(doc["status"], "Active");
        assert_eq!(doc["docType"], "ssNetwork");
    }

    #[test]
    fn test_battery_field_names() {
        let doc = json!({
            "id_battery": "Battery-1",
            "modelNumber": "EV-12V-80AH",
            "soC": 80,
            "soH": 95,
            "energyContent": 100.0,
            "cdc": 12,
            "dockedStation": "",
            "allocatedToFleet": "",
            "company": "",
            "escrowedAmount": 0.0,
            "id_Network": "OEM-1",
            "user": "",
            "owner": "OEM-1",
            "status": "Undocked",
            "manufacturerId": "M-1",
            "manufactureDate": "2023-01-01",
            "docType": "battery"
        });
        let battery: Battery = serde_json::from_value(doc.clone()).unwrap();
        assert_eq!(battery.status, BatteryStatus::Undocked);
        assert_eq!(battery.network_id, "OEM-1");
        assert!(!battery.is_docked());
        assert_eq!(serde_json::to_value(&battery).unwrap(), doc);
    }

    #[test]
    fn test_terminal_statuses() {
        let terminal: Vec<_> = BatteryStatus::ALL
            .into_iter()
            .filter(BatteryStatus::is_terminal)
            .collect();
        assert_eq!(
            terminal,
            vec![BatteryStatus::Stolen, BatteryStatus::Error, BatteryStatus::Expired]
        );
    }
}
