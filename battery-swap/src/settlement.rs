//! Rental settlement
//!
//! Splits a returned battery's escrow into a renter refund, a third-party
//! network share and a platform share according to the energy consumed
//! during the rental.
//!
//! # Example
//!
//! ```text
//! E0 = 100, E1 = 60, escrow = 20
//!
//!   consumed       = 40, ratio = 0.4
//!   consumptionFee = 8
//!   refundBase     = 12
//!   refund         = 10.8   (renter)
//!   residual       = 1.2    (platform)
//!
//!   third-party network: 0.85 × 8 = 6.8
//!   platform:            1.2 + 1.2 = 2.4
//! ```
//!
//! [`compute`] is pure; [`apply`] validates every new wallet balance before
//! staging any write.

use crate::{
    arith,
    config::SettlementConfig,
    registry,
    types::{Network, User},
    Error, Result,
};
use ledger_core::LedgerStub;
use serde::Serialize;
use std::collections::BTreeMap;

/// Networks involved in one settlement
#[derive(Debug, Clone, Copy)]
pub struct Parties<'a> {
    /// Home network of the returned battery
    pub battery_network: &'a str,
    /// Home network of the station receiving the battery
    pub station_network: &'a str,
    /// Platform (root) network
    pub platform: &'a str,
}

impl<'a> Parties<'a> {
    /// Network receiving the third-party share, `None` when every party is
    /// the platform
    pub fn third_party(&self) -> Option<&'a str> {
        if self.battery_network != self.platform {
            Some(self.battery_network)
        } else if self.station_network != self.platform {
            Some(self.station_network)
        } else {
            None
        }
    }
}

/// Computed settlement amounts
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementBreakdown {
    /// Escrow being settled
    pub escrow: f64,
    /// Energy consumed during the rental
    pub consumed: f64,
    /// Consumed share of the starting energy, clamped to [0, 1]
    pub ratio: f64,
    /// Charge for consumed energy
    pub consumption_fee: f64,
    /// Escrow left after the consumption fee
    pub refund_base: f64,
    /// Returned to the renter
    pub refund: f64,
    /// Retained from the refund base, paid to the platform
    pub residual: f64,
    /// Paid to the third-party network
    pub network_share: f64,
    /// Paid to the platform
    pub platform_share: f64,
    /// Network receiving `network_share`
    pub third_party: Option<String>,
}

impl SettlementBreakdown {
    /// Total paid out to networks
    pub fn network_payout(&self) -> f64 {
        self.network_share + self.platform_share
    }
}

/// Compute the settlement of one rental
///
/// `e0` is the energy content at rental start, `e1` at return.
pub fn compute(
    escrow: f64,
    e0: f64,
    e1: f64,
    parties: Parties<'_>,
    config: &SettlementConfig,
) -> Result<SettlementBreakdown> {
    if !e0.is_finite() || e0 <= 0.0 {
        return Err(Error::Precondition(format!(
            "starting energy content must be positive, got {}",
            e0
        )));
    }
    if !escrow.is_finite() || escrow < 0.0 {
        return Err(Error::Precondition(format!(
            "escrowed amount must be non-negative, got {}",
            escrow
        )));
    }

    let consumed = arith::sub_float(e0, e1)?;
    let ratio = (consumed / e0).clamp(0.0, 1.0);
    let consumption_fee = ratio * escrow;
    let refund_base = arith::sub_float(escrow, consumption_fee)?;
    let refund = config.refund_ratio * refund_base;
    let residual = arith::sub_float(refund_base, refund)?;

    let third_party = parties.third_party();
    let (network_share, platform_share) = match third_party {
        Some(_) => {
            let network_share = config.network_share * consumption_fee;
            let platform_fee = arith::sub_float(consumption_fee, network_share)?;
            (network_share, arith::add_float(platform_fee, residual)?)
        }
        None => (0.0, arith::add_float(consumption_fee, residual)?),
    };

    Ok(SettlementBreakdown {
        escrow,
        consumed,
        ratio,
        consumption_fee,
        refund_base,
        refund,
        residual,
        network_share,
        platform_share,
        third_party: third_party.map(str::to_string),
    })
}

/// Credit the renter and stage the network wallet updates
///
/// The renter's wallet is updated in place; the caller stores `user`
/// together with its other changes. When the third party and the platform
/// are the same record their credits are summed into one write.
pub fn apply(
    ledger: &mut dyn LedgerStub,
    breakdown: &SettlementBreakdown,
    platform: &str,
    user: &mut User,
) -> Result<()> {
    let mut credits: BTreeMap<&str, f64> = BTreeMap::new();
    if let Some(network) = breakdown.third_party.as_deref() {
        credits.insert(network, breakdown.network_share);
    }
    let entry = credits.entry(platform).or_insert(0.0);
    *entry = arith::add_float(*entry, breakdown.platform_share)?;

    let refunded_wallet = arith::add_float(user.wallet, breakdown.refund)?;

    let mut networks = Vec::with_capacity(credits.len());
    for (id, amount) in credits {
        let mut network: Network = registry::load(ledger, id)?;
        network.wallet = arith::add_float(network.wallet, amount)?;
        networks.push(network);
    }

    user.wallet = refunded_wallet;
    for network in &networks {
        registry::store(ledger, network)?;
    }

    tracing::info!(
        user_id = %user.id,
        escrow = breakdown.escrow,
        refund = breakdown.refund,
        network_share = breakdown.network_share,
        platform_share = breakdown.platform_share,
        third_party = breakdown.third_party.as_deref().unwrap_or(""),
        "Rental settled"
    );
    Ok(())
}
