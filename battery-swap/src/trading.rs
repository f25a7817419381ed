//! Energy trading records
//!
//! Peer-to-peer energy trading shares the ledger with the swap network.
//! Its records live under prefixed keys (`Order_<id>`, `Payment_<id>`, ...)
//! so they never collide with asset IDs. Most writes are upserts: a missing
//! record is created, an existing one is updated in place.

use crate::{
    args::Args,
    config::SettlementConfig,
    dispatch::{Operation, Response},
    Error, Result,
};
use ledger_core::LedgerStub;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::marker::PhantomData;

/// A trading record stored under `PREFIX + id`
pub trait TradingRecord: Serialize + DeserializeOwned {
    /// Kind used in error messages
    const KIND: &'static str;
    /// Key prefix
    const PREFIX: &'static str;
    /// Operation name that reads one record
    const READ_OPERATION: &'static str;

    /// Record ID, without prefix
    fn id(&self) -> &str;

    /// State key of `id`
    fn key(id: &str) -> String {
        format!("{}{}", Self::PREFIX, id)
    }
}

macro_rules! trading_record {
    ($ty:ty, $kind:literal, $prefix:literal, $read:literal, $id:ident) => {
        impl TradingRecord for $ty {
            const KIND: &'static str = $kind;
            const PREFIX: &'static str = $prefix;
            const READ_OPERATION: &'static str = $read;

            fn id(&self) -> &str {
                &self.$id
            }
        }
    };
}

/// Energy trading participant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// User ID
    pub id: String,
    /// Producer, consumer or prosumer
    pub category: String,
    /// Creation time, unix seconds
    pub created_on: i64,
    /// Administrator flag
    pub is_admin: bool,
    /// Location
    pub location: String,
    /// Smart meter
    pub meter_id: String,
    /// Energy source
    pub source: String,
    /// Last update, unix seconds
    pub updated_on: i64,
}

/// Platform terms accepted by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformContract {
    /// Signing user
    pub user_id: String,
    /// Hash of the signed document, empty until attached off-chain
    pub signed_contract_hash: String,
    /// Creation time, unix seconds
    pub created_on: i64,
    /// Last update, unix seconds
    pub updated_on: i64,
}

/// Trading terms accepted by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradingContract {
    /// Signing user
    pub user_id: String,
    /// Bid status at signing
    pub bid_status: String,
    /// Hash of the signed document, empty until attached off-chain
    pub signed_contract_hash: String,
    /// Creation time, unix seconds
    pub created_on: i64,
    /// Last update, unix seconds
    pub updated_on: i64,
}

/// Payment header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    /// Bid match settled by this payment, if any
    pub bid_match_id: String,
    /// Creation time, unix seconds
    pub created_on: i64,
    /// Payment ID
    pub id: String,
    /// [`PaymentDetail`] ID
    #[serde(rename = "paymentDetail")]
    pub payment_detail_id: String,
    /// Payment type
    pub payment_type: String,
    /// Total amount
    pub total_amount: f64,
    /// Paying user
    pub user_id: String,
    /// Order settled by this payment, if any
    pub order_id: String,
}

/// Payment breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetail {
    /// Detail ID
    pub id: String,
    /// Debited account
    pub debited_from: String,
    /// Credited account
    pub credited_to: String,
    /// Energy cost
    pub total_unit_cost: f64,
    /// Platform fee
    pub platform_fee: f64,
    /// Token amount
    pub token_amount: f64,
    /// Refunded bid amount
    pub bid_refund_amount: f64,
    /// Refunded platform fee
    pub platform_fee_refund_amount: f64,
    /// Refunded tokens
    pub token_amount_refund: f64,
    /// Penalty charged to the seller
    pub penalty_from_seller: f64,
}

/// Market order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Matched bid
    pub bid_match_id: String,
    /// Bid status
    pub bid_status: String,
    /// Creation time, unix seconds
    pub created_on: i64,
    /// Order ID
    pub id: String,
    /// Market price at order time
    pub on_market_price: String,
    /// Order cost
    pub order_cost: f64,
    /// Payment
    pub payment_id: String,
    /// Trading slot
    pub slot_id: String,
    /// Slot execution date, unix seconds
    pub slot_exec_date: i64,
    /// Quantity ordered
    pub total_quantity: i64,
    /// Unit cost
    pub unit_cost: f64,
    /// Last update, unix seconds
    pub updated_on: i64,
    /// Buy or sell
    #[serde(rename = "action")]
    pub user_action: String,
    /// Ordering user
    pub user_id: String,
}

/// Matched buy and sell bids
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BidMatch {
    /// Match time, unix seconds
    pub bid_match_tms: i64,
    /// Trading slot
    pub bid_slot: String,
    /// Match status
    pub bid_status: String,
    /// Unit price
    pub bid_unit_price: i64,
    /// Buyer
    pub buyer_user_id: String,
    /// Units delivered
    pub delivered_bid_units: f64,
    /// Match ID
    pub id: String,
    /// Units matched
    pub original_bid_units: f64,
    /// Seller
    pub seller_user_id: String,
    /// Buy-side transaction
    pub transaction_buy_id: String,
    /// Sell-side transaction
    pub transaction_sell_id: String,
}

/// Metered outcome of a matched bid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnergyBid {
    /// Bid ID
    pub id: String,
    /// Match this bid belongs to
    pub bid_match_id: String,
    /// Units bid
    pub initial_bid_units: f64,
    /// Units accepted
    pub accepted_bid_units: f64,
    /// Buyer meter reading
    pub buyer_meter_unit: f64,
    /// Seller meter reading
    pub seller_meter_unit: f64,
    /// Units the buyer took from the seller
    pub buyer_brought_unit_from_seller: f64,
    /// Units the seller delivered to the buyer
    pub seller_sold_unit_to_buyer: f64,
    /// Units the seller sold to the grid
    pub seller_sold_unit_to_grid: f64,
    /// Units the buyer sold to the grid
    pub buyer_sold_unit_to_grid: f64,
    /// Units the buyer took from the grid
    pub buyer_brought_unit_from_grid: f64,
    /// Settlement note
    pub reason: String,
    /// Creation time, unix seconds
    pub created_on: i64,
}

trading_record!(UserProfile, "UserProfile", "UserProfile_", "ReadUserProfile", id);
trading_record!(PlatformContract, "PlatformContract", "PlatformContract_", "ReadPlatformContract", user_id);
trading_record!(TradingContract, "TradingContract", "TradingContract_", "ReadTradingContract", user_id);
trading_record!(Payment, "Payment", "Payment_", "ReadPayment", id);
trading_record!(PaymentDetail, "PaymentDetail", "PaymentDetail_", "ReadPaymentDetail", id);
trading_record!(Order, "Order", "Order_", "ReadOrder", id);
trading_record!(BidMatch, "BidMatch", "BidMatch_", "ReadBidMatch", id);
trading_record!(EnergyBid, "EnergyBid", "EnergyBid_", "ReadEnergyBid", id);

/// Load a trading record, `None` when absent
pub fn try_load<R: TradingRecord>(ledger: &dyn LedgerStub, id: &str) -> Result<Option<R>> {
    match ledger.get_state(&R::key(id))? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

/// Load a trading record or fail with NotFound
pub fn load<R: TradingRecord>(ledger: &dyn LedgerStub, id: &str) -> Result<R> {
    try_load(ledger, id)?.ok_or_else(|| Error::not_found(R::KIND, id))
}

/// Write a trading record under its prefixed key
pub fn store<R: TradingRecord>(ledger: &mut dyn LedgerStub, record: &R) -> Result<()> {
    let key = R::key(record.id());
    ledger.put_state(&key, serde_json::to_vec(record)?)?;
    tracing::debug!(kind = R::KIND, key = %key, "Trading record staged");
    Ok(())
}

fn now(ledger: &dyn LedgerStub) -> i64 {
    ledger.tx_timestamp().timestamp()
}

/// `UpdateUserProfile(id, category, location, meterId, source, isAdmin)`
#[derive(Debug, Clone)]
pub struct UpdateUserProfile {
    id: String,
    category: String,
    location: String,
    meter_id: String,
    source: String,
    is_admin: bool,
}

impl Operation for UpdateUserProfile {
    const NAME: &'static str = "UpdateUserProfile";
    const ARITY: usize = 6;

    fn parse(args: Args<'_>) -> Result<Self> {
        Ok(Self {
            id: args.text(0)?,
            category: args.text(1)?,
            location: args.text(2)?,
            meter_id: args.text(3)?,
            source: args.text(4)?,
            is_admin: args.boolean(5, "isAdmin")?,
        })
    }

    fn execute(self, ledger: &mut dyn LedgerStub, _: &SettlementConfig) -> Result<Response> {
        let now = now(ledger);
        let created_on = match try_load::<UserProfile>(ledger, &self.id)? {
            Some(existing) => existing.created_on,
            None => now,
        };
        store(
            ledger,
            &UserProfile {
                id: self.id,
                category: self.category,
                created_on,
                is_admin: self.is_admin,
                location: self.location,
                meter_id: self.meter_id,
                source: self.source,
                updated_on: now,
            },
        )?;
        Ok(Response::committed(ledger))
    }
}

/// `SignPlatformContract(userId)`
#[derive(Debug, Clone)]
pub struct SignPlatformContract {
    user_id: String,
}

impl Operation for SignPlatformContract {
    const NAME: &'static str = "SignPlatformContract";
    const ARITY: usize = 1;

    fn parse(args: Args<'_>) -> Result<Self> {
        Ok(Self {
            user_id: args.text(0)?,
        })
    }

    fn execute(self, ledger: &mut dyn LedgerStub, _: &SettlementConfig) -> Result<Response> {
        load::<UserProfile>(ledger, &self.user_id)?;
        let now = now(ledger);
        let created_on = try_load::<PlatformContract>(ledger, &self.user_id)?
            .map_or(now, |existing| existing.created_on);
        store(
            ledger,
            &PlatformContract {
                user_id: self.user_id,
                signed_contract_hash: String::new(),
                created_on,
                updated_on: now,
            },
        )?;
        Ok(Response::committed(ledger))
    }
}

/// `SignTradingContract(userId, bidStatus)`
#[derive(Debug, Clone)]
pub struct SignTradingContract {
    user_id: String,
    bid_status: String,
}

impl Operation for SignTradingContract {
    const NAME: &'static str = "SignTradingContract";
    const ARITY: usize = 2;

    fn parse(args: Args<'_>) -> Result<Self> {
        Ok(Self {
            user_id: args.text(0)?,
            bid_status: args.text(1)?,
        })
    }

    fn execute(self, ledger: &mut dyn LedgerStub, _: &SettlementConfig) -> Result<Response> {
        load::<UserProfile>(ledger, &self.user_id)?;
        let now = now(ledger);
        let created_on = try_load::<TradingContract>(ledger, &self.user_id)?
            .map_or(now, |existing| existing.created_on);
        store(
            ledger,
            &TradingContract {
                user_id: self.user_id,
                bid_status: self.bid_status,
                signed_contract_hash: String::new(),
                created_on,
                updated_on: now,
            },
        )?;
        Ok(Response::committed(ledger))
    }
}

/// `RecordPayment(paymentId, type, totalAmount, userId, detailId, debitedFrom,
/// creditedTo, totalUnitCost, platformFee, tokenAmount, bidRefund,
/// platformFeeRefund, penaltyFromSeller)`
#[derive(Debug, Clone)]
pub struct RecordPayment {
    payment: Payment,
    detail: PaymentDetail,
}

impl Operation for RecordPayment {
    const NAME: &'static str = "RecordPayment";
    const ARITY: usize = 13;

    fn parse(args: Args<'_>) -> Result<Self> {
        let detail_id = args.text(4)?;
        let penalty_from_seller = args.float(12, "penaltyFromSeller")?;
        Ok(Self {
            payment: Payment {
                bid_match_id: String::new(),
                created_on: 0,
                id: args.text(0)?,
                payment_detail_id: detail_id.clone(),
                payment_type: args.text(1)?,
                total_amount: args.float(2, "totalAmount")?,
                user_id: args.text(3)?,
                order_id: String::new(),
            },
            detail: PaymentDetail {
                id: detail_id,
                debited_from: args.text(5)?,
                credited_to: args.text(6)?,
                total_unit_cost: args.float(7, "totalUnitCost")?,
                platform_fee: args.float(8, "platformFee")?,
                token_amount: args.float(9, "tokenAmount")?,
                bid_refund_amount: args.float(10, "bidRefundAmount")?,
                platform_fee_refund_amount: args.float(11, "platformFeeRefundAmount")?,
                // The seller penalty is what gets refunded in tokens
                token_amount_refund: penalty_from_seller,
                penalty_from_seller,
            },
        })
    }

    fn execute(mut self, ledger: &mut dyn LedgerStub, _: &SettlementConfig) -> Result<Response> {
        self.payment.created_on = now(ledger);
        store(ledger, &self.detail)?;
        store(ledger, &self.payment)?;
        tracing::info!(
            payment_id = %self.payment.id,
            user_id = %self.payment.user_id,
            total_amount = self.payment.total_amount,
            "Payment recorded"
        );
        Ok(Response::committed(ledger))
    }
}

/// `RegisterOrder(bidMatchId, bidStatus, orderId, onMarketPrice, orderCost,
/// paymentId, slotId, totalQuantity, unitCost, userId, slotExecDate, action)`
#[derive(Debug, Clone)]
pub struct RegisterOrder {
    order: Order,
}

impl RegisterOrder {
    /// Statuses a new order may start in
    pub const INITIAL_STATUSES: [&'static str; 2] = ["BidCreated", "BidAccepted"];
}

impl Operation for RegisterOrder {
    const NAME: &'static str = "RegisterOrder";
    const ARITY: usize = 12;

    fn parse(args: Args<'_>) -> Result<Self> {
        Ok(Self {
            order: Order {
                bid_match_id: args.text(0)?,
                bid_status: args.text(1)?,
                created_on: 0,
                id: args.text(2)?,
                on_market_price: args.text(3)?,
                order_cost: args.float(4, "orderCost")?,
                payment_id: args.text(5)?,
                slot_id: args.text(6)?,
                total_quantity: args.int(7, "totalQuantity")?,
                unit_cost: args.float(8, "unitCost")?,
                user_id: args.text(9)?,
                slot_exec_date: args.int(10, "slotExecDate")?,
                updated_on: 0,
                user_action: args.text(11)?,
            },
        })
    }

    fn execute(mut self, ledger: &mut dyn LedgerStub, _: &SettlementConfig) -> Result<Response> {
        let now = now(ledger);
        match try_load::<Order>(ledger, &self.order.id)? {
            Some(existing) => self.order.created_on = existing.created_on,
            None => {
                if !Self::INITIAL_STATUSES.contains(&self.order.bid_status.as_str()) {
                    return Err(Error::Validation(format!(
                        "new order {} must start as BidCreated or BidAccepted, got {}",
                        self.order.id, self.order.bid_status
                    )));
                }
                self.order.created_on = now;
            }
        }
        self.order.updated_on = now;
        store(ledger, &self.order)?;
        Ok(Response::committed(ledger))
    }
}

/// `ProcessBidMatch(bidMatchTms, slot, status, unitPrice, buyer,
/// deliveredUnits, id, originalUnits, seller, txBuyId, txSellId)`
#[derive(Debug, Clone)]
pub struct ProcessBidMatch {
    bid_match: BidMatch,
}

impl Operation for ProcessBidMatch {
    const NAME: &'static str = "ProcessBidMatch";
    const ARITY: usize = 11;

    fn parse(args: Args<'_>) -> Result<Self> {
        Ok(Self {
            bid_match: BidMatch {
                bid_match_tms: args.int(0, "bidMatchTms")?,
                bid_slot: args.text(1)?,
                bid_status: args.text(2)?,
                bid_unit_price: args.int(3, "bidUnitPrice")?,
                buyer_user_id: args.text(4)?,
                delivered_bid_units: args.float(5, "deliveredBidUnits")?,
                id: args.text(6)?,
                original_bid_units: args.float(7, "originalBidUnits")?,
                seller_user_id: args.text(8)?,
                transaction_buy_id: args.text(9)?,
                transaction_sell_id: args.text(10)?,
            },
        })
    }

    fn execute(self, ledger: &mut dyn LedgerStub, _: &SettlementConfig) -> Result<Response> {
        store(ledger, &self.bid_match)?;
        Ok(Response::committed(ledger))
    }
}

/// `ProcessEnergyBid(id, bidMatchId, initialBidUnits, acceptedBidUnits,
/// buyerMeterUnit, sellerMeterUnit, buyerBroughtUnitFromSeller,
/// sellerSoldUnitToBuyer, sellerSoldUnitToGrid, buyerSoldUnitToGrid,
/// buyerBroughtUnitFromGrid, reason)`
#[derive(Debug, Clone)]
pub struct ProcessEnergyBid {
    bid: EnergyBid,
}

impl Operation for ProcessEnergyBid {
    const NAME: &'static str = "ProcessEnergyBid";
    const ARITY: usize = 12;

    fn parse(args: Args<'_>) -> Result<Self> {
        Ok(Self {
            bid: EnergyBid {
                id: args.text(0)?,
                bid_match_id: args.text(1)?,
                initial_bid_units: args.float(2, "initialBidUnits")?,
                accepted_bid_units: args.float(3, "acceptedBidUnits")?,
                buyer_meter_unit: args.float(4, "buyerMeterUnit")?,
                seller_meter_unit: args.float(5, "sellerMeterUnit")?,
                buyer_brought_unit_from_seller: args.float(6, "buyerBroughtUnitFromSeller")?,
                seller_sold_unit_to_buyer: args.float(7, "sellerSoldUnitToBuyer")?,
                seller_sold_unit_to_grid: args.float(8, "sellerSoldUnitToGrid")?,
                buyer_sold_unit_to_grid: args.float(9, "buyerSoldUnitToGrid")?,
                buyer_brought_unit_from_grid: args.float(10, "buyerBroughtUnitFromGrid")?,
                reason: args.text(11)?,
                created_on: 0,
            },
        })
    }

    fn execute(mut self, ledger: &mut dyn LedgerStub, _: &SettlementConfig) -> Result<Response> {
        self.bid.created_on = match try_load::<EnergyBid>(ledger, &self.bid.id)? {
            Some(existing) => existing.created_on,
            None => now(ledger),
        };
        store(ledger, &self.bid)?;
        Ok(Response::committed(ledger))
    }
}

/// Read one trading record by ID (`ReadOrder`, `ReadPayment`, ...)
#[derive(Debug, Clone)]
pub struct ReadTradingRecord<R> {
    id: String,
    kind: PhantomData<R>,
}

impl<R: TradingRecord> Operation for ReadTradingRecord<R> {
    const NAME: &'static str = R::READ_OPERATION;
    const ARITY: usize = 1;

    fn parse(args: Args<'_>) -> Result<Self> {
        Ok(Self {
            id: args.text(0)?,
            kind: PhantomData,
        })
    }

    fn execute(self, ledger: &mut dyn LedgerStub, _: &SettlementConfig) -> Result<Response> {
        Response::document(&load::<R>(ledger, &self.id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_core::{MemoryStore, TxContext};

    fn run<O: Operation>(tx: &mut TxContext<'_, MemoryStore>, values: &[&str]) -> Result<Response> {
        let values: Vec<String> = values.iter().map(|s| s.to_string()).collect();
        let args = Args::new(O::NAME, &values, O::ARITY)?;
        O::parse(args)?.execute(tx, &SettlementConfig::default())
    }

    #[test]
    fn test_profile_create_then_update_keeps_created_on() {
        let store = MemoryStore::new();
        let mut tx = TxContext::new(&store);
        run::<UpdateUserProfile>(&mut tx, &["u1", "prosumer", "Pune", "M-9", "solar", "false"])
            .unwrap();
        tx.commit().unwrap();

        let mut tx = TxContext::new(&store);
        let first: UserProfile = load(&tx, "u1").unwrap();
        run::<UpdateUserProfile>(&mut tx, &["u1", "consumer", "Pune", "M-9", "grid", "true"])
            .unwrap();
        let second: UserProfile = load(&tx, "u1").unwrap();

        assert_eq!(second.created_on, first.created_on);
        assert_eq!(second.category, "consumer");
        assert!(second.is_admin);
        assert!(tx.get_state("UserProfile_u1").unwrap().is_some());
        assert!(tx.get_state("u1").unwrap().is_none());
    }

    #[test]
    fn test_contract_requires_profile() {
        let store = MemoryStore::new();
        let mut tx = TxContext::new(&store);
        let err = run::<SignPlatformContract>(&mut tx, &["ghost"]).unwrap_err();
        assert!(matches!(err, Error::NotFound { kind: "UserProfile", .. }));

        run::<UpdateUserProfile>(&mut tx, &["u1", "prosumer", "Pune", "M-9", "solar", "false"])
            .unwrap();
        run::<SignTradingContract>(&mut tx, &["u1", "BidCreated"]).unwrap();
        let contract: TradingContract = load(&tx, "u1").unwrap();
        assert_eq!(contract.bid_status, "BidCreated");
        assert!(contract.signed_contract_hash.is_empty());
    }

    #[test]
    fn test_record_payment_writes_both_records() {
        let store = MemoryStore::new();
        let mut tx = TxContext::new(&store);
        run::<RecordPayment>(
            &mut tx,
            &[
                "P-1", "bid", "120.5", "u1", "PD-1", "u1", "u2", "100", "5", "10", "0", "0",
                "2.5",
            ],
        )
        .unwrap();

        let payment: Payment = load(&tx, "P-1").unwrap();
        let detail: PaymentDetail = load(&tx, "PD-1").unwrap();
        assert_eq!(payment.payment_detail_id, "PD-1");
        assert_eq!(payment.total_amount, 120.5);
        assert_eq!(detail.token_amount_refund, 2.5);

        let doc = serde_json::to_value(&payment).unwrap();
        assert_eq!(doc["paymentDetail"], "PD-1");
    }

    #[test]
    fn test_record_payment_rejects_bad_amount() {
        let store = MemoryStore::new();
        let mut tx = TxContext::new(&store);
        let err = run::<RecordPayment>(
            &mut tx,
            &[
                "P-1", "bid", "120.5", "u1", "PD-1", "u1", "u2", "lots", "5", "10", "0", "0",
                "2.5",
            ],
        )
        .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(tx.pending_writes(), 0);
    }

    #[test]
    fn test_new_order_status() {
        let store = MemoryStore::new();
        let mut tx = TxContext::new(&store);
        let order = |status: &str| {
            vec![
                "BM-1".to_string(),
                status.to_string(),
                "O-1".to_string(),
                "7.5".to_string(),
                "75".to_string(),
                "P-1".to_string(),
                "S-1".to_string(),
                "10".to_string(),
                "7.5".to_string(),
                "u1".to_string(),
                "1700000000".to_string(),
                "buy".to_string(),
            ]
        };

        let values = order("BidSettled");
        let args = Args::new(RegisterOrder::NAME, &values, RegisterOrder::ARITY).unwrap();
        let err = RegisterOrder::parse(args)
            .unwrap()
            .execute(&mut tx, &SettlementConfig::default())
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        for status in ["BidCreated", "BidSettled"] {
            let values = order(status);
            let args = Args::new(RegisterOrder::NAME, &values, RegisterOrder::ARITY).unwrap();
            RegisterOrder::parse(args)
                .unwrap()
                .execute(&mut tx, &SettlementConfig::default())
                .unwrap();
        }
        let stored: Order = load(&tx, "O-1").unwrap();
        assert_eq!(stored.bid_status, "BidSettled");
        assert_eq!(stored.total_quantity, 10);
        assert_eq!(serde_json::to_value(&stored).unwrap()["action"], "buy");
    }
}
