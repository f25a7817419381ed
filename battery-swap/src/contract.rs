//! Invocation entry point
//!
//! One invocation is one transaction: the operation runs against a fresh
//! [`TxContext`] and its write set is committed only if it succeeds.

use crate::{
    config::Config,
    dispatch::{Dispatcher, Operation, Response},
    lifecycle::ReturnBattery,
    metrics::Metrics,
    registry,
    types::Battery,
    Error, Result,
};
use ledger_core::{LedgerStub, StateStore, TxContext};
use std::time::Instant;

/// Metrics label for names outside the dispatch table
pub const UNKNOWN_OPERATION: &str = "unknown";

/// Escrow held by the battery a return names; the return itself clears it
fn escrow_before_return(
    ledger: &dyn LedgerStub,
    operation: &str,
    args: &[String],
) -> Result<Option<f64>> {
    if operation != ReturnBattery::NAME {
        return Ok(None);
    }
    match args.first() {
        Some(id) => Ok(registry::try_load::<Battery>(ledger, id)?.map(|b| b.escrowed_amount)),
        None => Ok(None),
    }
}

/// Swap engine bound to its configuration
#[derive(Debug, Clone)]
pub struct SwapContract {
    dispatcher: Dispatcher,
    config: Config,
    metrics: Metrics,
}

impl SwapContract {
    /// Create the engine; the configuration must be valid
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let metrics =
            Metrics::new().map_err(|e| Error::Config(format!("metrics registry: {}", e)))?;
        Ok(Self {
            dispatcher: Dispatcher::new(),
            config,
            metrics,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Engine metrics
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Registered operation names
    pub fn operations(&self) -> Vec<&'static str> {
        self.dispatcher.operations()
    }

    /// Run one operation as a transaction against `store`
    pub fn invoke<S: StateStore + ?Sized>(
        &self,
        store: &S,
        operation: &str,
        args: &[String],
    ) -> Result<Response> {
        let started = Instant::now();
        let label = self
            .dispatcher
            .registered_name(operation)
            .unwrap_or(UNKNOWN_OPERATION);
        let mut tx = TxContext::new(store).with_query_config(&self.config.ledger.query);
        let tx_id = tx.tx_id();

        let result = escrow_before_return(&tx, operation, args).and_then(|escrow| {
            let response =
                self.dispatcher
                    .dispatch(&mut tx, &self.config.settlement, operation, args)?;
            let writes = tx.pending_writes();
            tx.commit()?;
            Ok((response, writes, escrow))
        });
        let elapsed = started.elapsed().as_secs_f64();

        match result {
            Ok((response, writes, escrow)) => {
                self.metrics.observe(label, "ok", elapsed);
                if let Some(escrow) = escrow {
                    self.metrics.settled(escrow);
                }
                tracing::info!(
                    service = %self.config.service_name,
                    operation,
                    tx_id = %tx_id,
                    writes,
                    "Invocation committed"
                );
                Ok(response)
            }
            Err(err) => {
                self.metrics.observe(label, err.kind(), elapsed);
                tracing::warn!(
                    service = %self.config.service_name,
                    operation,
                    tx_id = %tx_id,
                    error = %err,
                    "Invocation rejected"
                );
                Err(err)
            }
        }
    }
}
