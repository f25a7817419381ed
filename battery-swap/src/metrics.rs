//! Invocation metrics

use prometheus::{
    Counter, Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};

/// Swap engine metrics, registered on their own [`Registry`]
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,

    /// Invocations by operation and outcome (`ok` or an error kind)
    pub invocations: IntCounterVec,

    /// Invocation latency by operation
    pub duration: HistogramVec,

    /// Completed rental settlements
    pub settlements: IntCounter,

    /// Sum of escrow settled
    pub settled_escrow: Counter,
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics")
            .field("settlements", &self.settlements.get())
            .field("settled_escrow", &self.settled_escrow.get())
            .finish_non_exhaustive()
    }
}

impl Metrics {
    /// Create and register every metric
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let invocations = IntCounterVec::new(
            Opts::new("swap_invocations_total", "Total swap engine invocations"),
            &["operation", "outcome"],
        )?;
        let duration = HistogramVec::new(
            HistogramOpts::new(
                "swap_invocation_duration_seconds",
                "Swap engine invocation duration",
            ),
            &["operation"],
        )?;
        let settlements = IntCounter::new("swap_settlements_total", "Completed rental settlements")?;
        let settled_escrow = Counter::new("swap_settled_escrow_total", "Total escrow settled")?;

        registry.register(Box::new(invocations.clone()))?;
        registry.register(Box::new(duration.clone()))?;
        registry.register(Box::new(settlements.clone()))?;
        registry.register(Box::new(settled_escrow.clone()))?;

        Ok(Self {
            registry,
            invocations,
            duration,
            settlements,
            settled_escrow,
        })
    }

    /// Record one finished invocation
    pub fn observe(&self, operation: &str, outcome: &str, seconds: f64) {
        self.invocations
            .with_label_values(&[operation, outcome])
            .inc();
        self.duration
            .with_label_values(&[operation])
            .observe(seconds);
    }

    /// Record one settlement
    pub fn settled(&self, escrow: f64) {
        self.settlements.inc();
        if escrow.is_finite() && escrow >= 0.0 {
            self.settled_escrow.inc_by(escrow);
        }
    }

    /// Prometheus text exposition of every metric
    pub fn render(&self) -> prometheus::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
