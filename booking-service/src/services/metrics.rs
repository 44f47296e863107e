use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use prometheus::{IntCounterVec, Opts, Registry};
use std::sync::OnceLock;

pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
pub static PROMETHEUS_REGISTRY: OnceLock<Registry> = OnceLock::new();
pub static BOOKING_OPERATIONS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static BOOKING_PAYMENTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Installs the Prometheus recorder and the booking counters.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_metrics() -> anyhow::Result<()> {
    if METRICS_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = METRICS_HANDLE.set(handle);

    let registry = Registry::new();

    let operations = IntCounterVec::new(
        Opts::new(
            "booking_operations_total",
            "Booking operations by operation and outcome code",
        ),
        &["operation", "outcome"],
    )?;

    let payments = IntCounterVec::new(
        Opts::new(
            "booking_payments_total",
            "Card payment attempts by final intent status",
        ),
        &["status"],
    )?;

    registry.register(Box::new(operations.clone()))?;
    registry.register(Box::new(payments.clone()))?;

    let _ = PROMETHEUS_REGISTRY.set(registry);
    let _ = BOOKING_OPERATIONS_TOTAL.set(operations);
    let _ = BOOKING_PAYMENTS_TOTAL.set(payments);

    Ok(())
}

pub fn get_metrics() -> String {
    let mut output = METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string());

    if let Some(registry) = PROMETHEUS_REGISTRY.get() {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let metric_families = registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer).ok();
        if let Ok(custom_metrics) = String::from_utf8(buffer) {
            output.push_str(&custom_metrics);
        }
    }

    output
}

/// `outcome` is `ok` or a booking error code.
pub fn record_operation(operation: &str, outcome: &str) {
    if let Some(counter) = BOOKING_OPERATIONS_TOTAL.get() {
        counter.with_label_values(&[operation, outcome]).inc();
    }
}

pub fn record_payment(status: &str) {
    if let Some(counter) = BOOKING_PAYMENTS_TOTAL.get() {
        counter.with_label_values(&[status]).inc();
    }
}
