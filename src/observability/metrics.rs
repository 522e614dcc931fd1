use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub bookings_created_total: IntCounter,
    pub booking_transitions_total: IntCounterVec,
    pub booking_operation_errors_total: IntCounterVec,
    pub notifications_published_total: IntCounterVec,
    pub ws_subscribers: IntGauge,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let bookings_created_total =
            IntCounter::new("bookings_created_total", "Total bookings created")
                .expect("valid bookings_created_total metric");

        let booking_transitions_total = IntCounterVec::new(
            Opts::new(
                "booking_transitions_total",
                "Booking status transitions by target status",
            ),
            &["status"],
        )
        .expect("valid booking_transitions_total metric");

        let booking_operation_errors_total = IntCounterVec::new(
            Opts::new(
                "booking_operation_errors_total",
                "Failed booking operations by operation and error kind",
            ),
            &["operation", "kind"],
        )
        .expect("valid booking_operation_errors_total metric");

        let notifications_published_total = IntCounterVec::new(
            Opts::new(
                "notifications_published_total",
                "Change notifications published by entity type",
            ),
            &["entity"],
        )
        .expect("valid notifications_published_total metric");

        let ws_subscribers = IntGauge::new("ws_subscribers", "Connected websocket subscribers")
            .expect("valid ws_subscribers metric");

        registry
            .register(Box::new(bookings_created_total.clone()))
            .expect("register bookings_created_total");
        registry
            .register(Box::new(booking_transitions_total.clone()))
            .expect("register booking_transitions_total");
        registry
            .register(Box::new(booking_operation_errors_total.clone()))
            .expect("register booking_operation_errors_total");
        registry
            .register(Box::new(notifications_published_total.clone()))
            .expect("register notifications_published_total");
        registry
            .register(Box::new(ws_subscribers.clone()))
            .expect("register ws_subscribers");

        Self {
            registry,
            bookings_created_total,
            booking_transitions_total,
            booking_operation_errors_total,
            notifications_published_total,
            ws_subscribers,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
