use actix_middleware::HttpMetrics;
use once_cell::sync::Lazy;
use prometheus::{IntCounterVec, IntGauge, Opts};

pub use actix_middleware::{serve_metrics, MetricsMiddleware};

static HTTP_METRICS: Lazy<HttpMetrics> = Lazy::new(|| {
    HttpMetrics::register(
        prometheus::default_registry(),
        "notification_service",
        "notification-service",
    )
    .expect("failed to register notification-service HTTP metrics")
});

static FANOUT_EVENTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "notification_fanout_events_total",
            "Administrative events fanned out, by kind and final stage",
        ),
        &["kind", "outcome"],
    )
    .expect("failed to create notification_fanout_events_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register notification_fanout_events_total");
    counter
});

static DELIVERIES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "notification_deliveries_total",
            "Per-channel delivery attempts",
        ),
        &["channel", "result"],
    )
    .expect("failed to create notification_deliveries_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register notification_deliveries_total");
    counter
});

static WEBSOCKET_CONNECTIONS: Lazy<IntGauge> = Lazy::new(|| {
    let gauge = IntGauge::new(
        "notification_websocket_connections",
        "Open admin push connections",
    )
    .expect("failed to create notification_websocket_connections");
    prometheus::default_registry()
        .register(Box::new(gauge.clone()))
        .expect("failed to register notification_websocket_connections");
    gauge
});

pub fn record_fanout(kind: &str, outcome: &str) {
    FANOUT_EVENTS_TOTAL.with_label_values(&[kind, outcome]).inc();
}

pub fn record_delivery(channel: &str, ok: bool) {
    let result = if ok { "sent" } else { "failed" };
    DELIVERIES_TOTAL.with_label_values(&[channel, result]).inc();
}

pub fn set_websocket_connections(count: usize) {
    WEBSOCKET_CONNECTIONS.set(count as i64);
}

/// Request metrics middleware for this service's routes
pub fn http_metrics() -> MetricsMiddleware {
    MetricsMiddleware::new(HTTP_METRICS.clone())
}
