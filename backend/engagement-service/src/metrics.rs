use actix_middleware::HttpMetrics;
use once_cell::sync::Lazy;
use prometheus::{IntCounterVec, Opts};

pub use actix_middleware::{serve_metrics, MetricsMiddleware};

static HTTP_METRICS: Lazy<HttpMetrics> = Lazy::new(|| {
    HttpMetrics::register(
        prometheus::default_registry(),
        "engagement_service",
        "engagement-service",
    )
    .expect("failed to register engagement-service HTTP metrics")
});

static REACTIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "engagement_reactions_total",
            "Reaction toggles applied, by target kind and requested reaction",
        ),
        &["target", "reaction"],
    )
    .expect("failed to create engagement_reactions_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register engagement_reactions_total");
    counter
});

static COMMENTS_CREATED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new("engagement_comments_created_total", "Comments created"),
        &["kind"],
    )
    .expect("failed to create engagement_comments_created_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register engagement_comments_created_total");
    counter
});

pub fn record_reaction(target: &str, reaction: &str) {
    REACTIONS_TOTAL.with_label_values(&[target, reaction]).inc();
}

pub fn record_comment(is_reply: bool) {
    let kind = if is_reply { "reply" } else { "top_level" };
    COMMENTS_CREATED_TOTAL.with_label_values(&[kind]).inc();
}

/// Request metrics middleware for this service's routes
pub fn http_metrics() -> MetricsMiddleware {
    MetricsMiddleware::new(HTTP_METRICS.clone())
}
