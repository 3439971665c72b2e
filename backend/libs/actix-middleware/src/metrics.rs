use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpResponse,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::rc::Rc;
use std::time::{Duration, Instant};

const LATENCY_BUCKETS: &[f64] = &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5];

/// Request counter and latency histogram labelled by method, route and status
#[derive(Clone)]
pub struct HttpMetrics {
    requests: IntCounterVec,
    duration: HistogramVec,
}

impl HttpMetrics {
    /// Register `{prefix}_http_requests_total` and
    /// `{prefix}_http_request_duration_seconds` in `registry`
    pub fn register(registry: &Registry, prefix: &str, service: &str) -> prometheus::Result<Self> {
        let requests = IntCounterVec::new(
            Opts::new(
                format!("{prefix}_http_requests_total"),
                format!("Total HTTP requests handled by {service}"),
            ),
            &["method", "path", "status"],
        )?;
        registry.register(Box::new(requests.clone()))?;

        let duration = HistogramVec::new(
            HistogramOpts::new(
                format!("{prefix}_http_request_duration_seconds"),
                format!("HTTP request latency for {service}"),
            )
            .buckets(LATENCY_BUCKETS.to_vec()),
            &["method", "path", "status"],
        )?;
        registry.register(Box::new(duration.clone()))?;

        Ok(Self { requests, duration })
    }

    pub fn observe(&self, method: &str, path: &str, status: u16, elapsed: Duration) {
        let status = status.to_string();
        self.requests
            .with_label_values(&[method, path, &status])
            .inc();
        self.duration
            .with_label_values(&[method, path, &status])
            .observe(elapsed.as_secs_f64());
    }

    pub fn requests_total(&self, method: &str, path: &str, status: u16) -> u64 {
        self.requests
            .with_label_values(&[method, path, &status.to_string()])
            .get()
    }
}

/// Prometheus text exposition of the default registry
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}

/// Records every request against its route pattern, so path parameters
/// do not explode label cardinality
pub struct MetricsMiddleware {
    metrics: HttpMetrics,
}

impl MetricsMiddleware {
    pub fn new(metrics: HttpMetrics) -> Self {
        Self { metrics }
    }
}

impl<S, B> Transform<S, ServiceRequest> for MetricsMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = MetricsMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(MetricsMiddlewareService {
            service: Rc::new(service),
            metrics: self.metrics.clone(),
        }))
    }
}

pub struct MetricsMiddlewareService<S> {
    service: Rc<S>,
    metrics: HttpMetrics,
}

impl<S, B> Service<ServiceRequest> for MetricsMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let metrics = self.metrics.clone();
        let path = req
            .match_pattern()
            .unwrap_or_else(|| "unmatched".to_string());
        let method = req.method().to_string();
        let start = Instant::now();

        Box::pin(async move {
            let result = service.call(req).await;
            let status = match &result {
                Ok(response) => response.status().as_u16(),
                Err(_) => 500,
            };
            metrics.observe(&method, &path, status, start.elapsed());
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, web, App};

    #[actix_rt::test]
    async fn test_requests_are_labelled_by_route_pattern() {
        let registry = Registry::new();
        let metrics = HttpMetrics::register(&registry, "test_service", "test-service").unwrap();

        let app = test::init_service(
            App::new()
                .wrap(MetricsMiddleware::new(metrics.clone()))
                .route("/items/{id}", web::get().to(|| async { "ok" })),
        )
        .await;

        for id in ["a", "b"] {
            let req = test::TestRequest::get().uri(&format!("/items/{id}")).to_request();
            test::call_service(&app, req).await;
        }
        let req = test::TestRequest::get().uri("/missing").to_request();
        test::call_service(&app, req).await;

        assert_eq!(metrics.requests_total("GET", "/items/{id}", 200), 2);
        assert_eq!(metrics.requests_total("GET", "unmatched", 404), 1);
    }

    #[::core::prelude::v1::test]
    fn test_duplicate_registration_is_an_error() {
        let registry = Registry::new();
        HttpMetrics::register(&registry, "dup", "dup").unwrap();
        assert!(HttpMetrics::register(&registry, "dup", "dup").is_err());
    }
}
