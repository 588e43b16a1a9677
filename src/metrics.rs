use axum::{
    body::Body,
    extract::{MatchedPath, State},
    http::{header, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry, TextEncoder,
};
use std::{sync::Arc, time::Instant};

/// Paths left out of the request metrics (scrapes and liveness probes).
const UNMEASURED: &[&str] = &["/metrics", "/handshake"];

pub struct Metrics {
    registry: Registry,
    req_total: IntCounterVec,
    req_duration: HistogramVec,
    in_flight: IntGaugeVec,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let req_total = IntCounterVec::new(
            Opts::new(
                "http_requests_received_total",
                "Total HTTP requests received",
            ),
            &["method", "path", "code"],
        )?;

        let req_duration = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "HTTP request duration in seconds",
            )
            .buckets(vec![
                0.0005, 0.001, 0.002, 0.005, 0.01, 0.02, 0.05, 0.1, 0.2, 0.5, 1.0,
            ]),
            &["method", "path", "code"],
        )?;

        let in_flight = IntGaugeVec::new(
            Opts::new(
                "http_requests_in_progress",
                "HTTP requests currently in progress",
            ),
            &["path"],
        )?;

        registry.register(Box::new(req_total.clone()))?;
        registry.register(Box::new(req_duration.clone()))?;
        registry.register(Box::new(in_flight.clone()))?;

        Ok(Self {
            registry,
            req_total,
            req_duration,
            in_flight,
        })
    }

    // MatchedPath keeps /api/v1/todo/{uuid} as one series
    fn path_label(req: &Request<Body>) -> String {
        match req.extensions().get::<MatchedPath>() {
            Some(matched) => matched.as_str().to_string(),
            None => req.uri().path().to_string(),
        }
    }

    pub fn observe(&self, method: &str, path: &str, code: &str, seconds: f64) {
        self.req_total
            .with_label_values(&[method, path, code])
            .inc();
        self.req_duration
            .with_label_values(&[method, path, code])
            .observe(seconds);
    }

    pub fn render(&self) -> Result<(String, Vec<u8>), prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buf = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buf)?;
        Ok((encoder.format_type().to_string(), buf))
    }

    pub fn response(&self) -> Response {
        match self.render() {
            Ok((content_type, bytes)) => {
                let mut res = Response::new(Body::from(bytes));
                if let Ok(value) = HeaderValue::from_str(&content_type) {
                    res.headers_mut().insert(header::CONTENT_TYPE, value);
                }
                res
            }
            Err(e) => {
                tracing::error!(error = %e, "metrics.render");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

/// Holds one slot of the in-flight gauge; released on drop, including when the
/// request future is dropped by a panic or a timeout.
struct InFlight(IntGauge);

impl InFlight {
    fn enter(gauge: IntGauge) -> Self {
        gauge.inc();
        Self(gauge)
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.dec();
    }
}

pub async fn metrics_middleware(
    State(metrics): State<Arc<Metrics>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let path = Metrics::path_label(&req);
    if UNMEASURED.contains(&path.as_str()) {
        return next.run(req).await;
    }
    let method = req.method().to_string();

    let in_flight = InFlight::enter(metrics.in_flight.with_label_values(&[path.as_str()]));
    let start = Instant::now();
    let res = next.run(req).await;
    let elapsed = start.elapsed().as_secs_f64();
    drop(in_flight);

    metrics.observe(&method, &path, res.status().as_str(), elapsed);
    res
}
