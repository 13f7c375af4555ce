use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use opentelemetry::{KeyValue, global, metrics::Counter};

#[derive(Clone, Debug)]
pub struct Metrics {
    pub decisions_total: Counter<u64>,
}

impl Metrics {
    #[must_use]
    pub fn new() -> Self {
        let meter = global::meter("todo-server");
        Self {
            decisions_total: meter
                .u64_counter("rate_limit_decisions_total")
                .with_description("Rate limit decisions (allowed/throttled)")
                .build(),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Counts the governor's decisions and logs throttled requests.
pub async fn log_rate_limit_events(State(metrics): State<Metrics>, request: Request, next: Next) -> Response {
    let response = next.run(request).await;

    let label = if response.status() == StatusCode::TOO_MANY_REQUESTS {
        let after = response.headers().get("x-ratelimit-after").and_then(|v| v.to_str().ok());
        tracing::warn!(retry_after_secs = after, "Rate limit exceeded");
        "throttled"
    } else {
        "allowed"
    };

    metrics.decisions_total.add(1, &[KeyValue::new("status", label)]);
    response
}
