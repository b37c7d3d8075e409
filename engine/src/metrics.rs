pub const REQUESTS_STARTED_METRIC_NAME: &str = "requests_started";
pub const REQUESTS_SETTLED_METRIC_NAME: &str = "requests_settled";

pub const FULFILLED: &str = "fulfilled";
pub const REJECTED: &str = "rejected";
pub const STALE: &str = "stale";

pub(crate) fn record_started(operation: &'static str) {
    metrics::counter!(REQUESTS_STARTED_METRIC_NAME, "operation" => operation).increment(1);
}

pub(crate) fn record_settled(operation: &'static str, outcome: &'static str) {
    metrics::counter!(
        REQUESTS_SETTLED_METRIC_NAME,
        "operation" => operation,
        "outcome" => outcome
    )
    .increment(1);
}
