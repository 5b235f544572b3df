//! The built-in metrics extractor (spec.md §4.2): derives a fixed set of
//! named metrics from one raw benchmark output, with no external plugin
//! involved.

use adaptive_load_core::{RawBenchmarkOutput, ReportingPeriod, Status, StatusResult};
use adaptive_load_registry::MetricsProvider;

const SUPPORTED_NAMES: &[&str] = &[
    "attempted-rps",
    "achieved-rps",
    "send-rate",
    "success-rate",
    "latency-ns-min",
    "latency-ns-mean",
    "latency-ns-max",
    "latency-ns-pstdev",
    "latency-ns-mean-plus-1stdev",
    "latency-ns-mean-plus-2stdev",
    "latency-ns-mean-plus-3stdev",
];

/// Wraps one `RawBenchmarkOutput` and answers the fixed set of built-in
/// metric names against it.
pub struct BuiltinMetrics {
    raw: RawBenchmarkOutput,
}

impl BuiltinMetrics {
    pub fn new(raw: RawBenchmarkOutput) -> Self {
        Self { raw }
    }

    fn attempted_rps(&self) -> f64 {
        f64::from(self.raw.traffic_spec.requests_per_second)
    }

    fn achieved_rps(&self) -> f64 {
        safe_div(self.raw.upstream_rq_total as f64, self.raw.actual_duration_seconds)
    }

    fn send_rate(&self) -> f64 {
        safe_div(self.achieved_rps(), self.attempted_rps())
    }

    fn success_rate(&self) -> f64 {
        safe_div(self.raw.response_count_2xx as f64, self.raw.upstream_rq_total as f64)
    }
}

/// `0.0` rather than `NaN`/`inf` for a zero denominator (spec.md §4.2).
fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

impl MetricsProvider for BuiltinMetrics {
    fn supported_names(&self) -> Vec<String> {
        SUPPORTED_NAMES.iter().map(|s| (*s).to_string()).collect()
    }

    fn get_metric_value(&self, name: &str, _period: ReportingPeriod) -> StatusResult<f64> {
        let stats = &self.raw.request_to_response;
        let value = match name {
            "attempted-rps" => self.attempted_rps(),
            "achieved-rps" => self.achieved_rps(),
            "send-rate" => self.send_rate(),
            "success-rate" => self.success_rate(),
            "latency-ns-min" => stats.min_ns,
            "latency-ns-mean" => stats.mean_ns,
            "latency-ns-max" => stats.max_ns,
            "latency-ns-pstdev" => stats.pstdev_ns,
            "latency-ns-mean-plus-1stdev" => stats.mean_ns + stats.pstdev_ns,
            "latency-ns-mean-plus-2stdev" => stats.mean_ns + 2.0 * stats.pstdev_ns,
            "latency-ns-mean-plus-3stdev" => stats.mean_ns + 3.0 * stats.pstdev_ns,
            _ => return Err(Status::not_found(format!("unknown built-in metric: {name}"))),
        };
        Ok(value)
    }
}
