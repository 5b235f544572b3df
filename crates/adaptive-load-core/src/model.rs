//! The session data model: `spec.md` §3's "opaque typed records", represented
//! here as concrete serde-friendly Rust structs. The wire-protocol schema of
//! these records is out of scope (spec.md §1); these types are this crate's
//! own in-memory representation, not a generated protobuf binding.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::status::Status;

/// A traffic specification consumed by the external load generator.
///
/// Per spec.md invariant 4, a session's template must not preset `duration`
/// (the orchestrator owns it) or `open_loop` (it must always be open-loop).
/// Everything the load generator needs beyond rate and duration is carried
/// in `extra`, since the wire schema itself is opaque to this controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficSpec {
    /// Requests per second the generator should aim for.
    pub requests_per_second: u32,
    /// How long the generator should run. `None` in a session's template;
    /// always `Some` by the time it is sent to the dispatch client.
    pub duration: Option<Duration>,
    /// Whether the generator runs open-loop. Always forced to `Some(true)`
    /// by the dispatch client before the request is sent.
    pub open_loop: Option<bool>,
    /// Additional generator-specific fields this controller does not
    /// interpret.
    #[serde(default)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl TrafficSpec {
    /// A minimal spec with the given rate and no duration/open_loop set yet.
    pub fn with_requests_per_second(requests_per_second: u32) -> Self {
        Self {
            requests_per_second,
            duration: None,
            open_loop: None,
            extra: BTreeMap::new(),
        }
    }
}

/// One scored or informational metric measurement, per spec.md §3.
///
/// Invariant: `weight >= 0`; `threshold_score` is only meaningful when
/// `weight > 0` (a `weight == 0` entry is informational).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricEvaluation {
    /// `"<plugin_name>/<metric_name>"`.
    pub metric_id: String,
    /// The measured value.
    pub metric_value: f64,
    /// Non-negative; zero marks this metric as informational.
    pub weight: f64,
    /// In `[-1, 1]`. Only meaningful when `weight > 0`.
    pub threshold_score: f64,
}

/// A plugin reference plus its opaque configuration blob, resolved at load
/// time by the plugin registry (spec.md §4.1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginSpec {
    /// The registered factory name, e.g. `"nighthawk.binary_scoring"`.
    pub plugin_name: String,
    /// Factory-specific configuration, validated by that factory.
    #[serde(default)]
    pub config: serde_json::Value,
}

impl PluginSpec {
    /// Build a plugin spec with no configuration.
    pub fn named(plugin_name: impl Into<String>) -> Self {
        Self {
            plugin_name: plugin_name.into(),
            config: serde_json::Value::Null,
        }
    }
}

/// A scored metric's threshold: a weight plus the scoring function to apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSpec {
    /// Contribution weight. `None` defaults to `1.0` during normalization.
    #[serde(default)]
    pub weight: Option<f64>,
    /// The scoring-function plugin to evaluate this metric against.
    pub scoring_function: PluginSpec,
}

/// A metric to fetch from a named metrics-provider plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSpec {
    /// The metric name as understood by the provider plugin.
    pub metric_name: String,
    /// The metrics-provider plugin to query. `None` defaults to
    /// `"nighthawk.builtin"` during normalization.
    #[serde(default)]
    pub metrics_plugin_name: Option<String>,
    /// The scoring threshold for this metric, if it counts toward
    /// convergence. `None` makes this an informational metric.
    #[serde(default)]
    pub threshold: Option<ThresholdSpec>,
}

/// The wallclock window during which a benchmark was actively sending load,
/// passed to metrics providers so they can window external time-series
/// queries (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReportingPeriod {
    /// Window start.
    pub start_wallclock: DateTime<Utc>,
    /// Window length.
    pub duration: Duration,
}

impl ReportingPeriod {
    /// A zero-duration reporting period anchored at `start`, used when the
    /// caller (e.g. a unit test invoking a metrics provider directly) has no
    /// real window. Per spec.md §9, providers must not rely on the period
    /// being meaningfully set for correctness in that case.
    pub fn zero(start: DateTime<Utc>) -> Self {
        Self {
            start_wallclock: start,
            duration: Duration::ZERO,
        }
    }
}

/// Raw output of one load-generator execution, as returned over the
/// benchmark-dispatch RPC (spec.md §4.7). Opaque beyond the fields the
/// built-in metrics extractor and the transport layer need.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBenchmarkOutput {
    /// The traffic spec this benchmark was run with (echoed back so the
    /// built-in extractor can read `requests_per_second` from it).
    pub traffic_spec: TrafficSpec,
    /// Wall-clock seconds the benchmark actually ran for.
    pub actual_duration_seconds: f64,
    /// Total upstream requests issued.
    pub upstream_rq_total: u64,
    /// Count of responses with a 2xx status.
    pub response_count_2xx: u64,
    /// Request-to-response latency distribution, in nanoseconds.
    pub request_to_response: LatencyStatistic,
    /// A non-OK status here indicates a transport-layer failure; when set,
    /// the other fields are not meaningful (spec.md §4.6 step 1).
    #[serde(default = "Status::ok", skip_serializing_if = "Status::is_ok")]
    pub transport_status: Status,
}

impl RawBenchmarkOutput {
    /// An empty, successful placeholder output at the given rate.
    pub fn empty(requests_per_second: u32) -> Self {
        Self {
            traffic_spec: TrafficSpec::with_requests_per_second(requests_per_second),
            actual_duration_seconds: 0.0,
            upstream_rq_total: 0,
            response_count_2xx: 0,
            request_to_response: LatencyStatistic::default(),
            transport_status: Status::ok(),
        }
    }
}

/// A min/mean/max/population-standard-deviation summary of a latency
/// distribution, in nanoseconds (spec.md §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct LatencyStatistic {
    /// Minimum observed latency, in nanoseconds.
    pub min_ns: f64,
    /// Mean observed latency, in nanoseconds.
    pub mean_ns: f64,
    /// Maximum observed latency, in nanoseconds.
    pub max_ns: f64,
    /// Population standard deviation, in nanoseconds.
    pub pstdev_ns: f64,
}

/// One execution of the load generator plus its scored evaluations
/// (spec.md §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    /// The raw generator output this result was derived from.
    pub raw: RawBenchmarkOutput,
    /// Scored and informational metric evaluations, in declaration order.
    pub evaluations: Vec<MetricEvaluation>,
    /// The overall status of this single benchmark iteration.
    #[serde(default = "Status::ok", skip_serializing_if = "Status::is_ok")]
    pub status: Status,
}

impl BenchmarkResult {
    /// A result carrying only a failure status, no evaluations — used when
    /// a benchmark could not be run or evaluated at all (spec.md §4.8).
    pub fn failed(requests_per_second: u32, status: Status) -> Self {
        Self {
            raw: RawBenchmarkOutput::empty(requests_per_second),
            evaluations: Vec::new(),
            status,
        }
    }
}

/// The full, immutable specification of one adaptive load session
/// (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSpec {
    /// The traffic template applied to every benchmark this session runs.
    /// Must not preset `duration` or `open_loop` (invariant 4).
    pub traffic_template: TrafficSpec,
    /// The step-controller plugin driving the adjusting stage.
    pub step_controller: PluginSpec,
    /// Metrics to fetch from non-built-in providers.
    #[serde(default)]
    pub metrics_providers: Vec<PluginSpec>,
    /// Metrics participating in scoring and convergence, plus any
    /// informational metrics (declared with `threshold: None`).
    #[serde(default)]
    pub metrics: Vec<MetricSpec>,
    /// How long each adjusting-stage benchmark runs.
    #[serde(default)]
    pub measuring_period: Option<Duration>,
    /// Wall-clock budget for the whole adjusting stage.
    #[serde(default)]
    pub convergence_deadline: Option<Duration>,
    /// Duration of the final testing-stage benchmark.
    #[serde(default)]
    pub testing_stage_duration: Option<Duration>,
    /// Sleep interval between adjusting-stage benchmarks.
    #[serde(default)]
    pub benchmark_cooldown: Option<Duration>,
}

impl SessionSpec {
    /// Default measuring period: 10 seconds (spec.md §4.8).
    pub const DEFAULT_MEASURING_PERIOD: Duration = Duration::from_secs(10);
    /// Default convergence deadline: 300 seconds.
    pub const DEFAULT_CONVERGENCE_DEADLINE: Duration = Duration::from_secs(300);
    /// Default testing-stage duration: 30 seconds.
    pub const DEFAULT_TESTING_STAGE_DURATION: Duration = Duration::from_secs(30);
    /// Default benchmark cooldown: zero.
    pub const DEFAULT_BENCHMARK_COOLDOWN: Duration = Duration::ZERO;
    /// The built-in metrics provider's registered name.
    pub const BUILTIN_PROVIDER_NAME: &'static str = "nighthawk.builtin";

    /// Apply spec.md §4.8 Phase 1 defaults, returning a fully resolved copy.
    /// Does not validate; see `adaptive_load_orchestrator::validate`.
    pub fn with_defaults_applied(&self) -> Self {
        let mut resolved = self.clone();
        resolved.measuring_period = Some(
            resolved
                .measuring_period
                .unwrap_or(Self::DEFAULT_MEASURING_PERIOD),
        );
        resolved.convergence_deadline = Some(
            resolved
                .convergence_deadline
                .unwrap_or(Self::DEFAULT_CONVERGENCE_DEADLINE),
        );
        resolved.testing_stage_duration = Some(
            resolved
                .testing_stage_duration
                .unwrap_or(Self::DEFAULT_TESTING_STAGE_DURATION),
        );
        resolved.benchmark_cooldown = Some(
            resolved
                .benchmark_cooldown
                .unwrap_or(Self::DEFAULT_BENCHMARK_COOLDOWN),
        );
        resolved.traffic_template.open_loop = Some(true);
        for metric in &mut resolved.metrics {
            if metric.metrics_plugin_name.is_none() {
                metric.metrics_plugin_name = Some(Self::BUILTIN_PROVIDER_NAME.to_string());
            }
            if let Some(threshold) = &mut metric.threshold {
                if threshold.weight.is_none() {
                    threshold.weight = Some(1.0);
                }
            }
        }
        resolved
    }
}

/// The terminal outcome of a session plus every benchmark result recorded
/// along the way (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionOutput {
    /// Every benchmark executed during the adjusting stage, in order.
    #[serde(default)]
    pub adjusting_stage_results: Vec<BenchmarkResult>,
    /// The single testing-stage benchmark, present iff `status` is `Ok`.
    #[serde(default)]
    pub testing_stage_result: Option<BenchmarkResult>,
    /// The resolved (default-filled) session spec this session ran with.
    /// `None` only when validation rejected the spec before it could be
    /// resolved.
    pub resolved_spec: Option<SessionSpec>,
    /// The session's terminal status.
    pub status: Status,
}

impl SessionOutput {
    /// A terminal, pre-validation failure: no spec was resolved, no
    /// benchmarks ran.
    pub fn rejected(status: Status) -> Self {
        Self {
            adjusting_stage_results: Vec::new(),
            testing_stage_result: None,
            resolved_spec: None,
            status,
        }
    }
}
