//! The four plugin kinds, per `spec.md` §4.1: `MetricsProvider`,
//! `ScoringFunction`, `StepController`, `InputVariableSetter`.
//!
//! All plugin methods are synchronous. Per spec.md §5, plugin calls are
//! expected to be non-blocking and CPU-bound; a provider that needs I/O is
//! responsible for its own bounded deadlines.

use adaptive_load_core::{BenchmarkResult, ReportingPeriod, StatusResult, TrafficSpec};

/// A named set of metrics an implementation can report on, with values
/// fetched per benchmark.
pub trait MetricsProvider: Send + Sync {
    /// The metric names this instance can answer `get_metric_value` for.
    fn supported_names(&self) -> Vec<String>;

    /// Fetch one metric's value, optionally windowed by `period`.
    ///
    /// Returns `Status::not_found` for an unsupported name (spec.md §4.2's
    /// built-in extractor follows this same contract for unknown names).
    fn get_metric_value(&self, name: &str, period: ReportingPeriod) -> StatusResult<f64>;
}

/// Maps a measured value and a configured threshold to a score in
/// `[-1.0, 1.0]` (spec.md §4.3).
pub trait ScoringFunction: Send + Sync {
    /// Evaluate one metric value. Implementations must clamp their result
    /// to `[-1.0, 1.0]`.
    fn evaluate(&self, value: f64) -> f64;
}

/// Drives the scalar search for a sustainable load value (spec.md §4.4).
pub trait StepController: Send + Sync {
    /// The traffic spec to run next, with the current recommendation
    /// applied via the configured input-variable setter.
    fn current_traffic_spec(&self) -> StatusResult<TrafficSpec>;

    /// True once further iteration is unlikely to change the recommendation
    /// by more than a small relative amount.
    fn is_converged(&self) -> bool;

    /// `Some(reason)` once no load within the search range can satisfy the
    /// configured thresholds; `None` otherwise.
    fn is_doomed(&self) -> Option<String>;

    /// Feed one benchmark's scored result back into the controller's state.
    fn update_and_recompute(&mut self, result: &BenchmarkResult);
}

/// Applies a scalar recommendation to one field of a `TrafficSpec`
/// (spec.md §4.5).
pub trait InputVariableSetter: Send + Sync {
    /// Set the controlled field on `spec` to `value`.
    ///
    /// Must validate the value's range and must not otherwise mutate
    /// `spec` — on error, `spec` is left unchanged.
    fn set(&self, spec: &mut TrafficSpec, value: f64) -> StatusResult<()>;
}
