//! Shared data model and status type for the adaptive load controller.
//!
//! This crate has no knowledge of plugins, scoring, or orchestration; it
//! only defines the records every other crate in the workspace passes
//! around, per `spec.md` §3.

pub mod model;
pub mod status;

pub use model::{
    BenchmarkResult, LatencyStatistic, MetricEvaluation, MetricSpec, PluginSpec, RawBenchmarkOutput,
    ReportingPeriod, SessionOutput, SessionSpec, ThresholdSpec, TrafficSpec,
};
pub use status::{Code, Status, StatusResult};
