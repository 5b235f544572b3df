//! The built-in metrics extractor and metrics evaluator (spec.md §4.2,
//! §4.6).

pub mod builtin;
pub mod evaluator;

pub use builtin::BuiltinMetrics;
pub use evaluator::{analyze_benchmark, extract_metric_specs, MetricPlanEntry};
