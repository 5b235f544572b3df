//! The metrics evaluator (spec.md §4.6): turns a `SessionSpec`'s metric
//! declarations into an ordered evaluation plan, then runs that plan
//! against one raw benchmark output.

use std::collections::HashMap;

use adaptive_load_core::{
    BenchmarkResult, Code, MetricEvaluation, MetricSpec, RawBenchmarkOutput, ReportingPeriod,
    SessionSpec, Status, StatusResult, ThresholdSpec,
};
use adaptive_load_registry::{MetricsProvider, Registry};

use crate::builtin::BuiltinMetrics;

/// One `(MetricSpec, ThresholdSpec)` pair if scored, or a lone `MetricSpec`
/// if informational.
pub enum MetricPlanEntry<'a> {
    Scored(&'a MetricSpec, &'a ThresholdSpec),
    Informational(&'a MetricSpec),
}

/// Scored specs first, in declaration order, then informational specs, in
/// declaration order (spec.md §4.6).
pub fn extract_metric_specs(session: &SessionSpec) -> Vec<MetricPlanEntry<'_>> {
    let mut scored = Vec::new();
    let mut informational = Vec::new();
    for metric in &session.metrics {
        match &metric.threshold {
            Some(threshold) => scored.push(MetricPlanEntry::Scored(metric, threshold)),
            None => informational.push(MetricPlanEntry::Informational(metric)),
        }
    }
    scored.extend(informational);
    scored
}

/// Score one raw benchmark output against `session`'s metric plan.
///
/// `preloaded_providers` holds every non-built-in metrics-provider plugin
/// the session configured, keyed by the name it was declared under; a
/// fresh built-in extractor is constructed here and unioned in under
/// `SessionSpec::BUILTIN_PROVIDER_NAME`.
pub fn analyze_benchmark(
    raw: &RawBenchmarkOutput,
    session: &SessionSpec,
    preloaded_providers: &HashMap<String, Box<dyn MetricsProvider>>,
    period: ReportingPeriod,
    registry: &Registry,
) -> StatusResult<BenchmarkResult> {
    if !raw.transport_status.is_ok() {
        return Ok(BenchmarkResult {
            raw: raw.clone(),
            evaluations: Vec::new(),
            status: raw.transport_status.clone(),
        });
    }

    let builtin = BuiltinMetrics::new(raw.clone());
    let plan = extract_metric_specs(session);

    let mut evaluations = Vec::with_capacity(plan.len());
    let mut errors = Vec::new();

    for entry in plan {
        let (metric_spec, threshold) = match entry {
            MetricPlanEntry::Scored(spec, threshold) => (spec, Some(threshold)),
            MetricPlanEntry::Informational(spec) => (spec, None),
        };
        let plugin_name = metric_spec
            .metrics_plugin_name
            .as_deref()
            .unwrap_or(SessionSpec::BUILTIN_PROVIDER_NAME);

        let value = if plugin_name == SessionSpec::BUILTIN_PROVIDER_NAME {
            builtin.get_metric_value(&metric_spec.metric_name, period)
        } else {
            match preloaded_providers.get(plugin_name) {
                Some(provider) => provider.get_metric_value(&metric_spec.metric_name, period),
                None => Err(Status::invalid_argument(format!(
                    "metrics provider not loaded: {plugin_name}"
                ))),
            }
        };

        let metric_value = match value {
            Ok(value) => value,
            Err(status) => {
                errors.push(format!("{plugin_name}/{}: {status}", metric_spec.metric_name));
                continue;
            }
        };

        let metric_id = format!("{plugin_name}/{}", metric_spec.metric_name);
        let (weight, threshold_score) = match threshold {
            None => (0.0, 0.0),
            Some(threshold) => {
                let weight = threshold.weight.unwrap_or(1.0);
                match registry.load_scoring_function(&threshold.scoring_function) {
                    Ok(scoring_function) => (weight, scoring_function.evaluate(metric_value)),
                    Err(status) => {
                        errors.push(format!("{metric_id}: {status}"));
                        continue;
                    }
                }
            }
        };

        evaluations.push(MetricEvaluation {
            metric_id,
            metric_value,
            weight,
            threshold_score,
        });
    }

    if !errors.is_empty() {
        return Err(Status::join(errors, Code::Internal));
    }

    Ok(BenchmarkResult {
        raw: raw.clone(),
        evaluations,
        status: Status::ok(),
    })
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    reason = "test assertions favor unwrap/indexing over verbose matches on known-length fixtures"
)]
mod tests {
    use super::*;
    use adaptive_load_core::{LatencyStatistic, PluginSpec, ThresholdSpec, TrafficSpec};
    use adaptive_load_scoring::{register_all as register_scoring, BINARY_SCORING_NAME};
    use chrono::Utc;
    use serde_json::json;

    fn raw_output() -> RawBenchmarkOutput {
        RawBenchmarkOutput {
            traffic_spec: TrafficSpec::with_requests_per_second(100),
            actual_duration_seconds: 10.0,
            upstream_rq_total: 1_000,
            response_count_2xx: 990,
            request_to_response: LatencyStatistic::default(),
            transport_status: Status::ok(),
        }
    }

    fn registry_with_scoring() -> Registry {
        let mut registry = Registry::new();
        register_scoring(&mut registry);
        registry
    }

    #[test]
    fn transport_failure_short_circuits_with_status_unchanged() {
        let mut raw = raw_output();
        raw.transport_status = Status::unavailable("generator down");
        let session = SessionSpec {
            traffic_template: TrafficSpec::with_requests_per_second(100),
            step_controller: PluginSpec::named("x"),
            metrics_providers: Vec::new(),
            metrics: Vec::new(),
            measuring_period: None,
            convergence_deadline: None,
            testing_stage_duration: None,
            benchmark_cooldown: None,
        };
        let registry = registry_with_scoring();
        let result = analyze_benchmark(
            &raw,
            &session,
            &HashMap::new(),
            ReportingPeriod::zero(Utc::now()),
            &registry,
        )
        .unwrap();
        assert!(result.evaluations.is_empty());
        assert_eq!(result.status.code(), adaptive_load_core::Code::Unavailable);
    }

    #[test]
    fn scored_metric_resolves_builtin_and_scoring_function() {
        let registry = registry_with_scoring();
        let session = SessionSpec {
            traffic_template: TrafficSpec::with_requests_per_second(100),
            step_controller: PluginSpec::named("x"),
            metrics_providers: Vec::new(),
            metrics: vec![MetricSpec {
                metric_name: "success-rate".to_string(),
                metrics_plugin_name: Some(SessionSpec::BUILTIN_PROVIDER_NAME.to_string()),
                threshold: Some(ThresholdSpec {
                    weight: Some(1.0),
                    scoring_function: PluginSpec {
                        plugin_name: BINARY_SCORING_NAME.to_string(),
                        config: json!({ "lower_threshold": 0.9 }),
                    },
                }),
            }],
            measuring_period: None,
            convergence_deadline: None,
            testing_stage_duration: None,
            benchmark_cooldown: None,
        };
        let result = analyze_benchmark(
            &raw_output(),
            &session,
            &HashMap::new(),
            ReportingPeriod::zero(Utc::now()),
            &registry,
        )
        .unwrap();
        assert_eq!(result.evaluations.len(), 1);
        assert_eq!(result.evaluations[0].metric_id, "nighthawk.builtin/success-rate");
        assert_eq!(result.evaluations[0].threshold_score, 1.0);
    }

    #[test]
    fn informational_metric_gets_zero_weight_and_score() {
        let registry = registry_with_scoring();
        let session = SessionSpec {
            traffic_template: TrafficSpec::with_requests_per_second(100),
            step_controller: PluginSpec::named("x"),
            metrics_providers: Vec::new(),
            metrics: vec![MetricSpec {
                metric_name: "achieved-rps".to_string(),
                metrics_plugin_name: None,
                threshold: None,
            }],
            measuring_period: None,
            convergence_deadline: None,
            testing_stage_duration: None,
            benchmark_cooldown: None,
        };
        let result = analyze_benchmark(
            &raw_output(),
            &session,
            &HashMap::new(),
            ReportingPeriod::zero(Utc::now()),
            &registry,
        )
        .unwrap();
        assert_eq!(result.evaluations[0].weight, 0.0);
        assert_eq!(result.evaluations[0].threshold_score, 0.0);
    }

    #[test]
    fn unknown_metric_name_is_collected_as_all_or_nothing_error() {
        let registry = registry_with_scoring();
        let session = SessionSpec {
            traffic_template: TrafficSpec::with_requests_per_second(100),
            step_controller: PluginSpec::named("x"),
            metrics_providers: Vec::new(),
            metrics: vec![
                MetricSpec {
                    metric_name: "achieved-rps".to_string(),
                    metrics_plugin_name: None,
                    threshold: None,
                },
                MetricSpec {
                    metric_name: "does-not-exist".to_string(),
                    metrics_plugin_name: None,
                    threshold: None,
                },
            ],
            measuring_period: None,
            convergence_deadline: None,
            testing_stage_duration: None,
            benchmark_cooldown: None,
        };
        let err = analyze_benchmark(
            &raw_output(),
            &session,
            &HashMap::new(),
            ReportingPeriod::zero(Utc::now()),
            &registry,
        )
        .unwrap_err();
        assert_eq!(err.code(), adaptive_load_core::Code::Internal);
        assert!(err.message().contains("does-not-exist"));
    }

    #[test]
    fn extract_metric_specs_orders_scored_before_informational() {
        let session = SessionSpec {
            traffic_template: TrafficSpec::with_requests_per_second(100),
            step_controller: PluginSpec::named("x"),
            metrics_providers: Vec::new(),
            metrics: vec![
                MetricSpec {
                    metric_name: "informational-1".to_string(),
                    metrics_plugin_name: None,
                    threshold: None,
                },
                MetricSpec {
                    metric_name: "scored-1".to_string(),
                    metrics_plugin_name: None,
                    threshold: Some(ThresholdSpec {
                        weight: None,
                        scoring_function: PluginSpec::named("x"),
                    }),
                },
            ],
            measuring_period: None,
            convergence_deadline: None,
            testing_stage_duration: None,
            benchmark_cooldown: None,
        };
        let plan = extract_metric_specs(&session);
        assert!(matches!(plan[0], MetricPlanEntry::Scored(spec, _) if spec.metric_name == "scored-1"));
        assert!(matches!(plan[1], MetricPlanEntry::Informational(spec) if spec.metric_name == "informational-1"));
    }
}
