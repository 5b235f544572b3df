//! Phase 1 validation (spec.md §4.8, §3 invariants): a single pass that
//! accumulates every error rather than short-circuiting on the first one.

use adaptive_load_core::{Code, SessionSpec, Status};
use adaptive_load_registry::Registry;

/// Validate a (not yet default-filled) `SessionSpec` against spec.md §3's
/// invariants and every plugin spec's `validate_config`, via `registry`.
/// Returns `Status::ok()` iff every check passed.
pub fn validate(session: &SessionSpec, registry: &Registry) -> Status {
    let mut errors = Vec::new();

    if session.traffic_template.duration.is_some() {
        errors.push(
            "traffic template should not have duration set; the orchestrator owns it".to_string(),
        );
    }
    if session.traffic_template.open_loop.is_some() {
        errors.push(
            "traffic template should not have open_loop set; the orchestrator forces it to true"
                .to_string(),
        );
    }

    let step_controller_status = registry.validate_step_controller(&session.step_controller);
    if !step_controller_status.is_ok() {
        errors.push(format!("step_controller: {step_controller_status}"));
    }

    for provider_spec in &session.metrics_providers {
        let status = registry.validate_metrics_provider(provider_spec);
        if !status.is_ok() {
            errors.push(format!("metrics_providers[{}]: {status}", provider_spec.plugin_name));
        }
    }

    for metric in &session.metrics {
        if let Some(threshold) = &metric.threshold {
            let status = registry.validate_scoring_function(&threshold.scoring_function);
            if !status.is_ok() {
                errors.push(format!(
                    "metrics[{}].threshold.scoring_function: {status}",
                    metric.metric_name
                ));
            }
        }
    }

    if errors.is_empty() {
        Status::ok()
    } else {
        Status::join(errors, Code::InvalidArgument)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, reason = "test assertions favor unwrap over verbose matches")]
mod tests {
    use super::*;
    use adaptive_load_core::{PluginSpec, TrafficSpec};
    use std::time::Duration;

    fn base_session() -> SessionSpec {
        SessionSpec {
            traffic_template: TrafficSpec::with_requests_per_second(10),
            step_controller: PluginSpec::named("does.not.exist"),
            metrics_providers: Vec::new(),
            metrics: Vec::new(),
            measuring_period: None,
            convergence_deadline: None,
            testing_stage_duration: None,
            benchmark_cooldown: None,
        }
    }

    #[test]
    fn preset_duration_is_rejected() {
        let registry = Registry::new();
        let mut session = base_session();
        session.traffic_template.duration = Some(Duration::from_secs(1));
        let status = validate(&session, &registry);
        assert!(!status.is_ok());
        assert!(status.message().contains("duration"));
    }

    #[test]
    fn preset_open_loop_is_rejected() {
        let registry = Registry::new();
        let mut session = base_session();
        session.traffic_template.open_loop = Some(false);
        let status = validate(&session, &registry);
        assert!(!status.is_ok());
        assert!(status.message().contains("open_loop"));
    }

    #[test]
    fn missing_step_controller_factory_is_collected() {
        let registry = Registry::new();
        let session = base_session();
        let status = validate(&session, &registry);
        assert!(!status.is_ok());
        assert!(status.message().contains("step_controller"));
    }

    #[test]
    fn errors_accumulate_rather_than_short_circuit() {
        let registry = Registry::new();
        let mut session = base_session();
        session.traffic_template.duration = Some(Duration::from_secs(1));
        let status = validate(&session, &registry);
        assert!(status.message().contains("duration"));
        assert!(status.message().contains("step_controller"));
    }
}
