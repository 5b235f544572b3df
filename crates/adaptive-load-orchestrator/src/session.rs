//! The session orchestrator (spec.md §4.8): the single top-level control
//! driver sequencing validation, plugin instantiation, the adjusting loop,
//! and the testing stage.

use std::collections::HashMap;
use std::sync::Arc;

use adaptive_load_core::{
    BenchmarkResult, Code, MetricEvaluation, RawBenchmarkOutput, ReportingPeriod, SessionOutput,
    SessionSpec, Status,
};
use adaptive_load_dispatch::BenchmarkDispatcher;
use adaptive_load_metrics::analyze_benchmark;
use adaptive_load_registry::{MetricsProvider, Registry, StepController};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::panic_guard::catch_panic;
use crate::validation::validate;

/// Run one adaptive load session to completion (or to cancellation,
/// deadline, or doom).
pub async fn run_adaptive_load_session(
    session: SessionSpec,
    registry: &Registry,
    dispatcher: Arc<dyn BenchmarkDispatcher>,
    clock: &dyn Clock,
    cancellation: CancellationToken,
) -> SessionOutput {
    // Phase 1 — validation, against the spec as given (pre-defaults; the
    // duration/open_loop invariant would otherwise always pass once the
    // defaulting pass forces open_loop to true).
    let validation_status = validate(&session, registry);
    if !validation_status.is_ok() {
        return SessionOutput::rejected(validation_status);
    }

    let resolved = session.with_defaults_applied();

    // Phase 2 — plugin instantiation.
    let mut instantiation_errors = Vec::new();
    let mut providers: HashMap<String, Box<dyn MetricsProvider>> = HashMap::new();
    for provider_spec in &resolved.metrics_providers {
        match catch_panic(|| registry.load_metrics_provider(provider_spec)) {
            Ok(Ok(provider)) => {
                providers.insert(provider_spec.plugin_name.clone(), provider);
            }
            Ok(Err(status)) => instantiation_errors.push(format!("{}: {status}", provider_spec.plugin_name)),
            Err(status) => instantiation_errors.push(status.to_string()),
        }
    }

    let mut step_controller: Option<Box<dyn StepController>> = None;
    match catch_panic(|| {
        registry.load_step_controller(&resolved.step_controller, &resolved.traffic_template)
    }) {
        Ok(Ok(controller)) => step_controller = Some(controller),
        Ok(Err(status)) => instantiation_errors.push(format!("step_controller: {status}")),
        Err(status) => instantiation_errors.push(status.to_string()),
    }

    if !instantiation_errors.is_empty() {
        return terminal(
            Vec::new(),
            None,
            resolved,
            Status::join(instantiation_errors, Code::InvalidArgument),
        );
    }
    let Some(mut step_controller) = step_controller else {
        return terminal(
            Vec::new(),
            None,
            resolved,
            Status::internal("step controller missing after successful instantiation"),
        );
    };

    if let Some(status) = check_metric_names_supported(&resolved, &providers) {
        return terminal(Vec::new(), None, resolved, status);
    }

    // Phase 3 — adjusting loop.
    let start_time = clock.now();
    let measuring_period = resolved
        .measuring_period
        .unwrap_or(SessionSpec::DEFAULT_MEASURING_PERIOD);
    let convergence_deadline = resolved
        .convergence_deadline
        .unwrap_or(SessionSpec::DEFAULT_CONVERGENCE_DEADLINE);
    let benchmark_cooldown = resolved
        .benchmark_cooldown
        .unwrap_or(SessionSpec::DEFAULT_BENCHMARK_COOLDOWN);

    let mut adjusting_stage_results = Vec::new();

    loop {
        if cancellation.is_cancelled() {
            return terminal(
                adjusting_stage_results,
                None,
                resolved,
                Status::cancelled("session was cancelled"),
            );
        }

        let elapsed = clock.now() - start_time;
        let deadline = chrono::Duration::from_std(convergence_deadline)
            .unwrap_or_else(|_| chrono::Duration::seconds(i64::MAX / 1_000));
        if elapsed > deadline {
            return terminal(
                adjusting_stage_results,
                None,
                resolved,
                Status::deadline_exceeded("failed to converge before deadline"),
            );
        }

        let traffic_spec = match catch_panic(|| step_controller.current_traffic_spec()) {
            Ok(Ok(spec)) => spec,
            Ok(Err(status)) | Err(status) => {
                adjusting_stage_results.push(BenchmarkResult::failed(0, status.clone()));
                let synthetic = synthetic_all_minus_result(status);
                if let Err(panic_status) =
                    catch_panic(|| step_controller.update_and_recompute(&synthetic))
                {
                    return terminal(adjusting_stage_results, None, resolved, panic_status);
                }
                if let Ok(Some(reason)) = catch_panic(|| step_controller.is_doomed()) {
                    return terminal(
                        adjusting_stage_results,
                        None,
                        resolved,
                        Status::failed_precondition(format!(
                            "step controller determined it can never converge: {reason}"
                        )),
                    );
                }
                continue;
            }
        };

        tokio::select! {
            _ = cancellation.cancelled() => {
                return terminal(
                    adjusting_stage_results,
                    None,
                    resolved,
                    Status::cancelled("session was cancelled"),
                );
            }
            _ = tokio::time::sleep(benchmark_cooldown) => {}
        }

        let reporting_period_start = clock.now();
        let benchmark_outcome = run_one_benchmark(
            dispatcher.clone(),
            &traffic_spec,
            measuring_period,
            reporting_period_start,
            &resolved,
            &providers,
            registry,
        )
        .await;

        let result = match benchmark_outcome {
            Ok(result) => result,
            Err(status) => BenchmarkResult::failed(traffic_spec.requests_per_second, status),
        };
        adjusting_stage_results.push(result.clone());

        if let Err(status) = catch_panic(|| step_controller.update_and_recompute(&result)) {
            return terminal(adjusting_stage_results, None, resolved, status);
        }

        match catch_panic(|| step_controller.is_doomed()) {
            Ok(Some(reason)) => {
                return terminal(
                    adjusting_stage_results,
                    None,
                    resolved,
                    Status::failed_precondition(format!(
                        "step controller determined it can never converge: {reason}"
                    )),
                );
            }
            Err(status) => return terminal(adjusting_stage_results, None, resolved, status),
            Ok(None) => {}
        }

        match catch_panic(|| step_controller.is_converged()) {
            Ok(true) => break,
            Ok(false) => continue,
            Err(status) => return terminal(adjusting_stage_results, None, resolved, status),
        }
    }

    // Phase 4 — testing stage.
    let testing_stage_duration = resolved
        .testing_stage_duration
        .unwrap_or(SessionSpec::DEFAULT_TESTING_STAGE_DURATION);

    let final_spec = match catch_panic(|| step_controller.current_traffic_spec()) {
        Ok(Ok(spec)) => spec,
        Ok(Err(status)) | Err(status) => {
            return terminal(adjusting_stage_results, None, resolved, status);
        }
    };

    let reporting_period_start = clock.now();
    let testing_result = run_one_benchmark(
        dispatcher,
        &final_spec,
        testing_stage_duration,
        reporting_period_start,
        &resolved,
        &providers,
        registry,
    )
    .await;

    let testing_stage_result = match testing_result {
        Ok(result) => result,
        Err(status) => BenchmarkResult::failed(final_spec.requests_per_second, status),
    };

    info!(
        adjusting_iterations = adjusting_stage_results.len(),
        "adaptive load session converged"
    );

    SessionOutput {
        adjusting_stage_results,
        testing_stage_result: Some(testing_stage_result),
        resolved_spec: Some(resolved),
        status: Status::ok(),
    }
}

fn terminal(
    adjusting_stage_results: Vec<BenchmarkResult>,
    testing_stage_result: Option<BenchmarkResult>,
    resolved: SessionSpec,
    status: Status,
) -> SessionOutput {
    if status.code() != Code::Ok {
        warn!(status = %status, "adaptive load session terminated");
    }
    SessionOutput {
        adjusting_stage_results,
        testing_stage_result,
        resolved_spec: Some(resolved),
        status,
    }
}

/// A `BenchmarkResult` whose single evaluation forces the reference step
/// controller's aggregate score negative, fed to `update_and_recompute`
/// when the controller could not even produce a traffic spec (spec.md
/// §4.8 Phase 3).
fn synthetic_all_minus_result(status: Status) -> BenchmarkResult {
    BenchmarkResult {
        raw: RawBenchmarkOutput::empty(0),
        evaluations: vec![MetricEvaluation {
            metric_id: "synthetic/input-setter-failure".to_string(),
            metric_value: 0.0,
            weight: 1.0,
            threshold_score: -1.0,
        }],
        status,
    }
}

#[allow(clippy::too_many_arguments, reason = "internal helper threading every Phase 3/4 dependency through one RPC + evaluation step")]
async fn run_one_benchmark(
    dispatcher: Arc<dyn BenchmarkDispatcher>,
    traffic_spec: &adaptive_load_core::TrafficSpec,
    duration: std::time::Duration,
    reporting_period_start: chrono::DateTime<chrono::Utc>,
    resolved: &SessionSpec,
    providers: &HashMap<String, Box<dyn MetricsProvider>>,
    registry: &Registry,
) -> Result<BenchmarkResult, Status> {
    let spec = traffic_spec.clone();
    let dispatch_handle = {
        let dispatcher = dispatcher.clone();
        tokio::spawn(async move { dispatcher.run_benchmark(&spec, duration).await })
    };

    let raw = match dispatch_handle.await {
        Ok(Ok(raw)) => raw,
        Ok(Err(status)) => return Err(status),
        Err(join_error) if join_error.is_panic() => {
            return Err(Status::internal("benchmark dispatch panicked"));
        }
        Err(_) => return Err(Status::cancelled("benchmark dispatch was cancelled")),
    };

    let period = ReportingPeriod {
        start_wallclock: reporting_period_start,
        duration,
    };

    catch_panic(|| analyze_benchmark(&raw, resolved, providers, period, registry))
        .and_then(|inner| inner)
}

/// Invariant 1 (spec.md §3): every metric name must be supported by
/// exactly one loaded provider.
fn check_metric_names_supported(
    resolved: &SessionSpec,
    providers: &HashMap<String, Box<dyn MetricsProvider>>,
) -> Option<Status> {
    let builtin_names = adaptive_load_metrics::BuiltinMetrics::new(RawBenchmarkOutput::empty(0)).supported_names();
    let mut errors = Vec::new();
    for metric in &resolved.metrics {
        let plugin_name = metric
            .metrics_plugin_name
            .as_deref()
            .unwrap_or(SessionSpec::BUILTIN_PROVIDER_NAME);
        let supported = if plugin_name == SessionSpec::BUILTIN_PROVIDER_NAME {
            builtin_names.iter().any(|n| n == &metric.metric_name)
        } else {
            providers
                .get(plugin_name)
                .is_some_and(|provider| provider.supported_names().iter().any(|n| n == &metric.metric_name))
        };
        if !supported {
            errors.push(format!(
                "metric \"{}\" not implemented by plugin \"{plugin_name}\"",
                metric.metric_name
            ));
        }
    }
    if errors.is_empty() {
        None
    } else {
        Some(Status::join(errors, Code::InvalidArgument))
    }
}
