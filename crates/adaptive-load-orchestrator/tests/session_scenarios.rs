//! End-to-end session scenarios (spec.md §8 S1-S6) plus the universal
//! invariants that apply to every `SessionOutput`.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    reason = "test assertions favor unwrap/indexing over verbose matches on known-length fixtures"
)]

use std::sync::Arc;
use std::time::Duration;

use adaptive_load_core::{
    Code, LatencyStatistic, MetricSpec, PluginSpec, RawBenchmarkOutput, SessionSpec, Status,
    StatusResult, ThresholdSpec, TrafficSpec,
};
use adaptive_load_dispatch::{BenchmarkDispatcher, FakeDispatcher};
use adaptive_load_orchestrator::{run_adaptive_load_session, Clock, FakeClock, SystemClock};
use adaptive_load_registry::Registry;
use adaptive_load_scoring::BINARY_SCORING_NAME;
use adaptive_load_stepcontrol::EXPONENTIAL_SEARCH_NAME;
use tokio_util::sync::CancellationToken;

fn registry() -> Registry {
    let mut registry = Registry::new();
    adaptive_load_scoring::register_all(&mut registry);
    adaptive_load_stepcontrol::register_all(&mut registry);
    registry
}

fn session_with(initial_value: f64, lower_threshold: f64) -> SessionSpec {
    SessionSpec {
        traffic_template: TrafficSpec::with_requests_per_second(0),
        step_controller: PluginSpec {
            plugin_name: EXPONENTIAL_SEARCH_NAME.to_string(),
            config: serde_json::json!({ "initial_value": initial_value, "exponential_factor": 2.0 }),
        },
        metrics_providers: Vec::new(),
        metrics: vec![MetricSpec {
            metric_name: "success-rate".to_string(),
            metrics_plugin_name: None,
            threshold: Some(ThresholdSpec {
                weight: None,
                scoring_function: PluginSpec {
                    plugin_name: BINARY_SCORING_NAME.to_string(),
                    config: serde_json::json!({ "lower_threshold": lower_threshold }),
                },
            }),
        }],
        measuring_period: Some(Duration::from_millis(1)),
        convergence_deadline: Some(Duration::from_secs(60)),
        testing_stage_duration: Some(Duration::from_millis(1)),
        benchmark_cooldown: Some(Duration::ZERO),
    }
}

fn output_for(requests_per_second: u32, success_rate: f64) -> RawBenchmarkOutput {
    let total = 1_000u64;
    let successes = (total as f64 * success_rate).round() as u64;
    RawBenchmarkOutput {
        traffic_spec: TrafficSpec::with_requests_per_second(requests_per_second),
        actual_duration_seconds: 1.0,
        upstream_rq_total: total,
        response_count_2xx: successes,
        request_to_response: LatencyStatistic::default(),
        transport_status: Status::ok(),
    }
}

fn assert_evaluations_are_well_formed(output: &adaptive_load_core::SessionOutput) {
    for result in output
        .adjusting_stage_results
        .iter()
        .chain(output.testing_stage_result.iter())
    {
        for evaluation in &result.evaluations {
            assert!(evaluation.weight >= 0.0, "weight must be non-negative");
            assert!(
                (-1.0..=1.0).contains(&evaluation.threshold_score),
                "threshold_score {} out of [-1, 1]",
                evaluation.threshold_score
            );
        }
    }
}

/// S1 (happy convergence): success-rate 1.0 for RPS <= 400, 0.5 above it.
/// Should converge in binary search to a value near 400-404 with status OK.
#[tokio::test]
async fn s1_happy_convergence() {
    let session = session_with(100.0, 0.9);
    let registry = registry();
    let dispatcher: Arc<dyn BenchmarkDispatcher> = Arc::new(FakeDispatcher::new(|spec| {
        let success_rate = if spec.requests_per_second <= 400 { 1.0 } else { 0.5 };
        Ok(output_for(spec.requests_per_second, success_rate))
    }));
    let clock = SystemClock;

    let output = run_adaptive_load_session(
        session,
        &registry,
        dispatcher,
        &clock,
        CancellationToken::new(),
    )
    .await;

    assert_eq!(output.status.code(), Code::Ok, "status: {}", output.status);
    assert!(!output.adjusting_stage_results.is_empty());
    let testing = output
        .testing_stage_result
        .as_ref()
        .expect("testing stage must run on OK status");
    let converged_rps = testing.raw.traffic_spec.requests_per_second;
    assert!(
        (350..=450).contains(&converged_rps),
        "converged at unexpected rps: {converged_rps}"
    );
    assert_evaluations_are_well_formed(&output);
}

/// S2 (immediate doom): the very first benchmark already fails, with no
/// success baseline to fall back to.
#[tokio::test]
async fn s2_immediate_doom() {
    let session = session_with(100.0, 0.9);
    let registry = registry();
    let dispatcher: Arc<dyn BenchmarkDispatcher> =
        Arc::new(FakeDispatcher::new(|spec| Ok(output_for(spec.requests_per_second, 0.5))));
    let clock = SystemClock;

    let output = run_adaptive_load_session(
        session,
        &registry,
        dispatcher,
        &clock,
        CancellationToken::new(),
    )
    .await;

    assert_eq!(output.status.code(), Code::FailedPrecondition);
    assert!(output.status.message().contains("initial load"));
    assert_eq!(output.adjusting_stage_results.len(), 1);
    assert!(output.testing_stage_result.is_none());
}

/// S3 (deadline timeout): a step controller that always succeeds never
/// leaves range-finding, so it never converges; the session must terminate
/// on its convergence deadline instead.
#[tokio::test]
async fn s3_deadline_timeout() {
    let mut session = session_with(100.0, 0.0);
    session.measuring_period = Some(Duration::from_secs(1));
    session.convergence_deadline = Some(Duration::from_secs(5));
    let registry = registry();

    let clock = Arc::new(FakeClock::new(chrono::Utc::now()));
    let responder_clock = clock.clone();
    let dispatcher: Arc<dyn BenchmarkDispatcher> = Arc::new(FakeDispatcher::new(move |spec| {
        responder_clock.advance(chrono::Duration::seconds(1));
        Ok(output_for(spec.requests_per_second, 1.0))
    }));

    let output = run_adaptive_load_session(
        session,
        &registry,
        dispatcher,
        clock.as_ref() as &dyn Clock,
        CancellationToken::new(),
    )
    .await;

    assert_eq!(output.status.code(), Code::DeadlineExceeded);
    assert!(output.status.message().contains("deadline"));
    assert!(output.testing_stage_result.is_none());
    assert!(!output.adjusting_stage_results.is_empty());
}

/// S4 (generator transport error): the first benchmark fails at the
/// transport layer; the reference controller treats that as a failed score
/// and, with no prior success, becomes doomed immediately.
#[tokio::test]
async fn s4_generator_transport_error() {
    let session = session_with(100.0, 0.9);
    let registry = registry();
    let dispatcher: Arc<dyn BenchmarkDispatcher> =
        Arc::new(FakeDispatcher::new(|_spec| Err(Status::unavailable("load generator unreachable"))));
    let clock = SystemClock;

    let output = run_adaptive_load_session(
        session,
        &registry,
        dispatcher,
        &clock,
        CancellationToken::new(),
    )
    .await;

    assert_eq!(output.status.code(), Code::FailedPrecondition);
    assert_eq!(output.adjusting_stage_results.len(), 1);
    assert_eq!(
        output.adjusting_stage_results[0].status.code(),
        Code::Unavailable
    );
    assert!(output.testing_stage_result.is_none());
}

/// S5 (spec validation): a preset `duration` on the traffic template is
/// rejected before any plugin is instantiated.
#[tokio::test]
async fn s5_spec_validation_rejects_preset_duration() {
    let mut session = session_with(100.0, 0.9);
    session.traffic_template.duration = Some(Duration::from_secs(1));
    let registry = registry();
    let dispatcher: Arc<dyn BenchmarkDispatcher> =
        Arc::new(FakeDispatcher::new(|spec| Ok(output_for(spec.requests_per_second, 1.0))));
    let clock = SystemClock;

    let output = run_adaptive_load_session(
        session,
        &registry,
        dispatcher,
        &clock,
        CancellationToken::new(),
    )
    .await;

    assert_eq!(output.status.code(), Code::InvalidArgument);
    assert!(output.status.message().contains("should not have duration set"));
    assert!(output.adjusting_stage_results.is_empty());
    assert!(output.resolved_spec.is_none());
}

/// S6 (unknown metric name): a metric name the built-in provider does not
/// support is rejected after instantiation, before any benchmark runs.
#[tokio::test]
async fn s6_unknown_metric_name_is_rejected() {
    let mut session = session_with(100.0, 0.9);
    session.metrics.push(MetricSpec {
        metric_name: "does-not-exist".to_string(),
        metrics_plugin_name: None,
        threshold: None,
    });
    let registry = registry();
    let dispatcher: Arc<dyn BenchmarkDispatcher> =
        Arc::new(FakeDispatcher::new(|spec| Ok(output_for(spec.requests_per_second, 1.0))));
    let clock = SystemClock;

    let output = run_adaptive_load_session(
        session,
        &registry,
        dispatcher,
        &clock,
        CancellationToken::new(),
    )
    .await;

    assert_eq!(output.status.code(), Code::InvalidArgument);
    assert!(output.status.message().contains("not implemented by plugin"));
    assert!(output.adjusting_stage_results.is_empty());
}

/// Invariant 2: cancellation observed before the first benchmark still
/// records zero adjusting-stage results, with a `Cancelled` status.
#[tokio::test]
async fn cancellation_before_first_benchmark_yields_zero_results() {
    let session = session_with(100.0, 0.9);
    let registry = registry();
    let dispatcher: Arc<dyn BenchmarkDispatcher> =
        Arc::new(FakeDispatcher::new(|spec| Ok(output_for(spec.requests_per_second, 1.0))));
    let clock = SystemClock;
    let cancellation = CancellationToken::new();
    cancellation.cancel();

    let output = run_adaptive_load_session(session, &registry, dispatcher, &clock, cancellation).await;

    assert_eq!(output.status.code(), Code::Cancelled);
    assert!(output.adjusting_stage_results.is_empty());
    assert!(output.testing_stage_result.is_none());
}

/// Sanity check for the `FakeDispatcher` responder helper used above: it
/// round-trips the requested rate and honors the success-rate parameter
/// before any session logic gets involved.
#[tokio::test]
async fn fake_dispatcher_helper_reports_requested_rate() {
    let dispatcher = FakeDispatcher::new(|spec: &TrafficSpec| -> StatusResult<RawBenchmarkOutput> {
        Ok(output_for(spec.requests_per_second, 0.75))
    });
    let spec = TrafficSpec::with_requests_per_second(77);
    let raw = dispatcher.run_benchmark(&spec, Duration::from_secs(1)).await.unwrap();
    assert_eq!(raw.traffic_spec.requests_per_second, 77);
    assert_eq!(raw.response_count_2xx, 750);
}
