//! The `BenchmarkDispatcher` abstraction and its production implementation
//! over the generated (here: hand-written) gRPC client (spec.md §4.7).

use std::time::Duration;

use adaptive_load_core::{RawBenchmarkOutput, Status, StatusResult, TrafficSpec};
use async_trait::async_trait;
use tokio_stream::once;
use tonic::transport::Channel;
use tracing::{debug, warn};

use crate::generated_client::LoadGeneratorServiceClient;
use crate::wire::{BenchmarkRequest, WireTrafficSpec};

/// Grace period added on top of the requested duration before the client
/// gives up waiting for a response, per spec.md §4.7 ("≥ duration + 30s").
const GRACE_PERIOD: Duration = Duration::from_secs(30);

/// Runs exactly one benchmark against an external load generator.
#[async_trait]
pub trait BenchmarkDispatcher: Send + Sync {
    async fn run_benchmark(
        &self,
        traffic_spec: &TrafficSpec,
        duration: Duration,
    ) -> StatusResult<RawBenchmarkOutput>;
}

/// Production dispatcher speaking the `nighthawk.v1.LoadGeneratorService`
/// bidi-streaming RPC over a tonic channel.
pub struct TonicBenchmarkDispatchClient {
    channel: Channel,
}

impl TonicBenchmarkDispatchClient {
    pub fn new(channel: Channel) -> Self {
        Self { channel }
    }
}

#[async_trait]
impl BenchmarkDispatcher for TonicBenchmarkDispatchClient {
    async fn run_benchmark(
        &self,
        traffic_spec: &TrafficSpec,
        duration: Duration,
    ) -> StatusResult<RawBenchmarkOutput> {
        let mut sent = traffic_spec.clone();
        sent.duration = Some(duration);
        sent.open_loop = Some(true);

        let request = BenchmarkRequest {
            traffic_spec: Some(WireTrafficSpec::from(&sent)),
        };

        let mut client = LoadGeneratorServiceClient::new(self.channel.clone());
        let call_budget = duration + GRACE_PERIOD;

        let call = async {
            let mut stream = client
                .run_benchmark(once(request))
                .await
                .map_err(status_from_tonic)?
                .into_inner();

            match stream.message().await {
                Ok(Some(response)) => {
                    if stream.message().await.is_ok_and(|m| m.is_some()) {
                        warn!("load generator sent more than one response; ignoring extras");
                    }
                    Ok(response.into_raw_output(&sent))
                }
                Ok(None) => Err(Status::unknown("load generator did not send a response")),
                Err(status) => Err(status_from_tonic(status)),
            }
        };

        match tokio::time::timeout(call_budget, call).await {
            Ok(result) => result,
            Err(_) => Err(Status::deadline_exceeded(format!(
                "benchmark exceeded {call_budget:?} without completing"
            ))),
        }
    }
}

fn status_from_tonic(status: tonic::Status) -> Status {
    use tonic::Code;
    let code = match status.code() {
        Code::Ok => adaptive_load_core::Code::Ok,
        Code::InvalidArgument => adaptive_load_core::Code::InvalidArgument,
        Code::NotFound => adaptive_load_core::Code::NotFound,
        Code::DeadlineExceeded => adaptive_load_core::Code::DeadlineExceeded,
        Code::FailedPrecondition => adaptive_load_core::Code::FailedPrecondition,
        Code::Cancelled => adaptive_load_core::Code::Cancelled,
        Code::Unavailable => adaptive_load_core::Code::Unavailable,
        _ => adaptive_load_core::Code::Unknown,
    };
    debug!(grpc_code = ?status.code(), "dispatch RPC returned non-OK status");
    Status::new(code, status.message().to_string())
}

/// An in-memory dispatcher used by orchestrator tests, avoiding a real
/// network stack.
#[cfg(any(test, feature = "test-util"))]
pub struct FakeDispatcher {
    responder: Box<dyn Fn(&TrafficSpec) -> StatusResult<RawBenchmarkOutput> + Send + Sync>,
}

#[cfg(any(test, feature = "test-util"))]
impl FakeDispatcher {
    pub fn new(
        responder: impl Fn(&TrafficSpec) -> StatusResult<RawBenchmarkOutput> + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
        }
    }
}

#[cfg(any(test, feature = "test-util"))]
#[async_trait]
impl BenchmarkDispatcher for FakeDispatcher {
    async fn run_benchmark(
        &self,
        traffic_spec: &TrafficSpec,
        _duration: Duration,
    ) -> StatusResult<RawBenchmarkOutput> {
        (self.responder)(traffic_spec)
    }
}
