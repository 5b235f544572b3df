//! A hand-written stand-in for the `tonic-prost-build`-generated client,
//! shaped exactly as that generator would emit it for a single
//! bidirectional-streaming RPC (`build.rs` cannot invoke `protoc` in this
//! environment).

use tonic::client::Grpc;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::codegen::*;
use tonic::{IntoStreamingRequest, Response, Status as TonicStatus};

use crate::wire::{BenchmarkRequest, BenchmarkResponse};

const RUN_BENCHMARK_PATH: &str = "/nighthawk.v1.LoadGeneratorService/RunBenchmark";

/// Client for `nighthawk.v1.LoadGeneratorService`.
#[derive(Debug, Clone)]
pub struct LoadGeneratorServiceClient<T> {
    inner: Grpc<T>,
}

impl LoadGeneratorServiceClient<tonic::transport::Channel> {
    pub fn new(channel: tonic::transport::Channel) -> Self {
        Self {
            inner: Grpc::new(channel),
        }
    }
}

impl<T> LoadGeneratorServiceClient<T>
where
    T: tonic::client::GrpcService<tonic::body::Body>,
    T::Error: Into<StdError>,
    T::ResponseBody: Body<Data = Bytes> + std::marker::Send + 'static,
    <T::ResponseBody as Body>::Error: Into<StdError> + std::marker::Send,
{
    /// Send a stream of requests and receive a stream of responses. Per
    /// spec.md §4.7 the caller sends exactly one request and reads exactly
    /// one response, but the RPC shape itself is bidi-streaming.
    pub async fn run_benchmark(
        &mut self,
        request: impl IntoStreamingRequest<Message = BenchmarkRequest>,
    ) -> Result<Response<tonic::Streaming<BenchmarkResponse>>, TonicStatus> {
        self.inner.ready().await.map_err(|e| {
            TonicStatus::unknown(format!("service was not ready: {e}"))
        })?;
        let codec = tonic_prost::ProstCodec::default();
        let path = PathAndQuery::from_static(RUN_BENCHMARK_PATH);
        self.inner
            .streaming(request.into_streaming_request(), path, codec)
            .await
    }
}
