//! Hand-written wire message types standing in for the generated protobuf
//! bindings of the benchmark-dispatch RPC; `build.rs` does not invoke
//! `protoc` in this environment, so these are written by hand against the
//! same field shapes `tonic-prost-build` would generate.
//!
//! The wire schema itself is opaque to this controller (spec.md §1); these
//! types only carry the fields the built-in metrics extractor and the
//! transport layer need, plus an opaque JSON blob for everything else a
//! `TrafficSpec` might carry.

/// One request message on the `RunBenchmark` stream: the traffic spec to
/// run.
#[derive(Clone, PartialEq, prost::Message)]
pub struct BenchmarkRequest {
    #[prost(message, optional, tag = "1")]
    pub traffic_spec: Option<WireTrafficSpec>,
}

/// The single response message a well-behaved server sends before closing.
#[derive(Clone, PartialEq, prost::Message)]
pub struct BenchmarkResponse {
    #[prost(message, optional, tag = "1")]
    pub traffic_spec: Option<WireTrafficSpec>,
    #[prost(double, tag = "2")]
    pub actual_duration_seconds: f64,
    #[prost(uint64, tag = "3")]
    pub upstream_rq_total: u64,
    #[prost(uint64, tag = "4")]
    pub response_count_2xx: u64,
    #[prost(message, optional, tag = "5")]
    pub request_to_response: Option<WireLatencyStatistic>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct WireTrafficSpec {
    #[prost(uint32, tag = "1")]
    pub requests_per_second: u32,
    #[prost(uint64, tag = "2")]
    pub duration_millis: u64,
    #[prost(bool, tag = "3")]
    pub open_loop: bool,
    /// JSON-encoded `TrafficSpec::extra`, opaque to this controller.
    #[prost(string, tag = "4")]
    pub extra_json: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct WireLatencyStatistic {
    #[prost(double, tag = "1")]
    pub min_ns: f64,
    #[prost(double, tag = "2")]
    pub mean_ns: f64,
    #[prost(double, tag = "3")]
    pub max_ns: f64,
    #[prost(double, tag = "4")]
    pub pstdev_ns: f64,
}

impl From<&adaptive_load_core::TrafficSpec> for WireTrafficSpec {
    fn from(spec: &adaptive_load_core::TrafficSpec) -> Self {
        Self {
            requests_per_second: spec.requests_per_second,
            duration_millis: spec.duration.map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX)).unwrap_or(0),
            open_loop: spec.open_loop.unwrap_or(false),
            extra_json: serde_json::to_string(&spec.extra).unwrap_or_default(),
        }
    }
}

impl From<WireLatencyStatistic> for adaptive_load_core::LatencyStatistic {
    fn from(wire: WireLatencyStatistic) -> Self {
        Self {
            min_ns: wire.min_ns,
            mean_ns: wire.mean_ns,
            max_ns: wire.max_ns,
            pstdev_ns: wire.pstdev_ns,
        }
    }
}

impl BenchmarkResponse {
    /// Convert a wire response into the controller's own `RawBenchmarkOutput`,
    /// using `sent` (the spec this response is presumed to answer) when the
    /// response omits its own echo.
    pub fn into_raw_output(self, sent: &adaptive_load_core::TrafficSpec) -> adaptive_load_core::RawBenchmarkOutput {
        adaptive_load_core::RawBenchmarkOutput {
            traffic_spec: sent.clone(),
            actual_duration_seconds: self.actual_duration_seconds,
            upstream_rq_total: self.upstream_rq_total,
            response_count_2xx: self.response_count_2xx,
            request_to_response: self.request_to_response.map(Into::into).unwrap_or_default(),
            transport_status: adaptive_load_core::Status::ok(),
        }
    }
}
