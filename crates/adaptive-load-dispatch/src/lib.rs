//! The benchmark dispatch client (spec.md §4.7): runs one benchmark
//! against an external load generator over a bidirectional-streaming RPC.

mod generated_client;
pub mod wire;

pub mod dispatcher;

pub use dispatcher::{BenchmarkDispatcher, TonicBenchmarkDispatchClient};
#[cfg(any(test, feature = "test-util"))]
pub use dispatcher::FakeDispatcher;
