//! The reference step controller and input variable setter (spec.md §4.4,
//! §4.5), registered under the `nighthawk.*` namespace.

pub mod controller;
pub mod setter;

pub use controller::{ExponentialBinarySearchConfig, ExponentialBinarySearchController, ExponentialBinarySearchFactory};
pub use setter::{RequestsPerSecondSetter, RequestsPerSecondSetterFactory};

/// The name `ExponentialBinarySearchFactory` is registered under.
pub const EXPONENTIAL_SEARCH_NAME: &str = "nighthawk.exponential_search";
/// The name `RequestsPerSecondSetterFactory` is registered under.
pub const RPS_SETTER_NAME: &str = "nighthawk.rps_setter";

/// Register both reference plugins into `registry`.
pub fn register_all(registry: &mut adaptive_load_registry::Registry) {
    registry.register_step_controller(EXPONENTIAL_SEARCH_NAME, Box::new(ExponentialBinarySearchFactory));
    registry.register_input_variable_setter(RPS_SETTER_NAME, Box::new(RequestsPerSecondSetterFactory));
}
