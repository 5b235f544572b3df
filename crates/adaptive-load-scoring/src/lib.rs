//! Reference scoring function plugins (spec.md §4.3): `binary` and
//! `linear`, registered under the `nighthawk.*` namespace.

pub mod binary;
pub mod linear;

pub use binary::{BinaryScoring, BinaryScoringConfig, BinaryScoringFactory};
pub use linear::{LinearScoring, LinearScoringConfig, LinearScoringFactory};

/// The name `BinaryScoringFactory` is registered under.
pub const BINARY_SCORING_NAME: &str = "nighthawk.binary_scoring";
/// The name `LinearScoringFactory` is registered under.
pub const LINEAR_SCORING_NAME: &str = "nighthawk.linear_scoring";

/// Register both reference scoring functions into `registry`.
pub fn register_all(registry: &mut adaptive_load_registry::Registry) {
    registry.register_scoring_function(BINARY_SCORING_NAME, Box::new(BinaryScoringFactory));
    registry.register_scoring_function(LINEAR_SCORING_NAME, Box::new(LinearScoringFactory));
}
