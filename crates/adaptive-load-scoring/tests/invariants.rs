//! Property-based checks of the scoring domain invariant (spec.md §8,
//! universal invariant 6): every scoring function's output stays within
//! `[-1, +1]` for any finite configuration and input.

use adaptive_load_scoring::{BinaryScoring, BinaryScoringConfig, LinearScoring, LinearScoringConfig};
use adaptive_load_registry::ScoringFunction;
use proptest::prelude::*;

proptest! {
    #[test]
    fn binary_scoring_is_always_in_unit_range(
        lower in -1.0e6f64..1.0e6,
        upper in -1.0e6f64..1.0e6,
        value in -1.0e6f64..1.0e6,
    ) {
        let scoring = BinaryScoring::new(BinaryScoringConfig {
            lower_threshold: lower,
            upper_threshold: upper,
        });
        let score = scoring.evaluate(value);
        prop_assert!((-1.0..=1.0).contains(&score));
    }

    #[test]
    fn linear_scoring_is_always_in_unit_range(
        threshold in -1.0e6f64..1.0e6,
        scaling_constant in -100.0f64..100.0,
        value in -1.0e6f64..1.0e6,
    ) {
        prop_assume!(scaling_constant != 0.0);
        let scoring = LinearScoring::new(LinearScoringConfig { threshold, scaling_constant });
        let score = scoring.evaluate(value);
        prop_assert!((-1.0..=1.0).contains(&score));
    }

    #[test]
    fn linear_scoring_is_exactly_zero_at_threshold(
        threshold in -1.0e6f64..1.0e6,
        scaling_constant in -100.0f64..100.0,
    ) {
        prop_assume!(scaling_constant != 0.0);
        let scoring = LinearScoring::new(LinearScoringConfig { threshold, scaling_constant });
        prop_assert_eq!(scoring.evaluate(threshold), 0.0);
    }
}
