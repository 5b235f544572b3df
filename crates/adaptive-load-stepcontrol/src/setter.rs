//! `nighthawk.rps_setter`: the reference input variable setter, targeting
//! `TrafficSpec::requests_per_second` (spec.md §4.5).

use adaptive_load_core::{Status, StatusResult, TrafficSpec};
use adaptive_load_registry::{InputVariableSetter, InputVariableSetterFactory};
use serde_json::Value;

/// Valid range for the underlying `u32` field, expressed the way the
/// caller supplies recommendations: as `f64`.
const MIN_RPS: f64 = 0.0;
const MAX_RPS: f64 = u32::MAX as f64;

#[derive(Default)]
pub struct RequestsPerSecondSetter;

impl InputVariableSetter for RequestsPerSecondSetter {
    fn set(&self, spec: &mut TrafficSpec, value: f64) -> StatusResult<()> {
        if !(MIN_RPS..=MAX_RPS).contains(&value) || value.is_nan() {
            return Err(Status::invalid_argument(format!(
                "rps_setter: value {value} out of range [0, {MAX_RPS}]"
            )));
        }
        #[allow(
            clippy::cast_possible_truncation,
            reason = "value was range-checked against u32::MAX above"
        )]
        #[allow(
            clippy::cast_sign_loss,
            reason = "value was range-checked against 0.0 above"
        )]
        let rounded = value.round() as u32;
        spec.requests_per_second = rounded;
        Ok(())
    }
}

#[derive(Default)]
pub struct RequestsPerSecondSetterFactory;

impl InputVariableSetterFactory for RequestsPerSecondSetterFactory {
    fn validate_config(&self, _config: &Value) -> Status {
        Status::ok()
    }

    fn create(&self, _config: &Value) -> StatusResult<Box<dyn InputVariableSetter>> {
        Ok(Box::new(RequestsPerSecondSetter))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, reason = "test assertions favor unwrap over verbose matches")]
mod tests {
    use super::*;

    #[test]
    fn sets_field_within_range() {
        let setter = RequestsPerSecondSetter;
        let mut spec = TrafficSpec::with_requests_per_second(0);
        setter.set(&mut spec, 500.0).unwrap();
        assert_eq!(spec.requests_per_second, 500);
    }

    #[test]
    fn rejects_negative_value_without_mutating() {
        let setter = RequestsPerSecondSetter;
        let mut spec = TrafficSpec::with_requests_per_second(42);
        let err = setter.set(&mut spec, -1.0).unwrap_err();
        assert!(!err.is_ok());
        assert_eq!(spec.requests_per_second, 42);
    }

    #[test]
    fn rejects_value_beyond_u32_max() {
        let setter = RequestsPerSecondSetter;
        let mut spec = TrafficSpec::with_requests_per_second(42);
        let err = setter.set(&mut spec, f64::from(u32::MAX) + 2.0).unwrap_err();
        assert!(!err.is_ok());
        assert_eq!(spec.requests_per_second, 42);
    }

    #[test]
    fn rejects_nan() {
        let setter = RequestsPerSecondSetter;
        let mut spec = TrafficSpec::with_requests_per_second(42);
        assert!(setter.set(&mut spec, f64::NAN).is_err());
    }

    #[test]
    fn rounds_fractional_value() {
        let setter = RequestsPerSecondSetter;
        let mut spec = TrafficSpec::with_requests_per_second(0);
        setter.set(&mut spec, 100.6).unwrap();
        assert_eq!(spec.requests_per_second, 101);
    }
}
