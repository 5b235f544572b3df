//! `nighthawk.linear_scoring`: scores a value on a gradient around a
//! threshold (spec.md §4.3).

use adaptive_load_core::{Status, StatusResult};
use adaptive_load_registry::{ScoringFunction, ScoringFunctionFactory};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Config for `LinearScoring`: `evaluate(value) = clamp(k * (threshold -
/// value), -1, 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearScoringConfig {
    pub threshold: f64,
    pub scaling_constant: f64,
}

pub struct LinearScoring {
    config: LinearScoringConfig,
}

impl LinearScoring {
    pub fn new(config: LinearScoringConfig) -> Self {
        Self { config }
    }
}

impl ScoringFunction for LinearScoring {
    fn evaluate(&self, value: f64) -> f64 {
        let raw = self.config.scaling_constant * (self.config.threshold - value);
        raw.clamp(-1.0, 1.0)
    }
}

#[derive(Default)]
pub struct LinearScoringFactory;

impl ScoringFunctionFactory for LinearScoringFactory {
    fn empty_config(&self) -> Value {
        serde_json::to_value(LinearScoringConfig {
            threshold: 0.0,
            scaling_constant: 1.0,
        })
        .unwrap_or(Value::Null)
    }

    fn validate_config(&self, config: &Value) -> Status {
        match parse(config) {
            Ok(parsed) if parsed.scaling_constant == 0.0 => {
                Status::invalid_argument("linear_scoring: scaling_constant must be non-zero")
            }
            Ok(_) => Status::ok(),
            Err(message) => Status::invalid_argument(message),
        }
    }

    fn create(&self, config: &Value) -> StatusResult<Box<dyn ScoringFunction>> {
        let parsed = parse(config).map_err(Status::invalid_argument)?;
        Ok(Box::new(LinearScoring::new(parsed)))
    }
}

fn parse(config: &Value) -> Result<LinearScoringConfig, String> {
    serde_json::from_value(config.clone()).map_err(|e| format!("linear_scoring: {e}"))
}
