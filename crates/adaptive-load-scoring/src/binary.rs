//! `nighthawk.binary_scoring`: scores a value either fully acceptable or
//! fully unacceptable, with no gradient between (spec.md §4.3).

use adaptive_load_core::{Status, StatusResult};
use adaptive_load_registry::{ScoringFunction, ScoringFunctionFactory};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Config for `BinaryScoring`: acceptable if `value >= lower_threshold OR
/// value <= upper_threshold`. Typically only one side is configured; the
/// other defaults to a value its clause can never satisfy, so it drops out
/// of the OR.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinaryScoringConfig {
    #[serde(default = "BinaryScoringConfig::default_lower")]
    pub lower_threshold: f64,
    #[serde(default = "BinaryScoringConfig::default_upper")]
    pub upper_threshold: f64,
}

impl BinaryScoringConfig {
    fn default_lower() -> f64 {
        f64::INFINITY
    }

    fn default_upper() -> f64 {
        f64::NEG_INFINITY
    }
}

impl Default for BinaryScoringConfig {
    fn default() -> Self {
        Self {
            lower_threshold: Self::default_lower(),
            upper_threshold: Self::default_upper(),
        }
    }
}

pub struct BinaryScoring {
    config: BinaryScoringConfig,
}

impl BinaryScoring {
    pub fn new(config: BinaryScoringConfig) -> Self {
        Self { config }
    }
}

impl ScoringFunction for BinaryScoring {
    fn evaluate(&self, value: f64) -> f64 {
        if value >= self.config.lower_threshold || value <= self.config.upper_threshold {
            1.0
        } else {
            -1.0
        }
    }
}

#[derive(Default)]
pub struct BinaryScoringFactory;

impl ScoringFunctionFactory for BinaryScoringFactory {
    fn empty_config(&self) -> Value {
        serde_json::to_value(BinaryScoringConfig::default()).unwrap_or(Value::Null)
    }

    fn validate_config(&self, config: &Value) -> Status {
        match parse(config) {
            Ok(_) => Status::ok(),
            Err(message) => Status::invalid_argument(message),
        }
    }

    fn create(&self, config: &Value) -> StatusResult<Box<dyn ScoringFunction>> {
        let parsed = parse(config).map_err(Status::invalid_argument)?;
        Ok(Box::new(BinaryScoring::new(parsed)))
    }
}

fn parse(config: &Value) -> Result<BinaryScoringConfig, String> {
    serde_json::from_value(config.clone()).map_err(|e| format!("binary_scoring: {e}"))
}
