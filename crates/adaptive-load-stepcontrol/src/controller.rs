//! `nighthawk.exponential_search`: the reference step controller, an
//! exponential-range-finding-then-binary-search state machine (spec.md
//! §4.4).

use adaptive_load_core::{BenchmarkResult, PluginSpec, Status, StatusResult, TrafficSpec};
use adaptive_load_registry::{InputVariableSetter, Registry, StepController, StepControllerFactory};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::setter::RequestsPerSecondSetter;

const DEFAULT_EXPONENTIAL_FACTOR: f64 = 2.0;
const CONVERGENCE_RELATIVE_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    RangeFinding,
    BinarySearch,
}

/// Config for `ExponentialBinarySearchController`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExponentialBinarySearchConfig {
    pub initial_value: f64,
    #[serde(default = "ExponentialBinarySearchConfig::default_exponential_factor")]
    pub exponential_factor: f64,
    #[serde(default)]
    pub input_variable_setter: Option<PluginSpec>,
}

impl ExponentialBinarySearchConfig {
    fn default_exponential_factor() -> f64 {
        DEFAULT_EXPONENTIAL_FACTOR
    }
}

pub struct ExponentialBinarySearchController {
    traffic_template: TrafficSpec,
    setter: Box<dyn InputVariableSetter>,
    exponential_factor: f64,
    phase: Phase,
    previous_value: f64,
    current_value: f64,
    bottom: f64,
    top: f64,
    doom_reason: String,
}

impl ExponentialBinarySearchController {
    fn new(
        traffic_template: TrafficSpec,
        setter: Box<dyn InputVariableSetter>,
        config: &ExponentialBinarySearchConfig,
    ) -> Self {
        let exponential_factor = if config.exponential_factor > 0.0 {
            config.exponential_factor
        } else {
            DEFAULT_EXPONENTIAL_FACTOR
        };
        Self {
            traffic_template,
            setter,
            exponential_factor,
            phase: Phase::RangeFinding,
            previous_value: f64::NAN,
            current_value: config.initial_value,
            bottom: f64::NAN,
            top: f64::NAN,
            doom_reason: String::new(),
        }
    }

    /// `+1.0` unless the benchmark itself failed or any counted metric
    /// evaluation scored negative (spec.md §4.4, §4.8's "score equivalent to
    /// failed" for a transport-level error). Informational metrics
    /// (`weight == 0`) never count.
    fn aggregate_score(result: &BenchmarkResult) -> f64 {
        if !result.status.is_ok() {
            return -1.0;
        }
        let any_failing = result
            .evaluations
            .iter()
            .any(|evaluation| evaluation.weight > 0.0 && evaluation.threshold_score < 0.0);
        if any_failing {
            -1.0
        } else {
            1.0
        }
    }
}

impl StepController for ExponentialBinarySearchController {
    fn current_traffic_spec(&self) -> StatusResult<TrafficSpec> {
        let mut spec = self.traffic_template.clone();
        self.setter.set(&mut spec, self.current_value)?;
        Ok(spec)
    }

    fn is_converged(&self) -> bool {
        if self.phase != Phase::BinarySearch || !self.doom_reason.is_empty() {
            return false;
        }
        (self.current_value / self.previous_value - 1.0).abs() < CONVERGENCE_RELATIVE_TOLERANCE
    }

    fn is_doomed(&self) -> Option<String> {
        if self.doom_reason.is_empty() {
            None
        } else {
            Some(self.doom_reason.clone())
        }
    }

    fn update_and_recompute(&mut self, result: &BenchmarkResult) {
        let score = Self::aggregate_score(result);
        match (self.phase, score > 0.0) {
            (Phase::RangeFinding, true) => {
                self.previous_value = self.current_value;
                self.current_value *= self.exponential_factor;
            }
            (Phase::RangeFinding, false) if self.previous_value.is_nan() => {
                self.doom_reason = "initial load already exceeds thresholds".to_string();
            }
            (Phase::RangeFinding, false) => {
                self.bottom = self.previous_value;
                self.top = self.current_value;
                self.previous_value = self.current_value;
                self.current_value = (self.bottom + self.top) / 2.0;
                self.phase = Phase::BinarySearch;
            }
            (Phase::BinarySearch, true) => {
                self.bottom = self.current_value;
                self.previous_value = self.current_value;
                self.current_value = (self.bottom + self.top) / 2.0;
            }
            (Phase::BinarySearch, false) => {
                self.top = self.current_value;
                self.previous_value = self.current_value;
                self.current_value = (self.bottom + self.top) / 2.0;
            }
        }
    }
}

#[derive(Default)]
pub struct ExponentialBinarySearchFactory;

impl StepControllerFactory for ExponentialBinarySearchFactory {
    fn empty_config(&self) -> Value {
        serde_json::to_value(ExponentialBinarySearchConfig {
            initial_value: 1.0,
            exponential_factor: DEFAULT_EXPONENTIAL_FACTOR,
            input_variable_setter: None,
        })
        .unwrap_or(Value::Null)
    }

    fn validate_config(&self, config: &Value) -> Status {
        match parse(config) {
            Ok(parsed) if parsed.initial_value <= 0.0 => {
                Status::invalid_argument("exponential_search: initial_value must be positive")
            }
            Ok(_) => Status::ok(),
            Err(message) => Status::invalid_argument(message),
        }
    }

    fn create(
        &self,
        config: &Value,
        traffic_template: &TrafficSpec,
        registry: &Registry,
    ) -> StatusResult<Box<dyn StepController>> {
        let parsed = parse(config).map_err(Status::invalid_argument)?;
        let setter: Box<dyn InputVariableSetter> = match &parsed.input_variable_setter {
            Some(setter_spec) => registry.load_input_variable_setter(setter_spec)?,
            None => Box::new(RequestsPerSecondSetter),
        };
        Ok(Box::new(ExponentialBinarySearchController::new(
            traffic_template.clone(),
            setter,
            &parsed,
        )))
    }
}

fn parse(config: &Value) -> Result<ExponentialBinarySearchConfig, String> {
    serde_json::from_value(config.clone()).map_err(|e| format!("exponential_search: {e}"))
}
