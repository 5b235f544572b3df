//! Factory traits: one per plugin kind, each producing that kind's plugin
//! trait object from an opaque config blob (spec.md §4.1).
//!
//! A separate trait per kind — rather than one type-erased factory trait
//! keyed by a `PluginKind` enum — means a factory registered under
//! `register_step_controller` can only ever produce a `Box<dyn
//! StepController>`: the "factory returns the wrong plugin kind" hazard
//! spec.md calls "a programming error detected at registration time" is
//! eliminated at compile time rather than caught at registration.

use adaptive_load_core::{Status, StatusResult, TrafficSpec};
use serde_json::Value;

use crate::registry::Registry;
use crate::traits::{InputVariableSetter, MetricsProvider, ScoringFunction, StepController};

/// Produces `MetricsProvider` instances.
pub trait MetricsProviderFactory: Send + Sync {
    /// A default-initialized config record for this factory's plugin.
    fn empty_config(&self) -> Value {
        Value::Object(serde_json::Map::new())
    }

    /// Validate an opaque config blob. Any unpacking failure must be
    /// surfaced here as `Status::invalid_argument`, never a panic.
    fn validate_config(&self, config: &Value) -> Status;

    /// Construct the instance. Only called after `validate_config` returns
    /// `Status::ok()`.
    fn create(&self, config: &Value) -> StatusResult<Box<dyn MetricsProvider>>;
}

/// Produces `ScoringFunction` instances.
pub trait ScoringFunctionFactory: Send + Sync {
    /// A default-initialized config record for this factory's plugin.
    fn empty_config(&self) -> Value {
        Value::Object(serde_json::Map::new())
    }

    /// Validate an opaque config blob.
    fn validate_config(&self, config: &Value) -> Status;

    /// Construct the instance.
    fn create(&self, config: &Value) -> StatusResult<Box<dyn ScoringFunction>>;
}

/// Produces `StepController` instances. `create` additionally takes the
/// session's traffic-spec template, the one plugin kind whose construction
/// needs extra context (spec.md §4.1), and the registry itself, so a step
/// controller config naming a nested input-variable-setter plugin can
/// resolve it without every other factory kind needing registry access.
pub trait StepControllerFactory: Send + Sync {
    /// A default-initialized config record for this factory's plugin.
    fn empty_config(&self) -> Value {
        Value::Object(serde_json::Map::new())
    }

    /// Validate an opaque config blob.
    fn validate_config(&self, config: &Value) -> Status;

    /// Construct the instance against the session's traffic template.
    fn create(
        &self,
        config: &Value,
        traffic_template: &TrafficSpec,
        registry: &Registry,
    ) -> StatusResult<Box<dyn StepController>>;
}

/// Produces `InputVariableSetter` instances.
pub trait InputVariableSetterFactory: Send + Sync {
    /// A default-initialized config record for this factory's plugin.
    fn empty_config(&self) -> Value {
        Value::Object(serde_json::Map::new())
    }

    /// Validate an opaque config blob.
    fn validate_config(&self, config: &Value) -> Status;

    /// Construct the instance.
    fn create(&self, config: &Value) -> StatusResult<Box<dyn InputVariableSetter>>;
}
