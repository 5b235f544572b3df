//! The process-wide plugin registry: name -> factory, per kind
//! (spec.md §4.1, §6).

use std::collections::HashMap;

use adaptive_load_core::{PluginSpec, Status, StatusResult, TrafficSpec};

use crate::factory::{
    InputVariableSetterFactory, MetricsProviderFactory, ScoringFunctionFactory,
    StepControllerFactory,
};
use crate::traits::{InputVariableSetter, MetricsProvider, ScoringFunction, StepController};

/// Holds one factory map per plugin kind and resolves `PluginSpec`s against
/// them.
#[derive(Default)]
pub struct Registry {
    metrics_providers: HashMap<String, Box<dyn MetricsProviderFactory>>,
    scoring_functions: HashMap<String, Box<dyn ScoringFunctionFactory>>,
    step_controllers: HashMap<String, Box<dyn StepControllerFactory>>,
    input_variable_setters: HashMap<String, Box<dyn InputVariableSetterFactory>>,
}

impl Registry {
    /// An empty registry with nothing registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a metrics-provider factory under `name`.
    pub fn register_metrics_provider(
        &mut self,
        name: impl Into<String>,
        factory: Box<dyn MetricsProviderFactory>,
    ) {
        self.metrics_providers.insert(name.into(), factory);
    }

    /// Register a scoring-function factory under `name`.
    pub fn register_scoring_function(
        &mut self,
        name: impl Into<String>,
        factory: Box<dyn ScoringFunctionFactory>,
    ) {
        self.scoring_functions.insert(name.into(), factory);
    }

    /// Register a step-controller factory under `name`.
    pub fn register_step_controller(
        &mut self,
        name: impl Into<String>,
        factory: Box<dyn StepControllerFactory>,
    ) {
        self.step_controllers.insert(name.into(), factory);
    }

    /// Register an input-variable-setter factory under `name`.
    pub fn register_input_variable_setter(
        &mut self,
        name: impl Into<String>,
        factory: Box<dyn InputVariableSetterFactory>,
    ) {
        self.input_variable_setters.insert(name.into(), factory);
    }

    /// Validate a `PluginSpec` against a metrics-provider factory without
    /// constructing it, used during the orchestrator's Phase 1 validation
    /// pass (spec.md §4.8).
    pub fn validate_metrics_provider(&self, spec: &PluginSpec) -> Status {
        self.validate(&self.metrics_providers, spec)
    }

    /// Validate a `PluginSpec` against a scoring-function factory.
    pub fn validate_scoring_function(&self, spec: &PluginSpec) -> Status {
        self.validate(&self.scoring_functions, spec)
    }

    /// Validate a `PluginSpec` against a step-controller factory.
    pub fn validate_step_controller(&self, spec: &PluginSpec) -> Status {
        self.validate(&self.step_controllers, spec)
    }

    /// Validate a `PluginSpec` against an input-variable-setter factory.
    pub fn validate_input_variable_setter(&self, spec: &PluginSpec) -> Status {
        self.validate(&self.input_variable_setters, spec)
    }

    fn validate<F>(&self, factories: &HashMap<String, F>, spec: &PluginSpec) -> Status
    where
        F: ConfigValidator,
    {
        match factories.get(&spec.plugin_name) {
            Some(factory) => factory.validate_config(&spec.config),
            None => Status::invalid_argument(format!(
                "plugin not found: {}",
                spec.plugin_name
            )),
        }
    }

    /// Look up, validate, and construct a metrics provider.
    pub fn load_metrics_provider(
        &self,
        spec: &PluginSpec,
    ) -> StatusResult<Box<dyn MetricsProvider>> {
        let factory = self.lookup(&self.metrics_providers, &spec.plugin_name)?;
        let validation = factory.validate_config(&spec.config);
        if !validation.is_ok() {
            return Err(validation);
        }
        factory.create(&spec.config)
    }

    /// Look up, validate, and construct a scoring function.
    pub fn load_scoring_function(
        &self,
        spec: &PluginSpec,
    ) -> StatusResult<Box<dyn ScoringFunction>> {
        let factory = self.lookup(&self.scoring_functions, &spec.plugin_name)?;
        let validation = factory.validate_config(&spec.config);
        if !validation.is_ok() {
            return Err(validation);
        }
        factory.create(&spec.config)
    }

    /// Look up, validate, and construct a step controller against the
    /// session's traffic template.
    pub fn load_step_controller(
        &self,
        spec: &PluginSpec,
        traffic_template: &TrafficSpec,
    ) -> StatusResult<Box<dyn StepController>> {
        let factory = self.lookup(&self.step_controllers, &spec.plugin_name)?;
        let validation = factory.validate_config(&spec.config);
        if !validation.is_ok() {
            return Err(validation);
        }
        factory.create(&spec.config, traffic_template, self)
    }

    /// Look up, validate, and construct an input variable setter.
    pub fn load_input_variable_setter(
        &self,
        spec: &PluginSpec,
    ) -> StatusResult<Box<dyn InputVariableSetter>> {
        let factory = self.lookup(&self.input_variable_setters, &spec.plugin_name)?;
        let validation = factory.validate_config(&spec.config);
        if !validation.is_ok() {
            return Err(validation);
        }
        factory.create(&spec.config)
    }

    fn lookup<'a, F>(
        &'a self,
        factories: &'a HashMap<String, F>,
        plugin_name: &str,
    ) -> StatusResult<&'a F> {
        factories
            .get(plugin_name)
            .ok_or_else(|| Status::invalid_argument(format!("plugin not found: {plugin_name}")))
    }
}

/// Common surface every per-kind factory trait shares, so `validate` can be
/// generic over the factory map.
trait ConfigValidator {
    fn validate_config(&self, config: &serde_json::Value) -> Status;
}

impl ConfigValidator for Box<dyn MetricsProviderFactory> {
    fn validate_config(&self, config: &serde_json::Value) -> Status {
        MetricsProviderFactory::validate_config(self.as_ref(), config)
    }
}

impl ConfigValidator for Box<dyn ScoringFunctionFactory> {
    fn validate_config(&self, config: &serde_json::Value) -> Status {
        ScoringFunctionFactory::validate_config(self.as_ref(), config)
    }
}

impl ConfigValidator for Box<dyn StepControllerFactory> {
    fn validate_config(&self, config: &serde_json::Value) -> Status {
        StepControllerFactory::validate_config(self.as_ref(), config)
    }
}

impl ConfigValidator for Box<dyn InputVariableSetterFactory> {
    fn validate_config(&self, config: &serde_json::Value) -> Status {
        InputVariableSetterFactory::validate_config(self.as_ref(), config)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, reason = "test assertions favor unwrap over verbose matches")]
mod tests {
    use super::*;
    use adaptive_load_core::ReportingPeriod;
    use serde_json::json;

    struct AlwaysOkMetricsFactory;
    struct AlwaysOkMetrics;
    impl MetricsProvider for AlwaysOkMetrics {
        fn supported_names(&self) -> Vec<String> {
            vec!["x".to_string()]
        }
        fn get_metric_value(&self, _name: &str, _period: ReportingPeriod) -> StatusResult<f64> {
            Ok(1.0)
        }
    }
    impl MetricsProviderFactory for AlwaysOkMetricsFactory {
        fn validate_config(&self, _config: &serde_json::Value) -> Status {
            Status::ok()
        }
        fn create(&self, _config: &serde_json::Value) -> StatusResult<Box<dyn MetricsProvider>> {
            Ok(Box::new(AlwaysOkMetrics))
        }
    }

    struct RejectingFactory;
    impl MetricsProviderFactory for RejectingFactory {
        fn validate_config(&self, _config: &serde_json::Value) -> Status {
            Status::invalid_argument("bad config")
        }
        fn create(&self, _config: &serde_json::Value) -> StatusResult<Box<dyn MetricsProvider>> {
            Err(Status::invalid_argument("bad config"))
        }
    }

    #[test]
    fn missing_factory_is_invalid_argument_plugin_not_found() {
        let registry = Registry::new();
        let spec = PluginSpec::named("does.not.exist");
        let err = registry.load_metrics_provider(&spec).unwrap_err();
        assert_eq!(err.code(), adaptive_load_core::Code::InvalidArgument);
        assert!(err.message().contains("plugin not found"));
    }

    #[test]
    fn registered_factory_constructs_successfully() {
        let mut registry = Registry::new();
        registry.register_metrics_provider("ok", Box::new(AlwaysOkMetricsFactory));
        let spec = PluginSpec::named("ok");
        let provider = registry.load_metrics_provider(&spec).unwrap();
        assert_eq!(provider.supported_names(), vec!["x".to_string()]);
    }

    #[test]
    fn validation_failure_short_circuits_before_create() {
        let mut registry = Registry::new();
        registry.register_metrics_provider("bad", Box::new(RejectingFactory));
        let spec = PluginSpec {
            plugin_name: "bad".to_string(),
            config: json!({}),
        };
        let err = registry.load_metrics_provider(&spec).unwrap_err();
        assert_eq!(err.code(), adaptive_load_core::Code::InvalidArgument);
        assert_eq!(err.message(), "bad config");
    }

    #[test]
    fn validate_metrics_provider_reports_missing_plugin_without_constructing() {
        let registry = Registry::new();
        let spec = PluginSpec::named("missing");
        let status = registry.validate_metrics_provider(&spec);
        assert_eq!(status.code(), adaptive_load_core::Code::InvalidArgument);
    }
}
