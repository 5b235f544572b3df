//! Plugin ABI and factory registry for the adaptive load controller.
//!
//! Defines the four plugin traits (`traits`), the per-kind factory traits
//! that construct them from opaque config (`factory`), and the `Registry`
//! that ties plugin names to factories (`registry`).

pub mod factory;
pub mod registry;
pub mod traits;

pub use factory::{
    InputVariableSetterFactory, MetricsProviderFactory, ScoringFunctionFactory,
    StepControllerFactory,
};
pub use registry::Registry;
pub use traits::{InputVariableSetter, MetricsProvider, ScoringFunction, StepController};
