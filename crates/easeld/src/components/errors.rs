//! Error types for the component runtime.

use thiserror::Error;

/// Error returned by component hooks.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised while registering, wiring, or driving components.
#[derive(Debug, Error)]
pub enum ComponentError {
    /// No component of the requested type is registered.
    #[error("component {component} is not registered")]
    NotFound {
        /// Requested component.
        component: &'static str,
    },
    /// The same component type was registered twice.
    #[error("component {component} is registered more than once")]
    Duplicate {
        /// Repeated component.
        component: &'static str,
    },
    /// Declared dependencies form a cycle.
    #[error("component dependency cycle: {cycle}")]
    Cyclic {
        /// The cycle, rendered as `A -> B -> A`.
        cycle: String,
    },
    /// `initiate` failed.
    #[error("component {component} failed to initiate: {source}")]
    Initiate {
        /// Failing component.
        component: &'static str,
        /// Hook error.
        #[source]
        source: HookError,
    },
    /// `safety_check` failed.
    #[error("component {component} failed its safety check: {source}")]
    SafetyCheck {
        /// Failing component.
        component: &'static str,
        /// Hook error.
        #[source]
        source: HookError,
    },
    /// `unload` failed.
    #[error("component {component} failed to unload: {source}")]
    Unload {
        /// Failing component.
        component: &'static str,
        /// Hook error.
        #[source]
        source: HookError,
    },
}
