//! Error types for the object-model core
//!
//! Two layers: `DefinitionError` covers everything detectable at class
//! definition, construction, handle creation, or dispatch-site resolution;
//! `RuntimeError` covers failures while a compiled method body executes.
//! `ModelError` wraps both for operations that resolve and then run.

use thiserror::Error;

/// Failures detected synchronously at definition/resolution points
///
/// Every variant is raised at the earliest point the condition is knowable,
/// never as a deferred lookup miss inside unrelated code.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DefinitionError {
    /// Parent class not yet published
    #[error("unknown base class `{0}`")]
    UnknownBaseClass(String),

    /// Class name not present in the registry
    #[error("unknown class `{0}`")]
    UnknownClass(String),

    /// Invocation, binding, or override of a name with no public slot
    #[error("no such method `{method}` on class `{class}`")]
    NoSuchMethod { class: String, method: String },

    /// Write to a field declared without a mutator
    #[error("field `{field}` of class `{class}` is immutable")]
    ImmutableField { class: String, field: String },

    /// Field name absent from the whole inheritance chain
    #[error("unknown field `{field}` on class `{class}`")]
    UnknownField { class: String, field: String },

    /// Method body references a parameter the method does not declare
    #[error("unknown parameter `{param}` in method `{method}`")]
    UnknownParameter { method: String, param: String },

    /// Republishing a class name (publication is irreversible)
    #[error("class `{0}` is already published")]
    DuplicateClass(String),

    /// Field name already present in the class or an ancestor
    #[error("duplicate field `{field}` in class `{class}`")]
    DuplicateField { class: String, field: String },

    /// Method name declared twice in one request
    #[error("duplicate method `{method}` in class `{class}`")]
    DuplicateMethod { class: String, method: String },

    /// Call or override with the wrong number of arguments
    #[error("method `{method}` expects {expected} argument(s), got {found}")]
    ArityMismatch {
        method: String,
        expected: usize,
        found: usize,
    },

    /// Field initializer referencing instance state, parameters, or methods
    #[error("initializer of field `{field}` may not reference instance state")]
    InvalidInitializer { field: String },

    /// Definition-time limit from `LimitConfig` exceeded
    #[error("class `{class}` exceeds limit: {what}")]
    LimitExceeded { class: String, what: String },
}

/// Failures while executing a compiled method body
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("type error: {0}")]
    TypeError(String),

    #[error("division by zero")]
    DivisionByZero,

    /// Nested dispatch exceeded `EvalConfig::max_call_depth`
    #[error("call depth limit exceeded")]
    CallDepthExceeded,

    /// A placeholder slot (method declared without a body) was called
    #[error("method `{method}` of class `{class}` is not implemented")]
    NotImplemented { class: String, method: String },
}

/// Unified error for operations that both resolve and execute
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error(transparent)]
    Definition(#[from] DefinitionError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl ModelError {
    /// The definition-side error, if this is one
    pub fn as_definition(&self) -> Option<&DefinitionError> {
        match self {
            ModelError::Definition(e) => Some(e),
            ModelError::Runtime(_) => None,
        }
    }
}
