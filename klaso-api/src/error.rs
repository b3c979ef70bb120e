//! API error type
//!
//! Unifies the core's definition/runtime errors with the IO and parsing
//! failures module loading can hit.

use thiserror::Error;

pub use klaso_core::{DefinitionError, ModelError, RuntimeError};

/// Klaso error type
#[derive(Error, Debug)]
pub enum KlasoError {
    /// Definition-time failure (unknown base class, bad override, ...)
    #[error("{0}")]
    Definition(#[from] DefinitionError),

    /// Failure while a compiled method body ran
    #[error("{0}")]
    Runtime(#[from] RuntimeError),

    /// Module document was not valid JSON for the normalized request form
    #[error("module parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Reading a module file failed
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ModelError> for KlasoError {
    fn from(error: ModelError) -> Self {
        match error {
            ModelError::Definition(e) => KlasoError::Definition(e),
            ModelError::Runtime(e) => KlasoError::Runtime(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_error_flattens_into_its_layer() {
        let definition: ModelError = DefinitionError::UnknownClass("ghost".into()).into();
        assert!(matches!(
            KlasoError::from(definition),
            KlasoError::Definition(_)
        ));

        let runtime: ModelError = RuntimeError::DivisionByZero.into();
        assert!(matches!(KlasoError::from(runtime), KlasoError::Runtime(_)));
    }
}
