//! Class registry
//!
//! The process-wide store of published classes. Written during a
//! single-threaded initialization phase and read-only afterwards;
//! descriptors are never mutated or removed once published, and a name
//! cannot be republished.

use std::collections::HashMap;
use std::sync::Arc;

use klaso_config::ModelConfig;
use tracing::debug;

use crate::compiler::{resolve, vtable};
use crate::error::DefinitionError;
use crate::model::decl::ClassRequest;
use crate::runtime::descriptor::ClassDescriptor;

/// Registry of published class descriptors, keyed by class name
#[derive(Debug, Default)]
pub struct ClassRegistry {
    config: ModelConfig,
    classes: HashMap<String, Arc<ClassDescriptor>>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ModelConfig) -> Self {
        Self {
            config,
            classes: HashMap::new(),
        }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Run the full definition pipeline and publish the class
    ///
    /// Resolution and compilation happen on a private value (the Building
    /// state); the single, irreversible transition to Published is the
    /// registry insert at the end. A failing request publishes nothing.
    pub fn define(&mut self, request: ClassRequest) -> Result<Arc<ClassDescriptor>, DefinitionError> {
        if self.classes.contains_key(&request.name) {
            return Err(DefinitionError::DuplicateClass(request.name));
        }
        let parent = match &request.parent {
            Some(name) => Some(
                self.classes
                    .get(name)
                    .cloned()
                    .ok_or_else(|| DefinitionError::UnknownBaseClass(name.clone()))?,
            ),
            None => None,
        };

        let resolved = resolve::resolve(&request, parent, &self.config)?;
        let table = vtable::build(&resolved)?;

        debug!(
            target: "klaso::registry",
            class = resolved.name,
            fields = resolved.fields.len(),
            slots = resolved.slots.len(),
            parent = resolved.parent.as_ref().map(|p| p.name()).unwrap_or("-"),
            "published class"
        );

        let descriptor = Arc::new(ClassDescriptor::new(
            resolved.name.clone(),
            resolved.parent,
            resolved.fields,
            resolved.slots,
            table,
            request.properties,
            self.config,
        ));
        self.classes
            .insert(descriptor.name().to_string(), Arc::clone(&descriptor));
        Ok(descriptor)
    }

    pub fn get(&self, name: &str) -> Option<Arc<ClassDescriptor>> {
        self.classes.get(name).cloned()
    }

    /// Lookup that fails with `UnknownClass`
    pub fn expect(&self, name: &str) -> Result<Arc<ClassDescriptor>, DefinitionError> {
        self.get(name)
            .ok_or_else(|| DefinitionError::UnknownClass(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::expr::Expr;

    #[test]
    fn test_define_and_lookup() {
        let mut registry = ClassRegistry::new();
        let shape = registry
            .define(ClassRequest::new("shape").field("size", Expr::int(1), true))
            .unwrap();
        assert_eq!(shape.name(), "shape");
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("shape"));
        assert!(Arc::ptr_eq(&registry.get("shape").unwrap(), &shape));
    }

    #[test]
    fn test_unknown_base_class_rejected() {
        let mut registry = ClassRegistry::new();
        let err = registry
            .define(ClassRequest::new("square").with_parent("shape"))
            .unwrap_err();
        assert_eq!(err, DefinitionError::UnknownBaseClass("shape".into()));
    }

    #[test]
    fn test_republish_rejected() {
        let mut registry = ClassRegistry::new();
        registry.define(ClassRequest::new("shape")).unwrap();
        let err = registry.define(ClassRequest::new("shape")).unwrap_err();
        assert_eq!(err, DefinitionError::DuplicateClass("shape".into()));
    }

    #[test]
    fn test_failed_request_publishes_nothing() {
        let mut registry = ClassRegistry::new();
        let err = registry
            .define(
                ClassRequest::new("shape")
                    .field("size", Expr::int(1), false)
                    .method("grow", &[], Expr::assign("size", Expr::int(2))),
            )
            .unwrap_err();
        assert!(matches!(err, DefinitionError::ImmutableField { .. }));
        assert!(!registry.contains("shape"));
    }

    #[test]
    fn test_expect_reports_unknown_class() {
        let registry = ClassRegistry::new();
        assert_eq!(
            registry.expect("ghost").unwrap_err(),
            DefinitionError::UnknownClass("ghost".into())
        );
    }
}
