//! Klaso API - Orchestration layer
//!
//! Provides the unified surface over the core, including:
//! - `ObjectModel`: registry plus the per-class operations in one place
//! - Module loading (JSON documents of normalized class requests)
//! - Unified error handling (`KlasoError`)
//!
//! For CLI convenience, this crate provides a global singleton model.
//! For library use, prefer an explicit `ObjectModel` value.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;
use tracing::info;

pub mod error;
pub mod module;

pub use error::KlasoError;
pub use module::ModuleDoc;

// Re-export the core vocabulary
pub use klaso_core::{
    bind, construct, construct_with_overrides, invoke, resolve_slot, BinaryOp, BoundSlot,
    ClassDescriptor, ClassRegistry, ClassRequest, DefinitionError, Expr, FieldAccessor, FieldDecl,
    FieldMutator, Instance, MethodDecl, ModelError, OverrideDecl, RuntimeError, UnaryOp, Value,
    Visibility,
};
pub use klaso_config::{EvalConfig, LimitConfig, ModelConfig};

/// Registry plus the per-class operations, under one unified error type
#[derive(Debug, Default)]
pub struct ObjectModel {
    registry: ClassRegistry,
}

impl ObjectModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ModelConfig) -> Self {
        Self {
            registry: ClassRegistry::with_config(config),
        }
    }

    pub fn registry(&self) -> &ClassRegistry {
        &self.registry
    }

    /// Define and publish one class
    pub fn define(&mut self, request: ClassRequest) -> Result<Arc<ClassDescriptor>, KlasoError> {
        Ok(self.registry.define(request)?)
    }

    /// Define every class of a parsed module, in document order
    pub fn load_module(&mut self, doc: ModuleDoc) -> Result<Vec<Arc<ClassDescriptor>>, KlasoError> {
        let mut published = Vec::with_capacity(doc.classes.len());
        for request in doc.classes {
            published.push(self.registry.define(request)?);
        }
        info!(
            target: "klaso::api",
            module = doc.name.as_deref().unwrap_or("<unnamed>"),
            classes = published.len(),
            "module loaded"
        );
        Ok(published)
    }

    /// Parse and define a module from JSON text
    pub fn load_module_str(&mut self, json: &str) -> Result<Vec<Arc<ClassDescriptor>>, KlasoError> {
        self.load_module(ModuleDoc::parse(json)?)
    }

    /// Read, parse, and define a module file
    pub fn load_module_file<P: AsRef<Path>>(
        &mut self,
        path: P,
    ) -> Result<Vec<Arc<ClassDescriptor>>, KlasoError> {
        let json = std::fs::read_to_string(path)?;
        self.load_module_str(&json)
    }

    pub fn class(&self, name: &str) -> Result<Arc<ClassDescriptor>, KlasoError> {
        Ok(self.registry.expect(name)?)
    }

    pub fn construct(
        &self,
        class: &str,
        inits: &BTreeMap<String, Value>,
    ) -> Result<Instance, KlasoError> {
        let class = self.registry.expect(class)?;
        Ok(construct(&class, inits)?)
    }

    pub fn construct_with_overrides(
        &self,
        class: &str,
        inits: &BTreeMap<String, Value>,
        overrides: &[OverrideDecl],
    ) -> Result<Instance, KlasoError> {
        let class = self.registry.expect(class)?;
        Ok(construct_with_overrides(&class, inits, overrides)?)
    }

    pub fn invoke(
        &self,
        class: &str,
        instance: &mut Instance,
        method: &str,
        args: &[Value],
    ) -> Result<Value, KlasoError> {
        let class = self.registry.expect(class)?;
        Ok(invoke(&class, instance, method, args)?)
    }

    pub fn bind(&self, class: &str, method: &str) -> Result<BoundSlot, KlasoError> {
        let class = self.registry.expect(class)?;
        Ok(bind(&class, method)?)
    }

    /// Is `instance` of the named class or a descendant of it
    pub fn is_instance(&self, class: &str, instance: &Instance) -> Result<bool, KlasoError> {
        let class = self.registry.expect(class)?;
        Ok(instance.is_instance_of(&class))
    }
}

// ==================== Global singleton (CLI convenience) ====================

static GLOBAL: Lazy<RwLock<ObjectModel>> = Lazy::new(|| RwLock::new(ObjectModel::new()));

/// Access the process-wide model
///
/// Definition is expected during single-threaded initialization; after
/// that the lock is only ever taken for reads. Library users should hold
/// their own `ObjectModel` instead.
pub fn with_global<R>(f: impl FnOnce(&mut ObjectModel) -> R) -> R {
    let mut model = GLOBAL.write().unwrap_or_else(|poisoned| poisoned.into_inner());
    f(&mut model)
}
