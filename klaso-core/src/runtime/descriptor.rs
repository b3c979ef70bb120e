//! Published class descriptors
//!
//! A `ClassDescriptor` is the immutable product of defining a class: the
//! full ordered field layout, the full ordered slot list, the shared
//! vtable, and the metadata the request carried. Descriptors are created
//! once at definition time and never mutated afterwards.

use std::collections::BTreeMap;
use std::sync::Arc;

use klaso_config::ModelConfig;

use crate::error::{DefinitionError, RuntimeError};
use crate::model::value::Value;
use crate::runtime::chunk::Chunk;
use crate::runtime::instance::Instance;
use crate::runtime::vtable::VTable;

/// One field of the full layout
#[derive(Debug, Clone)]
pub struct FieldInfo {
    pub name: String,
    /// Fixed position in the instance field vector; append-only down the
    /// hierarchy, never reassigned
    pub index: usize,
    pub mutable: bool,
    /// Class that declared the field
    pub defined_in: String,
    /// Compiled initializer, re-evaluated once per instantiation
    pub(crate) default: Chunk,
}

/// One slot of the full dispatch table
#[derive(Debug, Clone)]
pub struct SlotInfo {
    pub name: String,
    /// Fixed slot position; stable across the whole hierarchy
    pub slot: usize,
    pub params: Vec<String>,
    /// Class that first introduced the slot
    pub defined_in: String,
    /// Class whose implementation currently fills the slot
    pub implemented_in: String,
}

/// Immutable description of a published class
#[derive(Debug)]
pub struct ClassDescriptor {
    name: String,
    parent: Option<Arc<ClassDescriptor>>,
    /// Chain depth, root = 1
    depth: usize,
    fields: Vec<FieldInfo>,
    slots: Vec<SlotInfo>,
    vtable: Arc<VTable>,
    properties: BTreeMap<String, Value>,
    config: ModelConfig,
}

impl ClassDescriptor {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        name: String,
        parent: Option<Arc<ClassDescriptor>>,
        fields: Vec<FieldInfo>,
        slots: Vec<SlotInfo>,
        vtable: Arc<VTable>,
        properties: BTreeMap<String, Value>,
        config: ModelConfig,
    ) -> Self {
        let depth = parent.as_ref().map_or(1, |p| p.depth + 1);
        Self {
            name,
            parent,
            depth,
            fields,
            slots,
            vtable,
            properties,
            config,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&Arc<ClassDescriptor>> {
        self.parent.as_ref()
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Full ordered field layout (parent fields first)
    pub fn fields(&self) -> &[FieldInfo] {
        &self.fields
    }

    /// Full ordered slot list
    pub fn slots(&self) -> &[SlotInfo] {
        &self.slots
    }

    /// The shared vtable every plain `construct` binds to
    pub fn vtable(&self) -> &Arc<VTable> {
        &self.vtable
    }

    pub fn properties(&self) -> &BTreeMap<String, Value> {
        &self.properties
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn slot_named(&self, name: &str) -> Option<&SlotInfo> {
        self.slots.iter().find(|s| s.name == name)
    }

    /// Is `self` the named class or a descendant of it
    pub fn is_subclass_of(&self, ancestor: &str) -> bool {
        let mut current = Some(self);
        while let Some(class) = current {
            if class.name == ancestor {
                return true;
            }
            current = class.parent.as_deref();
        }
        false
    }

    /// Resolve a field accessor once; fails early on unknown names
    pub fn accessor(&self, field: &str) -> Result<FieldAccessor, DefinitionError> {
        let info = self.field(field).ok_or_else(|| DefinitionError::UnknownField {
            class: self.name.clone(),
            field: field.to_string(),
        })?;
        Ok(FieldAccessor {
            class: self.name.clone(),
            field: info.name.clone(),
            index: info.index,
        })
    }

    /// Resolve a field mutator once; immutable fields fail here, at handle
    /// creation, not at the eventual write
    pub fn mutator(&self, field: &str) -> Result<FieldMutator, DefinitionError> {
        let info = self.field(field).ok_or_else(|| DefinitionError::UnknownField {
            class: self.name.clone(),
            field: field.to_string(),
        })?;
        if !info.mutable {
            return Err(DefinitionError::ImmutableField {
                class: self.name.clone(),
                field: info.name.clone(),
            });
        }
        Ok(FieldMutator {
            class: self.name.clone(),
            field: info.name.clone(),
            index: info.index,
        })
    }
}

/// Pre-resolved read access to one field
///
/// Works unchanged on instances of any descendant class: the layout is
/// append-only, so the index is valid at every depth.
#[derive(Debug, Clone)]
pub struct FieldAccessor {
    class: String,
    field: String,
    index: usize,
}

impl FieldAccessor {
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn get(&self, instance: &Instance) -> Result<Value, RuntimeError> {
        if !instance.class().is_subclass_of(&self.class) {
            return Err(RuntimeError::TypeError(format!(
                "instance of `{}` is not a `{}`",
                instance.class().name(),
                self.class
            )));
        }
        Ok(instance
            .raw(self.index)
            .cloned()
            .unwrap_or(Value::Null))
    }
}

/// Pre-resolved write access to one mutable field
#[derive(Debug, Clone)]
pub struct FieldMutator {
    class: String,
    field: String,
    index: usize,
}

impl FieldMutator {
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn set(&self, instance: &mut Instance, value: Value) -> Result<(), RuntimeError> {
        if !instance.class().is_subclass_of(&self.class) {
            return Err(RuntimeError::TypeError(format!(
                "instance of `{}` is not a `{}`",
                instance.class().name(),
                self.class
            )));
        }
        instance.set_raw(self.index, value);
        Ok(())
    }
}
