//! Instances and the construction paths
//!
//! An instance is its governing vtable reference plus the field values in
//! fixed layout order. `construct` binds the class's shared vtable;
//! `construct_with_overrides` builds a private clone first, freshly
//! allocated on every call.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::trace;

use crate::compiler::codegen::{self, MethodContext};
use crate::error::{DefinitionError, ModelError};
use crate::model::decl::OverrideDecl;
use crate::model::value::Value;
use crate::runtime::descriptor::ClassDescriptor;
use crate::runtime::eval;
use crate::runtime::vtable::{CompiledMethod, PrivateTable, VTable};

/// One constructed object
#[derive(Debug, Clone)]
pub struct Instance {
    class: Arc<ClassDescriptor>,
    vtable: Arc<VTable>,
    fields: Vec<Value>,
}

impl Instance {
    pub fn class(&self) -> &Arc<ClassDescriptor> {
        &self.class
    }

    /// The governing vtable: the class's shared one, or a private ad hoc
    /// clone
    pub fn vtable(&self) -> &Arc<VTable> {
        &self.vtable
    }

    /// Is this an instance of `class` or a descendant of it
    pub fn is_instance_of(&self, class: &ClassDescriptor) -> bool {
        self.class.is_subclass_of(class.name())
    }

    /// Whether construction attached an ad hoc vtable
    pub fn has_adhoc_vtable(&self) -> bool {
        !Arc::ptr_eq(&self.vtable, self.class.vtable())
    }

    /// Read a field by name
    pub fn get(&self, field: &str) -> Result<Value, DefinitionError> {
        let info = self
            .class
            .field(field)
            .ok_or_else(|| DefinitionError::UnknownField {
                class: self.class.name().to_string(),
                field: field.to_string(),
            })?;
        Ok(self.fields.get(info.index).cloned().unwrap_or(Value::Null))
    }

    /// Write a field by name; immutable fields always fail, never silently
    /// succeed
    pub fn set(&mut self, field: &str, value: Value) -> Result<(), DefinitionError> {
        let info = self
            .class
            .field(field)
            .ok_or_else(|| DefinitionError::UnknownField {
                class: self.class.name().to_string(),
                field: field.to_string(),
            })?;
        if !info.mutable {
            return Err(DefinitionError::ImmutableField {
                class: self.class.name().to_string(),
                field: field.to_string(),
            });
        }
        self.fields[info.index] = value;
        Ok(())
    }

    pub fn field_values(&self) -> &[Value] {
        &self.fields
    }

    pub(crate) fn raw(&self, index: usize) -> Option<&Value> {
        self.fields.get(index)
    }

    pub(crate) fn set_raw(&mut self, index: usize, value: Value) {
        debug_assert!(
            index < self.fields.len(),
            "field index {index} out of layout range for `{}`",
            self.class.name()
        );
        if index < self.fields.len() {
            self.fields[index] = value;
        }
    }
}

impl std::fmt::Display for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {{", self.class.name())?;
        for (i, info) in self.class.fields().iter().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(f, "{sep}{}: {}", info.name, self.fields[info.index])?;
        }
        write!(f, " }}")
    }
}

/// Evaluate the field vector for a construction call
///
/// Caller-supplied values win; every other field evaluates its own
/// initializer, independently of all sibling fields.
fn init_fields(
    class: &ClassDescriptor,
    inits: &BTreeMap<String, Value>,
) -> Result<Vec<Value>, ModelError> {
    for name in inits.keys() {
        if class.field(name).is_none() {
            return Err(DefinitionError::UnknownField {
                class: class.name().to_string(),
                field: name.clone(),
            }
            .into());
        }
    }
    let mut fields = Vec::with_capacity(class.fields().len());
    for info in class.fields() {
        let value = match inits.get(&info.name) {
            Some(value) => value.clone(),
            None => eval::run_initializer(&info.default, &class.config().eval)?,
        };
        fields.push(value);
    }
    Ok(fields)
}

/// Construct an instance bound to the class's shared vtable
pub fn construct(
    class: &Arc<ClassDescriptor>,
    inits: &BTreeMap<String, Value>,
) -> Result<Instance, ModelError> {
    let fields = init_fields(class, inits)?;
    trace!(target: "klaso::instance", class = class.name(), "construct");
    Ok(Instance {
        class: Arc::clone(class),
        vtable: Arc::clone(class.vtable()),
        fields,
    })
}

/// Construct an instance with a private ad hoc vtable
///
/// The ad hoc table is built before the instance is allocated and is a
/// fresh allocation on every call; identical override sets are never
/// memoized. Override bodies see the class's fields and public slots but
/// not its private methods.
pub fn construct_with_overrides(
    class: &Arc<ClassDescriptor>,
    inits: &BTreeMap<String, Value>,
    overrides: &[OverrideDecl],
) -> Result<Instance, ModelError> {
    let vtable = build_adhoc_vtable(class, overrides)?;
    let fields = init_fields(class, inits)?;
    trace!(
        target: "klaso::instance",
        class = class.name(),
        overrides = overrides.len(),
        "construct with ad hoc vtable"
    );
    Ok(Instance {
        class: Arc::clone(class),
        vtable: Arc::new(vtable),
        fields,
    })
}

/// Clone the class vtable and replace the named slots
///
/// Every override name must already be a valid public slot of `class`,
/// failing exactly like a class-level override would at definition time.
fn build_adhoc_vtable(
    class: &ClassDescriptor,
    overrides: &[OverrideDecl],
) -> Result<VTable, DefinitionError> {
    let ctx = MethodContext {
        class_name: class.name(),
        fields: class.fields(),
        slots: class.slots(),
        privates: &[],
    };
    let mut slots = class.vtable().cloned_slots();
    let mut seen: Vec<&str> = Vec::new();
    for decl in overrides {
        if seen.contains(&decl.name.as_str()) {
            return Err(DefinitionError::DuplicateMethod {
                class: class.name().to_string(),
                method: decl.name.clone(),
            });
        }
        seen.push(&decl.name);

        let info = class
            .slot_named(&decl.name)
            .ok_or_else(|| DefinitionError::NoSuchMethod {
                class: class.name().to_string(),
                method: decl.name.clone(),
            })?;
        if decl.params.len() != info.params.len() {
            return Err(DefinitionError::ArityMismatch {
                method: decl.name.clone(),
                expected: info.params.len(),
                found: decl.params.len(),
            });
        }

        let chunk = codegen::compile_method(&ctx, &decl.name, &decl.params, &decl.body)?;
        slots[info.slot] = Arc::new(CompiledMethod::new(
            decl.name.clone(),
            class.name().to_string(),
            decl.params.clone(),
            chunk,
            PrivateTable::new(),
        ));
    }
    Ok(VTable::new(class.name().to_string(), slots))
}
