//! Dispatch operations
//!
//! Slot resolution is static: it runs against a class's published slot
//! list at the call's definition site, so an unknown method name fails
//! there, not as a lookup miss later. The actual call reads the slot from
//! the instance's own vtable reference, which is what makes overrides win
//! through any ancestor's typed access path.

use klaso_config::EvalConfig;
use tracing::trace;

use crate::error::{DefinitionError, ModelError, RuntimeError};
use crate::model::value::Value;
use crate::runtime::descriptor::ClassDescriptor;
use crate::runtime::eval;
use crate::runtime::instance::Instance;

/// Resolve a method name to its stable slot position
pub fn resolve_slot(class: &ClassDescriptor, method: &str) -> Result<usize, DefinitionError> {
    class
        .slot_named(method)
        .map(|info| info.slot)
        .ok_or_else(|| DefinitionError::NoSuchMethod {
            class: class.name().to_string(),
            method: method.to_string(),
        })
}

/// Resolve and call in one step, with `instance` as the implicit receiver
pub fn invoke(
    class: &ClassDescriptor,
    instance: &mut Instance,
    method: &str,
    args: &[Value],
) -> Result<Value, ModelError> {
    let info = class
        .slot_named(method)
        .ok_or_else(|| DefinitionError::NoSuchMethod {
            class: class.name().to_string(),
            method: method.to_string(),
        })?;
    if args.len() != info.params.len() {
        return Err(DefinitionError::ArityMismatch {
            method: method.to_string(),
            expected: info.params.len(),
            found: args.len(),
        }
        .into());
    }
    trace!(
        target: "klaso::dispatch",
        class = class.name(),
        method,
        slot = info.slot,
        "invoke"
    );
    call_slot(class, instance, info.slot, method, args, &class.config().eval)
}

/// An unapplied method handle: the slot position, not an implementation
///
/// Each call reads the slot from the supplied instance's vtable, so a
/// single handle dispatches correctly against any instance, including ad
/// hoc overridden ones, and a placeholder slot fails at call time, not
/// at extraction time.
#[derive(Debug, Clone)]
pub struct BoundSlot {
    class: String,
    method: String,
    slot: usize,
    arity: usize,
    eval: EvalConfig,
}

impl BoundSlot {
    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Call with an explicitly supplied receiver
    pub fn call(&self, instance: &mut Instance, args: &[Value]) -> Result<Value, ModelError> {
        if args.len() != self.arity {
            return Err(DefinitionError::ArityMismatch {
                method: self.method.clone(),
                expected: self.arity,
                found: args.len(),
            }
            .into());
        }
        if !instance.class().is_subclass_of(&self.class) {
            return Err(RuntimeError::TypeError(format!(
                "instance of `{}` is not a `{}`",
                instance.class().name(),
                self.class
            ))
            .into());
        }
        let callee = instance
            .vtable()
            .slot(self.slot)
            .cloned()
            .ok_or_else(|| RuntimeError::TypeError("dispatch slot out of range".to_string()))?;
        Ok(eval::run_method(&callee, instance, args, &self.eval)?)
    }
}

/// Same static resolution as `invoke`, but the implementation stays
/// unapplied until a receiver is supplied
pub fn bind(class: &ClassDescriptor, method: &str) -> Result<BoundSlot, DefinitionError> {
    let info = class
        .slot_named(method)
        .ok_or_else(|| DefinitionError::NoSuchMethod {
            class: class.name().to_string(),
            method: method.to_string(),
        })?;
    Ok(BoundSlot {
        class: class.name().to_string(),
        method: method.to_string(),
        slot: info.slot,
        arity: info.params.len(),
        eval: class.config().eval,
    })
}

fn call_slot(
    class: &ClassDescriptor,
    instance: &mut Instance,
    slot: usize,
    method: &str,
    args: &[Value],
    eval_config: &EvalConfig,
) -> Result<Value, ModelError> {
    if !instance.class().is_subclass_of(class.name()) {
        return Err(RuntimeError::TypeError(format!(
            "instance of `{}` is not a `{}`",
            instance.class().name(),
            class.name()
        ))
        .into());
    }
    let callee = instance
        .vtable()
        .slot(slot)
        .cloned()
        .ok_or_else(|| {
            RuntimeError::TypeError(format!("slot {slot} of `{method}` out of range"))
        })?;
    Ok(eval::run_method(&callee, instance, args, eval_config)?)
}
