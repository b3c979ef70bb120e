//! Layout resolution
//!
//! Walks the ancestor chain and computes the class's full ordered field
//! list and full ordered slot list. Field layout is strictly append-only
//! down the hierarchy; slot positions never move once assigned, no matter
//! how many descendants override them.

use std::sync::Arc;

use klaso_config::ModelConfig;

use crate::compiler::codegen;
use crate::error::DefinitionError;
use crate::model::decl::{ClassRequest, MethodDecl, OverrideDecl, Visibility};
use crate::runtime::descriptor::{ClassDescriptor, FieldInfo, SlotInfo};

/// A class after layout resolution, before vtable compilation
///
/// This is the "Building" state of the descriptor lifecycle: fully
/// resolved, not yet visible to `construct` or `invoke`.
#[derive(Debug)]
pub struct ResolvedClass {
    pub name: String,
    pub parent: Option<Arc<ClassDescriptor>>,
    /// Full layout: parent fields followed by own fields, defaults compiled
    pub fields: Vec<FieldInfo>,
    /// Full slot list with overrides applied in place
    pub slots: Vec<SlotInfo>,
    /// Own public methods introducing fresh slots, paired with slot index
    pub new_methods: Vec<(usize, MethodDecl)>,
    /// Overrides of inherited slots, paired with slot index
    pub overridden: Vec<(usize, OverrideDecl)>,
    /// Own private methods in declaration order
    pub privates: Vec<MethodDecl>,
}

/// Resolve one class request against its (already published) parent
pub fn resolve(
    request: &ClassRequest,
    parent: Option<Arc<ClassDescriptor>>,
    config: &ModelConfig,
) -> Result<ResolvedClass, DefinitionError> {
    let name = &request.name;

    if let Some(parent) = &parent {
        if parent.depth() + 1 > config.limits.max_depth {
            return Err(DefinitionError::LimitExceeded {
                class: name.clone(),
                what: format!("inheritance depth exceeds {}", config.limits.max_depth),
            });
        }
    }

    let fields = resolve_fields(request, parent.as_deref(), config)?;
    let (slots, new_methods, overridden, privates) =
        resolve_methods(request, parent.as_deref(), config)?;

    Ok(ResolvedClass {
        name: name.clone(),
        parent,
        fields,
        slots,
        new_methods,
        overridden,
        privates,
    })
}

/// Field list = parent's fields ++ own fields, in declaration order
///
/// Re-declaring a field name present anywhere in the chain is rejected:
/// shadowing would break parent-typed accessors, last-wins would silently
/// change parent behavior.
fn resolve_fields(
    request: &ClassRequest,
    parent: Option<&ClassDescriptor>,
    config: &ModelConfig,
) -> Result<Vec<FieldInfo>, DefinitionError> {
    let mut fields: Vec<FieldInfo> = parent.map(|p| p.fields().to_vec()).unwrap_or_default();

    for decl in &request.fields {
        if fields.iter().any(|f| f.name == decl.name) {
            return Err(DefinitionError::DuplicateField {
                class: request.name.clone(),
                field: decl.name.clone(),
            });
        }
        let default = match &decl.default {
            Some(expr) => codegen::compile_initializer(&request.name, &decl.name, expr)?,
            None => {
                codegen::compile_initializer(
                    &request.name,
                    &decl.name,
                    &crate::model::expr::Expr::Literal(crate::model::value::Value::Null),
                )?
            }
        };
        fields.push(FieldInfo {
            name: decl.name.clone(),
            index: fields.len(),
            mutable: decl.mutable,
            defined_in: request.name.clone(),
            default,
        });
    }

    if fields.len() > config.limits.max_fields {
        return Err(DefinitionError::LimitExceeded {
            class: request.name.clone(),
            what: format!("field count exceeds {}", config.limits.max_fields),
        });
    }
    Ok(fields)
}

type ResolvedMethods = (
    Vec<SlotInfo>,
    Vec<(usize, MethodDecl)>,
    Vec<(usize, OverrideDecl)>,
    Vec<MethodDecl>,
);

/// Slot list = parent's slots with overridden entries replaced in place,
/// then newly introduced public methods appended with fresh slots
fn resolve_methods(
    request: &ClassRequest,
    parent: Option<&ClassDescriptor>,
    config: &ModelConfig,
) -> Result<ResolvedMethods, DefinitionError> {
    let class = &request.name;
    let mut slots: Vec<SlotInfo> = parent.map(|p| p.slots().to_vec()).unwrap_or_default();

    // Own declaration names must be unique across methods and overrides
    let mut own_names: Vec<&str> = Vec::new();
    for name in request
        .methods
        .iter()
        .map(|m| m.name.as_str())
        .chain(request.overrides.iter().map(|o| o.name.as_str()))
    {
        if own_names.contains(&name) {
            return Err(DefinitionError::DuplicateMethod {
                class: class.clone(),
                method: name.to_string(),
            });
        }
        own_names.push(name);
    }

    // Overriding must be explicit: a plain method declaration may not reuse
    // an inherited slot's name
    let mut overridden = Vec::new();
    for decl in &request.overrides {
        let info = slots
            .iter_mut()
            .find(|s| s.name == decl.name)
            .ok_or_else(|| DefinitionError::NoSuchMethod {
                class: class.clone(),
                method: decl.name.clone(),
            })?;
        if decl.params.len() != info.params.len() {
            return Err(DefinitionError::ArityMismatch {
                method: decl.name.clone(),
                expected: info.params.len(),
                found: decl.params.len(),
            });
        }
        // Slot index and defining class stay put; only the implementation
        // (and its parameter names) change
        info.implemented_in = class.clone();
        info.params = decl.params.clone();
        overridden.push((info.slot, decl.clone()));
    }

    let mut new_methods = Vec::new();
    let mut privates = Vec::new();
    for decl in &request.methods {
        if slots.iter().any(|s| s.name == decl.name) {
            return Err(DefinitionError::DuplicateMethod {
                class: class.clone(),
                method: decl.name.clone(),
            });
        }
        match decl.visibility {
            Visibility::Private => privates.push(decl.clone()),
            Visibility::Public => {
                let slot = slots.len();
                slots.push(SlotInfo {
                    name: decl.name.clone(),
                    slot,
                    params: decl.params.clone(),
                    defined_in: class.clone(),
                    implemented_in: class.clone(),
                });
                new_methods.push((slot, decl.clone()));
            }
        }
    }

    if slots.len() > config.limits.max_slots {
        return Err(DefinitionError::LimitExceeded {
            class: class.clone(),
            what: format!("slot count exceeds {}", config.limits.max_slots),
        });
    }
    Ok((slots, new_methods, overridden, privates))
}
