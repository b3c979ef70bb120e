//! VTable compilation
//!
//! Builds the immutable per-class dispatch table from a resolved class:
//! inherited, unoverridden entries are the parent's `Arc`s unchanged
//! (implementation sharing); overridden and newly introduced bodies are
//! compiled here, with the class's own private methods in scope.

use std::sync::Arc;

use crate::compiler::codegen::{self, MethodContext, PrivateSig};
use crate::compiler::resolve::ResolvedClass;
use crate::error::DefinitionError;
use crate::runtime::vtable::{CompiledMethod, PrivateTable, VTable};

/// Compile every body the class introduces and assemble its vtable
///
/// The private table is created empty, shared into every compiled method,
/// and sealed after the last body compiles, so same-class methods can call
/// each other regardless of declaration order.
pub fn build(resolved: &ResolvedClass) -> Result<Arc<VTable>, DefinitionError> {
    let private_table = PrivateTable::new();
    let private_sigs: Vec<PrivateSig> = resolved
        .privates
        .iter()
        .enumerate()
        .map(|(index, decl)| PrivateSig {
            name: decl.name.clone(),
            index,
            arity: decl.params.len(),
        })
        .collect();
    let ctx = MethodContext {
        class_name: &resolved.name,
        fields: &resolved.fields,
        slots: &resolved.slots,
        privates: &private_sigs,
    };

    let mut private_methods = Vec::with_capacity(resolved.privates.len());
    for decl in &resolved.privates {
        private_methods.push(Arc::new(compile_decl(
            &ctx,
            &decl.name,
            &decl.params,
            decl.body.as_ref(),
            &private_table,
        )?));
    }

    // Start from the parent's table; untouched entries stay byte-identical
    let mut slots: Vec<Arc<CompiledMethod>> = resolved
        .parent
        .as_ref()
        .map(|p| p.vtable().cloned_slots())
        .unwrap_or_default();

    for (slot, decl) in &resolved.overridden {
        slots[*slot] = Arc::new(CompiledMethod::new(
            decl.name.clone(),
            resolved.name.clone(),
            decl.params.clone(),
            codegen::compile_method(&ctx, &decl.name, &decl.params, &decl.body)?,
            private_table.clone(),
        ));
    }

    for (slot, decl) in &resolved.new_methods {
        debug_assert_eq!(*slot, slots.len(), "fresh slots append in order");
        slots.push(Arc::new(compile_decl(
            &ctx,
            &decl.name,
            &decl.params,
            decl.body.as_ref(),
            &private_table,
        )?));
    }

    private_table.seal(private_methods);
    Ok(Arc::new(VTable::new(resolved.name.clone(), slots)))
}

/// Compile one own declaration; a missing body yields a placeholder that
/// fails only when actually called
fn compile_decl(
    ctx: &MethodContext,
    name: &str,
    params: &[String],
    body: Option<&crate::model::expr::Expr>,
    private_table: &PrivateTable,
) -> Result<CompiledMethod, DefinitionError> {
    match body {
        Some(expr) => Ok(CompiledMethod::new(
            name.to_string(),
            ctx.class_name.to_string(),
            params.to_vec(),
            codegen::compile_method(ctx, name, params, expr)?,
            private_table.clone(),
        )),
        None => Ok(CompiledMethod::placeholder(
            name.to_string(),
            ctx.class_name.to_string(),
            params.to_vec(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::resolve;
    use crate::model::decl::ClassRequest;
    use crate::model::expr::Expr;
    use klaso_config::ModelConfig;

    fn build_root(request: &ClassRequest) -> Arc<VTable> {
        let resolved = resolve::resolve(request, None, &ModelConfig::default()).unwrap();
        build(&resolved).unwrap()
    }

    #[test]
    fn test_slots_align_with_resolution_order() {
        let vtable = build_root(
            &ClassRequest::new("shape")
                .field("size", Expr::int(1), false)
                .method("area", &[], Expr::field("size"))
                .method("describe", &[], Expr::Literal("a shape".into())),
        );
        assert_eq!(vtable.len(), 2);
        assert_eq!(vtable.slot(0).unwrap().name(), "area");
        assert_eq!(vtable.slot(1).unwrap().name(), "describe");
        assert_eq!(vtable.class_name(), "shape");
    }

    #[test]
    fn test_placeholder_method_occupies_its_slot() {
        let vtable = build_root(&ClassRequest::new("shape").placeholder_method("draw", &[]));
        assert!(vtable.slot(0).unwrap().is_placeholder());
    }

    #[test]
    fn test_private_bodies_compile_in_any_order() {
        // `area` calls `helper` which is declared after it
        let vtable = build_root(
            &ClassRequest::new("shape")
                .method("area", &[], Expr::call("helper", vec![]))
                .private_method("helper", &[], Expr::int(7)),
        );
        let area = vtable.slot(0).unwrap();
        assert_eq!(area.private(0).unwrap().name(), "helper");
    }
}
