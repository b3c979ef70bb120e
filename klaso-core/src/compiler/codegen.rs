//! Body compilation
//!
//! Compiles one method body or field initializer from the symbolic IR into
//! a flat chunk. This is where "as early as possible" happens: unknown
//! fields and parameters, writes to immutable fields, calls to missing
//! methods, and arity mismatches are all rejected here, at definition
//! time, never at dispatch.

use crate::error::DefinitionError;
use crate::model::expr::{BinaryOp, Expr, UnaryOp};
use crate::runtime::chunk::{Chunk, Op};
use crate::runtime::descriptor::{FieldInfo, SlotInfo};

/// Signature of one same-class private method, visible to codegen only
#[derive(Debug, Clone)]
pub struct PrivateSig {
    pub name: String,
    pub index: usize,
    pub arity: usize,
}

/// Name-resolution context for one class's bodies
#[derive(Debug)]
pub struct MethodContext<'a> {
    pub class_name: &'a str,
    /// Full field layout (inherited first)
    pub fields: &'a [FieldInfo],
    /// Full public slot list
    pub slots: &'a [SlotInfo],
    /// Own private methods; empty for ad hoc override bodies
    pub privates: &'a [PrivateSig],
}

/// Compile a method body
pub fn compile_method(
    ctx: &MethodContext,
    method: &str,
    params: &[String],
    body: &Expr,
) -> Result<Chunk, DefinitionError> {
    let mut emitter = Emitter {
        chunk: Chunk::new(),
        class_name: ctx.class_name,
        scope: Scope::Method {
            ctx,
            method,
            params,
        },
    };
    emitter.emit_expr(body)?;
    emitter.chunk.emit(Op::Return);
    Ok(emitter.chunk)
}

/// Compile a field initializer
///
/// Initializers are evaluated independently per instantiation with no
/// instance in scope, so any reference to fields, parameters, or methods
/// is rejected here.
pub fn compile_initializer(
    class_name: &str,
    field: &str,
    expr: &Expr,
) -> Result<Chunk, DefinitionError> {
    let mut emitter = Emitter {
        chunk: Chunk::new(),
        class_name,
        scope: Scope::Initializer { field },
    };
    emitter.emit_expr(expr)?;
    emitter.chunk.emit(Op::Return);
    Ok(emitter.chunk)
}

enum Scope<'a> {
    Method {
        ctx: &'a MethodContext<'a>,
        method: &'a str,
        params: &'a [String],
    },
    Initializer {
        field: &'a str,
    },
}

struct Emitter<'a> {
    chunk: Chunk,
    class_name: &'a str,
    scope: Scope<'a>,
}

impl<'a> Emitter<'a> {
    fn emit_expr(&mut self, expr: &Expr) -> Result<(), DefinitionError> {
        match expr {
            Expr::Literal(value) => self.emit_const(value.clone()),
            Expr::Param(name) => {
                let (method, params) = self.method_scope()?;
                let position = params.iter().position(|p| p == name).ok_or_else(|| {
                    DefinitionError::UnknownParameter {
                        method: method.to_string(),
                        param: name.clone(),
                    }
                })?;
                self.chunk.emit(Op::Param(position as u8));
                Ok(())
            }
            Expr::Field(name) => {
                let info = self.resolve_field(name)?;
                self.chunk.emit(Op::GetField(info.index as u16));
                Ok(())
            }
            Expr::Assign { field, value } => {
                let info = self.resolve_field(field)?;
                if !info.mutable {
                    return Err(DefinitionError::ImmutableField {
                        class: self.class_name.to_string(),
                        field: field.clone(),
                    });
                }
                let index = info.index as u16;
                self.emit_expr(value)?;
                self.chunk.emit(Op::SetField(index));
                Ok(())
            }
            Expr::Unary { op, expr } => {
                self.emit_expr(expr)?;
                self.chunk.emit(match op {
                    UnaryOp::Neg => Op::Neg,
                    UnaryOp::Not => Op::Not,
                });
                Ok(())
            }
            Expr::Binary { op: BinaryOp::And, lhs, rhs } => {
                self.emit_expr(lhs)?;
                let jump = self.chunk.emit(Op::JumpIfFalsePeek(0));
                self.chunk.emit(Op::Pop);
                self.emit_expr(rhs)?;
                self.patch_jump(jump)?;
                Ok(())
            }
            Expr::Binary { op: BinaryOp::Or, lhs, rhs } => {
                self.emit_expr(lhs)?;
                let jump = self.chunk.emit(Op::JumpIfTruePeek(0));
                self.chunk.emit(Op::Pop);
                self.emit_expr(rhs)?;
                self.patch_jump(jump)?;
                Ok(())
            }
            Expr::Binary { op, lhs, rhs } => {
                self.emit_expr(lhs)?;
                self.emit_expr(rhs)?;
                self.chunk.emit(match op {
                    BinaryOp::Add => Op::Add,
                    BinaryOp::Sub => Op::Sub,
                    BinaryOp::Mul => Op::Mul,
                    BinaryOp::Div => Op::Div,
                    BinaryOp::Eq => Op::Eq,
                    BinaryOp::Ne => Op::Ne,
                    BinaryOp::Lt => Op::Lt,
                    BinaryOp::Le => Op::Le,
                    BinaryOp::Gt => Op::Gt,
                    BinaryOp::Ge => Op::Ge,
                    BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
                });
                Ok(())
            }
            Expr::If { cond, then, otherwise } => {
                self.emit_expr(cond)?;
                let to_else = self.chunk.emit(Op::JumpIfFalse(0));
                self.emit_expr(then)?;
                let to_end = self.chunk.emit(Op::Jump(0));
                self.patch_jump(to_else)?;
                match otherwise {
                    Some(expr) => self.emit_expr(expr)?,
                    None => self.emit_const(crate::model::value::Value::Null)?,
                }
                self.patch_jump(to_end)?;
                Ok(())
            }
            Expr::Call { method, args } => self.emit_call(method, args),
            Expr::Seq(items) => {
                if items.is_empty() {
                    return self.emit_const(crate::model::value::Value::Null);
                }
                for (i, item) in items.iter().enumerate() {
                    self.emit_expr(item)?;
                    if i + 1 < items.len() {
                        self.chunk.emit(Op::Pop);
                    }
                }
                Ok(())
            }
        }
    }

    fn emit_call(
        &mut self,
        method: &str,
        args: &[Expr],
    ) -> Result<(), DefinitionError> {
        let ctx = match &self.scope {
            Scope::Method { ctx, .. } => ctx,
            Scope::Initializer { field } => {
                return Err(DefinitionError::InvalidInitializer {
                    field: field.to_string(),
                })
            }
        };

        if args.len() > u8::MAX as usize {
            return Err(DefinitionError::LimitExceeded {
                class: self.class_name.to_string(),
                what: format!("call to `{method}` passes more than 255 arguments"),
            });
        }

        // Same-class private methods shadow nothing: resolve cannot publish
        // a private under an inherited slot's name.
        let target = if let Some(sig) = ctx.privates.iter().find(|p| p.name == method) {
            check_arity(method, sig.arity, args.len())?;
            Op::CallPrivate {
                index: sig.index as u16,
                argc: args.len() as u8,
            }
        } else if let Some(info) = ctx.slots.iter().find(|s| s.name == method) {
            check_arity(method, info.params.len(), args.len())?;
            Op::Invoke {
                slot: info.slot as u16,
                argc: args.len() as u8,
            }
        } else {
            return Err(DefinitionError::NoSuchMethod {
                class: self.class_name.to_string(),
                method: method.to_string(),
            });
        };

        for arg in args {
            self.emit_expr(arg)?;
        }
        self.chunk.emit(target);
        Ok(())
    }

    fn patch_jump(&mut self, at: usize) -> Result<(), DefinitionError> {
        self.chunk
            .patch_jump(at)
            .ok_or_else(|| DefinitionError::LimitExceeded {
                class: self.class_name.to_string(),
                what: "branch distance exceeds the jump operand range".to_string(),
            })
    }

    fn emit_const(&mut self, value: crate::model::value::Value) -> Result<(), DefinitionError> {
        let index = self.chunk.add_const(value).ok_or_else(|| {
            DefinitionError::LimitExceeded {
                class: self.class_name.to_string(),
                what: "constant pool overflow".to_string(),
            }
        })?;
        self.chunk.emit(Op::Const(index));
        Ok(())
    }

    /// Instance-scope lookups are invalid inside initializers
    fn method_scope(&self) -> Result<(&'a str, &'a [String]), DefinitionError> {
        match &self.scope {
            Scope::Method { method, params, .. } => Ok((method, params)),
            Scope::Initializer { field } => Err(DefinitionError::InvalidInitializer {
                field: field.to_string(),
            }),
        }
    }

    fn resolve_field(&self, name: &str) -> Result<&'a FieldInfo, DefinitionError> {
        match &self.scope {
            Scope::Method { ctx, .. } => {
                ctx.fields.iter().find(|f| f.name == name).ok_or_else(|| {
                    DefinitionError::UnknownField {
                        class: self.class_name.to_string(),
                        field: name.to_string(),
                    }
                })
            }
            Scope::Initializer { field } => {
                Err(DefinitionError::InvalidInitializer {
                    field: field.to_string(),
                })
            }
        }
    }
}

fn check_arity(method: &str, expected: usize, found: usize) -> Result<(), DefinitionError> {
    if expected != found {
        return Err(DefinitionError::ArityMismatch {
            method: method.to_string(),
            expected,
            found,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::value::Value;

    fn field(name: &str, index: usize, mutable: bool) -> FieldInfo {
        FieldInfo {
            name: name.to_string(),
            index,
            mutable,
            defined_in: "shape".to_string(),
            default: Chunk::new(),
        }
    }

    fn slot(name: &str, slot: usize, params: &[&str]) -> SlotInfo {
        SlotInfo {
            name: name.to_string(),
            slot,
            params: params.iter().map(|p| p.to_string()).collect(),
            defined_in: "shape".to_string(),
            implemented_in: "shape".to_string(),
        }
    }

    fn ctx<'a>(fields: &'a [FieldInfo], slots: &'a [SlotInfo], privates: &'a [PrivateSig]) -> MethodContext<'a> {
        MethodContext {
            class_name: "shape",
            fields,
            slots,
            privates,
        }
    }

    #[test]
    fn test_field_read_compiles_to_layout_index() {
        let fields = [field("size", 0, false), field("tag", 1, false)];
        let c = ctx(&fields, &[], &[]);
        let chunk = compile_method(&c, "area", &[], &Expr::field("tag")).unwrap();
        assert_eq!(chunk.ops(), &[Op::GetField(1), Op::Return]);
    }

    #[test]
    fn test_unknown_field_fails_at_compile_time() {
        let c = ctx(&[], &[], &[]);
        let err = compile_method(&c, "area", &[], &Expr::field("size")).unwrap_err();
        assert_eq!(
            err,
            DefinitionError::UnknownField {
                class: "shape".into(),
                field: "size".into()
            }
        );
    }

    #[test]
    fn test_immutable_write_fails_at_compile_time() {
        let fields = [field("size", 0, false)];
        let c = ctx(&fields, &[], &[]);
        let err =
            compile_method(&c, "grow", &[], &Expr::assign("size", Expr::int(2))).unwrap_err();
        assert_eq!(
            err,
            DefinitionError::ImmutableField {
                class: "shape".into(),
                field: "size".into()
            }
        );
    }

    #[test]
    fn test_unknown_parameter_fails_at_compile_time() {
        let c = ctx(&[], &[], &[]);
        let params = vec!["factor".to_string()];
        let err = compile_method(&c, "scale", &params, &Expr::param("amount")).unwrap_err();
        assert_eq!(
            err,
            DefinitionError::UnknownParameter {
                method: "scale".into(),
                param: "amount".into()
            }
        );
    }

    #[test]
    fn test_call_resolves_private_before_slot() {
        let slots = [slot("helper", 0, &[])];
        let privates = [PrivateSig {
            name: "helper".to_string(),
            index: 3,
            arity: 0,
        }];
        let c = ctx(&[], &slots, &privates);
        let chunk = compile_method(&c, "run", &[], &Expr::call("helper", vec![])).unwrap();
        assert_eq!(
            chunk.ops(),
            &[Op::CallPrivate { index: 3, argc: 0 }, Op::Return]
        );
    }

    #[test]
    fn test_call_arity_checked_at_compile_time() {
        let slots = [slot("scale", 0, &["factor"])];
        let c = ctx(&[], &slots, &[]);
        let err = compile_method(&c, "run", &[], &Expr::call("scale", vec![])).unwrap_err();
        assert_eq!(
            err,
            DefinitionError::ArityMismatch {
                method: "scale".into(),
                expected: 1,
                found: 0
            }
        );
    }

    #[test]
    fn test_initializer_rejects_instance_state() {
        for expr in [
            Expr::field("size"),
            Expr::param("n"),
            Expr::assign("size", Expr::int(1)),
            Expr::call("area", vec![]),
        ] {
            let err = compile_initializer("shape", "size", &expr).unwrap_err();
            assert_eq!(
                err,
                DefinitionError::InvalidInitializer {
                    field: "size".into()
                }
            );
        }
    }

    #[test]
    fn test_initializer_accepts_pure_expression() {
        let expr = Expr::binary(BinaryOp::Mul, Expr::int(2), Expr::int(3));
        let chunk = compile_initializer("shape", "size", &expr).unwrap();
        assert_eq!(
            chunk.ops(),
            &[Op::Const(0), Op::Const(1), Op::Mul, Op::Return]
        );
        assert_eq!(chunk.consts(), &[Value::Int(2), Value::Int(3)]);
    }

    #[test]
    fn test_branch_too_long_for_a_jump_is_rejected() {
        // A skipped branch longer than a jump operand can span must fail
        // at definition time, never compile to a wrapped offset
        let c = ctx(&[], &[], &[]);
        let long_branch: Vec<Expr> = (0..20_000).map(Expr::int).collect();
        let expr = Expr::If {
            cond: Box::new(Expr::Literal(Value::Bool(false))),
            then: Box::new(Expr::Seq(long_branch)),
            otherwise: Some(Box::new(Expr::int(1))),
        };
        let err = compile_method(&c, "run", &[], &expr).unwrap_err();
        assert!(matches!(err, DefinitionError::LimitExceeded { .. }));
    }

    #[test]
    fn test_if_without_otherwise_yields_null() {
        let c = ctx(&[], &[], &[]);
        let expr = Expr::If {
            cond: Box::new(Expr::Literal(Value::Bool(false))),
            then: Box::new(Expr::int(1)),
            otherwise: None,
        };
        let chunk = compile_method(&c, "run", &[], &expr).unwrap();
        // cond, jump-to-else, then-branch, jump-to-end, null
        assert_eq!(chunk.ops()[1], Op::JumpIfFalse(2));
        assert_eq!(chunk.ops()[3], Op::Jump(1));
    }
}
