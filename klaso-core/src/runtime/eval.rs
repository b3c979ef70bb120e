//! Chunk evaluator
//!
//! A small stack machine executing one compiled body against an instance
//! and an argument slice. Name resolution happened at definition time, so
//! the only failures left here are value-level: type errors, division by
//! zero, call depth, and placeholder slots.

use klaso_config::EvalConfig;

use crate::error::RuntimeError;
use crate::model::value::Value;
use crate::runtime::chunk::{Chunk, Op};
use crate::runtime::instance::Instance;
use crate::runtime::vtable::CompiledMethod;

/// Run a compiled method with `instance` as the implicit receiver
pub fn run_method(
    method: &CompiledMethod,
    instance: &mut Instance,
    args: &[Value],
    config: &EvalConfig,
) -> Result<Value, RuntimeError> {
    run_method_at(method, instance, args, 0, config)
}

/// Run a compiled field initializer (no receiver in scope)
pub fn run_initializer(chunk: &Chunk, config: &EvalConfig) -> Result<Value, RuntimeError> {
    Machine {
        chunk,
        instance: None,
        args: &[],
        depth: 0,
        config,
    }
    .run()
}

fn run_method_at(
    method: &CompiledMethod,
    instance: &mut Instance,
    args: &[Value],
    depth: usize,
    config: &EvalConfig,
) -> Result<Value, RuntimeError> {
    if depth >= config.max_call_depth {
        return Err(RuntimeError::CallDepthExceeded);
    }
    if method.is_placeholder() {
        return Err(RuntimeError::NotImplemented {
            class: method.implemented_in().to_string(),
            method: method.name().to_string(),
        });
    }
    Machine {
        chunk: method.chunk(),
        instance: Some(instance),
        args,
        depth,
        config,
    }
    .run_with_privates(method)
}

struct Machine<'a> {
    chunk: &'a Chunk,
    instance: Option<&'a mut Instance>,
    args: &'a [Value],
    depth: usize,
    config: &'a EvalConfig,
}

impl Machine<'_> {
    fn run(self) -> Result<Value, RuntimeError> {
        self.execute(None)
    }

    fn run_with_privates(self, method: &CompiledMethod) -> Result<Value, RuntimeError> {
        self.execute(Some(method))
    }

    fn execute(mut self, method: Option<&CompiledMethod>) -> Result<Value, RuntimeError> {
        let ops = self.chunk.ops();
        let depth = self.depth;
        let config = self.config;
        let mut stack: Vec<Value> = Vec::with_capacity(8);
        let mut pc = 0usize;

        while pc < ops.len() {
            let op = ops[pc];
            pc += 1;
            match op {
                Op::Const(index) => {
                    let value = self
                        .chunk
                        .constant(index)
                        .cloned()
                        .ok_or_else(|| type_error("constant index out of range"))?;
                    stack.push(value);
                }
                Op::Param(position) => {
                    let value = self
                        .args
                        .get(position as usize)
                        .cloned()
                        .ok_or_else(|| type_error("argument position out of range"))?;
                    stack.push(value);
                }
                Op::GetField(index) => {
                    let instance = self.instance()?;
                    let value = instance
                        .raw(index as usize)
                        .cloned()
                        .ok_or_else(|| type_error("field index out of range"))?;
                    stack.push(value);
                }
                Op::SetField(index) => {
                    let value = pop(&mut stack)?;
                    let instance = self.instance()?;
                    instance.set_raw(index as usize, value.clone());
                    stack.push(value);
                }
                Op::Add => {
                    let (a, b) = pop2(&mut stack)?;
                    stack.push(add(a, b)?);
                }
                Op::Sub => {
                    let (a, b) = pop2(&mut stack)?;
                    stack.push(numeric(a, b, "subtract", |x, y| x - y, |x, y| x.wrapping_sub(y))?);
                }
                Op::Mul => {
                    let (a, b) = pop2(&mut stack)?;
                    stack.push(numeric(a, b, "multiply", |x, y| x * y, |x, y| x.wrapping_mul(y))?);
                }
                Op::Div => {
                    let (a, b) = pop2(&mut stack)?;
                    stack.push(divide(a, b)?);
                }
                Op::Neg => {
                    let value = pop(&mut stack)?;
                    stack.push(match value {
                        Value::Int(n) => Value::Int(n.wrapping_neg()),
                        Value::Float(x) => Value::Float(-x),
                        other => {
                            return Err(type_error(&format!(
                                "cannot negate {}",
                                other.type_name()
                            )))
                        }
                    });
                }
                Op::Not => {
                    let value = pop(&mut stack)?;
                    stack.push(Value::Bool(!value.is_truthy()));
                }
                Op::Eq => {
                    let (a, b) = pop2(&mut stack)?;
                    stack.push(Value::Bool(values_equal(&a, &b)));
                }
                Op::Ne => {
                    let (a, b) = pop2(&mut stack)?;
                    stack.push(Value::Bool(!values_equal(&a, &b)));
                }
                Op::Lt => compare(&mut stack, |o| o == std::cmp::Ordering::Less)?,
                Op::Le => compare(&mut stack, |o| o != std::cmp::Ordering::Greater)?,
                Op::Gt => compare(&mut stack, |o| o == std::cmp::Ordering::Greater)?,
                Op::Ge => compare(&mut stack, |o| o != std::cmp::Ordering::Less)?,
                Op::Jump(offset) => {
                    pc = jump_target(pc, offset);
                }
                Op::JumpIfFalse(offset) => {
                    if !pop(&mut stack)?.is_truthy() {
                        pc = jump_target(pc, offset);
                    }
                }
                Op::JumpIfFalsePeek(offset) => {
                    if !peek(&stack)?.is_truthy() {
                        pc = jump_target(pc, offset);
                    }
                }
                Op::JumpIfTruePeek(offset) => {
                    if peek(&stack)?.is_truthy() {
                        pc = jump_target(pc, offset);
                    }
                }
                Op::Pop => {
                    pop(&mut stack)?;
                }
                Op::Invoke { slot, argc } => {
                    let call_args = pop_args(&mut stack, argc)?;
                    let instance = self.instance()?;
                    let callee = instance
                        .vtable()
                        .slot(slot as usize)
                        .cloned()
                        .ok_or_else(|| type_error("dispatch slot out of range"))?;
                    let result =
                        run_method_at(&callee, instance, &call_args, depth + 1, config)?;
                    stack.push(result);
                }
                Op::CallPrivate { index, argc } => {
                    let call_args = pop_args(&mut stack, argc)?;
                    let callee = method
                        .and_then(|m| m.private(index as usize))
                        .cloned()
                        .ok_or_else(|| type_error("private method index out of range"))?;
                    let instance = self.instance()?;
                    let result =
                        run_method_at(&callee, instance, &call_args, depth + 1, config)?;
                    stack.push(result);
                }
                Op::Return => {
                    return pop(&mut stack);
                }
            }
        }
        // Compiled chunks always end in Return; tolerate a bare chunk
        Ok(stack.pop().unwrap_or(Value::Null))
    }

    fn instance(&mut self) -> Result<&mut Instance, RuntimeError> {
        self.instance
            .as_deref_mut()
            .ok_or_else(|| type_error("no receiver in scope"))
    }
}

fn jump_target(pc: usize, offset: i16) -> usize {
    // Offsets are relative to the instruction after the jump and, with a
    // loop-free IR, always forward
    (pc as i64 + offset as i64) as usize
}

fn type_error(message: &str) -> RuntimeError {
    RuntimeError::TypeError(message.to_string())
}

fn pop(stack: &mut Vec<Value>) -> Result<Value, RuntimeError> {
    stack
        .pop()
        .ok_or_else(|| type_error("operand stack underflow"))
}

fn pop2(stack: &mut Vec<Value>) -> Result<(Value, Value), RuntimeError> {
    let b = pop(stack)?;
    let a = pop(stack)?;
    Ok((a, b))
}

fn peek(stack: &[Value]) -> Result<&Value, RuntimeError> {
    stack
        .last()
        .ok_or_else(|| type_error("operand stack underflow"))
}

/// Pop `argc` values pushed left to right
fn pop_args(stack: &mut Vec<Value>, argc: u8) -> Result<Vec<Value>, RuntimeError> {
    let mut args = Vec::with_capacity(argc as usize);
    for _ in 0..argc {
        args.push(pop(stack)?);
    }
    args.reverse();
    Ok(args)
}

fn add(a: Value, b: Value) -> Result<Value, RuntimeError> {
    match (&a, &b) {
        (Value::Str(x), Value::Str(y)) => Ok(Value::Str(format!("{x}{y}"))),
        _ => numeric(a, b, "add", |x, y| x + y, |x, y| x.wrapping_add(y)),
    }
}

/// Int op Int stays Int; any float operand promotes
fn numeric(
    a: Value,
    b: Value,
    verb: &str,
    float_op: impl Fn(f64, f64) -> f64,
    int_op: impl Fn(i64, i64) -> i64,
) -> Result<Value, RuntimeError> {
    match (&a, &b) {
        (Value::Int(x), Value::Int(y)) => Ok(Value::Int(int_op(*x, *y))),
        _ => match (a.as_float(), b.as_float()) {
            (Some(x), Some(y)) => Ok(Value::Float(float_op(x, y))),
            _ => Err(type_error(&format!(
                "cannot {verb} {} and {}",
                a.type_name(),
                b.type_name()
            ))),
        },
    }
}

/// Division always yields a float; zero divisors fail
fn divide(a: Value, b: Value) -> Result<Value, RuntimeError> {
    match (a.as_float(), b.as_float()) {
        (Some(_), Some(y)) if y == 0.0 => Err(RuntimeError::DivisionByZero),
        (Some(x), Some(y)) => Ok(Value::Float(x / y)),
        _ => Err(type_error(&format!(
            "cannot divide {} by {}",
            a.type_name(),
            b.type_name()
        ))),
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_float(), b.as_float()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn compare(
    stack: &mut Vec<Value>,
    accept: impl Fn(std::cmp::Ordering) -> bool,
) -> Result<(), RuntimeError> {
    let (a, b) = pop2(stack)?;
    let ordering = match (&a, &b) {
        (Value::Str(x), Value::Str(y)) => x.cmp(y),
        _ => match (a.as_float(), b.as_float()) {
            (Some(x), Some(y)) => x
                .partial_cmp(&y)
                .ok_or_else(|| type_error("cannot order NaN"))?,
            _ => {
                return Err(type_error(&format!(
                    "cannot compare {} and {}",
                    a.type_name(),
                    b.type_name()
                )))
            }
        },
    };
    stack.push(Value::Bool(accept(ordering)));
    Ok(())
}
