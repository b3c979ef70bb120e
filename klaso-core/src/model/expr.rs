//! Method-body IR
//!
//! The normalized form a method implementation arrives in. Field names and
//! parameter names are still symbolic here; codegen resolves them to layout
//! indices and argument positions at class-definition time.

use serde::{Deserialize, Serialize};

use super::value::Value;

/// Binary operators (`and`/`or` short-circuit)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Neg,
    Not,
}

/// One expression of a method body
///
/// Every method body is a single expression; its value is the method's
/// return value. There is no implicit receiver syntax: `Field` and `Call`
/// always operate on the instance the dispatcher passes in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    /// Constant value
    Literal(Value),
    /// Read a declared parameter by name
    Param(String),
    /// Read a field of the receiving instance
    Field(String),
    /// Write a field of the receiving instance; evaluates to the written value
    Assign { field: String, value: Box<Expr> },
    Unary { op: UnaryOp, expr: Box<Expr> },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// Conditional; a missing `otherwise` arm evaluates to `null`
    If {
        cond: Box<Expr>,
        then: Box<Expr>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        otherwise: Option<Box<Expr>>,
    },
    /// Call a method of the receiving instance (public slot or same-class
    /// private method; codegen decides which)
    Call { method: String, args: Vec<Expr> },
    /// Evaluate in order, yield the last value (`null` when empty)
    Seq(Vec<Expr>),
}

impl Expr {
    /// Shorthand for a literal integer
    pub fn int(n: i64) -> Self {
        Expr::Literal(Value::Int(n))
    }

    pub fn field(name: &str) -> Self {
        Expr::Field(name.to_string())
    }

    pub fn param(name: &str) -> Self {
        Expr::Param(name.to_string())
    }

    pub fn assign(field: &str, value: Expr) -> Self {
        Expr::Assign {
            field: field.to_string(),
            value: Box::new(value),
        }
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn call(method: &str, args: Vec<Expr>) -> Self {
        Expr::Call {
            method: method.to_string(),
            args,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expr_deserializes_from_json() {
        let json = r#"{ "binary": { "op": "mul", "lhs": { "field": "size" }, "rhs": { "field": "size" } } }"#;
        let expr: Expr = serde_json::from_str(json).unwrap();
        assert_eq!(
            expr,
            Expr::binary(BinaryOp::Mul, Expr::field("size"), Expr::field("size"))
        );
    }

    #[test]
    fn test_if_without_otherwise() {
        let json = r#"{ "if": { "cond": { "literal": true }, "then": { "literal": 1 } } }"#;
        let expr: Expr = serde_json::from_str(json).unwrap();
        match expr {
            Expr::If { otherwise, .. } => assert!(otherwise.is_none()),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
