//! Data model: values, normalized declarations, and the method-body IR
//!
//! Everything in this module is plain data produced by the (external)
//! front end. Nothing here performs resolution or compilation.

pub mod decl;
pub mod expr;
pub mod value;

pub use decl::{ClassRequest, FieldDecl, MethodDecl, OverrideDecl, Visibility};
pub use expr::{BinaryOp, Expr, UnaryOp};
pub use value::Value;
